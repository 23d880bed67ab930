//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 치명적 에러를 표현합니다.
//! 라인 단위 파싱 실패는 에러가 아니라 [`ParseOutcome::Discarded`](alertflow_core::ParseOutcome)로
//! 처리되므로 여기에 포함되지 않습니다.
//!
//! `From<LogPipelineError> for AlertflowError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use alertflow_core::error::{AlertflowError, ConfigError, PipelineError, StorageError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 입력 소스를 열 수 없음 (파이프라인 시작 전에 반환)
    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable {
        /// 입력 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 수집기 에러 (읽기 도중 I/O 실패 등)
    #[error("collector error: {source_type}: {reason}")]
    Collector {
        /// 수집 소스 식별자
        source_type: String,
        /// 에러 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 알림 저장 실패 (권한, 디스크, 손상된 저장소 등)
    #[error("storage error: {path}: {reason}")]
    Storage {
        /// 저장소 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogPipelineError {
    /// 시작 전 치명적 에러인지 확인합니다.
    pub fn is_startup_failure(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. } | Self::Config { .. })
    }
}

impl From<LogPipelineError> for AlertflowError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::SourceUnavailable { path, reason } => {
                AlertflowError::Pipeline(PipelineError::SourceUnavailable { path, reason })
            }
            LogPipelineError::Config { field, reason } => {
                AlertflowError::Config(ConfigError::InvalidValue { field, reason })
            }
            LogPipelineError::Channel(msg) => AlertflowError::Pipeline(PipelineError::Channel(msg)),
            LogPipelineError::Storage { path, reason } => {
                AlertflowError::Storage(StorageError::WriteFailed { path, reason })
            }
            LogPipelineError::Io(e) => AlertflowError::Io(e),
            other @ LogPipelineError::Collector { .. } => {
                AlertflowError::Pipeline(PipelineError::RunFailed(other.to_string()))
            }
        }
    }
}
