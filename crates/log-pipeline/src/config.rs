//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`AlertflowConfig`]에서 파이프라인이 실제로 사용하는
//! 값만 평탄하게 추려낸 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use alertflow_core::config::AlertflowConfig;
//! use alertflow_log_pipeline::config::PipelineConfig;
//!
//! let core_config = AlertflowConfig::default();
//! let config = PipelineConfig::from_core(&core_config);
//! ```

use std::time::Duration;

use alertflow_core::config::{AlertflowConfig, MAX_WINDOW_SECONDS};
use alertflow_core::event::EventFieldMapping;
use serde::{Deserialize, Serialize};

use crate::error::LogPipelineError;

/// 로그 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 입력 파일 경로 (`-`이면 표준 입력)
    pub source_path: String,
    /// 라인 하나를 채널에 넣기 전 대기 시간 (밀리초, 0이면 비활성)
    pub line_delay_ms: u64,
    /// 생산자와 소비자 사이 채널 용량
    pub channel_capacity: usize,
    /// 최대 라인 길이 (바이트). 초과하는 라인은 건너뜀
    pub max_line_length: usize,
    /// 이벤트 필드 이름 매핑
    pub fields: EventFieldMapping,
    /// 버스트 탐지 윈도우 (초)
    pub window_secs: u64,
    /// critical로 간주할 레벨 목록 (대소문자 무시)
    pub critical_levels: Vec<String>,
    /// 알림 발생 임계 수
    pub threshold: usize,
    /// 알림 저장 파일 경로
    pub alerts_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_path: "events.log".to_owned(),
            line_delay_ms: 2000,
            channel_capacity: 1024,
            max_line_length: 64 * 1024,
            fields: EventFieldMapping::default(),
            window_secs: 30,
            critical_levels: vec!["CRITICAL".to_owned()],
            threshold: 3,
            alerts_path: "alerts.json".to_owned(),
        }
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &AlertflowConfig) -> Self {
        Self {
            source_path: core.source.path.clone(),
            line_delay_ms: core.source.line_delay_ms,
            channel_capacity: core.source.channel_capacity,
            max_line_length: core.source.max_line_length,
            fields: core.source.fields.clone(),
            window_secs: core.event_analyzer.window_seconds,
            critical_levels: core.event_analyzer.critical_levels.clone(),
            threshold: core.event_analyzer.threshold,
            alerts_path: core.alert_storage.alerts_file_path.clone(),
        }
    }

    /// 라인 지연 시간
    pub fn line_delay(&self) -> Duration {
        Duration::from_millis(self.line_delay_ms)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        const MAX_CHANNEL_CAPACITY: usize = 1_000_000;

        if self.source_path.trim().is_empty() {
            return Err(invalid("source_path", "must not be empty"));
        }

        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(invalid(
                "channel_capacity",
                format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
            ));
        }

        if self.max_line_length == 0 {
            return Err(invalid("max_line_length", "must be greater than 0"));
        }

        if self.window_secs > MAX_WINDOW_SECONDS {
            return Err(invalid(
                "window_secs",
                format!("must be at most {MAX_WINDOW_SECONDS}"),
            ));
        }

        if self.threshold == 0 {
            return Err(invalid("threshold", "must be greater than 0"));
        }

        if self.critical_levels.iter().all(|l| l.trim().is_empty()) {
            return Err(invalid(
                "critical_levels",
                "at least one non-empty level is required",
            ));
        }

        if self.alerts_path.trim().is_empty() {
            return Err(invalid("alerts_path", "must not be empty"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> LogPipelineError {
    LogPipelineError::Config {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 입력 경로를 설정합니다.
    pub fn source_path(mut self, path: impl Into<String>) -> Self {
        self.config.source_path = path.into();
        self
    }

    /// 라인 지연(밀리초)을 설정합니다.
    pub fn line_delay_ms(mut self, ms: u64) -> Self {
        self.config.line_delay_ms = ms;
        self
    }

    /// 채널 용량을 설정합니다.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// 최대 라인 길이를 설정합니다.
    pub fn max_line_length(mut self, len: usize) -> Self {
        self.config.max_line_length = len;
        self
    }

    /// 필드 매핑을 설정합니다.
    pub fn fields(mut self, fields: EventFieldMapping) -> Self {
        self.config.fields = fields;
        self
    }

    /// 탐지 윈도우(초)를 설정합니다.
    pub fn window_secs(mut self, secs: u64) -> Self {
        self.config.window_secs = secs;
        self
    }

    /// critical 레벨 목록을 설정합니다.
    pub fn critical_levels(mut self, levels: Vec<String>) -> Self {
        self.config.critical_levels = levels;
        self
    }

    /// 임계 수를 설정합니다.
    pub fn threshold(mut self, threshold: usize) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// 알림 저장 경로를 설정합니다.
    pub fn alerts_path(mut self, path: impl Into<String>) -> Self {
        self.config.alerts_path = path.into();
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
