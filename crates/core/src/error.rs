//! 에러 타입 -- 도메인별 에러 정의

/// alertflow 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum AlertflowError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 입력 소스를 열 수 없음 (파이프라인 시작 전 치명적 에러)
    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    /// 채널 통신 실패
    #[error("channel error: {0}")]
    Channel(String),

    /// 파이프라인 실행 실패
    #[error("pipeline run failed: {0}")]
    RunFailed(String),
}

/// 라인 단위 파싱 에러
///
/// 한 라인을 버리는 사유를 나타냅니다. 파이프라인을 중단시키지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// JSON 디코딩 실패
    #[error("malformed json at column {column}: {reason}")]
    MalformedJson { column: usize, reason: String },

    /// 최상위가 JSON 객체가 아님
    #[error("expected JSON object at top level")]
    NotAnObject,

    /// 필수 필드 누락
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    /// 타임스탬프 해석 실패
    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },
}

impl ParseError {
    /// 메트릭 레이블로 쓰는 폐기 사유 이름
    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::MalformedJson { .. } => "malformed_json",
            Self::NotAnObject => "not_an_object",
            Self::MissingField { .. } => "missing_field",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::TooLarge { .. } => "too_large",
        }
    }
}

/// 스토리지 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 저장소 쓰기 실패
    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    /// 저장소 내용이 손상되어 덮어쓸 수 없음
    #[error("refusing to overwrite corrupted store {path}: {reason}")]
    Corrupted { path: String, reason: String },

    /// 직렬화 실패
    #[error("serialization failed: {0}")]
    Serialize(String),
}
