//! 설정 관리 -- alertflow.toml 파싱 및 런타임 설정
//!
//! [`AlertflowConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`ALERTFLOW_EVENT_ANALYZER_WINDOW_SECONDS=60` 형식)
//! 3. 설정 파일 (`alertflow.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), alertflow_core::error::AlertflowError> {
//! use alertflow_core::config::AlertflowConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = AlertflowConfig::load("alertflow.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = AlertflowConfig::parse("[event_analyzer]\nwindow_seconds = 60")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AlertflowError, ConfigError};
use crate::event::EventFieldMapping;

/// 탐지 윈도우의 최대 길이 (초, 하루)
pub const MAX_WINDOW_SECONDS: u64 = 86_400;

/// alertflow 통합 설정
///
/// `alertflow.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertflowConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 입력 소스 설정
    #[serde(default)]
    pub source: SourceConfig,
    /// 버스트 분석 설정
    #[serde(default)]
    pub event_analyzer: AnalyzerConfig,
    /// 알림 저장 설정
    #[serde(default)]
    pub alert_storage: AlertStorageConfig,
    /// 리포트 설정
    #[serde(default)]
    pub reports: ReportsConfig,
}

impl AlertflowConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AlertflowError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 기본값에 환경변수 오버라이드만 적용한 설정을 생성합니다.
    ///
    /// 설정 파일이 없을 때 사용합니다.
    pub fn from_env() -> Result<Self, AlertflowError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, AlertflowError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AlertflowError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                AlertflowError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, AlertflowError> {
        toml::from_str(toml_str).map_err(|e| {
            AlertflowError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `ALERTFLOW_{SECTION}_{FIELD}`
    /// 예: `ALERTFLOW_SOURCE_PATH=/var/log/app/events.log`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "ALERTFLOW_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "ALERTFLOW_GENERAL_LOG_FORMAT");

        // Source
        override_string(&mut self.source.path, "ALERTFLOW_SOURCE_PATH");
        override_u64(&mut self.source.line_delay_ms, "ALERTFLOW_SOURCE_LINE_DELAY_MS");
        override_usize(
            &mut self.source.channel_capacity,
            "ALERTFLOW_SOURCE_CHANNEL_CAPACITY",
        );
        override_usize(
            &mut self.source.max_line_length,
            "ALERTFLOW_SOURCE_MAX_LINE_LENGTH",
        );

        // Event analyzer
        override_u64(
            &mut self.event_analyzer.window_seconds,
            "ALERTFLOW_EVENT_ANALYZER_WINDOW_SECONDS",
        );
        override_csv(
            &mut self.event_analyzer.critical_levels,
            "ALERTFLOW_EVENT_ANALYZER_CRITICAL_LEVELS",
        );
        override_usize(
            &mut self.event_analyzer.threshold,
            "ALERTFLOW_EVENT_ANALYZER_THRESHOLD",
        );

        // Alert storage
        override_string(
            &mut self.alert_storage.alerts_file_path,
            "ALERTFLOW_ALERT_STORAGE_ALERTS_FILE_PATH",
        );

        // Reports
        override_string(
            &mut self.reports.output_directory,
            "ALERTFLOW_REPORTS_OUTPUT_DIRECTORY",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AlertflowError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.source.path.trim().is_empty() {
            return Err(invalid("source.path", "must not be empty".to_owned()));
        }

        if self.source.channel_capacity == 0 {
            return Err(invalid(
                "source.channel_capacity",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.source.max_line_length == 0 {
            return Err(invalid(
                "source.max_line_length",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.event_analyzer.window_seconds > MAX_WINDOW_SECONDS {
            return Err(invalid(
                "event_analyzer.window_seconds",
                format!("must be at most {MAX_WINDOW_SECONDS}"),
            ));
        }

        if self.event_analyzer.threshold == 0 {
            return Err(invalid(
                "event_analyzer.threshold",
                "must be greater than 0".to_owned(),
            ));
        }

        if self
            .event_analyzer
            .critical_levels
            .iter()
            .all(|level| level.trim().is_empty())
        {
            return Err(invalid(
                "event_analyzer.critical_levels",
                "at least one critical level must be configured".to_owned(),
            ));
        }

        if self.alert_storage.alerts_file_path.trim().is_empty() {
            return Err(invalid(
                "alert_storage.alerts_file_path",
                "must not be empty".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> AlertflowError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 입력 소스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// 로그 파일 경로 (`-`는 표준 입력)
    pub path: String,
    /// 라인 사이 지연 (밀리초). 실시간 유입을 흉내냅니다.
    pub line_delay_ms: u64,
    /// 소스와 분석기 사이 채널 용량
    pub channel_capacity: usize,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
    /// 이벤트 필드 매핑
    pub fields: EventFieldMapping,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: "events.log".to_owned(),
            line_delay_ms: 2000,
            channel_capacity: 1024,
            max_line_length: 64 * 1024, // 64KB
            fields: EventFieldMapping::default(),
        }
    }
}

/// 버스트 분석 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// 슬라이딩 윈도우 길이 (초)
    pub window_seconds: u64,
    /// critical로 취급할 레벨 목록 (대소문자 무시)
    pub critical_levels: Vec<String>,
    /// 알림 발생에 필요한 윈도우 내 critical 이벤트 수
    pub threshold: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_seconds: 30,
            critical_levels: vec!["CRITICAL".to_owned()],
            threshold: 3,
        }
    }
}

/// 알림 저장 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertStorageConfig {
    /// 알림 JSON 파일 경로
    pub alerts_file_path: String,
}

impl Default for AlertStorageConfig {
    fn default() -> Self {
        Self {
            alerts_file_path: "alerts.json".to_owned(),
        }
    }
}

/// 리포트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// 리포트 출력 디렉토리
    pub output_directory: String,
    /// HTML 리포트 파일명 접두어
    pub html_report_file: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            output_directory: "reports".to_owned(),
            html_report_file: "report.html".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = AlertflowConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.source.path, "events.log");
        assert_eq!(config.source.line_delay_ms, 2000);
        assert_eq!(config.event_analyzer.window_seconds, 30);
        assert_eq!(config.event_analyzer.critical_levels, vec!["CRITICAL"]);
        assert_eq!(config.event_analyzer.threshold, 3);
        assert_eq!(config.alert_storage.alerts_file_path, "alerts.json");
        assert_eq!(config.reports.output_directory, "reports");
    }

    #[test]
    fn default_config_passes_validation() {
        AlertflowConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = AlertflowConfig::parse("").unwrap();
        assert_eq!(config.event_analyzer.threshold, 3);
        assert_eq!(config.source.fields.timestamp_field, "timestamp");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[event_analyzer]
window_seconds = 60
critical_levels = ["CRITICAL", "FATAL"]

[source.fields]
level_field = "severity"
"#;
        let config = AlertflowConfig::parse(toml).unwrap();
        assert_eq!(config.event_analyzer.window_seconds, 60);
        assert_eq!(config.event_analyzer.critical_levels.len(), 2);
        // threshold는 기본값 유지
        assert_eq!(config.event_analyzer.threshold, 3);
        assert_eq!(config.source.fields.level_field, "severity");
        assert_eq!(config.source.fields.message_field, "message");
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = AlertflowConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            AlertflowError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_threshold() {
        let mut config = AlertflowConfig::default();
        config.event_analyzer.threshold = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn validate_rejects_window_longer_than_a_day() {
        let mut config = AlertflowConfig::default();
        config.event_analyzer.window_seconds = MAX_WINDOW_SECONDS;
        assert!(config.validate().is_ok());

        config.event_analyzer.window_seconds = MAX_WINDOW_SECONDS + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("event_analyzer.window_seconds"));
    }

    #[test]
    fn validate_rejects_zero_channel_capacity() {
        let mut config = AlertflowConfig::default();
        config.source.channel_capacity = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn validate_rejects_empty_critical_levels() {
        let mut config = AlertflowConfig::default();
        config.event_analyzer.critical_levels = vec![" ".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("critical_levels"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = AlertflowConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    #[serial]
    fn env_override_numeric_and_csv() {
        // SAFETY: serial 테스트이므로 다른 테스트와 환경변수를 동시에 조작하지 않습니다.
        unsafe {
            std::env::set_var("ALERTFLOW_EVENT_ANALYZER_WINDOW_SECONDS", "45");
            std::env::set_var("ALERTFLOW_EVENT_ANALYZER_CRITICAL_LEVELS", "CRITICAL, FATAL,");
        }
        let mut config = AlertflowConfig::default();
        config.apply_env_overrides();
        assert_eq!(config.event_analyzer.window_seconds, 45);
        assert_eq!(config.event_analyzer.critical_levels, vec!["CRITICAL", "FATAL"]);
        unsafe {
            std::env::remove_var("ALERTFLOW_EVENT_ANALYZER_WINDOW_SECONDS");
            std::env::remove_var("ALERTFLOW_EVENT_ANALYZER_CRITICAL_LEVELS");
        }
    }

    #[test]
    #[serial]
    fn env_override_invalid_number_keeps_original() {
        // SAFETY: serial 테스트이므로 다른 테스트와 환경변수를 동시에 조작하지 않습니다.
        unsafe { std::env::set_var("ALERTFLOW_EVENT_ANALYZER_THRESHOLD", "many") };
        let mut config = AlertflowConfig::default();
        config.apply_env_overrides();
        assert_eq!(config.event_analyzer.threshold, 3);
        unsafe { std::env::remove_var("ALERTFLOW_EVENT_ANALYZER_THRESHOLD") };
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = AlertflowConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = AlertflowConfig::parse(&toml_str).unwrap();
        assert_eq!(config.source.path, parsed.source.path);
        assert_eq!(
            config.event_analyzer.critical_levels,
            parsed.event_analyzer.critical_levels
        );
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = AlertflowConfig::from_file("/nonexistent/path/alertflow.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AlertflowError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
