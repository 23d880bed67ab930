//! 이벤트 모델 -- 파싱된 로그 한 줄의 구조화 표현
//!
//! [`Event`]는 생성 이후 변경되지 않습니다. 원본 필드 맵(`raw`)을 그대로 보관하므로
//! 알림 저장 시 원래 있던 필드가 손실 없이 기록됩니다.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ParseError;

/// 오프셋이 없는 타임스탬프 형식 (UTC로 간주)
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// RFC 3339 파서가 거부하는 콜론 없는 오프셋 형식 (`+0900`)
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// 이벤트 필드 이름 매핑
///
/// 입력 JSON 객체에서 타임스탬프, 레벨, 메시지를 읽을 키를 지정합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFieldMapping {
    /// 타임스탬프 필드명 (기본: "timestamp")
    pub timestamp_field: String,
    /// 레벨 필드명 (기본: "level")
    pub level_field: String,
    /// 메시지 필드명 (기본: "message")
    pub message_field: String,
}

impl Default for EventFieldMapping {
    fn default() -> Self {
        Self {
            timestamp_field: "timestamp".to_owned(),
            level_field: "level".to_owned(),
            message_field: "message".to_owned(),
        }
    }
}

/// 로그 한 줄에서 파싱된 이벤트
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    timestamp: DateTime<FixedOffset>,
    level: String,
    message: String,
    raw: Map<String, Value>,
}

impl Event {
    /// 원본 필드 맵에서 이벤트를 생성합니다.
    ///
    /// 타임스탬프가 없거나 절대 시각으로 해석할 수 없으면 에러를 반환합니다.
    /// 레벨과 메시지는 없으면 빈 문자열이 됩니다.
    pub fn from_raw(raw: Map<String, Value>, mapping: &EventFieldMapping) -> Result<Self, ParseError> {
        let timestamp = match raw.get(&mapping.timestamp_field) {
            Some(Value::String(s)) => parse_timestamp(s)?,
            Some(Value::Null) | None => {
                return Err(ParseError::MissingField {
                    field: mapping.timestamp_field.clone(),
                });
            }
            Some(other) => {
                return Err(ParseError::InvalidTimestamp {
                    value: other.to_string(),
                    reason: "expected an ISO-8601 string".to_owned(),
                });
            }
        };

        let level = text_field(&raw, &mapping.level_field).to_uppercase();
        let message = text_field(&raw, &mapping.message_field);

        Ok(Self {
            timestamp,
            level,
            message,
            raw,
        })
    }

    /// JSON 값에서 이벤트를 생성합니다. 최상위가 객체가 아니면 실패합니다.
    pub fn from_value(value: Value, mapping: &EventFieldMapping) -> Result<Self, ParseError> {
        match value {
            Value::Object(raw) => Self::from_raw(raw, mapping),
            _ => Err(ParseError::NotAnObject),
        }
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// 대문자로 정규화된 레벨
    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 원본 필드 맵
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} - {}", self.timestamp, self.level, self.message)
    }
}

// 저장 형식은 원본 필드 맵 그대로입니다.
impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_raw(raw, &EventFieldMapping::default()).map_err(serde::de::Error::custom)
    }
}

/// 텍스트 필드를 추출합니다. 없거나 null이면 빈 문자열입니다.
fn text_field(raw: &Map<String, Value>, field: &str) -> String {
    match raw.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// ISO-8601 계열 타임스탬프 문자열을 절대 시각으로 파싱합니다.
///
/// 지원 형식:
/// - RFC 3339: `2024-01-15T12:00:00Z`, `2024-01-15T12:00:00.250+09:00`
/// - 공백 구분자: `2024-01-15 12:00:00+00:00`
/// - 콜론 없는 오프셋: `2024-01-15T12:00:00+0900`
/// - 오프셋 없음 (UTC로 간주): `2024-01-15T12:00:00`
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    let trimmed = value.trim();

    let rfc_err = match DateTime::parse_from_rfc3339(trimmed) {
        Ok(dt) => return Ok(dt),
        Err(e) => e,
    };

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    Err(ParseError::InvalidTimestamp {
        value: value.to_owned(),
        reason: rfc_err.to_string(),
    })
}
