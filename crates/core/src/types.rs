//! 도메인 타입 -- 탐지된 버스트를 나타내는 알림

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// 탐지된 버스트 알림
///
/// 임계 수 이상의 critical 이벤트가 시간 윈도우 안에 발생했을 때 한 번 생성되며,
/// 이후 변경되지 않습니다.
///
/// 저장 형식:
/// ```json
/// { "triggered_at": "2024-01-15T12:00:10+00:00", "events": [ { ...원본 필드... } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// 버스트를 완성한 이벤트의 타임스탬프 (탐지 시점의 벽시계 시각이 아님)
    #[serde(with = "iso8601")]
    triggered_at: DateTime<FixedOffset>,
    /// 버스트를 구성한 이벤트 (윈도우 순서)
    events: Vec<Event>,
}

impl Alert {
    /// 새 알림을 생성합니다.
    pub fn new(triggered_at: DateTime<FixedOffset>, events: Vec<Event>) -> Self {
        Self {
            triggered_at,
            events,
        }
    }

    pub fn triggered_at(&self) -> DateTime<FixedOffset> {
        self.triggered_at
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// 구성 이벤트 수
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// 정규 저장 형식의 `serde_json::Value`로 변환합니다.
    pub fn to_record(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// `triggered_at` 직렬화 -- ISO-8601 문자열, 원래 오프셋 유지
mod iso8601 {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::event::parse_timestamp(&s).map_err(serde::de::Error::custom)
    }
}
