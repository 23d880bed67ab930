//! 읽기 전용 로더 -- 완료된 로그와 저장된 알림을 한 번에 읽어옵니다.
//!
//! 보고서 생성이나 알림 조회처럼 "있는 만큼 보여주는" 소비자를 위한 함수입니다.
//! 파일이 없거나 비어 있거나 손상되어 있어도 에러를 반환하지 않고
//! 경고를 남긴 뒤 읽을 수 있는 만큼만 반환합니다.

use std::path::Path;

use alertflow_core::event::{Event, EventFieldMapping, parse_timestamp};
use alertflow_core::types::Alert;
use serde_json::Value;

use crate::parser::JsonEventParser;

/// 파일 내용을 읽습니다. 없거나 읽을 수 없으면 `None`.
async fn read_lenient(path: &Path, what: &str) -> Option<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "{what} file not found, treating as empty");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read {what} file");
            None
        }
    }
}

/// JSON 라인 로그 파일의 모든 이벤트를 기본 필드 매핑으로 읽습니다.
pub async fn load_events(path: impl AsRef<Path>) -> Vec<Event> {
    load_events_with(path, &JsonEventParser::default()).await
}

/// 지정한 파서로 로그 파일의 모든 이벤트를 읽습니다.
///
/// 파싱할 수 없는 라인은 건너뜁니다. 결과는 파일 순서를 유지합니다.
pub async fn load_events_with(path: impl AsRef<Path>, parser: &JsonEventParser) -> Vec<Event> {
    let path = path.as_ref();
    let Some(bytes) = read_lenient(path, "event").await else {
        return Vec::new();
    };

    let content = String::from_utf8_lossy(&bytes);
    let (events, discarded) = decode_events(&content, parser);

    tracing::debug!(
        path = %path.display(),
        events = events.len(),
        discarded,
        "loaded events"
    );
    events
}

/// 내용의 각 라인을 이벤트로 디코딩하고 버린 라인 수를 함께 반환합니다.
///
/// 파이프라인 경로(`LineParser::parse`)를 거치지 않으므로 폐기 메트릭이나
/// 라인별 경고를 남기지 않습니다.
fn decode_events(content: &str, parser: &JsonEventParser) -> (Vec<Event>, usize) {
    let mut discarded = 0usize;
    let events = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match parser.decode(line) {
            Ok(event) => Some(event),
            Err(_) => {
                discarded += 1;
                None
            }
        })
        .collect();
    (events, discarded)
}

/// 저장된 모든 알림을 기본 필드 매핑으로 저장 순서대로 읽습니다.
///
/// 파일이 없거나 비어 있거나 JSON 배열이 아니면 빈 목록을 반환합니다.
/// 배열 안의 개별 항목이 손상되어 있으면 그 항목만 건너뜁니다.
pub async fn load_alerts(path: impl AsRef<Path>) -> Vec<Alert> {
    load_alerts_with(path, &EventFieldMapping::default()).await
}

/// 지정한 필드 매핑으로 저장된 알림을 읽습니다.
///
/// 알림에 담긴 이벤트는 원본 필드 그대로 저장되므로, 파이프라인과 같은
/// 매핑을 써야 이벤트를 다시 해석할 수 있습니다.
pub async fn load_alerts_with(path: impl AsRef<Path>, mapping: &EventFieldMapping) -> Vec<Alert> {
    let path = path.as_ref();
    let Some(bytes) = read_lenient(path, "alert").await else {
        return Vec::new();
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Vec::new();
    }

    let records = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Array(records)) => records,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "alert store is not a JSON array, ignoring");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "alert store is corrupted, ignoring");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match alert_from_record(record, mapping) {
            Ok(alert) => Some(alert),
            Err(reason) => {
                tracing::warn!(
                    path = %path.display(),
                    index,
                    error = %reason,
                    "skipping malformed alert record"
                );
                None
            }
        })
        .collect()
}

/// 저장 레코드 하나를 알림으로 복원합니다.
fn alert_from_record(record: Value, mapping: &EventFieldMapping) -> Result<Alert, String> {
    let Value::Object(mut record) = record else {
        return Err("record is not an object".to_owned());
    };

    let triggered_at = match record.get("triggered_at") {
        Some(Value::String(s)) => parse_timestamp(s).map_err(|e| e.to_string())?,
        _ => return Err("missing triggered_at".to_owned()),
    };

    let events = match record.remove("events") {
        Some(Value::Array(events)) => events
            .into_iter()
            .map(|value| Event::from_value(value, mapping).map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err("missing events array".to_owned()),
    };

    Ok(Alert::new(triggered_at, events))
}
