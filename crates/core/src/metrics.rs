//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않았으면 모든 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `alertflow_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(alertflow_core::metrics::PIPELINE_LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 폐기 사유 레이블 키 (malformed_json, not_an_object, missing_field, invalid_timestamp, too_large)
pub const LABEL_REASON: &str = "reason";

// ─── Pipeline 메트릭 ───────────────────────────────────────────────

/// 입력 소스에서 읽은 라인 수 (counter)
pub const PIPELINE_LINES_READ_TOTAL: &str = "alertflow_pipeline_lines_read_total";

/// 이벤트로 파싱된 라인 수 (counter)
pub const PIPELINE_EVENTS_PARSED_TOTAL: &str = "alertflow_pipeline_events_parsed_total";

/// 폐기된 라인 수 (counter, label: reason)
pub const PIPELINE_LINES_DISCARDED_TOTAL: &str = "alertflow_pipeline_lines_discarded_total";

/// 채널에 대기 중인 라인 수 (gauge)
pub const PIPELINE_CHANNEL_DEPTH: &str = "alertflow_pipeline_channel_depth";

// ─── Detector 메트릭 ───────────────────────────────────────────────

/// 관찰된 critical 이벤트 수 (counter)
pub const DETECTOR_CRITICAL_EVENTS_TOTAL: &str = "alertflow_detector_critical_events_total";

/// 발생한 알림 수 (counter)
pub const DETECTOR_ALERTS_TOTAL: &str = "alertflow_detector_alerts_total";

// ─── Store 메트릭 ──────────────────────────────────────────────────

/// 저장된 알림 수 (counter)
pub const STORE_ALERTS_PERSISTED_TOTAL: &str = "alertflow_store_alerts_persisted_total";

/// 저장 실패 수 (counter)
pub const STORE_WRITE_FAILURES_TOTAL: &str = "alertflow_store_write_failures_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(PIPELINE_LINES_READ_TOTAL, "Lines read from the input source");
    describe_counter!(PIPELINE_EVENTS_PARSED_TOTAL, "Lines successfully parsed into events");
    describe_counter!(
        PIPELINE_LINES_DISCARDED_TOTAL,
        "Lines discarded by the parser, by reason"
    );
    describe_gauge!(PIPELINE_CHANNEL_DEPTH, "Lines waiting in the bounded channel");
    describe_counter!(
        DETECTOR_CRITICAL_EVENTS_TOTAL,
        "Critical-level events observed by the burst detector"
    );
    describe_counter!(DETECTOR_ALERTS_TOTAL, "Bursts detected");
    describe_counter!(STORE_ALERTS_PERSISTED_TOTAL, "Alerts durably appended");
    describe_counter!(STORE_WRITE_FAILURES_TOTAL, "Alert store write failures");
}
