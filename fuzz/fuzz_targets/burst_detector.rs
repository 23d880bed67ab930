#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use alertflow_core::event::{Event, EventFieldMapping};
use alertflow_core::pipeline::Detector;
use alertflow_log_pipeline::detector::BurstDetector;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    window_secs: u8,
    threshold: u8,
    /// (이전 이벤트 대비 초 단위 이동, critical 여부)
    steps: Vec<(i16, bool)>,
}

const BASE: i64 = 1_705_320_000;

fuzz_target!(|input: FuzzInput| {
    let threshold = usize::from(input.threshold % 16) + 1;
    let Ok(mut detector) = BurstDetector::new(
        Duration::from_secs(u64::from(input.window_secs)),
        threshold,
        ["CRITICAL"],
    ) else {
        return;
    };

    let mapping = EventFieldMapping::default();
    let mut secs = BASE;
    for (shift, critical) in input.steps.into_iter().take(512) {
        secs += i64::from(shift);
        let Some(ts) = chrono::DateTime::from_timestamp(secs, 0) else {
            return;
        };
        let value = serde_json::json!({
            "timestamp": ts.to_rfc3339(),
            "level": if critical { "CRITICAL" } else { "INFO" },
            "message": "fuzz",
        });
        let Ok(event) = Event::from_value(value, &mapping) else {
            return;
        };
        let timestamp = event.timestamp();

        if let Some(alert) = detector.observe(event) {
            assert!(critical, "only a critical event can complete a burst");
            assert!(alert.len() >= threshold);
            assert_eq!(alert.triggered_at(), timestamp);
            assert_eq!(detector.buffered(), 0);
        }
        assert!(detector.buffered() < threshold);
    }
});
