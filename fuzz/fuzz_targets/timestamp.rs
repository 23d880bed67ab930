#![no_main]

use chrono::Datelike;
use libfuzzer_sys::fuzz_target;
use alertflow_core::event::parse_timestamp;

fuzz_target!(|data: &str| {
    // 파싱에 성공한 값은 RFC 3339로 다시 읽을 수 있어야 함 (4자리 연도 한정)
    if let Ok(ts) = parse_timestamp(data) {
        if !(0..=9999).contains(&ts.year()) {
            return;
        }
        let again = parse_timestamp(&ts.to_rfc3339()).expect("rfc3339 output must reparse");
        assert_eq!(ts, again);
    }
});
