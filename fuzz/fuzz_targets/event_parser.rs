#![no_main]

use libfuzzer_sys::fuzz_target;
use alertflow_core::pipeline::{LineParser, ParseOutcome};
use alertflow_log_pipeline::parser::JsonEventParser;

fuzz_target!(|data: &[u8]| {
    let parser = JsonEventParser::default();
    let line = String::from_utf8_lossy(data);

    // 어떤 입력이든 Parsed 또는 Discarded 중 하나여야 하며 패닉이 없어야 함
    if let ParseOutcome::Parsed(event) = parser.parse(line.trim()) {
        assert_eq!(event.level(), event.level().to_uppercase());
        assert!(event.raw().contains_key("timestamp"));
    }
});
