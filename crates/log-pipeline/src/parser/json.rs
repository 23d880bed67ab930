//! JSON 라인 파서
//!
//! 한 라인의 JSON 객체를 [`Event`]로 변환합니다. 필드 이름 매핑을 통해
//! 타임스탬프/레벨/메시지를 읽을 키를 바꿀 수 있습니다.
//!
//! 디코딩 실패, 최상위가 객체가 아닌 경우, 타임스탬프 누락 또는 해석 실패는
//! 모두 [`ParseOutcome::Discarded`]로 반환되며 스트림은 계속 진행됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use alertflow_core::pipeline::LineParser;
//! use alertflow_log_pipeline::parser::JsonEventParser;
//!
//! let parser = JsonEventParser::default();
//! let outcome = parser.parse(r#"{"timestamp":"2024-01-15T12:00:00Z","level":"critical"}"#);
//! assert_eq!(outcome.event().unwrap().level(), "CRITICAL");
//! ```

use alertflow_core::error::ParseError;
use alertflow_core::event::{Event, EventFieldMapping};
use alertflow_core::metrics as m;
use alertflow_core::pipeline::{LineParser, ParseOutcome};
use serde_json::Value;

/// 기본 최대 입력 크기 (1MB)
const DEFAULT_MAX_INPUT_SIZE: usize = 1024 * 1024;

/// JSON 라인 파서
#[derive(Debug, Clone)]
pub struct JsonEventParser {
    /// 필드 매핑 설정
    mapping: EventFieldMapping,
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl Default for JsonEventParser {
    fn default() -> Self {
        Self::new(EventFieldMapping::default())
    }
}

impl JsonEventParser {
    /// 커스텀 필드 매핑으로 새 파서를 생성합니다.
    pub fn new(mapping: EventFieldMapping) -> Self {
        Self {
            mapping,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// 라인을 이벤트로 디코딩합니다.
    pub fn decode(&self, line: &str) -> Result<Event, ParseError> {
        if line.len() > self.max_input_size {
            return Err(ParseError::TooLarge {
                size: line.len(),
                max: self.max_input_size,
            });
        }

        let value: Value = serde_json::from_str(line).map_err(|e| ParseError::MalformedJson {
            column: e.column(),
            reason: e.to_string(),
        })?;

        Event::from_value(value, &self.mapping)
    }
}

impl LineParser for JsonEventParser {
    fn format_name(&self) -> &str {
        "json"
    }

    fn parse(&self, line: &str) -> ParseOutcome {
        match self.decode(line) {
            Ok(event) => {
                metrics::counter!(m::PIPELINE_EVENTS_PARSED_TOTAL).increment(1);
                ParseOutcome::Parsed(event)
            }
            Err(reason) => {
                tracing::warn!(
                    reason = %reason,
                    line = %truncate(line, 120),
                    "discarding line"
                );
                metrics::counter!(
                    m::PIPELINE_LINES_DISCARDED_TOTAL,
                    m::LABEL_REASON => reason.reason_label()
                )
                .increment(1);
                ParseOutcome::Discarded(reason)
            }
        }
    }
}

/// 로그 출력용으로 라인을 자릅니다 (문자 경계 유지).
fn truncate(line: &str, max_chars: usize) -> &str {
    match line.char_indices().nth(max_chars) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}
