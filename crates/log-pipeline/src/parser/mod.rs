//! 라인 파싱 모듈 -- 원시 텍스트 라인을 [`Event`](alertflow_core::Event)로 변환
//!
//! 각 파서는 core의 [`LineParser`](alertflow_core::pipeline::LineParser) trait을 구현합니다.
//! 파싱 실패는 에러로 전파되지 않고 폐기 신호로 반환됩니다.
//!
//! # 지원 형식
//! - 한 줄 JSON 객체 ([`JsonEventParser`])

pub mod json;

pub use json::JsonEventParser;
