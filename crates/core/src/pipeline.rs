//! 파이프라인 trait -- 모듈 확장 포인트 정의

use crate::error::ParseError;
use crate::event::Event;
use crate::types::Alert;

/// 한 라인의 파싱 결과
///
/// 파싱 실패는 에러로 전파되지 않고 `Discarded`로 표현됩니다.
/// 한 라인의 손상이 스트림 전체를 멈추게 해서는 안 됩니다.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// 이벤트로 변환됨
    Parsed(Event),
    /// 버려짐 (사유 포함)
    Discarded(ParseError),
}

impl ParseOutcome {
    /// 파싱된 이벤트를 반환합니다. 버려진 경우 `None`.
    pub fn event(self) -> Option<Event> {
        match self {
            Self::Parsed(event) => Some(event),
            Self::Discarded(_) => None,
        }
    }
}

/// 라인 파서 trait
///
/// 새로운 입력 형식을 지원하려면 이 trait을 구현합니다.
pub trait LineParser: Send + Sync {
    /// 지원하는 입력 형식 이름
    fn format_name(&self) -> &str;

    /// 공백이 제거된 한 라인을 이벤트로 변환
    fn parse(&self, line: &str) -> ParseOutcome;
}

/// 탐지 로직을 구현하는 trait
///
/// 탐지기는 상태를 가지며 이벤트를 입력 순서대로 하나씩 관찰합니다.
pub trait Detector: Send {
    /// 탐지기 이름
    fn name(&self) -> &str;

    /// 탐지 대상 이벤트인지 확인 (상태를 바꾸지 않음)
    fn matches(&self, event: &Event) -> bool;

    /// 이벤트를 관찰하고, 버스트가 완성되면 알림을 반환
    fn observe(&mut self, event: Event) -> Option<Alert>;
}
