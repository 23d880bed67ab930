//! 라인 수집 모듈 -- 입력 소스에서 원시 라인을 읽어 채널로 전달합니다.
//!
//! # 수집 소스
//! - [`FileCollector`]: 파일 또는 표준 입력에서 라인 단위로 읽기
//!
//! # 아키텍처
//! 수집기는 자체 tokio 태스크에서 실행되며, 읽은 라인을
//! [`QueueSender`](crate::channel::QueueSender)를 통해 소비자에게 전달합니다.
//! 채널이 가득 차면 수집기는 공간이 생길 때까지 대기합니다.

pub mod file;

pub use file::FileCollector;

/// 수집기 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorStatus {
    /// 실행 대기 중
    Idle,
    /// 실행 중
    Running,
    /// 에러로 중단됨
    Error(String),
    /// 정상 종료됨 (입력 끝 도달 또는 취소)
    Stopped,
}

impl std::fmt::Display for CollectorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Error(reason) => write!(f, "error: {reason}"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        assert_eq!(CollectorStatus::Idle.to_string(), "idle");
        assert_eq!(
            CollectorStatus::Error("broken pipe".to_owned()).to_string(),
            "error: broken pipe"
        );
    }
}
