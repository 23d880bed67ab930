//! alertflow 로그 파이프라인
//!
//! JSON 라인 로그를 읽어 critical 이벤트 버스트를 탐지하고 알림을 저장합니다.
//!
//! # 모듈 구성
//!
//! - [`collector`]: 입력 파일/표준 입력에서 라인 수집 (라인 간 지연 포함)
//! - [`channel`]: 백프레셔와 드레인 추적을 제공하는 유한 FIFO 채널
//! - [`parser`]: JSON 라인 파서 (실패 시 폐기 신호 반환)
//! - [`detector`]: 슬라이딩 윈도우 버스트 탐지기
//! - [`store`]: 락으로 보호되는 알림 저장소
//! - [`loader`]: 완료된 로그와 저장된 알림의 읽기 전용 로더
//! - [`pipeline`]: 생산자/소비자 태스크 오케스트레이션
//! - [`config`]: 파이프라인 설정 (core 설정에서 파생)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! FileCollector -> channel -> JsonEventParser -> BurstDetector -> AlertStore
//!      |              |              |                  |              |
//!  delay/line    backpressure   discard bad lines   window+threshold  lock + rename
//! ```

pub mod channel;
pub mod config;
pub mod detector;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod store;

pub mod collector;
pub mod parser;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LogPipeline, LogPipelineBuilder, PipelineSummary};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::LogPipelineError;

// 파서
pub use parser::JsonEventParser;

// 탐지기
pub use detector::BurstDetector;

// 수집기
pub use collector::FileCollector;

// 저장소
pub use loader::{load_alerts, load_alerts_with, load_events, load_events_with};
pub use store::AlertStore;
