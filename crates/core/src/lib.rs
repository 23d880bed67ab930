//! alertflow 공통 크레이트
//!
//! 로그 스트림 분석 파이프라인이 공유하는 도메인 타입, 에러, 설정,
//! 확장 포인트 trait, 메트릭 이름을 정의합니다.

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{AlertflowError, ConfigError, ParseError, PipelineError, StorageError};

// 설정
pub use config::AlertflowConfig;

// 이벤트
pub use event::{Event, EventFieldMapping, parse_timestamp};

// 파이프라인 trait
pub use pipeline::{Detector, LineParser, ParseOutcome};

// 도메인 타입
pub use types::Alert;
