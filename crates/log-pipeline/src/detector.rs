//! 슬라이딩 윈도우 버스트 탐지기
//!
//! critical 레벨 이벤트가 시간 윈도우 안에서 임계 수 이상 발생하면 알림을 생성합니다.
//!
//! # 알고리즘
//!
//! 이벤트 `e`를 관찰할 때마다:
//! 1. `e.level`이 critical 레벨이 아니면 무시 (버퍼에 넣지 않음)
//! 2. `e`를 버퍼 끝에 추가
//! 3. `e.timestamp - front.timestamp`가 윈도우보다 **큰** 이벤트를 앞에서부터 제거
//!    (윈도우와 같으면 유지)
//! 4. 버퍼 크기가 임계 수 이상이면 버퍼 전체로 알림을 만들고 버퍼를 비움
//!
//! 알림이 발생하면 버퍼를 통째로 비우므로 한 이벤트가 두 알림에 포함되는 일은 없습니다.
//! 다음 알림은 새로 누적된 이벤트로만 만들어집니다.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta};

use alertflow_core::event::Event;
use alertflow_core::metrics as m;
use alertflow_core::pipeline::Detector;
use alertflow_core::types::Alert;

use crate::config::PipelineConfig;
use crate::error::LogPipelineError;

/// 슬라이딩 윈도우 버스트 탐지기
#[derive(Debug)]
pub struct BurstDetector {
    /// 윈도우 안의 critical 이벤트 (시간 순)
    buffer: VecDeque<Event>,
    window: TimeDelta,
    threshold: usize,
    /// 대문자로 정규화된 critical 레벨 집합
    critical_levels: HashSet<String>,
}

impl BurstDetector {
    /// 새 탐지기를 생성합니다.
    ///
    /// 임계 수가 0이거나 윈도우가 표현 범위를 넘으면 설정 에러를 반환합니다.
    pub fn new<I, S>(
        window: Duration,
        threshold: usize,
        critical_levels: I,
    ) -> Result<Self, LogPipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if threshold == 0 {
            return Err(LogPipelineError::Config {
                field: "threshold".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        let window = TimeDelta::from_std(window).map_err(|e| LogPipelineError::Config {
            field: "window_secs".to_owned(),
            reason: e.to_string(),
        })?;

        let critical_levels: HashSet<String> = critical_levels
            .into_iter()
            .map(|l| l.as_ref().trim().to_uppercase())
            .filter(|l| !l.is_empty())
            .collect();

        if critical_levels.is_empty() {
            return Err(LogPipelineError::Config {
                field: "critical_levels".to_owned(),
                reason: "at least one non-empty level is required".to_owned(),
            });
        }

        Ok(Self {
            buffer: VecDeque::with_capacity(threshold),
            window,
            threshold,
            critical_levels,
        })
    }

    /// 파이프라인 설정으로 탐지기를 생성합니다.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, LogPipelineError> {
        Self::new(
            Duration::from_secs(config.window_secs),
            config.threshold,
            &config.critical_levels,
        )
    }

    /// 이벤트가 critical 레벨인지 확인합니다.
    pub fn is_critical(&self, event: &Event) -> bool {
        self.critical_levels.contains(event.level())
    }

    /// 현재 버퍼에 있는 이벤트 수
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// 최신 이벤트 기준으로 윈도우를 벗어난 이벤트를 앞에서부터 제거합니다.
    fn evict_expired(&mut self, now: DateTime<FixedOffset>) {
        while let Some(front) = self.buffer.front() {
            if now - front.timestamp() > self.window {
                self.buffer.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Detector for BurstDetector {
    fn name(&self) -> &str {
        "burst"
    }

    fn matches(&self, event: &Event) -> bool {
        self.is_critical(event)
    }

    fn observe(&mut self, event: Event) -> Option<Alert> {
        if !self.is_critical(&event) {
            return None;
        }
        metrics::counter!(m::DETECTOR_CRITICAL_EVENTS_TOTAL).increment(1);

        let triggered_at = event.timestamp();
        self.buffer.push_back(event);
        self.evict_expired(triggered_at);

        if self.buffer.len() < self.threshold {
            return None;
        }

        let events: Vec<Event> = self.buffer.drain(..).collect();
        tracing::info!(
            triggered_at = %triggered_at,
            events = events.len(),
            "burst detected"
        );
        metrics::counter!(m::DETECTOR_ALERTS_TOTAL).increment(1);
        Some(Alert::new(triggered_at, events))
    }
}
