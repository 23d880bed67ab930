//! 유한 FIFO 채널 -- 생산자와 소비자 사이의 라인 큐
//!
//! tokio `mpsc` 채널 위에 "처리 완료" 추적을 덧붙입니다.
//!
//! - [`QueueSender::enqueue`]: 큐가 가득 차면 공간이 생길 때까지 대기 (백프레셔)
//! - [`QueueReceiver::dequeue`]: 항목이 들어올 때까지 대기, 모든 송신자가 닫히면 `None`
//! - [`QueueReceiver::mark_done`]: 꺼낸 항목 하나의 처리가 끝났음을 알림
//! - [`DrainHandle::await_drained`]: 넣은 항목이 모두 처리 완료될 때까지 대기
//!
//! 대기 중인 항목 수(pending)는 넣을 때 증가하고 `mark_done` 때 감소합니다.
//! 꺼내기만 하고 아직 처리 중인 항목도 pending에 포함됩니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Notify, mpsc};

use alertflow_core::metrics as m;

use crate::error::LogPipelineError;

/// 송신/수신/드레인 핸들이 공유하는 완료 추적 상태
#[derive(Debug, Default)]
struct Tracker {
    pending: AtomicUsize,
    drained: Notify,
}

impl Tracker {
    fn record_depth(&self, depth: usize) {
        metrics::gauge!(m::PIPELINE_CHANNEL_DEPTH).set(depth as f64);
    }
}

/// 지정한 용량의 유한 채널을 생성합니다.
///
/// 용량이 0이면 설정 에러를 반환합니다.
pub fn bounded<T>(
    capacity: usize,
) -> Result<(QueueSender<T>, QueueReceiver<T>, DrainHandle), LogPipelineError> {
    if capacity == 0 {
        return Err(LogPipelineError::Config {
            field: "channel_capacity".to_owned(),
            reason: "must be at least 1".to_owned(),
        });
    }

    let (tx, rx) = mpsc::channel(capacity);
    let tracker = Arc::new(Tracker::default());

    Ok((
        QueueSender {
            tx,
            tracker: Arc::clone(&tracker),
        },
        QueueReceiver {
            rx,
            tracker: Arc::clone(&tracker),
        },
        DrainHandle { tracker },
    ))
}

/// 채널 송신 핸들
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: mpsc::Sender<T>,
    tracker: Arc<Tracker>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            tracker: Arc::clone(&self.tracker),
        }
    }
}

impl<T> QueueSender<T> {
    /// 항목을 큐 끝에 넣습니다. 큐가 가득 차 있으면 공간이 생길 때까지 대기합니다.
    ///
    /// 수신 측이 닫혀 있으면 `Channel` 에러를 반환합니다.
    /// 자리를 확보한 뒤에 카운터를 올리므로 대기 중에 취소되어도 pending이 어긋나지 않습니다.
    pub async fn enqueue(&self, item: T) -> Result<(), LogPipelineError> {
        let permit = self
            .tx
            .reserve()
            .await
            .map_err(|_| LogPipelineError::Channel("receiver closed".to_owned()))?;

        // 소비자가 mark_done을 먼저 호출하지 않도록 전송 전에 증가
        let depth = self.tracker.pending.fetch_add(1, Ordering::AcqRel) + 1;
        permit.send(item);

        self.tracker.record_depth(depth);
        Ok(())
    }

    /// 처리 완료되지 않은 항목 수
    pub fn pending(&self) -> usize {
        self.tracker.pending.load(Ordering::Acquire)
    }
}

/// 채널 수신 핸들
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: mpsc::Receiver<T>,
    tracker: Arc<Tracker>,
}

impl<T> QueueReceiver<T> {
    /// 가장 오래된 항목을 꺼냅니다. 비어 있으면 항목이 들어올 때까지 대기합니다.
    ///
    /// 모든 송신 핸들이 drop되고 큐가 비었으면 `None`을 반환합니다.
    pub async fn dequeue(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// 꺼낸 항목 하나의 처리가 끝났음을 알립니다.
    ///
    /// pending이 0이 되면 `await_drained` 대기자를 깨웁니다.
    /// 넣은 횟수보다 많이 호출되면 경고만 남기고 무시합니다.
    pub fn mark_done(&self) {
        let previous = self
            .tracker
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => {
                self.tracker.record_depth(0);
                self.tracker.drained.notify_waiters();
            }
            Ok(n) => self.tracker.record_depth(n - 1),
            Err(_) => {
                tracing::warn!("mark_done called with no pending items");
            }
        }
    }

    /// 처리 완료되지 않은 항목 수
    pub fn pending(&self) -> usize {
        self.tracker.pending.load(Ordering::Acquire)
    }
}

/// 드레인 대기 핸들
#[derive(Debug, Clone)]
pub struct DrainHandle {
    tracker: Arc<Tracker>,
}

impl DrainHandle {
    /// 넣은 모든 항목이 `mark_done` 될 때까지 대기합니다.
    ///
    /// 이미 pending이 0이면 즉시 반환합니다.
    pub async fn await_drained(&self) {
        loop {
            let notified = self.tracker.drained.notified();
            tokio::pin!(notified);
            // 카운터 확인 전에 등록해야 확인과 대기 사이의 알림을 놓치지 않음
            notified.as_mut().enable();

            if self.tracker.pending.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// 처리 완료되지 않은 항목 수
    pub fn pending(&self) -> usize {
        self.tracker.pending.load(Ordering::Acquire)
    }
}
