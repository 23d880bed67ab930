//! 파이프라인 오케스트레이션 -- 수집/파싱/탐지/저장의 전체 흐름을 관리합니다.
//!
//! # 내부 아키텍처
//! ```text
//! FileCollector (producer task)
//!     -> bounded channel
//!         -> consumer task: LineParser -> Detector -> AlertStore -> (optional) mpsc -> downstream
//! ```
//!
//! 생산자와 소비자는 채널 외에 어떤 가변 상태도 공유하지 않습니다.
//! 실행은 생산자가 입력 끝에 도달하고 채널에 넣은 모든 라인의 처리가 끝난 뒤에 종료됩니다.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use alertflow_core::pipeline::{Detector, LineParser};
use alertflow_core::types::Alert;

use crate::channel::{self, QueueReceiver};
use crate::collector::FileCollector;
use crate::config::PipelineConfig;
use crate::detector::BurstDetector;
use crate::error::LogPipelineError;
use crate::parser::JsonEventParser;
use crate::store::AlertStore;

/// 한 번의 실행 결과 요약
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    /// 채널에 넣은 라인 수
    pub lines_read: u64,
    /// 이벤트로 파싱된 라인 수
    pub events_parsed: u64,
    /// 폐기된 라인 수
    pub lines_discarded: u64,
    /// 탐지기가 관심을 가진 (critical) 이벤트 수
    pub critical_events: u64,
    /// 발생하여 저장된 알림 수
    pub alerts_raised: u64,
}

/// 로그 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use alertflow_log_pipeline::{LogPipelineBuilder, PipelineConfig};
///
/// let pipeline = LogPipelineBuilder::new()
///     .config(PipelineConfig::from_core(&core_config))
///     .build()?;
///
/// let summary = pipeline.run().await?;
/// println!("alerts: {}", summary.alerts_raised);
/// ```
pub struct LogPipeline {
    config: PipelineConfig,
    parser: Box<dyn LineParser>,
    detector: Box<dyn Detector>,
    store: Arc<AlertStore>,
    /// 저장된 알림을 전달할 외부 채널
    alert_tx: Option<mpsc::Sender<Alert>>,
    cancel: CancellationToken,
}

impl LogPipeline {
    /// 파이프라인 설정
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 알림 저장소
    pub fn store(&self) -> &Arc<AlertStore> {
        &self.store
    }

    /// 실행 중단 토큰
    ///
    /// 취소하면 생산자는 읽기를 멈추고 소비자는 다음 라인을 꺼내기 전에 종료합니다.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 입력 끝까지 파이프라인을 실행합니다.
    ///
    /// 입력을 열 수 없으면 채널을 만들기 전에 `SourceUnavailable`을 반환합니다.
    /// 알림 저장에 실패하면 실행을 중단하고 `Storage` 에러를 반환합니다.
    pub async fn run(self) -> Result<PipelineSummary, LogPipelineError> {
        let Self {
            config,
            parser,
            detector,
            store,
            alert_tx,
            cancel,
        } = self;

        let mut collector = FileCollector::open(&config).await?;
        let (tx, rx, drain) = channel::bounded::<String>(config.channel_capacity)?;

        tracing::info!(
            source = collector.source(),
            parser = parser.format_name(),
            detector = detector.name(),
            alerts = %store.path().display(),
            "starting log pipeline"
        );

        let mut producer = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                let result = collector.run(&tx, &cancel).await;
                // 송신 핸들을 닫아 소비자가 입력 끝을 알 수 있게 함
                drop(tx);
                result
            }
        });

        let mut consumer = tokio::spawn(consume(
            rx,
            parser,
            detector,
            Arc::clone(&store),
            alert_tx,
            cancel.clone(),
        ));

        let produced = tokio::select! {
            biased;
            res = &mut consumer => {
                // 소비자가 먼저 끝남: 저장 실패, 외부 취소, 또는 입력을 모두 처리함
                let interrupted = cancel.is_cancelled();
                cancel.cancel();
                let mut summary = join(res)?;
                summary.lines_read = join(producer.await)?;
                if interrupted {
                    tracing::warn!(?summary, "log pipeline stopped before input was exhausted");
                } else {
                    log_finished(&summary);
                }
                return Ok(summary);
            }
            res = &mut producer => res,
        };

        let lines_read = match join(produced) {
            Ok(n) => n,
            Err(e) => {
                cancel.cancel();
                // 소비자가 먼저 실패해 수신 측이 닫혔다면 소비자 에러가 원인
                return match join(consumer.await) {
                    Err(cause) => Err(cause),
                    Ok(_) => Err(e),
                };
            }
        };

        // 넣은 모든 라인이 처리 완료된 뒤에만 소비자를 취소
        let mut summary = tokio::select! {
            _ = drain.await_drained() => {
                cancel.cancel();
                join(consumer.await)?
            }
            res = &mut consumer => join(res)?,
        };
        summary.lines_read = lines_read;

        log_finished(&summary);
        Ok(summary)
    }
}

fn log_finished(summary: &PipelineSummary) {
    tracing::info!(
        lines_read = summary.lines_read,
        events_parsed = summary.events_parsed,
        lines_discarded = summary.lines_discarded,
        critical_events = summary.critical_events,
        alerts_raised = summary.alerts_raised,
        "log pipeline finished"
    );
}

/// 태스크 결과를 펼칩니다.
fn join<T>(res: Result<Result<T, LogPipelineError>, JoinError>) -> Result<T, LogPipelineError> {
    res.map_err(|e| LogPipelineError::Channel(format!("pipeline task failed: {e}")))?
}

/// 소비자 루프: 라인을 하나씩 꺼내 파싱/탐지/저장하고 처리 완료를 알립니다.
async fn consume(
    mut rx: QueueReceiver<String>,
    parser: Box<dyn LineParser>,
    mut detector: Box<dyn Detector>,
    store: Arc<AlertStore>,
    alert_tx: Option<mpsc::Sender<Alert>>,
    cancel: CancellationToken,
) -> Result<PipelineSummary, LogPipelineError> {
    let mut summary = PipelineSummary::default();

    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = rx.dequeue() => match line {
                Some(line) => line,
                None => break,
            },
        };

        let result = process_line(
            &line,
            parser.as_ref(),
            detector.as_mut(),
            &store,
            alert_tx.as_ref(),
            &mut summary,
        )
        .await;
        // 저장 실패여도 드레인 대기자가 멈추지 않도록 먼저 완료 처리
        rx.mark_done();
        result?;
    }

    Ok(summary)
}

async fn process_line(
    line: &str,
    parser: &dyn LineParser,
    detector: &mut dyn Detector,
    store: &AlertStore,
    alert_tx: Option<&mpsc::Sender<Alert>>,
    summary: &mut PipelineSummary,
) -> Result<(), LogPipelineError> {
    // 폐기 사유는 파서가 이미 기록함
    let Some(event) = parser.parse(line).event() else {
        summary.lines_discarded += 1;
        return Ok(());
    };
    summary.events_parsed += 1;

    if detector.matches(&event) {
        summary.critical_events += 1;
    }

    let Some(alert) = detector.observe(event) else {
        return Ok(());
    };

    store.append(&alert).await?;
    summary.alerts_raised += 1;

    if let Some(tx) = alert_tx {
        // 알림은 이미 저장되었으므로 전달 실패는 치명적이지 않음
        if let Err(e) = tx.try_send(alert) {
            tracing::warn!(error = %e, "failed to forward alert downstream");
        }
    }
    Ok(())
}

/// 로그 파이프라인 빌더
///
/// 파서와 탐지기를 지정하지 않으면 설정에서 기본 구현을 만듭니다.
pub struct LogPipelineBuilder {
    config: PipelineConfig,
    parser: Option<Box<dyn LineParser>>,
    detector: Option<Box<dyn Detector>>,
    store: Option<Arc<AlertStore>>,
    alert_tx: Option<mpsc::Sender<Alert>>,
}

impl LogPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            parser: None,
            detector: None,
            store: None,
            alert_tx: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 라인 파서를 교체합니다.
    pub fn parser(mut self, parser: Box<dyn LineParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// 탐지기를 교체합니다.
    pub fn detector(mut self, detector: Box<dyn Detector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// 다른 파이프라인과 공유할 알림 저장소를 지정합니다.
    ///
    /// 같은 저장소를 공유하면 동시에 실행되는 파이프라인의 기록이 서로 덮어써지지 않습니다.
    pub fn store(mut self, store: Arc<AlertStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 저장된 알림을 전달받을 외부 채널을 설정합니다.
    pub fn alert_sender(mut self, tx: mpsc::Sender<Alert>) -> Self {
        self.alert_tx = Some(tx);
        self
    }

    /// 파이프라인을 빌드합니다.
    pub fn build(self) -> Result<LogPipeline, LogPipelineError> {
        self.config.validate()?;

        let parser = match self.parser {
            Some(parser) => parser,
            None => Box::new(
                JsonEventParser::new(self.config.fields.clone())
                    .with_max_input_size(self.config.max_line_length),
            ),
        };

        let detector = match self.detector {
            Some(detector) => detector,
            None => Box::new(BurstDetector::from_config(&self.config)?),
        };

        let store = self.store.unwrap_or_else(|| {
            Arc::new(
                AlertStore::new(&self.config.alerts_path)
                    .with_field_mapping(self.config.fields.clone()),
            )
        });

        Ok(LogPipeline {
            config: self.config,
            parser,
            detector,
            store,
            alert_tx: self.alert_tx,
            cancel: CancellationToken::new(),
        })
    }
}

impl Default for LogPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfigBuilder;
    use std::io::Write;

    fn config_for(dir: &tempfile::TempDir, lines: &[&str]) -> PipelineConfig {
        let source = dir.path().join("events.log");
        let mut file = std::fs::File::create(&source).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }

        PipelineConfigBuilder::new()
            .source_path(source.to_string_lossy())
            .alerts_path(dir.path().join("alerts.json").to_string_lossy())
            .line_delay_ms(0)
            .channel_capacity(2)
            .build()
            .unwrap()
    }

    fn line(secs: u32, level: &str) -> String {
        format!(r#"{{"timestamp":"2024-01-15T12:00:{secs:02}Z","level":"{level}","message":"m{secs}"}}"#)
    }

    #[test]
    fn builder_with_invalid_config_fails() {
        let config = PipelineConfig {
            threshold: 0,
            ..Default::default()
        };
        assert!(LogPipelineBuilder::new().config(config).build().is_err());
    }

    #[test]
    fn builder_uses_configured_alert_path() {
        let config = PipelineConfigBuilder::new()
            .alerts_path("/tmp/custom-alerts.json")
            .build()
            .unwrap();
        let pipeline = LogPipelineBuilder::new().config(config).build().unwrap();
        assert_eq!(
            pipeline.store().path(),
            std::path::Path::new("/tmp/custom-alerts.json")
        );
    }

    #[tokio::test]
    async fn missing_source_fails_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfigBuilder::new()
            .source_path(dir.path().join("missing.log").to_string_lossy())
            .alerts_path(dir.path().join("alerts.json").to_string_lossy())
            .build()
            .unwrap();

        let err = LogPipelineBuilder::new()
            .config(config)
            .build()
            .unwrap()
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, LogPipelineError::SourceUnavailable { .. }));
        assert!(!dir.path().join("alerts.json").exists());
    }

    #[tokio::test]
    async fn run_detects_burst_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let lines = [
            line(0, "CRITICAL"),
            line(1, "INFO"),
            line(5, "CRITICAL"),
            line(10, "CRITICAL"),
            line(12, "CRITICAL"),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let config = config_for(&dir, &refs);

        let (alert_tx, mut alert_rx) = mpsc::channel(4);
        let pipeline = LogPipelineBuilder::new()
            .config(config)
            .alert_sender(alert_tx)
            .build()
            .unwrap();
        let store = Arc::clone(pipeline.store());

        let summary = pipeline.run().await.unwrap();
        assert_eq!(
            summary,
            PipelineSummary {
                lines_read: 5,
                events_parsed: 5,
                lines_discarded: 0,
                critical_events: 4,
                alerts_raised: 1,
            }
        );

        let alerts = store.load().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].len(), 3);

        let forwarded = alert_rx.recv().await.unwrap();
        assert_eq!(forwarded, alerts[0]);
    }

    #[tokio::test]
    async fn run_counts_discarded_lines() {
        let dir = tempfile::tempdir().unwrap();
        let first = line(0, "CRITICAL");
        let second = line(3, "CRITICAL");
        let config = config_for(&dir, &[&first, "not-json", "", "[1,2]", &second]);

        let summary = LogPipelineBuilder::new()
            .config(config)
            .build()
            .unwrap()
            .run()
            .await
            .unwrap();
        assert_eq!(summary.lines_read, 4);
        assert_eq!(summary.events_parsed, 2);
        assert_eq!(summary.lines_discarded, 2);
        assert_eq!(summary.alerts_raised, 0);
    }

    #[tokio::test]
    async fn storage_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let lines: Vec<String> = (0..3).map(|i| line(i, "CRITICAL")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let mut config = config_for(&dir, &refs);
        // 존재하지 않는 디렉토리에는 쓸 수 없음
        config.alerts_path = dir
            .path()
            .join("missing/alerts.json")
            .to_string_lossy()
            .into_owned();

        let err = LogPipelineBuilder::new()
            .config(config)
            .build()
            .unwrap()
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, LogPipelineError::Storage { .. }));
    }

    /// 채널이 가득 찬 상태에서 저장이 실패해도 `Storage` 에러가 반환되어야 함
    async fn assert_storage_error_while_producer_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let lines: Vec<String> = (0..50).map(|i| line(i, "CRITICAL")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let mut config = config_for(&dir, &refs);
        config.channel_capacity = 1;
        config.threshold = 1;
        config.alerts_path = dir
            .path()
            .join("missing/alerts.json")
            .to_string_lossy()
            .into_owned();

        for _ in 0..20 {
            let err = LogPipelineBuilder::new()
                .config(config.clone())
                .build()
                .unwrap()
                .run()
                .await
                .unwrap_err();
            assert!(
                matches!(err, LogPipelineError::Storage { .. }),
                "unexpected error: {err}"
            );
        }
    }

    #[tokio::test]
    async fn storage_failure_wins_over_closed_channel() {
        assert_storage_error_while_producer_blocked().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn storage_failure_wins_over_closed_channel_multi_thread() {
        assert_storage_error_while_producer_blocked().await;
    }

    #[tokio::test]
    async fn empty_input_finishes_with_zero_summary() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir, &[]);
        let summary = LogPipelineBuilder::new()
            .config(config)
            .build()
            .unwrap()
            .run()
            .await
            .unwrap();
        assert_eq!(summary, PipelineSummary::default());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_token_stops_slow_source() {
        let dir = tempfile::tempdir().unwrap();
        let lines: Vec<String> = (0..10).map(|i| line(i, "INFO")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let mut config = config_for(&dir, &refs);
        config.line_delay_ms = 60_000;

        let pipeline = LogPipelineBuilder::new().config(config).build().unwrap();
        let token = pipeline.shutdown_token();
        let handle = tokio::spawn(pipeline.run());

        tokio::time::sleep(std::time::Duration::from_secs(150)).await;
        token.cancel();

        let summary = handle.await.unwrap().unwrap();
        assert!(summary.lines_read < 10);
    }
}
