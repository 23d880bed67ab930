//! 파일 기반 라인 수집기
//!
//! 입력 파일(또는 표준 입력)을 처음부터 끝까지 한 번 읽으며
//! 공백을 제거한 비어 있지 않은 라인을 채널에 넣습니다.
//! 각 라인을 넣기 전에 설정된 지연만큼 대기하여 실시간 유입을 흉내냅니다.
//!
//! 입력 끝에 도달하면 에러 없이 종료하며, 다시 열거나 재시도하지 않습니다.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use alertflow_core::metrics as m;

use super::CollectorStatus;
use crate::channel::QueueSender;
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;

/// 표준 입력을 뜻하는 경로
pub const STDIN_PATH: &str = "-";

/// 수집기 입력 리더
pub type BoxedLineReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// 파일 기반 라인 수집기
pub struct FileCollector<R = BoxedLineReader> {
    reader: R,
    /// 수집 소스 식별자 (예: "file:events.log", "stdin")
    source: String,
    line_delay: Duration,
    max_line_length: usize,
    status: CollectorStatus,
}

impl FileCollector<BoxedLineReader> {
    /// 설정의 입력 경로를 엽니다.
    ///
    /// 열 수 없으면 채널에 아무것도 넣기 전에 `SourceUnavailable`을 반환합니다.
    pub async fn open(config: &PipelineConfig) -> Result<Self, LogPipelineError> {
        let path = config.source_path.as_str();

        if path == STDIN_PATH {
            let reader: BoxedLineReader = Box::new(BufReader::new(tokio::io::stdin()));
            return Ok(Self::new(reader, "stdin", config));
        }

        let file = tokio::fs::File::open(Path::new(path)).await.map_err(|e| {
            LogPipelineError::SourceUnavailable {
                path: path.to_owned(),
                reason: e.to_string(),
            }
        })?;

        // 디렉토리는 열리지만 읽을 수 없으므로 시작 전에 거부
        let metadata = file
            .metadata()
            .await
            .map_err(|e| LogPipelineError::SourceUnavailable {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        if metadata.is_dir() {
            return Err(LogPipelineError::SourceUnavailable {
                path: path.to_owned(),
                reason: "is a directory".to_owned(),
            });
        }

        let reader: BoxedLineReader = Box::new(BufReader::new(file));
        Ok(Self::new(reader, format!("file:{path}"), config))
    }
}

impl<R> FileCollector<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// 임의의 버퍼 리더로 수집기를 생성합니다.
    pub fn new(reader: R, source: impl Into<String>, config: &PipelineConfig) -> Self {
        Self {
            reader,
            source: source.into(),
            line_delay: config.line_delay(),
            max_line_length: config.max_line_length,
            status: CollectorStatus::Idle,
        }
    }

    /// 입력 끝까지 읽어 채널에 넣습니다.
    ///
    /// 채널에 넣은 라인 수를 반환합니다. `cancel`이 취소되면 현재 위치에서 중단합니다.
    pub async fn run(
        &mut self,
        tx: &QueueSender<String>,
        cancel: &CancellationToken,
    ) -> Result<u64, LogPipelineError> {
        self.status = CollectorStatus::Running;
        tracing::info!(source = %self.source, "collector started");

        let result = self.read_loop(tx, cancel).await;

        match &result {
            Ok(sent) => {
                self.status = CollectorStatus::Stopped;
                tracing::info!(source = %self.source, lines = sent, "collector finished");
            }
            Err(e) => {
                self.status = CollectorStatus::Error(e.to_string());
                tracing::error!(source = %self.source, error = %e, "collector failed");
            }
        }
        result
    }

    async fn read_loop(
        &mut self,
        tx: &QueueSender<String>,
        cancel: &CancellationToken,
    ) -> Result<u64, LogPipelineError> {
        let mut buf = Vec::with_capacity(1024);
        let mut sent = 0u64;

        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(sent),
                read = self.reader.read_until(b'\n', &mut buf) => read,
            };
            let n = read.map_err(|e| LogPipelineError::Collector {
                source_type: self.source.clone(),
                reason: e.to_string(),
            })?;
            if n == 0 {
                return Ok(sent);
            }

            if buf.len() > self.max_line_length {
                tracing::warn!(
                    source = %self.source,
                    size = buf.len(),
                    max = self.max_line_length,
                    "skipping oversized line"
                );
                continue;
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let line = line.to_owned();

            if !self.line_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(sent),
                    _ = tokio::time::sleep(self.line_delay) => {}
                }
            }

            // 채널이 가득 찬 상태에서도 종료 요청에 반응
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(sent),
                result = tx.enqueue(line) => result?,
            }
            sent += 1;
            metrics::counter!(m::PIPELINE_LINES_READ_TOTAL).increment(1);
        }
    }

    /// 수집 소스 식별자
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 현재 상태를 반환합니다.
    pub fn status(&self) -> &CollectorStatus {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel;
    use crate::config::PipelineConfigBuilder;
    use std::io::Write;

    fn config(delay_ms: u64) -> PipelineConfig {
        PipelineConfigBuilder::new()
            .line_delay_ms(delay_ms)
            .max_line_length(64)
            .build()
            .unwrap()
    }

    async fn collect(input: &'static [u8], config: &PipelineConfig) -> Vec<String> {
        let (tx, mut rx, _drain) = channel::bounded(64).unwrap();
        let mut collector = FileCollector::new(input, "test", config);
        let sent = collector
            .run(&tx, &CancellationToken::new())
            .await
            .unwrap();
        drop(tx);

        let mut lines = Vec::new();
        while let Some(line) = rx.dequeue().await {
            lines.push(line);
            rx.mark_done();
        }
        assert_eq!(sent as usize, lines.len());
        assert_eq!(*collector.status(), CollectorStatus::Stopped);
        lines
    }

    #[tokio::test]
    async fn trims_and_skips_blank_lines() {
        let lines = collect(b"  first  \n\n   \nsecond\r\nthird", &config(0)).await;
        assert_eq!(lines, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn skips_oversized_lines() {
        let input: &'static [u8] = b"short\n\
            xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx\n\
            after\n";
        let lines = collect(input, &config(0)).await;
        assert_eq!(lines, vec!["short", "after"]);
    }

    #[tokio::test]
    async fn invalid_utf8_is_decoded_lossily() {
        let lines = collect(b"ok\n\xff\xfe broken\nnext\n", &config(0)).await;
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains('\u{FFFD}'));
        assert_eq!(lines[2], "next");
    }

    #[tokio::test(start_paused = true)]
    async fn applies_delay_before_each_push() {
        let start = tokio::time::Instant::now();
        let lines = collect(b"a\nb\nc\n", &config(2000)).await;
        assert_eq!(lines.len(), 3);
        assert!(start.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_collection() {
        let (tx, _rx, _drain) = channel::bounded(64).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut collector = FileCollector::new(&b"a\nb\n"[..], "test", &config(1000));
        let sent = collector.run(&tx, &cancel).await.unwrap();
        assert_eq!(sent, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_unblocks_full_channel() {
        let (tx, _rx, drain) = channel::bounded(1).unwrap();
        let cancel = CancellationToken::new();
        let mut collector = FileCollector::new(&b"a\nb\nc\n"[..], "test", &config(0));

        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move { collector.run(&tx, &cancel).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        let sent = handle.await.unwrap().unwrap();
        assert_eq!(sent, 1);
        assert_eq!(drain.pending(), 1);
    }

    #[tokio::test]
    async fn open_missing_file_is_source_unavailable() {
        let config = PipelineConfigBuilder::new()
            .source_path("/nonexistent/alertflow/events.log")
            .build()
            .unwrap();
        let err = FileCollector::open(&config).await.err().unwrap();
        assert!(matches!(err, LogPipelineError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn open_directory_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfigBuilder::new()
            .source_path(dir.path().to_string_lossy())
            .build()
            .unwrap();
        let err = FileCollector::open(&config).await.err().unwrap();
        assert!(matches!(err, LogPipelineError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn open_reads_real_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"timestamp":"2024-01-15T12:00:00Z"}}"#).unwrap();
        writeln!(file, r#"{{"timestamp":"2024-01-15T12:00:01Z"}}"#).unwrap();

        let config = PipelineConfigBuilder::new()
            .source_path(file.path().to_string_lossy())
            .line_delay_ms(0)
            .build()
            .unwrap();
        let mut collector = FileCollector::open(&config).await.unwrap();
        assert!(collector.source().starts_with("file:"));

        let (tx, _rx, drain) = channel::bounded(8).unwrap();
        let sent = collector.run(&tx, &CancellationToken::new()).await.unwrap();
        assert_eq!(sent, 2);
        assert_eq!(drain.pending(), 2);
    }
}
