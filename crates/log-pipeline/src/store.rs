//! 알림 저장소 -- JSON 배열 파일에 알림을 누적 기록합니다.
//!
//! `append`는 "기존 배열 읽기 → 새 알림 추가 → 전체 다시 쓰기"를 하나의 락 안에서
//! 수행합니다. 락은 저장소 인스턴스가 소유하며, 같은 저장소를 공유하는 호출자들의
//! 갱신이 서로 덮어써지지 않습니다.
//!
//! 쓰기는 같은 디렉토리의 고유한 임시 파일에 먼저 기록한 뒤 대상 경로로 rename 하므로
//! 중간에 실패해도 잘린 배열이 남지 않습니다.
//!
//! 락은 인스턴스 단위입니다. 같은 파일에 쓰는 파이프라인들은
//! [`LogPipelineBuilder::store`](crate::LogPipelineBuilder::store)로 저장소 하나를 공유해야
//! 서로의 기록을 덮어쓰지 않습니다.
//!
//! # 저장 형식
//! ```json
//! [
//!   { "triggered_at": "2024-01-15T12:00:10+00:00", "events": [ { ... } ] }
//! ]
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::Mutex;

use alertflow_core::event::EventFieldMapping;
use alertflow_core::metrics as m;
use alertflow_core::types::Alert;

use crate::error::LogPipelineError;
use crate::loader;

/// 알림 저장소
#[derive(Debug)]
pub struct AlertStore {
    path: PathBuf,
    /// `load`에서 이벤트를 다시 해석할 때 쓰는 필드 매핑
    mapping: EventFieldMapping,
    /// 읽기-수정-쓰기 전체 구간을 보호하는 락
    lock: Mutex<()>,
}

impl AlertStore {
    /// 지정한 경로의 저장소를 생성합니다. 파일은 첫 `append` 때 만들어집니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mapping: EventFieldMapping::default(),
            lock: Mutex::new(()),
        }
    }

    /// 이벤트 필드 매핑을 지정합니다.
    pub fn with_field_mapping(mut self, mapping: EventFieldMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// 저장소 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 알림 하나를 저장합니다.
    ///
    /// 저장 후 전체 알림 수를 반환합니다. 쓰기에 실패하거나 기존 파일이
    /// JSON 배열이 아니면 `Storage` 에러를 반환하며 기존 파일은 그대로 둡니다.
    pub async fn append(&self, alert: &Alert) -> Result<usize, LogPipelineError> {
        let _guard = self.lock.lock().await;

        let result = self.append_locked(alert).await;
        match &result {
            Ok(total) => {
                metrics::counter!(m::STORE_ALERTS_PERSISTED_TOTAL).increment(1);
                tracing::info!(
                    path = %self.path.display(),
                    events = alert.len(),
                    total,
                    "alert persisted"
                );
            }
            Err(e) => {
                metrics::counter!(m::STORE_WRITE_FAILURES_TOTAL).increment(1);
                tracing::error!(path = %self.path.display(), error = %e, "failed to persist alert");
            }
        }
        result
    }

    /// 저장된 모든 알림을 읽습니다. 없거나 손상되어 있으면 빈 목록.
    pub async fn load(&self) -> Vec<Alert> {
        loader::load_alerts_with(&self.path, &self.mapping).await
    }

    async fn append_locked(&self, alert: &Alert) -> Result<usize, LogPipelineError> {
        let mut records = self.read_records().await?;

        let record = alert.to_record().map_err(|e| self.storage_error(e))?;
        records.push(record);

        let body = serde_json::to_vec_pretty(&records).map_err(|e| self.storage_error(e))?;
        self.write_atomic(body).await?;

        Ok(records.len())
    }

    /// 기존 배열을 원형 그대로 읽습니다. 파일이 없거나 비어 있으면 빈 배열.
    async fn read_records(&self) -> Result<Vec<Value>, LogPipelineError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.storage_error(e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Array(records)) => Ok(records),
            Ok(_) => Err(self.storage_error(
                "refusing to overwrite: existing content is not a JSON array",
            )),
            Err(e) => Err(self.storage_error(format!("refusing to overwrite corrupted store: {e}"))),
        }
    }

    /// 같은 디렉토리의 고유한 임시 파일에 쓴 뒤 대상 경로로 옮깁니다.
    ///
    /// 임시 파일 이름이 호출마다 다르므로 같은 파일을 쓰는 다른 저장소
    /// 인스턴스나 프로세스와 임시 파일이 겹치지 않습니다.
    async fn write_atomic(&self, body: Vec<u8>) -> Result<(), LogPipelineError> {
        let target = self.path.clone();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = format!(".{}.", self.file_name());

        let written = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".tmp")
                .tempfile_in(&dir)?;
            tmp.write_all(&body)?;
            // 실패하면 PersistError가 임시 파일을 들고 있다가 drop 시 삭제
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| self.storage_error(e))?;

        written.map_err(|e| self.storage_error(e))
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "alerts".to_owned())
    }

    fn storage_error(&self, reason: impl ToString) -> LogPipelineError {
        LogPipelineError::Storage {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
