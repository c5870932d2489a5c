//! Control - タスクの起動・停止・照合
//!
//! # 責務
//! - start: 入力検証 → レコード登録 → ワーカー起動（JoinHandle は保持しない）
//! - stop: Stopping に遷移してからキャンセルを通知（冪等）
//! - status: 終了済みワーカーの照合 → スナップショット一覧
//!
//! # ロック順
//! handles → store。start は登録とハンドル挿入を handles ロック内で行い、
//! stop は同じロックの中で Stopping 書き込みとキャンセルを行う。
//! ハンドルの無いレコードを stop が見ることはない。
//!
//! # 生存判定
//! 各ワーカーは `watch::Sender<()>` を抱えたまま走る。正常終了でも panic でも
//! Sender が drop されるので、Receiver 側の `has_changed()` が Err になれば
//! ワーカーはもう居ない。その時点で非終端のレコードは `FinishedUnexpectedly`。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::worker_loop::{WorkerContext, WorkerLoop};
use crate::domain::{StartRequest, TaskId, TaskRecord, TaskSnapshot, TaskSpec, TaskStatus};
use crate::error::CourierError;
use crate::ports::StoreError;

/// Fresh ids tried before giving up on a start (ULID collisions are not expected).
const MAX_ID_ATTEMPTS: usize = 3;

/// What `start` reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartReceipt {
    pub task_id: TaskId,
    pub target: String,
    pub credential_count: usize,
    pub payload_count: usize,
    pub interval_secs: u64,
}

/// Result of a stop request for a known task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The worker was told to stop; the record is now `Stopping`.
    Signalled,
    /// Nothing to stop (already stopping or finished).
    NotRunning(TaskStatus),
}

struct TaskHandle {
    cancel: CancellationToken,
    alive: watch::Receiver<()>,
}

impl TaskHandle {
    fn has_exited(&self) -> bool {
        self.alive.has_changed().is_err()
    }
}

/// TaskManager はタスクの起動・停止・照合を担う
pub struct TaskManager {
    ctx: WorkerContext,
    handles: Mutex<HashMap<TaskId, TaskHandle>>,
}

impl TaskManager {
    pub fn new(ctx: WorkerContext) -> Self {
        Self {
            ctx,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Validate, register and launch a task.
    ///
    /// On validation failure nothing is registered and no worker starts.
    pub async fn start(&self, request: &StartRequest) -> Result<StartReceipt, CourierError> {
        let spec = Arc::new(request.validate()?);

        let cancel = CancellationToken::new();
        let (alive_tx, alive_rx) = watch::channel(());
        let task_id = {
            let mut handles = self.handles.lock().await;
            let task_id = self.register(&spec).await?;
            handles.insert(
                task_id,
                TaskHandle {
                    cancel: cancel.clone(),
                    alive: alive_rx,
                },
            );
            task_id
        };

        let worker = WorkerLoop::new(task_id, spec.clone(), self.ctx.clone(), cancel);
        tokio::spawn(async move {
            let _alive = alive_tx;
            worker.run().await
        });

        info!(
            %task_id,
            target = %spec.target,
            credentials = spec.credentials.len(),
            payloads = spec.payloads.len(),
            interval_secs = spec.interval.as_secs(),
            "task started"
        );

        Ok(StartReceipt {
            task_id,
            target: spec.target.clone(),
            credential_count: spec.credentials.len(),
            payload_count: spec.payloads.len(),
            interval_secs: spec.interval.as_secs(),
        })
    }

    async fn register(&self, spec: &Arc<TaskSpec>) -> Result<TaskId, CourierError> {
        let mut attempt = 1;
        loop {
            let task_id = self.ctx.id_gen.generate_task_id();
            let record = TaskRecord::new(task_id, spec.clone(), self.ctx.clock.now());
            match self.ctx.store.create(record).await {
                Ok(id) => return Ok(id),
                Err(StoreError::DuplicateId(_)) if attempt < MAX_ID_ATTEMPTS => {
                    warn!(%task_id, attempt, "task id collision, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Ask a task to stop. Calling it again is harmless.
    pub async fn stop(&self, raw_id: &str) -> Result<StopOutcome, CourierError> {
        let task_id = parse_task_id(raw_id)?;

        let handles = self.handles.lock().await;
        let previous = match self
            .ctx
            .store
            .update_status(task_id, TaskStatus::Stopping)
            .await
        {
            Ok(previous) => previous,
            Err(StoreError::InvalidTransition { from, .. }) => {
                return Ok(StopOutcome::NotRunning(from));
            }
            Err(StoreError::NotFound(_)) => {
                return Err(CourierError::NotFound(raw_id.trim().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if !previous.is_stoppable() {
            // 既に Stopping
            return Ok(StopOutcome::NotRunning(previous));
        }

        match handles.get(&task_id) {
            Some(handle) => handle.cancel.cancel(),
            None => warn!(%task_id, "no worker handle for task being stopped"),
        }
        drop(handles);
        info!(%task_id, from = %previous, "stop requested");
        Ok(StopOutcome::Signalled)
    }

    /// Reconcile, then return every task in creation order.
    pub async fn status(&self) -> Vec<TaskSnapshot> {
        self.reconcile().await;
        self.ctx
            .store
            .list()
            .await
            .iter()
            .map(TaskRecord::snapshot)
            .collect()
    }

    /// Reconcile, then return one task.
    pub async fn get(&self, raw_id: &str) -> Result<TaskSnapshot, CourierError> {
        let task_id = parse_task_id(raw_id)?;
        self.reconcile().await;
        match self.ctx.store.get(task_id).await {
            Ok(record) => Ok(record.snapshot()),
            Err(StoreError::NotFound(_)) => Err(CourierError::NotFound(raw_id.trim().to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Registered task count (all statuses).
    pub async fn task_count(&self) -> usize {
        self.ctx.store.len().await
    }

    /// Mark tasks whose worker vanished without recording a final status.
    async fn reconcile(&self) {
        let exited: Vec<TaskId> = {
            let mut handles = self.handles.lock().await;
            let exited: Vec<TaskId> = handles
                .iter()
                .filter(|(_, handle)| handle.has_exited())
                .map(|(id, _)| *id)
                .collect();
            for id in &exited {
                handles.remove(id);
            }
            exited
        };

        for task_id in exited {
            match self.ctx.store.reconcile_exited(task_id).await {
                Ok(true) => warn!(%task_id, "worker exited without a final status"),
                Ok(false) => debug!(%task_id, "worker handle released"),
                Err(e) => warn!(%task_id, error = %e, "reconciliation failed"),
            }
        }
    }

    /// Cancel every live worker and wait up to `grace` for them to exit.
    ///
    /// Returns how many workers were still running when the grace period ended.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let receivers: Vec<watch::Receiver<()>> = {
            let handles = self.handles.lock().await;
            for handle in handles.values() {
                handle.cancel.cancel();
            }
            handles.values().map(|h| h.alive.clone()).collect()
        };
        info!(workers = receivers.len(), "shutting down workers");

        let deadline = tokio::time::Instant::now() + grace;
        let mut lingering = 0;
        for mut alive in receivers {
            // Sender never sends, so changed() only returns once it is dropped.
            let exited = tokio::time::timeout_at(deadline, async {
                while alive.changed().await.is_ok() {}
            })
            .await;
            if exited.is_err() {
                lingering += 1;
            }
        }

        self.reconcile().await;
        if lingering > 0 {
            warn!(lingering, "workers still running after grace period");
        }
        lingering
    }
}

fn parse_task_id(raw: &str) -> Result<TaskId, CourierError> {
    raw.parse()
        .map_err(|_| CourierError::NotFound(raw.trim().to_string()))
}
