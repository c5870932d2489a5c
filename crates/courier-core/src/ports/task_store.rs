//! TaskStore port - タスクレジストリ（プロセス内の正本）
//!
//! TaskStore は以下を管理します：
//! - TaskRecord（設定・状態・カウンタ）
//! - 挿入順（status ページの表示順）
//!
//! # 設計原則
//! - 1 レコードの status と counter は同じロックの下で読み書きする
//! - 状態遷移の検証はここで行う（`TaskStatus::can_transition_to`）
//! - レコードは削除しない（履歴として保持）

use async_trait::async_trait;

use crate::domain::{AttemptRecord, TaskId, TaskRecord, TaskStatus};

/// Registry failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("task {0} already exists")]
    DuplicateId(TaskId),

    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("task {task_id}: invalid transition {from:?} -> {to:?}")]
    InvalidTransition {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
}

/// TaskStore は id → TaskRecord の対応を保持
///
/// All methods must be safe to call concurrently from many workers and the
/// control API.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a fresh record. Fails with `DuplicateId` if the id is taken.
    async fn create(&self, record: TaskRecord) -> Result<TaskId, StoreError>;

    async fn get(&self, task_id: TaskId) -> Result<TaskRecord, StoreError>;

    /// All records in insertion order.
    async fn list(&self) -> Vec<TaskRecord>;

    /// Apply a status transition; returns the previous status.
    async fn update_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
    ) -> Result<TaskStatus, StoreError>;

    /// Count one attempt; returns the new `sent` value.
    async fn increment_sent(&self, task_id: TaskId) -> Result<u64, StoreError>;

    /// Attach the diagnostic of the latest attempt (bumps `failed` on failure).
    async fn record_outcome(&self, attempt: AttemptRecord) -> Result<(), StoreError>;

    /// Move to `Failed` and keep the fault message.
    async fn mark_failed(&self, task_id: TaskId, fault: String) -> Result<(), StoreError>;

    /// If the record is still non-terminal, move it to `FinishedUnexpectedly`.
    /// Returns whether anything changed.
    async fn reconcile_exited(&self, task_id: TaskId) -> Result<bool, StoreError>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
