//! Task record and its serializable snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::attempt::AttemptRecord;
use super::ids::TaskId;
use super::spec::TaskSpec;
use super::state::TaskStatus;

/// Configuration + live status of one task.
///
/// Design:
/// - The registry owns the record; the worker and control API go through it.
/// - `spec` is shared and immutable once the task is created.
/// - `sent` only ever grows.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub spec: Arc<TaskSpec>,
    pub status: TaskStatus,

    /// Attempts made, successful or not.
    pub sent: u64,

    /// Attempts whose outcome was a failure (`failed <= sent`).
    pub failed: u64,

    pub last_attempt: Option<AttemptRecord>,

    /// Set when the worker exits with `Failed`.
    pub fault: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(task_id: TaskId, spec: Arc<TaskSpec>, now: DateTime<Utc>) -> Self {
        Self {
            task_id,
            spec,
            status: TaskStatus::Starting,
            sent: 0,
            failed: 0,
            last_attempt: None,
            fault: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            task_id: self.task_id,
            status: self.status,
            status_label: self.status.label(),
            sent: self.sent,
            failed: self.failed,
            total: self.spec.attempts_per_cycle(),
            payload_count: self.spec.payloads.len(),
            credential_count: self.spec.credentials.len(),
            target: self.spec.target.clone(),
            label: self.spec.label.clone(),
            interval_secs: self.spec.interval.as_secs(),
            max_cycles: self.spec.max_cycles,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_attempt: self.last_attempt.as_ref().map(|a| a.outcome.summary()),
            fault: self.fault.clone(),
        }
    }
}

/// Point-in-time view of a task for the status page and JSON API.
///
/// Taken under the registry lock, so `status` and `sent` always belong to the
/// same instant.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub status_label: &'static str,
    pub sent: u64,
    pub failed: u64,

    /// Attempts in one full pass (`payload_count × credential_count`).
    pub total: u64,

    pub payload_count: usize,
    pub credential_count: usize,
    pub target: String,
    pub label: String,
    pub interval_secs: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cycles: Option<u64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}
