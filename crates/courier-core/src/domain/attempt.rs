//! Attempt history for diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AttemptId, TaskId};
use super::outcome::AttemptOutcome;

/// A single external action attempt of a task.
///
/// Records which (payload, credential) pair was used and what happened.
/// Credentials themselves are never stored here, only their position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt_id: AttemptId,
    pub task_id: TaskId,

    /// Which full pass over payloads × credentials this attempt belongs to (0-based).
    pub cycle: u64,

    /// Index into the task's payload set.
    pub payload_index: usize,

    /// Index into the task's credential set.
    pub credential_index: usize,

    pub outcome: AttemptOutcome,

    pub finished_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(
        attempt_id: AttemptId,
        task_id: TaskId,
        position: AttemptPosition,
        outcome: AttemptOutcome,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            attempt_id,
            task_id,
            cycle: position.cycle,
            payload_index: position.payload_index,
            credential_index: position.credential_index,
            outcome,
            finished_at,
        }
    }
}

/// Where in the send sequence an attempt happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPosition {
    pub cycle: u64,
    pub payload_index: usize,
    pub credential_index: usize,
}
