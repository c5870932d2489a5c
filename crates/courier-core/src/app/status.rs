//! Status - ステータス集計
//!
//! status ごとのタスク件数。status ページの表の上と JSON API で使う。

use serde::{Deserialize, Serialize};

use crate::domain::{TaskSnapshot, TaskStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub starting: usize,
    pub running: usize,
    pub stopping: usize,
    pub stopped_by_user: usize,
    pub completed: usize,
    pub failed: usize,
    pub finished_unexpectedly: usize,
}

impl StatusCounts {
    pub fn from_snapshots(snapshots: &[TaskSnapshot]) -> Self {
        let mut counts = Self::default();
        for snap in snapshots {
            counts.add(snap.status);
        }
        counts
    }

    pub fn add(&mut self, status: TaskStatus) {
        let slot = match status {
            TaskStatus::Starting => &mut self.starting,
            TaskStatus::Running => &mut self.running,
            TaskStatus::Stopping => &mut self.stopping,
            TaskStatus::StoppedByUser => &mut self.stopped_by_user,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Failed => &mut self.failed,
            TaskStatus::FinishedUnexpectedly => &mut self.finished_unexpectedly,
        };
        *slot += 1;
    }

    /// Tasks that still have (or should have) a live worker.
    pub fn active(&self) -> usize {
        self.starting + self.running + self.stopping
    }

    pub fn total(&self) -> usize {
        self.active()
            + self.stopped_by_user
            + self.completed
            + self.failed
            + self.finished_unexpectedly
    }
}
