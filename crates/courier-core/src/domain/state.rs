//! State - タスクの状態と状態遷移
//!
//! # 状態遷移
//! - Starting -> Running -> Stopping -> StoppedByUser
//! - Running -> Completed（max_cycles を使い切ったとき）
//! - (any non-terminal) -> Failed（loop 内部の回復不能エラー）
//! - (any non-terminal) -> FinishedUnexpectedly（status 時の reconciliation のみ）
//!
//! 終端状態からはどこにも遷移しない。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Registered, worker not yet reporting.
    Starting,

    /// Worker is cycling through payloads × credentials.
    Running,

    /// Stop was requested; the worker has not observed it yet (display only).
    Stopping,

    /// Worker observed the cancellation token and exited.
    StoppedByUser,

    /// Worker left its loop without being cancelled.
    Completed,

    /// Worker hit an unrecoverable fault.
    Failed,

    /// Worker's execution context ended without reporting a final status.
    FinishedUnexpectedly,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::StoppedByUser
                | TaskStatus::Completed
                | TaskStatus::Failed
                | TaskStatus::FinishedUnexpectedly
        )
    }

    /// Can a stop request still cancel this task?
    pub fn is_stoppable(self) -> bool {
        matches!(self, TaskStatus::Starting | TaskStatus::Running)
    }

    /// Is `self -> next` allowed by the state machine?
    ///
    /// A same-state "transition" is not a change and is allowed for
    /// non-terminal states only.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;

        if self.is_terminal() {
            return false;
        }
        if self == next {
            return true;
        }
        match (self, next) {
            (Starting, Running | Stopping | StoppedByUser) => true,
            (Running, Stopping | StoppedByUser | Completed) => true,
            (Stopping, StoppedByUser | Completed) => true,
            (_, Failed | FinishedUnexpectedly) => true,
            _ => false,
        }
    }

    /// Human-readable label used by the status page.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Starting => "Starting",
            TaskStatus::Running => "Running",
            TaskStatus::Stopping => "Stopping...",
            TaskStatus::StoppedByUser => "Stopped by User",
            TaskStatus::Completed => "Completed",
            TaskStatus::Failed => "Failed",
            TaskStatus::FinishedUnexpectedly => "Finished Unexpectedly",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::TaskStatus::{self, *};
    use rstest::rstest;

    #[rstest]
    #[case::launch(Starting, Running)]
    #[case::stop_before_launch(Starting, Stopping)]
    #[case::cancelled_before_launch(Starting, StoppedByUser)]
    #[case::stop_requested(Running, Stopping)]
    #[case::stopped(Running, StoppedByUser)]
    #[case::stopped_after_stopping(Stopping, StoppedByUser)]
    #[case::cycles_exhausted(Running, Completed)]
    #[case::fault_while_running(Running, Failed)]
    #[case::fault_while_starting(Starting, Failed)]
    #[case::reconciled(Running, FinishedUnexpectedly)]
    #[case::same_state(Running, Running)]
    fn allowed_transitions(#[case] from: TaskStatus, #[case] to: TaskStatus) {
        assert!(from.can_transition_to(to), "{from:?} -> {to:?}");
    }

    #[rstest]
    #[case::no_restart(Stopping, Running)]
    #[case::no_rewind(Running, Starting)]
    #[case::starting_cannot_complete(Starting, Completed)]
    #[case::terminal_stopped(StoppedByUser, Running)]
    #[case::terminal_stopped_same(StoppedByUser, StoppedByUser)]
    #[case::terminal_completed(Completed, Failed)]
    #[case::terminal_failed(Failed, StoppedByUser)]
    #[case::terminal_reconciled(FinishedUnexpectedly, Running)]
    fn forbidden_transitions(#[case] from: TaskStatus, #[case] to: TaskStatus) {
        assert!(!from.can_transition_to(to), "{from:?} -> {to:?}");
    }

    #[test]
    fn only_starting_and_running_are_stoppable() {
        assert!(Starting.is_stoppable());
        assert!(Running.is_stoppable());
        assert!(!Stopping.is_stoppable());
        assert!(!StoppedByUser.is_stoppable());
        assert!(!Completed.is_stoppable());
    }

    #[test]
    fn serializes_as_snake_case() {
        let s = serde_json::to_string(&StoppedByUser).unwrap();
        assert_eq!(s, "\"stopped_by_user\"");
        assert_eq!(StoppedByUser.to_string(), "Stopped by User");
    }
}
