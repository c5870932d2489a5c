//! ActionInvoker port - 外部アクション（1 回の送信）
//!
//! WorkerLoop が見るのは `AttemptOutcome::kind` だけ。
//! 1 回ごとの失敗は Err ではなく failure の outcome として返すこと。

use async_trait::async_trait;

use crate::domain::AttemptOutcome;

/// One external action call.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Destination identifier.
    pub target: &'a str,

    /// Opaque secret authorizing the call.
    pub credential: &'a str,

    /// `label | payload`
    pub message: &'a str,
}

/// Performs the external side effect for one (payload, credential) pair.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    async fn invoke(&self, call: Invocation<'_>) -> AttemptOutcome;
}
