//! ScriptedInvoker - ネットワークを使わない外部アクション
//!
//! `courier --dry-run` とテストで使う。
//! 呼び出しはすべて記録し（credential はマスク）、固定のスクリプトどおりに応答する。

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::AttemptOutcome;
use crate::ports::{ActionInvoker, Invocation};

/// How the invoker answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Every call succeeds with 200.
    Succeed,
    /// Every call fails with the given status.
    Fail { status: u16 },
    /// Odd calls succeed, even calls fail (1-based).
    Alternate,
}

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub target: String,
    /// First characters of the credential only.
    pub credential_hint: String,
    pub message: String,
}

pub struct ScriptedInvoker {
    script: Script,
    latency: Duration,
    calls: AtomicU64,
    log: Mutex<Vec<RecordedCall>>,
}

impl ScriptedInvoker {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            latency: Duration::ZERO,
            calls: AtomicU64::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Simulated time spent per call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        match self.log.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ActionInvoker for ScriptedInvoker {
    async fn invoke(&self, call: Invocation<'_>) -> AttemptOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let recorded = RecordedCall {
            target: call.target.to_string(),
            credential_hint: call.credential.chars().take(5).collect(),
            message: call.message.to_string(),
        };
        match self.log.lock() {
            Ok(mut log) => log.push(recorded),
            Err(poisoned) => poisoned.into_inner().push(recorded),
        }

        match self.script {
            Script::Succeed => AttemptOutcome::success(Some(200)),
            Script::Fail { status } => AttemptOutcome::failure(Some(status), "scripted failure"),
            Script::Alternate if n % 2 == 1 => AttemptOutcome::success(Some(200)),
            Script::Alternate => AttemptOutcome::failure(Some(500), "scripted failure"),
        }
    }
}
