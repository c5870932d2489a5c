//! WorkerLoop - 1 タスク分の送信ループ
//!
//! # フロー
//! 1. status を Running にする
//! 2. payload 順 × credential 順に 1 件ずつ外部アクションを実行
//! 3. 毎回 sent を +1、結果を記録（失敗しても止まらない）
//! 4. interval だけ待つ（CancellationToken と競合させる）
//! 5. 一周したら最初から。キャンセルされるまで続ける
//!
//! # 終了時の status
//! - キャンセル（または起動前の Stopping） -> StoppedByUser
//! - レジストリのエラー -> Failed
//! - max_cycles を使い切った -> Completed

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::outcome::truncate;
use crate::domain::{AttemptPosition, AttemptRecord, TaskId, TaskSpec, TaskStatus};
use crate::ports::{ActionInvoker, Clock, IdGenerator, Invocation, StoreError, TaskStore};

/// Characters of the composed message shown in logs.
const LOG_PREVIEW: usize = 30;

/// Shared services every worker needs.
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<dyn TaskStore>,
    pub invoker: Arc<dyn ActionInvoker>,
    pub id_gen: Arc<dyn IdGenerator>,
    pub clock: Arc<dyn Clock>,
}

/// Why a worker stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// The cancellation token was observed.
    Cancelled,
    /// `max_cycles` full passes were made.
    Completed,
    /// The registry refused an update; the loop could not continue.
    Faulted(StoreError),
}

impl WorkerExit {
    pub fn final_status(&self) -> TaskStatus {
        match self {
            WorkerExit::Cancelled => TaskStatus::StoppedByUser,
            WorkerExit::Completed => TaskStatus::Completed,
            WorkerExit::Faulted(_) => TaskStatus::Failed,
        }
    }
}

/// WorkerLoop は 1 つのタスクを実行
pub struct WorkerLoop {
    task_id: TaskId,
    spec: Arc<TaskSpec>,
    ctx: WorkerContext,
    cancel: CancellationToken,
}

impl WorkerLoop {
    pub fn new(
        task_id: TaskId,
        spec: Arc<TaskSpec>,
        ctx: WorkerContext,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            task_id,
            spec,
            ctx,
            cancel,
        }
    }

    /// Run until cancelled (or `max_cycles`), then write the final status.
    pub async fn run(self) -> WorkerExit {
        let exit = match self.send_cycles().await {
            Ok(()) if self.cancel.is_cancelled() => WorkerExit::Cancelled,
            Ok(()) => WorkerExit::Completed,
            Err(e) => WorkerExit::Faulted(e),
        };
        self.finish(&exit).await;
        exit
    }

    async fn send_cycles(&self) -> Result<(), StoreError> {
        self.mark_running().await?;

        let mut cycle: u64 = 0;
        'cycles: loop {
            if self.cancel.is_cancelled() {
                break;
            }

            for (payload_index, payload) in self.spec.payloads.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    break 'cycles;
                }
                let message = self.spec.compose(payload);

                for (credential_index, credential) in self.spec.credentials.iter().enumerate() {
                    if self.cancel.is_cancelled() {
                        break 'cycles;
                    }

                    let position = AttemptPosition {
                        cycle,
                        payload_index,
                        credential_index,
                    };
                    self.attempt(position, credential, &message).await?;

                    if !self.wait_interval().await {
                        break 'cycles;
                    }
                }
            }

            cycle += 1;
            if let Some(max) = self.spec.max_cycles
                && cycle >= max
            {
                debug!(task_id = %self.task_id, cycle, "all cycles done");
                break;
            }
        }
        Ok(())
    }

    async fn mark_running(&self) -> Result<(), StoreError> {
        match self
            .ctx
            .store
            .update_status(self.task_id, TaskStatus::Running)
            .await
        {
            Ok(_) => Ok(()),
            // stop が先に Stopping を書いた。トークン未通知でも停止要求として扱う
            Err(StoreError::InvalidTransition {
                from: TaskStatus::Stopping,
                ..
            }) => {
                debug!(task_id = %self.task_id, "stop requested before launch");
                self.cancel.cancel();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// One invocation + bookkeeping. Attempt failures are not errors.
    async fn attempt(
        &self,
        position: AttemptPosition,
        credential: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        let outcome = self
            .ctx
            .invoker
            .invoke(Invocation {
                target: &self.spec.target,
                credential,
                message,
            })
            .await;

        let sent = self.ctx.store.increment_sent(self.task_id).await?;

        if outcome.is_success() {
            info!(
                task_id = %self.task_id,
                sent,
                payload = position.payload_index,
                credential = position.credential_index,
                "sent: {}",
                truncate(message, LOG_PREVIEW),
            );
        } else {
            warn!(
                task_id = %self.task_id,
                sent,
                payload = position.payload_index,
                credential = position.credential_index,
                "attempt failed: {}",
                outcome.summary(),
            );
        }

        let record = AttemptRecord::new(
            self.ctx.id_gen.generate_attempt_id(),
            self.task_id,
            position,
            outcome,
            self.ctx.clock.now(),
        );
        self.ctx.store.record_outcome(record).await
    }

    /// Sleep for the interval unless cancelled first. `false` = cancelled.
    async fn wait_interval(&self) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.spec.interval) => !self.cancel.is_cancelled(),
        }
    }

    async fn finish(&self, exit: &WorkerExit) {
        let result = match exit {
            WorkerExit::Faulted(fault) => {
                error!(task_id = %self.task_id, %fault, "worker loop terminated");
                self.ctx
                    .store
                    .mark_failed(self.task_id, fault.to_string())
                    .await
            }
            _ => self
                .ctx
                .store
                .update_status(self.task_id, exit.final_status())
                .await
                .map(|_| ()),
        };

        match result {
            Ok(()) => info!(
                task_id = %self.task_id,
                status = %exit.final_status(),
                "task finished"
            ),
            Err(e) => error!(task_id = %self.task_id, error = %e, "could not record final status"),
        }
    }
}
