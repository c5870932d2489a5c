//! AppBuilder - TaskManager の構築とワイヤリング
//!
//! # 方針
//! - 外部アクション（ActionInvoker）だけは必須。既定値を持たない
//! - それ以外（時計・ID・レジストリ）はプロセス内の既定実装を使う
//! - 不足は build() 時に BuildError（Fail-fast）

use std::sync::Arc;

use super::control::TaskManager;
use super::worker_loop::WorkerContext;
use crate::impls::InMemoryTaskStore;
use crate::ports::{ActionInvoker, Clock, IdGenerator, SystemClock, TaskStore, UlidGenerator};

/// AppBuilder は TaskManager を構築
///
/// # 使用例
/// ```ignore
/// let manager = AppBuilder::new()
///     .invoker(Arc::new(HttpInvoker::new(config)?))
///     .build()?;
/// ```
pub struct AppBuilder {
    store: Option<Arc<dyn TaskStore>>,
    invoker: Option<Arc<dyn ActionInvoker>>,
    clock: Option<Arc<dyn Clock>>,
    id_gen: Option<Arc<dyn IdGenerator>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No action invoker configured. Call AppBuilder::invoker() before build().")]
    MissingInvoker,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            invoker: None,
            clock: None,
            id_gen: None,
        }
    }

    pub fn invoker(mut self, invoker: Arc<dyn ActionInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, id_gen: Arc<dyn IdGenerator>) -> Self {
        self.id_gen = Some(id_gen);
        self
    }

    /// 既定値を埋めて TaskManager を生成
    ///
    /// 既定のレジストリと ID 生成器は、指定された（または既定の）時計を共有する。
    pub fn build(self) -> Result<TaskManager, BuildError> {
        let invoker = self.invoker.ok_or(BuildError::MissingInvoker)?;
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryTaskStore::new(clock.clone())));
        let id_gen = self
            .id_gen
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));

        Ok(TaskManager::new(WorkerContext {
            store,
            invoker,
            id_gen,
            clock,
        }))
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StartRequest;
    use crate::impls::{Script, ScriptedInvoker};
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_build_missing_invoker() {
        let result = AppBuilder::new().build();
        assert!(matches!(result, Err(BuildError::MissingInvoker)));
    }

    #[test]
    fn test_build_with_defaults() {
        let result = AppBuilder::default()
            .invoker(Arc::new(ScriptedInvoker::new(Script::Succeed)))
            .build();
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_uses_injected_store_and_clock() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(at));
        let store = Arc::new(InMemoryTaskStore::new(clock.clone()));

        let manager = AppBuilder::new()
            .invoker(Arc::new(ScriptedInvoker::new(Script::Succeed)))
            .store(store.clone())
            .clock(clock)
            .build()
            .unwrap();

        let request = StartRequest {
            credential_mode: Some("single".into()),
            single_credential: Some("tok".into()),
            target: Some("t".into()),
            label: Some("L".into()),
            interval_secs: Some("1".into()),
            payload_list: Some("hi".into()),
            ..StartRequest::default()
        };
        let receipt = manager.start(&request).await.unwrap();

        let record = store.get(receipt.task_id).await.unwrap();
        assert_eq!(record.created_at, at);
        assert_eq!(receipt.task_id.as_ulid().timestamp_ms(), at.timestamp_millis() as u64);
        manager.shutdown(std::time::Duration::from_secs(1)).await;
    }
}
