//! InMemoryTaskStore - プロセス内のタスクレジストリ
//!
//! # 実装詳細
//! - HashMap<TaskId, TaskRecord> が正本、Vec<TaskId> が挿入順
//! - tokio::sync::Mutex 1 つで排他（status と counter を同時に読む）
//! - ロック中に await しない

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{AttemptRecord, TaskId, TaskRecord, TaskStatus};
use crate::ports::{Clock, StoreError, SystemClock, TaskStore};

#[derive(Default)]
struct RegistryState {
    records: HashMap<TaskId, TaskRecord>,

    /// Insertion order (ids only).
    order: Vec<TaskId>,
}

impl RegistryState {
    fn record_mut(&mut self, task_id: TaskId) -> Result<&mut TaskRecord, StoreError> {
        self.records
            .get_mut(&task_id)
            .ok_or(StoreError::NotFound(task_id))
    }
}

/// Registry kept entirely in memory. Records are never evicted.
pub struct InMemoryTaskStore {
    state: Mutex<RegistryState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTaskStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            clock,
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, record: TaskRecord) -> Result<TaskId, StoreError> {
        let mut state = self.state.lock().await;
        let task_id = record.task_id;
        if state.records.contains_key(&task_id) {
            return Err(StoreError::DuplicateId(task_id));
        }
        state.records.insert(task_id, record);
        state.order.push(task_id);
        Ok(task_id)
    }

    async fn get(&self, task_id: TaskId) -> Result<TaskRecord, StoreError> {
        let state = self.state.lock().await;
        state
            .records
            .get(&task_id)
            .cloned()
            .ok_or(StoreError::NotFound(task_id))
    }

    async fn list(&self) -> Vec<TaskRecord> {
        let state = self.state.lock().await;
        state
            .order
            .iter()
            .filter_map(|id| state.records.get(id).cloned())
            .collect()
    }

    async fn update_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
    ) -> Result<TaskStatus, StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let record = state.record_mut(task_id)?;
        let from = record.status;
        if !from.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                task_id,
                from,
                to: status,
            });
        }
        record.status = status;
        record.updated_at = now;
        Ok(from)
    }

    async fn increment_sent(&self, task_id: TaskId) -> Result<u64, StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let record = state.record_mut(task_id)?;
        record.sent += 1;
        record.updated_at = now;
        Ok(record.sent)
    }

    async fn record_outcome(&self, attempt: AttemptRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let record = state.record_mut(attempt.task_id)?;
        if !attempt.outcome.is_success() {
            record.failed += 1;
        }
        record.updated_at = attempt.finished_at;
        record.last_attempt = Some(attempt);
        Ok(())
    }

    async fn mark_failed(&self, task_id: TaskId, fault: String) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let record = state.record_mut(task_id)?;
        if !record.status.can_transition_to(TaskStatus::Failed) {
            return Err(StoreError::InvalidTransition {
                task_id,
                from: record.status,
                to: TaskStatus::Failed,
            });
        }
        record.status = TaskStatus::Failed;
        record.fault = Some(fault);
        record.updated_at = now;
        Ok(())
    }

    async fn reconcile_exited(&self, task_id: TaskId) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let record = state.record_mut(task_id)?;
        if record.status.is_terminal() {
            return Ok(false);
        }
        record.status = TaskStatus::FinishedUnexpectedly;
        record.updated_at = now;
        Ok(true)
    }

    async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttemptOutcome, AttemptPosition, StartRequest};
    use crate::ports::{FixedClock, IdGenerator, UlidGenerator};
    use chrono::{TimeZone, Utc};

    fn fixed_clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn record(id_gen: &dyn IdGenerator, clock: &dyn Clock) -> TaskRecord {
        let spec = StartRequest {
            credential_mode: Some("single".into()),
            single_credential: Some("tok".into()),
            target: Some("t".into()),
            label: Some("L".into()),
            interval_secs: Some("1".into()),
            payload_list: Some("m".into()),
            ..StartRequest::default()
        }
        .validate()
        .unwrap();
        TaskRecord::new(id_gen.generate_task_id(), Arc::new(spec), clock.now())
    }

    fn attempt(id_gen: &dyn IdGenerator, task_id: TaskId, outcome: AttemptOutcome) -> AttemptRecord {
        AttemptRecord::new(
            id_gen.generate_attempt_id(),
            task_id,
            AttemptPosition {
                cycle: 0,
                payload_index: 0,
                credential_index: 0,
            },
            outcome,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn create_then_get_and_list_in_insertion_order() {
        let clock = fixed_clock();
        let id_gen = UlidGenerator::new(clock.clone());
        let store = InMemoryTaskStore::new(clock.clone());

        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(store.create(record(&id_gen, clock.as_ref())).await.unwrap());
        }

        let listed: Vec<TaskId> = store.list().await.iter().map(|r| r.task_id).collect();
        assert_eq!(listed, ids);
        assert_eq!(store.get(ids[2]).await.unwrap().task_id, ids[2]);
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let clock = fixed_clock();
        let id_gen = UlidGenerator::new(clock.clone());
        let store = InMemoryTaskStore::new(clock.clone());

        let rec = record(&id_gen, clock.as_ref());
        let id = store.create(rec.clone()).await.unwrap();
        assert_eq!(store.create(rec).await, Err(StoreError::DuplicateId(id)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemoryTaskStore::default();
        let id = UlidGenerator::new(SystemClock).generate_task_id();
        assert_eq!(store.get(id).await.unwrap_err(), StoreError::NotFound(id));
        assert!(store.increment_sent(id).await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_status_enforces_state_machine() {
        let clock = fixed_clock();
        let id_gen = UlidGenerator::new(clock.clone());
        let store = InMemoryTaskStore::new(clock.clone());
        let id = store.create(record(&id_gen, clock.as_ref())).await.unwrap();

        assert_eq!(
            store.update_status(id, TaskStatus::Running).await,
            Ok(TaskStatus::Starting)
        );
        store
            .update_status(id, TaskStatus::StoppedByUser)
            .await
            .unwrap();

        let err = store.update_status(id, TaskStatus::Running).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert_eq!(store.get(id).await.unwrap().status, TaskStatus::StoppedByUser);
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let clock = fixed_clock();
        let id_gen = UlidGenerator::new(clock.clone());
        let store = Arc::new(InMemoryTaskStore::new(clock.clone()));
        let id = store.create(record(&id_gen, clock.as_ref())).await.unwrap();

        let mut joins = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            joins.push(tokio::spawn(async move {
                for _ in 0..100 {
                    store.increment_sent(id).await.unwrap();
                }
            }));
        }
        for j in joins {
            j.await.unwrap();
        }

        assert_eq!(store.get(id).await.unwrap().sent, 800);
    }

    #[tokio::test]
    async fn record_outcome_counts_failures_only() {
        let clock = fixed_clock();
        let id_gen = UlidGenerator::new(clock.clone());
        let store = InMemoryTaskStore::new(clock.clone());
        let id = store.create(record(&id_gen, clock.as_ref())).await.unwrap();

        store
            .record_outcome(attempt(&id_gen, id, AttemptOutcome::success(Some(200))))
            .await
            .unwrap();
        store
            .record_outcome(attempt(&id_gen, id, AttemptOutcome::failure(Some(401), "bad token")))
            .await
            .unwrap();

        let rec = store.get(id).await.unwrap();
        assert_eq!(rec.failed, 1);
        assert_eq!(
            rec.last_attempt.unwrap().outcome.status_code,
            Some(401)
        );
    }

    #[tokio::test]
    async fn reconcile_only_touches_non_terminal_records() {
        let clock = fixed_clock();
        let id_gen = UlidGenerator::new(clock.clone());
        let store = InMemoryTaskStore::new(clock.clone());

        let running = store.create(record(&id_gen, clock.as_ref())).await.unwrap();
        store.update_status(running, TaskStatus::Running).await.unwrap();

        let failed = store.create(record(&id_gen, clock.as_ref())).await.unwrap();
        store.mark_failed(failed, "boom".into()).await.unwrap();

        assert!(store.reconcile_exited(running).await.unwrap());
        assert!(!store.reconcile_exited(failed).await.unwrap());

        assert_eq!(
            store.get(running).await.unwrap().status,
            TaskStatus::FinishedUnexpectedly
        );
        let failed = store.get(failed).await.unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.fault.as_deref(), Some("boom"));
    }
}
