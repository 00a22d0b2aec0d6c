use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use common::{OrderId, RequestId};

use crate::{
    IntegrationEventRecord, LedgerEntry, OrderRecord, Result, StoreError, UnitOfWork, Version,
    outbox::EventPublishState, store::OrderStore, unit_of_work::OrderWrite,
};

#[derive(Default)]
struct Inner {
    orders: HashMap<OrderId, OrderRecord>,
    requests: HashMap<RequestId, LedgerEntry>,
    events: Vec<IntegrationEventRecord>,
}

/// In-memory order store for tests and local runs.
///
/// A single write guard around the whole commit makes the unit of work
/// atomic, mirroring the transactional behavior of the PostgreSQL
/// implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Returns the total number of integration event records.
    pub async fn event_count(&self) -> usize {
        self.inner.read().await.events.len()
    }

    /// Returns the number of ledger entries.
    pub async fn request_count(&self) -> usize {
        self.inner.read().await.requests.len()
    }

    /// Clears all state.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.orders.clear();
        inner.requests.clear();
        inner.events.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn load(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&id).cloned())
    }

    async fn find_request(&self, request_id: RequestId) -> Result<Option<LedgerEntry>> {
        let inner = self.inner.read().await;
        Ok(inner.requests.get(&request_id).cloned())
    }

    async fn record_request(&self, entry: LedgerEntry) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.requests.contains_key(&entry.request_id) {
            return Err(StoreError::DuplicateRequest(entry.request_id));
        }
        inner.requests.insert(entry.request_id, entry);
        Ok(())
    }

    async fn commit(&self, uow: UnitOfWork) -> Result<()> {
        let (order_write, staged_events, ledger_entry) = uow.into_parts();

        let mut inner = self.inner.write().await;

        // Validate everything before applying anything, so a rejected
        // commit leaves the store untouched. The ledger check runs first:
        // a concurrent delivery of the same request must surface as a
        // duplicate, not as a version conflict.
        if let Some(entry) = &ledger_entry
            && inner.requests.contains_key(&entry.request_id)
        {
            tracing::warn!(
                request_id = %entry.request_id,
                "commit rejected: request already recorded"
            );
            return Err(StoreError::DuplicateRequest(entry.request_id));
        }

        match &order_write {
            Some(OrderWrite::Insert(record)) => {
                if let Some(existing) = inner.orders.get(&record.id) {
                    tracing::warn!(
                        order_id = %record.id,
                        actual = %existing.version,
                        "commit rejected: order already exists"
                    );
                    return Err(StoreError::ConcurrencyConflict {
                        order_id: record.id,
                        expected: Version::initial(),
                        actual: existing.version,
                    });
                }
            }
            Some(OrderWrite::Update { record, expected }) => {
                let actual = inner
                    .orders
                    .get(&record.id)
                    .map(|r| r.version)
                    .unwrap_or(Version::initial());
                if actual != *expected {
                    tracing::warn!(
                        order_id = %record.id,
                        expected = %expected,
                        actual = %actual,
                        "commit rejected: stale version"
                    );
                    return Err(StoreError::ConcurrencyConflict {
                        order_id: record.id,
                        expected: *expected,
                        actual,
                    });
                }
            }
            None => {}
        }

        match order_write {
            Some(OrderWrite::Insert(mut record)) => {
                record.version = Version::first();
                inner.orders.insert(record.id, record);
            }
            Some(OrderWrite::Update { mut record, expected }) => {
                record.version = expected.next();
                inner.orders.insert(record.id, record);
            }
            None => {}
        }

        inner.events.extend(staged_events);

        if let Some(entry) = ledger_entry {
            inner.requests.insert(entry.request_id, entry);
        }

        Ok(())
    }

    async fn pending_integration_events(&self) -> Result<Vec<IntegrationEventRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .iter()
            .filter(|e| e.state == EventPublishState::NotPublished)
            .cloned()
            .collect())
    }

    async fn mark_event_in_progress(&self, event_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        let event = inner
            .events
            .iter_mut()
            .find(|e| e.event_id == event_id)
            .ok_or(StoreError::EventNotFound(event_id))?;
        event.state = EventPublishState::InProgress;
        event.times_sent += 1;
        Ok(())
    }

    async fn mark_event_published(&self, event_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        let event = inner
            .events
            .iter_mut()
            .find(|e| e.event_id == event_id)
            .ok_or(StoreError::EventNotFound(event_id))?;
        event.state = EventPublishState::Published;
        Ok(())
    }

    async fn mark_event_failed(&self, event_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        let event = inner
            .events
            .iter_mut()
            .find(|e| e.event_id == event_id)
            .ok_or(StoreError::EventNotFound(event_id))?;
        event.state = EventPublishState::PublishFailed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, version: i64) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(id),
            payload: serde_json::json!({"status": "Submitted"}),
            version: Version::new(version),
        }
    }

    fn entry(request_id: RequestId) -> LedgerEntry {
        LedgerEntry::from_outcome(request_id, "TestCommand", &true).unwrap()
    }

    #[tokio::test]
    async fn commit_insert_assigns_first_version() {
        let store = InMemoryOrderStore::new();

        let mut uow = UnitOfWork::new();
        uow.stage_insert(record(1, 0));
        store.commit(uow).await.unwrap();

        let loaded = store.load(OrderId::new(1)).await.unwrap().unwrap();
        assert_eq!(loaded.version, Version::first());
    }

    #[tokio::test]
    async fn commit_update_bumps_version() {
        let store = InMemoryOrderStore::new();

        let mut uow = UnitOfWork::new();
        uow.stage_insert(record(1, 0));
        store.commit(uow).await.unwrap();

        let mut uow = UnitOfWork::new();
        uow.stage_update(record(1, 0), Version::first());
        store.commit(uow).await.unwrap();

        let loaded = store.load(OrderId::new(1)).await.unwrap().unwrap();
        assert_eq!(loaded.version, Version::new(2));
    }

    #[tokio::test]
    async fn commit_with_stale_version_conflicts() {
        let store = InMemoryOrderStore::new();

        let mut uow = UnitOfWork::new();
        uow.stage_insert(record(1, 0));
        store.commit(uow).await.unwrap();

        let mut uow = UnitOfWork::new();
        uow.stage_update(record(1, 0), Version::initial());
        let result = store.commit(uow).await;

        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn insert_over_existing_order_conflicts() {
        let store = InMemoryOrderStore::new();

        let mut uow = UnitOfWork::new();
        uow.stage_insert(record(1, 0));
        store.commit(uow).await.unwrap();

        let mut uow = UnitOfWork::new();
        uow.stage_insert(record(1, 0));
        let result = store.commit(uow).await;

        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn rejected_commit_leaves_nothing_behind() {
        let store = InMemoryOrderStore::new();

        let mut uow = UnitOfWork::new();
        uow.stage_insert(record(1, 0));
        store.commit(uow).await.unwrap();

        // Stale update carrying an event and a ledger entry: all three
        // parts must be discarded together.
        let request_id = RequestId::new();
        let mut uow = UnitOfWork::new();
        uow.stage_update(record(1, 0), Version::new(5));
        uow.stage(IntegrationEventRecord::new(
            "OrderCancelled",
            OrderId::new(1),
            serde_json::json!({}),
        ));
        uow.set_pending_request(entry(request_id));

        let result = store.commit(uow).await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { .. })
        ));

        assert_eq!(store.event_count().await, 0);
        assert!(store.find_request(request_id).await.unwrap().is_none());
        let loaded = store.load(OrderId::new(1)).await.unwrap().unwrap();
        assert_eq!(loaded.version, Version::first());
    }

    #[tokio::test]
    async fn duplicate_ledger_entry_rejects_whole_commit() {
        let store = InMemoryOrderStore::new();
        let request_id = RequestId::new();

        store.record_request(entry(request_id)).await.unwrap();

        let mut uow = UnitOfWork::new();
        uow.stage_insert(record(1, 0));
        uow.set_pending_request(entry(request_id));

        let result = store.commit(uow).await;
        assert!(matches!(result, Err(StoreError::DuplicateRequest(id)) if id == request_id));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn record_request_rejects_duplicates() {
        let store = InMemoryOrderStore::new();
        let request_id = RequestId::new();

        store.record_request(entry(request_id)).await.unwrap();
        let result = store.record_request(entry(request_id)).await;

        assert!(matches!(result, Err(StoreError::DuplicateRequest(_))));
        assert_eq!(store.request_count().await, 1);
    }

    #[tokio::test]
    async fn outbox_claim_and_mark_lifecycle() {
        let store = InMemoryOrderStore::new();

        let event = IntegrationEventRecord::new(
            "OrderPaid",
            OrderId::new(1),
            serde_json::json!({"total": 100}),
        );
        let event_id = event.event_id;

        let mut uow = UnitOfWork::new();
        uow.stage(event);
        store.commit(uow).await.unwrap();

        let pending = store.pending_integration_events().await.unwrap();
        assert_eq!(pending.len(), 1);

        store.mark_event_in_progress(event_id).await.unwrap();
        assert!(store.pending_integration_events().await.unwrap().is_empty());

        store.mark_event_published(event_id).await.unwrap();
        assert!(store.pending_integration_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_unknown_event_fails() {
        let store = InMemoryOrderStore::new();
        let result = store.mark_event_published(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn pending_events_keep_staging_order() {
        let store = InMemoryOrderStore::new();

        let mut uow = UnitOfWork::new();
        uow.stage(IntegrationEventRecord::new(
            "First",
            OrderId::new(1),
            serde_json::json!({}),
        ));
        uow.stage(IntegrationEventRecord::new(
            "Second",
            OrderId::new(1),
            serde_json::json!({}),
        ));
        store.commit(uow).await.unwrap();

        let pending = store.pending_integration_events().await.unwrap();
        let types: Vec<_> = pending.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["First", "Second"]);
    }
}
