//! The durable store contract.

use async_trait::async_trait;
use uuid::Uuid;

use common::{OrderId, RequestId};

use crate::error::Result;
use crate::outbox::IntegrationEventRecord;
use crate::record::{LedgerEntry, OrderRecord};
use crate::unit_of_work::UnitOfWork;

/// Contract every durable store backing the command pipeline must satisfy.
///
/// The store is the only shared mutable resource in the system; all
/// mutation goes through [`commit`](OrderStore::commit), which applies a
/// unit of work atomically. Contention is resolved via the order row's
/// version token and the request ledger's uniqueness constraint, never
/// via long-lived locks.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Loads the persisted record for an order.
    ///
    /// The payload always carries the fully serialized aggregate, so a
    /// loaded order is never partially materialized.
    async fn load(&self, id: OrderId) -> Result<Option<OrderRecord>>;

    /// Looks up the ledger entry for a request identifier.
    async fn find_request(&self, request_id: RequestId) -> Result<Option<LedgerEntry>>;

    /// Records a ledger entry outside any unit of work.
    ///
    /// Used for terminal rejections, where nothing else was committed but
    /// repeated delivery should still short-circuit. Fails with
    /// [`StoreError::DuplicateRequest`] if the identifier is already
    /// recorded.
    ///
    /// [`StoreError::DuplicateRequest`]: crate::error::StoreError::DuplicateRequest
    async fn record_request(&self, entry: LedgerEntry) -> Result<()>;

    /// Atomically applies a unit of work: the aggregate write, its staged
    /// integration events, and the pending ledger entry commit together
    /// or not at all.
    ///
    /// Fails with [`StoreError::ConcurrencyConflict`] when the aggregate
    /// write targets a stale version, and with
    /// [`StoreError::DuplicateRequest`] when the ledger entry loses a
    /// race on its identifier. Either failure leaves the store untouched.
    ///
    /// [`StoreError::ConcurrencyConflict`]: crate::error::StoreError::ConcurrencyConflict
    /// [`StoreError::DuplicateRequest`]: crate::error::StoreError::DuplicateRequest
    async fn commit(&self, uow: UnitOfWork) -> Result<()>;

    /// Returns unpublished integration events in staging order.
    async fn pending_integration_events(&self) -> Result<Vec<IntegrationEventRecord>>;

    /// Claims an event for publication and increments its send counter.
    async fn mark_event_in_progress(&self, event_id: Uuid) -> Result<()>;

    /// Marks a claimed event as delivered.
    async fn mark_event_published(&self, event_id: Uuid) -> Result<()>;

    /// Marks a claimed event as failed, leaving it for a retry sweep.
    async fn mark_event_failed(&self, event_id: Uuid) -> Result<()>;
}
