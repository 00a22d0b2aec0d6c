//! Repository over the order store.

use common::OrderId;
use domain::{AggregateRoot, DomainEvent, Order};
use order_store::{
    IntegrationEventRecord, LedgerEntry, OrderRecord, OrderStore, StoreError, UnitOfWork, Version,
};

/// Loads and stages one order aggregate per command.
///
/// A repository is constructed fresh for every command and owns that
/// command's [`UnitOfWork`]; aggregates are never shared across commands.
/// `get` always materializes the full aggregate — the persisted payload
/// carries the line items, so a partially loaded order cannot exist.
pub struct OrderRepository<S: OrderStore> {
    store: S,
    uow: UnitOfWork,
    loaded_version: Option<Version>,
}

impl<S: OrderStore> OrderRepository<S> {
    /// Creates a repository with an empty unit of work.
    pub fn new(store: S) -> Self {
        Self {
            store,
            uow: UnitOfWork::new(),
            loaded_version: None,
        }
    }

    /// Loads an order, remembering its version for the later save.
    pub async fn get(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let Some(record) = self.store.load(id).await? else {
            return Ok(None);
        };

        self.loaded_version = Some(record.version);
        let order: Order = record.into_state()?;
        Ok(Some(order))
    }

    /// Stages the insert of a newly placed order and drains its raised
    /// events into the unit of work.
    pub fn add(&mut self, order: &mut Order) -> Result<(), StoreError> {
        let record = OrderRecord::from_state(order.id(), Version::initial(), order)?;
        self.uow.stage_insert(record);
        self.stage_raised_events(order)
    }

    /// Stages the update of a previously loaded order against the version
    /// it was loaded at, and drains its raised events.
    ///
    /// # Panics
    ///
    /// Panics if no order was loaded through this repository first.
    pub fn update(&mut self, order: &mut Order) -> Result<(), StoreError> {
        let expected = self
            .loaded_version
            .expect("an order must be loaded before it can be updated");
        let record = OrderRecord::from_state(order.id(), expected, order)?;
        self.uow.stage_update(record, expected);
        self.stage_raised_events(order)
    }

    /// Appends a directly-built integration event to the unit of work.
    pub fn stage_event(&mut self, event: IntegrationEventRecord) {
        self.uow.stage(event);
    }

    /// Attaches the request ledger entry that must commit atomically with
    /// this unit of work.
    pub fn set_pending_request(&mut self, entry: LedgerEntry) {
        self.uow.set_pending_request(entry);
    }

    /// Commits the unit of work atomically.
    ///
    /// Returns `Ok(false)` on an optimistic-concurrency conflict — the
    /// command was not applied and the caller should re-fetch and retry.
    /// A duplicate-request conflict propagates as an error so the
    /// idempotency layer can resolve the race. Infrastructure failures
    /// propagate unchanged.
    pub async fn save_entities(&mut self) -> Result<bool, StoreError> {
        let uow = std::mem::take(&mut self.uow);
        self.loaded_version = None;

        match self.store.commit(uow).await {
            Ok(()) => Ok(true),
            Err(StoreError::ConcurrencyConflict {
                order_id,
                expected,
                actual,
            }) => {
                tracing::warn!(
                    order_id = %order_id,
                    expected = %expected,
                    actual = %actual,
                    "commit rejected by concurrency token"
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn stage_raised_events<A>(&mut self, aggregate: &mut A) -> Result<(), StoreError>
    where
        A: AggregateRoot<Id = OrderId>,
    {
        let order_id = aggregate.aggregate_id();
        for event in aggregate.take_events() {
            let record = IntegrationEventRecord::new(
                event.event_type(),
                order_id,
                serde_json::to_value(&event)?,
            );
            self.uow.stage(record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::BuyerId;
    use domain::{Address, Money, OrderItem, OrderStatus, ProductId};
    use order_store::InMemoryOrderStore;

    fn placed_order(id: i64) -> Order {
        Order::place(
            OrderId::new(id),
            BuyerId::new(),
            Address::new("1 Main St", "Seattle", "WA", "US", "98101"),
            vec![
                OrderItem::new(
                    ProductId::new(1),
                    "Widget",
                    Money::from_cents(1000),
                    Money::zero(),
                    2,
                )
                .unwrap(),
            ],
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn add_and_save_roundtrip() {
        let store = InMemoryOrderStore::new();
        let mut repository = OrderRepository::new(store.clone());

        let mut order = placed_order(1);
        repository.add(&mut order).unwrap();
        assert!(repository.save_entities().await.unwrap());

        let mut repository = OrderRepository::new(store.clone());
        let loaded = repository.get(OrderId::new(1)).await.unwrap().unwrap();
        assert_eq!(loaded.status(), OrderStatus::Submitted);
        assert_eq!(loaded.items().len(), 1);

        // The OrderStarted event committed with the insert.
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn get_missing_order_returns_none() {
        let store = InMemoryOrderStore::new();
        let mut repository = OrderRepository::new(store);
        assert!(repository.get(OrderId::new(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_stages_against_loaded_version() {
        let store = InMemoryOrderStore::new();

        let mut repository = OrderRepository::new(store.clone());
        let mut order = placed_order(1);
        repository.add(&mut order).unwrap();
        repository.save_entities().await.unwrap();

        let mut repository = OrderRepository::new(store.clone());
        let mut order = repository.get(OrderId::new(1)).await.unwrap().unwrap();
        order.set_cancelled_status().unwrap();
        repository.update(&mut order).unwrap();
        assert!(repository.save_entities().await.unwrap());

        let mut repository = OrderRepository::new(store.clone());
        let loaded = repository.get(OrderId::new(1)).await.unwrap().unwrap();
        assert_eq!(loaded.status(), OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn stale_save_returns_false() {
        let store = InMemoryOrderStore::new();

        let mut repository = OrderRepository::new(store.clone());
        let mut order = placed_order(1);
        repository.add(&mut order).unwrap();
        repository.save_entities().await.unwrap();

        // Two repositories load the same version.
        let mut first = OrderRepository::new(store.clone());
        let mut order_a = first.get(OrderId::new(1)).await.unwrap().unwrap();
        let mut second = OrderRepository::new(store.clone());
        let mut order_b = second.get(OrderId::new(1)).await.unwrap().unwrap();

        order_a.set_cancelled_status().unwrap();
        first.update(&mut order_a).unwrap();
        assert!(first.save_entities().await.unwrap());

        order_b.set_awaiting_validation_status().unwrap();
        second.update(&mut order_b).unwrap();
        assert!(!second.save_entities().await.unwrap());

        // The loser's staged event must not be visible.
        let mut repository = OrderRepository::new(store.clone());
        let loaded = repository.get(OrderId::new(1)).await.unwrap().unwrap();
        assert_eq!(loaded.status(), OrderStatus::Cancelled);
    }
}
