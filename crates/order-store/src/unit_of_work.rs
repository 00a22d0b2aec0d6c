//! Staged writes for a single command's transactional scope.

use common::OrderId;

use crate::outbox::IntegrationEventRecord;
use crate::record::{LedgerEntry, OrderRecord, Version};

/// The aggregate write staged in a unit of work.
#[derive(Debug, Clone)]
pub enum OrderWrite {
    /// A newly placed order; the store assigns the first version.
    Insert(OrderRecord),

    /// A mutated order; the store rejects the write unless the persisted
    /// row still carries `expected`.
    Update {
        record: OrderRecord,
        expected: Version,
    },
}

impl OrderWrite {
    /// Returns the order the write targets.
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderWrite::Insert(record) => record.id,
            OrderWrite::Update { record, .. } => record.id,
        }
    }
}

/// Everything a single command wants to commit as one transaction:
/// at most one aggregate write, the integration events produced while
/// mutating it, and the request ledger entry guarding the command.
///
/// Nothing staged here is durable until [`OrderStore::commit`] succeeds.
///
/// [`OrderStore::commit`]: crate::store::OrderStore::commit
#[derive(Debug, Clone, Default)]
pub struct UnitOfWork {
    order_write: Option<OrderWrite>,
    staged_events: Vec<IntegrationEventRecord>,
    ledger_entry: Option<LedgerEntry>,
}

impl UnitOfWork {
    /// Creates an empty unit of work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an insert of a newly placed order.
    pub fn stage_insert(&mut self, record: OrderRecord) {
        self.order_write = Some(OrderWrite::Insert(record));
    }

    /// Stages an update of a loaded order against its loaded version.
    pub fn stage_update(&mut self, record: OrderRecord, expected: Version) {
        self.order_write = Some(OrderWrite::Update { record, expected });
    }

    /// Appends an integration event to this unit of work.
    /// The event becomes durable only upon commit.
    pub fn stage(&mut self, event: IntegrationEventRecord) {
        self.staged_events.push(event);
    }

    /// Sets the request ledger entry that commits with this unit of work.
    pub fn set_pending_request(&mut self, entry: LedgerEntry) {
        self.ledger_entry = Some(entry);
    }

    /// Returns the staged aggregate write, if any.
    pub fn order_write(&self) -> Option<&OrderWrite> {
        self.order_write.as_ref()
    }

    /// Returns the staged integration events in staging order.
    pub fn staged_events(&self) -> &[IntegrationEventRecord] {
        &self.staged_events
    }

    /// Returns the pending ledger entry, if any.
    pub fn ledger_entry(&self) -> Option<&LedgerEntry> {
        self.ledger_entry.as_ref()
    }

    /// Returns true if nothing has been staged.
    pub fn is_empty(&self) -> bool {
        self.order_write.is_none() && self.staged_events.is_empty() && self.ledger_entry.is_none()
    }

    /// Consumes the unit of work into its staged parts.
    pub fn into_parts(
        self,
    ) -> (
        Option<OrderWrite>,
        Vec<IntegrationEventRecord>,
        Option<LedgerEntry>,
    ) {
        (self.order_write, self.staged_events, self.ledger_entry)
    }
}
