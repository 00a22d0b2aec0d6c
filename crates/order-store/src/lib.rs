pub mod error;
pub mod memory;
pub mod outbox;
pub mod postgres;
pub mod record;
pub mod store;
pub mod unit_of_work;

pub use common::{OrderId, RequestId};
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use outbox::{EventPublishState, IntegrationEventRecord};
pub use postgres::PostgresOrderStore;
pub use record::{LedgerEntry, OrderRecord, Version};
pub use store::OrderStore;
pub use unit_of_work::{OrderWrite, UnitOfWork};
