pub mod types;

pub use types::{BuyerId, OrderId, RequestId};
