//! Integration event records and their publish lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::OrderId;

/// Publish lifecycle of a staged integration event.
///
/// Records move only forward: `NotPublished → InProgress → Published`
/// or `InProgress → PublishFailed`. A record is never re-created once
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventPublishState {
    /// Committed with the unit of work, not yet claimed by the publisher.
    #[default]
    NotPublished,

    /// Claimed by the publisher, delivery in flight.
    InProgress,

    /// Successfully delivered.
    Published,

    /// Delivery failed; eligible for a later retry sweep.
    PublishFailed,
}

impl EventPublishState {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPublishState::NotPublished => "NotPublished",
            EventPublishState::InProgress => "InProgress",
            EventPublishState::Published => "Published",
            EventPublishState::PublishFailed => "PublishFailed",
        }
    }
}

impl std::fmt::Display for EventPublishState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventPublishState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NotPublished" => Ok(EventPublishState::NotPublished),
            "InProgress" => Ok(EventPublishState::InProgress),
            "Published" => Ok(EventPublishState::Published),
            "PublishFailed" => Ok(EventPublishState::PublishFailed),
            other => Err(format!("unknown publish state: {other}")),
        }
    }
}

/// A durable record of a domain fact produced during a unit of work.
///
/// Staged records become durable only when the unit of work commits, so
/// the event and the state change it describes are atomically consistent.
/// An external publisher later claims pending records and marks them
/// published or failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationEventRecord {
    /// Unique identifier for this record.
    pub event_id: Uuid,

    /// The event type name (e.g. "OrderPaid").
    pub event_type: String,

    /// The order that produced the event.
    pub order_id: OrderId,

    /// The event payload as JSON.
    pub payload: serde_json::Value,

    /// When the event was produced.
    pub occurred_at: DateTime<Utc>,

    /// Current publish lifecycle state.
    pub state: EventPublishState,

    /// How many publish attempts have claimed this record.
    pub times_sent: i32,
}

impl IntegrationEventRecord {
    /// Creates a new unpublished record.
    pub fn new(
        event_type: impl Into<String>,
        order_id: OrderId,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type.into(),
            order_id,
            payload,
            occurred_at: Utc::now(),
            state: EventPublishState::NotPublished,
            times_sent: 0,
        }
    }
}
