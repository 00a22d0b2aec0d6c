//! Domain event trait.

use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and named in past tense. The repository layer uses
/// [`event_type`](DomainEvent::event_type) when staging events for the
/// integration event log.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregate roots that queue domain events.
///
/// The repository layer drains queued events through this trait when it
/// stages an aggregate write, so the events always ride the same unit of
/// work as the state change that raised them.
pub trait AggregateRoot {
    type Id: Copy;
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Self::Id;

    /// Drains the events queued since the last drain.
    fn take_events(&mut self) -> Vec<Self::Event>;
}
