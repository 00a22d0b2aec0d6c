use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use common::{OrderId, RequestId};

/// Version token for an order row, used for optimistic concurrency control.
///
/// A new aggregate starts at version 0; the first committed write stores
/// version 1, and every subsequent commit increments by 1. A save that
/// targets a stale version is rejected as a conflict.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for a not-yet-persisted aggregate.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the first committed version (1).
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// The persisted form of an order aggregate.
///
/// The payload holds the full serialized aggregate including its line
/// items, so loading a record always materializes a complete aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    /// The order this record belongs to.
    pub id: OrderId,

    /// The serialized aggregate state.
    pub payload: serde_json::Value,

    /// The concurrency token for this row.
    pub version: Version,
}

impl OrderRecord {
    /// Creates a record from a serializable aggregate state.
    pub fn from_state<T: Serialize>(
        id: OrderId,
        version: Version,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id,
            payload: serde_json::to_value(state)?,
            version,
        })
    }

    /// Deserializes the payload into a concrete aggregate type.
    pub fn into_state<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload)
    }
}

/// An entry in the request ledger.
///
/// Created exactly once per request identifier, inside the same unit of
/// work as the mutation it guards, and never mutated afterwards. Reading
/// it back on a later delivery of the same identifier is what makes
/// re-delivery a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The caller-supplied request identifier.
    pub request_id: RequestId,

    /// The command kind that produced this entry.
    pub command_name: String,

    /// The serialized outcome returned to the original caller.
    pub outcome: serde_json::Value,

    /// When the request was processed.
    pub processed_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Creates a ledger entry from a serializable outcome.
    pub fn from_outcome<T: Serialize>(
        request_id: RequestId,
        command_name: impl Into<String>,
        outcome: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            request_id,
            command_name: command_name.into(),
            outcome: serde_json::to_value(outcome)?,
            processed_at: Utc::now(),
        })
    }

    /// Deserializes the stored outcome into a concrete type.
    pub fn outcome_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.outcome.clone())
    }
}
