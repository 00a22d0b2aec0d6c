//! Classified command results returned to callers.

use serde::{Deserialize, Serialize};

/// Why a command was not applied.
///
/// `NotFound` and `InvalidTransition` are final: re-delivering the same
/// command cannot succeed, so the decorator records them in the ledger.
/// `ConcurrencyConflict` is retryable and is never recorded — the caller
/// re-fetches and retries the whole read-mutate-write cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason")]
pub enum RejectReason {
    /// The target order does not exist.
    NotFound,

    /// The state machine rejected the requested change.
    InvalidTransition { from: String, action: String },

    /// The command payload failed aggregate validation.
    Validation { message: String },

    /// The commit targeted a stale aggregate version.
    ConcurrencyConflict,
}

impl RejectReason {
    /// Returns the machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::NotFound => "not_found",
            RejectReason::InvalidTransition { .. } => "invalid_transition",
            RejectReason::Validation { .. } => "validation",
            RejectReason::ConcurrencyConflict => "concurrency_conflict",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NotFound => write!(f, "order not found"),
            RejectReason::InvalidTransition { from, action } => {
                write!(f, "cannot {action} from {from} status")
            }
            RejectReason::Validation { message } => write!(f, "validation failed: {message}"),
            RejectReason::ConcurrencyConflict => write!(f, "concurrent update detected"),
        }
    }
}

impl From<domain::OrderError> for RejectReason {
    fn from(e: domain::OrderError) -> Self {
        match e {
            domain::OrderError::InvalidTransition { from, action } => {
                RejectReason::InvalidTransition {
                    from: from.to_string(),
                    action: action.to_string(),
                }
            }
            other => RejectReason::Validation {
                message: other.to_string(),
            },
        }
    }
}

/// The classified result of processing a command.
///
/// Business-rule failures are carried here as rejections, never as
/// errors; only transient store faults propagate as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail")]
pub enum CommandOutcome {
    /// The command was applied and committed.
    Accepted,

    /// The command was not applied.
    Rejected(RejectReason),
}

impl CommandOutcome {
    /// Returns true if the command was applied.
    pub fn is_accepted(&self) -> bool {
        matches!(self, CommandOutcome::Accepted)
    }

    /// Returns true for rejections that no retry can fix.
    ///
    /// These are the outcomes worth recording in the request ledger so a
    /// re-delivered broken command short-circuits instead of re-hitting
    /// the aggregate.
    pub fn is_terminal_rejection(&self) -> bool {
        matches!(
            self,
            CommandOutcome::Rejected(
                RejectReason::NotFound
                    | RejectReason::InvalidTransition { .. }
                    | RejectReason::Validation { .. }
            )
        )
    }
}
