//! Request-ledger deduplication around a command handler.

use order_store::{LedgerEntry, OrderStore, StoreError};

use crate::commands::{Command, IdentifiedCommand};
use crate::handlers::CommandHandler;
use crate::outcome::CommandOutcome;

/// Decorator that consults the request ledger before delegating.
///
/// A request identifier seen before never reaches the inner handler again:
/// an accepted entry replays the command kind's duplicate result, a
/// recorded rejection replays that rejection. On a first delivery the
/// decorator hands the inner handler a pending ledger entry to commit
/// atomically with its mutation; losing a concurrent race on the
/// identifier is resolved the same way a plain duplicate is.
pub struct IdempotentHandler<S, H> {
    store: S,
    inner: H,
}

impl<S, H> IdempotentHandler<S, H>
where
    S: OrderStore,
    H: CommandHandler,
{
    /// Wraps a handler with ledger-backed deduplication.
    pub fn new(store: S, inner: H) -> Self {
        Self { store, inner }
    }

    /// Processes an identified command exactly once.
    pub async fn handle(
        &self,
        request: IdentifiedCommand<H::Command>,
    ) -> Result<CommandOutcome, StoreError> {
        if let Some(entry) = self.store.find_request(request.request_id).await? {
            tracing::info!(
                request_id = %request.request_id,
                command = %entry.command_name,
                "duplicate request, replaying recorded outcome"
            );
            metrics::counter!("order_requests_duplicate_total").increment(1);
            return Self::replay(&request.command, &entry);
        }

        let pending = LedgerEntry::from_outcome(
            request.request_id,
            request.command.name(),
            &CommandOutcome::Accepted,
        )?;

        match self.inner.handle(&request.command, pending).await {
            Ok(outcome) => {
                if outcome.is_terminal_rejection() {
                    return self.record_rejection(&request, outcome).await;
                }
                Ok(outcome)
            }
            // A concurrent delivery of the same identifier committed first.
            Err(StoreError::DuplicateRequest(request_id)) => {
                tracing::info!(
                    request_id = %request_id,
                    "lost ledger race to a concurrent delivery"
                );
                metrics::counter!("order_requests_duplicate_total").increment(1);
                self.resolve_duplicate(&request).await
            }
            Err(e) => Err(e),
        }
    }

    /// Maps a recorded entry to the outcome its caller should see: an
    /// accepted entry goes through the command kind's duplicate policy,
    /// a recorded rejection replays as stored.
    fn replay(command: &H::Command, entry: &LedgerEntry) -> Result<CommandOutcome, StoreError> {
        let recorded: CommandOutcome = entry.outcome_as()?;
        Ok(if recorded.is_accepted() {
            command.result_for_duplicate()
        } else {
            recorded
        })
    }

    /// Resolves a lost ledger race against whatever the winner recorded.
    async fn resolve_duplicate(
        &self,
        request: &IdentifiedCommand<H::Command>,
    ) -> Result<CommandOutcome, StoreError> {
        match self.store.find_request(request.request_id).await? {
            Some(entry) => Self::replay(&request.command, &entry),
            // Ledger entries are never deleted, so a losing race implies
            // the winner's entry is readable. Fall back to the policy.
            None => Ok(request.command.result_for_duplicate()),
        }
    }

    /// Records a terminal rejection so re-delivery short-circuits without
    /// re-hitting the aggregate. Retryable outcomes are deliberately left
    /// unrecorded.
    ///
    /// Losing the ledger race here means a concurrent delivery committed
    /// first and this execution observed state the original caller never
    /// produced; the winner's recorded outcome is the request's result,
    /// not the local rejection.
    async fn record_rejection(
        &self,
        request: &IdentifiedCommand<H::Command>,
        outcome: CommandOutcome,
    ) -> Result<CommandOutcome, StoreError> {
        let entry =
            LedgerEntry::from_outcome(request.request_id, request.command.name(), &outcome)?;

        match self.store.record_request(entry).await {
            Ok(()) => Ok(outcome),
            Err(StoreError::DuplicateRequest(request_id)) => {
                tracing::info!(
                    request_id = %request_id,
                    "rejection lost ledger race, deferring to recorded outcome"
                );
                metrics::counter!("order_requests_duplicate_total").increment(1);
                self.resolve_duplicate(request).await
            }
            Err(e) => Err(e),
        }
    }
}
