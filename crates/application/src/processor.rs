//! Command routing entry point.

use common::RequestId;
use order_store::{OrderStore, StoreError};

use crate::commands::{Command, IdentifiedCommand, OrderCommand};
use crate::handlers::{
    CancelOrderHandler, CommandHandler, CreateOrderHandler, SetAwaitingValidationStatusHandler,
    SetPaidOrderStatusHandler, SetStockConfirmedStatusHandler, ShipOrderHandler,
};
use crate::idempotency::IdempotentHandler;
use crate::outcome::CommandOutcome;

/// Routes identified commands to their handlers through the idempotency
/// layer.
///
/// The processor is the single entry point of the pipeline: everything
/// it dispatches is deduplicated by request identifier before the
/// per-kind handler runs.
pub struct CommandProcessor<S> {
    store: S,
}

impl<S: OrderStore + Clone> CommandProcessor<S> {
    /// Creates a processor over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Processes one identified command to a classified outcome.
    ///
    /// Business-rule failures come back as rejected outcomes; `Err` is
    /// reserved for store faults.
    #[tracing::instrument(
        skip_all,
        fields(request_id = %request.request_id, command = request.command.name())
    )]
    pub async fn process(
        &self,
        request: IdentifiedCommand<OrderCommand>,
    ) -> Result<CommandOutcome, StoreError> {
        metrics::counter!("order_commands_total", "command" => request.command.name())
            .increment(1);

        let request_id = request.request_id;
        let outcome = match request.command {
            OrderCommand::Create(c) => {
                self.run(CreateOrderHandler::new(self.store.clone()), request_id, c)
                    .await
            }
            OrderCommand::Cancel(c) => {
                self.run(CancelOrderHandler::new(self.store.clone()), request_id, c)
                    .await
            }
            OrderCommand::SetAwaitingValidation(c) => {
                self.run(
                    SetAwaitingValidationStatusHandler::new(self.store.clone()),
                    request_id,
                    c,
                )
                .await
            }
            OrderCommand::SetStockConfirmed(c) => {
                self.run(
                    SetStockConfirmedStatusHandler::new(self.store.clone()),
                    request_id,
                    c,
                )
                .await
            }
            OrderCommand::SetPaid(c) => {
                self.run(
                    SetPaidOrderStatusHandler::new(self.store.clone()),
                    request_id,
                    c,
                )
                .await
            }
            OrderCommand::Ship(c) => {
                self.run(ShipOrderHandler::new(self.store.clone()), request_id, c)
                    .await
            }
        }?;

        if let CommandOutcome::Rejected(reason) = &outcome {
            metrics::counter!("order_commands_rejected_total", "reason" => reason.code())
                .increment(1);
        }

        Ok(outcome)
    }

    async fn run<H: CommandHandler>(
        &self,
        handler: H,
        request_id: RequestId,
        command: H::Command,
    ) -> Result<CommandOutcome, StoreError> {
        IdempotentHandler::new(self.store.clone(), handler)
            .handle(IdentifiedCommand::new(request_id, command))
            .await
    }
}
