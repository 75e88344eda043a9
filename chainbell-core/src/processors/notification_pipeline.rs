//! NotificationPipeline processor.
//!
//! The NotificationPipeline is responsible for:
//! - Receiving `LogBatch` events from the queue
//! - Parsing each batch into `ParsedEvent`s
//! - Rendering one message per participant role
//! - Dispatching the messages through the `NotificationManager`
//!
//! Events of one batch are dispatched in log order; batches are handled one at
//! a time in arrival order.

use crate::events::LogBatchReceiver;
use crate::notify::{
    DeliveryChannel, DispatchReport, MessageRenderer, NotificationManager, SubscriptionStore,
};
use crate::parser::EventParser;
use chainbell_sdk::objects::LogBatch;
use kanau::processor::Processor;
use std::convert::Infallible;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct NotificationPipeline<S, C, R> {
    parser: EventParser,
    manager: NotificationManager<S, C>,
    renderer: R,
}

impl<S, C, R> NotificationPipeline<S, C, R>
where
    S: SubscriptionStore,
    C: DeliveryChannel,
    R: MessageRenderer,
{
    pub fn new(parser: EventParser, manager: NotificationManager<S, C>, renderer: R) -> Self {
        Self {
            parser,
            manager,
            renderer,
        }
    }

    /// Run until shutdown is signalled or every batch sender is dropped.
    pub async fn run(self, mut batch_rx: LogBatchReceiver, mut shutdown_rx: watch::Receiver<bool>) {
        info!("NotificationPipeline started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("NotificationPipeline received shutdown signal");
                        break;
                    }
                }

                batch = batch_rx.recv() => match batch {
                    Some(batch) => {
                        debug!(
                            signature = ?batch.context.signature,
                            lines = batch.logs.len(),
                            "Received LogBatch"
                        );
                        self.handle_batch(batch).await;
                    }
                    None => {
                        info!("LogBatch channel closed");
                        break;
                    }
                },
            }
        }

        info!("NotificationPipeline shutdown complete");
    }

    async fn handle_batch(&self, batch: LogBatch) -> Vec<DispatchReport> {
        let events = self
            .parser
            .parse_logs_for_events(&batch.logs, &batch.context);
        let mut reports = Vec::with_capacity(events.len());
        for event in &events {
            if event.participants.is_empty() {
                debug!(event_type = %event.event_type, "Event has no participants");
                continue;
            }
            let report = self.manager.dispatch_rendered(event, &self.renderer).await;
            for failure in &report.failures {
                warn!(
                    event_type = %event.event_type,
                    role = %failure.role,
                    address = %failure.address,
                    error = %failure.error,
                    "Recipient could not be notified"
                );
            }
            reports.push(report);
        }
        reports
    }
}

impl<S, C, R> Processor<LogBatch> for NotificationPipeline<S, C, R>
where
    S: SubscriptionStore,
    C: DeliveryChannel,
    R: MessageRenderer,
{
    type Output = Vec<DispatchReport>;
    type Error = Infallible;

    async fn process(&self, batch: LogBatch) -> Result<Vec<DispatchReport>, Infallible> {
        Ok(self.handle_batch(batch).await)
    }
}
