//! Notification routing and delivery.
//!
//! For every participant of a [`ParsedEvent`] the manager looks up the
//! subscriptions registered for the participant's address, filters them by the
//! subscriber's preference for the `(event kind, role)` pair and delivers the
//! role's rendered message with bounded exponential backoff. Each retry
//! sequence produces exactly one [`DeliveryAttempt`] record, written once the
//! outcome is known.

pub mod channel;
pub mod preferences;
pub mod render;
pub mod retry;
pub mod store;
#[cfg(test)]
pub(crate) mod testing;

pub use channel::{DeliveryChannel, DeliveryError, WebhookChannel};
pub use preferences::preference_key;
pub use render::{Message, MessageRenderer, render_per_role};
pub use retry::RetryPolicy;
pub use store::{PgSubscriptionStore, StoreError, SubscriptionStore};

use crate::address;
use crate::entities::{DeliveryAttempt, Subscription};
use chainbell_sdk::objects::{ParsedEvent, Role};
use futures_util::StreamExt;
use futures_util::stream;
use std::collections::BTreeMap;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Default number of delivery operations outstanding at once.
pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationConfig {
    pub retry: RetryPolicy,
    /// Upper bound on concurrent subscription lookups and on concurrent deliveries.
    pub batch_size: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("subscription store error: {0}")]
    Store(#[from] StoreError),
}

/// A hard failure scoped to one recipient. Other recipients are unaffected.
#[derive(Debug)]
pub struct RecipientFailure {
    pub role: Role,
    pub address: String,
    pub error: NotifyError,
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Targets that received the notification.
    pub delivered: Vec<String>,
    pub failures: Vec<RecipientFailure>,
}

impl DispatchReport {
    fn merge(&mut self, other: DispatchReport) {
        self.delivered.extend(other.delivered);
        self.failures.extend(other.failures);
    }
}

/// One enabled subscription of one recipient: the unit of delivery concurrency.
struct Delivery<'a> {
    role: Role,
    address: &'a str,
    message: &'a Message,
    subscription: Subscription,
}

pub struct NotificationManager<S, C> {
    store: S,
    channel: C,
    config: NotificationConfig,
}

impl<S: SubscriptionStore, C: DeliveryChannel> NotificationManager<S, C> {
    pub fn new(store: S, channel: C, config: NotificationConfig) -> Self {
        Self {
            store,
            channel,
            config,
        }
    }

    /// Render per role with `renderer`, then [`dispatch`](Self::dispatch).
    pub async fn dispatch_rendered<R: MessageRenderer + ?Sized>(
        &self,
        event: &ParsedEvent,
        renderer: &R,
    ) -> DispatchReport {
        let messages = render_per_role(renderer, event);
        self.dispatch(event, &messages).await
    }

    /// Deliver `messages` to every subscriber of every participant of `event`.
    ///
    /// Never fails as a whole: store errors are reported per recipient and
    /// delivery failures end up in the delivery log.
    pub async fn dispatch(
        &self,
        event: &ParsedEvent,
        messages: &BTreeMap<Role, Message>,
    ) -> DispatchReport {
        let recipients: Vec<(Role, &str, &Message)> = event
            .participants
            .iter()
            .filter_map(|(&role, address)| {
                if !address::is_well_formed(address) {
                    warn!(
                        signature = %event.signature,
                        %role,
                        address = %address,
                        "Skipping participant with malformed address"
                    );
                    return None;
                }
                let Some(message) = messages.get(&role) else {
                    debug!(signature = %event.signature, %role, "No message rendered for role");
                    return None;
                };
                Some((role, address.as_str(), message))
            })
            .collect();

        let batch_size = self.config.batch_size.max(1);
        let mut report = DispatchReport::default();

        let lookups: Vec<_> = recipients
            .into_iter()
            .map(|(role, address, message)| self.resolve_recipient(event, role, address, message))
            .collect();
        let resolved: Vec<Result<Vec<Delivery<'_>>, RecipientFailure>> = stream::iter(lookups)
            .buffer_unordered(batch_size)
            .collect()
            .await;

        let mut deliveries = Vec::new();
        for recipient in resolved {
            match recipient {
                Ok(units) => deliveries.extend(units),
                Err(failure) => report.failures.push(failure),
            }
        }

        // Bounds outstanding delivery operations, not recipients.
        let sends: Vec<_> = deliveries
            .iter()
            .map(|delivery| self.deliver(event, delivery))
            .collect();
        let outcomes: Vec<DispatchReport> = stream::iter(sends)
            .buffer_unordered(batch_size)
            .collect()
            .await;
        for outcome in outcomes {
            report.merge(outcome);
        }

        info!(
            event_type = %event.event_type,
            signature = %event.signature,
            delivered = report.delivered.len(),
            failures = report.failures.len(),
            "Event dispatched"
        );
        report
    }

    /// Subscriptions of one recipient that accept this `(event, role)` pair.
    async fn resolve_recipient<'a>(
        &self,
        event: &ParsedEvent,
        role: Role,
        address: &'a str,
        message: &'a Message,
    ) -> Result<Vec<Delivery<'a>>, RecipientFailure> {
        let subscriptions = self.store.find_by_address(address).await.map_err(|e| {
            warn!(%role, address, error = %e, "Failed to load subscriptions");
            RecipientFailure {
                role,
                address: address.to_string(),
                error: e.into(),
            }
        })?;

        let key = preference_key(&event.event_type, role);
        Ok(subscriptions
            .into_iter()
            .filter(|subscription| {
                let enabled = subscription.is_enabled(&key);
                if !enabled {
                    debug!(
                        subscription_id = subscription.id,
                        preference = %key,
                        "Notification disabled by preference"
                    );
                }
                enabled
            })
            .map(|subscription| Delivery {
                role,
                address,
                message,
                subscription,
            })
            .collect())
    }

    /// One retry sequence plus its delivery log record.
    async fn deliver(&self, event: &ParsedEvent, delivery: &Delivery<'_>) -> DispatchReport {
        let Delivery {
            role,
            address,
            message,
            subscription,
        } = delivery;
        let (attempts, result) = self.deliver_with_retry(&subscription.target, message).await;
        match &result {
            Ok(()) => info!(
                subscription_id = subscription.id,
                event_type = %event.event_type,
                %role,
                attempts,
                "Notification delivered"
            ),
            Err(e) => warn!(
                subscription_id = subscription.id,
                event_type = %event.event_type,
                %role,
                attempts,
                error = %e,
                "Notification delivery failed"
            ),
        }

        let mut report = DispatchReport::default();
        if result.is_ok() {
            report.delivered.push(subscription.target.clone());
        }
        let attempt = DeliveryAttempt {
            subscription_id: subscription.id,
            event_type: event.event_type.clone(),
            role: role.to_string(),
            success: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
            attempts: i32::try_from(attempts).unwrap_or(i32::MAX),
            attempted_at: OffsetDateTime::now_utc(),
        };
        if let Err(e) = self.store.insert_delivery_log(attempt).await {
            warn!(subscription_id = subscription.id, error = %e, "Failed to record delivery attempt");
            report.failures.push(RecipientFailure {
                role: *role,
                address: address.to_string(),
                error: e.into(),
            });
        }
        report
    }

    /// Returns the number of tries made and the final outcome.
    async fn deliver_with_retry(
        &self,
        target: &str,
        message: &Message,
    ) -> (u32, Result<(), DeliveryError>) {
        let policy = &self.config.retry;
        let max_attempts = policy.attempts();
        let mut attempt = 1;
        loop {
            match self.channel.send_to_target(target, message).await {
                Ok(()) => return (attempt, Ok(())),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = policy
                        .delay_for(attempt)
                        .max(e.retry_after().unwrap_or_default());
                    debug!(
                        attempt,
                        ?delay,
                        error = %e,
                        "Retrying delivery"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return (attempt, Err(e)),
            }
        }
    }
}
