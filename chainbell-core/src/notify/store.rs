//! Persistence contract the notification manager depends on.

use crate::entities::{DeliveryAttempt, GetSubscriptionsByAddress, InsertDeliveryLog, Subscription};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_by_address(&self, address: &str) -> Result<Vec<Subscription>, StoreError>;

    async fn insert_delivery_log(&self, attempt: DeliveryAttempt) -> Result<(), StoreError>;
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgSubscriptionStore {
    db: DatabaseProcessor,
}

impl PgSubscriptionStore {
    pub fn new(db: DatabaseProcessor) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn find_by_address(&self, address: &str) -> Result<Vec<Subscription>, StoreError> {
        let subscriptions = self
            .db
            .process(GetSubscriptionsByAddress {
                address: address.to_string(),
            })
            .await?;
        Ok(subscriptions)
    }

    async fn insert_delivery_log(&self, attempt: DeliveryAttempt) -> Result<(), StoreError> {
        self.db.process(InsertDeliveryLog { attempt }).await?;
        Ok(())
    }
}

#[async_trait]
impl<T: SubscriptionStore + ?Sized> SubscriptionStore for std::sync::Arc<T> {
    async fn find_by_address(&self, address: &str) -> Result<Vec<Subscription>, StoreError> {
        (**self).find_by_address(address).await
    }

    async fn insert_delivery_log(&self, attempt: DeliveryAttempt) -> Result<(), StoreError> {
        (**self).insert_delivery_log(attempt).await
    }
}
