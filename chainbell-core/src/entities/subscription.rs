use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use sqlx::types::Json;
use std::collections::HashMap;

/// A delivery target registered for one wallet address.
///
/// Read-only to the core; rows are created and edited elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: i64,
    pub address: String,
    /// Delivery target identity, a webhook URL for the webhook channel.
    pub target: String,
    /// Preference key -> enabled. A missing key means enabled.
    pub preferences: HashMap<String, bool>,
}

impl Subscription {
    pub fn is_enabled(&self, preference_key: &str) -> bool {
        self.preferences.get(preference_key).copied().unwrap_or(true)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: i64,
    address: String,
    target: String,
    preferences: Json<HashMap<String, bool>>,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            id: row.id,
            address: row.address,
            target: row.target,
            preferences: row.preferences.0,
        }
    }
}

#[derive(Debug, Clone)]
/// All subscriptions registered for an address, oldest first.
pub struct GetSubscriptionsByAddress {
    pub address: String,
}

impl Processor<GetSubscriptionsByAddress> for DatabaseProcessor {
    type Output = Vec<Subscription>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSubscriptionsByAddress")]
    async fn process(
        &self,
        query: GetSubscriptionsByAddress,
    ) -> Result<Vec<Subscription>, sqlx::Error> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, address, target, preferences
            FROM subscriptions
            WHERE address = $1
            ORDER BY id
            "#,
        )
        .bind(&query.address)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Subscription::from).collect())
    }
}
