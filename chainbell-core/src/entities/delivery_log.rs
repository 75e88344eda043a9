use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use time::OffsetDateTime;

/// Outcome of one retry sequence against one subscription.
///
/// Append-only. Intermediate tries are not recorded; `attempts` counts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAttempt {
    pub subscription_id: i64,
    pub event_type: String,
    pub role: String,
    pub success: bool,
    pub error: Option<String>,
    pub attempts: i32,
    pub attempted_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct InsertDeliveryLog {
    pub attempt: DeliveryAttempt,
}

impl Processor<InsertDeliveryLog> for DatabaseProcessor {
    type Output = ();
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertDeliveryLog")]
    async fn process(&self, insert: InsertDeliveryLog) -> Result<(), sqlx::Error> {
        let attempt = insert.attempt;
        sqlx::query(
            r#"
            INSERT INTO delivery_logs
                (subscription_id, event_type, role, success, error, attempts, attempted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(attempt.subscription_id)
        .bind(attempt.event_type)
        .bind(attempt.role)
        .bind(attempt.success)
        .bind(attempt.error)
        .bind(attempt.attempts)
        .bind(attempt.attempted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
