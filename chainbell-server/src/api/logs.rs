use axum::extract::State;
use axum::{Json, http::StatusCode, response::IntoResponse};
use chainbell_sdk::objects::{LogBatch, ParsedEvent};
use serde::Serialize;
use thiserror::Error;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub events: Vec<ParsedEvent>,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("notification queue is closed")]
    QueueClosed,
}

impl IntoResponse for IngestError {
    fn into_response(self) -> axum::response::Response {
        match self {
            IngestError::QueueClosed => {
                tracing::error!("Log batch rejected, notification pipeline is not running");
                (StatusCode::SERVICE_UNAVAILABLE, "notification queue unavailable").into_response()
            }
        }
    }
}

/// `POST /logs`: parse a `LogBatch` and queue it for notification.
///
/// Responds with the events found in the batch. Batches that yield no events
/// are not queued. A missing signature is replaced by a generated placeholder
/// so the response and the queued dispatch agree on the event id.
pub async fn ingest_logs(
    State(state): State<AppState>,
    Json(mut batch): Json<LogBatch>,
) -> Result<impl IntoResponse, IngestError> {
    if batch.context.program_id.is_none() {
        batch.context.program_id = state.program_id.clone();
    }
    if batch.context.signature.is_none() {
        batch.context.signature = Some(format!("unknown_{}", uuid::Uuid::new_v4().simple()));
    }

    let events = state
        .parser
        .parse_logs_for_events(&batch.logs, &batch.context);
    if events.is_empty() {
        return Ok((
            StatusCode::OK,
            Json(IngestResponse {
                status: "ignored",
                events,
            }),
        ));
    }

    tracing::debug!(
        signature = ?batch.context.signature,
        events = events.len(),
        "Queueing log batch"
    );
    state
        .batches
        .send(batch)
        .await
        .map_err(|_| IngestError::QueueClosed)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            status: "queued",
            events,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::state::AppState;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chainbell_core::events::log_batch_channel;
    use chainbell_core::parser::EventParser;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const BUYER: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
    const PROGRAM: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";

    fn post_logs(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/logs")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_batch_with_events_is_queued() {
        let (tx, mut rx) = log_batch_channel();
        let router = build_router(AppState::new(
            tx,
            EventParser::default(),
            Some(PROGRAM.to_string()),
        ));

        let response = router
            .oneshot(post_logs(json!({
                "logs": [
                    "Program log: Instruction: CreateBuyOrder",
                    format!("Program log: buyer: {BUYER}"),
                ],
                "context": { "signature": "5sig" }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        assert_eq!(body["status"], "queued");
        assert_eq!(body["events"][0]["event_type"], "BuyOrderCreatedEvent");
        assert_eq!(body["events"][0]["participants"]["buyer"], BUYER);

        let queued = rx.recv().await.unwrap();
        assert_eq!(queued.context.signature.as_deref(), Some("5sig"));
        assert_eq!(queued.context.program_id.as_deref(), Some(PROGRAM));
    }

    #[tokio::test]
    async fn test_batch_without_events_is_not_queued() {
        let (tx, mut rx) = log_batch_channel();
        let router = build_router(AppState::new(tx, EventParser::default(), None));

        let response = router
            .oneshot(post_logs(json!({ "logs": ["Program log: hello"] })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ignored");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_queue_is_unavailable() {
        let (tx, rx) = log_batch_channel();
        drop(rx);
        let router = build_router(AppState::new(tx, EventParser::default(), None));

        let response = router
            .oneshot(post_logs(json!({
                "logs": [
                    "Program log: Instruction: CreateBuyOrder",
                    format!("Program log: buyer: {BUYER}"),
                ]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health() {
        let (tx, _rx) = log_batch_channel();
        let router = build_router(AppState::new(tx, EventParser::default(), None));
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }
}
