//! HTTP API.
//!
//! # Endpoints
//!
//! - `POST /logs` – ingest one transaction's program logs

mod logs;

use crate::state::AppState;
use axum::Router;
use axum::routing::post;

pub fn router() -> Router<AppState> {
    Router::new().route("/logs", post(logs::ingest_logs))
}
