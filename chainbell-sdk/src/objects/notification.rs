//! Notification payload delivered to subscriber webhooks.

use serde::{Deserialize, Serialize};

use super::Role;
use crate::signature::Signature;

/// Body of a notification delivered to one subscriber target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Event-type key, e.g. `BuyOrderReducedEvent`.
    pub event_type: String,
    /// The role the receiving subscriber plays in the event.
    pub role: Role,
    /// The subscribed address that matched the role.
    pub address: String,
    /// Transaction signature the event came from.
    pub signature: String,
    pub data: serde_json::Map<String, serde_json::Value>,
    pub timestamp: i64,
}

impl Signature for NotificationPayload {}
