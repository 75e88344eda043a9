//! Default message renderer for webhook targets.

use chainbell_core::notify::{Message, MessageRenderer};
use chainbell_sdk::objects::{NotificationPayload, ParsedEvent, Role};

/// Renders a [`NotificationPayload`] for every role that has a participant.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookPayloadRenderer;

impl MessageRenderer for WebhookPayloadRenderer {
    fn render(&self, event: &ParsedEvent, role: Role) -> Option<Message> {
        let address = event.participants.get(&role)?;
        let payload = NotificationPayload {
            event_type: event.event_type.clone(),
            role,
            address: address.clone(),
            signature: event.signature.clone(),
            data: event.data.clone(),
            timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
        };
        match serde_json::to_value(&payload) {
            Ok(body) => Some(Message::new(body)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize notification payload");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainbell_core::notify::render_per_role;
    use serde_json::json;

    fn event() -> ParsedEvent {
        let mut data = serde_json::Map::new();
        data.insert("amount".to_string(), json!(5));
        ParsedEvent {
            event_type: "BuyOrderReducedEvent".to_string(),
            signature: "5sig".to_string(),
            participants: [
                (Role::Buyer, "buyer-address".to_string()),
                (Role::Seller, "seller-address".to_string()),
            ]
            .into_iter()
            .collect(),
            data,
        }
    }

    #[test]
    fn test_renders_payload_for_participant_roles() {
        let messages = render_per_role(&WebhookPayloadRenderer, &event());
        assert_eq!(messages.len(), 2);

        let seller: NotificationPayload =
            serde_json::from_value(messages[&Role::Seller].body.clone()).unwrap();
        assert_eq!(seller.role, Role::Seller);
        assert_eq!(seller.address, "seller-address");
        assert_eq!(seller.event_type, "BuyOrderReducedEvent");
        assert_eq!(seller.signature, "5sig");
        assert_eq!(seller.data["amount"], json!(5));
    }

    #[test]
    fn test_no_message_for_absent_role() {
        assert!(WebhookPayloadRenderer.render(&event(), Role::Maker).is_none());
    }
}
