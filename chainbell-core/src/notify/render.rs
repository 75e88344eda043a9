use chainbell_sdk::objects::{ParsedEvent, Role};
use std::collections::BTreeMap;

/// A rendered notification, ready for a delivery channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub body: serde_json::Value,
}

impl Message {
    pub fn new(body: serde_json::Value) -> Self {
        Self { body }
    }
}

/// Turns an event into the message a participant in `role` should receive.
///
/// Returning `None` means the role has nothing to be told about this event.
pub trait MessageRenderer: Send + Sync {
    fn render(&self, event: &ParsedEvent, role: Role) -> Option<Message>;
}

/// Render one message for every participant role of `event`.
pub fn render_per_role<R: MessageRenderer + ?Sized>(
    renderer: &R,
    event: &ParsedEvent,
) -> BTreeMap<Role, Message> {
    event
        .participants
        .keys()
        .filter_map(|&role| renderer.render(event, role).map(|message| (role, message)))
        .collect()
}
