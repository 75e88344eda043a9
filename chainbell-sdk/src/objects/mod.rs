pub mod events;
pub mod notification;

pub use events::{LogBatch, ParsedEvent, Role, TransactionContext, UnknownRole};
pub use notification::NotificationPayload;
