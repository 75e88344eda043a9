//! Event processors.
//!
//! - `NotificationPipeline`: Receives `LogBatch`, parses it into events and
//!   dispatches role-specific notifications

pub mod notification_pipeline;

pub use notification_pipeline::NotificationPipeline;
