//! Event system for the ingestion pipeline.
//!
//! # Event Flow
//!
//! 1. The HTTP ingress (or any other producer) sends a [`LogBatch`] per
//!    transaction into the log batch channel.
//! 2. `NotificationPipeline` parses each batch into events, renders one
//!    message per role and hands them to the `NotificationManager`.
//!
//! Batches are self-contained: a batch carries every log line of one
//! transaction and nothing is carried over between batches.

pub mod channels;

pub use channels::{DEFAULT_CHANNEL_BUFFER, LogBatchReceiver, LogBatchSender, log_batch_channel};

pub use chainbell_sdk::objects::LogBatch;
