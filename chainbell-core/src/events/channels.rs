//! Event channel factories and handles.

use chainbell_sdk::objects::LogBatch;
use tokio::sync::mpsc;

/// Default buffer size for event channels.
///
/// Producers wait once this many batches are queued.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for LogBatch events.
pub type LogBatchSender = mpsc::Sender<LogBatch>;
/// Receiver handle for LogBatch events.
pub type LogBatchReceiver = mpsc::Receiver<LogBatch>;

/// Create a new LogBatch channel.
///
/// Multiple senders can be cloned from the returned sender. There is exactly
/// one consumer, the notification pipeline.
pub fn log_batch_channel() -> (LogBatchSender, LogBatchReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
