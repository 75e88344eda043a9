//! Application state shared across all request handlers.

use chainbell_core::events::LogBatchSender;
use chainbell_core::parser::EventParser;

/// Application state that is shared across all request handlers.
///
/// Cheap to clone: the batch sender is a channel handle.
#[derive(Clone)]
pub struct AppState {
    /// Queue feeding the notification pipeline.
    pub batches: LogBatchSender,
    /// Parser used to preview the events of an ingested batch.
    pub parser: EventParser,
    /// Program id assumed for batches that do not name one.
    pub program_id: Option<String>,
}

impl AppState {
    pub fn new(batches: LogBatchSender, parser: EventParser, program_id: Option<String>) -> Self {
        Self {
            batches,
            parser,
            program_id,
        }
    }
}
