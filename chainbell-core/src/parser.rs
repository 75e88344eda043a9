//! Event parser: turns one transaction's log lines into [`ParsedEvent`]s.
//!
//! The binary payload is authoritative. When any `Program data:` line decodes,
//! exactly one event is produced from it and the heuristic path is skipped for
//! the whole batch. Otherwise every recognised `Instruction:` marker yields at
//! most one event, in log order.

use crate::decoder::{self, DEFAULT_TOKEN_DECIMALS, DecodedEvent};
use crate::heuristic::{self, patterns};
use chainbell_sdk::objects::{ParsedEvent, TransactionContext};
use serde_json::Value;
use tracing::debug;

/// Stateless log parser. Holds only presentation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventParser {
    /// Decimal places used for token display fields.
    pub token_decimals: u32,
}

impl Default for EventParser {
    fn default() -> Self {
        Self {
            token_decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

impl EventParser {
    pub fn new(token_decimals: u32) -> Self {
        Self { token_decimals }
    }

    /// Parse a batch of log lines into events.
    ///
    /// Never fails: undecodable payloads fall back to the heuristics and
    /// unrecognised instructions produce nothing.
    pub fn parse_logs_for_events<S: AsRef<str>>(
        &self,
        log_lines: &[S],
        context: &TransactionContext,
    ) -> Vec<ParsedEvent> {
        let signature = context
            .signature
            .clone()
            .unwrap_or_else(|| format!("unknown_{}", uuid::Uuid::new_v4().simple()));

        if let Some(event) = self.decode_payloads(log_lines, &signature) {
            return vec![event];
        }

        debug!(
            signature = %signature,
            lines = log_lines.len(),
            "No decodable event payload, falling back to log heuristics"
        );
        self.parse_instructions(log_lines, context, &signature)
    }

    fn decode_payloads<S: AsRef<str>>(&self, log_lines: &[S], signature: &str) -> Option<ParsedEvent> {
        let decoded = log_lines
            .iter()
            .filter_map(|line| payload(line.as_ref()))
            .find_map(|encoded| match fast32::base64::RFC4648.decode_str(encoded) {
                Ok(bytes) => decoder::decode(&bytes),
                Err(e) => {
                    debug!(signature, error = ?e, "Skipping payload with invalid base64");
                    None
                }
            })?;
        debug!(signature, kind = %decoded.kind(), "Decoded binary event");
        Some(self.from_decoded(&decoded, signature))
    }

    fn from_decoded(&self, decoded: &DecodedEvent, signature: &str) -> ParsedEvent {
        let mut data = decoded.to_data(self.token_decimals);
        data.insert("source".to_string(), Value::from("binary"));
        ParsedEvent {
            event_type: decoded.kind().key().to_string(),
            signature: signature.to_string(),
            participants: decoded.participants(),
            data,
        }
    }

    fn parse_instructions<S: AsRef<str>>(
        &self,
        log_lines: &[S],
        context: &TransactionContext,
        signature: &str,
    ) -> Vec<ParsedEvent> {
        let lines: Vec<&str> = log_lines.iter().map(AsRef::as_ref).collect();
        let markers: Vec<(usize, &str)> = lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| patterns::instruction_name(line).map(|name| (i, name)))
            .collect();

        let mut events = Vec::new();
        for (n, &(start, name)) in markers.iter().enumerate() {
            let end = markers.get(n + 1).map_or(lines.len(), |&(next, _)| next);
            let segment = &lines[start..end];

            let Some(spec) = heuristic::instruction_spec(name) else {
                debug!(signature, instruction = name, "Ignoring unrecognised instruction");
                continue;
            };
            let Some(roles) = heuristic::extract_participants(segment, name, context) else {
                continue;
            };
            let participants: std::collections::BTreeMap<_, _> = roles
                .into_iter()
                .filter_map(|(role, address)| address.map(|a| (role, a)))
                .collect();
            if participants.is_empty() {
                continue;
            }

            let mut data = patterns::extract_fields(segment);
            data.insert("instruction".to_string(), Value::from(name));
            data.insert("source".to_string(), Value::from("logs"));
            events.push(ParsedEvent {
                event_type: spec.kind.key().to_string(),
                signature: signature.to_string(),
                participants,
                data,
            });
        }
        events
    }
}

fn payload(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix(patterns::PAYLOAD_MARKER)
        .map(str::trim)
}

/// Parse with default settings, see [`EventParser::parse_logs_for_events`].
pub fn parse_logs_for_events<S: AsRef<str>>(
    log_lines: &[S],
    context: &TransactionContext,
) -> Vec<ParsedEvent> {
    EventParser::default().parse_logs_for_events(log_lines, context)
}
