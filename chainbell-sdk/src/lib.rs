//! Shared types for Chainbell.
//!
//! This crate holds everything that crosses a process boundary: the parsed
//! event shape handed to renderers, the log batch accepted by the ingest API,
//! the notification payload delivered to subscribers, and the HMAC signature
//! scheme that authenticates those deliveries.

pub mod objects;
pub mod signature;
