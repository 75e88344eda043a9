#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod address;
pub mod decoder;
pub mod entities;
pub mod events;
pub mod framework;
pub mod heuristic;
pub mod notify;
pub mod parser;
pub mod processors;
