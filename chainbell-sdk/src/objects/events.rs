//! Parsed event and log batch types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named position an address occupies within one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
    Maker,
    Taker,
    User,
}

impl Role {
    /// Every known role, in display order.
    pub const ALL: [Role; 5] = [Role::Buyer, Role::Seller, Role::Maker, Role::Taker, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
            Role::Maker => "maker",
            Role::Taker => "taker",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown participant role: {0}")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Transaction-level context accompanying a batch of program logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionContext {
    /// Transaction signature, if the source knows it.
    #[serde(default)]
    pub signature: Option<String>,
    /// Account keys involved in the transaction, fee payer first.
    #[serde(default)]
    pub accounts: Vec<String>,
    /// The program that emitted the logs.
    #[serde(default)]
    pub program_id: Option<String>,
}

/// One transaction's worth of program log lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogBatch {
    pub logs: Vec<String>,
    #[serde(default)]
    pub context: TransactionContext,
}

/// Normalized event produced from a log batch.
///
/// `participants` may be empty when no address could be recovered. Consumers
/// must treat that as "nothing to notify".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedEvent {
    /// Event-type key, e.g. `InstantPaymentReservedEvent`.
    pub event_type: String,
    /// Transaction signature or a generated `unknown_*` placeholder.
    pub signature: String,
    pub participants: BTreeMap<Role, String>,
    pub data: serde_json::Map<String, serde_json::Value>,
}
