//! Heuristic participant extraction from program log text.
//!
//! This is the fallback path for batches that carry no decodable binary
//! payload (legacy program versions, truncated logs). It only ever runs after
//! the binary decoder has missed, and the event parser logs every fallback so
//! decoder regressions stay visible.
//!
//! For each role an instruction expects, strategies are tried in order:
//!
//! 1. an explicit `role: <address>` pattern
//! 2. a `signer:`/`authority:` pattern, for the instruction's signer role only
//! 3. the first acceptable address anywhere in the log lines
//! 4. the first acceptable account from the transaction context
//!
//! Strategies 3 and 4 never fill nullable roles. An acceptable address is
//! structurally well formed and not an infrastructure account.

pub mod patterns;

use crate::address;
use crate::decoder::EventKind;
use chainbell_sdk::objects::{Role, TransactionContext};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Role -> address. `None` means "no participant in this role".
pub type RoleMap = BTreeMap<Role, Option<String>>;

/// A role an instruction expects to find in its logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSlot {
    pub role: Role,
    /// Unresolved nullable roles map to `None` instead of a placeholder.
    pub nullable: bool,
}

const fn required(role: Role) -> RoleSlot {
    RoleSlot {
        role,
        nullable: false,
    }
}

const fn nullable(role: Role) -> RoleSlot {
    RoleSlot {
        role,
        nullable: true,
    }
}

/// Routing entry for one program instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionSpec {
    pub name: &'static str,
    pub kind: EventKind,
    pub roles: &'static [RoleSlot],
    /// Role played by the transaction signer, if it is a participant.
    pub signer: Option<Role>,
}

pub const INSTRUCTIONS: &[InstructionSpec] = &[
    InstructionSpec {
        name: "UpdatePrice",
        kind: EventKind::PriceUpdated,
        roles: &[required(Role::User)],
        signer: Some(Role::User),
    },
    InstructionSpec {
        name: "CreateBuyOrder",
        kind: EventKind::BuyOrderCreated,
        roles: &[required(Role::Buyer)],
        signer: Some(Role::Buyer),
    },
    InstructionSpec {
        name: "ReduceBuyOrder",
        kind: EventKind::BuyOrderReduced,
        roles: &[required(Role::Buyer), required(Role::Seller)],
        signer: Some(Role::Seller),
    },
    InstructionSpec {
        name: "CancelBuyOrder",
        kind: EventKind::BuyOrderCancelled,
        roles: &[required(Role::Buyer), nullable(Role::Seller)],
        signer: Some(Role::Buyer),
    },
    InstructionSpec {
        name: "ReserveInstantPayment",
        kind: EventKind::InstantPaymentReserved,
        roles: &[required(Role::Maker), required(Role::Taker)],
        signer: Some(Role::Taker),
    },
    InstructionSpec {
        name: "SetInstantPaymentPayoutResult",
        kind: EventKind::InstantPaymentPayoutResult,
        roles: &[required(Role::Maker), required(Role::Taker)],
        signer: None,
    },
];

pub fn instruction_spec(name: &str) -> Option<&'static InstructionSpec> {
    INSTRUCTIONS.iter().find(|spec| spec.name == name)
}

/// Placeholder used for a required role no strategy could resolve.
pub fn placeholder(role: Role) -> String {
    format!("unknown_{role}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    ExplicitRole,
    Signer,
    LogScan,
    Context,
}

/// Resolve the participants of `instruction_name` from its log lines.
///
/// Returns `None` for instructions that are not in [`INSTRUCTIONS`].
pub fn extract_participants<S: AsRef<str>>(
    log_lines: &[S],
    instruction_name: &str,
    context: &TransactionContext,
) -> Option<RoleMap> {
    let spec = instruction_spec(instruction_name)?;
    let lines: Vec<&str> = log_lines
        .iter()
        .map(AsRef::as_ref)
        .filter(|line| !line.starts_with(patterns::PAYLOAD_MARKER))
        .collect();

    let mut excluded: HashSet<&str> = lines
        .iter()
        .copied()
        .filter_map(patterns::program_frame)
        .collect();
    if let Some(program_id) = context.program_id.as_deref() {
        excluded.insert(program_id);
    }
    let acceptable = |candidate: &str| -> bool {
        address::is_well_formed(candidate)
            && !address::is_denylisted(candidate)
            && !excluded.contains(candidate)
    };

    let mut resolved: BTreeMap<Role, String> = BTreeMap::new();

    // 1. explicit `role: <address>`
    for slot in spec.roles {
        let found = lines.iter().copied().find_map(|line| {
            patterns::role_addresses(line)
                .find(|&(role, candidate)| role == slot.role && acceptable(candidate))
                .map(|(_, candidate)| candidate)
        });
        if let Some(found) = found {
            assign(&mut resolved, instruction_name, slot.role, found, Strategy::ExplicitRole);
        }
    }

    // 2. signer / authority
    if let Some(role) = spec.signer.filter(|role| !resolved.contains_key(role)) {
        let found = lines
            .iter()
            .copied()
            .filter_map(patterns::signer_address)
            .find(|&candidate| acceptable(candidate));
        if let Some(found) = found {
            assign(&mut resolved, instruction_name, role, found, Strategy::Signer);
        }
    }

    // 3. any address in the logs, 4. transaction context accounts
    let in_logs: Vec<&str> = lines.iter().copied().flat_map(patterns::addresses).collect();
    let in_context: Vec<&str> = context.accounts.iter().map(String::as_str).collect();
    for (candidates, strategy) in [(in_logs, Strategy::LogScan), (in_context, Strategy::Context)] {
        for slot in spec.roles.iter().filter(|slot| !slot.nullable) {
            if resolved.contains_key(&slot.role) {
                continue;
            }
            let found = candidates.iter().copied().find(|&candidate| {
                acceptable(candidate) && !resolved.values().any(|taken| taken.as_str() == candidate)
            });
            if let Some(found) = found {
                assign(&mut resolved, instruction_name, slot.role, found, strategy);
            }
        }
    }

    let roles = spec
        .roles
        .iter()
        .map(|slot| {
            let value = match resolved.remove(&slot.role) {
                Some(found) => Some(found),
                None if slot.nullable => None,
                None => Some(placeholder(slot.role)),
            };
            (slot.role, value)
        })
        .collect();
    Some(roles)
}

fn assign(
    resolved: &mut BTreeMap<Role, String>,
    instruction: &str,
    role: Role,
    found: &str,
    strategy: Strategy,
) {
    debug!(instruction, %role, address = found, ?strategy, "Resolved participant");
    resolved.insert(role, found.to_string());
}
