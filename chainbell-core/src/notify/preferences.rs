//! Preference keys: which subscriber toggle governs an (event kind, role) pair.

use crate::decoder::EventKind;
use chainbell_sdk::objects::Role;

const TABLE: &[(EventKind, Role, &str)] = &[
    (EventKind::PriceUpdated, Role::User, "price_updated"),
    (EventKind::BuyOrderCreated, Role::Buyer, "buy_order_created"),
    (EventKind::BuyOrderReduced, Role::Buyer, "buy_order_reduced"),
    (EventKind::BuyOrderReduced, Role::Seller, "buy_order_sold"),
    (EventKind::BuyOrderCancelled, Role::Buyer, "buy_order_cancelled"),
    (EventKind::BuyOrderCancelled, Role::Seller, "buy_order_cancelled"),
    (EventKind::InstantPaymentReserved, Role::Maker, "instant_payment_requested"),
    (EventKind::InstantPaymentReserved, Role::Taker, "instant_payment_reserved"),
    (EventKind::InstantPaymentPayoutResult, Role::Maker, "instant_payment_settled"),
    (EventKind::InstantPaymentPayoutResult, Role::Taker, "instant_payment_payout"),
];

/// Resolve the preference key for an event-type key and role.
///
/// Pairs missing from the table fall back to the snake-cased event name, with
/// the `Event` suffix removed.
pub fn preference_key(event_type: &str, role: Role) -> String {
    EventKind::from_key(event_type)
        .and_then(|kind| {
            TABLE
                .iter()
                .find(|(k, r, _)| *k == kind && *r == role)
                .map(|(_, _, key)| key.to_string())
        })
        .unwrap_or_else(|| snake_case(event_type.strip_suffix("Event").unwrap_or(event_type)))
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
