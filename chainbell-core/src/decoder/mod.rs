//! Binary event decoder.
//!
//! Program events are emitted as `discriminator || fields`, with fields laid
//! out in a fixed declared order:
//!
//! - addresses: 32 raw bytes
//! - amounts: `u64` little-endian, integer base units
//! - timestamps: `i64` little-endian
//! - flags: one byte, `0` or `1`
//! - strings: `u32` little-endian length prefix followed by UTF-8 bytes
//! - optional strings: presence byte (`0`/`1`) then a string when present
//!
//! [`decode`] never fails loudly: a short buffer, an unknown discriminator or a
//! malformed field all produce `None` so the caller can fall back to the log
//! heuristics.

pub mod discriminator;
mod reader;

pub use discriminator::{DISCRIMINATOR_LEN, EventKind, RawDiscriminator};

use crate::address::Address;
use chainbell_sdk::objects::Role;
use reader::{ByteReader, ByteWriter};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Decimal places of token amounts when the caller does not know the mint.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 9;

/// Decimal places of fiat amounts and prices (minor units).
pub const FIAT_DECIMALS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceUpdated {
    pub vault: Address,
    pub authority: Address,
    pub currency: String,
    pub price: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuyOrderCreated {
    pub vault: Address,
    pub buyer: Address,
    pub amount: u64,
    pub price: u64,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuyOrderReduced {
    pub vault: Address,
    pub buyer: Address,
    pub seller: Address,
    pub amount: u64,
    pub remaining: u64,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuyOrderCancelled {
    pub vault: Address,
    pub buyer: Address,
    pub refunded: u64,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstantPaymentReserved {
    pub vault: Address,
    pub maker: Address,
    pub taker: Address,
    pub amount: u64,
    pub fiat_amount: u64,
    pub currency: String,
    pub payout_reference: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstantPaymentPayoutResult {
    pub vault: Address,
    pub maker: Address,
    pub taker: Address,
    pub amount: u64,
    pub fiat_amount: u64,
    pub currency: String,
    pub success: bool,
    pub payout_details: Option<String>,
    pub message: Option<String>,
    pub timestamp: i64,
}

/// A decoded program event, one case per [`EventKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    PriceUpdated(PriceUpdated),
    BuyOrderCreated(BuyOrderCreated),
    BuyOrderReduced(BuyOrderReduced),
    BuyOrderCancelled(BuyOrderCancelled),
    InstantPaymentReserved(InstantPaymentReserved),
    InstantPaymentPayoutResult(InstantPaymentPayoutResult),
}

/// Decode a raw event payload.
pub fn decode(buffer: &[u8]) -> Option<DecodedEvent> {
    let kind = EventKind::from_discriminator(buffer.get(..DISCRIMINATOR_LEN)?)?;
    let mut r = ByteReader::new(buffer, DISCRIMINATOR_LEN);
    let event = match kind {
        EventKind::PriceUpdated => DecodedEvent::PriceUpdated(PriceUpdated {
            vault: r.read_address()?,
            authority: r.read_address()?,
            currency: r.read_string()?,
            price: r.read_u64()?,
            timestamp: r.read_i64()?,
        }),
        EventKind::BuyOrderCreated => DecodedEvent::BuyOrderCreated(BuyOrderCreated {
            vault: r.read_address()?,
            buyer: r.read_address()?,
            amount: r.read_u64()?,
            price: r.read_u64()?,
            currency: r.read_string()?,
            timestamp: r.read_i64()?,
        }),
        EventKind::BuyOrderReduced => DecodedEvent::BuyOrderReduced(BuyOrderReduced {
            vault: r.read_address()?,
            buyer: r.read_address()?,
            seller: r.read_address()?,
            amount: r.read_u64()?,
            remaining: r.read_u64()?,
            currency: r.read_string()?,
            timestamp: r.read_i64()?,
        }),
        EventKind::BuyOrderCancelled => DecodedEvent::BuyOrderCancelled(BuyOrderCancelled {
            vault: r.read_address()?,
            buyer: r.read_address()?,
            refunded: r.read_u64()?,
            currency: r.read_string()?,
            timestamp: r.read_i64()?,
        }),
        EventKind::InstantPaymentReserved => {
            DecodedEvent::InstantPaymentReserved(InstantPaymentReserved {
                vault: r.read_address()?,
                maker: r.read_address()?,
                taker: r.read_address()?,
                amount: r.read_u64()?,
                fiat_amount: r.read_u64()?,
                currency: r.read_string()?,
                payout_reference: r.read_optional_string()?,
                timestamp: r.read_i64()?,
            })
        }
        EventKind::InstantPaymentPayoutResult => {
            DecodedEvent::InstantPaymentPayoutResult(InstantPaymentPayoutResult {
                vault: r.read_address()?,
                maker: r.read_address()?,
                taker: r.read_address()?,
                amount: r.read_u64()?,
                fiat_amount: r.read_u64()?,
                currency: r.read_string()?,
                success: r.read_bool()?,
                payout_details: r.read_optional_string()?,
                message: r.read_optional_string()?,
                timestamp: r.read_i64()?,
            })
        }
    };
    Some(event)
}

impl DecodedEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DecodedEvent::PriceUpdated(_) => EventKind::PriceUpdated,
            DecodedEvent::BuyOrderCreated(_) => EventKind::BuyOrderCreated,
            DecodedEvent::BuyOrderReduced(_) => EventKind::BuyOrderReduced,
            DecodedEvent::BuyOrderCancelled(_) => EventKind::BuyOrderCancelled,
            DecodedEvent::InstantPaymentReserved(_) => EventKind::InstantPaymentReserved,
            DecodedEvent::InstantPaymentPayoutResult(_) => EventKind::InstantPaymentPayoutResult,
        }
    }

    /// Encode the event with its declared layout, discriminator first.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_discriminator(self.kind().discriminator());
        match self {
            DecodedEvent::PriceUpdated(e) => {
                w.put_address(&e.vault)
                    .put_address(&e.authority)
                    .put_string(&e.currency)
                    .put_u64(e.price)
                    .put_i64(e.timestamp);
            }
            DecodedEvent::BuyOrderCreated(e) => {
                w.put_address(&e.vault)
                    .put_address(&e.buyer)
                    .put_u64(e.amount)
                    .put_u64(e.price)
                    .put_string(&e.currency)
                    .put_i64(e.timestamp);
            }
            DecodedEvent::BuyOrderReduced(e) => {
                w.put_address(&e.vault)
                    .put_address(&e.buyer)
                    .put_address(&e.seller)
                    .put_u64(e.amount)
                    .put_u64(e.remaining)
                    .put_string(&e.currency)
                    .put_i64(e.timestamp);
            }
            DecodedEvent::BuyOrderCancelled(e) => {
                w.put_address(&e.vault)
                    .put_address(&e.buyer)
                    .put_u64(e.refunded)
                    .put_string(&e.currency)
                    .put_i64(e.timestamp);
            }
            DecodedEvent::InstantPaymentReserved(e) => {
                w.put_address(&e.vault)
                    .put_address(&e.maker)
                    .put_address(&e.taker)
                    .put_u64(e.amount)
                    .put_u64(e.fiat_amount)
                    .put_string(&e.currency)
                    .put_optional_string(e.payout_reference.as_deref())
                    .put_i64(e.timestamp);
            }
            DecodedEvent::InstantPaymentPayoutResult(e) => {
                w.put_address(&e.vault)
                    .put_address(&e.maker)
                    .put_address(&e.taker)
                    .put_u64(e.amount)
                    .put_u64(e.fiat_amount)
                    .put_string(&e.currency)
                    .put_bool(e.success)
                    .put_optional_string(e.payout_details.as_deref())
                    .put_optional_string(e.message.as_deref())
                    .put_i64(e.timestamp);
            }
        }
        w.finish()
    }

    /// Addresses this event concerns, keyed by role.
    pub fn participants(&self) -> BTreeMap<Role, String> {
        let pairs: Vec<(Role, &Address)> = match self {
            DecodedEvent::PriceUpdated(e) => vec![(Role::User, &e.authority)],
            DecodedEvent::BuyOrderCreated(e) => vec![(Role::Buyer, &e.buyer)],
            DecodedEvent::BuyOrderReduced(e) => {
                vec![(Role::Buyer, &e.buyer), (Role::Seller, &e.seller)]
            }
            DecodedEvent::BuyOrderCancelled(e) => vec![(Role::Buyer, &e.buyer)],
            DecodedEvent::InstantPaymentReserved(e) => {
                vec![(Role::Maker, &e.maker), (Role::Taker, &e.taker)]
            }
            DecodedEvent::InstantPaymentPayoutResult(e) => {
                vec![(Role::Maker, &e.maker), (Role::Taker, &e.taker)]
            }
        };
        pairs
            .into_iter()
            .map(|(role, address)| (role, address.to_base58()))
            .collect()
    }

    /// Field payload plus derived display fields.
    ///
    /// Display fields divide the raw integers by `10^token_decimals` (token
    /// amounts) or `10^2` (fiat). They are for rendering only.
    pub fn to_data(&self, token_decimals: u32) -> Map<String, Value> {
        let mut data = match self.fields_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let token = |raw: u64| scaled_display(raw, token_decimals);
        let fiat = |raw: u64| scaled_display(raw, FIAT_DECIMALS);
        let display: Vec<(&str, Option<String>)> = match self {
            DecodedEvent::PriceUpdated(e) => vec![("price_display", fiat(e.price))],
            DecodedEvent::BuyOrderCreated(e) => vec![
                ("amount_display", token(e.amount)),
                ("price_display", fiat(e.price)),
            ],
            DecodedEvent::BuyOrderReduced(e) => vec![
                ("amount_display", token(e.amount)),
                ("remaining_display", token(e.remaining)),
            ],
            DecodedEvent::BuyOrderCancelled(e) => {
                vec![("refunded_display", token(e.refunded))]
            }
            DecodedEvent::InstantPaymentReserved(e) => vec![
                ("amount_display", token(e.amount)),
                ("fiat_amount_display", fiat(e.fiat_amount)),
            ],
            DecodedEvent::InstantPaymentPayoutResult(e) => vec![
                ("amount_display", token(e.amount)),
                ("fiat_amount_display", fiat(e.fiat_amount)),
            ],
        };
        for (key, value) in display {
            if let Some(value) = value {
                data.insert(key.to_string(), Value::String(value));
            }
        }
        data
    }

    fn fields_value(&self) -> Value {
        let value = match self {
            DecodedEvent::PriceUpdated(e) => serde_json::to_value(e),
            DecodedEvent::BuyOrderCreated(e) => serde_json::to_value(e),
            DecodedEvent::BuyOrderReduced(e) => serde_json::to_value(e),
            DecodedEvent::BuyOrderCancelled(e) => serde_json::to_value(e),
            DecodedEvent::InstantPaymentReserved(e) => serde_json::to_value(e),
            DecodedEvent::InstantPaymentPayoutResult(e) => serde_json::to_value(e),
        };
        value.unwrap_or(Value::Null)
    }
}

/// Format `raw / 10^decimals` without trailing zeros.
///
/// Returns `None` when `decimals` exceeds what `Decimal` can represent.
pub fn scaled_display(raw: u64, decimals: u32) -> Option<String> {
    Decimal::try_from_i128_with_scale(i128::from(raw), decimals)
        .ok()
        .map(|d| d.normalize().to_string())
}
