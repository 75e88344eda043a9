//! Discriminator table.
//!
//! A discriminator is the first 8 bytes of `sha256("event:<EventName>")`.

/// Exact 8-byte event tag.
pub type RawDiscriminator = [u8; 8];

/// Length of the discriminator prefix of every event payload.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Closed set of program events this service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    PriceUpdated,
    BuyOrderCreated,
    BuyOrderReduced,
    BuyOrderCancelled,
    InstantPaymentReserved,
    InstantPaymentPayoutResult,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::PriceUpdated,
        EventKind::BuyOrderCreated,
        EventKind::BuyOrderReduced,
        EventKind::BuyOrderCancelled,
        EventKind::InstantPaymentReserved,
        EventKind::InstantPaymentPayoutResult,
    ];

    pub const fn discriminator(&self) -> RawDiscriminator {
        match self {
            EventKind::PriceUpdated => [154, 72, 87, 150, 246, 230, 23, 217],
            EventKind::BuyOrderCreated => [110, 19, 133, 233, 185, 79, 4, 170],
            EventKind::BuyOrderReduced => [84, 232, 166, 143, 37, 150, 86, 233],
            EventKind::BuyOrderCancelled => [13, 53, 61, 178, 44, 55, 234, 215],
            EventKind::InstantPaymentReserved => [177, 64, 247, 100, 60, 131, 3, 36],
            EventKind::InstantPaymentPayoutResult => [60, 197, 84, 107, 162, 182, 26, 84],
        }
    }

    /// Event-type key used by subscriptions and the delivery log.
    pub const fn key(&self) -> &'static str {
        match self {
            EventKind::PriceUpdated => "PriceUpdatedEvent",
            EventKind::BuyOrderCreated => "BuyOrderCreatedEvent",
            EventKind::BuyOrderReduced => "BuyOrderReducedEvent",
            EventKind::BuyOrderCancelled => "BuyOrderCancelledEvent",
            EventKind::InstantPaymentReserved => "InstantPaymentReservedEvent",
            EventKind::InstantPaymentPayoutResult => "InstantPaymentPayoutResultEvent",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Look up the event kind for the leading bytes of a payload.
    pub fn from_discriminator(bytes: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.discriminator().as_slice() == bytes)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
