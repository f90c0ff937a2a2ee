//! The per-market round state machine.
//!
//! Each market advances through a reservation phase, an offer-collection
//! phase, and a terminal `DONE` state, once per round:
//!
//! ```text
//! ACCEPT_RESERVATIONS ──(formed)──▶ ACCEPT_RESERVATIONS_FORMED
//!         │                                  │ (offer round starts)
//!         │ (offer round starts /            ▼
//!         │  early offer: failure)   ACCEPT_ALL_OFFERS
//!         ▼                          ╱               ╲
//!       DONE ◀── ACCEPT_BUY_OFFERS ◀╱                 ╲▶ ACCEPT_SELL_OFFERS ──▶ DONE
//! ```
//!
//! The transition function is a single explicit `match` — the table below is
//! the whole behavior, with no reflection and no transition library. `DONE`
//! is a sink; the market leaves it only through the post-clearing reset.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The six states a market passes through in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketState {
    /// Initial state, re-entered at the start of every round.
    AcceptReservations,
    /// At least one buyer and one seller hold reservations.
    AcceptReservationsFormed,
    /// Offer collection open on both sides.
    AcceptAllOffers,
    /// All seller offers received; waiting on buyers.
    AcceptBuyOffers,
    /// All buyer offers received; waiting on sellers.
    AcceptSellOffers,
    /// Terminal for the round, reached on completion or short-circuit failure.
    Done,
}

/// Everything that can happen to a market within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketEvent {
    ReservationReceived,
    /// The first buyer+seller reservation pairing arrived.
    MarketFormed,
    OfferRoundStarted,
    BuyOfferReceived,
    /// A buy offer arrived and buyer offers now equal buyer reservations.
    LastBuyOfferReceived,
    SellOfferReceived,
    /// A sell offer arrived and seller offers now equal seller reservations.
    LastSellOfferReceived,
}

impl MarketState {
    /// Apply one event, yielding the next state.
    #[must_use]
    pub fn apply(self, event: MarketEvent) -> Self {
        use MarketEvent as E;
        use MarketState as S;

        match (self, event) {
            // Reservation phase. Any offer activity before the market forms
            // short-circuits the round: the market can never clear.
            (S::AcceptReservations, E::ReservationReceived) => S::AcceptReservations,
            (S::AcceptReservations, E::MarketFormed) => S::AcceptReservationsFormed,
            (
                S::AcceptReservations,
                E::OfferRoundStarted
                | E::BuyOfferReceived
                | E::LastBuyOfferReceived
                | E::SellOfferReceived
                | E::LastSellOfferReceived,
            ) => S::Done,

            (S::AcceptReservationsFormed, E::ReservationReceived | E::MarketFormed) => {
                S::AcceptReservationsFormed
            }
            (S::AcceptReservationsFormed, E::OfferRoundStarted) => S::AcceptAllOffers,
            (
                S::AcceptReservationsFormed,
                E::BuyOfferReceived
                | E::LastBuyOfferReceived
                | E::SellOfferReceived
                | E::LastSellOfferReceived,
            ) => S::Done,

            // Offer collection. A side finishing narrows collection to the
            // other side; the second side finishing ends the round.
            (S::AcceptAllOffers, E::LastSellOfferReceived) => S::AcceptBuyOffers,
            (S::AcceptAllOffers, E::LastBuyOfferReceived) => S::AcceptSellOffers,
            (S::AcceptAllOffers, _) => S::AcceptAllOffers,

            (S::AcceptBuyOffers, E::LastBuyOfferReceived) => S::Done,
            (S::AcceptBuyOffers, _) => S::AcceptBuyOffers,

            (S::AcceptSellOffers, E::LastSellOfferReceived) => S::Done,
            (S::AcceptSellOffers, _) => S::AcceptSellOffers,

            // Terminal sink.
            (S::Done, _) => S::Done,
        }
    }

    /// Whether reservations are being collected.
    #[must_use]
    pub fn accepts_reservations(self) -> bool {
        matches!(self, Self::AcceptReservations | Self::AcceptReservationsFormed)
    }

    /// Whether offers of any kind are being collected.
    #[must_use]
    pub fn accepts_offers(self) -> bool {
        matches!(
            self,
            Self::AcceptAllOffers | Self::AcceptBuyOffers | Self::AcceptSellOffers
        )
    }

    #[must_use]
    pub fn is_done(self) -> bool {
        self == Self::Done
    }
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptReservations => write!(f, "ACCEPT_RESERVATIONS"),
            Self::AcceptReservationsFormed => write!(f, "ACCEPT_RESERVATIONS_FORMED"),
            Self::AcceptAllOffers => write!(f, "ACCEPT_ALL_OFFERS"),
            Self::AcceptBuyOffers => write!(f, "ACCEPT_BUY_OFFERS"),
            Self::AcceptSellOffers => write!(f, "ACCEPT_SELL_OFFERS"),
            Self::Done => write!(f, "DONE"),
        }
    }
}
