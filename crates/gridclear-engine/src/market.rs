//! A single commodity market: the authoritative owner of one round's
//! reservations, offers, and state machine.
//!
//! `Market` is purely synchronous. The registry serializes access (one
//! mutex per market), invokes participant callbacks with no market lock
//! held, and turns the values returned here into events and callback
//! fan-out.

use gridclear_curve::{Curve, compare_bounds};
use gridclear_types::{EngineConfig, GridclearError, MarketName, Result, Side};
use rust_decimal::Decimal;

use crate::events::MarketFailure;
use crate::offer_book::OfferBook;
use crate::reservations::ReservationTracker;
use crate::state::{MarketEvent, MarketState};

/// Outcome of one accepted offer.
#[derive(Debug, Clone)]
pub struct OfferReceipt {
    pub side: Side,
    /// Offers accepted on this side so far, including this one.
    pub accepted: usize,
    /// Reservations held on this side this round.
    pub expected: usize,
    /// The side's composite curve, present exactly when this offer was the
    /// side's last: computed once per side per round.
    pub aggregate: Option<Curve>,
}

impl OfferReceipt {
    /// Whether this offer completed its side.
    #[must_use]
    pub fn side_complete(&self) -> bool {
        self.aggregate.is_some()
    }
}

/// The clearing result of a successful round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketClearing {
    pub quantity: Decimal,
    pub price: Decimal,
}

/// Per-commodity round state: reservations, offer book, and the state
/// machine that orders them.
#[derive(Debug)]
pub struct Market {
    name: MarketName,
    config: EngineConfig,
    state: MarketState,
    reservations: ReservationTracker,
    offers: OfferBook,
}

impl Market {
    #[must_use]
    pub fn new(name: MarketName, config: EngineConfig) -> Self {
        Self {
            name,
            config,
            state: MarketState::AcceptReservations,
            reservations: ReservationTracker::new(),
            offers: OfferBook::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &MarketName {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> MarketState {
        self.state
    }

    /// Whether this round holds at least one buyer and one seller
    /// reservation.
    #[must_use]
    pub fn has_formed(&self) -> bool {
        self.reservations.has_formed()
    }

    /// Whether nothing has touched this market since its last reset.
    #[must_use]
    pub fn round_is_idle(&self) -> bool {
        self.state == MarketState::AcceptReservations && self.reservations.total() == 0
    }

    /// Record a reservation request for one side.
    ///
    /// Returns whether the reservation was granted. Reservations arriving
    /// outside the reservation phase self-loop the state machine but grant
    /// nothing: an offer-phase reservation could never be matched by an
    /// offer count this round.
    pub fn receive_reservation(&mut self, side: Side) -> bool {
        self.state = self.state.apply(MarketEvent::ReservationReceived);
        if !self.state.accepts_reservations() {
            tracing::debug!(market = %self.name, %side, state = %self.state,
                "reservation ignored outside reservation phase");
            return false;
        }

        self.reservations.make(side);
        if self.reservations.has_formed() {
            self.state = self.state.apply(MarketEvent::MarketFormed);
        }
        tracing::debug!(market = %self.name, %side,
            buyers = self.reservations.count(Side::Buyer),
            sellers = self.reservations.count(Side::Seller),
            formed = self.has_formed(),
            "reservation granted");
        true
    }

    /// Open offer collection for this round.
    ///
    /// Returns whether collection actually opened; a market that never
    /// formed short-circuits to `DONE` instead and can only fail its
    /// clearing.
    pub fn start_offer_round(&mut self) -> bool {
        self.state = self.state.apply(MarketEvent::OfferRoundStarted);
        let opened = self.state.accepts_offers();
        if opened {
            tracing::debug!(market = %self.name, "offer collection open");
        } else {
            tracing::debug!(market = %self.name, state = %self.state,
                "offer round started without a formed market");
        }
        opened
    }

    /// Accept one side's offer curve.
    ///
    /// Rejected unless offer collection is open, the side still has an
    /// unconsumed reservation, and the curve is non-empty. The receipt
    /// carries the side's composite curve when this offer was the last
    /// expected one.
    pub fn receive_offer(&mut self, side: Side, curve: Curve) -> Result<OfferReceipt> {
        if !self.state.accepts_offers() {
            // An early offer is a round-fatal protocol violation: the state
            // machine short-circuits to DONE and the offer is rejected.
            let state = self.state;
            self.state = self.state.apply(offer_event(side, false));
            tracing::warn!(market = %self.name, %side, state = %state,
                "offer rejected outside offer collection");
            return Err(GridclearError::WrongState {
                market: self.name.clone(),
                side,
                state: state.to_string(),
            });
        }

        let expected = self.reservations.count(side);
        if self.offers.count(side) >= expected {
            return Err(GridclearError::OfferWithoutReservation {
                market: self.name.clone(),
                side,
            });
        }

        self.offers.add(side, curve)?;
        let accepted = self.offers.count(side);
        let last = accepted == expected;
        self.state = self.state.apply(offer_event(side, last));

        let aggregate = if last {
            Some(self.offers.aggregate(side, self.config.aggregate_resolution)?)
        } else {
            None
        };

        tracing::debug!(market = %self.name, %side, accepted, expected,
            side_complete = last, state = %self.state, "offer accepted");

        Ok(OfferReceipt {
            side,
            accepted,
            expected,
            aggregate,
        })
    }

    /// Compute the round's clearing outcome and reset for the next round.
    ///
    /// Exactly one outcome — success or a typed [`MarketFailure`] — is
    /// produced per round; the market re-enters `ACCEPT_RESERVATIONS`
    /// afterward in every case.
    pub fn clear(&mut self) -> std::result::Result<MarketClearing, MarketFailure> {
        let outcome = self.clearing_outcome();
        match &outcome {
            Ok(clearing) => {
                tracing::info!(market = %self.name,
                    quantity = %clearing.quantity, price = %clearing.price,
                    "market cleared");
            }
            Err(failure) => match failure.code {
                gridclear_types::FailureCode::BadState => {
                    tracing::error!(market = %self.name, %failure,
                        "clearing invariant violation");
                }
                _ => {
                    tracing::warn!(market = %self.name, %failure, "round failed");
                }
            },
        }
        self.reset_round();
        outcome
    }

    fn clearing_outcome(&self) -> std::result::Result<MarketClearing, MarketFailure> {
        if self.state.accepts_offers() {
            return Err(MarketFailure::short_offers(&self.name));
        }
        if !self.state.is_done() {
            return Err(MarketFailure::bad_state(&self.name, self.state));
        }
        if !self.reservations.has_formed() {
            return Err(MarketFailure::not_formed(&self.name));
        }
        // DONE with a formed market but a short book: the round was aborted
        // by an early offer after formation.
        if self.offers.count(Side::Buyer) < self.reservations.count(Side::Buyer)
            || self.offers.count(Side::Seller) < self.reservations.count(Side::Seller)
        {
            return Err(MarketFailure::short_offers(&self.name));
        }

        let demand = self
            .offers
            .aggregate_exact(Side::Buyer)
            .map_err(|err| MarketFailure::bad_state(&self.name, err))?;
        let supply = self
            .offers
            .aggregate_exact(Side::Seller)
            .map_err(|err| MarketFailure::bad_state(&self.name, err))?;

        match demand.intersect(&supply) {
            Some(point) => Ok(MarketClearing {
                quantity: point.quantity,
                price: point.price,
            }),
            None => Err(MarketFailure::no_intersect(
                &self.name,
                compare_bounds(&demand, &supply),
            )),
        }
    }

    fn reset_round(&mut self) {
        self.reservations.reset();
        self.offers.reset();
        self.state = MarketState::AcceptReservations;
        tracing::debug!(market = %self.name, "round reset");
    }
}

fn offer_event(side: Side, last: bool) -> MarketEvent {
    match (side, last) {
        (Side::Buyer, false) => MarketEvent::BuyOfferReceived,
        (Side::Buyer, true) => MarketEvent::LastBuyOfferReceived,
        (Side::Seller, false) => MarketEvent::SellOfferReceived,
        (Side::Seller, true) => MarketEvent::LastSellOfferReceived,
    }
}
