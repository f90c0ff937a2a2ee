//! One participant's standing subscription to one market side.
//!
//! A registration owns up to five optional callbacks and two per-round
//! flags. Callbacks are plain closures handed over at `join_market` time;
//! they are invoked during round fan-out with no market lock held, and they
//! communicate offers by *returning* curves — a callback must not call back
//! into the registry.

use gridclear_curve::Curve;
use gridclear_types::{
    FailureCode, GridclearError, MarketName, ParticipantId, Result, Side, Timestamp,
};
use rust_decimal::Decimal;

use crate::events::MarketFailure;

/// Decides each round whether the participant wants a reservation.
pub type ReservationCallback = Box<dyn Fn(Timestamp, &MarketName, Side) -> bool + Send + Sync>;
/// Produces the participant's offer curve for the round.
pub type OfferCallback = Box<dyn Fn(Timestamp, &MarketName, Side) -> Option<Curve> + Send + Sync>;
/// Receives a side's composite curve; may return a counter-offer curve to
/// submit as this registration's own offer.
pub type AggregateCallback =
    Box<dyn Fn(Timestamp, &MarketName, Side, &Curve) -> Option<Curve> + Send + Sync>;
/// Receives the round's clearing (quantity, price).
pub type PriceCallback = Box<dyn Fn(Timestamp, &MarketName, Side, Decimal, Decimal) + Send + Sync>;
/// Receives the round's failure.
pub type ErrorCallback = Box<dyn Fn(Timestamp, &MarketName, Side, &MarketFailure) + Send + Sync>;

/// The optional callback set supplied at registration time.
///
/// At least one of `offer`, `aggregate`, or `price` must be present — a
/// participant with none of them could neither trade nor observe anything.
#[derive(Default)]
pub struct ParticipantCallbacks {
    pub reservation: Option<ReservationCallback>,
    pub offer: Option<OfferCallback>,
    pub aggregate: Option<AggregateCallback>,
    pub price: Option<PriceCallback>,
    pub error: Option<ErrorCallback>,
}

impl ParticipantCallbacks {
    fn can_act(&self) -> bool {
        self.offer.is_some() || self.aggregate.is_some() || self.price.is_some()
    }
}

impl std::fmt::Debug for ParticipantCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantCallbacks")
            .field("reservation", &self.reservation.is_some())
            .field("offer", &self.offer.is_some())
            .field("aggregate", &self.aggregate.is_some())
            .field("price", &self.price.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// One (participant, market, side) subscription with its per-round state.
#[derive(Debug)]
pub struct ParticipantRegistration {
    participant: ParticipantId,
    market: MarketName,
    side: Side,
    callbacks: ParticipantCallbacks,
    has_reservation: bool,
    failed_to_form: bool,
}

impl ParticipantRegistration {
    /// Create a registration, validating the callback set.
    pub fn new(
        participant: ParticipantId,
        market: MarketName,
        side: Side,
        callbacks: ParticipantCallbacks,
    ) -> Result<Self> {
        if !callbacks.can_act() {
            return Err(GridclearError::MissingCallbacks);
        }
        Ok(Self {
            participant,
            market,
            side,
            callbacks,
            has_reservation: false,
            failed_to_form: false,
        })
    }

    #[must_use]
    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub fn has_reservation(&self) -> bool {
        self.has_reservation
    }

    #[must_use]
    pub fn failed_to_form(&self) -> bool {
        self.failed_to_form
    }

    /// A new reservation round began: drop last round's reservation and ask
    /// whether the participant wants one now. Absent a reservation callback
    /// the participant always wants one.
    pub fn request_reservation(&mut self, timestamp: Timestamp) -> bool {
        self.has_reservation = false;
        match &self.callbacks.reservation {
            Some(callback) => callback(timestamp, &self.market, self.side),
            None => true,
        }
    }

    /// The market granted this round's reservation.
    pub fn grant_reservation(&mut self) {
        self.has_reservation = true;
        self.failed_to_form = false;
    }

    /// Ask the participant for its offer curve.
    ///
    /// Quietly produces nothing when the registration holds no reservation
    /// or has no offer callback (aggregate-driven participants offer later,
    /// in response to [`Self::report_aggregate`]).
    pub fn request_offer(&mut self, timestamp: Timestamp) -> Option<Curve> {
        if !self.has_reservation {
            tracing::debug!(market = %self.market, side = %self.side,
                participant = %self.participant,
                "offer request skipped: no reservation this round");
            return None;
        }
        let callback = self.callbacks.offer.as_ref()?;
        callback(timestamp, &self.market, self.side)
    }

    /// Validate that this registration may submit an offer right now.
    pub fn precheck_offer(&self) -> Result<()> {
        if !self.has_reservation {
            return Err(GridclearError::NoReservation);
        }
        if self.failed_to_form {
            return Err(GridclearError::FailedToForm);
        }
        Ok(())
    }

    /// Deliver a side's composite curve; the return value is an optional
    /// counter-offer to submit through this registration.
    pub fn report_aggregate(
        &mut self,
        timestamp: Timestamp,
        aggregate_side: Side,
        curve: &Curve,
    ) -> Option<Curve> {
        if !self.has_reservation {
            return None;
        }
        let callback = self.callbacks.aggregate.as_ref()?;
        callback(timestamp, &self.market, aggregate_side, curve)
    }

    /// Deliver the round's clearing price. Always consumes the reservation:
    /// a fresh one is required every round.
    pub fn report_clear_price(&mut self, timestamp: Timestamp, quantity: Decimal, price: Decimal) {
        if self.has_reservation {
            if let Some(callback) = &self.callbacks.price {
                callback(timestamp, &self.market, self.side, quantity, price);
            }
        }
        self.has_reservation = false;
    }

    /// Epoch reset: drop every per-round flag.
    pub fn reset_round_state(&mut self) {
        self.has_reservation = false;
        self.failed_to_form = false;
    }

    /// Deliver a round failure. `NOT_FORMED` marks the registration as
    /// unable to offer until its next successful reservation.
    pub fn report_error(&mut self, timestamp: Timestamp, failure: &MarketFailure) {
        if failure.code == FailureCode::NotFormed {
            self.failed_to_form = true;
        }
        if let Some(callback) = &self.callbacks.error {
            callback(timestamp, &self.market, self.side, failure);
        }
    }
}
