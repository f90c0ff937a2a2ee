//! Error types for the GridClear clearing engine.
//!
//! All synchronous errors use the `GC_ERR_` prefix convention for easy
//! grepping in logs. Error codes are grouped by subsystem:
//! - 1xx: Registration errors
//! - 2xx: Reservation / offer errors
//! - 3xx: Market errors
//! - 4xx: Aggregation errors
//! - 9xx: General / internal errors
//!
//! Round-level failures — the asynchronous channel delivered once per failed
//! market per round — use [`FailureCode`] instead, whose names are a stable
//! part of the external interface.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{MarketName, ParticipantId, Side};

/// Central error enum for all synchronous GridClear operations.
///
/// These are caller-recoverable rejections: a declined offer, an invalid
/// registration, a malformed aggregation request. They are returned inline
/// to the caller and never broadcast to other participants.
#[derive(Debug, Error)]
pub enum GridclearError {
    // =================================================================
    // Registration Errors (1xx)
    // =================================================================
    /// A registration was constructed with none of the callbacks that would
    /// let it act on a market.
    #[error(
        "GC_ERR_100: registration must supply at least one of an offer, \
         aggregate, or price callback"
    )]
    MissingCallbacks,

    /// The (participant, market, side) triple is already registered.
    #[error("GC_ERR_101: participant {participant} is already registered as {side} in market {market}")]
    DuplicateRegistration {
        participant: ParticipantId,
        market: MarketName,
        side: Side,
    },

    /// No registration exists for the (participant, market, side) triple.
    #[error("GC_ERR_102: no registration for participant {participant} as {side} in market {market}")]
    UnknownRegistration {
        participant: ParticipantId,
        market: MarketName,
        side: Side,
    },

    // =================================================================
    // Reservation / Offer Errors (2xx)
    // =================================================================
    /// An offer was submitted without a reservation for the current round.
    #[error("GC_ERR_200: no reservation held for this round")]
    NoReservation,

    /// The market failed to form this round; offers are not accepted until
    /// a fresh reservation succeeds.
    #[error("GC_ERR_201: market failed to form; offers are not accepted this round")]
    FailedToForm,

    /// An offer curve with no points was submitted.
    #[error("GC_ERR_202: offer curve has no points")]
    EmptyCurve,

    /// The market is not accepting this kind of offer in its current state.
    #[error("GC_ERR_203: market {market} is not accepting {side} offers in state {state}")]
    WrongState {
        market: MarketName,
        side: Side,
        state: String,
    },

    /// Every reservation on this side has already been consumed by an offer.
    #[error("GC_ERR_204: all {side} reservations for market {market} are already consumed")]
    OfferWithoutReservation { market: MarketName, side: Side },

    // =================================================================
    // Market Errors (3xx)
    // =================================================================
    /// The named market does not exist (no reservation has ever created it).
    #[error("GC_ERR_300: unknown market {0}")]
    UnknownMarket(MarketName),

    // =================================================================
    // Aggregation Errors (4xx)
    // =================================================================
    /// Aggregation was requested over an empty set of curves.
    #[error("GC_ERR_400: cannot aggregate an empty set of curves")]
    NoCurves,

    /// The sampling resolution is too small to span a price range.
    #[error("GC_ERR_401: aggregation resolution {0} is below the minimum of {min}",
            min = crate::constants::MIN_AGGREGATE_RESOLUTION)]
    InvalidResolution(usize),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("GC_ERR_900: internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, GridclearError>;

// ---------------------------------------------------------------------------
// FailureCode — the round-level failure channel
// ---------------------------------------------------------------------------

/// Why a market's round failed to clear.
///
/// These names are stable external interface: they are reproduced verbatim
/// in error events and must never be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    /// The market never had at least one buyer and one seller reservation.
    NotFormed,
    /// The market failed to receive all expected offers.
    ShortOffers,
    /// The market was cleared from a state that should be unreachable —
    /// an internal invariant violation, logged as a defect signal.
    BadState,
    /// The aggregated supply and demand curves do not intersect.
    NoIntersect,
}

impl FailureCode {
    /// The stable wire name of this code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFormed => "NOT_FORMED",
            Self::ShortOffers => "SHORT_OFFERS",
            Self::BadState => "BAD_STATE",
            Self::NoIntersect => "NO_INTERSECT",
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
