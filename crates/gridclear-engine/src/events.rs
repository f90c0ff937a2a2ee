//! Round outputs produced toward the transport layer.
//!
//! The engine never talks to a wire itself: every externally visible
//! outcome of a round is expressed as one of these serde-ready events, and
//! the surrounding transport decides how to encode and deliver them.

use gridclear_curve::{BoundsComparison, Curve};
use gridclear_types::{FailureCode, MarketName, Side, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a market's round failed, with enough context to explain it.
///
/// This is the asynchronous error channel: one `MarketFailure` is produced
/// per failed market per round, delivered to every error callback and
/// emitted as an [`ErrorEvent`]. It is informational — the market always
/// resets to a fresh round afterward.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct MarketFailure {
    pub code: FailureCode,
    pub message: String,
    /// Bounds diagnostic, attached to `NO_INTERSECT` failures only.
    pub bounds: Option<BoundsComparison>,
}

impl MarketFailure {
    #[must_use]
    pub fn not_formed(market: &MarketName) -> Self {
        Self {
            code: FailureCode::NotFormed,
            message: format!("market {market} failed to form: no buyer and seller pairing"),
            bounds: None,
        }
    }

    #[must_use]
    pub fn short_offers(market: &MarketName) -> Self {
        Self {
            code: FailureCode::ShortOffers,
            message: format!("market {market} failed to receive all expected offers"),
            bounds: None,
        }
    }

    #[must_use]
    pub fn bad_state(market: &MarketName, state: impl std::fmt::Display) -> Self {
        Self {
            code: FailureCode::BadState,
            message: format!("market {market} cleared from unexpected state {state}"),
            bounds: None,
        }
    }

    #[must_use]
    pub fn no_intersect(market: &MarketName, bounds: Option<BoundsComparison>) -> Self {
        Self {
            code: FailureCode::NoIntersect,
            message: format!("market {market} supply and demand curves do not intersect"),
            bounds,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One side's offers completed: its composite curve, published exactly once
/// per side per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEvent {
    pub market: MarketName,
    pub side: Side,
    pub curve: Curve,
    pub timestamp: Timestamp,
}

/// A market cleared: the intersection of aggregate supply and demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearEvent {
    pub market: MarketName,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: Timestamp,
}

/// A market's round failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub market: MarketName,
    pub code: FailureCode,
    pub message: String,
    pub bounds: Option<BoundsComparison>,
    pub timestamp: Timestamp,
}

impl ErrorEvent {
    #[must_use]
    pub fn from_failure(market: MarketName, failure: &MarketFailure, timestamp: Timestamp) -> Self {
        Self {
            market,
            code: failure.code,
            message: failure.message.clone(),
            bounds: failure.bounds,
            timestamp,
        }
    }
}

/// Everything the engine can emit toward the transport in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    Aggregate(AggregateEvent),
    Clear(ClearEvent),
    Error(ErrorEvent),
}
