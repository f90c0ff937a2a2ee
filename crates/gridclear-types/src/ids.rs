//! Identifiers used throughout GridClear.
//!
//! Participants are identified by UUIDv7 for time-ordered lexicographic
//! sorting; markets are identified by their commodity name.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timestamps handed to the engine by the round driver.
///
/// The engine holds no clocks of its own: every round-boundary operation
/// receives the driver's timestamp and passes it through to callbacks and
/// events unchanged.
pub type Timestamp = DateTime<Utc>;

// ---------------------------------------------------------------------------
// MarketName
// ---------------------------------------------------------------------------

/// The name of a commodity market (e.g., `electricity`).
///
/// Markets are keyed by name process-wide; two reservations naming the same
/// string land in the same market.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MarketName(String);

impl MarketName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MarketName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for MarketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ParticipantId
// ---------------------------------------------------------------------------

/// Unique identifier for a market participant process.
///
/// Uses UUIDv7 so participant ids sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
