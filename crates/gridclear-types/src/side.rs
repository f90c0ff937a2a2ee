//! The two sides of a double auction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of a market a participant trades on.
///
/// Buyers submit demand curves (price falling as quantity rises), sellers
/// submit supply curves (price non-decreasing with quantity). The engine
/// itself enforces no monotonicity; the side only routes offers and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buyer,
    Seller,
}

impl Side {
    /// The other side of the market.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buyer => Self::Seller,
            Self::Seller => Self::Buyer,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buyer => write!(f, "BUYER"),
            Self::Seller => write!(f, "SELLER"),
        }
    }
}
