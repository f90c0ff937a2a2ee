//! A single point of a piecewise-linear curve.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One (quantity, price) pair on a curve.
///
/// Ordering is quantity-major: curves keep their points sorted ascending by
/// quantity, with price as the tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurvePoint {
    pub quantity: Decimal,
    pub price: Decimal,
}

impl CurvePoint {
    #[must_use]
    pub fn new(quantity: Decimal, price: Decimal) -> Self {
        Self { quantity, price }
    }
}

impl fmt::Display for CurvePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.quantity, self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn ordering_is_quantity_major() {
        let a = CurvePoint::new(dec(1), dec(100));
        let b = CurvePoint::new(dec(2), dec(1));
        assert!(a < b);

        let c = CurvePoint::new(dec(1), dec(50));
        assert!(c < a, "equal quantities tie-break on price");
    }

    #[test]
    fn display_shows_quantity_then_price() {
        let p = CurvePoint::new(dec(5), dec(42));
        assert_eq!(p.to_string(), "(5, 42)");
    }

    #[test]
    fn serde_roundtrip() {
        let p = CurvePoint::new(dec(10), dec(3));
        let json = serde_json::to_string(&p).unwrap();
        let back: CurvePoint = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
