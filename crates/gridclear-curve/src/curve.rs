//! The piecewise-linear price/quantity curve.
//!
//! A [`Curve`] is an ordered sequence of unique (quantity, price) points,
//! kept sorted ascending by quantity. Interpolation works in either axis:
//! price-from-quantity walks the quantity order directly, while
//! quantity-from-price walks a price-ascending view of the same points
//! (reversed when price falls as quantity rises, as it does on a demand
//! curve).
//!
//! A curve of length 1 is a degenerate fixed point — an inelastic offer.
//! Curves are built by one participant for one round and handed to the
//! market by value; the market never mutates a submitted curve.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::point::CurvePoint;

/// An ordered piecewise-linear relation between quantity and price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Points sorted ascending by quantity (price tie-break).
    points: Vec<CurvePoint>,
    min_quantity: Option<Decimal>,
    max_quantity: Option<Decimal>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
}

impl Curve {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a curve from (quantity, price) pairs.
    #[must_use]
    pub fn from_points(pairs: impl IntoIterator<Item = (Decimal, Decimal)>) -> Self {
        let mut curve = Self::new();
        for (quantity, price) in pairs {
            curve.add(quantity, price);
        }
        curve
    }

    /// Insert a point, de-duplicating identical (quantity, price) pairs.
    ///
    /// Appending in ascending quantity order is O(1); an out-of-order point
    /// triggers a re-sort of the whole list. Cached extrema of both axes are
    /// updated incrementally.
    pub fn add(&mut self, quantity: Decimal, price: Decimal) {
        let point = CurvePoint::new(quantity, price);
        if self.points.iter().rev().any(|p| *p == point) {
            return;
        }

        let out_of_order = self
            .points
            .last()
            .is_some_and(|last| point.quantity < last.quantity);

        self.points.push(point);
        if out_of_order {
            self.points.sort();
        }

        self.min_quantity = opt_min(self.min_quantity, quantity);
        self.max_quantity = opt_max(self.max_quantity, quantity);
        self.min_price = opt_min(self.min_price, price);
        self.max_price = opt_max(self.max_price, price);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The points in ascending quantity order.
    #[must_use]
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    #[must_use]
    pub fn min_quantity(&self) -> Option<Decimal> {
        self.min_quantity
    }

    #[must_use]
    pub fn max_quantity(&self) -> Option<Decimal> {
        self.max_quantity
    }

    #[must_use]
    pub fn min_price(&self) -> Option<Decimal> {
        self.min_price
    }

    #[must_use]
    pub fn max_price(&self) -> Option<Decimal> {
        self.max_price
    }

    /// Whether the curve collapses to a single price level.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        !self.is_empty() && self.min_price == self.max_price
    }

    /// Linear interpolation of price at `quantity`.
    ///
    /// Outside the curve's quantity range the corresponding bound argument
    /// is returned instead (`None` when no bound is supplied). An empty
    /// curve interpolates to `None` everywhere.
    #[must_use]
    pub fn price_at(
        &self,
        quantity: Decimal,
        left: Option<Decimal>,
        right: Option<Decimal>,
    ) -> Option<Decimal> {
        let samples: Vec<(Decimal, Decimal)> =
            self.points.iter().map(|p| (p.quantity, p.price)).collect();
        interp(&samples, quantity, left, right)
    }

    /// Linear interpolation of quantity at `price`.
    ///
    /// Uses the price-ascending view of the points so interpolation is
    /// valid whether price rises or falls with quantity. Outside the price
    /// range the corresponding bound argument (or `None`) is returned.
    #[must_use]
    pub fn quantity_at(
        &self,
        price: Decimal,
        left: Option<Decimal>,
        right: Option<Decimal>,
    ) -> Option<Decimal> {
        let ascending = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => first.price < last.price,
            _ => true,
        };
        let samples: Vec<(Decimal, Decimal)> = if ascending {
            self.points.iter().map(|p| (p.price, p.quantity)).collect()
        } else {
            self.points
                .iter()
                .rev()
                .map(|p| (p.price, p.quantity))
                .collect()
        };
        interp(&samples, price, left, right)
    }
}

/// Piecewise-linear interpolation over `(key, value)` samples with keys in
/// ascending order, mirroring the usual numeric-library contract except
/// that out-of-range lookups yield the explicit bound or `None` rather
/// than clamping to an endpoint value.
fn interp(
    samples: &[(Decimal, Decimal)],
    x: Decimal,
    left: Option<Decimal>,
    right: Option<Decimal>,
) -> Option<Decimal> {
    let (first_key, first_val) = *samples.first()?;
    let (last_key, _) = *samples.last()?;

    if x < first_key {
        return left;
    }
    if x > last_key {
        return right;
    }

    for window in samples.windows(2) {
        let (x0, y0) = window[0];
        let (x1, y1) = window[1];
        if x0 <= x && x <= x1 {
            if x0 == x1 {
                return Some(y0);
            }
            return Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0));
        }
    }

    // Single-point sample set: x == first_key here.
    if x == first_key {
        return Some(first_val);
    }
    None
}

fn opt_min(current: Option<Decimal>, candidate: Decimal) -> Option<Decimal> {
    Some(current.map_or(candidate, |c| c.min(candidate)))
}

fn opt_max(current: Option<Decimal>, candidate: Decimal) -> Option<Decimal> {
    Some(current.map_or(candidate, |c| c.max(candidate)))
}
