//! The per-market collection of submitted offer curves.

use gridclear_curve::{Curve, combine, combine_exact};
use gridclear_types::{GridclearError, Result, Side};

/// Pending offer curves for one market round, one list per side.
///
/// Curves are owned by the book from acceptance until the round resets;
/// they are never mutated after submission.
#[derive(Debug, Default)]
pub struct OfferBook {
    buy: Vec<Curve>,
    sell: Vec<Curve>,
}

impl OfferBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept an offer curve for one side.
    pub fn add(&mut self, side: Side, curve: Curve) -> Result<()> {
        if curve.is_empty() {
            return Err(GridclearError::EmptyCurve);
        }
        self.side_mut(side).push(curve);
        Ok(())
    }

    #[must_use]
    pub fn count(&self, side: Side) -> usize {
        self.side(side).len()
    }

    #[must_use]
    pub fn curves(&self, side: Side) -> &[Curve] {
        self.side(side)
    }

    /// The side's composite curve by sampled aggregation.
    pub fn aggregate(&self, side: Side, resolution: usize) -> Result<Curve> {
        combine(self.side(side), resolution)
    }

    /// The side's composite curve sampled at every price breakpoint.
    pub fn aggregate_exact(&self, side: Side) -> Result<Curve> {
        combine_exact(self.side(side))
    }

    pub fn reset(&mut self) {
        self.buy.clear();
        self.sell.clear();
    }

    fn side(&self, side: Side) -> &Vec<Curve> {
        match side {
            Side::Buyer => &self.buy,
            Side::Seller => &self.sell,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<Curve> {
        match side {
            Side::Buyer => &mut self.buy,
            Side::Seller => &mut self.sell,
        }
    }
}
