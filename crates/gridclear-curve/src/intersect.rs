//! Geometric intersection of two piecewise-linear curves.
//!
//! The clearing price of a market is the point where the aggregated demand
//! and supply curves cross. Three shapes are handled:
//!
//! 1. **point × point** — equal points intersect at themselves;
//! 2. **point × polyline** — the point intersects if it lies on any segment
//!    (zero cross product within tolerance, projection inside the segment);
//! 3. **polyline × polyline** — nested scan over segment pairs in original
//!    order; the straddle (counter-clockwise orientation) test or a shared
//!    endpoint selects a pair, and the exact point solves the two line
//!    equations. Parallel pairs (zero determinant) are skipped.
//!
//! The first intersection found in scan order wins. When curves cross more
//! than once this is an arbitrary but deterministic tie-break, kept as
//! defined behavior.

use std::fmt;

use gridclear_types::constants::COLLINEAR_TOLERANCE_SCALE;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::curve::Curve;
use crate::point::CurvePoint;

impl Curve {
    /// Intersect this curve with another.
    ///
    /// Returns the first intersection point found in segment-scan order
    /// (`self` outer, `other` inner), or `None` when the curves do not
    /// cross.
    #[must_use]
    pub fn intersect(&self, other: &Curve) -> Option<CurvePoint> {
        let a = self.points();
        let b = other.points();

        match (a.len(), b.len()) {
            (0, _) | (_, 0) => None,
            (1, 1) => (a[0] == b[0]).then_some(a[0]),
            (1, _) => point_on_polyline(a[0], b),
            (_, 1) => point_on_polyline(b[0], a),
            _ => polylines_intersection(a, b),
        }
    }
}

fn point_on_polyline(point: CurvePoint, line: &[CurvePoint]) -> Option<CurvePoint> {
    line.windows(2)
        .any(|seg| between(seg[0], seg[1], point))
        .then_some(point)
}

fn polylines_intersection(a: &[CurvePoint], b: &[CurvePoint]) -> Option<CurvePoint> {
    for sa in a.windows(2) {
        for sb in b.windows(2) {
            if !segments_intersect((sa[0], sa[1]), (sb[0], sb[1])) {
                continue;
            }
            if let Some(point) = segment_intersection((sa[0], sa[1]), (sb[0], sb[1])) {
                return Some(point);
            }
        }
    }
    None
}

/// Orientation test: is the turn `p1 -> p2 -> p3` counter-clockwise in the
/// (quantity, price) plane?
fn ccw(p1: CurvePoint, p2: CurvePoint, p3: CurvePoint) -> bool {
    (p3.price - p1.price) * (p2.quantity - p1.quantity)
        > (p2.price - p1.price) * (p3.quantity - p1.quantity)
}

/// Whether two segments touch: each segment's endpoints straddle the other
/// segment, or the segments share an endpoint.
fn segments_intersect(l1: (CurvePoint, CurvePoint), l2: (CurvePoint, CurvePoint)) -> bool {
    if ccw(l1.0, l2.0, l2.1) != ccw(l1.1, l2.0, l2.1) && ccw(l1.0, l1.1, l2.0) != ccw(l1.0, l1.1, l2.1)
    {
        return true;
    }
    l1.0 == l2.0 || l1.0 == l2.1 || l1.1 == l2.0 || l1.1 == l2.1
}

fn determinant(a: (Decimal, Decimal), b: (Decimal, Decimal)) -> Decimal {
    a.0 * b.1 - a.1 * b.0
}

/// Exact intersection of the two lines through the given segments, solving
/// the 2×2 linear system. A zero determinant (parallel or collinear lines)
/// yields `None` and the segment pair is treated as non-intersecting.
fn segment_intersection(
    l1: (CurvePoint, CurvePoint),
    l2: (CurvePoint, CurvePoint),
) -> Option<CurvePoint> {
    let qdiff = (l1.0.quantity - l1.1.quantity, l2.0.quantity - l2.1.quantity);
    let pdiff = (l1.0.price - l1.1.price, l2.0.price - l2.1.price);
    let div = determinant(qdiff, pdiff);
    if div == Decimal::ZERO {
        return None;
    }
    let d = (
        determinant((l1.0.quantity, l1.0.price), (l1.1.quantity, l1.1.price)),
        determinant((l2.0.quantity, l2.0.price), (l2.1.quantity, l2.1.price)),
    );
    let quantity = determinant(d, qdiff) / div;
    let price = determinant(d, pdiff) / div;
    Some(CurvePoint::new(quantity, price))
}

/// Whether `c` lies on the segment `a -> b`: collinear within tolerance and
/// projected inside the segment's extent.
fn between(a: CurvePoint, b: CurvePoint, c: CurvePoint) -> bool {
    let cross = (c.price - a.price) * (b.quantity - a.quantity)
        - (c.quantity - a.quantity) * (b.price - a.price);
    if cross.abs() > Decimal::new(1, COLLINEAR_TOLERANCE_SCALE) {
        return false;
    }
    let dot = (c.quantity - a.quantity) * (b.quantity - a.quantity)
        + (c.price - a.price) * (b.price - a.price);
    if dot < Decimal::ZERO {
        return false;
    }
    let squared_length = (b.quantity - a.quantity) * (b.quantity - a.quantity)
        + (b.price - a.price) * (b.price - a.price);
    dot <= squared_length
}

// ---------------------------------------------------------------------------
// Bounds comparison — the failed-intersection diagnostic
// ---------------------------------------------------------------------------

/// Sign flags comparing the quantity extents of a supply curve against a
/// demand curve, attached to `NO_INTERSECT` failures so the caller can see
/// *why* the curves missed each other without re-walking segments.
///
/// Each field is the sign (-1, 0, +1) of `supply extent - demand extent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundsComparison {
    pub supply_min_vs_demand_min: i8,
    pub supply_min_vs_demand_max: i8,
    pub supply_max_vs_demand_min: i8,
    pub supply_max_vs_demand_max: i8,
}

impl fmt::Display for BoundsComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sn,Dn={} Sn,Dx={} Sx,Dn={} Sx,Dx={}",
            self.supply_min_vs_demand_min,
            self.supply_min_vs_demand_max,
            self.supply_max_vs_demand_min,
            self.supply_max_vs_demand_max,
        )
    }
}

/// Compare the quantity extents of a demand and a supply curve.
///
/// Returns `None` when either curve is empty.
#[must_use]
pub fn compare_bounds(demand: &Curve, supply: &Curve) -> Option<BoundsComparison> {
    let demand_min = demand.min_quantity()?;
    let demand_max = demand.max_quantity()?;
    let supply_min = supply.min_quantity()?;
    let supply_max = supply.max_quantity()?;

    Some(BoundsComparison {
        supply_min_vs_demand_min: sign(supply_min, demand_min),
        supply_min_vs_demand_max: sign(supply_min, demand_max),
        supply_max_vs_demand_min: sign(supply_max, demand_min),
        supply_max_vs_demand_max: sign(supply_max, demand_max),
    })
}

fn sign(a: Decimal, b: Decimal) -> i8 {
    match a.cmp(&b) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    }
}
