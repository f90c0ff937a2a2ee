//! Horizontal summation of same-side curves.
//!
//! A market side's composite curve is the quantity sum of every
//! participant's curve at matching price levels. Two strategies exist:
//!
//! - [`combine`] samples `resolution` equally spaced prices across the
//!   global price range, keeping aggregation cost bounded by the resolution
//!   rather than by participants × curve complexity;
//! - [`combine_exact`] samples at the union of every input curve's price
//!   breakpoints, trading bounded cost for fidelity.
//!
//! Curves with no coverage at a sampled price are skipped, not treated as
//! zero; a sample nobody covers produces no output point.

use std::collections::BTreeSet;

use gridclear_types::{GridclearError, Result, constants};
use rust_decimal::Decimal;

use crate::curve::Curve;

/// Combine many same-side curves into one composite by sampled horizontal
/// summation, with prices sampled in descending order.
///
/// When every input is flat at one shared price the quantity extents are
/// summed directly at that price (a 1- or 2-point curve) and no sampling
/// happens.
pub fn combine(curves: &[Curve], resolution: usize) -> Result<Curve> {
    if resolution < constants::MIN_AGGREGATE_RESOLUTION {
        return Err(GridclearError::InvalidResolution(resolution));
    }
    let (price_min, price_max) = price_range(curves)?;

    if price_min == price_max {
        return Ok(combine_flat(curves, price_min));
    }

    let span = price_max - price_min;
    let step = span / Decimal::from(resolution as u64 - 1);
    let mut composite = Curve::new();
    for i in 0..resolution {
        // Pin the final sample to the exact lower bound so rounding in the
        // step division cannot leave the range short.
        let price = if i + 1 == resolution {
            price_min
        } else {
            price_max - step * Decimal::from(i as u64)
        };
        if let Some(total) = quantity_sum(curves, price) {
            composite.add(total, price);
        }
    }
    Ok(composite)
}

/// Combine many same-side curves by sampling exactly at the union of the
/// distinct price breakpoints of every input, in descending price order.
pub fn combine_exact(curves: &[Curve]) -> Result<Curve> {
    // Validates the input set even though the breakpoints drive sampling.
    price_range(curves)?;

    let breakpoints: BTreeSet<Decimal> = curves
        .iter()
        .flat_map(|curve| curve.points().iter().map(|p| p.price))
        .collect();

    let mut composite = Curve::new();
    for price in breakpoints.iter().rev() {
        if let Some(total) = quantity_sum(curves, *price) {
            composite.add(total, *price);
        }
    }
    Ok(composite)
}

/// All inputs are flat at `price`: sum the quantity extents directly.
fn combine_flat(curves: &[Curve], price: Decimal) -> Curve {
    tracing::debug!(%price, inputs = curves.len(), "aggregating flat curves without sampling");
    let quantity_min: Decimal = curves.iter().filter_map(Curve::min_quantity).sum();
    let quantity_max: Decimal = curves.iter().filter_map(Curve::max_quantity).sum();

    let mut composite = Curve::new();
    composite.add(quantity_min, price);
    composite.add(quantity_max, price);
    composite
}

/// Sum of `quantity_at(price)` over every curve with coverage there;
/// `None` when no curve covers the price.
fn quantity_sum(curves: &[Curve], price: Decimal) -> Option<Decimal> {
    curves
        .iter()
        .filter_map(|curve| curve.quantity_at(price, None, None))
        .fold(None, |acc, quantity| {
            Some(acc.unwrap_or(Decimal::ZERO) + quantity)
        })
}

/// Global price range across all input curves; errors when every curve is
/// empty (there is nothing to aggregate).
fn price_range(curves: &[Curve]) -> Result<(Decimal, Decimal)> {
    let min = curves.iter().filter_map(Curve::min_price).min();
    let max = curves.iter().filter_map(Curve::max_price).max();
    match (min, max) {
        (Some(min), Some(max)) => Ok((min, max)),
        _ => Err(GridclearError::NoCurves),
    }
}
