//! System-wide constants and defaults.

/// Default number of equally spaced price samples used when aggregating a
/// side's offer curves. Bounds aggregation cost regardless of how many
/// segments participant curves carry.
pub const DEFAULT_AGGREGATE_RESOLUTION: usize = 100;

/// Minimum usable sampling resolution: two samples pin both ends of the
/// price range.
pub const MIN_AGGREGATE_RESOLUTION: usize = 2;

/// Decimal scale of the collinearity tolerance in the point-on-segment
/// test: a cross product with magnitude at most 10^-12 counts as zero.
/// Participant curves may carry quantities computed at float precision.
pub const COLLINEAR_TOLERANCE_SCALE: u32 = 12;
