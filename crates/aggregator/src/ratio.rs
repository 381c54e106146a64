//! Division and rounding helpers shared by the metric derivations.

/// Hundredths are first snapped to this many steps per unit, so `1.005`
/// and `0.145` round up even though their binary value sits just below
/// the midpoint.
const SNAP_SCALE: f64 = 1e6;

/// Round to 2 decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    let hundredths = value * 100.0;
    let snapped = (hundredths * SNAP_SCALE).round() / SNAP_SCALE;
    snapped.round() / 100.0
}

/// `numerator / denominator`, undefined when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Ratio of two counts, rounded to 2 decimal places half away from zero.
/// Rounding happens in integer hundredths, so exact halves never slip.
pub fn count_ratio(numerator: u32, denominator: u32) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    let (n, d) = (u64::from(numerator), u64::from(denominator));
    let hundredths = (200 * n + d) / (2 * d);
    Some(hundredths as f64 / 100.0)
}
