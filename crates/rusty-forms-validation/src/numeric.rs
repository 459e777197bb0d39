//! Numeric validation functions

/// Cap on the fractional digits considered when scaling a step
const MAX_STEP_DECIMALS: usize = 15;

/// Parses a control value as a finite number.
///
/// Surrounding whitespace is ignored; `NaN`, `inf` and trailing garbage are
/// rejected.
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

pub fn is_number(value: &str) -> bool {
    parse_number(value).is_some()
}

/// `min`: value parses and is at least `min`
pub fn at_least(value: &str, min: f64) -> bool {
    parse_number(value).map_or(false, |number| number >= min)
}

/// `max`: value parses and is at most `max`
pub fn at_most(value: &str, max: f64) -> bool {
    parse_number(value).map_or(false, |number| number <= max)
}

/// Number of digits after the decimal point in the canonical text of `step`.
pub fn fractional_digits(step: f64) -> usize {
    let text = step.abs().to_string();
    text.split_once('.')
        .map_or(0, |(_, fraction)| fraction.len())
        .min(MAX_STEP_DECIMALS)
}

/// Whether `value` is an integer multiple of `step`.
///
/// Both sides are scaled by `10^d` (with `d` the step's fractional digit
/// count) and rounded before the modulus, so `0.3` aligns with `0.1` even
/// though `0.3 / 0.1` is not exactly `3.0` in binary floating point.
/// A non-positive step never aligns.
pub fn is_step_aligned(value: f64, step: f64) -> bool {
    if !(step.is_finite() && step > 0.0 && value.is_finite()) {
        return false;
    }

    let multiplier = 10f64.powi(fractional_digits(step) as i32);
    let scaled_step = (step * multiplier).round();
    if scaled_step <= 0.0 {
        return false;
    }

    let scaled_value = value * multiplier;
    let rounded = scaled_value.round();
    let tolerance = 1e-9 * scaled_value.abs().max(1.0);
    if (scaled_value - rounded).abs() > tolerance {
        return false;
    }

    rounded % scaled_step == 0.0
}
