use crate::constants::{STICK_MAX, STICK_MIN_MAGNITUDE};

/// Map a raw stick value to [-1, 1] with a dead zone around center
///
/// Values within `threshold` of zero read as exactly zero. Outside it, the
/// live range `(threshold, max]` is rescaled to `(0, 1]`, so the output
/// ramps up from zero at the edge of the dead zone instead of jumping. The
/// negative side mirrors this against `-32768`.
pub fn normalize_stick_value(value: i16, threshold: i16) -> f32 {
    let threshold = threshold.max(0) as f32;
    let value = value as f32;

    if value < -threshold {
        (value + threshold) / (STICK_MIN_MAGNITUDE - threshold)
    } else if value > threshold {
        (value - threshold) / (STICK_MAX as f32 - threshold)
    } else {
        0.0
    }
}
