use std::f64::consts::{PI, TAU};

use super::Point2;

/// Normalizes an angle to `[-π, π)`.
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Signed shorter-arc difference from `from` to `to`, in `[-π, π)`.
///
/// Positive when `to` lies counter-clockwise of `from`.
#[must_use]
pub fn angle_diff(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// Polar angle of `p` as seen from `origin`.
#[must_use]
pub fn bearing(origin: &Point2, p: &Point2) -> f64 {
    (p.y - origin.y).atan2(p.x - origin.x)
}

/// Returns `true` if `angle` lies on the shorter arc between `a` and `b`,
/// widened by `tolerance` on both sides.
///
/// The arc is taken in whichever rotational sense is shorter, so the order of
/// `a` and `b` does not matter.
#[must_use]
pub fn angle_between(angle: f64, a: f64, b: f64, tolerance: f64) -> bool {
    let span = angle_diff(a, b);
    let offset = angle_diff(a, angle);
    if span >= 0.0 {
        offset >= -tolerance && offset <= span + tolerance
    } else {
        offset <= tolerance && offset >= span - tolerance
    }
}
