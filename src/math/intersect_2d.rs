use std::f64::consts::PI;

use super::angle::{angle_between, angle_diff, bearing};
use super::{Point2, Vector2, TOLERANCE};

/// Default angular slack admitting rays that graze a segment endpoint.
pub const RAY_ANGLE_TOLERANCE: f64 = 1e-3;

/// Ray and segment directions closer than this (modulo π) are collinear.
pub const COLLINEAR_ANGLE_TOLERANCE: f64 = 1e-12;

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
) -> Option<(f64, f64)> {
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < TOLERANCE {
        return None;
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let t = (dx * d2.y - dy * d2.x) / cross;
    let u = (dx * d1.y - dy * d1.x) / cross;
    Some((t, u))
}

/// Distance along a ray to the segment `a`→`b`.
///
/// The ray starts at `start` and points along the world angle `angle`. It is
/// admitted only if `angle` lies between the bearings of `a` and `b` seen from
/// `start` (shorter arc, widened by `tolerance`).
///
/// Returns:
/// - `+∞` if the ray is not admitted by the angular bracket,
/// - `NaN` if the segment is degenerate or parallel to the ray,
/// - otherwise the signed distance from `start` to the crossing of the two
///   supporting lines.
#[must_use]
pub fn ray_segment_distance(
    start: &Point2,
    angle: f64,
    a: &Point2,
    b: &Point2,
    tolerance: f64,
) -> f64 {
    let bearing_a = bearing(start, a);
    let bearing_b = bearing(start, b);
    if !angle_between(angle, bearing_a, bearing_b, tolerance) {
        return f64::INFINITY;
    }

    let seg = b - a;
    if seg.norm() < TOLERANCE {
        return f64::NAN;
    }

    // Parallel directions, in either sense, have no single crossing.
    let skew = angle_diff(angle, seg.y.atan2(seg.x)).abs();
    if skew.min(PI - skew) < COLLINEAR_ANGLE_TOLERANCE {
        return f64::NAN;
    }

    let dir = Vector2::new(angle.cos(), angle.sin());
    match line_line_intersect_2d(start, &dir, a, &seg) {
        Some((t, _)) => t,
        None => f64::NAN,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn line_line_perpendicular() {
        let p1 = Point2::new(0.0, 0.0);
        let d1 = Vector2::new(1.0, 0.0);
        let p2 = Point2::new(0.5, -1.0);
        let d2 = Vector2::new(0.0, 1.0);
        let (t, u) = line_line_intersect_2d(&p1, &d1, &p2, &d2).unwrap();
        assert!((t - 0.5).abs() < TOLERANCE);
        assert!((u - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn line_line_parallel_returns_none() {
        let p1 = Point2::new(0.0, 0.0);
        let d1 = Vector2::new(1.0, 0.0);
        let p2 = Point2::new(0.0, 1.0);
        let d2 = Vector2::new(1.0, 0.0);
        assert!(line_line_intersect_2d(&p1, &d1, &p2, &d2).is_none());
    }

    #[test]
    fn ray_hits_vertical_wall() {
        let d = ray_segment_distance(
            &Point2::origin(),
            0.0,
            &Point2::new(5.0, -5.0),
            &Point2::new(5.0, 5.0),
            RAY_ANGLE_TOLERANCE,
        );
        assert!((d - 5.0).abs() < 1e-12, "d={d}");
    }

    #[test]
    fn ray_outside_bracket_is_infinite() {
        let d = ray_segment_distance(
            &Point2::origin(),
            PI,
            &Point2::new(5.0, -5.0),
            &Point2::new(5.0, 5.0),
            RAY_ANGLE_TOLERANCE,
        );
        assert!(d.is_infinite() && d > 0.0);
    }

    #[test]
    fn ray_parallel_to_segment_is_nan() {
        // The sensor sits on the segment's supporting line; both endpoints
        // bracket the ray at bearing 0, but the directions are collinear.
        let d = ray_segment_distance(
            &Point2::origin(),
            0.0,
            &Point2::new(1.0, 0.0),
            &Point2::new(3.0, 0.0),
            RAY_ANGLE_TOLERANCE,
        );
        assert!(d.is_nan());
    }

    #[test]
    fn ray_grazing_endpoint_admitted_within_tolerance() {
        // Endpoint at bearing 0; ray slightly below it.
        let a = Point2::new(2.0, 0.0);
        let b = Point2::new(2.0, 2.0);
        let inside = ray_segment_distance(&Point2::origin(), -5e-4, &a, &b, RAY_ANGLE_TOLERANCE);
        assert!((inside - 2.0).abs() < 1e-3, "inside={inside}");
        let outside = ray_segment_distance(&Point2::origin(), -5e-2, &a, &b, RAY_ANGLE_TOLERANCE);
        assert!(outside.is_infinite());
    }

    #[test]
    fn ray_across_angle_wraparound() {
        // Segment straddles the ±π seam behind the sensor.
        let d = ray_segment_distance(
            &Point2::origin(),
            PI - 1e-6,
            &Point2::new(-3.0, 1.0),
            &Point2::new(-3.0, -1.0),
            RAY_ANGLE_TOLERANCE,
        );
        assert!((d - 3.0).abs() < 1e-5, "d={d}");
    }
}
