use super::{Point2, Vector2, TOLERANCE};
use crate::error::{GeometryError, Result};

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Unsigned area of the triangle `a`, `b`, `c`.
#[must_use]
pub fn triangle_area(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let ab = b - a;
    let ac = c - a;
    (ab.x * ac.y - ab.y * ac.x).abs() * 0.5
}

/// Height of apex `b` above the base `a`→`c`.
///
/// A collapsed base degrades to the apex's distance from `a`.
#[must_use]
pub fn triangle_altitude(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let base = (c - a).norm();
    if base < TOLERANCE {
        return (b - a).norm();
    }
    2.0 * triangle_area(a, b, c) / base
}

/// How much longer the path `a`→`b`→`c` is than the base `a`→`c`.
#[must_use]
pub fn triangle_length_excess(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    ((b - a).norm() + (c - b).norm() - (c - a).norm()).max(0.0)
}

/// Computes the normalized direction from point `a` to point `b`.
///
/// # Errors
///
/// Returns `GeometryError::ZeroVector` if the segment has zero length.
pub fn segment_direction(a: &Point2, b: &Point2) -> Result<Vector2> {
    let d = b - a;
    let len = d.norm();
    if len < TOLERANCE {
        return Err(GeometryError::ZeroVector.into());
    }
    Ok(d / len)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        let area = signed_area_2d(&unit_square());
        assert!((area - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = unit_square();
        pts.reverse();
        assert!((signed_area_2d(&pts) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!((signed_area_2d(&[Point2::new(0.0, 0.0)])).abs() < TOLERANCE);
        assert!((signed_area_2d(&[])).abs() < TOLERANCE);
    }

    #[test]
    fn triangle_metrics_right_triangle() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 2.0);
        let c = Point2::new(4.0, 0.0);
        assert!((triangle_area(&a, &b, &c) - 4.0).abs() < TOLERANCE);
        assert!((triangle_altitude(&a, &b, &c) - 2.0).abs() < TOLERANCE);
        let excess = 2.0 * 8.0_f64.sqrt() - 4.0;
        assert!((triangle_length_excess(&a, &b, &c) - excess).abs() < TOLERANCE);
    }

    #[test]
    fn triangle_metrics_collinear_are_zero() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(3.0, 0.0);
        assert!(triangle_area(&a, &b, &c) < TOLERANCE);
        assert!(triangle_altitude(&a, &b, &c) < TOLERANCE);
        assert!(triangle_length_excess(&a, &b, &c) < TOLERANCE);
    }

    #[test]
    fn altitude_with_collapsed_base() {
        let a = Point2::new(1.0, 1.0);
        let b = Point2::new(4.0, 5.0);
        assert!((triangle_altitude(&a, &b, &a) - 5.0).abs() < TOLERANCE);
    }

    #[test]
    fn segment_direction_basic() {
        let dir = segment_direction(&Point2::new(0.0, 0.0), &Point2::new(3.0, 4.0)).unwrap();
        assert!((dir.x - 0.6).abs() < TOLERANCE);
        assert!((dir.y - 0.8).abs() < TOLERANCE);
    }

    #[test]
    fn segment_direction_zero_length() {
        let a = Point2::new(1.0, 1.0);
        assert!(segment_direction(&a, &a).is_err());
    }
}
