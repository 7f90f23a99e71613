pub mod angle;
pub mod distance_2d;
pub mod intersect_2d;
pub mod nelder_mead;
pub mod polygon_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns a point with both coordinates set to `NaN`.
///
/// Used as the endpoint of rays that produced no return.
#[must_use]
pub fn nan_point() -> Point2 {
    Point2::new(f64::NAN, f64::NAN)
}

/// Returns `true` if both coordinates are finite.
#[must_use]
pub fn is_finite_point(p: &Point2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}
