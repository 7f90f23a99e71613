use super::{Point2, TOLERANCE};

/// Returns the minimum distance from `p` to the line segment `a`→`b`.
#[must_use]
pub fn point_to_segment_dist(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        return (p - a).norm();
    }

    // Project point onto the infinite line, clamp to [0, 1].
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    (p - (a + d * t)).norm()
}

/// Returns the perpendicular distance from `p` to the infinite line through
/// `a` and `b`.
///
/// When `a` and `b` coincide the distance to `a` is returned.
#[must_use]
pub fn point_to_line_dist(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len = d.norm();
    if len < TOLERANCE {
        return (p - a).norm();
    }
    let ap = p - a;
    (d.x * ap.y - d.y * ap.x).abs() / len
}

/// Signed distance from `p` to the line `x·cos θ + y·sin θ = ρ`.
#[must_use]
pub fn point_to_normal_line_dist(p: &Point2, theta: f64, rho: f64) -> f64 {
    let (sin, cos) = theta.sin_cos();
    p.x * cos + p.y * sin - rho
}

/// Orthogonal projection of `p` onto the line `x·cos θ + y·sin θ = ρ`.
#[must_use]
pub fn project_onto_normal_line(p: &Point2, theta: f64, rho: f64) -> Point2 {
    let (sin, cos) = theta.sin_cos();
    let d = point_to_normal_line_dist(p, theta, rho);
    Point2::new(p.x - d * cos, p.y - d * sin)
}

/// Normal-form parameters `(θ, ρ)` of the line through `a` and `b`.
///
/// Returns `None` when the points coincide.
#[must_use]
pub fn normal_form(a: &Point2, b: &Point2) -> Option<(f64, f64)> {
    let d = b - a;
    if d.norm() < TOLERANCE {
        return None;
    }
    let theta = d.y.atan2(d.x) + std::f64::consts::FRAC_PI_2;
    let (sin, cos) = theta.sin_cos();
    let rho = a.x * cos + a.y * sin;
    Some((theta, rho))
}
