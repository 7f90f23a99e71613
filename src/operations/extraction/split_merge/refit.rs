//! Least-squares line refit over a run of scan points.
//!
//! The line is parameterized in normal form `x·cos θ + y·sin θ = ρ` and the
//! sum of squared perpendicular distances is minimized numerically, seeded at
//! the line through the run's first and last point.

use crate::math::distance_2d::{normal_form, point_to_normal_line_dist, project_onto_normal_line};
use crate::math::nelder_mead::{minimize, OptimizerOptions};
use crate::math::Point2;

/// Relative step of the initial simplex along `ρ`.
const RHO_STEP: f64 = 0.01;
/// Initial simplex step along `θ`, in radians.
const THETA_STEP: f64 = 0.01;

/// Sum of squared perpendicular distances from `points` to a normal-form line.
#[must_use]
pub fn squared_residual(points: &[Point2], theta: f64, rho: f64) -> f64 {
    points
        .iter()
        .map(|p| point_to_normal_line_dist(p, theta, rho).powi(2))
        .sum()
}

/// Fits a line to `points` and returns its ends.
///
/// The ends are the projections of the first and last point onto the fitted
/// line. Runs of fewer than three points, or whose end points coincide, keep
/// the two-point line.
#[must_use]
pub fn refit_line(points: &[Point2], options: &OptimizerOptions) -> Option<(Point2, Point2)> {
    let (first, last) = (points.first()?, points.last()?);
    if points.len() < 3 {
        return Some((*first, *last));
    }
    let Some((theta0, rho0)) = normal_form(first, last) else {
        return Some((*first, *last));
    };

    let scale = (last - first).norm().max(1.0);
    let best = minimize(
        |x| squared_residual(points, x[0], x[1]),
        &[theta0, rho0],
        &[THETA_STEP, RHO_STEP * scale],
        options,
    );
    let (theta, rho) = (best.x[0], best.x[1]);
    Some((
        project_onto_normal_line(first, theta, rho),
        project_onto_normal_line(last, theta, rho),
    ))
}
