use serde::{Deserialize, Serialize};

use crate::math::{Point2, Vector2};

/// Sensor pose: position plus heading, in the world frame.
///
/// A ray with sensor-frame azimuth `a` points along world angle
/// `heading + a`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2 {
    pub position: Point2,
    pub heading: f64,
}

impl Default for Pose2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose2 {
    /// Creates a pose at `(x, y)` with `heading` in radians.
    #[must_use]
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            position: Point2::new(x, y),
            heading,
        }
    }

    /// Pose at the origin facing along +X.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Whether position and heading are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite() && self.heading.is_finite()
    }

    /// World angle of a ray with sensor-frame `azimuth`.
    #[must_use]
    pub fn world_angle(&self, azimuth: f64) -> f64 {
        self.heading + azimuth
    }

    /// Point at `range` along sensor-frame `azimuth`.
    #[must_use]
    pub fn project(&self, azimuth: f64, range: f64) -> Point2 {
        let angle = self.world_angle(azimuth);
        self.position + Vector2::new(angle.cos(), angle.sin()) * range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn project_applies_heading() {
        let pose = Pose2::new(1.0, 2.0, FRAC_PI_2);
        let p = pose.project(0.0, 3.0);
        assert_abs_diff_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn identity_is_finite() {
        assert!(Pose2::identity().is_finite());
        assert!(!Pose2::new(f64::NAN, 0.0, 0.0).is_finite());
    }
}
