use std::f64::consts::PI;

use tracing::debug;

use crate::error::{InputError, Result};
use crate::geometry::LineMap;
use crate::operations::intersect::{IntersectOptions, IntersectRaysWithMap};
use crate::scan::Scan;

/// Squared radial residual of one ray.
///
/// | ray        | map hit at `d` | no hit |
/// |------------|----------------|--------|
/// | returned   | `(r - d)²`     | `dr²`  |
/// | no return  | `dr²`          | `0`    |
#[must_use]
pub fn ray_residual(returned: bool, radius: f64, hit: Option<f64>, penalty: f64) -> f64 {
    match (returned, hit) {
        (true, Some(d)) => (radius - d).powi(2),
        (true, None) | (false, Some(_)) => penalty * penalty,
        (false, None) => 0.0,
    }
}

/// Residuals of a scan against a map.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualSummary {
    /// Sum of squared residuals over all rays.
    pub total: f64,
    /// Root mean square residual, `0` for an empty scan.
    pub rms: f64,
    /// Number of rays that hit the map.
    pub reflected: usize,
    /// Squared residual of each ray, in scan order.
    pub per_ray: Vec<f64>,
}

impl ResidualSummary {
    /// Log-likelihood of the scan under independent Gaussian radial noise
    /// with standard deviation `sigma`.
    #[must_use]
    pub fn log_likelihood(&self, sigma: f64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let n = self.per_ray.len() as f64;
        -0.5 * self.total / (sigma * sigma) - n * (sigma * (2.0 * PI).sqrt()).ln()
    }
}

/// Scores a scan against a map under the Gaussian radial-noise model.
///
/// Rays are intersected with the map and each contributes its
/// [`ray_residual`]; `penalty` is the residual charged to a returned ray the
/// map does not reflect, or a no-return ray that it does.
#[derive(Debug)]
pub struct ScanResidual<'a> {
    scan: &'a Scan,
    map: &'a LineMap,
    penalty: f64,
    intersect: IntersectOptions,
}

impl<'a> ScanResidual<'a> {
    /// Creates a residual query with a unit penalty.
    #[must_use]
    pub fn new(scan: &'a Scan, map: &'a LineMap) -> Self {
        Self {
            scan,
            map,
            penalty: 1.0,
            intersect: IntersectOptions::default(),
        }
    }

    /// Sets the residual charged to an unexplained ray.
    #[must_use]
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    /// Sets custom intersection options.
    #[must_use]
    pub fn with_intersect_options(mut self, options: IntersectOptions) -> Self {
        self.intersect = options;
        self
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` for a negative or non-finite
    /// penalty or invalid intersection options.
    pub fn execute(&self) -> Result<ResidualSummary> {
        if !self.penalty.is_finite() || self.penalty < 0.0 {
            return Err(
                InputError::option("penalty", "must be finite and non-negative").into(),
            );
        }
        let hits = IntersectRaysWithMap::new(self.scan, self.map)
            .with_options(self.intersect)
            .execute()?;

        let per_ray: Vec<f64> = (0..self.scan.len())
            .map(|i| {
                let hit = hits.is_hit(i).then_some(hits.distance[i]);
                ray_residual(
                    self.scan.is_returned(i),
                    self.scan.radius(i),
                    hit,
                    self.penalty,
                )
            })
            .collect();
        let total: f64 = per_ray.iter().sum();
        let rms = if per_ray.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let n = per_ray.len() as f64;
            (total / n).sqrt()
        };

        debug!(
            rays = per_ray.len(),
            reflected = hits.hit_count(),
            total,
            "scored scan against map"
        );
        Ok(ResidualSummary {
            total,
            rms,
            reflected: hits.hit_count(),
            per_ray,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Element;
    use crate::math::Point2;
    use crate::scan::{Pose2, RangeInterval};
    use approx::assert_relative_eq;

    fn wall_map() -> LineMap {
        LineMap::from(Element::Polyline(vec![
            Point2::new(4.0, -5.0),
            Point2::new(4.0, 5.0),
        ]))
    }

    #[test]
    fn residual_table() {
        assert_relative_eq!(ray_residual(true, 3.0, Some(2.5), 1.0), 0.25);
        assert_relative_eq!(ray_residual(true, 3.0, None, 2.0), 4.0);
        assert_relative_eq!(ray_residual(false, f64::INFINITY, Some(2.5), 2.0), 4.0);
        assert_relative_eq!(ray_residual(false, f64::NAN, None, 2.0), 0.0);
    }

    #[test]
    fn scores_each_ray_class() {
        // Ray 0 hits at 4 and measured 5; ray 1 misses behind the sensor;
        // ray 2 is a no-return that hits the wall.
        let scan = Scan::new(
            vec![0.0, PI, 0.1],
            vec![5.0, 2.0, f64::INFINITY],
            Pose2::identity(),
            RangeInterval::new(0.0, 10.0).unwrap(),
        )
        .unwrap();
        let map = wall_map();
        let summary = ScanResidual::new(&scan, &map)
            .with_penalty(0.5)
            .execute()
            .unwrap();
        assert_eq!(summary.reflected, 2);
        assert_relative_eq!(summary.per_ray[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(summary.per_ray[1], 0.25);
        assert_relative_eq!(summary.per_ray[2], 0.25);
        assert_relative_eq!(summary.total, 1.5, epsilon = 1e-12);
        assert_relative_eq!(summary.rms, 0.5_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn exact_map_has_zero_residual() {
        let scan = Scan::new(
            vec![0.0],
            vec![4.0],
            Pose2::identity(),
            RangeInterval::unbounded(),
        )
        .unwrap();
        let map = wall_map();
        let summary = ScanResidual::new(&scan, &map).execute().unwrap();
        assert!(summary.total < 1e-20);
        let ll = summary.log_likelihood(1.0);
        assert_relative_eq!(ll, -(2.0 * PI).sqrt().ln(), epsilon = 1e-12);
    }

    #[test]
    fn empty_scan_scores_zero() {
        let summary = ScanResidual::new(&Scan::empty(), &wall_map())
            .execute()
            .unwrap();
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.rms, 0.0);
        assert!(summary.per_ray.is_empty());
    }

    #[test]
    fn invalid_penalty_rejected() {
        let scan = Scan::empty();
        let map = LineMap::new();
        assert!(ScanResidual::new(&scan, &map).with_penalty(-1.0).execute().is_err());
        assert!(ScanResidual::new(&scan, &map).with_penalty(f64::NAN).execute().is_err());
    }
}
