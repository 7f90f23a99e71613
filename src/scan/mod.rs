//! Range scans: ordered rays measured from known sensor poses.

mod pose;

pub use pose::Pose2;

use serde::{Deserialize, Serialize};

use crate::error::{InputError, Result};
use crate::math::{nan_point, Point2, Vector2};

/// Interval of radii the sensor reports as valid returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeInterval {
    pub min: f64,
    pub max: f64,
}

impl RangeInterval {
    /// Creates a validated interval. `max` may be `+∞`.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidRange` unless `0 ≤ min ≤ max`.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || min < 0.0 || max.is_nan() || max < min {
            return Err(InputError::InvalidRange { min, max }.into());
        }
        Ok(Self { min, max })
    }

    /// Interval accepting every non-negative finite radius.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
        }
    }

    /// Whether `radius` is a finite value inside the interval.
    #[must_use]
    pub fn contains(&self, radius: f64) -> bool {
        radius.is_finite() && radius >= self.min && radius <= self.max
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Poses {
    Shared(Pose2),
    PerRay(Vec<Pose2>),
}

/// An immutable snapshot of `N` rays.
///
/// Each ray has a sensor-frame azimuth, a measured radius (possibly
/// non-finite for a missing return) and a sensor pose, either shared by all
/// rays or given per ray.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    azimuth: Vec<f64>,
    radius: Vec<f64>,
    poses: Poses,
    range: RangeInterval,
}

impl Scan {
    /// Creates a scan whose rays share one sensor pose.
    ///
    /// # Errors
    ///
    /// - `InputError::LengthMismatch` if `azimuth` and `radius` differ in length
    /// - `InputError::NonFinite` for a non-finite azimuth or pose
    pub fn new(
        azimuth: Vec<f64>,
        radius: Vec<f64>,
        pose: Pose2,
        range: RangeInterval,
    ) -> Result<Self> {
        if !pose.is_finite() {
            return Err(InputError::NonFinite {
                what: "pose",
                index: 0,
            }
            .into());
        }
        Self::build(azimuth, radius, Poses::Shared(pose), range)
    }

    /// Creates a scan with one sensor pose per ray.
    ///
    /// # Errors
    ///
    /// - `InputError::LengthMismatch` if the three arrays differ in length
    /// - `InputError::NonFinite` for a non-finite azimuth or pose
    pub fn with_poses(
        azimuth: Vec<f64>,
        radius: Vec<f64>,
        poses: Vec<Pose2>,
        range: RangeInterval,
    ) -> Result<Self> {
        if poses.len() != azimuth.len() {
            return Err(InputError::LengthMismatch {
                what: "poses",
                expected: azimuth.len(),
                actual: poses.len(),
            }
            .into());
        }
        if let Some(index) = poses.iter().position(|p| !p.is_finite()) {
            return Err(InputError::NonFinite {
                what: "pose",
                index,
            }
            .into());
        }
        Self::build(azimuth, radius, Poses::PerRay(poses), range)
    }

    fn build(
        azimuth: Vec<f64>,
        radius: Vec<f64>,
        poses: Poses,
        range: RangeInterval,
    ) -> Result<Self> {
        if radius.len() != azimuth.len() {
            return Err(InputError::LengthMismatch {
                what: "radius",
                expected: azimuth.len(),
                actual: radius.len(),
            }
            .into());
        }
        if let Some(index) = azimuth.iter().position(|a| !a.is_finite()) {
            return Err(InputError::NonFinite {
                what: "azimuth",
                index,
            }
            .into());
        }
        // Re-validate in case the caller built the interval by hand.
        let range = RangeInterval::new(range.min, range.max)?;
        Ok(Self {
            azimuth,
            radius,
            poses,
            range,
        })
    }

    /// A scan with no rays.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            azimuth: Vec::new(),
            radius: Vec::new(),
            poses: Poses::Shared(Pose2::identity()),
            range: RangeInterval::unbounded(),
        }
    }

    /// Number of rays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.azimuth.len()
    }

    /// Returns `true` for a scan with no rays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.azimuth.is_empty()
    }

    /// Interval of valid radii.
    #[must_use]
    pub fn range(&self) -> RangeInterval {
        self.range
    }

    /// Sensor-frame azimuths of all rays.
    #[must_use]
    pub fn azimuths(&self) -> &[f64] {
        &self.azimuth
    }

    /// Measured radii of all rays.
    #[must_use]
    pub fn radii(&self) -> &[f64] {
        &self.radius
    }

    /// Sensor-frame azimuth of ray `i`.
    #[must_use]
    pub fn azimuth(&self, i: usize) -> f64 {
        self.azimuth[i]
    }

    /// Measured radius of ray `i`.
    #[must_use]
    pub fn radius(&self, i: usize) -> f64 {
        self.radius[i]
    }

    /// Sensor pose of ray `i`.
    #[must_use]
    pub fn pose(&self, i: usize) -> Pose2 {
        match &self.poses {
            Poses::Shared(p) => *p,
            Poses::PerRay(ps) => ps[i],
        }
    }

    /// Whether all rays share one pose.
    #[must_use]
    pub fn has_shared_pose(&self) -> bool {
        matches!(self.poses, Poses::Shared(_))
    }

    /// World angle of ray `i`.
    #[must_use]
    pub fn angle(&self, i: usize) -> f64 {
        self.pose(i).world_angle(self.azimuth[i])
    }

    /// Start point (sensor position) of ray `i`.
    #[must_use]
    pub fn start(&self, i: usize) -> Point2 {
        self.pose(i).position
    }

    /// Unit direction of ray `i`.
    #[must_use]
    pub fn direction(&self, i: usize) -> Vector2 {
        let a = self.angle(i);
        Vector2::new(a.cos(), a.sin())
    }

    /// Cartesian endpoint of ray `i`; `NaN` when its radius is not finite.
    #[must_use]
    pub fn endpoint(&self, i: usize) -> Point2 {
        let r = self.radius[i];
        if r.is_finite() {
            self.pose(i).project(self.azimuth[i], r)
        } else {
            nan_point()
        }
    }

    /// Whether ray `i` measured a radius inside the valid interval.
    #[must_use]
    pub fn is_returned(&self, i: usize) -> bool {
        self.range.contains(self.radius[i])
    }

    /// Per-ray [`Self::is_returned`] flags.
    #[must_use]
    pub fn returned_mask(&self) -> Vec<bool> {
        (0..self.len()).map(|i| self.is_returned(i)).collect()
    }

    /// Endpoints of all rays, `NaN` where there is no return.
    #[must_use]
    pub fn endpoints(&self) -> Vec<Point2> {
        (0..self.len()).map(|i| self.endpoint(i)).collect()
    }

    /// Endpoints of returned rays, in ray order.
    #[must_use]
    pub fn returned_endpoints(&self) -> Vec<Point2> {
        (0..self.len())
            .filter(|&i| self.is_returned(i))
            .map(|i| self.endpoint(i))
            .collect()
    }

    /// Ray indices sorted by azimuth; equal azimuths keep ray order.
    #[must_use]
    pub fn angular_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.azimuth[a].total_cmp(&self.azimuth[b]));
        order
    }

    /// A new scan made of the rays at `indices`, in that order.
    ///
    /// # Errors
    ///
    /// Returns `InputError::IndexOutOfRange` for an index past the last ray.
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        let len = self.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(InputError::IndexOutOfRange {
                what: "ray",
                index,
                len,
            }
            .into());
        }
        let poses = match &self.poses {
            Poses::Shared(p) => Poses::Shared(*p),
            Poses::PerRay(ps) => Poses::PerRay(indices.iter().map(|&i| ps[i]).collect()),
        };
        Ok(Self {
            azimuth: indices.iter().map(|&i| self.azimuth[i]).collect(),
            radius: indices.iter().map(|&i| self.radius[i]).collect(),
            poses,
            range: self.range,
        })
    }

    /// Copy of this scan with its radii replaced.
    ///
    /// # Errors
    ///
    /// Returns `InputError::LengthMismatch` if `radius` has the wrong length.
    pub fn with_radii(&self, radius: Vec<f64>) -> Result<Self> {
        if radius.len() != self.len() {
            return Err(InputError::LengthMismatch {
                what: "radius",
                expected: self.len(),
                actual: radius.len(),
            }
            .into());
        }
        Ok(Self {
            radius,
            ..self.clone()
        })
    }
}
