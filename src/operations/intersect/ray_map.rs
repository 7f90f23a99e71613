use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InputError, Result};
use crate::geometry::{LineMap, Segment};
use crate::math::intersect_2d::{ray_segment_distance, RAY_ANGLE_TOLERANCE};
use crate::math::Point2;
use crate::scan::Scan;

/// Which candidate a ray keeps when several segments admit it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitPolicy {
    /// Keep the first finite hit in map order; later segments never overwrite
    /// it, even with a shorter distance.
    #[default]
    First,
    /// Keep the shortest finite hit over all segments.
    Nearest,
}

impl HitPolicy {
    fn accepts(self, current: f64, candidate: f64) -> bool {
        if !(candidate.is_finite() && candidate > 0.0) {
            return false;
        }
        match self {
            Self::First => !current.is_finite(),
            Self::Nearest => candidate < current,
        }
    }
}

/// Options for [`IntersectRaysWithMap`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectOptions {
    /// Angular slack (radians) admitting rays just outside a segment's bracket.
    pub angle_tolerance: f64,
    pub hit_policy: HitPolicy,
}

impl Default for IntersectOptions {
    fn default() -> Self {
        Self {
            angle_tolerance: RAY_ANGLE_TOLERANCE,
            hit_policy: HitPolicy::First,
        }
    }
}

impl IntersectOptions {
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` for a negative or NaN tolerance.
    pub fn validate(&self) -> std::result::Result<(), InputError> {
        if self.angle_tolerance.is_nan() || self.angle_tolerance < 0.0 {
            return Err(InputError::option(
                "angle_tolerance",
                "must be a non-negative angle",
            ));
        }
        Ok(())
    }
}

/// Per-ray intersection results.
#[derive(Debug, Clone, PartialEq)]
pub struct RayHits {
    /// Distance from each ray's start to its hit, `+∞` for no hit.
    pub distance: Vec<f64>,
    /// Index of the map element hit.
    pub element: Vec<Option<usize>>,
    /// Index of the segment within that element.
    pub segment: Vec<Option<usize>>,
}

impl RayHits {
    /// Results for `n` rays that hit nothing.
    #[must_use]
    pub fn none(n: usize) -> Self {
        Self {
            distance: vec![f64::INFINITY; n],
            element: vec![None; n],
            segment: vec![None; n],
        }
    }

    /// Number of rays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.distance.len()
    }

    /// Returns `true` for a result with no rays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.distance.is_empty()
    }

    /// Whether ray `i` hit the map.
    #[must_use]
    pub fn is_hit(&self, i: usize) -> bool {
        self.distance[i].is_finite()
    }

    /// Number of rays that hit the map.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.distance.iter().filter(|d| d.is_finite()).count()
    }
}

/// Intersects every ray of a scan with every segment of a map.
///
/// A ray is tested against a segment only when its world angle lies between
/// the bearings of the segment's endpoints, as seen from the ray's start.
/// Parallel or degenerate pairs are skipped. With [`HitPolicy::First`] a ray
/// keeps the first hit found while walking elements and segments in order;
/// this is not necessarily the nearest when segments overlap in angle.
#[derive(Debug)]
pub struct IntersectRaysWithMap<'a> {
    scan: &'a Scan,
    map: &'a LineMap,
    options: IntersectOptions,
}

impl<'a> IntersectRaysWithMap<'a> {
    /// Creates a new intersection query with default options.
    #[must_use]
    pub fn new(scan: &'a Scan, map: &'a LineMap) -> Self {
        Self {
            scan,
            map,
            options: IntersectOptions::default(),
        }
    }

    /// Sets custom intersection options.
    #[must_use]
    pub fn with_options(mut self, options: IntersectOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` if the options are invalid.
    pub fn execute(&self) -> Result<RayHits> {
        self.options.validate()?;

        let n = self.scan.len();
        let mut hits = RayHits::none(n);
        if n == 0 || self.map.is_empty() {
            return Ok(hits);
        }

        let starts: Vec<Point2> = (0..n).map(|i| self.scan.start(i)).collect();
        let angles: Vec<f64> = (0..n).map(|i| self.scan.angle(i)).collect();

        for (e, element) in self.map.iter().enumerate() {
            for (s, seg) in element.segments().iter().enumerate() {
                for i in 0..n {
                    let d = ray_segment_distance(
                        &starts[i],
                        angles[i],
                        &seg.start,
                        &seg.end,
                        self.options.angle_tolerance,
                    );
                    if self.options.hit_policy.accepts(hits.distance[i], d) {
                        hits.distance[i] = d;
                        hits.element[i] = Some(e);
                        hits.segment[i] = Some(s);
                    }
                }
            }
        }

        debug!(
            rays = n,
            segments = self.map.segment_count(),
            hits = hits.hit_count(),
            "intersected rays with map"
        );
        Ok(hits)
    }
}

/// Casts a single ray against `segments` in order.
///
/// Returns the index of the accepted segment and the distance, using the same
/// admission test and hit policy as [`IntersectRaysWithMap`].
#[must_use]
pub fn cast_ray(
    start: &Point2,
    angle: f64,
    segments: &[Segment],
    options: &IntersectOptions,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (s, seg) in segments.iter().enumerate() {
        let d = ray_segment_distance(start, angle, &seg.start, &seg.end, options.angle_tolerance);
        let current = best.map_or(f64::INFINITY, |(_, d)| d);
        if options.hit_policy.accepts(current, d) {
            best = Some((s, d));
        }
    }
    best
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Element;
    use crate::scan::{Pose2, RangeInterval};
    use std::f64::consts::PI;

    fn scan_at(angles: Vec<f64>) -> Scan {
        let n = angles.len();
        Scan::new(angles, vec![1.0; n], Pose2::identity(), RangeInterval::unbounded()).unwrap()
    }

    fn wall(x: f64) -> Element {
        Element::Polyline(vec![Point2::new(x, -5.0), Point2::new(x, 5.0)])
    }

    #[test]
    fn single_vertical_segment() {
        let scan = scan_at(vec![0.0]);
        let map = LineMap::from(wall(5.0));
        let hits = IntersectRaysWithMap::new(&scan, &map).execute().unwrap();
        assert!((hits.distance[0] - 5.0).abs() < 1e-12);
        assert_eq!(hits.element[0], Some(0));
        assert_eq!(hits.segment[0], Some(0));
    }

    #[test]
    fn empty_inputs_give_infinite_distances() {
        let scan = scan_at(vec![0.0, 1.0]);
        let hits = IntersectRaysWithMap::new(&scan, &LineMap::new())
            .execute()
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.distance.iter().all(|d| d.is_infinite()));
        assert!(hits.element.iter().all(Option::is_none));

        let empty = Scan::empty();
        let map = LineMap::from(wall(1.0));
        let hits = IntersectRaysWithMap::new(&empty, &map).execute().unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn parallel_ray_does_not_hit() {
        // The ray runs along the segment's own line.
        let scan = scan_at(vec![0.0]);
        let map = LineMap::from(Element::Polyline(vec![
            Point2::new(1.0, 0.0),
            Point2::new(4.0, 0.0),
        ]));
        let hits = IntersectRaysWithMap::new(&scan, &map).execute().unwrap();
        assert!(!hits.is_hit(0));
        assert_eq!(hits.segment[0], None);
    }

    #[test]
    fn rays_behind_sensor_miss() {
        let scan = scan_at(vec![PI]);
        let map = LineMap::from(wall(5.0));
        let hits = IntersectRaysWithMap::new(&scan, &map).execute().unwrap();
        assert!(!hits.is_hit(0));
    }

    #[test]
    fn square_room_from_center() {
        let angles: Vec<f64> = (0..8).map(|k| f64::from(k) * PI / 4.0 + 0.1).collect();
        let scan = scan_at(angles);
        let map = LineMap::from(Element::Polygon(vec![
            Point2::new(-2.0, -2.0),
            Point2::new(2.0, -2.0),
            Point2::new(2.0, 2.0),
            Point2::new(-2.0, 2.0),
        ]));
        let hits = IntersectRaysWithMap::new(&scan, &map).execute().unwrap();
        assert_eq!(hits.hit_count(), 8);
        // Ray at 0.1 rad hits the right wall (segment 1).
        assert_eq!(hits.segment[0], Some(1));
        assert!((hits.distance[0] - 2.0 / 0.1_f64.cos()).abs() < 1e-9);
    }

    #[test]
    fn first_policy_keeps_earlier_hit() {
        // Far wall listed before near wall.
        let scan = scan_at(vec![0.0]);
        let map = LineMap::from_elements(vec![wall(8.0), wall(3.0)]);
        let first = IntersectRaysWithMap::new(&scan, &map).execute().unwrap();
        assert!((first.distance[0] - 8.0).abs() < 1e-12);
        assert_eq!(first.element[0], Some(0));

        let nearest = IntersectRaysWithMap::new(&scan, &map)
            .with_options(IntersectOptions {
                hit_policy: HitPolicy::Nearest,
                ..IntersectOptions::default()
            })
            .execute()
            .unwrap();
        assert!((nearest.distance[0] - 3.0).abs() < 1e-12);
        assert_eq!(nearest.element[0], Some(1));
    }

    #[test]
    fn per_ray_poses_use_their_own_start() {
        let scan = Scan::with_poses(
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            vec![Pose2::new(0.0, 0.0, 0.0), Pose2::new(4.0, 0.0, 0.0)],
            RangeInterval::unbounded(),
        )
        .unwrap();
        let map = LineMap::from(wall(5.0));
        let hits = IntersectRaysWithMap::new(&scan, &map).execute().unwrap();
        assert!((hits.distance[0] - 5.0).abs() < 1e-12);
        assert!((hits.distance[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cast_ray_matches_bulk_query() {
        let segs = LineMap::from_elements(vec![wall(8.0), wall(3.0)]).segments();
        let options = IntersectOptions::default();
        let (s, d) = cast_ray(&Point2::origin(), 0.0, &segs, &options).unwrap();
        assert_eq!(s, 0);
        assert!((d - 8.0).abs() < 1e-12);
        assert!(cast_ray(&Point2::origin(), PI, &segs, &options).is_none());
    }

    #[test]
    fn negative_tolerance_rejected() {
        let scan = scan_at(vec![0.0]);
        let map = LineMap::new();
        let result = IntersectRaysWithMap::new(&scan, &map)
            .with_options(IntersectOptions {
                angle_tolerance: -1.0,
                ..IntersectOptions::default()
            })
            .execute();
        assert!(result.is_err());
    }
}
