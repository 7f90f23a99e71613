//! Split-and-merge line extraction and its refit-free variant, iterative
//! endpoint fit.

mod refit;
mod store;

pub use refit::{refit_line, squared_residual};
pub use store::{LineId, LineRecord, LineStore};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{InputError, Result};
use crate::geometry::{Element, LineMap};
use crate::math::distance_2d::point_to_line_dist;
use crate::math::nelder_mead::OptimizerOptions;
use crate::math::{is_finite_point, Point2, TOLERANCE};

/// Options for [`SplitAndMerge`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitMergeOptions {
    /// Perpendicular distance below which points count as lying on a line.
    pub distance_threshold: f64,
    /// Vertex count to reach. With a target the merge phase runs in count
    /// mode, merging until the chain has at most this many vertices.
    pub target_vertices: Option<usize>,
    /// Lines covering fewer points than this are dropped from the output.
    pub min_points: usize,
    /// Least-squares refit of every new line. Disabling it also disables the
    /// merge phase.
    pub refit: bool,
    /// Stopping rules of the line refit.
    pub optimizer: OptimizerOptions,
}

impl Default for SplitMergeOptions {
    fn default() -> Self {
        Self {
            distance_threshold: 0.1,
            target_vertices: None,
            min_points: 0,
            refit: true,
            optimizer: OptimizerOptions {
                x_tolerance: 1e-6,
                f_tolerance: 1e-9,
                max_iterations_per_dim: 200,
            },
        }
    }
}

impl SplitMergeOptions {
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` for a negative or NaN threshold, a
    /// target below two vertices, or invalid optimizer tolerances.
    pub fn validate(&self) -> std::result::Result<(), InputError> {
        if self.distance_threshold.is_nan() || self.distance_threshold < 0.0 {
            return Err(InputError::option(
                "distance_threshold",
                "must be a non-negative distance",
            ));
        }
        if matches!(self.target_vertices, Some(n) if n < 2) {
            return Err(InputError::option(
                "target_vertices",
                "must be at least 2",
            ));
        }
        self.optimizer.validate()
    }
}

/// Segments an ordered run of scan points into polylines.
///
/// Starting from one line over all points, the line covering the point
/// farthest from it is split there until every point lies within the
/// distance threshold (and any vertex target is met). With refit enabled,
/// adjacent lines are then merged back while the shared boundary point lies
/// close to the merged line, or while the chain has more vertices than the
/// target. Output vertices are always input points.
#[derive(Debug)]
pub struct SplitAndMerge {
    points: Vec<Point2>,
    options: SplitMergeOptions,
}

impl SplitAndMerge {
    /// Creates a split-and-merge operation with default options.
    #[must_use]
    pub fn new(points: Vec<Point2>) -> Self {
        Self {
            points,
            options: SplitMergeOptions::default(),
        }
    }

    /// Creates an iterative endpoint fit: split-and-merge without refit.
    #[must_use]
    pub fn iterative_endpoint_fit(points: Vec<Point2>) -> Self {
        Self::new(points).with_options(SplitMergeOptions {
            refit: false,
            ..SplitMergeOptions::default()
        })
    }

    /// Sets custom segmentation options.
    #[must_use]
    pub fn with_options(mut self, options: SplitMergeOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the segmentation.
    ///
    /// # Errors
    ///
    /// - `InputError::InvalidOption` if the options are invalid
    /// - `InputError::NonFinite` if a point has a non-finite coordinate
    pub fn execute(&self) -> Result<LineMap> {
        self.options.validate()?;
        if let Some(index) = self.points.iter().position(|p| !is_finite_point(p)) {
            return Err(InputError::NonFinite {
                what: "point",
                index,
            }
            .into());
        }

        match self.points.len() {
            0 => return Ok(LineMap::new()),
            1 => return Ok(LineMap::from(Element::Polyline(self.points.clone()))),
            _ => {}
        }

        let mut store = LineStore::new();
        store.push(self.fit(0, self.points.len() - 1));

        let splits = self.split_phase(&mut store);
        let merges = if self.options.refit {
            self.merge_phase(&mut store)
        } else {
            0
        };

        let map = stitch(&self.points, store.iter(), self.options.min_points);
        debug!(
            points = self.points.len(),
            splits,
            merges,
            lines = store.len(),
            elements = map.len(),
            vertices = map.vertex_count(),
            refit = self.options.refit,
            "split-and-merge finished"
        );
        Ok(map)
    }

    fn fit(&self, first: usize, last: usize) -> LineRecord {
        let (start, end) = if self.options.refit {
            refit_line(&self.points[first..=last], &self.options.optimizer)
                .unwrap_or((self.points[first], self.points[last]))
        } else {
            (self.points[first], self.points[last])
        };
        LineRecord {
            first,
            last,
            start,
            end,
        }
    }

    /// Position of the covering record, the point index and its distance for
    /// the interior point farthest from its line. Ties keep the lowest index.
    fn farthest_point(&self, store: &LineStore) -> Option<(usize, usize, f64)> {
        let mut best: Option<(usize, usize, f64)> = None;
        for (pos, rec) in store.iter().enumerate() {
            for k in rec.first + 1..rec.last {
                let d = point_to_line_dist(&self.points[k], &rec.start, &rec.end);
                if best.is_none_or(|(_, _, bd)| d > bd) {
                    best = Some((pos, k, d));
                }
            }
        }
        best
    }

    fn split_phase(&self, store: &mut LineStore) -> usize {
        let mut splits = 0;
        while let Some((pos, k, d)) = self.farthest_point(store) {
            let target_met = self
                .options
                .target_vertices
                .is_none_or(|n| store.vertex_count() >= n);
            if d < self.options.distance_threshold && target_met {
                break;
            }
            let Some(rec) = store.at(pos).copied() else {
                break;
            };
            store.split(pos, self.fit(rec.first, k), self.fit(k, rec.last));
            splits += 1;
            trace!(index = k, distance = d, "split line");
        }
        splits
    }

    /// Position of the left record and the merge distance for the boundary
    /// whose point lies closest to the merged line.
    fn closest_boundary(&self, store: &LineStore) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for pos in 0..store.len().saturating_sub(1) {
            let (Some(left), Some(right)) = (store.at(pos), store.at(pos + 1)) else {
                continue;
            };
            let d = point_to_line_dist(&self.points[left.last], &left.start, &right.end);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((pos, d));
            }
        }
        best
    }

    fn merge_phase(&self, store: &mut LineStore) -> usize {
        let mut merges = 0;
        while let Some((pos, d)) = self.closest_boundary(store) {
            let merge = match self.options.target_vertices {
                None => d < self.options.distance_threshold,
                Some(n) => store.vertex_count() > n,
            };
            if !merge {
                break;
            }
            let (Some(left), Some(right)) = (store.at(pos).copied(), store.at(pos + 1).copied())
            else {
                break;
            };
            store.merge(pos, self.fit(left.first, right.last));
            merges += 1;
            trace!(index = left.last, distance = d, "merged lines");
        }
        merges
    }
}

/// Joins the kept records into polylines through their boundary points.
///
/// Records covering fewer than `min_points` points are dropped; a new
/// polyline starts wherever consecutive kept records do not touch.
fn stitch<'a>(
    points: &[Point2],
    records: impl Iterator<Item = &'a LineRecord>,
    min_points: usize,
) -> LineMap {
    let mut map = LineMap::new();
    let mut current: Vec<Point2> = Vec::new();

    for rec in records.filter(|r| r.span() >= min_points) {
        let (a, b) = (points[rec.first], points[rec.last]);
        match current.last() {
            Some(tail) if (tail - a).norm() <= TOLERANCE => current.push(b),
            Some(_) => {
                map.push(Element::Polyline(std::mem::take(&mut current)));
                current.extend([a, b]);
            }
            None => current.extend([a, b]),
        }
    }
    if !current.is_empty() {
        map.push(Element::Polyline(current));
    }
    map
}
