//! Initial vertex chains: scan endpoints joined in angular order.

use std::f64::consts::TAU;

use crate::geometry::{Element, Segment};
use crate::math::Point2;
use crate::operations::intersect::{cast_ray, IntersectOptions};
use crate::operations::query::ray_residual;
use crate::scan::Scan;

/// The wrap-around gap may exceed the widest interior gap by this factor and
/// still close the loop.
const CLOSING_GAP_FACTOR: f64 = 1.5;

/// Scan rays re-indexed by angular position.
#[derive(Debug)]
pub(crate) struct RayTable {
    /// Scan ray index at each angular position.
    pub order: Vec<usize>,
    pub azimuth: Vec<f64>,
    pub start: Vec<Point2>,
    pub angle: Vec<f64>,
    pub radius: Vec<f64>,
    pub returned: Vec<bool>,
    pub endpoint: Vec<Point2>,
}

impl RayTable {
    /// Indexes the rays of `scan` by azimuth.
    pub fn new(scan: &Scan) -> Self {
        let order = scan.angular_order();
        Self {
            azimuth: order.iter().map(|&i| scan.azimuth(i)).collect(),
            start: order.iter().map(|&i| scan.start(i)).collect(),
            angle: order.iter().map(|&i| scan.angle(i)).collect(),
            radius: order.iter().map(|&i| scan.radius(i)).collect(),
            returned: order.iter().map(|&i| scan.is_returned(i)).collect(),
            endpoint: order.iter().map(|&i| scan.endpoint(i)).collect(),
            order,
        }
    }

    /// Number of rays.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the rays sweep a full turn with no gap wider than the
    /// sampling.
    pub fn is_closed_loop(&self) -> bool {
        let n = self.len();
        if n < 3 {
            return false;
        }
        let widest = self
            .azimuth
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(0.0, f64::max);
        let wrap = self.azimuth[0] + TAU - self.azimuth[n - 1];
        wrap <= CLOSING_GAP_FACTOR * widest
    }

    /// Distance along the ray at `pos` to the first admitted segment.
    pub fn cast(&self, pos: usize, segments: &[Segment], options: &IntersectOptions) -> Option<f64> {
        cast_ray(&self.start[pos], self.angle[pos], segments, options).map(|(_, d)| d)
    }

    /// Squared residual of the ray at `pos` for a map hit at `hit`.
    pub fn residual(&self, pos: usize, hit: Option<f64>, penalty: f64) -> f64 {
        ray_residual(self.returned[pos], self.radius[pos], hit, penalty)
    }

    /// Positions strictly between `from` and `to`, walking forward and
    /// wrapping. Equal positions yield every other position.
    pub fn between(&self, from: usize, to: usize) -> impl Iterator<Item = usize> {
        let n = self.len();
        let gap = match (to + n - from) % n {
            0 => n,
            g => g,
        };
        (1..gap).map(move |k| (from + k) % n)
    }
}

/// A run of vertices, each sitting on the endpoint of the ray at its
/// angular position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Chain {
    pub positions: Vec<usize>,
    pub closed: bool,
}

impl Chain {
    fn open(positions: Vec<usize>) -> Self {
        Self {
            positions,
            closed: false,
        }
    }

    /// Polygon or polyline through the chain's ray endpoints.
    pub fn to_element(&self, rays: &RayTable) -> Element {
        let vertices = self.positions.iter().map(|&p| rays.endpoint[p]).collect();
        Element::new(vertices, self.closed)
    }

    /// Angular positions whose rays this chain accounts for: every position
    /// of a closed chain, or the span from first to last vertex of an open
    /// one.
    pub fn owned_positions(&self, rays: &RayTable) -> Vec<usize> {
        let (Some(&first), Some(&last)) = (self.positions.first(), self.positions.last()) else {
            return Vec::new();
        };
        if self.closed {
            let n = rays.len();
            return (0..n).map(|k| (first + k) % n).collect();
        }
        if first == last {
            return vec![first];
        }
        std::iter::once(first)
            .chain(rays.between(first, last))
            .chain(std::iter::once(last))
            .collect()
    }
}

/// Connects returned endpoints in angular order.
///
/// No-return rays break the sequence; a closed loop with no breaks becomes
/// one polygon. Edges longer than `max_edge_length` cut their chain.
pub(crate) fn initial_chains(rays: &RayTable, closed: bool, max_edge_length: f64) -> Vec<Chain> {
    let n = rays.len();
    if n == 0 {
        return Vec::new();
    }

    let mut runs = Vec::new();
    if closed && rays.returned.iter().all(|&r| r) {
        runs.push(Chain {
            positions: (0..n).collect(),
            closed: true,
        });
    } else {
        // Start after a break so a run crossing the wrap stays whole.
        let offset = if closed {
            rays.returned.iter().position(|r| !r).map_or(0, |k| k + 1)
        } else {
            0
        };
        let mut current = Vec::new();
        for step in 0..n {
            let pos = (offset + step) % n;
            if rays.returned[pos] {
                current.push(pos);
            } else if !current.is_empty() {
                runs.push(Chain::open(std::mem::take(&mut current)));
            }
        }
        if !current.is_empty() {
            runs.push(Chain::open(current));
        }
    }

    runs.into_iter()
        .flat_map(|chain| cut_long_edges(chain, rays, max_edge_length))
        .collect()
}

fn cut_long_edges(chain: Chain, rays: &RayTable, max_edge_length: f64) -> Vec<Chain> {
    let long = |a: usize, b: usize| (rays.endpoint[b] - rays.endpoint[a]).norm() > max_edge_length;

    let mut positions = chain.positions;
    if chain.closed {
        let m = positions.len();
        let Some(cut) = (0..m).find(|&i| long(positions[i], positions[(i + 1) % m])) else {
            return vec![Chain {
                positions,
                closed: true,
            }];
        };
        // The long edge becomes the implicit gap between last and first.
        positions.rotate_left(cut + 1);
    }

    let mut out = Vec::new();
    let mut current: Vec<usize> = Vec::with_capacity(positions.len());
    for &pos in &positions {
        if let Some(&tail) = current.last() {
            if long(tail, pos) {
                out.push(Chain::open(std::mem::take(&mut current)));
            }
        }
        current.push(pos);
    }
    if !current.is_empty() {
        out.push(Chain::open(current));
    }
    out
}
