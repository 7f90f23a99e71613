//! Continuous refinement of pruned chains in sensor-polar coordinates.

use tracing::{debug, trace};

use super::topology::{Chain, RayTable};
use crate::error::Result;
use crate::geometry::{Element, LineMap};
use crate::math::angle::angle_diff;
use crate::math::nelder_mead::{minimize, OptimizerOptions};
use crate::math::{Point2, Vector2};
use crate::operations::intersect::IntersectOptions;
use crate::operations::query::ScanResidual;
use crate::scan::Scan;

/// Initial simplex step along a vertex's bearing, in radians.
const ANGLE_STEP: f64 = 1e-2;
/// Initial simplex step along a vertex's range, relative to the range.
const RADIUS_STEP: f64 = 1e-2;

/// How one vertex maps to optimizer parameters.
#[derive(Debug, Clone, Copy)]
struct PolarVertex {
    origin: Point2,
    /// World angle of the vertex's own ray.
    angle: f64,
    /// Whether the vertex may leave its ray.
    free: bool,
}

impl PolarVertex {
    fn dims(self) -> usize {
        if self.free {
            2
        } else {
            1
        }
    }

    fn point(self, offset: f64, radius: f64) -> Point2 {
        let a = self.angle + offset;
        self.origin + radius * Vector2::new(a.cos(), a.sin())
    }
}

/// Parameterization of one chain: open-chain ends slide along their own ray,
/// every other vertex moves in bearing and range.
struct PolarChain {
    vertices: Vec<PolarVertex>,
    closed: bool,
}

impl PolarChain {
    fn new(chain: &Chain, rays: &RayTable) -> Self {
        let m = chain.positions.len();
        let vertices = chain
            .positions
            .iter()
            .enumerate()
            .map(|(k, &pos)| PolarVertex {
                origin: rays.start[pos],
                angle: rays.angle[pos],
                free: chain.closed || (k > 0 && k + 1 < m),
            })
            .collect();
        Self {
            vertices,
            closed: chain.closed,
        }
    }

    /// Parameters and simplex steps reproducing `points`.
    fn encode(&self, points: &[Point2]) -> (Vec<f64>, Vec<f64>) {
        let mut x = Vec::new();
        let mut steps = Vec::new();
        for (v, p) in self.vertices.iter().zip(points) {
            let d = p - v.origin;
            let radius = d.norm();
            if v.free {
                x.push(angle_diff(v.angle, d.y.atan2(d.x)));
                steps.push(ANGLE_STEP);
            }
            x.push(radius);
            steps.push(RADIUS_STEP * radius.max(1.0));
        }
        (x, steps)
    }

    fn decode(&self, x: &[f64]) -> Element {
        let mut k = 0;
        let points = self
            .vertices
            .iter()
            .map(|v| {
                let p = if v.free {
                    v.point(x[k], x[k + 1])
                } else {
                    v.point(0.0, x[k])
                };
                k += v.dims();
                p
            })
            .collect();
        Element::new(points, self.closed)
    }
}

/// Settings shared by every chain refinement.
pub(crate) struct Refiner<'a> {
    pub scan: &'a Scan,
    pub rays: &'a RayTable,
    pub penalty: f64,
    pub intersect: IntersectOptions,
    pub optimizer: OptimizerOptions,
}

impl Refiner<'_> {
    fn total_residual(&self, scan: &Scan, map: &LineMap) -> f64 {
        ScanResidual::new(scan, map)
            .with_penalty(self.penalty)
            .with_intersect_options(self.intersect)
            .execute()
            .map_or(f64::INFINITY, |s| s.total)
    }

    /// Refines each chain's element in place and returns the scan's total
    /// residual against the result.
    ///
    /// A refined element replaces the unrefined one only if the residual of the
    /// whole map does not grow.
    ///
    /// # Errors
    ///
    /// Returns an error if a chain refers to rays outside the scan.
    pub fn refine(&self, chains: &[Chain], elements: &mut [Element]) -> Result<f64> {
        let mut current =
            self.total_residual(self.scan, &LineMap::from_elements(elements.to_vec()));

        for (e, chain) in chains.iter().enumerate() {
            if chain.positions.len() < 2 {
                continue;
            }
            let owned: Vec<usize> = chain
                .owned_positions(self.rays)
                .into_iter()
                .map(|pos| self.rays.order[pos])
                .collect();
            let subscan = self.scan.subset(&owned)?;
            let polar = PolarChain::new(chain, self.rays);
            let (x0, steps) = polar.encode(elements[e].vertices());

            let best = minimize(
                |x| self.total_residual(&subscan, &LineMap::from(polar.decode(x))),
                &x0,
                &steps,
                &self.optimizer,
            );

            let mut candidate = elements.to_vec();
            candidate[e] = polar.decode(&best.x);
            let total = self.total_residual(self.scan, &LineMap::from_elements(candidate));
            trace!(
                element = e,
                iterations = best.iterations,
                converged = best.converged,
                local = best.value,
                total,
                "refined element"
            );
            if total <= current {
                elements[e] = polar.decode(&best.x);
                current = total;
            }
        }

        debug!(elements = elements.len(), residual = current, "refinement finished");
        Ok(current)
    }
}
