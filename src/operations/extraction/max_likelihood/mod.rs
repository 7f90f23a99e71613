//! Maximum-likelihood polyline extraction.
//!
//! The scan's own endpoints, joined in angular order, form a map that
//! reproduces every measured radius. Vertices are then pruned greedily by
//! how little their removal raises the squared radial residual, and the
//! survivors are optionally refined by a simplex search over their polar
//! coordinates.

mod pruning;
mod refine;
mod topology;

use serde::{Deserialize, Serialize};
use tracing::debug;

use self::pruning::Pruner;
use self::refine::Refiner;
use self::topology::{initial_chains, RayTable};
use crate::error::{InputError, Result};
use crate::geometry::{Element, LineMap};
use crate::math::nelder_mead::OptimizerOptions;
use crate::operations::intersect::IntersectOptions;
use crate::operations::query::ScanResidual;
use crate::scan::Scan;

/// Options for [`MaxLikelihoodExtraction`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxLikelihoodOptions {
    /// Edges of the initial map longer than this are cut.
    pub max_edge_length: f64,
    /// Pruning stops once the cheapest removal raises the residual by more
    /// than this.
    pub max_error: f64,
    /// Pruning stops once the map has this many vertices.
    pub target_vertices: usize,
    /// Residual charged to a ray the map fails to explain.
    pub no_return_penalty: f64,
    /// Refine the pruned vertices continuously.
    pub optimize: bool,
    pub optimizer: OptimizerOptions,
    pub intersect: IntersectOptions,
}

impl Default for MaxLikelihoodOptions {
    fn default() -> Self {
        Self {
            max_edge_length: f64::INFINITY,
            max_error: 1e-2,
            target_vertices: 0,
            no_return_penalty: 1.0,
            optimize: true,
            optimizer: OptimizerOptions::default(),
            intersect: IntersectOptions::default(),
        }
    }
}

impl MaxLikelihoodOptions {
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` naming the first offending field.
    pub fn validate(&self) -> std::result::Result<(), InputError> {
        if self.max_edge_length.is_nan() || self.max_edge_length <= 0.0 {
            return Err(InputError::option(
                "max_edge_length",
                "must be a positive length",
            ));
        }
        if self.max_error.is_nan() || self.max_error < 0.0 {
            return Err(InputError::option("max_error", "must be non-negative"));
        }
        if !self.no_return_penalty.is_finite() || self.no_return_penalty < 0.0 {
            return Err(InputError::option(
                "no_return_penalty",
                "must be finite and non-negative",
            ));
        }
        self.optimizer.validate()?;
        self.intersect.validate()
    }
}

/// Extraction result with pruning and refinement statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub map: LineMap,
    /// Vertices in the map built from the scan endpoints.
    pub initial_vertices: usize,
    /// Vertices removed by pruning, including those of dropped elements.
    pub removed_vertices: usize,
    /// Total squared residual of the scan against the pruned map.
    pub pruned_residual: f64,
    /// Total squared residual after refinement, if it ran.
    pub optimized_residual: Option<f64>,
}

/// Extracts a polygon or polylines that best explain a scan.
///
/// The result is one polygon when the scan closes a full turn without
/// missing returns or overlong edges, and polylines otherwise. Removing a
/// vertex from a two-vertex polyline or a triangle drops the element whole.
#[derive(Debug)]
pub struct MaxLikelihoodExtraction<'a> {
    scan: &'a Scan,
    options: MaxLikelihoodOptions,
}

impl<'a> MaxLikelihoodExtraction<'a> {
    /// Creates an extraction with default options.
    #[must_use]
    pub fn new(scan: &'a Scan) -> Self {
        Self {
            scan,
            options: MaxLikelihoodOptions::default(),
        }
    }

    /// Sets custom extraction options.
    #[must_use]
    pub fn with_options(mut self, options: MaxLikelihoodOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the extraction.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` if the options are invalid.
    pub fn execute(&self) -> Result<LineMap> {
        self.execute_with_report().map(|report| report.map)
    }

    /// Executes the extraction and reports how the map was reached.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` if the options are invalid.
    pub fn execute_with_report(&self) -> Result<ExtractionReport> {
        self.options.validate()?;
        let opts = &self.options;

        let rays = RayTable::new(self.scan);
        let closed = rays.is_closed_loop();
        let chains = initial_chains(&rays, closed, opts.max_edge_length);

        let pruner = Pruner::new(&rays, &chains, opts.no_return_penalty, opts.intersect);
        let initial_vertices = pruner.vertex_count();
        debug!(
            rays = rays.len(),
            closed,
            elements = chains.len(),
            vertices = initial_vertices,
            "built initial chains"
        );
        let pruned = pruner.run(opts.target_vertices, opts.max_error);

        let mut elements: Vec<Element> =
            pruned.chains.iter().map(|c| c.to_element(&rays)).collect();
        let pruned_map = LineMap::from_elements(elements.clone());
        let pruned_residual = ScanResidual::new(self.scan, &pruned_map)
            .with_penalty(opts.no_return_penalty)
            .with_intersect_options(opts.intersect)
            .execute()?
            .total;

        let optimized_residual = if opts.optimize {
            let refiner = Refiner {
                scan: self.scan,
                rays: &rays,
                penalty: opts.no_return_penalty,
                intersect: opts.intersect,
                optimizer: opts.optimizer,
            };
            Some(refiner.refine(&pruned.chains, &mut elements)?)
        } else {
            None
        };

        let mut map = LineMap::from_elements(elements);
        map.retain_valid();
        debug!(
            elements = map.len(),
            vertices = map.vertex_count(),
            removed = pruned.removed,
            pruned_residual,
            ?optimized_residual,
            "maximum-likelihood extraction finished"
        );

        Ok(ExtractionReport {
            map,
            initial_vertices,
            removed_vertices: pruned.removed,
            pruned_residual,
            optimized_residual,
        })
    }
}
