use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{InputError, Result};
use crate::geometry::{Element, LineMap};
use crate::math::polygon_2d::{triangle_altitude, triangle_area, triangle_length_excess};
use crate::math::Point2;

/// Cost of removing a vertex, measured on the triangle it forms with its
/// two current neighbours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriangleMetric {
    /// Triangle area.
    #[default]
    Area,
    /// Height of the vertex above the line joining its neighbours.
    Altitude,
    /// Length of the two sides through the vertex minus the base.
    LengthExcess,
}

impl TriangleMetric {
    /// Error of removing `vertex` between `prev` and `next`.
    #[must_use]
    pub fn evaluate(self, prev: &Point2, vertex: &Point2, next: &Point2) -> f64 {
        match self {
            Self::Area => triangle_area(prev, vertex, next),
            Self::Altitude => triangle_altitude(prev, vertex, next),
            Self::LengthExcess => triangle_length_excess(prev, vertex, next),
        }
    }
}

/// Options for [`VisvalingamSimplify`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisvalingamOptions {
    pub metric: TriangleMetric,
    /// Removal stops at the first candidate whose error is not below this.
    pub max_error: f64,
    /// Removal stops once the element has this many vertices.
    pub max_vertices: usize,
}

impl Default for VisvalingamOptions {
    fn default() -> Self {
        Self {
            metric: TriangleMetric::Area,
            max_error: f64::INFINITY,
            max_vertices: 10,
        }
    }
}

impl VisvalingamOptions {
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` for a negative or NaN `max_error`.
    pub fn validate(&self) -> std::result::Result<(), InputError> {
        if self.max_error.is_nan() || self.max_error < 0.0 {
            return Err(InputError::option("max_error", "must be non-negative"));
        }
        Ok(())
    }
}

/// Outcome of a simplification.
#[derive(Debug, Clone, PartialEq)]
pub struct Simplification {
    pub element: Element,
    /// Removed vertices, as indices into the input, in removal order.
    pub removed: Vec<usize>,
    /// Error incurred by each removal.
    pub errors: Vec<f64>,
}

/// Greedy perceptual simplification (Visvalingam–Whyatt).
///
/// Repeatedly drops the vertex whose triangle with its current neighbours has
/// the smallest error. Open sequences never lose their endpoints; closed
/// sequences wrap around and never drop below three vertices.
#[derive(Debug)]
pub struct VisvalingamSimplify<'a> {
    element: &'a Element,
    options: VisvalingamOptions,
}

impl<'a> VisvalingamSimplify<'a> {
    /// Creates a simplification of `element` with default options.
    #[must_use]
    pub fn new(element: &'a Element) -> Self {
        Self {
            element,
            options: VisvalingamOptions::default(),
        }
    }

    /// Sets custom simplification options.
    #[must_use]
    pub fn with_options(mut self, options: VisvalingamOptions) -> Self {
        self.options = options;
        self
    }

    /// Simplifies every element of `map` independently.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` if the options are invalid.
    pub fn map(map: &LineMap, options: VisvalingamOptions) -> Result<LineMap> {
        map.iter()
            .map(|e| {
                VisvalingamSimplify::new(e)
                    .with_options(options)
                    .execute()
                    .map(|s| s.element)
            })
            .collect()
    }

    /// Executes the simplification.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` if the options are invalid.
    pub fn execute(&self) -> Result<Simplification> {
        self.options.validate()?;

        let points = self.element.vertices();
        let n = points.len();
        let closed = self.element.is_closed();
        let floor = if closed { 3 } else { 2 };
        let target = self.options.max_vertices.max(floor);

        if n <= target {
            return Ok(Simplification {
                element: self.element.clone(),
                removed: Vec::new(),
                errors: Vec::new(),
            });
        }

        let mut chain = Chain::new(n, closed);
        let mut heap = BinaryHeap::with_capacity(n);
        for i in 0..n {
            if let Some(error) = chain.error(i, points, self.options.metric) {
                heap.push(Candidate {
                    error,
                    index: i,
                    stamp: 0,
                });
            }
        }

        let mut remaining = n;
        let mut removed = Vec::new();
        let mut errors = Vec::new();

        while remaining > target {
            let Some(candidate) = pop_current(&mut heap, &chain) else {
                break;
            };
            // `!(a < b)` also stops on NaN errors.
            if candidate.error.partial_cmp(&self.options.max_error) != Some(Ordering::Less) {
                break;
            }

            let (p, q) = chain.unlink(candidate.index);
            remaining -= 1;
            removed.push(candidate.index);
            errors.push(candidate.error);
            trace!(index = candidate.index, error = candidate.error, "removed vertex");

            for j in [p, q] {
                if let Some(error) = chain.error(j, points, self.options.metric) {
                    chain.stamp[j] += 1;
                    heap.push(Candidate {
                        error,
                        index: j,
                        stamp: chain.stamp[j],
                    });
                }
            }
        }

        let vertices: Vec<Point2> = (0..n)
            .filter(|&i| chain.alive[i])
            .map(|i| points[i])
            .collect();
        debug!(
            input = n,
            output = vertices.len(),
            metric = ?self.options.metric,
            "visvalingam simplification"
        );

        Ok(Simplification {
            element: Element::new(vertices, closed),
            removed,
            errors,
        })
    }
}

/// Doubly linked view over the input vertices.
struct Chain {
    prev: Vec<Option<usize>>,
    next: Vec<Option<usize>>,
    alive: Vec<bool>,
    stamp: Vec<u32>,
}

impl Chain {
    fn new(n: usize, closed: bool) -> Self {
        let prev = (0..n)
            .map(|i| {
                if i > 0 {
                    Some(i - 1)
                } else if closed {
                    Some(n - 1)
                } else {
                    None
                }
            })
            .collect();
        let next = (0..n)
            .map(|i| {
                if i + 1 < n {
                    Some(i + 1)
                } else if closed {
                    Some(0)
                } else {
                    None
                }
            })
            .collect();
        Self {
            prev,
            next,
            alive: vec![true; n],
            stamp: vec![0; n],
        }
    }

    /// Error of removing `i`, or `None` if it is a fixed endpoint.
    fn error(&self, i: usize, points: &[Point2], metric: TriangleMetric) -> Option<f64> {
        let p = self.prev[i]?;
        let q = self.next[i]?;
        Some(metric.evaluate(&points[p], &points[i], &points[q]))
    }

    /// Unlinks an interior vertex and returns its former neighbours.
    fn unlink(&mut self, i: usize) -> (usize, usize) {
        let (Some(p), Some(q)) = (self.prev[i], self.next[i]) else {
            unreachable!("only interior vertices are queued");
        };
        self.next[p] = Some(q);
        self.prev[q] = Some(p);
        self.alive[i] = false;
        (p, q)
    }
}

/// Heap entry; stale once `stamp` falls behind the vertex's current stamp.
struct Candidate {
    error: f64,
    index: usize,
    stamp: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed so the max-heap yields the smallest error, then lowest index.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .error
            .total_cmp(&self.error)
            .then_with(|| other.index.cmp(&self.index))
    }
}

fn pop_current(heap: &mut BinaryHeap<Candidate>, chain: &Chain) -> Option<Candidate> {
    while let Some(c) = heap.pop() {
        if chain.alive[c.index] && chain.stamp[c.index] == c.stamp {
            return Some(c);
        }
    }
    None
}
