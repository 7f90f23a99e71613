//! Derivative-free Nelder–Mead simplex minimizer.
//!
//! Used to refine line fits and vertex positions where the objective is a sum
//! of ray residuals with no convenient gradient.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Stopping rules for [`minimize`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerOptions {
    /// Stop once every simplex vertex lies within this infinity-norm distance
    /// of the best vertex (and the value spread is within `f_tolerance`).
    pub x_tolerance: f64,
    /// Stop once every simplex value lies within this of the best value.
    pub f_tolerance: f64,
    /// Iteration budget per parameter dimension.
    pub max_iterations_per_dim: usize,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            x_tolerance: 1e-2,
            f_tolerance: 1e-2,
            max_iterations_per_dim: 200,
        }
    }
}

impl OptimizerOptions {
    /// Checks that tolerances are positive and the budget non-zero.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` naming the first offending field.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.x_tolerance.is_nan() || self.x_tolerance <= 0.0 {
            return Err(InputError::option("x_tolerance", "must be positive"));
        }
        if self.f_tolerance.is_nan() || self.f_tolerance <= 0.0 {
            return Err(InputError::option("f_tolerance", "must be positive"));
        }
        if self.max_iterations_per_dim == 0 {
            return Err(InputError::option(
                "max_iterations_per_dim",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Result of a minimization run.
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Best parameter vector found.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub value: f64,
    /// Number of simplex iterations performed.
    pub iterations: usize,
    /// Whether the tolerances were met before the budget ran out.
    pub converged: bool,
}

/// Minimizes `f` starting from `x0`.
///
/// The initial simplex is `x0` plus one vertex per axis offset by `steps[i]`.
/// Non-finite objective values are treated as `+∞`. The returned value is
/// never worse than `f(x0)`. Missing `steps` entries default to a unit step.
pub fn minimize<F>(mut f: F, x0: &[f64], steps: &[f64], options: &OptimizerOptions) -> Minimum
where
    F: FnMut(&[f64]) -> f64,
{
    let mut eval = |x: &[f64]| {
        let v = f(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    let n = x0.len();
    let seed_value = eval(x0);
    if n == 0 {
        return Minimum {
            x: Vec::new(),
            value: seed_value,
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((x0.to_vec(), seed_value));
    for i in 0..n {
        let mut x = x0.to_vec();
        let step = steps.get(i).copied().unwrap_or(1.0);
        x[i] += if step.abs() < f64::EPSILON { 1e-3 } else { step };
        let v = eval(&x);
        simplex.push((x, v));
    }

    let max_iterations = options.max_iterations_per_dim.saturating_mul(n);
    let mut iterations = 0;
    let mut converged = false;

    loop {
        // Stable sort keeps the earlier vertex on ties, so the seed is only
        // displaced by a strictly better point.
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

        if has_converged(&simplex, options) {
            converged = true;
            break;
        }
        if iterations >= max_iterations {
            break;
        }
        iterations += 1;

        let centroid = centroid_without_worst(&simplex);
        let best = simplex[0].1;
        let second_worst = simplex[n - 1].1;
        let (worst_x, worst) = simplex[n].clone();

        let reflected = along(&centroid, &worst_x, -REFLECTION);
        let fr = eval(&reflected);

        if fr < best {
            let expanded = along(&centroid, &worst_x, -EXPANSION);
            let fe = eval(&expanded);
            simplex[n] = if fe < fr {
                (expanded, fe)
            } else {
                (reflected, fr)
            };
            continue;
        }
        if fr < second_worst {
            simplex[n] = (reflected, fr);
            continue;
        }

        let accepted = if fr < worst {
            let outside = along(&centroid, &reflected, CONTRACTION);
            let fc = eval(&outside);
            (fc <= fr).then_some((outside, fc))
        } else {
            let inside = along(&centroid, &worst_x, CONTRACTION);
            let fc = eval(&inside);
            (fc < worst).then_some((inside, fc))
        };

        if let Some(vertex) = accepted {
            simplex[n] = vertex;
        } else {
            let best_x = simplex[0].0.clone();
            for vertex in simplex.iter_mut().skip(1) {
                vertex.0 = along(&best_x, &vertex.0, SHRINK);
                vertex.1 = eval(&vertex.0);
            }
        }
    }

    let (x, value) = simplex.swap_remove(0);
    Minimum {
        x,
        value,
        iterations,
        converged,
    }
}

/// `from + t * (to - from)`.
fn along(from: &[f64], to: &[f64], t: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(a, b)| a + t * (b - a)).collect()
}

fn centroid_without_worst(simplex: &[(Vec<f64>, f64)]) -> Vec<f64> {
    let n = simplex.len() - 1;
    let mut c = vec![0.0; simplex[0].0.len()];
    for (x, _) in &simplex[..n] {
        for (ci, xi) in c.iter_mut().zip(x) {
            *ci += xi;
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let inv = 1.0 / n as f64;
    for ci in &mut c {
        *ci *= inv;
    }
    c
}

fn has_converged(simplex: &[(Vec<f64>, f64)], options: &OptimizerOptions) -> bool {
    let (best_x, best) = &simplex[0];
    if !best.is_finite() {
        return false;
    }
    simplex.iter().skip(1).all(|(x, v)| {
        (v - best).abs() <= options.f_tolerance
            && x
                .iter()
                .zip(best_x)
                .all(|(a, b)| (a - b).abs() <= options.x_tolerance)
    })
}
