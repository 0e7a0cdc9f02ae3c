//! Bounded nonlinear least squares.
//!
//! [`LevenbergMarquardt`] minimises `½‖r(p)‖²` with a central-difference Jacobian and
//! Marquardt's diagonal damping. Box bounds are honoured by clamping every trial point,
//! and the difference stencil steps one-sided next to a bound.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::{WcsError, WcsResult};

const MIN_DIAGONAL: f64 = 1e-12;
const MAX_LAMBDA: f64 = 1e16;
const MIN_LAMBDA: f64 = 1e-15;
const JACOBIAN_STEP: f64 = 1e-7;
const SVD_EPSILON: f64 = 1e-15;

/// A residual vector over a parameter vector.
pub trait Residuals {
    fn num_residuals(&self) -> usize;

    fn evaluate(&self, params: &[f64]) -> WcsResult<Vec<f64>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> WcsResult<Self> {
        if lower.len() != upper.len() {
            return Err(WcsError::invalid_parameter(format!(
                "bounds length mismatch: {} lower, {} upper",
                lower.len(),
                upper.len()
            )));
        }
        if let Some(i) = (0..lower.len()).find(|&i| lower[i].is_nan() || upper[i].is_nan() || lower[i] > upper[i]) {
            return Err(WcsError::invalid_parameter(format!(
                "invalid bound for parameter {i}: [{}, {}]",
                lower[i], upper[i]
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Narrows one parameter to `[lower, upper]`.
    pub fn set(&mut self, index: usize, lower: f64, upper: f64) -> WcsResult<()> {
        if index >= self.lower.len() || lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(WcsError::invalid_parameter(format!(
                "invalid bound for parameter {index}: [{lower}, {upper}]"
            )));
        }
        self.lower[index] = lower;
        self.upper[index] = upper;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn clamp(&self, params: &mut [f64]) {
        for ((p, &lo), &hi) in params.iter_mut().zip(&self.lower).zip(&self.upper) {
            *p = p.clamp(lo, hi);
        }
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    ZeroCost,
    CostTolerance,
    StepTolerance,
    GradientTolerance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub params: Vec<f64>,
    /// `½‖r‖²` at `params`.
    pub cost: f64,
    pub iterations: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Relative cost reduction below which an accepted step ends the fit.
    pub ftol: f64,
    /// Relative step size below which the fit ends.
    pub xtol: f64,
    /// Gradient max-norm below which the fit ends.
    pub gtol: f64,
    pub initial_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-14,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
        }
    }
}

impl SolverConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerances(mut self, ftol: f64, xtol: f64, gtol: f64) -> Self {
        self.ftol = ftol;
        self.xtol = xtol;
        self.gtol = gtol;
        self
    }
}

/// A minimiser for [`Residuals`] problems.
pub trait LeastSquares {
    fn minimize<R: Residuals + ?Sized>(
        &self,
        problem: &R,
        initial: &[f64],
        bounds: Option<&Bounds>,
    ) -> WcsResult<Solution>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevenbergMarquardt {
    config: SolverConfig,
}

impl LevenbergMarquardt {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn jacobian<R: Residuals + ?Sized>(
        &self,
        problem: &R,
        params: &[f64],
        bounds: &Bounds,
        m: usize,
    ) -> WcsResult<DMatrix<f64>> {
        let n = params.len();
        let mut jac = DMatrix::zeros(m, n);
        let mut trial = params.to_vec();

        for j in 0..n {
            let p = params[j];
            let h = JACOBIAN_STEP * p.abs().max(1.0);
            let (lo, hi) = (bounds.lower[j], bounds.upper[j]);
            let forward = (p + h).min(hi);
            let backward = (p - h).max(lo);
            let span = forward - backward;
            if span <= 0.0 {
                continue;
            }

            trial[j] = forward;
            let r_plus = checked_residuals(problem, &trial, m)?;
            trial[j] = backward;
            let r_minus = checked_residuals(problem, &trial, m)?;
            trial[j] = p;

            for i in 0..m {
                jac[(i, j)] = (r_plus[i] - r_minus[i]) / span;
            }
        }
        Ok(jac)
    }

    fn solve_damped(normal: &DMatrix<f64>, gradient: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
        let mut damped = normal.clone();
        for i in 0..damped.nrows() {
            damped[(i, i)] += lambda * normal[(i, i)].max(MIN_DIAGONAL);
        }
        let rhs = -gradient;
        if let Some(chol) = damped.clone().cholesky() {
            return Some(chol.solve(&rhs));
        }
        damped.svd(true, true).solve(&rhs, SVD_EPSILON).ok()
    }
}

fn half_squared_norm(r: &[f64]) -> f64 {
    0.5 * r.iter().map(|v| v * v).sum::<f64>()
}

fn checked_residuals<R: Residuals + ?Sized>(problem: &R, params: &[f64], m: usize) -> WcsResult<Vec<f64>> {
    let r = problem.evaluate(params)?;
    if r.len() != m {
        return Err(WcsError::invalid_parameter(format!(
            "residual function returned {} values, expected {m}",
            r.len()
        )));
    }
    Ok(r)
}

impl LeastSquares for LevenbergMarquardt {
    fn minimize<R: Residuals + ?Sized>(
        &self,
        problem: &R,
        initial: &[f64],
        bounds: Option<&Bounds>,
    ) -> WcsResult<Solution> {
        let n = initial.len();
        let m = problem.num_residuals();
        if m < n {
            return Err(WcsError::underdetermined(m, n));
        }

        let unbounded;
        let bounds = match bounds {
            Some(b) if b.len() == n => b,
            Some(b) => {
                return Err(WcsError::invalid_parameter(format!(
                    "{} bounds for {n} parameters",
                    b.len()
                )))
            }
            None => {
                unbounded = Bounds::unbounded(n);
                &unbounded
            }
        };

        let cfg = &self.config;
        let mut params = initial.to_vec();
        bounds.clamp(&mut params);
        let mut residuals = checked_residuals(problem, &params, m)?;
        let mut cost = half_squared_norm(&residuals);
        let mut lambda = cfg.initial_lambda;

        let finish = |params: Vec<f64>,
                      cost: f64,
                      iterations: usize,
                      termination: Termination|
         -> WcsResult<Solution> {
            debug!(iterations, cost, ?termination, "least-squares fit finished");
            Ok(Solution {
                params,
                cost,
                iterations,
                termination,
            })
        };

        for iteration in 1..=cfg.max_iterations {
            if cost == 0.0 {
                return finish(params, cost, iteration - 1, Termination::ZeroCost);
            }

            let jac = self.jacobian(problem, &params, bounds, m)?;
            let r = DVector::from_column_slice(&residuals);
            let gradient = jac.transpose() * &r;
            if gradient.amax() <= cfg.gtol {
                return finish(params, cost, iteration - 1, Termination::GradientTolerance);
            }
            let normal = jac.transpose() * &jac;

            loop {
                let step = Self::solve_damped(&normal, &gradient, lambda).ok_or_else(|| {
                    WcsError::convergence_failure("singular normal equations")
                })?;

                let mut trial: Vec<f64> = params.iter().zip(step.iter()).map(|(p, d)| p + d).collect();
                bounds.clamp(&mut trial);

                let step_norm = trial
                    .iter()
                    .zip(&params)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt();
                let param_norm = params.iter().map(|p| p * p).sum::<f64>().sqrt();
                let small_step = step_norm <= cfg.xtol * (param_norm + cfg.xtol);

                let trial_cost = match checked_residuals(problem, &trial, m) {
                    Ok(r) => Some((half_squared_norm(&r), r)),
                    Err(e) => {
                        debug!(error = %e, "trial point rejected");
                        None
                    }
                };

                match trial_cost {
                    Some((new_cost, new_residuals)) if new_cost < cost => {
                        let reduction = (cost - new_cost) / cost;
                        params = trial;
                        residuals = new_residuals;
                        cost = new_cost;
                        lambda = (lambda * cfg.lambda_down).max(MIN_LAMBDA);
                        debug!(iteration, cost, lambda, "accepted step");

                        if reduction <= cfg.ftol {
                            return finish(params, cost, iteration, Termination::CostTolerance);
                        }
                        if small_step {
                            return finish(params, cost, iteration, Termination::StepTolerance);
                        }
                        break;
                    }
                    _ => {
                        if small_step {
                            return finish(params, cost, iteration, Termination::StepTolerance);
                        }
                        lambda *= cfg.lambda_up;
                        if lambda > MAX_LAMBDA {
                            return Err(WcsError::convergence_failure(format!(
                                "damping exceeded {MAX_LAMBDA:e} at iteration {iteration}"
                            )));
                        }
                    }
                }
            }
        }

        Err(WcsError::convergence_failure(format!(
            "no convergence in {} iterations (cost {cost:e})",
            cfg.max_iterations
        )))
    }
}
