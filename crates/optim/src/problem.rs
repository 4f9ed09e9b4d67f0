use std::fmt;

use nalgebra::SVector;

use crate::SolverError;

/// Scalar function of the decision vector.
pub type Function<'a, const N: usize> = dyn Fn(&SVector<f64, N>) -> f64 + 'a;

/// Closed interval for one decision variable; either side may be infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn at_least(lower: f64) -> Self {
        Self::new(lower, f64::INFINITY)
    }

    pub fn unbounded() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    #[inline]
    pub fn clamp(&self, v: f64) -> f64 {
        v.max(self.lower).min(self.upper)
    }

    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }
}

/// Objective, equality constraints and bounds of one minimization.
pub struct Problem<'a, const N: usize> {
    pub objective: &'a Function<'a, N>,
    pub equalities: Vec<&'a Function<'a, N>>,
    pub bounds: [Bound; N],
}

impl<'a, const N: usize> Problem<'a, N> {
    pub fn new(objective: &'a Function<'a, N>, bounds: [Bound; N]) -> Self {
        Self {
            objective,
            equalities: Vec::new(),
            bounds,
        }
    }

    /// Add an equality constraint `c(x) == 0`.
    pub fn subject_to(mut self, constraint: &'a Function<'a, N>) -> Self {
        self.equalities.push(constraint);
        self
    }

    /// Project a point onto the bound box.
    pub fn clamp(&self, x: &SVector<f64, N>) -> SVector<f64, N> {
        SVector::from_fn(|i, _| self.bounds[i].clamp(x[i]))
    }

    pub fn constraint_values(&self, x: &SVector<f64, N>) -> Vec<f64> {
        self.equalities.iter().map(|c| c(x)).collect()
    }

    pub(crate) fn objective_checked(
        &self,
        x: &SVector<f64, N>,
        iteration: usize,
    ) -> Result<f64, SolverError> {
        finite((self.objective)(x), "objective", iteration)
    }

    pub(crate) fn constraints_checked(
        &self,
        x: &SVector<f64, N>,
        iteration: usize,
    ) -> Result<Vec<f64>, SolverError> {
        self.equalities
            .iter()
            .map(|c| finite(c(x), "equality constraint", iteration))
            .collect()
    }
}

fn finite(value: f64, quantity: &'static str, iteration: usize) -> Result<f64, SolverError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SolverError::NonFinite {
            quantity,
            iteration,
        })
    }
}

/// Why a minimization stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Objective change and constraint violation both fell below tolerance.
    Converged,
    /// The iteration cap was reached first.
    IterationLimit,
}

impl Status {
    pub fn is_converged(&self) -> bool {
        matches!(self, Status::Converged)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Converged => write!(f, "optimization terminated successfully"),
            Status::IterationLimit => write!(f, "iteration limit reached"),
        }
    }
}

/// Final point of a minimization together with how it ended.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<const N: usize> {
    pub x: SVector<f64, N>,
    pub objective: f64,
    pub constraints: Vec<f64>,
    pub iterations: usize,
    pub status: Status,
}

impl<const N: usize> Solution<N> {
    pub fn success(&self) -> bool {
        self.status.is_converged()
    }

    /// Largest absolute equality-constraint value at `x`.
    pub fn max_violation(&self) -> f64 {
        max_abs(&self.constraints)
    }
}

pub(crate) fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}
