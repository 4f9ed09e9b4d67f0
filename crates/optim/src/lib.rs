//! Constrained nonlinear minimization.
//!
//! A [`Problem`] bundles a scalar objective, any number of equality constraints
//! (`c(x) == 0`) and simple per-variable bounds. A [`Minimizer`] turns a problem and a
//! start point into a [`Solution`] whose [`Status`] says whether it converged. Numerical
//! breakdowns (singular subproblems, non-finite evaluations) surface as
//! [`SolverError`] instead.

pub mod problem;
pub mod sqp;

pub use problem::{Bound, Function, Problem, Solution, Status};
pub use sqp::Sqp;

use nalgebra::SVector;
use thiserror::Error;

/// Numerical failures that abort a single minimization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("start point contains non-finite values")]
    InvalidStart,
    #[error("{quantity} evaluated to a non-finite value at iteration {iteration}")]
    NonFinite {
        quantity: &'static str,
        iteration: usize,
    },
    #[error("singular KKT system in QP subproblem at iteration {0}")]
    SingularSubproblem(usize),
}

/// A constrained minimization method.
pub trait Minimizer {
    fn minimize<const N: usize>(
        &self,
        problem: &Problem<'_, N>,
        x0: SVector<f64, N>,
    ) -> Result<Solution<N>, SolverError>;
}
