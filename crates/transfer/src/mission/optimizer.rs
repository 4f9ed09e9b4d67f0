//! Minimum-cost intermediate orbit for one grid point.

use std::f64::consts::TAU;

use debris_config::RunConfig;
use debris_core::{
    PhysicalConstants,
    units::{kms_to_ms, ms_to_kms},
};
use debris_impulsive::transfer_cost;
use debris_optim::{Bound, Minimizer, Problem, SolverError, Sqp, Status};
use debris_orbits::OrbitalState;
use nalgebra::Vector2;
use thiserror::Error;

use super::phasing::PhasingConstraint;

/// Converged intermediate orbit and its cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferResult {
    /// Intermediate semi-major axis (m).
    pub sma: f64,
    /// Intermediate inclination (rad).
    pub incl: f64,
    /// Total delta-v (m/s).
    pub cost: f64,
}

/// Why a grid point produced no result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransferFailure {
    #[error("optimizer did not converge after {iterations} iterations: {status}")]
    NotConverged { status: Status, iterations: usize },
    #[error("numerical failure: {0}")]
    Numerical(#[from] SolverError),
}

/// Outcome of optimizing a single grid point. Failures are values, not errors: the grid
/// keeps going and simply records nothing for the point.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    Converged(TransferResult),
    Failed(TransferFailure),
}

impl TransferOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, TransferOutcome::Converged(_))
    }
}

/// Finds the intermediate orbit minimizing [`transfer_cost`] under the phasing constraint.
///
/// The minimizer works on scaled variables: semi-major axis in Earth radii, inclination
/// in radians, and cost in km/s. Results are reported back in metres and m/s.
#[derive(Debug, Clone)]
pub struct TransferOptimizer<M = Sqp> {
    minimizer: M,
    constants: PhysicalConstants,
    epoch_length_s: f64,
    sma_lower_bound_m: f64,
}

impl TransferOptimizer<Sqp> {
    /// Optimizer with the configured solver settings, constants and epoch length.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            Sqp::new(config.solver.max_iterations, config.solver.tolerance),
            config.constants,
            config.epoch_length_s(),
            config.sma_lower_bound_m,
        )
    }
}

impl<M: Minimizer> TransferOptimizer<M> {
    pub fn new(
        minimizer: M,
        constants: PhysicalConstants,
        epoch_length_s: f64,
        sma_lower_bound_m: f64,
    ) -> Self {
        Self {
            minimizer,
            constants,
            epoch_length_s,
            sma_lower_bound_m,
        }
    }

    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    pub fn epoch_length_s(&self) -> f64 {
        self.epoch_length_s
    }

    /// Phasing constraint of the grid point `(start_epoch, duration)` for this pair.
    pub fn phasing<'a>(
        &'a self,
        source: &'a OrbitalState,
        destination: &'a OrbitalState,
        start_epoch: u32,
        duration: u32,
    ) -> PhasingConstraint<'a> {
        PhasingConstraint::new(
            source,
            destination,
            start_epoch,
            duration,
            self.epoch_length_s,
            &self.constants,
        )
    }

    /// Optimize the transfer from `source` to `destination` leaving at `start_epoch` and
    /// lasting `duration` epochs. Starts from the midpoint of the two orbits.
    pub fn optimize(
        &self,
        source: &OrbitalState,
        destination: &OrbitalState,
        start_epoch: u32,
        duration: u32,
    ) -> TransferOutcome {
        let radius = self.constants.earth_radius_m;
        let mu = self.constants.mu();
        let phasing = self.phasing(source, destination, start_epoch, duration);

        let objective = |u: &Vector2<f64>| {
            ms_to_kms(transfer_cost((u[0] * radius, u[1]), source, destination, mu))
        };
        let alignment = |u: &Vector2<f64>| phasing.residual(u[0] * radius, u[1]);

        let problem = Problem::new(
            &objective,
            [
                Bound::at_least(self.sma_lower_bound_m / radius),
                Bound::new(0.0, TAU),
            ],
        )
        .subject_to(&alignment);

        let x0 = Vector2::new(
            0.5 * (source.sma + destination.sma) / radius,
            0.5 * (source.incl + destination.incl),
        );

        match self.minimizer.minimize(&problem, x0) {
            Ok(solution) if solution.success() => TransferOutcome::Converged(TransferResult {
                sma: solution.x[0] * radius,
                incl: solution.x[1],
                cost: kms_to_ms(solution.objective),
            }),
            Ok(solution) => TransferOutcome::Failed(TransferFailure::NotConverged {
                status: solution.status,
                iterations: solution.iterations,
            }),
            Err(err) => TransferOutcome::Failed(err.into()),
        }
    }
}
