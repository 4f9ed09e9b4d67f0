//! Re-exported APIs for consumers of the transfer crate.

pub use crate::mission::grid::{
    Dispatch, GridCoordinate, GridError, GridPointSolver, GridReport, GridSearch, GridSpec,
    ResultTable,
};
pub use crate::mission::optimizer::{
    TransferFailure, TransferOptimizer, TransferOutcome, TransferResult,
};
pub use crate::mission::phasing::PhasingConstraint;
pub use debris_orbits::OrbitalState;
