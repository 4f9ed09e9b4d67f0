//! Transfer façade crate: phasing constraint, per-grid-point optimizer and the grid search
//! that aggregates converged transfers.

pub mod mission;

pub use debris_impulsive as impulsive;
pub use debris_optim as optim;
pub use debris_orbits as orbits;
pub use facade::*;

mod facade;
