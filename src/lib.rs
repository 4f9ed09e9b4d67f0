//! Debris-cluster transfer calculator.
//!
//! Re-exports the workspace crates so front-ends (the `delta_v` CLI, integration tests)
//! depend on a single library: catalog import, configuration, the physical models, the
//! constrained optimizer, the grid search and result export.

pub use debris_config as config;
pub use debris_core as core;
pub use debris_export as export;
pub use debris_impulsive as impulsive;
pub use debris_importer as importer;
pub use debris_optim as optim;
pub use debris_orbits as orbits;
pub use debris_transfer as transfer;
