//! Debris-to-debris transfer planning.
//!
//! [`phasing`] closes the RAAN-alignment condition over one grid point, [`optimizer`]
//! minimizes the biplane transfer cost subject to it, and [`grid`] runs the optimizer over
//! every (source, destination, start epoch, duration) combination.

pub mod grid;
pub mod optimizer;
pub mod phasing;
