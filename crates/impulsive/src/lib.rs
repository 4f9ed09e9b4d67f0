//! Impulsive transfer utilities: the biplane two-impulse cost model.

pub mod biplane;

pub use biplane::{inclination_split, transfer_cost};
