//! Ascending-node phasing between a chaser leaving one object and the object it targets.

use debris_core::{PhysicalConstants, angle::wrap_two_pi};
use debris_orbits::{OrbitalState, nodal_precession};

/// RAAN-alignment residual for one (source, destination, start epoch, duration) choice.
///
/// The chaser drifts with its source orbit for `start` seconds, then with the intermediate
/// orbit for `duration` seconds; the destination node drifts for the whole `start +
/// duration`. A zero residual means both nodes coincide on arrival.
#[derive(Debug, Clone, Copy)]
pub struct PhasingConstraint<'a> {
    source: &'a OrbitalState,
    destination: &'a OrbitalState,
    constants: &'a PhysicalConstants,
    start_s: f64,
    duration_s: f64,
}

impl<'a> PhasingConstraint<'a> {
    /// `start_epoch` and `duration` are counted in epochs of `epoch_length_s` seconds.
    pub fn new(
        source: &'a OrbitalState,
        destination: &'a OrbitalState,
        start_epoch: u32,
        duration: u32,
        epoch_length_s: f64,
        constants: &'a PhysicalConstants,
    ) -> Self {
        Self {
            source,
            destination,
            constants,
            start_s: f64::from(start_epoch) * epoch_length_s,
            duration_s: f64::from(duration) * epoch_length_s,
        }
    }

    /// Chaser node minus destination node on arrival, each wrapped into `[0, 2π)` (rad).
    pub fn residual(&self, sma: f64, incl: f64) -> f64 {
        let chaser = wrap_two_pi(
            self.source.raan
                + self.source.precession_rate(self.constants) * self.start_s
                + nodal_precession(self.constants, sma, incl) * self.duration_s,
        );
        let target = wrap_two_pi(
            self.destination.raan
                + self.destination.precession_rate(self.constants)
                    * (self.start_s + self.duration_s),
        );
        chaser - target
    }
}
