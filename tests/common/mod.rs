//! Reference values shared by the integration tests.

use debris_transfer_calculator::orbits::{circular_speed, vis_viva};

/// Magnitudes of the two burns of a coplanar Hohmann transfer from radius `r1` to `r2`.
pub fn hohmann_burns(r1: f64, r2: f64, mu: f64) -> (f64, f64) {
    let a_t = 0.5 * (r1 + r2);
    let departure = (vis_viva(mu, r1, a_t) - circular_speed(mu, r1)).abs();
    let arrival = (circular_speed(mu, r2) - vis_viva(mu, r2, a_t)).abs();
    (departure, arrival)
}
