//! Orbit utility helpers: the per-object orbital state, circular and vis-viva speeds,
//! and J2 nodal precession.
use serde::{Deserialize, Serialize};

use debris_core::PhysicalConstants;

/// Mean orbital elements of one tracked object, as consumed by the transfer models.
///
/// Orbits are treated as circular, so the semi-major axis doubles as the orbit radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalState {
    /// Semi-major axis (m).
    pub sma: f64,
    /// Inclination (rad), in `[0, π]`.
    pub incl: f64,
    /// Right ascension of the ascending node (rad), in `[0, 2π)`.
    pub raan: f64,
}

impl OrbitalState {
    pub fn new(sma: f64, incl: f64, raan: f64) -> Self {
        Self { sma, incl, raan }
    }

    /// RAAN drift rate of this orbit (rad/s).
    pub fn precession_rate(&self, constants: &PhysicalConstants) -> f64 {
        nodal_precession(constants, self.sma, self.incl)
    }
}

/// Secular J2 drift of the ascending node for a circular orbit (rad/s).
///
/// `-3/2 · J2 · √(GM) · R² · a^(-7/2) · cos i`. Negative for prograde orbits, positive
/// for retrograde ones, zero for polar orbits.
pub fn nodal_precession(constants: &PhysicalConstants, sma: f64, incl: f64) -> f64 {
    -1.5 * constants.j2
        * constants.mu().sqrt()
        * constants.earth_radius_m.powi(2)
        * sma.powf(-3.5)
        * incl.cos()
}

/// Speed on a circular orbit of radius `r` (m/s).
#[inline]
pub fn circular_speed(mu: f64, r: f64) -> f64 {
    (mu / r).sqrt()
}

/// Vis-viva speed at radius `r` on an orbit of semi-major axis `a` (m/s).
#[inline]
pub fn vis_viva(mu: f64, r: f64, a: f64) -> f64 {
    (mu * (2.0 / r - 1.0 / a)).sqrt()
}

/// Magnitude of the difference between two velocity vectors of lengths `a` and `b`
/// separated by `angle` (law of cosines).
///
/// Written as `(a - b)² + 2ab(1 - cos C)` so equal speeds with no plane change give an
/// exact zero instead of a rounding-negative radicand.
#[inline]
pub fn cosine_rule(a: f64, b: f64, angle: f64) -> f64 {
    ((a - b).powi(2) + 2.0 * a * b * (1.0 - angle.cos())).sqrt()
}
