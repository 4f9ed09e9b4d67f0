//! Two-line element sets, parsed and initialised with the `sgp4` crate.
//!
//! ```text
//! Line 0: object name
//! Line 1: 1 NNNNNC NNNNNAAA NNNNN.NNNNNNNN +.NNNNNNNN +NNNNN-N +NNNNN-N N NNNNN
//! Line 2: 2 NNNNN NNN.NNNN NNN.NNNN NNNNNNN NNN.NNNN NNN.NNNN NN.NNNNNNNNNNNNNN
//! ```

use std::f64::consts::TAU;

use debris_core::{angle::wrap_two_pi, units::km_to_m};
use debris_orbits::OrbitalState;
use thiserror::Error;

const MINUTES_PER_DAY: f64 = 1440.0;

#[derive(Debug, Error)]
pub enum TleError {
    #[error("invalid TLE: {0}")]
    Parse(String),

    #[error("mean elements rejected by the propagator: {0}")]
    Elements(String),
}

/// Parsed TLE with the object name as given on line 0.
#[derive(Debug, Clone)]
pub struct Tle {
    pub name: String,
    pub elements: sgp4::Elements,
}

impl Tle {
    /// Parse a TLE from three lines (name on line 0).
    pub fn parse_3line(line0: &str, line1: &str, line2: &str) -> Result<Self, TleError> {
        let name = line0.trim().to_string();
        let elements = sgp4::Elements::from_tle(
            Some(name.clone()),
            line1.trim_end().as_bytes(),
            line2.trim_end().as_bytes(),
        )
        .map_err(|e| TleError::Parse(format!("{e:?}")))?;
        Ok(Tle { name, elements })
    }

    /// Semi-major axis (m), inclination and RAAN (rad) as the propagator initialises them.
    pub fn orbital_state(&self) -> Result<OrbitalState, TleError> {
        let e = &self.elements;
        let incl = e.inclination.to_radians();
        let raan = e.right_ascension.to_radians();
        // Kozai mean motion in, Brouwer mean motion out (rad/min)
        let orbit = sgp4::Orbit::from_kozai_elements(
            &sgp4::WGS72,
            incl,
            raan,
            e.eccentricity,
            e.argument_of_perigee.to_radians(),
            e.mean_anomaly.to_radians(),
            e.mean_motion * TAU / MINUTES_PER_DAY,
        )
        .map_err(|err| TleError::Elements(format!("{err:?}")))?;

        let sma = semi_major_axis_m(&sgp4::WGS72, orbit.mean_motion);
        Ok(OrbitalState::new(sma, incl, wrap_two_pi(raan)))
    }
}

/// Semi-major axis (m) for a Brouwer mean motion (rad/min): `a = (n / ke)^(-2/3) * ae`.
pub fn semi_major_axis_m(geopotential: &sgp4::Geopotential, mean_motion: f64) -> f64 {
    km_to_m((mean_motion / geopotential.ke).powf(-2.0 / 3.0) * geopotential.ae)
}
