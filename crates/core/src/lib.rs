//! Core units, constants, and shared primitives for the debris transfer workspace.

use serde::{Deserialize, Serialize};

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Earth J2 zonal harmonic.
    pub const J2: f64 = 1.082_626_68e-3;
    /// Newtonian gravitational constant (N m² kg⁻²).
    pub const GRAVITATIONAL_CONSTANT: f64 = 6.674_301_5e-11;
    /// Mass of the Earth (kg).
    pub const EARTH_MASS_KG: f64 = 5.972e24;
    /// Earth equatorial radius (m), WGS-84.
    pub const EARTH_RADIUS_M: f64 = 6_378_137.0;
    /// Seconds per day.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
}

/// Immutable bundle of the physical constants used by every model in the workspace.
///
/// Built once from configuration and shared by reference; nothing mutates it after
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    pub j2: f64,
    pub gravitational_constant: f64,
    pub earth_mass_kg: f64,
    pub earth_radius_m: f64,
}

impl PhysicalConstants {
    /// Earth gravitational parameter G·M (m³/s²).
    #[inline]
    pub fn mu(&self) -> f64 {
        self.gravitational_constant * self.earth_mass_kg
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            j2: constants::J2,
            gravitational_constant: constants::GRAVITATIONAL_CONSTANT,
            earth_mass_kg: constants::EARTH_MASS_KG,
            earth_radius_m: constants::EARTH_RADIUS_M,
        }
    }
}

/// Basic unit conversion helpers.
pub mod units {
    /// Convert kilometres to metres.
    #[inline]
    pub fn km_to_m(v: f64) -> f64 {
        v * 1_000.0
    }

    /// Convert metres per second to kilometres per second.
    #[inline]
    pub fn ms_to_kms(v: f64) -> f64 {
        v / 1_000.0
    }

    /// Convert kilometres per second to metres per second.
    #[inline]
    pub fn kms_to_ms(v: f64) -> f64 {
        v * 1_000.0
    }
}

/// Lightweight time utilities shared across crates.
pub mod time {
    use super::constants::SECONDS_PER_DAY;

    /// Convert days to seconds.
    #[inline]
    pub fn days_to_seconds(days: f64) -> f64 {
        days * SECONDS_PER_DAY
    }
}

/// Angle helpers.
pub mod angle {
    use std::f64::consts::TAU;

    /// Wrap an angle into `[0, 2π)`.
    #[inline]
    pub fn wrap_two_pi(rad: f64) -> f64 {
        rad.rem_euclid(TAU)
    }
}
