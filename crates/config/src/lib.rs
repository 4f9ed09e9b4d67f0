//! Run configuration models and loaders for the debris transfer calculator.
//!
//! A [`RunConfig`] is read once, validated, and then passed by reference to every stage
//! of a run. Keys missing from a file fall back to the defaults below.

use std::path::Path;

use debris_core::{PhysicalConstants, time};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Grid resolution, optimizer bounds, parallelism and physical constants of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Length of the planning horizon (days).
    pub horizon_days: f64,
    /// Number of epochs the horizon is divided into.
    pub epochs: u32,
    /// Shortest transfer tried (epochs).
    pub transfer_min: u32,
    /// Longest transfer tried (epochs).
    pub transfer_max: u32,
    /// Lower bound on the intermediate-orbit semi-major axis (m).
    pub sma_lower_bound_m: f64,
    /// Dispatch grid points to a worker pool instead of evaluating them in order.
    pub parallel: bool,
    /// Worker pool size; `None` uses one worker per logical CPU.
    pub threads: Option<usize>,
    pub solver: SolverConfig,
    pub constants: PhysicalConstants,
}

/// Settings of the constrained minimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            horizon_days: 300.0,
            epochs: 60,
            transfer_min: 1,
            transfer_max: 20,
            sma_lower_bound_m: 6_400_000.0,
            parallel: true,
            threads: None,
            solver: SolverConfig::default(),
            constants: PhysicalConstants::default(),
        }
    }
}

impl RunConfig {
    /// Length of one epoch (days).
    pub fn epoch_length_days(&self) -> f64 {
        self.horizon_days / f64::from(self.epochs)
    }

    /// Length of one epoch (s).
    pub fn epoch_length_s(&self) -> f64 {
        time::days_to_seconds(self.epoch_length_days())
    }

    /// Reject configurations the grid search cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.horizon_days.is_finite() && self.horizon_days > 0.0) {
            return Err(invalid("horizon_days", "must be a positive number of days"));
        }
        if self.epochs == 0 {
            return Err(invalid("epochs", "must be at least 1"));
        }
        if self.transfer_min == 0 {
            return Err(invalid("transfer_min", "must be at least 1 epoch"));
        }
        if self.transfer_min > self.transfer_max {
            return Err(invalid("transfer_min", "must not exceed transfer_max"));
        }
        if !(self.sma_lower_bound_m.is_finite() && self.sma_lower_bound_m > 0.0) {
            return Err(invalid("sma_lower_bound_m", "must be a positive length"));
        }
        if self.threads == Some(0) {
            return Err(invalid("threads", "must be at least 1 when set"));
        }
        if self.solver.max_iterations == 0 {
            return Err(invalid("solver.max_iterations", "must be at least 1"));
        }
        if !(self.solver.tolerance > 0.0) {
            return Err(invalid("solver.tolerance", "must be positive"));
        }
        let c = &self.constants;
        for (field, value) in [
            ("constants.j2", c.j2),
            ("constants.gravitational_constant", c.gravitational_constant),
            ("constants.earth_mass_kg", c.earth_mass_kg),
            ("constants.earth_radius_m", c.earth_radius_m),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, "must be positive"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Load and validate a run configuration from a TOML (`.toml`) or YAML file.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let config: RunConfig = if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        toml::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };
    config.validate()?;
    Ok(config)
}
