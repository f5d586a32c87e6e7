//! Engine configuration with environment overrides.

use crate::errors::GatehouseError;
use crate::matcher::DEFAULT_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

const TOLERANCE_ENV_VAR: &str = "GATEHOUSE_TOLERANCE";
const DIMENSION_ENV_VAR: &str = "GATEHOUSE_ENCODING_DIMENSION";
const TIME_RESTRICTED_LOGGING_ENV_VAR: &str = "GATEHOUSE_LOG_TIME_RESTRICTED";

/// Encoding length produced by the usual 128-d face embedding models.
pub const DEFAULT_ENCODING_DIMENSION: usize = 128;

/// Whether a "time restriction" denial appends an access event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRestrictedLogging {
    /// Record the denial like every other decision (one event per call).
    #[default]
    Record,
    /// Return the denial without touching the log.
    Skip,
}

impl FromStr for TimeRestrictedLogging {
    type Err = GatehouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "record" | "true" | "1" | "yes" => Ok(TimeRestrictedLogging::Record),
            "skip" | "false" | "0" | "no" => Ok(TimeRestrictedLogging::Skip),
            other => Err(GatehouseError::ConfigError(format!(
                "{} must be one of record/skip, got '{}'",
                TIME_RESTRICTED_LOGGING_ENV_VAR, other
            ))),
        }
    }
}

/// Tunables of the [`DecisionEngine`](crate::engine::DecisionEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum Euclidean distance for a match (exclusive).
    pub tolerance: f64,
    /// Length every enrolled template and every probe must have.
    pub encoding_dimension: usize,
    pub time_restricted_logging: TimeRestrictedLogging,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            encoding_dimension: DEFAULT_ENCODING_DIMENSION,
            time_restricted_logging: TimeRestrictedLogging::default(),
        }
    }
}

impl EngineConfig {
    /// Loads defaults overridden by `GATEHOUSE_*` environment variables.
    pub fn from_env() -> Result<Self, GatehouseError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatehouseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(TOLERANCE_ENV_VAR) {
            config.tolerance = raw.trim().parse().map_err(|e| {
                GatehouseError::ConfigError(format!(
                    "{} is not a number ('{}'): {}",
                    TOLERANCE_ENV_VAR, raw, e
                ))
            })?;
        }
        if let Some(raw) = lookup(DIMENSION_ENV_VAR) {
            config.encoding_dimension = raw.trim().parse().map_err(|e| {
                GatehouseError::ConfigError(format!(
                    "{} is not a positive integer ('{}'): {}",
                    DIMENSION_ENV_VAR, raw, e
                ))
            })?;
        }
        if let Some(raw) = lookup(TIME_RESTRICTED_LOGGING_ENV_VAR) {
            config.time_restricted_logging = raw.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GatehouseError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(GatehouseError::ConfigError(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        if self.encoding_dimension == 0 {
            return Err(GatehouseError::ConfigError(
                "encoding dimension must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
