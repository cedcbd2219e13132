//! Engine configuration
//!
//! Tunable constants of the insights engine. Every field has a default, so a
//! JSON config may set only the values it wants to change.

use crate::error::InsightsError;
use crate::percentile::DEFAULT_SENSITIVITY;
use serde::{Deserialize, Serialize};

/// Default daily feed target in milliliters
pub const DEFAULT_DAILY_FEED_TARGET_ML: f64 = 750.0;

/// Insights engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Feed volume (mL) today's total is compared against
    pub daily_feed_target_ml: f64,
    /// Percentile points per unit of deviation from the reference median
    pub sensitivity: f64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            daily_feed_target_ml: DEFAULT_DAILY_FEED_TARGET_ML,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

impl InsightsConfig {
    /// Check that every value is finite and strictly positive
    pub fn validate(&self) -> Result<(), InsightsError> {
        check_positive("daily_feed_target_ml", self.daily_feed_target_ml)?;
        check_positive("sensitivity", self.sensitivity)?;
        Ok(())
    }

    /// Load and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self, InsightsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Require a finite, strictly positive value
pub(crate) fn check_positive(field: &str, value: f64) -> Result<(), InsightsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InsightsError::InvalidConfig(format!(
            "{} must be a positive number, got {}",
            field, value
        )))
    }
}
