//! Configuration for suitability classification.

use serde::{Deserialize, Serialize};

/// Thresholds used by [`crate::SuitabilityAnnotator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuitabilityConfig {
    /// Wind speed (m/s) at which a site drops from good to caution.
    pub caution_from_ms: f64,

    /// Wind speed (m/s) at which a site becomes difficult.
    pub difficult_from_ms: f64,

    /// Wind speed (m/s) at which a site should be avoided.
    pub avoid_from_ms: f64,

    /// Wind coming from within this many degrees of the shore bearing is
    /// onshore.
    pub onshore_half_angle_deg: f64,

    /// Furthest a wind point may be from a marker and still describe it.
    pub max_sample_distance_deg: f64,
}

impl Default for SuitabilityConfig {
    fn default() -> Self {
        Self {
            caution_from_ms: 6.2,
            difficult_from_ms: 7.7,
            avoid_from_ms: 10.0,
            onshore_half_angle_deg: 45.0,
            max_sample_distance_deg: 0.5,
        }
    }
}

impl SuitabilityConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SUITABILITY_ONSHORE_HALF_ANGLE") {
            if let Ok(angle) = val.parse() {
                config.onshore_half_angle_deg = angle;
            }
        }

        if let Ok(val) = std::env::var("SUITABILITY_MAX_SAMPLE_DISTANCE") {
            if let Ok(distance) = val.parse() {
                config.max_sample_distance_deg = distance;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let bands = [
            self.caution_from_ms,
            self.difficult_from_ms,
            self.avoid_from_ms,
        ];
        if bands.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err("speed thresholds must be positive".to_string());
        }

        if !(self.caution_from_ms < self.difficult_from_ms
            && self.difficult_from_ms < self.avoid_from_ms)
        {
            return Err("speed thresholds must be strictly increasing".to_string());
        }

        if !(0.0..=180.0).contains(&self.onshore_half_angle_deg) {
            return Err("onshore_half_angle_deg must be between 0 and 180".to_string());
        }

        if !self.max_sample_distance_deg.is_finite() || self.max_sample_distance_deg < 0.0 {
            return Err("max_sample_distance_deg must be >= 0".to_string());
        }

        Ok(())
    }
}
