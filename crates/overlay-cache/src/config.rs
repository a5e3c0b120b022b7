//! Configuration for key normalization and the overlay cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::CacheKeyNormalizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Grid step in degrees that cache-key bounds are rounded to.
    pub grid_step: f64,

    /// Fraction of each axis extent added on every side of the request
    /// bounds (not the key) so edge features are not clipped.
    pub padding_fraction: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            grid_step: 0.1,
            padding_fraction: 0.025,
        }
    }
}

impl NormalizerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("OVERLAY_GRID_STEP") {
            if let Ok(step) = val.parse() {
                config.grid_step = step;
            }
        }

        if let Ok(val) = std::env::var("OVERLAY_PADDING_FRACTION") {
            if let Ok(fraction) = val.parse() {
                config.padding_fraction = fraction;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        // Keys store the step in micro-degrees
        if !self.grid_step.is_finite() || self.grid_step < 1e-6 {
            return Err("grid_step must be >= 0.000001 degrees".to_string());
        }

        if self.grid_step > 90.0 {
            return Err("grid_step must be <= 90 degrees".to_string());
        }

        if !(0.0..=1.0).contains(&self.padding_fraction) {
            return Err("padding_fraction must be between 0 and 1".to_string());
        }

        Ok(())
    }
}

/// Configuration for [`crate::WeatherOverlayCache`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Age after which an entry is served stale and refreshed in the background.
    pub stale_after_secs: u64,

    /// Age after which an entry is never served again.
    pub hard_expire_after_secs: u64,

    /// Maximum number of entries before LRU eviction.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: 5 * 60,
            hard_expire_after_secs: 15 * 60,
            capacity: 64,
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("OVERLAY_STALE_SECS") {
            if let Ok(secs) = val.parse() {
                config.stale_after_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("OVERLAY_HARD_EXPIRE_SECS") {
            if let Ok(secs) = val.parse() {
                config.hard_expire_after_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("OVERLAY_CACHE_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.capacity = capacity;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be > 0".to_string());
        }

        if self.hard_expire_after_secs < self.stale_after_secs {
            return Err("hard_expire_after_secs must be >= stale_after_secs".to_string());
        }

        Ok(())
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn hard_expire_after(&self) -> Duration {
        Duration::from_secs(self.hard_expire_after_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let n = NormalizerConfig::default();
        assert_eq!(n.grid_step, 0.1);
        assert_eq!(n.padding_fraction, 0.025);
        assert!(n.validate().is_ok());

        let c = CacheConfig::default();
        assert_eq!(c.stale_after(), Duration::from_secs(300));
        assert_eq!(c.hard_expire_after(), Duration::from_secs(900));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut n = NormalizerConfig::default();
        n.grid_step = 0.0;
        assert!(n.validate().is_err());

        n = NormalizerConfig::default();
        n.padding_fraction = -0.1;
        assert!(n.validate().is_err());

        let mut c = CacheConfig::default();
        c.capacity = 0;
        assert!(c.validate().is_err());

        c = CacheConfig::default();
        c.hard_expire_after_secs = 60;
        assert!(c.validate().is_err());
    }
}
