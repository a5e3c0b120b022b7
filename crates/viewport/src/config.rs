//! Controller, prefetch and aggregate configuration.

use std::path::Path;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};

use clustering::{ClusterConfig, FitConfig};
use overlay_cache::{CacheConfig, NormalizerConfig};
use overlay_common::{OverlayError, OverlayResult};
use suitability::SuitabilityConfig;

/// Configuration for [`crate::PrefetchScheduler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchConfig {
    /// Enable prefetching of upcoming time slices.
    pub enabled: bool,

    /// Most slices warmed per successful primary load.
    pub max_slices: usize,

    /// Calendar days after the reference time to consider.
    pub days_ahead: u32,

    /// UTC hour used as the representative slice of each day.
    pub representative_hour: u32,

    /// Never prefetch a slice later than now plus this many hours.
    pub horizon_hours: i64,

    /// Delay before each prefetch fires.
    pub delay_ms: u64,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_slices: 2,
            days_ahead: 2,
            representative_hour: 12,
            horizon_hours: 48,
            delay_ms: 250,
        }
    }
}

impl PrefetchConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PREFETCH_ENABLED") {
            config.enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Ok(val) = std::env::var("PREFETCH_MAX_SLICES") {
            if let Ok(n) = val.parse() {
                config.max_slices = n;
            }
        }

        if let Ok(val) = std::env::var("PREFETCH_DAYS_AHEAD") {
            if let Ok(n) = val.parse() {
                config.days_ahead = n;
            }
        }

        if let Ok(val) = std::env::var("PREFETCH_HORIZON_HOURS") {
            if let Ok(n) = val.parse() {
                config.horizon_hours = n;
            }
        }

        if let Ok(val) = std::env::var("PREFETCH_DELAY_MS") {
            if let Ok(n) = val.parse() {
                config.delay_ms = n;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.representative_hour > 23 {
            return Err("representative_hour must be 0-23".to_string());
        }

        if self.horizon_hours < 0 {
            return Err("horizon_hours must be >= 0".to_string());
        }

        Ok(())
    }

    pub fn horizon(&self) -> ChronoDuration {
        ChronoDuration::hours(self.horizon_hours)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Configuration for [`crate::ViewportController`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Idle time after the last movement before the viewport settles.
    pub debounce_ms: u64,

    /// Map size used when fitting the view to the markers.
    pub map_width_px: f64,
    pub map_height_px: f64,

    /// Whether the wind overlay starts enabled.
    pub overlay_enabled: bool,

    /// Capacity of the viewport event channel.
    pub event_buffer: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            map_width_px: 1024.0,
            map_height_px: 768.0,
            overlay_enabled: true,
            event_buffer: 64,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("VIEWPORT_DEBOUNCE_MS") {
            if let Ok(ms) = val.parse() {
                config.debounce_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("WIND_OVERLAY_ENABLED") {
            config.overlay_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.map_width_px > 0.0 && self.map_height_px > 0.0) {
            return Err("map size must be positive".to_string());
        }

        if self.event_buffer == 0 {
            return Err("event_buffer must be > 0".to_string());
        }

        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Every component's configuration in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub controller: ControllerConfig,
    pub normalizer: NormalizerConfig,
    pub cache: CacheConfig,
    pub prefetch: PrefetchConfig,
    pub clustering: ClusterConfig,
    pub fit: FitConfig,
    pub suitability: SuitabilityConfig,
}

impl OverlayConfig {
    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        Self {
            controller: ControllerConfig::from_env(),
            normalizer: NormalizerConfig::from_env(),
            cache: CacheConfig::from_env(),
            prefetch: PrefetchConfig::from_env(),
            clustering: ClusterConfig::from_env(),
            fit: FitConfig::default(),
            suitability: SuitabilityConfig::from_env(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> OverlayResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| OverlayError::InvalidConfig(format!("Failed to parse config: {}", e)))
    }

    pub fn from_yaml_file(path: &Path) -> OverlayResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OverlayError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Validate every section; the error names the failing section.
    pub fn validate(&self) -> Result<(), String> {
        self.controller
            .validate()
            .map_err(|e| format!("controller: {}", e))?;
        self.normalizer
            .validate()
            .map_err(|e| format!("normalizer: {}", e))?;
        self.cache.validate().map_err(|e| format!("cache: {}", e))?;
        self.prefetch
            .validate()
            .map_err(|e| format!("prefetch: {}", e))?;
        self.clustering
            .validate()
            .map_err(|e| format!("clustering: {}", e))?;
        self.fit.validate().map_err(|e| format!("fit: {}", e))?;
        self.suitability
            .validate()
            .map_err(|e| format!("suitability: {}", e))?;
        Ok(())
    }
}
