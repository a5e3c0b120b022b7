//! Configuration for the replay binary.
//!
//! One YAML document carries the overlay layer settings and the wind API
//! client settings:
//!
//! ```yaml
//! overlay:
//!   controller:
//!     debounce_ms: 500
//!   cache:
//!     capacity: 32
//! wind_api:
//!   base_url: https://dive.example.com/api/v1/weather
//! ```

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use viewport::OverlayConfig;
use wind_client::WindClientConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub overlay: OverlayConfig,
    pub wind_api: WindClientConfig,
}

impl ReplayConfig {
    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        Self {
            overlay: OverlayConfig::from_env(),
            wind_api: WindClientConfig::from_env(),
        }
    }

    /// Load from `path` if given, otherwise from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                let config: ReplayConfig = serde_yaml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?;
                info!(path = %path.display(), "Loaded replay configuration");
                config
            }
            None => Self::from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.overlay
            .validate()
            .map_err(|e| anyhow!("Invalid overlay configuration: {}", e))?;
        self.wind_api
            .validate()
            .map_err(|e| anyhow!("Invalid wind_api configuration: {}", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "overlay:\n  controller:\n    debounce_ms: 500\nwind_api:\n  base_url: https://dive.example.com/api/v1/weather"
        )
        .unwrap();

        let config = ReplayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.overlay.controller.debounce_ms, 500);
        assert_eq!(config.overlay.cache.capacity, 64);
        assert_eq!(config.wind_api.base_url, "https://dive.example.com/api/v1/weather");
        assert_eq!(config.wind_api.request_timeout_secs, 10);
    }

    #[test]
    fn test_invalid_section_is_named() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wind_api:\n  base_url: ftp://nowhere").unwrap();

        let err = ReplayConfig::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("wind_api"));
    }

    #[test]
    fn test_missing_file() {
        assert!(ReplayConfig::load(Some(Path::new("/nonexistent/replay.yaml"))).is_err());
    }
}
