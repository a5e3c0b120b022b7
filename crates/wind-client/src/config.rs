//! Wind API client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::WindClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindClientConfig {
    /// Base URL; `/wind` and `/wind-recommendations` are appended.
    pub base_url: String,

    /// Whole-request timeout.
    pub request_timeout_secs: u64,

    /// TCP connect timeout.
    pub connect_timeout_secs: u64,

    /// Ask the recommendations endpoint to include sites it cannot classify.
    pub include_unknown: bool,

    /// Retries after the first attempt for retryable failures.
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry.
    pub initial_retry_delay_ms: u64,
}

impl Default for WindClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1/weather".to_string(),
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
            include_unknown: false,
            max_retries: 2,
            initial_retry_delay_ms: 200,
        }
    }
}

impl WindClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("WIND_API_BASE_URL") {
            config.base_url = val;
        }

        if let Ok(val) = std::env::var("WIND_API_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.request_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("WIND_API_INCLUDE_UNKNOWN") {
            config.include_unknown = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Ok(val) = std::env::var("WIND_API_MAX_RETRIES") {
            if let Ok(retries) = val.parse() {
                config.max_retries = retries;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("base_url must be an http(s) URL: {}", self.base_url));
        }

        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".to_string());
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }

    /// Endpoint URL under the base, tolerating a trailing slash on the base.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joining() {
        let mut config = WindClientConfig {
            base_url: "http://api.test/weather/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint("wind"), "http://api.test/weather/wind");

        config.base_url = "http://api.test/weather".to_string();
        assert_eq!(
            config.endpoint("wind-recommendations"),
            "http://api.test/weather/wind-recommendations"
        );
    }

    #[test]
    fn test_validation() {
        assert!(WindClientConfig::default().validate().is_ok());

        let config = WindClientConfig {
            base_url: "ftp://nope".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
