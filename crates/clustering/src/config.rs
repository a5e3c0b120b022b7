//! Clustering and fit configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use overlay_common::EntityType;

/// Marker layer a policy applies to.
pub type LayerKind = EntityType;

/// Radius/zoom policy for one layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterPolicy {
    /// Markers whose projected distance to a group centroid is at most this
    /// many screen pixels join the group.
    pub radius_px: f64,

    /// At this zoom bucket and above every marker is rendered on its own.
    pub disable_at_zoom: u8,
}

impl Default for ClusterPolicy {
    fn default() -> Self {
        Self {
            radius_px: 50.0,
            disable_at_zoom: 12,
        }
    }
}

impl ClusterPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if !self.radius_px.is_finite() || self.radius_px < 0.0 {
            return Err("radius_px must be >= 0".to_string());
        }
        if self.disable_at_zoom > 22 {
            return Err("disable_at_zoom must be <= 22".to_string());
        }
        Ok(())
    }
}

/// Configuration for [`crate::ClusterEngine`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Policy for layers without an override.
    pub default_policy: ClusterPolicy,

    /// Per-layer overrides.
    pub layers: BTreeMap<LayerKind, ClusterPolicy>,
}

impl ClusterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CLUSTER_RADIUS_PX") {
            if let Ok(radius) = val.parse() {
                config.default_policy.radius_px = radius;
            }
        }

        if let Ok(val) = std::env::var("CLUSTER_DISABLE_AT_ZOOM") {
            if let Ok(zoom) = val.parse() {
                config.default_policy.disable_at_zoom = zoom;
            }
        }

        config
    }

    /// Policy in effect for a layer.
    pub fn for_layer(&self, layer: LayerKind) -> ClusterPolicy {
        self.layers
            .get(&layer)
            .copied()
            .unwrap_or(self.default_policy)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.default_policy.validate()?;
        for (layer, policy) in &self.layers {
            policy
                .validate()
                .map_err(|e| format!("layer {}: {}", layer, e))?;
        }
        Ok(())
    }
}

/// Configuration for fitting the view to a marker set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Margin kept free on each side of the fitted markers.
    pub padding_px: f64,

    /// Never zoom in further than this when fitting.
    pub max_zoom: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            padding_px: 40.0,
            max_zoom: 14.0,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.padding_px.is_finite() || self.padding_px < 0.0 {
            return Err("padding_px must be >= 0".to_string());
        }
        if !(0.0..=22.0).contains(&self.max_zoom) {
            return Err("max_zoom must be between 0 and 22".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_override() {
        let mut config = ClusterConfig::default();
        config.layers.insert(
            EntityType::DivingCenter,
            ClusterPolicy {
                radius_px: 80.0,
                disable_at_zoom: 11,
            },
        );

        assert_eq!(config.for_layer(EntityType::DiveSite), ClusterPolicy::default());
        assert_eq!(config.for_layer(EntityType::DivingCenter).disable_at_zoom, 11);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_layer_named_in_error() {
        let mut config = ClusterConfig::default();
        config.layers.insert(
            EntityType::Dive,
            ClusterPolicy {
                radius_px: -1.0,
                disable_at_zoom: 12,
            },
        );
        let err = config.validate().unwrap_err();
        assert!(err.contains("dive"));
    }
}
