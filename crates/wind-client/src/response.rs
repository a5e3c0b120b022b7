//! Response bodies of the two endpoints.

use serde::{Deserialize, Serialize};

use overlay_common::{WindOverlay, WindPoint, WindRecommendation};

/// Body of `GET /wind`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindFieldResponse {
    #[serde(default)]
    pub points: Vec<WindPoint>,
}

/// Body of `GET /wind-recommendations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(default)]
    pub recommendations: Vec<WindRecommendation>,
}

/// Merge both bodies into the cached overlay value.
pub fn merge(field: WindFieldResponse, recommendations: RecommendationsResponse) -> WindOverlay {
    WindOverlay::new(field.points, recommendations.recommendations)
}
