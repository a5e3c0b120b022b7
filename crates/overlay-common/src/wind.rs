//! Wind overlay data as returned by the wind and recommendation endpoints.

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// Qualitative rating of conditions at a dive site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suitability {
    Good,
    Caution,
    Difficult,
    Avoid,
    #[serde(other)]
    Unknown,
}

impl Suitability {
    /// One band worse, saturating at `Avoid`. `Unknown` stays unknown.
    pub fn worsen(self) -> Self {
        match self {
            Suitability::Good => Suitability::Caution,
            Suitability::Caution => Suitability::Difficult,
            Suitability::Difficult | Suitability::Avoid => Suitability::Avoid,
            Suitability::Unknown => Suitability::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Suitability::Good => "good",
            Suitability::Caution => "caution",
            Suitability::Difficult => "difficult",
            Suitability::Avoid => "avoid",
            Suitability::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Suitability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sample of the wind field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindPoint {
    pub lat: f64,
    pub lng: f64,
    /// m/s
    pub speed: f64,
    /// Degrees, meteorological convention (direction the wind comes from).
    pub direction: f64,
    #[serde(default)]
    pub gusts: Option<f64>,
}

impl WindPoint {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    fn is_well_formed(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && self.speed.is_finite()
            && self.speed >= 0.0
            && self.direction.is_finite()
            && self.gusts.map_or(true, |g| g.is_finite() && g >= 0.0)
    }
}

/// Server-side recommendation for one dive site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindRecommendation {
    pub dive_site_id: i64,
    pub suitability: Suitability,
    pub wind_speed: f64,
    pub wind_direction: f64,
    #[serde(default)]
    pub wind_gusts: Option<f64>,
    #[serde(default)]
    pub reasoning: String,
}

/// Where a wind sample for a marker came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSource {
    SiteRecommendation,
    NearestPoint,
}

/// Wind conditions attributed to one marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    pub speed: f64,
    pub direction: f64,
    pub gusts: Option<f64>,
    pub source: SampleSource,
}

/// The cached overlay value: wind field plus per-site recommendations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindOverlay {
    #[serde(default)]
    pub points: Vec<WindPoint>,
    #[serde(default)]
    pub recommendations: Vec<WindRecommendation>,
}

impl WindOverlay {
    pub fn new(points: Vec<WindPoint>, recommendations: Vec<WindRecommendation>) -> Self {
        Self {
            points,
            recommendations,
        }
    }

    /// Shape check run before a cached overlay is served.
    pub fn is_well_formed(&self) -> bool {
        self.points.iter().all(WindPoint::is_well_formed)
            && self
                .recommendations
                .iter()
                .all(|r| r.wind_speed.is_finite() && r.wind_direction.is_finite())
    }

    pub fn recommendation_for(&self, dive_site_id: i64) -> Option<&WindRecommendation> {
        self.recommendations
            .iter()
            .find(|r| r.dive_site_id == dive_site_id)
    }

    /// Nearest wind point within `max_distance_deg`. Ties keep the earlier point.
    pub fn nearest_point(&self, position: &LatLng, max_distance_deg: f64) -> Option<&WindPoint> {
        let mut best: Option<(&WindPoint, f64)> = None;
        for point in &self.points {
            let d = position.degree_distance(&point.position());
            if d > max_distance_deg {
                continue;
            }
            match best {
                Some((_, best_d)) if best_d <= d => {}
                _ => best = Some((point, d)),
            }
        }
        best.map(|(p, _)| p)
    }

    /// Wind sample for a marker: the site's own recommendation when one is
    /// present, otherwise the nearest point of the field.
    pub fn sample_for(
        &self,
        dive_site_id: Option<i64>,
        position: &LatLng,
        max_distance_deg: f64,
    ) -> Option<WindSample> {
        if let Some(rec) = dive_site_id.and_then(|id| self.recommendation_for(id)) {
            return Some(WindSample {
                speed: rec.wind_speed,
                direction: rec.wind_direction,
                gusts: rec.wind_gusts,
                source: SampleSource::SiteRecommendation,
            });
        }

        self.nearest_point(position, max_distance_deg)
            .map(|p| WindSample {
                speed: p.speed,
                direction: p.direction,
                gusts: p.gusts,
                source: SampleSource::NearestPoint,
            })
    }
}
