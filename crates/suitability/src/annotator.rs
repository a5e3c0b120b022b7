//! Per-marker suitability records.

use serde::{Deserialize, Serialize};
use tracing::debug;

use overlay_common::{Marker, MarkerId, Suitability, WindOverlay, WindSample};

use crate::band::{band_for_speed, compass_point, is_onshore};
use crate::config::SuitabilityConfig;

/// Suitability of one marker under the current wind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuitabilityRecord {
    pub marker_id: MarkerId,
    pub suitability: Suitability,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_gusts: Option<f64>,
    /// Whether the wind was judged onshore. `None` when it could not be.
    pub onshore: Option<bool>,
    pub reasoning: String,
}

/// Derives [`SuitabilityRecord`]s from wind samples and shore orientation.
#[derive(Debug, Clone, Default)]
pub struct SuitabilityAnnotator {
    config: SuitabilityConfig,
}

impl SuitabilityAnnotator {
    pub fn new(config: SuitabilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SuitabilityConfig {
        &self.config
    }

    /// Classify one marker.
    ///
    /// Without a shore orientation the result is always `unknown`: the
    /// exposure of the site cannot be judged regardless of wind speed.
    pub fn annotate(
        &self,
        marker: &Marker,
        wind: Option<&WindSample>,
        orientation: Option<f64>,
    ) -> SuitabilityRecord {
        let mut record = SuitabilityRecord {
            marker_id: marker.id,
            suitability: Suitability::Unknown,
            wind_speed: wind.map(|w| w.speed),
            wind_direction: wind.map(|w| w.direction),
            wind_gusts: wind.and_then(|w| w.gusts),
            onshore: None,
            reasoning: String::new(),
        };

        let Some(shore) = orientation.filter(|o| o.is_finite()) else {
            record.reasoning =
                "Shore orientation unknown for this site; wind exposure cannot be assessed"
                    .to_string();
            return record;
        };

        let Some(wind) = wind else {
            record.reasoning = "No wind data available for this site".to_string();
            return record;
        };

        let base = band_for_speed(wind.speed, &self.config);
        if base == Suitability::Unknown || !wind.direction.is_finite() {
            record.reasoning = "Wind reading is invalid".to_string();
            return record;
        }

        let onshore = is_onshore(wind.direction, shore, self.config.onshore_half_angle_deg);
        record.onshore = Some(onshore);
        record.suitability = if onshore { base.worsen() } else { base };

        let gusts = match wind.gusts {
            Some(g) => format!(", gusts {:.1} m/s", g),
            None => String::new(),
        };
        let exposure = if onshore {
            format!("onshore for a shore facing {}", compass_point(shore))
        } else {
            format!("offshore or cross-shore for a shore facing {}", compass_point(shore))
        };
        record.reasoning = format!(
            "Wind {:.1} m/s from {} ({:.0}°){}; {}",
            wind.speed,
            compass_point(wind.direction),
            wind.direction,
            gusts,
            exposure
        );

        record
    }

    /// Wind sample attributed to a marker: the server's per-site values for
    /// a dive site when present, else the nearest wind point in range.
    pub fn wind_sample_for(&self, marker: &Marker, overlay: &WindOverlay) -> Option<WindSample> {
        overlay.sample_for(
            marker.dive_site_id(),
            &marker.position,
            self.config.max_sample_distance_deg,
        )
    }

    /// Annotate a whole marker set against an overlay (or none).
    pub fn annotate_all(
        &self,
        markers: &[Marker],
        overlay: Option<&WindOverlay>,
    ) -> Vec<SuitabilityRecord> {
        let records: Vec<_> = markers
            .iter()
            .map(|marker| {
                let sample = overlay.and_then(|o| self.wind_sample_for(marker, o));
                self.annotate(marker, sample.as_ref(), marker.shore_direction())
            })
            .collect();

        debug!(
            markers = records.len(),
            unknown = records
                .iter()
                .filter(|r| r.suitability == Suitability::Unknown)
                .count(),
            "Annotated markers"
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_common::{DiveSite, LatLng, MarkerEntity, SampleSource};

    fn site(shore: Option<f64>) -> Marker {
        Marker {
            id: MarkerId::new(overlay_common::EntityType::DiveSite, 7),
            position: LatLng::new(27.2, 33.8),
            entity: MarkerEntity::DiveSite(DiveSite {
                name: "Reef".to_string(),
                shore_direction: shore,
                difficulty_level: None,
                max_depth: None,
                country: None,
            }),
        }
    }

    fn wind(speed: f64, direction: f64) -> WindSample {
        WindSample {
            speed,
            direction,
            gusts: None,
            source: SampleSource::NearestPoint,
        }
    }

    #[test]
    fn test_missing_orientation_is_unknown() {
        let annotator = SuitabilityAnnotator::default();
        for speed in [0.0, 5.0, 8.0, 30.0] {
            let r = annotator.annotate(&site(None), Some(&wind(speed, 90.0)), None);
            assert_eq!(r.suitability, Suitability::Unknown);
            assert!(r.reasoning.contains("orientation"));
            assert_eq!(r.wind_speed, Some(speed));
        }
    }

    #[test]
    fn test_missing_wind_is_unknown() {
        let annotator = SuitabilityAnnotator::default();
        let r = annotator.annotate(&site(Some(90.0)), None, Some(90.0));
        assert_eq!(r.suitability, Suitability::Unknown);
        assert!(r.reasoning.contains("No wind data"));
    }

    #[test]
    fn test_offshore_keeps_band() {
        let annotator = SuitabilityAnnotator::default();
        let r = annotator.annotate(&site(Some(90.0)), Some(&wind(6.2, 270.0)), Some(90.0));
        assert_eq!(r.suitability, Suitability::Caution);
        assert_eq!(r.onshore, Some(false));
    }

    #[test]
    fn test_onshore_worsens_one_band() {
        let annotator = SuitabilityAnnotator::default();
        let r = annotator.annotate(&site(Some(90.0)), Some(&wind(5.0, 100.0)), Some(90.0));
        assert_eq!(r.suitability, Suitability::Caution);
        assert_eq!(r.onshore, Some(true));
        assert!(r.reasoning.contains("onshore"));

        let r = annotator.annotate(&site(Some(90.0)), Some(&wind(12.0, 90.0)), Some(90.0));
        assert_eq!(r.suitability, Suitability::Avoid);
    }

    #[test]
    fn test_reasoning_mentions_gusts() {
        let annotator = SuitabilityAnnotator::default();
        let mut w = wind(4.0, 0.0);
        w.gusts = Some(9.5);
        let r = annotator.annotate(&site(Some(180.0)), Some(&w), Some(180.0));
        assert_eq!(r.suitability, Suitability::Good);
        assert!(r.reasoning.contains("gusts 9.5"));
        assert_eq!(r.wind_gusts, Some(9.5));
    }
}
