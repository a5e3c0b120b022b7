//! Render descriptors handed to the map layer.
//!
//! Each marker variant has its own icon and popup renderer, picked by
//! matching on [`MarkerEntity`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use clustering::{ClusterGroup, LayerKind};
use overlay_common::{
    Color, DiveSite, DiveSummary, DiveTrip, DivingCenter, EntityType, LatLng, Marker,
    MarkerEntity, MarkerId, Suitability, Viewport, WindOverlay,
};
use suitability::SuitabilityRecord;

/// Border color for a suitability level.
pub fn suitability_color(suitability: Suitability) -> Color {
    match suitability {
        Suitability::Good => Color::hex("#22C55E"),
        Suitability::Caution => Color::hex("#EAB308"),
        Suitability::Difficult => Color::hex("#F97316"),
        Suitability::Avoid => Color::hex("#EF4444"),
        Suitability::Unknown => Color::hex("#9CA3AF"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconDescriptor {
    pub entity_type: EntityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<Color>,
}

/// Popup body, one shape per layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PopupContent {
    DiveSite {
        title: String,
        difficulty: Option<String>,
        max_depth: Option<f64>,
        suitability: Option<Suitability>,
        wind: Option<String>,
    },
    DivingCenter {
        title: String,
        contact: Vec<String>,
    },
    Dive {
        title: String,
        site: Option<String>,
        date: Option<String>,
        details: Option<String>,
    },
    DiveTrip {
        title: String,
        date: Option<String>,
        operator: Option<String>,
        price: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDescriptor {
    pub id: MarkerId,
    pub position: LatLng,
    pub icon: IconDescriptor,
    pub popup: PopupContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterDescriptor {
    pub centroid: LatLng,
    pub member_count: usize,
    pub member_ids: Vec<MarkerId>,
    pub representative_icon: IconDescriptor,
}

/// State of the wind overlay as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OverlayStatus {
    /// The user turned the overlay off.
    Disabled,
    /// Nothing requested yet.
    #[default]
    Idle,
    Loading,
    Ready {
        /// Served past its freshness window while a refresh runs.
        stale: bool,
    },
    Failed {
        message: String,
        /// Whether offering a retry makes sense.
        retryable: bool,
    },
}

/// Everything the map needs to draw one state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Increases with every published frame.
    pub sequence: u64,
    pub viewport: Option<Viewport>,
    pub zoom_bucket: Option<u8>,
    pub markers: Vec<MarkerDescriptor>,
    pub clusters: Vec<ClusterDescriptor>,
    pub overlay_status: OverlayStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<WindOverlay>,
}

impl RenderFrame {
    /// Total markers in the frame, clustered or not.
    pub fn marker_count(&self) -> usize {
        self.markers.len() + self.clusters.iter().map(|c| c.member_count).sum::<usize>()
    }

    pub fn marker(&self, id: &MarkerId) -> Option<&MarkerDescriptor> {
        self.markers.iter().find(|m| m.id == *id)
    }
}

/// Descriptor for a single marker.
pub fn marker_descriptor(marker: &Marker, record: Option<&SuitabilityRecord>) -> MarkerDescriptor {
    let (icon, popup) = match &marker.entity {
        MarkerEntity::DiveSite(site) => render_dive_site(site, record),
        MarkerEntity::DivingCenter(center) => render_diving_center(center),
        MarkerEntity::Dive(dive) => render_dive(dive),
        MarkerEntity::DiveTrip(trip) => render_dive_trip(trip),
    };

    MarkerDescriptor {
        id: marker.id,
        position: marker.position,
        icon,
        popup,
    }
}

fn plain_icon(entity_type: EntityType) -> IconDescriptor {
    IconDescriptor {
        entity_type,
        border_color: None,
    }
}

fn render_dive_site(
    site: &DiveSite,
    record: Option<&SuitabilityRecord>,
) -> (IconDescriptor, PopupContent) {
    let icon = IconDescriptor {
        entity_type: EntityType::DiveSite,
        border_color: record.map(|r| suitability_color(r.suitability)),
    };
    let popup = PopupContent::DiveSite {
        title: site.name.clone(),
        difficulty: site.difficulty_level.clone(),
        max_depth: site.max_depth,
        suitability: record.map(|r| r.suitability),
        wind: record.map(|r| r.reasoning.clone()),
    };
    (icon, popup)
}

fn render_diving_center(center: &DivingCenter) -> (IconDescriptor, PopupContent) {
    let contact = [&center.email, &center.phone, &center.website]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    let popup = PopupContent::DivingCenter {
        title: center.name.clone(),
        contact,
    };
    (plain_icon(EntityType::DivingCenter), popup)
}

fn render_dive(dive: &DiveSummary) -> (IconDescriptor, PopupContent) {
    let details = match (dive.max_depth, dive.duration) {
        (Some(depth), Some(minutes)) => Some(format!("{:.0} m, {} min", depth, minutes)),
        (Some(depth), None) => Some(format!("{:.0} m", depth)),
        (None, Some(minutes)) => Some(format!("{} min", minutes)),
        (None, None) => None,
    };
    let popup = PopupContent::Dive {
        title: dive.name.clone().unwrap_or_else(|| "Dive".to_string()),
        site: dive.dive_site_name.clone(),
        date: dive.dive_date.clone(),
        details,
    };
    (plain_icon(EntityType::Dive), popup)
}

fn render_dive_trip(trip: &DiveTrip) -> (IconDescriptor, PopupContent) {
    let price = trip.price.map(|p| match &trip.currency {
        Some(currency) => format!("{:.2} {}", p, currency),
        None => format!("{:.2}", p),
    });
    let popup = PopupContent::DiveTrip {
        title: trip.trip_name.clone().unwrap_or_else(|| "Dive trip".to_string()),
        date: trip.trip_date.clone(),
        operator: trip.diving_center_name.clone(),
        price,
    };
    (plain_icon(EntityType::DiveTrip), popup)
}

/// Turn clustered layers into descriptors. Singleton groups become plain
/// markers.
pub fn describe_groups(
    layers: &BTreeMap<LayerKind, Vec<ClusterGroup>>,
    markers: &HashMap<MarkerId, &Marker>,
    suitability: &HashMap<MarkerId, SuitabilityRecord>,
) -> (Vec<MarkerDescriptor>, Vec<ClusterDescriptor>) {
    let mut singles = Vec::new();
    let mut clusters = Vec::new();

    for (layer, groups) in layers {
        for group in groups {
            if group.is_singleton() {
                if let Some(marker) = group.member_ids.first().and_then(|id| markers.get(id)) {
                    singles.push(marker_descriptor(marker, suitability.get(&marker.id)));
                }
                continue;
            }
            clusters.push(ClusterDescriptor {
                centroid: group.centroid,
                member_count: group.len(),
                member_ids: group.member_ids.clone(),
                representative_icon: plain_icon(*layer),
            });
        }
    }

    (singles, clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_common::build_markers;
    use test_utils::{dive_record, dive_site_record, dive_trip_record, diving_center_record};

    fn record(marker: &Marker, suitability: Suitability) -> SuitabilityRecord {
        SuitabilityRecord {
            marker_id: marker.id,
            suitability,
            wind_speed: Some(5.0),
            wind_direction: Some(90.0),
            wind_gusts: None,
            onshore: Some(false),
            reasoning: "calm".to_string(),
        }
    }

    #[test]
    fn test_dive_site_border_follows_suitability() {
        let markers = build_markers(vec![dive_site_record(1, 27.2, 33.8, Some(90.0))]);
        let rec = record(&markers[0], Suitability::Avoid);

        let d = marker_descriptor(&markers[0], Some(&rec));
        assert_eq!(d.icon.border_color.as_ref().map(Color::as_str), Some("#EF4444"));
        match d.popup {
            PopupContent::DiveSite { suitability, .. } => {
                assert_eq!(suitability, Some(Suitability::Avoid))
            }
            other => panic!("unexpected popup {:?}", other),
        }

        let d = marker_descriptor(&markers[0], None);
        assert_eq!(d.icon.border_color, None);
    }

    #[test]
    fn test_each_variant_has_its_popup() {
        let markers = build_markers(vec![
            diving_center_record(1, 27.2, 33.8),
            dive_record(2, 27.2, 33.8, Some(1)),
            dive_trip_record(3, 27.2, 33.8),
        ]);

        let center = marker_descriptor(&markers[0], None);
        assert!(matches!(
            center.popup,
            PopupContent::DivingCenter { ref contact, .. } if contact.len() == 1
        ));

        let dive = marker_descriptor(&markers[1], None);
        assert!(matches!(
            dive.popup,
            PopupContent::Dive { details: Some(ref d), .. } if d == "18 m, 45 min"
        ));

        let trip = marker_descriptor(&markers[2], None);
        assert!(matches!(
            trip.popup,
            PopupContent::DiveTrip { price: Some(ref p), .. } if p == "120.00 EUR"
        ));
        assert_eq!(trip.icon.entity_type, EntityType::DiveTrip);
    }

    #[test]
    fn test_frame_serializes() {
        let frame = RenderFrame {
            overlay_status: OverlayStatus::Failed {
                message: "timeout".to_string(),
                retryable: true,
            },
            ..Default::default()
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["overlay_status"]["state"], "failed");
        assert_eq!(json["overlay_status"]["retryable"], true);
        assert!(json.get("wind").is_none());
    }
}
