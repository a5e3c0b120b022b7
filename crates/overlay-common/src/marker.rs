//! Map markers and the upstream records they are built from.
//!
//! Markers are never patched in place: whenever the record set changes the
//! whole marker list is rebuilt with [`build_markers`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geo::LatLng;

/// Logical marker layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    DiveSite,
    DivingCenter,
    Dive,
    DiveTrip,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::DiveSite => "dive_site",
            EntityType::DivingCenter => "diving_center",
            EntityType::Dive => "dive",
            EntityType::DiveTrip => "dive_trip",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker identity. Record ids are only unique within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkerId {
    pub entity_type: EntityType,
    pub id: i64,
}

impl MarkerId {
    pub fn new(entity_type: EntityType, id: i64) -> Self {
        Self { entity_type, id }
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiveSite {
    pub name: String,
    /// Compass bearing the shoreline faces, in degrees.
    #[serde(default)]
    pub shore_direction: Option<f64>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub max_depth: Option<f64>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DivingCenter {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiveSummary {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dive_site_id: Option<i64>,
    #[serde(default)]
    pub dive_site_name: Option<String>,
    #[serde(default)]
    pub dive_date: Option<String>,
    #[serde(default)]
    pub max_depth: Option<f64>,
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiveTrip {
    #[serde(default)]
    pub trip_name: Option<String>,
    #[serde(default)]
    pub trip_date: Option<String>,
    #[serde(default)]
    pub diving_center_name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Domain payload of a marker, one variant per layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity_type", rename_all = "snake_case")]
pub enum MarkerEntity {
    DiveSite(DiveSite),
    DivingCenter(DivingCenter),
    Dive(DiveSummary),
    DiveTrip(DiveTrip),
}

impl MarkerEntity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            MarkerEntity::DiveSite(_) => EntityType::DiveSite,
            MarkerEntity::DivingCenter(_) => EntityType::DivingCenter,
            MarkerEntity::Dive(_) => EntityType::Dive,
            MarkerEntity::DiveTrip(_) => EntityType::DiveTrip,
        }
    }
}

/// A record as supplied by the data provider: `{id, lat, lng, entity_type, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    pub id: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(flatten)]
    pub entity: MarkerEntity,
}

/// A plottable marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub position: LatLng,
    pub entity: MarkerEntity,
}

impl Marker {
    /// Build a marker, or `None` when the record has no usable position.
    pub fn from_record(record: MarkerRecord) -> Option<Self> {
        let position = LatLng::new(record.lat?, record.lng?);
        if !position.is_plottable() {
            return None;
        }
        Some(Self {
            id: MarkerId::new(record.entity.entity_type(), record.id),
            position,
            entity: record.entity,
        })
    }

    pub fn entity_type(&self) -> EntityType {
        self.id.entity_type
    }

    /// Shore orientation, only known for dive sites.
    pub fn shore_direction(&self) -> Option<f64> {
        match &self.entity {
            MarkerEntity::DiveSite(site) => site.shore_direction.filter(|d| d.is_finite()),
            _ => None,
        }
    }

    pub fn dive_site_id(&self) -> Option<i64> {
        match &self.entity {
            MarkerEntity::DiveSite(_) => Some(self.id.id),
            MarkerEntity::Dive(dive) => dive.dive_site_id,
            _ => None,
        }
    }
}

/// Turn raw records into markers, dropping unplottable and duplicate ones.
///
/// A bad record never aborts the batch; each drop is logged.
pub fn build_markers<I>(records: I) -> Vec<Marker>
where
    I: IntoIterator<Item = MarkerRecord>,
{
    let mut seen = HashSet::new();
    let mut markers = Vec::new();
    let mut dropped = 0usize;

    for record in records {
        let id = MarkerId::new(record.entity.entity_type(), record.id);
        let (lat, lng) = (record.lat, record.lng);
        let Some(marker) = Marker::from_record(record) else {
            warn!(marker = %id, ?lat, ?lng, "Dropping marker with invalid coordinates");
            dropped += 1;
            continue;
        };
        if !seen.insert(marker.id) {
            warn!(marker = %marker.id, "Dropping duplicate marker id");
            dropped += 1;
            continue;
        }
        markers.push(marker);
    }

    debug!(kept = markers.len(), dropped = dropped, "Rebuilt marker set");
    markers
}
