//! Positions and viewport snapshots.

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// A position usable on the map: finite, in range, and not the (0, 0)
    /// placeholder that upstream records use for "unknown".
    pub fn is_plottable(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
            && !(self.lat == 0.0 && self.lng == 0.0)
    }

    /// Planar distance in degrees, good enough for nearest-sample lookup
    /// over a viewport-sized area.
    pub fn degree_distance(&self, other: &LatLng) -> f64 {
        let dlat = self.lat - other.lat;
        let dlng = self.lng - other.lng;
        (dlat * dlat + dlng * dlng).sqrt()
    }
}

/// Immutable snapshot of the visible map region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: Bounds,
    pub center: LatLng,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(bounds: Bounds, center: LatLng, zoom: f64) -> Self {
        Self {
            bounds,
            center,
            zoom,
        }
    }

    /// Integer zoom bucket used for clustering and cache keys.
    pub fn zoom_bucket(&self) -> u8 {
        zoom_bucket(self.zoom)
    }
}

/// Round a fractional zoom into the 0..=22 bucket range.
pub fn zoom_bucket(zoom: f64) -> u8 {
    if !zoom.is_finite() {
        return 0;
    }
    zoom.round().clamp(0.0, 22.0) as u8
}
