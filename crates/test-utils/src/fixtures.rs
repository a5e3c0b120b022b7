//! Common test fixtures for overlay tests.
//!
//! Pre-built viewports, marker records and wind overlays for the scenarios
//! that keep coming up across the workspace.

use chrono::{DateTime, TimeZone, Utc};
use overlay_common::{
    Bounds, DiveSite, DiveSummary, DiveTrip, DivingCenter, MarkerEntity, MarkerRecord, Suitability,
    WindOverlay, WindPoint, WindRecommendation,
};

/// Common viewport bounds for testing.
pub mod bounds {
    use overlay_common::Bounds;

    /// Roughly the Red Sea coast around Hurghada (zoom ~8 viewport)
    pub const RED_SEA: Bounds = Bounds {
        north: 27.8,
        south: 26.8,
        east: 34.4,
        west: 33.4,
    };

    /// The same viewport panned a quarter width east
    pub const RED_SEA_PANNED: Bounds = Bounds {
        north: 27.8,
        south: 26.8,
        east: 34.65,
        west: 33.65,
    };

    /// Far away from [`RED_SEA`]; never overlaps it
    pub const CARIBBEAN: Bounds = Bounds {
        north: 18.5,
        south: 17.5,
        east: -64.5,
        west: -65.5,
    };

    /// Zero-height strip
    pub const DEGENERATE: Bounds = Bounds {
        north: 27.0,
        south: 27.0,
        east: 34.0,
        west: 33.0,
    };
}

/// A fixed instant used as "now" in time-dependent tests: 2024-06-01 09:30 UTC.
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
}

/// Dive-site record with an optional shore orientation.
pub fn dive_site_record(id: i64, lat: f64, lng: f64, shore_direction: Option<f64>) -> MarkerRecord {
    MarkerRecord {
        id,
        lat: Some(lat),
        lng: Some(lng),
        entity: MarkerEntity::DiveSite(DiveSite {
            name: format!("Site {}", id),
            shore_direction,
            difficulty_level: Some("intermediate".to_string()),
            max_depth: Some(30.0),
            country: Some("Egypt".to_string()),
        }),
    }
}

pub fn diving_center_record(id: i64, lat: f64, lng: f64) -> MarkerRecord {
    MarkerRecord {
        id,
        lat: Some(lat),
        lng: Some(lng),
        entity: MarkerEntity::DivingCenter(DivingCenter {
            name: format!("Center {}", id),
            email: Some(format!("center{}@example.com", id)),
            phone: None,
            website: None,
        }),
    }
}

pub fn dive_record(id: i64, lat: f64, lng: f64, dive_site_id: Option<i64>) -> MarkerRecord {
    MarkerRecord {
        id,
        lat: Some(lat),
        lng: Some(lng),
        entity: MarkerEntity::Dive(DiveSummary {
            name: Some(format!("Dive {}", id)),
            dive_site_id,
            dive_site_name: dive_site_id.map(|s| format!("Site {}", s)),
            dive_date: Some("2024-05-30".to_string()),
            max_depth: Some(18.0),
            duration: Some(45),
        }),
    }
}

pub fn dive_trip_record(id: i64, lat: f64, lng: f64) -> MarkerRecord {
    MarkerRecord {
        id,
        lat: Some(lat),
        lng: Some(lng),
        entity: MarkerEntity::DiveTrip(DiveTrip {
            trip_name: Some(format!("Trip {}", id)),
            trip_date: Some("2024-06-10".to_string()),
            diving_center_name: Some("Blue Water".to_string()),
            price: Some(120.0),
            currency: Some("EUR".to_string()),
        }),
    }
}

/// A handful of dive sites inside [`bounds::RED_SEA`].
pub fn red_sea_sites() -> Vec<MarkerRecord> {
    vec![
        dive_site_record(1, 27.25, 33.85, Some(90.0)),
        dive_site_record(2, 27.30, 33.90, Some(270.0)),
        dive_site_record(3, 27.10, 34.00, None),
        dive_site_record(4, 26.95, 33.70, Some(180.0)),
    ]
}

pub fn wind_point(lat: f64, lng: f64, speed: f64, direction: f64) -> WindPoint {
    WindPoint {
        lat,
        lng,
        speed,
        direction,
        gusts: None,
    }
}

pub fn recommendation(dive_site_id: i64, speed: f64, direction: f64) -> WindRecommendation {
    WindRecommendation {
        dive_site_id,
        suitability: Suitability::Unknown,
        wind_speed: speed,
        wind_direction: direction,
        wind_gusts: None,
        reasoning: String::new(),
    }
}

/// Uniform wind over `bounds`, one point at the center.
pub fn uniform_overlay(bounds: &Bounds, speed: f64, direction: f64) -> WindOverlay {
    let c = bounds.center();
    WindOverlay::new(vec![wind_point(c.lat, c.lng, speed, direction)], vec![])
}

/// Overlay that fails the shape check.
pub fn malformed_overlay() -> WindOverlay {
    WindOverlay::new(vec![wind_point(27.0, 34.0, f64::NAN, 90.0)], vec![])
}
