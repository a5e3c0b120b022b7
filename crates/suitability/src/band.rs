//! Speed bands and wind/shore geometry.

use overlay_common::Suitability;

use crate::config::SuitabilityConfig;

/// Band for a wind speed in m/s. Lower bounds are inclusive.
pub fn band_for_speed(speed: f64, config: &SuitabilityConfig) -> Suitability {
    if !speed.is_finite() || speed < 0.0 {
        return Suitability::Unknown;
    }

    if speed >= config.avoid_from_ms {
        Suitability::Avoid
    } else if speed >= config.difficult_from_ms {
        Suitability::Difficult
    } else if speed >= config.caution_from_ms {
        Suitability::Caution
    } else {
        Suitability::Good
    }
}

/// Smallest angle between two compass bearings, in `0..=180`.
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Whether wind coming from `wind_from` blows onto a shore facing
/// `shore_bearing`. Both are compass bearings in degrees.
pub fn is_onshore(wind_from: f64, shore_bearing: f64, half_angle: f64) -> bool {
    angular_difference(wind_from, shore_bearing) <= half_angle
}

/// 16-point compass label for a bearing.
pub fn compass_point(bearing: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let idx = ((bearing.rem_euclid(360.0) / 22.5).round() as usize) % 16;
    POINTS[idx]
}
