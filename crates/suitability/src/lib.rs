//! Dive-site suitability from wind speed and shore exposure.
//!
//! Wind speed picks a band (`good` < 6.2 m/s ≤ `caution` < 7.7 ≤ `difficult`
//! < 10 ≤ `avoid`); onshore wind worsens it by one. Sites without a known
//! shore orientation are always `unknown`.

pub mod annotator;
pub mod band;
pub mod config;

pub use annotator::{SuitabilityAnnotator, SuitabilityRecord};
pub use band::{angular_difference, band_for_speed, is_onshore};
pub use config::SuitabilityConfig;
