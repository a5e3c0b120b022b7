//! Common types shared across the dive map overlay crates.

pub mod bounds;
pub mod clock;
pub mod color;
pub mod error;
pub mod geo;
pub mod marker;
pub mod time;
pub mod wind;

pub use bounds::{Bounds, BoundsParseError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use color::Color;
pub use error::{OverlayError, OverlayResult};
pub use geo::{zoom_bucket, LatLng, Viewport};
pub use marker::{
    build_markers, DiveSite, DiveSummary, DiveTrip, DivingCenter, EntityType, Marker,
    MarkerEntity, MarkerId, MarkerRecord,
};
pub use time::{TimeSlice, DATETIME_PARAM_FORMAT};
pub use wind::{
    SampleSource, Suitability, WindOverlay, WindPoint, WindRecommendation, WindSample,
};
