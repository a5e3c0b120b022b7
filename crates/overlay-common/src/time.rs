//! Time slices for the wind overlay.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

/// Format of the upstream `datetime_str` query parameter.
pub const DATETIME_PARAM_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// An hourly slice of the forecast timeline.
///
/// Always truncated to the start of the hour so that two requests for the
/// same hour share a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlice(DateTime<Utc>);

impl TimeSlice {
    /// Bucket an arbitrary instant into its hour.
    pub fn containing(dt: DateTime<Utc>) -> Self {
        let truncated = dt
            .with_minute(0)
            .and_then(|d| d.with_second(0))
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(dt);
        Self(truncated)
    }

    /// The slice at `hour` o'clock UTC on `date`. Hours past 23 are clamped.
    pub fn at_hour(date: NaiveDate, hour: u32) -> Self {
        let naive = date.and_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
        Self(Utc.from_utc_datetime(&naive))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    pub fn plus_hours(&self, hours: i64) -> Self {
        Self(self.0 + Duration::hours(hours))
    }

    /// Value for the upstream `datetime_str` parameter.
    pub fn to_query_param(&self) -> String {
        self.0.format(DATETIME_PARAM_FORMAT).to_string()
    }

    /// Parse from ISO 8601 (with or without offset) or a bare date.
    pub fn parse(s: &str) -> Result<Self, OverlayError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::containing(dt.with_timezone(&Utc)));
        }

        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, DATETIME_PARAM_FORMAT) {
            return Ok(Self::containing(Utc.from_utc_datetime(&ndt)));
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::at_hour(date, 0));
        }

        Err(OverlayError::InvalidTime(s.to_string()))
    }
}

impl std::fmt::Display for TimeSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%HZ"))
    }
}
