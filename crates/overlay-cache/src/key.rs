//! Canonical cache keys for overlay requests.
//!
//! Raw viewports are snapped to a coarse grid so that near-identical
//! requests share one key. The request payload is built from the original
//! (padded) bounds; only the key is coarse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use overlay_common::{zoom_bucket, Bounds, OverlayError, OverlayResult, TimeSlice};

use crate::config::NormalizerConfig;

const MICRO_DEGREES: f64 = 1_000_000.0;

/// Float noise below this fraction of a cell is snapped away before rounding,
/// so 0.25 / 0.1 = 2.4999999999999996 still rounds half away from zero.
const CELL_SNAP: f64 = 1e9;

/// Identifier of the time slice a key belongs to; `None` is the live overlay.
pub type KeyFamily = Option<TimeSlice>;

/// Canonical, immutable cache key.
///
/// Bounds are stored as integer grid-cell indices so equality and hashing
/// never compare floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    north_cell: i64,
    south_cell: i64,
    east_cell: i64,
    west_cell: i64,
    step_micro_deg: u64,
    pub zoom_bucket: u8,
    pub time_slice: Option<TimeSlice>,
}

impl CacheKey {
    /// Grid step in degrees.
    pub fn grid_step(&self) -> f64 {
        self.step_micro_deg as f64 / MICRO_DEGREES
    }

    /// The snapped bounds this key stands for.
    pub fn cell_bounds(&self) -> Bounds {
        Bounds::new(
            cell_to_degrees(self.north_cell, self.step_micro_deg),
            cell_to_degrees(self.south_cell, self.step_micro_deg),
            cell_to_degrees(self.east_cell, self.step_micro_deg),
            cell_to_degrees(self.west_cell, self.step_micro_deg),
        )
    }

    pub fn family(&self) -> KeyFamily {
        self.time_slice
    }

    /// Same spatial key for a different time slice.
    pub fn with_time_slice(&self, time_slice: Option<TimeSlice>) -> Self {
        Self { time_slice, ..*self }
    }

    /// Whether the two keys cover overlapping ground (edges included).
    pub fn overlaps(&self, other: &CacheKey) -> bool {
        self.cell_bounds().overlaps_closed(&other.cell_bounds())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let b = self.cell_bounds();
        write!(
            f,
            "{}_{}_{}_{}:z{}:{}",
            b.north,
            b.south,
            b.east,
            b.west,
            self.zoom_bucket,
            self.time_slice
                .map(|t| t.to_string())
                .unwrap_or_else(|| "live".to_string())
        )
    }
}

/// The payload actually sent upstream for a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayQuery {
    /// Original bounds grown by the padding margin.
    pub bounds: Bounds,
    pub zoom_level: u8,
    pub time_slice: Option<TimeSlice>,
}

/// A key together with the query that fills it.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRequest {
    pub key: CacheKey,
    pub query: OverlayQuery,
}

/// Turns raw bounds + zoom + time into canonical cache keys.
#[derive(Debug, Clone)]
pub struct CacheKeyNormalizer {
    config: NormalizerConfig,
    step_micro_deg: u64,
}

impl Default for CacheKeyNormalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl CacheKeyNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        let step_micro_deg = ((config.grid_step * MICRO_DEGREES).round() as u64).max(1);
        Self {
            config,
            step_micro_deg,
        }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Canonical key for a viewport. Degenerate bounds are refused so the
    /// caller can skip the fetch.
    pub fn normalize(
        &self,
        bounds: &Bounds,
        zoom: f64,
        time: Option<DateTime<Utc>>,
    ) -> OverlayResult<CacheKey> {
        if bounds.is_degenerate() {
            return Err(OverlayError::InvalidBounds(format!(
                "zero-area or inverted bounds: n={} s={} e={} w={}",
                bounds.north, bounds.south, bounds.east, bounds.west
            )));
        }

        Ok(CacheKey {
            north_cell: degrees_to_cell(bounds.north, self.step_micro_deg),
            south_cell: degrees_to_cell(bounds.south, self.step_micro_deg),
            east_cell: degrees_to_cell(bounds.east, self.step_micro_deg),
            west_cell: degrees_to_cell(bounds.west, self.step_micro_deg),
            step_micro_deg: self.step_micro_deg,
            zoom_bucket: zoom_bucket(zoom),
            time_slice: time.map(TimeSlice::containing),
        })
    }

    /// The rounding step of [`normalize`](Self::normalize) on its own.
    /// Idempotent for every input, including degenerate ones.
    pub fn snap_bounds(&self, bounds: &Bounds) -> Bounds {
        let snap = |v: f64| {
            cell_to_degrees(degrees_to_cell(v, self.step_micro_deg), self.step_micro_deg)
        };
        Bounds::new(
            snap(bounds.north),
            snap(bounds.south),
            snap(bounds.east),
            snap(bounds.west),
        )
    }

    /// Upstream query for a viewport: original bounds plus the padding margin.
    pub fn padded_query(
        &self,
        bounds: &Bounds,
        zoom: f64,
        time: Option<DateTime<Utc>>,
    ) -> OverlayQuery {
        OverlayQuery {
            bounds: bounds.padded(self.config.padding_fraction),
            zoom_level: zoom_bucket(zoom),
            time_slice: time.map(TimeSlice::containing),
        }
    }

    /// Key and query for one viewport.
    pub fn request(
        &self,
        bounds: &Bounds,
        zoom: f64,
        time: Option<DateTime<Utc>>,
    ) -> OverlayResult<OverlayRequest> {
        Ok(OverlayRequest {
            key: self.normalize(bounds, zoom, time)?,
            query: self.padded_query(bounds, zoom, time),
        })
    }
}

fn degrees_to_cell(value: f64, step_micro_deg: u64) -> i64 {
    let cells = value * MICRO_DEGREES / step_micro_deg as f64;
    let snapped = (cells * CELL_SNAP).round() / CELL_SNAP;
    // f64::round is half-away-from-zero
    snapped.round() as i64
}

fn cell_to_degrees(cell: i64, step_micro_deg: u64) -> f64 {
    (cell as f64 * step_micro_deg as f64) / MICRO_DEGREES
}
