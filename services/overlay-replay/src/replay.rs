//! Replaying recorded map sessions.
//!
//! A session file is a JSON array of steps:
//!
//! ```json
//! [
//!   {"action": "move", "bounds": {"north": 27.8, "south": 26.8, "east": 34.4, "west": 33.4}, "zoom": 8},
//!   {"action": "wait", "ms": 1500},
//!   {"action": "time_slice", "time": "2024-06-02T12:00:00Z"},
//!   {"action": "overlay", "enabled": false},
//!   {"action": "fit_reset"},
//!   {"action": "retry"}
//! ]
//! ```

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use overlay_common::{Bounds, LatLng, MarkerRecord, WindOverlay};
use overlay_cache::OverlaySource;
use viewport::{MapMoveEvent, MoveOrigin, RenderFrame, ViewportController};

fn default_user() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReplayStep {
    Move {
        bounds: Bounds,
        zoom: f64,
        /// Defaults to the center of `bounds`.
        #[serde(default)]
        center: Option<LatLng>,
        /// `false` for moves the application made itself.
        #[serde(default = "default_user")]
        user: bool,
    },
    Wait {
        ms: u64,
    },
    TimeSlice {
        /// `null` selects the live overlay.
        #[serde(default)]
        time: Option<DateTime<Utc>>,
    },
    Overlay {
        enabled: bool,
    },
    FitReset,
    Retry,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub frames: usize,
}

/// Read marker records from a JSON array. Records that do not parse are
/// logged and skipped; only an unreadable file or a non-array document is an
/// error.
pub fn load_markers(path: &Path) -> Result<Vec<MarkerRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read markers file {}", path.display()))?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse markers file {}", path.display()))?;

    let total = values.len();
    let records: Vec<MarkerRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let id = value.get("id").cloned();
            match serde_json::from_value::<MarkerRecord>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(index, ?id, error = %e, "Skipping unparseable marker record");
                    None
                }
            }
        })
        .collect();

    if records.len() < total {
        warn!(
            kept = records.len(),
            skipped = total - records.len(),
            path = %path.display(),
            "Some marker records were skipped"
        );
    }
    Ok(records)
}

pub fn load_steps(path: &Path) -> Result<Vec<ReplayStep>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session file {}", path.display()))
}

/// Apply one step to the controller.
pub async fn apply_step<S>(controller: &ViewportController<S>, step: &ReplayStep)
where
    S: OverlaySource<Data = WindOverlay>,
{
    match step {
        ReplayStep::Move {
            bounds,
            zoom,
            center,
            user,
        } => {
            let origin = if *user {
                MoveOrigin::User
            } else {
                MoveOrigin::Programmatic
            };
            controller
                .on_map_move(MapMoveEvent {
                    bounds: *bounds,
                    center: center.unwrap_or_else(|| bounds.center()),
                    zoom: *zoom,
                    origin,
                })
                .await;
        }
        ReplayStep::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
        ReplayStep::TimeSlice { time } => controller.set_time_slice(*time).await,
        ReplayStep::Overlay { enabled } => controller.set_overlay_enabled(*enabled).await,
        ReplayStep::FitReset => controller.request_fit_reset().await,
        ReplayStep::Retry => controller.retry_overlay().await,
    }
}

/// Drive `controller` through `steps`, writing every frame it publishes to
/// `out` as one JSON line. Frames published in quick succession may be
/// coalesced into the latest one.
pub async fn replay<S, W>(
    controller: &ViewportController<S>,
    markers: Vec<MarkerRecord>,
    steps: Vec<ReplayStep>,
    out: &mut W,
) -> Result<ReplaySummary>
where
    S: OverlaySource<Data = WindOverlay>,
    W: Write,
{
    let mut frames = controller.frames();
    frames.borrow_and_update();

    let step_count = steps.len();
    let driver_controller = controller.clone();
    let mut driver = tokio::spawn(async move {
        driver_controller.set_markers(markers).await;
        for (i, step) in steps.iter().enumerate() {
            debug!(step = i, ?step, "Applying replay step");
            apply_step(&driver_controller, step).await;
        }
    });

    let mut summary = ReplaySummary {
        steps: step_count,
        frames: 0,
    };

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                write_frame(out, &frame)?;
                summary.frames += 1;
            }
            finished = &mut driver => {
                finished.context("Replay task failed")?;
                break;
            }
        }
    }

    if frames.has_changed().unwrap_or(false) {
        let frame = frames.borrow_and_update().clone();
        write_frame(out, &frame)?;
        summary.frames += 1;
    }

    controller.shutdown().await;

    let stats = controller.cache_stats();
    info!(
        steps = summary.steps,
        frames = summary.frames,
        fetches = stats.fetches,
        hit_rate_pct = stats.hit_rate(),
        "Replay finished"
    );

    Ok(summary)
}

fn write_frame<W: Write>(out: &mut W, frame: &RenderFrame) -> Result<()> {
    serde_json::to_writer(&mut *out, frame).context("Failed to serialize frame")?;
    writeln!(out).context("Failed to write frame")?;
    Ok(())
}
