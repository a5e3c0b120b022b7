//! Center and zoom that show a whole marker set.

use serde::{Deserialize, Serialize};
use tracing::debug;

use overlay_common::{Bounds, LatLng, Marker};

use crate::config::FitConfig;
use crate::projection::{from_world_pixel, to_world_pixel, PixelPoint};

/// A view that frames a set of positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitView {
    pub center: LatLng,
    pub zoom: f64,
}

/// Fit a viewport of `width_px` x `height_px` to `markers`.
pub fn fit_markers(
    markers: &[Marker],
    width_px: f64,
    height_px: f64,
    config: &FitConfig,
) -> Option<FitView> {
    let positions: Vec<LatLng> = markers.iter().map(|m| m.position).collect();
    fit_positions(&positions, width_px, height_px, config)
}

/// Fit a viewport of `width_px` x `height_px` to `positions`.
///
/// Returns `None` for an empty set. A set whose enclosing box has no area
/// (one marker, or markers on a line of latitude/longitude) falls back to
/// [`heuristic_view`].
pub fn fit_positions(
    positions: &[LatLng],
    width_px: f64,
    height_px: f64,
    config: &FitConfig,
) -> Option<FitView> {
    let bounds = Bounds::enclosing(positions.iter())?;

    if bounds.is_degenerate() {
        let view = heuristic_view(&bounds, config);
        debug!(zoom = view.zoom, "Fitting degenerate marker bounds heuristically");
        return Some(view);
    }

    let nw = to_world_pixel(&LatLng::new(bounds.north, bounds.west), 0.0);
    let se = to_world_pixel(&LatLng::new(bounds.south, bounds.east), 0.0);
    let span_x = (se.x - nw.x).abs();
    let span_y = (se.y - nw.y).abs();

    let avail_x = (width_px - 2.0 * config.padding_px).max(1.0);
    let avail_y = (height_px - 2.0 * config.padding_px).max(1.0);

    let zoom = (avail_x / span_x).log2().min((avail_y / span_y).log2());
    let zoom = zoom.floor().clamp(0.0, config.max_zoom);

    let center = from_world_pixel(
        &PixelPoint {
            x: (nw.x + se.x) / 2.0,
            y: (nw.y + se.y) / 2.0,
        },
        0.0,
    );

    Some(FitView { center, zoom })
}

/// Center of the box and a zoom picked by the order of magnitude of its
/// larger side.
pub fn heuristic_view(bounds: &Bounds, config: &FitConfig) -> FitView {
    let spread = bounds.height().abs().max(bounds.width().abs());

    let zoom = if !spread.is_finite() || spread <= 0.0 {
        config.max_zoom
    } else {
        match spread.log10().floor() as i32 {
            i32::MIN..=-3 => 15.0,
            -2 => 13.0,
            -1 => 10.0,
            0 => 7.0,
            1 => 4.0,
            _ => 2.0,
        }
    };

    FitView {
        center: bounds.center(),
        zoom: zoom.min(config.max_zoom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_empty_has_no_fit() {
        assert!(fit_positions(&[], 800.0, 600.0, &FitConfig::default()).is_none());
    }

    #[test]
    fn test_single_marker_uses_max_zoom() {
        let view = fit_positions(&[LatLng::new(27.0, 34.0)], 800.0, 600.0, &FitConfig::default())
            .unwrap();
        assert_eq!(view.center, LatLng::new(27.0, 34.0));
        assert_eq!(view.zoom, 14.0);
    }

    #[test]
    fn test_line_of_markers_bucketed_by_spread() {
        let config = FitConfig::default();
        // 5 degrees wide, zero height
        let view = fit_positions(
            &[LatLng::new(27.0, 30.0), LatLng::new(27.0, 35.0)],
            800.0,
            600.0,
            &config,
        )
        .unwrap();
        assert_eq!(view.zoom, 7.0);
        assert_approx_eq!(view.center.lng, 32.5, 1e-9);
    }

    #[test]
    fn test_world_sized_set_zooms_out() {
        let view = fit_positions(
            &[LatLng::new(-60.0, -170.0), LatLng::new(60.0, 170.0)],
            1024.0,
            768.0,
            &FitConfig::default(),
        )
        .unwrap();
        assert!(view.zoom <= 2.0);
        assert!(view.center.lat.abs() < 1e-6);
    }

    #[test]
    fn test_fitted_box_fits() {
        let config = FitConfig::default();
        let positions = [LatLng::new(26.9, 33.5), LatLng::new(27.7, 34.3)];
        let view = fit_positions(&positions, 800.0, 600.0, &config).unwrap();

        let a = to_world_pixel(&positions[0], view.zoom);
        let b = to_world_pixel(&positions[1], view.zoom);
        assert!((a.x - b.x).abs() <= 800.0 - 2.0 * config.padding_px);
        assert!((a.y - b.y).abs() <= 600.0 - 2.0 * config.padding_px);

        // One more level would not fit
        let a = to_world_pixel(&positions[0], view.zoom + 1.0);
        let b = to_world_pixel(&positions[1], view.zoom + 1.0);
        assert!(
            (a.x - b.x).abs() > 800.0 - 2.0 * config.padding_px
                || (a.y - b.y).abs() > 600.0 - 2.0 * config.padding_px
        );
    }
}
