//! Generators for synthetic marker sets and wind fields.
//!
//! These create predictable, verifiable layouts so clustering and sampling
//! assertions can be written against known geometry.

use overlay_common::{Bounds, LatLng, MarkerRecord, WindOverlay, WindPoint};

use crate::fixtures::dive_site_record;

/// Degrees of longitude covered by one screen pixel at `zoom` on the equator
/// (256 px tiles).
pub fn degrees_per_pixel(zoom: f64) -> f64 {
    360.0 / (256.0 * 2f64.powf(zoom))
}

/// `count` dive sites spread east of `origin`, each `spacing_px` pixels from
/// the previous one at `zoom`. Ids start at `first_id`.
///
/// # Example
///
/// ```
/// use overlay_common::LatLng;
/// use test_utils::sites_in_a_row;
///
/// let sites = sites_in_a_row(1, LatLng::new(0.5, 10.0), 5, 8.0, 10.0);
/// assert_eq!(sites.len(), 5);
/// assert_eq!(sites[0].id, 1);
/// assert_eq!(sites[4].id, 5);
/// ```
pub fn sites_in_a_row(
    first_id: i64,
    origin: LatLng,
    count: usize,
    zoom: f64,
    spacing_px: f64,
) -> Vec<MarkerRecord> {
    let step = degrees_per_pixel(zoom) * spacing_px;
    (0..count)
        .map(|i| {
            dive_site_record(
                first_id + i as i64,
                origin.lat,
                origin.lng + step * i as f64,
                Some(90.0),
            )
        })
        .collect()
}

/// Regular `rows` x `cols` wind field covering `bounds`, all with the same
/// speed and direction.
///
/// Points are placed at cell centers, row 0 at the north edge.
pub fn wind_grid(bounds: &Bounds, rows: usize, cols: usize, speed: f64, direction: f64) -> WindOverlay {
    let mut points = Vec::with_capacity(rows * cols);
    let dlat = bounds.height() / rows.max(1) as f64;
    let dlng = bounds.width() / cols.max(1) as f64;

    for row in 0..rows {
        for col in 0..cols {
            points.push(WindPoint {
                lat: bounds.north - dlat * (row as f64 + 0.5),
                lng: bounds.west + dlng * (col as f64 + 0.5),
                speed,
                direction,
                gusts: None,
            });
        }
    }

    WindOverlay::new(points, vec![])
}

/// Wind field whose speed grows west to east: column `c` blows at
/// `base_speed + c` m/s.
pub fn wind_gradient(bounds: &Bounds, cols: usize, base_speed: f64, direction: f64) -> WindOverlay {
    let mut overlay = wind_grid(bounds, 1, cols, base_speed, direction);
    for (col, point) in overlay.points.iter_mut().enumerate() {
        point.speed = base_speed + col as f64;
    }
    overlay
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_degrees_per_pixel() {
        assert_approx_eq!(degrees_per_pixel(0.0), 1.40625, 1e-12);
        assert_approx_eq!(degrees_per_pixel(1.0), 0.703125, 1e-12);
    }

    #[test]
    fn test_sites_in_a_row_spacing() {
        let sites = sites_in_a_row(10, LatLng::new(0.0, 0.0), 3, 8.0, 10.0);
        let step = degrees_per_pixel(8.0) * 10.0;
        assert_eq!(sites[0].id, 10);
        assert_approx_eq!(sites[2].lng.unwrap(), 2.0 * step, 1e-12);
    }

    #[test]
    fn test_wind_grid_layout() {
        let b = Bounds::new(2.0, 0.0, 2.0, 0.0);
        let grid = wind_grid(&b, 2, 2, 5.0, 90.0);
        assert_eq!(grid.points.len(), 4);
        assert_eq!((grid.points[0].lat, grid.points[0].lng), (1.5, 0.5));
        assert_eq!((grid.points[3].lat, grid.points[3].lng), (0.5, 1.5));
        assert!(grid.is_well_formed());
    }

    #[test]
    fn test_wind_gradient() {
        let b = Bounds::new(1.0, 0.0, 3.0, 0.0);
        let g = wind_gradient(&b, 3, 4.0, 0.0);
        let speeds: Vec<f64> = g.points.iter().map(|p| p.speed).collect();
        assert_eq!(speeds, vec![4.0, 5.0, 6.0]);
    }
}
