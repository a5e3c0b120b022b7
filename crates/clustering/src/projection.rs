//! Web Mercator world-pixel projection.

use overlay_common::LatLng;

/// Tile edge in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// A point in world-pixel space: `(0, 0)` is the north-west corner and the
/// world is `256 * 2^zoom` pixels wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn distance(&self, other: &PixelPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// World size in pixels at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Project a position to world pixels at `zoom`.
pub fn to_world_pixel(position: &LatLng, zoom: f64) -> PixelPoint {
    let n = world_size(zoom);
    let lat_rad = position.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    PixelPoint {
        x: (position.lng + 180.0) / 360.0 * n,
        y: (1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n,
    }
}

/// Inverse of [`to_world_pixel`].
pub fn from_world_pixel(point: &PixelPoint, zoom: f64) -> LatLng {
    let n = world_size(zoom);
    let lng = point.x / n * 360.0 - 180.0;
    let lat = (std::f64::consts::PI * (1.0 - 2.0 * point.y / n))
        .sinh()
        .atan()
        .to_degrees();
    LatLng::new(lat, lng)
}
