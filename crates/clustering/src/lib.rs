//! Zoom-adaptive clustering for map markers.
//!
//! Below a per-layer zoom threshold, nearby markers are merged into groups
//! using a pixel radius in Web Mercator space; at or above it every marker
//! is shown on its own. Also computes views that fit a whole marker set.

pub mod config;
pub mod engine;
pub mod fit;
pub mod projection;

pub use config::{ClusterConfig, ClusterPolicy, FitConfig, LayerKind};
pub use engine::{cluster_with_policy, ClusterEngine, ClusterGroup};
pub use fit::{fit_markers, fit_positions, heuristic_view, FitView};
pub use projection::{from_world_pixel, to_world_pixel, PixelPoint};
