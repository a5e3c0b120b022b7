//! Viewport-driven overlay loading for the dive map.
//!
//! [`ViewportController`] is the entry point: feed it map movements and
//! marker records, read [`RenderFrame`]s and [`ViewportEvent`]s back.

pub mod config;
pub mod controller;
pub mod fit_state;
pub mod prefetch;
pub mod render;
pub mod scheduler;

pub use config::{ControllerConfig, OverlayConfig, PrefetchConfig};
pub use controller::{MapMoveEvent, MoveOrigin, ViewportController, ViewportEvent};
pub use fit_state::{FitEvent, FitState, FitTransition};
pub use prefetch::PrefetchScheduler;
pub use render::{
    describe_groups, marker_descriptor, suitability_color, ClusterDescriptor, IconDescriptor,
    MarkerDescriptor, OverlayStatus, PopupContent, RenderFrame,
};
pub use scheduler::{CancelToken, TaskScheduler};
