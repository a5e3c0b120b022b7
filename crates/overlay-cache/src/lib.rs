//! Viewport-keyed cache for wind overlay data.
//!
//! - [`CacheKeyNormalizer`] turns raw map bounds into coarse, hashable keys
//! - [`WeatherOverlayCache`] serves those keys with stale-while-revalidate,
//!   LRU capacity and in-flight de-duplication
//! - [`OverlaySource`] is the seam to the upstream endpoint

pub mod config;
pub mod key;
pub mod overlay_cache;
pub mod source;
pub mod stats;

pub use config::{CacheConfig, NormalizerConfig};
pub use key::{CacheKey, CacheKeyNormalizer, KeyFamily, OverlayQuery, OverlayRequest};
pub use overlay_cache::{CacheEntry, CacheLookup, FetchOutcome, Loaded, WeatherOverlayCache};
pub use source::{CacheValue, OverlaySource, Priority};
pub use stats::{CacheStatsSnapshot, OverlayCacheStats};
