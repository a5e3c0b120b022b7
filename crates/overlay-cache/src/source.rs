//! Upstream seam: where cache misses are filled from.

use async_trait::async_trait;

use overlay_common::{OverlayResult, WindOverlay};

use crate::key::OverlayQuery;

/// A value the cache can hold.
pub trait CacheValue: Send + Sync + 'static {
    /// Shape check applied on every lookup; a malformed entry is treated
    /// as a miss and refetched.
    fn is_well_formed(&self) -> bool {
        true
    }
}

impl CacheValue for WindOverlay {
    fn is_well_formed(&self) -> bool {
        WindOverlay::is_well_formed(self)
    }
}

/// Remote read endpoint that fills cache misses.
#[async_trait]
pub trait OverlaySource: Send + Sync + 'static {
    type Data: CacheValue;

    async fn fetch(&self, query: &OverlayQuery) -> OverlayResult<Self::Data>;
}

/// Why a fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// The user is looking at this viewport right now.
    Primary,
    /// Stale-while-revalidate refresh of an entry that is still being served.
    Background,
    /// Speculative warm-up of a future time slice.
    Prefetch,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Primary => "primary",
            Priority::Background => "background",
            Priority::Prefetch => "prefetch",
        }
    }
}
