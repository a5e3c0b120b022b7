//! Warm the cache for upcoming time slices.
//!
//! After every successful primary load the scheduler picks the
//! representative hour of each of the next few days and fetches those
//! slices for the same viewport in the background, so scrubbing forward in
//! time is served from cache.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Days, Utc};
use tracing::{debug, info};

use overlay_cache::{CacheKeyNormalizer, OverlaySource, Priority, WeatherOverlayCache};
use overlay_common::{Clock, TimeSlice, Viewport};

use crate::config::PrefetchConfig;
use crate::scheduler::{CancelToken, TaskScheduler};

pub struct PrefetchScheduler<S: OverlaySource> {
    cache: WeatherOverlayCache<S>,
    normalizer: CacheKeyNormalizer,
    config: PrefetchConfig,
    clock: Arc<dyn Clock>,
    scheduler: TaskScheduler,
    enabled: Arc<AtomicBool>,
    shut_down: Arc<AtomicBool>,
}

impl<S: OverlaySource> PrefetchScheduler<S> {
    pub fn new(
        cache: WeatherOverlayCache<S>,
        normalizer: CacheKeyNormalizer,
        config: PrefetchConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let enabled = Arc::new(AtomicBool::new(config.enabled));
        Self {
            cache,
            normalizer,
            config,
            clock,
            scheduler: TaskScheduler::new(),
            enabled,
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &PrefetchConfig {
        &self.config
    }

    /// Turn prefetching on or off. Turning it off cancels nothing already
    /// in flight but stops new prefetches from being scheduled or started.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.enabled.load(Ordering::SeqCst) && !self.shut_down.load(Ordering::SeqCst)
    }

    /// Slices worth warming after a load at `reference_time`, in order.
    ///
    /// Never returns a slice that starts after `now + horizon`.
    pub fn planned_slices(&self, reference_time: DateTime<Utc>) -> Vec<TimeSlice> {
        let latest = self.clock.now() + self.config.horizon();
        let reference_date = reference_time.date_naive();
        let mut slices = Vec::new();

        for day in 1..=u64::from(self.config.days_ahead) {
            if slices.len() >= self.config.max_slices {
                break;
            }
            let Some(date) = reference_date.checked_add_days(Days::new(day)) else {
                break;
            };
            let slice = TimeSlice::at_hour(date, self.config.representative_hour);
            if slice.start() > latest {
                break;
            }
            slices.push(slice);
        }

        slices
    }

    /// Schedule prefetches for the slices following a successful load of
    /// `viewport` at `reference_time`. Returns the tokens of the scheduled
    /// tasks.
    pub fn on_fetch_success(
        &self,
        viewport: &Viewport,
        reference_time: DateTime<Utc>,
    ) -> Vec<CancelToken> {
        if !self.is_active() {
            return Vec::new();
        }

        let slices = self.planned_slices(reference_time);
        let mut tokens = Vec::with_capacity(slices.len());

        for slice in slices {
            let request = match self
                .normalizer
                .request(&viewport.bounds, viewport.zoom, Some(slice.start()))
            {
                Ok(request) => request,
                Err(e) => {
                    debug!(error = %e, "Not prefetching for invalid viewport");
                    return tokens;
                }
            };

            let cache = self.cache.clone();
            let enabled = Arc::clone(&self.enabled);
            let shut_down = Arc::clone(&self.shut_down);
            let token = self.scheduler.schedule(self.config.delay(), async move {
                if !enabled.load(Ordering::SeqCst) || shut_down.load(Ordering::SeqCst) {
                    return;
                }
                if cache.contains_fresh(&request.key).await {
                    debug!(key = %request.key, "Prefetch skipped, slice already cached");
                    return;
                }
                // Failures are logged by the cache and never surfaced
                if cache.fetch(&request, Priority::Prefetch).await.is_ok() {
                    debug!(key = %request.key, "Prefetched overlay slice");
                }
            });
            tokens.push(token);
        }

        debug!(
            scheduled = tokens.len(),
            reference = %reference_time,
            "Scheduled overlay prefetch"
        );
        tokens
    }

    /// Stop for good: cancel pending prefetch timers and ignore later calls.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let cancelled = self.scheduler.cancel_all();
        info!(cancelled = cancelled, "Prefetch scheduler shut down");
    }

    pub fn pending(&self) -> usize {
        self.scheduler.pending_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use overlay_cache::CacheConfig;
    use overlay_common::{Bounds, FixedClock, LatLng};
    use std::time::Duration;
    use test_utils::{bounds, reference_now, MockOverlaySource};

    fn scheduler(
        config: PrefetchConfig,
        now: DateTime<Utc>,
    ) -> (Arc<MockOverlaySource>, PrefetchScheduler<MockOverlaySource>) {
        let source = Arc::new(MockOverlaySource::new(Duration::from_millis(10)));
        let cache = WeatherOverlayCache::new(Arc::clone(&source), CacheConfig::default());
        let prefetch = PrefetchScheduler::new(
            cache,
            CacheKeyNormalizer::default(),
            config,
            Arc::new(FixedClock::new(now)),
        );
        (source, prefetch)
    }

    fn viewport(b: Bounds) -> Viewport {
        Viewport::new(b, b.center(), 8.0)
    }

    #[tokio::test]
    async fn test_horizon_cuts_second_day() {
        let now = reference_now(); // 09:30
        let (_, prefetch) = scheduler(PrefetchConfig::default(), now);

        let slices = prefetch.planned_slices(now);
        assert_eq!(
            slices,
            vec![TimeSlice::containing(Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap())]
        );
    }

    #[tokio::test]
    async fn test_never_beyond_horizon() {
        let now = reference_now();
        let (_, prefetch) = scheduler(
            PrefetchConfig {
                max_slices: 10,
                days_ahead: 10,
                ..PrefetchConfig::default()
            },
            now,
        );

        for offset_hours in [0, 6, 20, 30, 47, 60] {
            let reference = now + ChronoDuration::hours(offset_hours);
            for slice in prefetch.planned_slices(reference) {
                assert!(slice.start() <= now + ChronoDuration::hours(48));
                assert!(slice.start() > reference);
            }
        }
    }

    #[tokio::test]
    async fn test_max_slices() {
        let now = reference_now();
        let config = PrefetchConfig {
            horizon_hours: 24 * 7,
            max_slices: 1,
            ..PrefetchConfig::default()
        };
        let (_, prefetch) = scheduler(config, now);
        assert_eq!(prefetch.planned_slices(now).len(), 1);

        let config = PrefetchConfig {
            horizon_hours: 24 * 7,
            ..PrefetchConfig::default()
        };
        let (_, prefetch) = scheduler(config, now);
        assert_eq!(prefetch.planned_slices(now).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefetch_fetches_after_delay() {
        let now = reference_now();
        let (source, prefetch) = scheduler(PrefetchConfig::default(), now);

        let tokens = prefetch.on_fetch_success(&viewport(bounds::RED_SEA), now);
        assert_eq!(tokens.len(), 1);
        assert_eq!(source.calls(), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(source.calls(), 1);
        let sent = &source.queries()[0];
        assert_eq!(
            sent.time_slice.map(|s| s.start()),
            Some(Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_slice_not_refetched() {
        let now = reference_now();
        let (source, prefetch) = scheduler(PrefetchConfig::default(), now);
        let vp = viewport(bounds::RED_SEA);

        prefetch.on_fetch_success(&vp, now);
        tokio::time::sleep(Duration::from_millis(300)).await;
        prefetch.on_fetch_success(&vp, now);
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_is_noop() {
        let now = reference_now();
        let (source, prefetch) = scheduler(PrefetchConfig::default(), now);

        prefetch.set_enabled(false);
        assert!(prefetch.on_fetch_success(&viewport(bounds::RED_SEA), now).is_empty());

        // Disabled between scheduling and firing
        prefetch.set_enabled(true);
        prefetch.on_fetch_success(&viewport(bounds::RED_SEA), now);
        prefetch.set_enabled(false);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending() {
        let now = reference_now();
        let (source, prefetch) = scheduler(PrefetchConfig::default(), now);

        let tokens = prefetch.on_fetch_success(&viewport(bounds::RED_SEA), now);
        prefetch.shutdown();
        assert!(tokens.iter().all(CancelToken::is_cancelled));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(source.calls(), 0);
        assert!(prefetch
            .on_fetch_success(&viewport(bounds::RED_SEA), now)
            .is_empty());
    }

    #[tokio::test]
    async fn test_degenerate_viewport_skipped() {
        let now = reference_now();
        let (_, prefetch) = scheduler(PrefetchConfig::default(), now);
        let vp = Viewport::new(bounds::DEGENERATE, LatLng::new(27.0, 33.5), 8.0);
        assert!(prefetch.on_fetch_success(&vp, now).is_empty());
    }
}
