//! Stale-while-revalidate cache for wind overlay data.
//!
//! ## Lookup outcomes
//!
//! - **fresh** (age < `stale_after`): served as-is
//! - **stale** (age in `[stale_after, hard_expire_after)`): served, and one
//!   background refresh is started unless a fetch for the key is already
//!   in flight
//! - **miss** (absent, hard-expired or malformed): caller fetches
//!
//! ## In-flight de-duplication
//!
//! Each key has at most one outstanding upstream request. The request runs
//! as a spawned task behind a [`Shared`] future; every later caller for the
//! same key awaits the same outcome.
//!
//! ## Ordering
//!
//! Every primary request bumps a generation counter for its key family (the
//! time slice) and records itself as the family's latest key. A response is
//! discarded instead of written when the family moved on to a different,
//! overlapping key after the response's request was issued.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use overlay_common::{OverlayError, OverlayResult};

use crate::config::CacheConfig;
use crate::key::{CacheKey, KeyFamily, OverlayQuery, OverlayRequest};
use crate::source::{CacheValue, OverlaySource, Priority};
use crate::stats::{CacheStatsSnapshot, OverlayCacheStats};

type SharedFetch<V> = Shared<BoxFuture<'static, OverlayResult<FetchOutcome<V>>>>;

/// A cached overlay together with its freshness deadlines.
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub key: CacheKey,
    pub data: Arc<V>,
    /// Query the entry was filled with; reused for background refreshes.
    pub query: OverlayQuery,
    pub fetched_at: Instant,
    pub stale_at: Instant,
    pub hard_expire_at: Instant,
}

impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            data: Arc::clone(&self.data),
            query: self.query.clone(),
            fetched_at: self.fetched_at,
            stale_at: self.stale_at,
            hard_expire_at: self.hard_expire_at,
        }
    }
}

/// Result of [`WeatherOverlayCache::get`].
#[derive(Debug)]
pub enum CacheLookup<V> {
    Fresh(Arc<V>),
    Stale(Arc<V>),
    Miss,
}

/// Result of a completed upstream fetch.
#[derive(Debug)]
pub enum FetchOutcome<V> {
    /// Written to the cache.
    Applied(Arc<V>),
    /// Dropped because a newer overlapping request was issued meanwhile.
    Superseded,
}

impl<V> Clone for FetchOutcome<V> {
    fn clone(&self) -> Self {
        match self {
            FetchOutcome::Applied(data) => FetchOutcome::Applied(Arc::clone(data)),
            FetchOutcome::Superseded => FetchOutcome::Superseded,
        }
    }
}

/// Result of [`WeatherOverlayCache::load`].
#[derive(Debug)]
pub enum Loaded<V> {
    Fresh(Arc<V>),
    Stale(Arc<V>),
    Fetched(Arc<V>),
    Superseded,
}

impl<V> Loaded<V> {
    pub fn data(&self) -> Option<&Arc<V>> {
        match self {
            Loaded::Fresh(d) | Loaded::Stale(d) | Loaded::Fetched(d) => Some(d),
            Loaded::Superseded => None,
        }
    }

    /// Whether this load went to the network.
    pub fn was_fetched(&self) -> bool {
        matches!(self, Loaded::Fetched(_))
    }
}

struct InFlight<V> {
    id: u64,
    priority: Priority,
    future: SharedFetch<V>,
}

#[derive(Debug, Default)]
struct FamilyState {
    generation: u64,
    latest_key: Option<CacheKey>,
}

struct CacheState<V> {
    entries: LruCache<CacheKey, CacheEntry<V>>,
    in_flight: HashMap<CacheKey, InFlight<V>>,
    families: HashMap<KeyFamily, FamilyState>,
    next_flight_id: u64,
}

impl<V> CacheState<V> {
    fn generation(&self, family: KeyFamily) -> u64 {
        self.families.get(&family).map_or(0, |f| f.generation)
    }

    fn note_primary(&mut self, key: CacheKey) -> u64 {
        let family = self.families.entry(key.family()).or_default();
        family.generation += 1;
        family.latest_key = Some(key);
        family.generation
    }

    fn is_superseded(&self, key: &CacheKey, issued_generation: u64) -> bool {
        let Some(family) = self.families.get(&key.family()) else {
            return false;
        };
        match family.latest_key {
            Some(latest) => {
                family.generation > issued_generation && latest != *key && latest.overlaps(key)
            }
            None => false,
        }
    }
}

struct Inner<S: OverlaySource> {
    source: Arc<S>,
    config: CacheConfig,
    state: Mutex<CacheState<S::Data>>,
    stats: OverlayCacheStats,
}

/// In-memory overlay cache with TTL, LRU capacity and in-flight de-duplication.
///
/// Cheap to clone; clones share the same state.
pub struct WeatherOverlayCache<S: OverlaySource> {
    inner: Arc<Inner<S>>,
}

impl<S: OverlaySource> Clone for WeatherOverlayCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: OverlaySource> WeatherOverlayCache<S> {
    pub fn new(source: Arc<S>, config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity.max(1)).expect("Capacity must be > 0");

        Self {
            inner: Arc::new(Inner {
                source,
                config,
                state: Mutex::new(CacheState {
                    entries: LruCache::new(capacity),
                    in_flight: HashMap::new(),
                    families: HashMap::new(),
                    next_flight_id: 0,
                }),
                stats: OverlayCacheStats::default(),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Look up a key.
    ///
    /// A stale hit starts exactly one background refresh for the key unless
    /// a fetch is already in flight for it.
    pub async fn get(&self, key: &CacheKey) -> CacheLookup<S::Data> {
        let now = Instant::now();
        let stats = &self.inner.stats;
        let mut state = self.inner.state.lock().await;

        let (data, query, stale_at, hard_expire_at) = match state.entries.get(key) {
            Some(entry) => (
                Arc::clone(&entry.data),
                entry.query.clone(),
                entry.stale_at,
                entry.hard_expire_at,
            ),
            None => {
                stats.record_miss();
                return CacheLookup::Miss;
            }
        };

        if now >= hard_expire_at {
            state.entries.pop(key);
            OverlayCacheStats::bump(&stats.expired);
            stats.record_miss();
            debug!(key = %key, "Overlay entry past hard expiry");
            return CacheLookup::Miss;
        }

        if !data.is_well_formed() {
            state.entries.pop(key);
            OverlayCacheStats::bump(&stats.malformed);
            stats.record_miss();
            warn!(key = %key, "Dropping malformed overlay entry");
            return CacheLookup::Miss;
        }

        if now < stale_at {
            stats.record_hit();
            return CacheLookup::Fresh(data);
        }

        stats.record_stale_hit();
        if !state.in_flight.contains_key(key) {
            OverlayCacheStats::bump(&stats.refreshes);
            debug!(key = %key, "Serving stale overlay, refreshing in background");
            let request = OverlayRequest { key: *key, query };
            let generation = state.generation(key.family());
            // Detached: the spawned task drives the refresh
            let _ = self.start_fetch_locked(&mut state, request, Priority::Background, generation);
        }
        CacheLookup::Stale(data)
    }

    /// Store data fetched elsewhere, stamped as fetched now.
    pub async fn put(&self, key: CacheKey, query: OverlayQuery, data: S::Data) {
        let mut state = self.inner.state.lock().await;
        let entry = self.inner.new_entry(key, query, Arc::new(data));
        self.inner.insert_locked(&mut state, entry);
    }

    pub async fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.inner.state.lock().await.in_flight.contains_key(key)
    }

    /// Whether a fresh, well-formed entry exists. Does not touch LRU order
    /// or statistics.
    pub async fn contains_fresh(&self, key: &CacheKey) -> bool {
        let now = Instant::now();
        let state = self.inner.state.lock().await;
        state
            .entries
            .peek(key)
            .map_or(false, |e| now < e.stale_at && e.data.is_well_formed())
    }

    /// Copy of an entry without touching LRU order or statistics.
    pub async fn peek(&self, key: &CacheKey) -> Option<CacheEntry<S::Data>> {
        self.inner.state.lock().await.entries.peek(key).cloned()
    }

    /// Fetch a key from upstream, attaching to an in-flight request if one
    /// exists. Primary fetches advance the key family's generation.
    pub async fn fetch(
        &self,
        request: &OverlayRequest,
        priority: Priority,
    ) -> OverlayResult<FetchOutcome<S::Data>> {
        let shared = {
            let mut state = self.inner.state.lock().await;
            let generation = if priority == Priority::Primary {
                state.note_primary(request.key)
            } else {
                state.generation(request.key.family())
            };
            self.join_or_start_locked(&mut state, request, priority, generation)
        };
        shared.await
    }

    /// Serve from cache when possible, otherwise fetch.
    pub async fn load(
        &self,
        request: &OverlayRequest,
        priority: Priority,
    ) -> OverlayResult<Loaded<S::Data>> {
        // Judged against the generation noted here, not the one current when
        // the fetch starts
        let issued = if priority == Priority::Primary {
            Some(self.inner.state.lock().await.note_primary(request.key))
        } else {
            None
        };

        match self.get(&request.key).await {
            CacheLookup::Fresh(data) => return Ok(Loaded::Fresh(data)),
            CacheLookup::Stale(data) => return Ok(Loaded::Stale(data)),
            CacheLookup::Miss => {}
        }

        let shared = {
            let mut state = self.inner.state.lock().await;
            let generation =
                issued.unwrap_or_else(|| state.generation(request.key.family()));
            self.join_or_start_locked(&mut state, request, priority, generation)
        };

        match shared.await? {
            FetchOutcome::Applied(data) => Ok(Loaded::Fetched(data)),
            FetchOutcome::Superseded => Ok(Loaded::Superseded),
        }
    }

    /// Current number of entries.
    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.state.lock().await.entries.is_empty()
    }

    /// Drop every entry and reset statistics. In-flight fetches keep running.
    pub async fn clear(&self) {
        let mut state = self.inner.state.lock().await;
        state.entries.clear();
        self.inner.stats.reset();
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.inner.stats.snapshot()
    }

    fn join_or_start_locked(
        &self,
        state: &mut CacheState<S::Data>,
        request: &OverlayRequest,
        priority: Priority,
        issued_generation: u64,
    ) -> SharedFetch<S::Data> {
        if let Some(flight) = state.in_flight.get(&request.key) {
            OverlayCacheStats::bump(&self.inner.stats.deduplicated);
            debug!(
                key = %request.key,
                priority = priority.as_str(),
                in_flight = flight.priority.as_str(),
                "Attaching to in-flight overlay fetch"
            );
            return flight.future.clone();
        }
        self.start_fetch_locked(state, request.clone(), priority, issued_generation)
    }

    fn start_fetch_locked(
        &self,
        state: &mut CacheState<S::Data>,
        request: OverlayRequest,
        priority: Priority,
        issued_generation: u64,
    ) -> SharedFetch<S::Data> {
        let key = request.key;
        state.next_flight_id += 1;
        let flight_id = state.next_flight_id;
        OverlayCacheStats::bump(&self.inner.stats.fetches);

        debug!(
            key = %key,
            priority = priority.as_str(),
            generation = issued_generation,
            "Fetching overlay"
        );

        let inner = Arc::clone(&self.inner);
        let future = async move {
            let result = inner.source.fetch(&request.query).await;
            inner
                .complete(request, flight_id, issued_generation, priority, result)
                .await
        }
        .boxed()
        .shared();

        state.in_flight.insert(
            key,
            InFlight {
                id: flight_id,
                priority,
                future: future.clone(),
            },
        );

        // Runs to completion even if every waiter goes away
        tokio::spawn(future.clone());
        future
    }
}

impl<S: OverlaySource> Inner<S> {
    fn new_entry(&self, key: CacheKey, query: OverlayQuery, data: Arc<S::Data>) -> CacheEntry<S::Data> {
        let now = Instant::now();
        CacheEntry {
            key,
            data,
            query,
            fetched_at: now,
            stale_at: now + self.config.stale_after(),
            hard_expire_at: now + self.config.hard_expire_after(),
        }
    }

    fn insert_locked(&self, state: &mut CacheState<S::Data>, entry: CacheEntry<S::Data>) {
        let key = entry.key;
        if let Some((evicted, _)) = state.entries.push(key, entry) {
            if evicted != key {
                OverlayCacheStats::bump(&self.stats.evictions);
                debug!(evicted = %evicted, "Evicted least recently used overlay entry");
            }
        }
    }

    async fn complete(
        &self,
        request: OverlayRequest,
        flight_id: u64,
        issued_generation: u64,
        priority: Priority,
        result: OverlayResult<S::Data>,
    ) -> OverlayResult<FetchOutcome<S::Data>> {
        let mut state = self.state.lock().await;

        if state.in_flight.get(&request.key).map(|f| f.id) == Some(flight_id) {
            state.in_flight.remove(&request.key);
        }

        let data = match result {
            Ok(data) if data.is_well_formed() => data,
            Ok(_) => {
                OverlayCacheStats::bump(&self.stats.fetch_errors);
                warn!(key = %request.key, "Upstream returned a malformed overlay");
                return Err(OverlayError::Decode(format!(
                    "malformed overlay for {}",
                    request.key
                )));
            }
            Err(e) => {
                OverlayCacheStats::bump(&self.stats.fetch_errors);
                if priority == Priority::Prefetch {
                    debug!(key = %request.key, error = %e, "Prefetch failed");
                } else {
                    warn!(key = %request.key, priority = priority.as_str(), error = %e, "Overlay fetch failed");
                }
                return Err(e);
            }
        };

        if state.is_superseded(&request.key, issued_generation) {
            self.stats.record_superseded();
            debug!(
                key = %request.key,
                issued_generation = issued_generation,
                current_generation = state.generation(request.key.family()),
                "Discarding overlay response superseded by a newer request"
            );
            return Ok(FetchOutcome::Superseded);
        }

        let data = Arc::new(data);
        let entry = self.new_entry(request.key, request.query, Arc::clone(&data));
        self.insert_locked(&mut state, entry);
        Ok(FetchOutcome::Applied(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::CacheKeyNormalizer;
    use async_trait::async_trait;
    use overlay_common::{Bounds, WindOverlay, WindPoint};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSource {
        calls: AtomicUsize,
        delay: Duration,
        fail: AtomicBool,
        speed: Mutex<f64>,
    }

    impl CountingSource {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                fail: AtomicBool::new(false),
                speed: Mutex::new(5.0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OverlaySource for CountingSource {
        type Data = WindOverlay;

        async fn fetch(&self, query: &OverlayQuery) -> OverlayResult<WindOverlay> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(OverlayError::Upstream("connection refused".into()));
            }
            let center = query.bounds.center();
            Ok(overlay_at(center.lat, center.lng, *self.speed.lock().await))
        }
    }

    fn overlay_at(lat: f64, lng: f64, speed: f64) -> WindOverlay {
        WindOverlay::new(
            vec![WindPoint {
                lat,
                lng,
                speed,
                direction: 270.0,
                gusts: None,
            }],
            vec![],
        )
    }

    fn request(north: f64, south: f64, east: f64, west: f64) -> OverlayRequest {
        CacheKeyNormalizer::default()
            .request(&Bounds::new(north, south, east, west), 9.0, None)
            .unwrap()
    }

    fn speed_of(data: &WindOverlay) -> f64 {
        data.points[0].speed
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_then_stale_refreshes_once() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(10)));
        let cache = WeatherOverlayCache::new(Arc::clone(&source), CacheConfig::default());
        let req = request(11.0, 10.0, 21.0, 20.0);

        cache
            .put(req.key, req.query.clone(), overlay_at(10.5, 20.5, 1.0))
            .await;

        // T+3min: fresh, nothing scheduled
        tokio::time::advance(Duration::from_secs(3 * 60)).await;
        assert!(matches!(cache.get(&req.key).await, CacheLookup::Fresh(_)));
        assert!(!cache.is_in_flight(&req.key).await);

        // T+7min: same data, one refresh in flight
        tokio::time::advance(Duration::from_secs(4 * 60)).await;
        match cache.get(&req.key).await {
            CacheLookup::Stale(data) => assert_eq!(speed_of(&data), 1.0),
            other => panic!("expected stale, got {:?}", other),
        }
        assert!(cache.is_in_flight(&req.key).await);
        assert!(matches!(cache.get(&req.key).await, CacheLookup::Stale(_)));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(cache.stats().refreshes, 1);

        match cache.get(&req.key).await {
            CacheLookup::Fresh(data) => assert_eq!(speed_of(&data), 5.0),
            other => panic!("expected refreshed entry, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_expired_is_miss() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(10)));
        let cache = WeatherOverlayCache::new(Arc::clone(&source), CacheConfig::default());
        let req = request(11.0, 10.0, 21.0, 20.0);

        cache
            .put(req.key, req.query.clone(), overlay_at(10.5, 20.5, 1.0))
            .await;
        tokio::time::advance(Duration::from_secs(16 * 60)).await;

        assert!(matches!(cache.get(&req.key).await, CacheLookup::Miss));
        assert!(!cache.is_in_flight(&req.key).await);
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.stats().expired, 1);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_loads_share_one_fetch() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(100)));
        let cache = WeatherOverlayCache::new(Arc::clone(&source), CacheConfig::default());
        let req = request(11.0, 10.0, 21.0, 20.0);

        let (a, b) = tokio::join!(
            cache.load(&req, Priority::Primary),
            cache.load(&req, Priority::Prefetch)
        );

        assert!(a.unwrap().was_fetched());
        assert!(b.unwrap().was_fetched());
        assert_eq!(source.calls(), 1);
        assert_eq!(cache.stats().deduplicated, 1);
        assert!(!cache.is_in_flight(&req.key).await);
        assert!(cache.contains_fresh(&req.key).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_overlapping_response_is_discarded() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(100)));
        let cache = WeatherOverlayCache::new(Arc::clone(&source), CacheConfig::default());
        let old = request(11.0, 10.0, 21.0, 20.0);
        let new = request(11.3, 10.3, 21.3, 20.3);

        let old_task = {
            let cache = cache.clone();
            let old = old.clone();
            tokio::spawn(async move { cache.load(&old, Priority::Primary).await })
        };
        tokio::task::yield_now().await;
        assert!(cache.is_in_flight(&old.key).await);

        let new_result = cache.load(&new, Priority::Primary).await.unwrap();
        let old_result = old_task.await.unwrap().unwrap();

        assert!(new_result.was_fetched());
        assert!(matches!(old_result, Loaded::Superseded));
        assert!(cache.peek(&old.key).await.is_none());
        assert!(cache.peek(&new.key).await.is_some());
        assert_eq!(cache.stats().superseded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_noted_between_lookup_and_fetch_supersedes() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(100)));
        let cache = WeatherOverlayCache::new(Arc::clone(&source), CacheConfig::default());
        let old = request(11.0, 10.0, 21.0, 20.0);
        let new = request(11.3, 10.3, 21.3, 20.3);

        // Queue both loads behind the state lock so the newer primary is
        // noted before the older one reaches its fetch.
        let guard = cache.inner.state.lock().await;
        let old_task = {
            let cache = cache.clone();
            let old = old.clone();
            tokio::spawn(async move { cache.load(&old, Priority::Primary).await })
        };
        tokio::task::yield_now().await;
        let new_task = {
            let cache = cache.clone();
            let new = new.clone();
            tokio::spawn(async move { cache.load(&new, Priority::Primary).await })
        };
        tokio::task::yield_now().await;
        drop(guard);

        let old_result = old_task.await.unwrap().unwrap();
        let new_result = new_task.await.unwrap().unwrap();

        assert!(matches!(old_result, Loaded::Superseded));
        assert!(new_result.was_fetched());
        assert!(cache.peek(&old.key).await.is_none());
        assert!(cache.peek(&new.key).await.is_some());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disjoint_newer_request_does_not_discard() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(100)));
        let cache = WeatherOverlayCache::new(Arc::clone(&source), CacheConfig::default());
        let old = request(11.0, 10.0, 21.0, 20.0);
        let far = request(41.0, 40.0, 51.0, 50.0);

        let old_task = {
            let cache = cache.clone();
            let old = old.clone();
            tokio::spawn(async move { cache.load(&old, Priority::Primary).await })
        };
        tokio::task::yield_now().await;

        cache.load(&far, Priority::Primary).await.unwrap();
        let old_result = old_task.await.unwrap().unwrap();

        assert!(old_result.was_fetched());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_surfaces_and_caches_nothing() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(10)));
        source.fail.store(true, Ordering::SeqCst);
        let cache = WeatherOverlayCache::new(Arc::clone(&source), CacheConfig::default());
        let req = request(11.0, 10.0, 21.0, 20.0);

        let result = cache.load(&req, Priority::Primary).await;
        assert!(matches!(result, Err(OverlayError::Upstream(_))));
        assert!(cache.is_empty().await);
        assert!(!cache.is_in_flight(&req.key).await);
        assert_eq!(cache.stats().fetch_errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_survives_failed_refresh() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(10)));
        source.fail.store(true, Ordering::SeqCst);
        let cache = WeatherOverlayCache::new(Arc::clone(&source), CacheConfig::default());
        let req = request(11.0, 10.0, 21.0, 20.0);

        cache
            .put(req.key, req.query.clone(), overlay_at(10.5, 20.5, 1.0))
            .await;
        tokio::time::advance(Duration::from_secs(6 * 60)).await;

        assert!(matches!(cache.get(&req.key).await, CacheLookup::Stale(_)));
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Refresh failed; the old entry is still served
        match cache.load(&req, Priority::Primary).await.unwrap() {
            Loaded::Stale(data) => assert_eq!(speed_of(&data), 1.0),
            other => panic!("expected stale, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_entry_is_miss() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(10)));
        let cache = WeatherOverlayCache::new(Arc::clone(&source), CacheConfig::default());
        let req = request(11.0, 10.0, 21.0, 20.0);

        cache
            .put(req.key, req.query.clone(), overlay_at(10.5, 20.5, f64::NAN))
            .await;

        assert!(matches!(cache.get(&req.key).await, CacheLookup::Miss));
        assert_eq!(cache.stats().malformed, 1);

        let loaded = cache.load(&req, Priority::Primary).await.unwrap();
        assert!(loaded.was_fetched());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lru_capacity() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(10)));
        let config = CacheConfig {
            capacity: 2,
            ..CacheConfig::default()
        };
        let cache = WeatherOverlayCache::new(Arc::clone(&source), config);

        let reqs: Vec<_> = (0..3)
            .map(|i| {
                let base = i as f64 * 10.0;
                request(base + 1.0, base, base + 1.0, base)
            })
            .collect();
        for req in &reqs {
            cache
                .put(req.key, req.query.clone(), overlay_at(1.0, 1.0, 1.0))
                .await;
        }

        assert_eq!(cache.len().await, 2);
        assert!(cache.peek(&reqs[0].key).await.is_none());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(10)));
        let cache = WeatherOverlayCache::new(Arc::clone(&source), CacheConfig::default());
        let req = request(11.0, 10.0, 21.0, 20.0);

        cache.load(&req, Priority::Primary).await.unwrap();
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert!(cache.is_empty().await);
        assert_eq!(cache.stats(), CacheStatsSnapshot::default());
    }
}
