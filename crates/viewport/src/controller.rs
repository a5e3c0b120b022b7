//! Viewport controller.
//!
//! Owns the overlay cache and turns a stream of raw map movements into:
//!
//! - `ZoomBucketChanged` events, emitted inside the movement call, together
//!   with an immediate re-cluster
//! - `BoundsSettled` events once movement has been idle for the debounce
//!   window, followed by an overlay load, suitability annotation and a new
//!   [`RenderFrame`]
//! - prefetch of upcoming time slices after each successful load
//!
//! Overlay results are applied only if no newer load started meanwhile.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};

use clustering::{fit_markers, ClusterEngine, FitView};
use overlay_cache::{
    CacheKeyNormalizer, CacheStatsSnapshot, Loaded, OverlaySource, Priority, WeatherOverlayCache,
};
use overlay_common::{
    build_markers, Bounds, Clock, LatLng, Marker, MarkerId, MarkerRecord, OverlayError,
    OverlayResult, SystemClock, Viewport, WindOverlay,
};
use suitability::{SuitabilityAnnotator, SuitabilityRecord};

use crate::config::OverlayConfig;
use crate::fit_state::{FitEvent, FitState};
use crate::prefetch::PrefetchScheduler;
use crate::render::{describe_groups, OverlayStatus, RenderFrame};
use crate::scheduler::{CancelToken, TaskScheduler};

/// Who moved the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOrigin {
    User,
    /// Moves made by the application itself, such as applying a fit.
    Programmatic,
}

/// One raw movement notification from the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapMoveEvent {
    pub bounds: Bounds,
    pub center: LatLng,
    pub zoom: f64,
    pub origin: MoveOrigin,
}

impl MapMoveEvent {
    pub fn user(bounds: Bounds, zoom: f64) -> Self {
        Self {
            bounds,
            center: bounds.center(),
            zoom,
            origin: MoveOrigin::User,
        }
    }

    pub fn programmatic(bounds: Bounds, zoom: f64) -> Self {
        Self {
            origin: MoveOrigin::Programmatic,
            ..Self::user(bounds, zoom)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    ZoomBucketChanged(u8),
    BoundsSettled(Viewport),
    FitRequested(FitView),
}

struct ControllerState {
    viewport: Option<Viewport>,
    zoom_bucket: Option<u8>,
    markers: Arc<Vec<Marker>>,
    time: Option<DateTime<Utc>>,
    overlay_enabled: bool,
    overlay: Option<Arc<WindOverlay>>,
    overlay_status: OverlayStatus,
    suitability: HashMap<MarkerId, SuitabilityRecord>,
    fit: FitState,
    /// Bumped by every movement; a debounce task only settles if it still
    /// matches.
    move_seq: u64,
    /// Bumped by every overlay load; a result is only applied if it still
    /// matches.
    load_epoch: u64,
    pending_settle: Option<CancelToken>,
    frame_seq: u64,
    shut_down: bool,
}

struct ControllerInner<S: OverlaySource<Data = WindOverlay>> {
    config: OverlayConfig,
    normalizer: CacheKeyNormalizer,
    cache: WeatherOverlayCache<S>,
    annotator: SuitabilityAnnotator,
    clusterer: ClusterEngine,
    prefetch: PrefetchScheduler<S>,
    debouncer: TaskScheduler,
    clock: Arc<dyn Clock>,
    state: Mutex<ControllerState>,
    events: broadcast::Sender<ViewportEvent>,
    frames: watch::Sender<RenderFrame>,
}

/// Drives overlay loading, clustering and annotation from map movements.
///
/// Cheap to clone; clones control the same map.
pub struct ViewportController<S: OverlaySource<Data = WindOverlay>> {
    inner: Arc<ControllerInner<S>>,
}

impl<S: OverlaySource<Data = WindOverlay>> Clone for ViewportController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: OverlaySource<Data = WindOverlay>> ViewportController<S> {
    pub fn new(source: Arc<S>, config: OverlayConfig) -> OverlayResult<Self> {
        Self::with_clock(source, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<S>,
        config: OverlayConfig,
        clock: Arc<dyn Clock>,
    ) -> OverlayResult<Self> {
        config.validate().map_err(OverlayError::InvalidConfig)?;

        let normalizer = CacheKeyNormalizer::new(config.normalizer.clone());
        let cache = WeatherOverlayCache::new(source, config.cache.clone());
        let prefetch = PrefetchScheduler::new(
            cache.clone(),
            normalizer.clone(),
            config.prefetch.clone(),
            Arc::clone(&clock),
        );
        let (events, _) = broadcast::channel(config.controller.event_buffer);
        let overlay_enabled = config.controller.overlay_enabled;
        let initial_status = if overlay_enabled {
            OverlayStatus::Idle
        } else {
            OverlayStatus::Disabled
        };
        let (frames, _) = watch::channel(RenderFrame {
            overlay_status: initial_status.clone(),
            ..RenderFrame::default()
        });
        prefetch.set_enabled(overlay_enabled && config.prefetch.enabled);

        Ok(Self {
            inner: Arc::new(ControllerInner {
                annotator: SuitabilityAnnotator::new(config.suitability.clone()),
                clusterer: ClusterEngine::new(config.clustering.clone()),
                config,
                normalizer,
                cache,
                prefetch,
                debouncer: TaskScheduler::new(),
                clock,
                state: Mutex::new(ControllerState {
                    viewport: None,
                    zoom_bucket: None,
                    markers: Arc::new(Vec::new()),
                    time: None,
                    overlay_enabled,
                    overlay: None,
                    overlay_status: initial_status,
                    suitability: HashMap::new(),
                    fit: FitState::default(),
                    move_seq: 0,
                    load_epoch: 0,
                    pending_settle: None,
                    frame_seq: 0,
                    shut_down: false,
                }),
                events,
                frames,
            }),
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ViewportEvent> {
        self.inner.events.subscribe()
    }

    pub fn frames(&self) -> watch::Receiver<RenderFrame> {
        self.inner.frames.subscribe()
    }

    pub fn current_frame(&self) -> RenderFrame {
        self.inner.frames.borrow().clone()
    }

    pub fn cache(&self) -> &WeatherOverlayCache<S> {
        &self.inner.cache
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.inner.cache.stats()
    }

    pub async fn fit_state(&self) -> FitState {
        self.inner.state.lock().await.fit
    }

    /// Feed one movement. Cheap; may be called for every animation frame.
    pub async fn on_map_move(&self, event: MapMoveEvent) {
        let mut state = self.inner.state.lock().await;
        if state.shut_down {
            return;
        }

        let viewport = Viewport::new(event.bounds, event.center, event.zoom);
        let bucket = viewport.zoom_bucket();
        state.viewport = Some(viewport);

        if event.origin == MoveOrigin::User {
            let has_markers = !state.markers.is_empty();
            state.fit = state.fit.on_event(FitEvent::UserMoved, has_markers).state;
        }

        if state.zoom_bucket != Some(bucket) {
            state.zoom_bucket = Some(bucket);
            debug!(zoom_bucket = bucket, "Zoom bucket changed");
            let _ = self.inner.events.send(ViewportEvent::ZoomBucketChanged(bucket));
            self.publish_locked(&mut state);
        }

        if let Some(pending) = state.pending_settle.take() {
            pending.cancel();
        }
        state.move_seq += 1;
        let seq = state.move_seq;

        let weak = Arc::downgrade(&self.inner);
        state.pending_settle = Some(
            self.inner
                .debouncer
                .schedule(self.inner.config.controller.debounce(), settle_task(weak, seq)),
        );
    }

    /// Replace the marker set. Triggers an automatic fit until the user has
    /// moved the map.
    pub async fn set_markers(&self, records: Vec<MarkerRecord>) {
        let markers = build_markers(records);
        let mut state = self.inner.state.lock().await;
        if state.shut_down {
            return;
        }

        info!(markers = markers.len(), "Marker set replaced");
        state.markers = Arc::new(markers);
        self.annotate_locked(&mut state);
        self.apply_fit_event_locked(&mut state, FitEvent::DataLoaded);
        self.publish_locked(&mut state);
    }

    /// Select the overlay time (`None` for live) and load it for the current
    /// viewport without waiting for a debounce.
    pub async fn set_time_slice(&self, time: Option<DateTime<Utc>>) {
        {
            let mut state = self.inner.state.lock().await;
            if state.shut_down {
                return;
            }
            state.time = time;
        }
        self.reload().await;
    }

    pub async fn set_overlay_enabled(&self, enabled: bool) {
        {
            let mut state = self.inner.state.lock().await;
            if state.shut_down || state.overlay_enabled == enabled {
                return;
            }
            state.overlay_enabled = enabled;
            self.inner
                .prefetch
                .set_enabled(enabled && self.inner.config.prefetch.enabled);

            if !enabled {
                info!("Wind overlay disabled");
                state.load_epoch += 1;
                state.overlay = None;
                state.overlay_status = OverlayStatus::Disabled;
                self.annotate_locked(&mut state);
                self.publish_locked(&mut state);
                return;
            }
            info!("Wind overlay enabled");
        }
        self.reload().await;
    }

    /// Fit the view to the markers again, regardless of user movement.
    pub async fn request_fit_reset(&self) {
        let mut state = self.inner.state.lock().await;
        if state.shut_down {
            return;
        }
        self.apply_fit_event_locked(&mut state, FitEvent::ResetRequested);
    }

    /// Re-issue the overlay request for the current viewport.
    pub async fn retry_overlay(&self) {
        self.reload().await;
    }

    /// Cancel the pending debounce and all prefetch timers; later calls are
    /// ignored.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        if state.shut_down {
            return;
        }
        state.shut_down = true;
        state.load_epoch += 1;
        if let Some(pending) = state.pending_settle.take() {
            pending.cancel();
        }
        let cancelled = self.inner.debouncer.cancel_all();
        self.inner.prefetch.shutdown();
        info!(cancelled_settles = cancelled, "Viewport controller shut down");
    }

    async fn settle(&self, seq: u64) {
        let viewport = {
            let mut state = self.inner.state.lock().await;
            if state.shut_down || state.move_seq != seq {
                return;
            }
            state.pending_settle = None;
            match state.viewport {
                Some(viewport) => viewport,
                None => return,
            }
        };

        debug!(
            north = viewport.bounds.north,
            south = viewport.bounds.south,
            east = viewport.bounds.east,
            west = viewport.bounds.west,
            zoom = viewport.zoom,
            "Viewport settled"
        );
        let _ = self.inner.events.send(ViewportEvent::BoundsSettled(viewport));
        self.reload().await;
    }

    /// Load the overlay for the current viewport and time, then publish.
    async fn reload(&self) {
        let (viewport, time, epoch) = {
            let mut state = self.inner.state.lock().await;
            if state.shut_down || !state.overlay_enabled {
                return;
            }
            let Some(viewport) = state.viewport else {
                return;
            };
            state.load_epoch += 1;
            (viewport, state.time, state.load_epoch)
        };

        let request = match self
            .inner
            .normalizer
            .request(&viewport.bounds, viewport.zoom, time)
        {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Skipping overlay load");
                return;
            }
        };

        {
            let mut state = self.inner.state.lock().await;
            if state.load_epoch != epoch {
                return;
            }
            if !self.inner.cache.contains_fresh(&request.key).await {
                state.overlay_status = OverlayStatus::Loading;
                self.publish_locked(&mut state);
            }
        }

        let result = self.inner.cache.load(&request, Priority::Primary).await;

        let mut state = self.inner.state.lock().await;
        if state.shut_down || state.load_epoch != epoch {
            debug!(key = %request.key, "Ignoring overlay for a superseded viewport");
            return;
        }

        match result {
            Ok(Loaded::Superseded) => {
                // Another holder of the cache issued a newer overlapping
                // primary load. Keep whatever overlay is shown.
                debug!(key = %request.key, "Overlay response superseded in the cache");
                state.overlay_status = match state.overlay {
                    Some(_) => OverlayStatus::Ready { stale: true },
                    None => OverlayStatus::Idle,
                };
                self.publish_locked(&mut state);
            }
            Ok(loaded) => {
                let stale = matches!(loaded, Loaded::Stale(_));
                state.overlay = loaded.data().cloned();
                state.overlay_status = OverlayStatus::Ready { stale };
                self.annotate_locked(&mut state);
                self.publish_locked(&mut state);
                drop(state);

                let reference = time.unwrap_or_else(|| self.inner.clock.now());
                self.inner.prefetch.on_fetch_success(&viewport, reference);
            }
            Err(e) => {
                warn!(key = %request.key, error = %e, "Overlay unavailable");
                state.overlay = None;
                state.overlay_status = OverlayStatus::Failed {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                };
                self.annotate_locked(&mut state);
                self.publish_locked(&mut state);
            }
        }
    }

    fn apply_fit_event_locked(&self, state: &mut ControllerState, event: FitEvent) {
        let transition = state.fit.on_event(event, !state.markers.is_empty());
        state.fit = transition.state;
        if !transition.fit {
            return;
        }

        let controller = &self.inner.config.controller;
        if let Some(view) = fit_markers(
            &state.markers,
            controller.map_width_px,
            controller.map_height_px,
            &self.inner.config.fit,
        ) {
            debug!(lat = view.center.lat, lng = view.center.lng, zoom = view.zoom, "Fit requested");
            let _ = self.inner.events.send(ViewportEvent::FitRequested(view));
        }
    }

    fn annotate_locked(&self, state: &mut ControllerState) {
        state.suitability = self
            .inner
            .annotator
            .annotate_all(&state.markers, state.overlay.as_deref())
            .into_iter()
            .map(|r| (r.marker_id, r))
            .collect();
    }

    fn publish_locked(&self, state: &mut ControllerState) {
        state.frame_seq += 1;

        let (markers, clusters) = match state.viewport {
            Some(viewport) => {
                let layers = self
                    .inner
                    .clusterer
                    .cluster_layers(&state.markers, viewport.zoom);
                let by_id: HashMap<MarkerId, &Marker> =
                    state.markers.iter().map(|m| (m.id, m)).collect();
                describe_groups(&layers, &by_id, &state.suitability)
            }
            None => (Vec::new(), Vec::new()),
        };

        let frame = RenderFrame {
            sequence: state.frame_seq,
            viewport: state.viewport,
            zoom_bucket: state.zoom_bucket,
            markers,
            clusters,
            overlay_status: state.overlay_status.clone(),
            wind: state.overlay.as_deref().cloned(),
        };
        self.inner.frames.send_replace(frame);
    }
}

fn settle_task<S: OverlaySource<Data = WindOverlay>>(
    inner: Weak<ControllerInner<S>>,
    seq: u64,
) -> impl std::future::Future<Output = ()> + Send + 'static {
    async move {
        if let Some(inner) = inner.upgrade() {
            ViewportController { inner }.settle(seq).await;
        }
    }
}

