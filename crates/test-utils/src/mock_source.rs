//! Scriptable in-memory [`OverlaySource`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use overlay_cache::{OverlayQuery, OverlaySource};
use overlay_common::{OverlayError, OverlayResult, WindOverlay};

use crate::fixtures::uniform_overlay;

/// Overlay source that records every query and answers after a fixed delay.
///
/// By default each answer is a uniform wind field over the query bounds at
/// the configured speed. Failure can be switched on and off at runtime.
pub struct MockOverlaySource {
    delay: Duration,
    speed: Mutex<f64>,
    direction: f64,
    fail: AtomicBool,
    malformed: AtomicBool,
    calls: AtomicUsize,
    queries: Mutex<Vec<OverlayQuery>>,
}

impl MockOverlaySource {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            speed: Mutex::new(5.0),
            direction: 90.0,
            fail: AtomicBool::new(false),
            malformed: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_direction(mut self, direction: f64) -> Self {
        self.direction = direction;
        self
    }

    /// Speed reported by subsequent answers.
    pub fn set_speed(&self, speed: f64) {
        *self.speed.lock().unwrap() = speed;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Answer with data that fails the shape check.
    pub fn set_malformed(&self, malformed: bool) {
        self.malformed.store(malformed, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<OverlayQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl OverlaySource for MockOverlaySource {
    type Data = WindOverlay;

    async fn fetch(&self, query: &OverlayQuery) -> OverlayResult<WindOverlay> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        tokio::time::sleep(self.delay).await;

        if self.fail.load(Ordering::SeqCst) {
            return Err(OverlayError::UpstreamStatus {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }

        let mut overlay = uniform_overlay(&query.bounds, *self.speed.lock().unwrap(), self.direction);
        if self.malformed.load(Ordering::SeqCst) {
            overlay.points[0].speed = f64::NAN;
        }
        Ok(overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_common::Bounds;

    fn query() -> OverlayQuery {
        OverlayQuery {
            bounds: Bounds::new(1.0, 0.0, 1.0, 0.0),
            zoom_level: 8,
            time_slice: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_queries() {
        let source = MockOverlaySource::new(Duration::from_millis(5));
        source.set_speed(7.0);

        let overlay = source.fetch(&query()).await.unwrap();
        assert_eq!(overlay.points[0].speed, 7.0);
        assert_eq!(source.calls(), 1);
        assert_eq!(source.queries(), vec![query()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_switch() {
        let source = MockOverlaySource::new(Duration::from_millis(5));
        source.set_failing(true);
        assert!(source.fetch(&query()).await.is_err());

        source.set_failing(false);
        assert!(source.fetch(&query()).await.is_ok());
    }
}
