// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::location::{EnhancedLocation, RawLocation};
use common::position::Position;
use common::route::{Route, RouteProgress};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use trip_session::{
    EngineError, EngineStatus, LocationObserver, LocationProvider, LocationRequest, LocationSink,
    NavigationEngine, ProviderError, RouteProgressObserver, TripServiceHost, TripSession,
};

/// Polls a predicate until it holds or the duration has elapsed.
pub async fn wait_until(duration: Duration, predicate: impl Fn() -> bool) -> bool {
    let steps = 20_u32;
    let step_duration = duration / steps;
    for _ in 0..steps {
        if predicate() {
            return true;
        }
        tokio::time::sleep(step_duration).await;
    }
    predicate()
}

pub fn fix(latitude: f64, longitude: f64) -> RawLocation {
    RawLocation::new(Position::new(latitude, longitude), Utc::now())
}

pub fn demo_route() -> Route {
    Route::new(
        "demo",
        vec![
            Position::new(52.026649, 11.282535),
            Position::new(52.026751, 11.282047),
            Position::new(52.026807, 11.281746),
        ],
        10.0,
    )
}

pub fn status_with_progress(latitude: f64, longitude: f64) -> EngineStatus {
    let route = demo_route();
    EngineStatus {
        enhanced_location: EnhancedLocation::new(Position::new(latitude, longitude), Utc::now()),
        route_progress: Some(RouteProgress::along(&route, route.distance / 2.0)),
    }
}

/// Status of an engine that has no active route yet: a fused location
/// exists but no progress can be computed.
pub fn status_without_progress(latitude: f64, longitude: f64) -> EngineStatus {
    EngineStatus {
        enhanced_location: EnhancedLocation::new(Position::new(latitude, longitude), Utc::now()),
        route_progress: None,
    }
}

#[derive(Default)]
pub struct FakeTripServiceHost {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl TripServiceHost for FakeTripServiceHost {
    fn start_service(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_service(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Provider fake that hands out fixes on demand through the captured sink.
#[derive(Default)]
pub struct FakeLocationProvider {
    sink: Mutex<Option<LocationSink>>,
    reject_next: Mutex<Option<ProviderError>>,
    pub requests: AtomicUsize,
    pub removals: AtomicUsize,
}

impl FakeLocationProvider {
    /// Delivers a fix through the captured sink; fixes emitted without an
    /// active subscription are dropped, like a real provider after
    /// `remove_updates`.
    pub fn emit(&self, location: RawLocation) {
        let sink = self.sink.lock().unwrap();
        if let Some(sink) = sink.as_ref() {
            sink.deliver(location);
        }
    }

    pub fn fail(&self, error: ProviderError) {
        let sink = self.sink.lock().unwrap();
        match sink.as_ref() {
            Some(sink) => sink.fail(error),
            None => panic!("fail() without an active subscription"),
        }
    }

    pub fn reject_next_request(&self, error: ProviderError) {
        *self.reject_next.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl LocationProvider for FakeLocationProvider {
    async fn request_updates(
        &self,
        _request: &LocationRequest,
        sink: LocationSink,
    ) -> Result<(), ProviderError> {
        if let Some(error) = self.reject_next.lock().unwrap().take() {
            return Err(error);
        }
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    async fn remove_updates(&self) {
        self.removals.fetch_add(1, Ordering::SeqCst);
        *self.sink.lock().unwrap() = None;
    }
}

/// Engine fake recording every call and answering status queries with a
/// configurable result.
pub struct FakeNavigationEngine {
    pub routes: Mutex<Vec<Route>>,
    pub location_updates: Mutex<Vec<RawLocation>>,
    pub status_queries: AtomicUsize,
    status: Mutex<Result<EngineStatus, EngineError>>,
}

impl Default for FakeNavigationEngine {
    fn default() -> Self {
        FakeNavigationEngine {
            routes: Mutex::new(Vec::new()),
            location_updates: Mutex::new(Vec::new()),
            status_queries: AtomicUsize::new(0),
            status: Mutex::new(Err(EngineError::StatusQuery("no status configured".into()))),
        }
    }
}

impl FakeNavigationEngine {
    pub fn set_status(&self, status: Result<EngineStatus, EngineError>) {
        *self.status.lock().unwrap() = status;
    }

    pub fn route_count(&self) -> usize {
        self.routes.lock().unwrap().len()
    }

    pub fn update_count(&self) -> usize {
        self.location_updates.lock().unwrap().len()
    }

    pub fn query_count(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }
}

impl NavigationEngine for FakeNavigationEngine {
    fn set_route(&self, route: &Route) {
        self.routes.lock().unwrap().push(route.clone());
    }

    fn update_location(&self, location: &RawLocation) {
        self.location_updates.lock().unwrap().push(location.clone());
    }

    fn get_status(&self, _now: DateTime<Utc>) -> Result<EngineStatus, EngineError> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        self.status.lock().unwrap().clone()
    }
}

/// Records every notification together with its arrival order.
#[derive(Default)]
pub struct RecordingObserver {
    pub raw: Mutex<Vec<RawLocation>>,
    pub enhanced: Mutex<Vec<EnhancedLocation>>,
    pub progress: Mutex<Vec<RouteProgress>>,
    pub order: Mutex<Vec<&'static str>>,
}

impl RecordingObserver {
    pub fn raw_count(&self) -> usize {
        self.raw.lock().unwrap().len()
    }

    pub fn enhanced_count(&self) -> usize {
        self.enhanced.lock().unwrap().len()
    }

    pub fn progress_count(&self) -> usize {
        self.progress.lock().unwrap().len()
    }
}

impl LocationObserver for RecordingObserver {
    fn on_raw_location_changed(&self, location: &RawLocation) {
        self.raw.lock().unwrap().push(location.clone());
        self.order.lock().unwrap().push("raw");
    }

    fn on_enhanced_location_changed(&self, location: &EnhancedLocation) {
        self.enhanced.lock().unwrap().push(location.clone());
        self.order.lock().unwrap().push("enhanced");
    }
}

impl RouteProgressObserver for RecordingObserver {
    fn on_route_progress_changed(&self, progress: &RouteProgress) {
        self.progress.lock().unwrap().push(progress.clone());
        self.order.lock().unwrap().push("progress");
    }
}

/// Observer that panics on every callback, for isolation tests.
pub struct PanickingObserver;

impl LocationObserver for PanickingObserver {
    fn on_raw_location_changed(&self, _location: &RawLocation) {
        panic!("misbehaving location observer");
    }

    fn on_enhanced_location_changed(&self, _location: &EnhancedLocation) {
        panic!("misbehaving location observer");
    }
}

pub struct Harness {
    pub host: Arc<FakeTripServiceHost>,
    pub provider: Arc<FakeLocationProvider>,
    pub engine: Arc<FakeNavigationEngine>,
    pub session: TripSession,
}

pub fn harness_with_poll_interval(poll_interval: Duration) -> Harness {
    let host = Arc::new(FakeTripServiceHost::default());
    let provider = Arc::new(FakeLocationProvider::default());
    let engine = Arc::new(FakeNavigationEngine::default());
    let session = TripSession::new(
        host.clone(),
        provider.clone(),
        LocationRequest::default(),
        engine.clone(),
    )
    .with_poll_interval(poll_interval);
    Harness {
        host,
        provider,
        engine,
        session,
    }
}
