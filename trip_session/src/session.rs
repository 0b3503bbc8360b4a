// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::observer::{LocationObserver, ObserverSet, RouteProgressObserver, notify_each};
use crate::relay::ConflatedSlot;
use crate::state::SessionState;
use crate::{
    LocationProvider, LocationRequest, LocationSink, NavigationEngine, SessionError,
    TripServiceHost,
};
use chrono::Utc;
use common::location::{EnhancedLocation, RawLocation};
use common::route::{Route, RouteProgress};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Interval between two navigation engine status polls unless overridden
/// with [`TripSession::with_poll_interval`].
pub const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// State shared between the session surface and its background loops.
struct SessionCore {
    engine: Arc<dyn NavigationEngine>,
    state: RwLock<SessionState>,
    location_observers: ObserverSet<dyn LocationObserver>,
    progress_observers: ObserverSet<dyn RouteProgressObserver>,
}

/// Everything owned by one `start()`/`stop()` round.
///
/// The relay is created per round on purpose: a relay shared across rounds
/// or sessions could leak a stale fix from one trip into the next.
struct ActiveTrip {
    relay: Arc<ConflatedSlot<RawLocation>>,
    cancel: CancellationToken,
    dispatch_task: JoinHandle<()>,
    poll_task: JoinHandle<()>,
}

enum LifecycleState {
    Idle,
    Starting,
    Running(ActiveTrip),
    Stopping,
}

impl LifecycleState {
    fn name(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "Idle",
            LifecycleState::Starting => "Starting",
            LifecycleState::Running(_) => "Running",
            LifecycleState::Stopping => "Stopping",
        }
    }
}

/// A real-time trip session.
///
/// Merges the provider's raw fix stream with periodic engine status polls
/// and fans both out to registered observers. One instance manages one trip
/// at a time; `start()` and `stop()` may be called repeatedly.
pub struct TripSession {
    core: Arc<SessionCore>,
    host: Arc<dyn TripServiceHost>,
    provider: Arc<dyn LocationProvider>,
    request: LocationRequest,
    poll_interval: Duration,
    lifecycle: tokio::sync::Mutex<LifecycleState>,
}

impl TripSession {
    pub fn new(
        host: Arc<dyn TripServiceHost>,
        provider: Arc<dyn LocationProvider>,
        request: LocationRequest,
        engine: Arc<dyn NavigationEngine>,
    ) -> Self {
        TripSession {
            core: Arc::new(SessionCore {
                engine,
                state: RwLock::new(SessionState::default()),
                location_observers: ObserverSet::new(),
                progress_observers: ObserverSet::new(),
            }),
            host,
            provider,
            request,
            poll_interval: DEFAULT_STATUS_POLL_INTERVAL,
            lifecycle: tokio::sync::Mutex::new(LifecycleState::Idle),
        }
    }

    /// Overrides the engine status poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Starts the trip: service host, provider subscription, raw-location
    /// dispatch loop and engine poll loop.
    ///
    /// A route set while the session was idle is pushed to the engine now.
    /// Calling `start()` while not idle is an idempotent no-op. On a provider
    /// subscription failure the session rolls back to idle and the error is
    /// returned.
    pub async fn start(&self) -> Result<(), SessionError> {
        let mut lifecycle = self.lifecycle.lock().await;
        match std::mem::replace(&mut *lifecycle, LifecycleState::Starting) {
            LifecycleState::Idle => {}
            other => {
                debug!("start() called in state {}, ignoring", other.name());
                *lifecycle = other;
                return Ok(());
            }
        }

        self.host.start_service();
        let relay = Arc::new(ConflatedSlot::new());
        let cancel = CancellationToken::new();
        let sink = LocationSink::new(relay.clone());
        if let Err(e) = self.provider.request_updates(&self.request, sink).await {
            error!("Failed to request location updates. Error: {e}");
            self.host.stop_service();
            *lifecycle = LifecycleState::Idle;
            return Err(e.into());
        }

        let dispatch_task = tokio::spawn(dispatch_loop(
            self.core.clone(),
            relay.clone(),
            cancel.clone(),
        ));
        let poll_task = tokio::spawn(poll_loop(
            self.core.clone(),
            self.poll_interval,
            cancel.clone(),
        ));

        let stored_route = {
            let state = self.core.state.read().unwrap_or_else(|e| e.into_inner());
            state.route.clone()
        };
        if let Some(route) = stored_route {
            push_route(&self.core.engine, route, &cancel);
        }

        *lifecycle = LifecycleState::Running(ActiveTrip {
            relay,
            cancel,
            dispatch_task,
            poll_task,
        });
        info!("Trip session started");
        Ok(())
    }

    /// Stops the trip: service host, provider subscription, both loops and
    /// any scheduled engine handoffs.
    ///
    /// When `stop()` returns both loops have terminated; no further observer
    /// notifications occur and no new engine calls are issued. Calling
    /// `stop()` while not running is an idempotent no-op.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let trip = match std::mem::replace(&mut *lifecycle, LifecycleState::Stopping) {
            LifecycleState::Running(trip) => trip,
            other => {
                debug!("stop() called in state {}, ignoring", other.name());
                *lifecycle = other;
                return;
            }
        };

        self.host.stop_service();
        self.provider.remove_updates().await;
        trip.cancel.cancel();
        trip.relay.close();
        if let Err(e) = trip.dispatch_task.await {
            error!("Raw location dispatch loop ended abnormally. Error: {e}");
        }
        if let Err(e) = trip.poll_task.await {
            error!("Engine poll loop ended abnormally. Error: {e}");
        }

        *lifecycle = LifecycleState::Idle;
        info!("Trip session stopped");
    }

    /// Sets or clears the active route.
    ///
    /// The value is stored with last-write-wins semantics in any state. A
    /// non-`None` route is additionally handed to the engine on the blocking
    /// pool, but only while the session is running; a route stored while
    /// idle is pushed by the next `start()`.
    pub async fn set_route(&self, route: Option<Route>) {
        {
            let mut state = self.core.state.write().unwrap_or_else(|e| e.into_inner());
            state.route = route.clone();
        }
        let Some(route) = route else {
            return;
        };
        let lifecycle = self.lifecycle.lock().await;
        match &*lifecycle {
            LifecycleState::Running(trip) => push_route(&self.core.engine, route, &trip.cancel),
            _ => debug!("Route stored while the session is idle, engine push deferred to start()"),
        }
    }

    /// Returns the latest raw provider fix, if any arrived yet.
    pub fn raw_location(&self) -> Option<RawLocation> {
        let state = self.core.state.read().unwrap_or_else(|e| e.into_inner());
        state.raw_location.clone()
    }

    /// Returns the latest engine-fused location, if any was polled yet.
    pub fn enhanced_location(&self) -> Option<EnhancedLocation> {
        let state = self.core.state.read().unwrap_or_else(|e| e.into_inner());
        state.enhanced_location.clone()
    }

    /// Returns the latest route progress, if any was polled yet.
    pub fn route_progress(&self) -> Option<RouteProgress> {
        let state = self.core.state.read().unwrap_or_else(|e| e.into_inner());
        state.route_progress.clone()
    }

    /// Registers a location observer.
    ///
    /// If a raw location and/or an enhanced location already exist they are
    /// replayed synchronously, raw first, before this call returns. The
    /// observer is added before the replay, so it cannot miss both the
    /// replay and the next live notification; an early duplicate is
    /// possible.
    pub fn register_location_observer(&self, observer: Arc<dyn LocationObserver>) {
        self.core.location_observers.add(observer.clone());
        let (raw, enhanced) = {
            let state = self.core.state.read().unwrap_or_else(|e| e.into_inner());
            (state.raw_location.clone(), state.enhanced_location.clone())
        };
        let replay = [observer];
        if let Some(raw) = raw {
            notify_each(&replay, "location", |o| o.on_raw_location_changed(&raw));
        }
        if let Some(enhanced) = enhanced {
            notify_each(&replay, "location", |o| {
                o.on_enhanced_location_changed(&enhanced)
            });
        }
    }

    /// Unregisters a location observer. A no-op when it was never registered.
    pub fn unregister_location_observer(&self, observer: &Arc<dyn LocationObserver>) {
        self.core.location_observers.remove(observer);
    }

    /// Registers a route progress observer, replaying the current progress
    /// synchronously if one exists.
    pub fn register_route_progress_observer(&self, observer: Arc<dyn RouteProgressObserver>) {
        self.core.progress_observers.add(observer.clone());
        let progress = {
            let state = self.core.state.read().unwrap_or_else(|e| e.into_inner());
            state.route_progress.clone()
        };
        if let Some(progress) = progress {
            let replay = [observer];
            notify_each(&replay, "route progress", |o| {
                o.on_route_progress_changed(&progress)
            });
        }
    }

    /// Unregisters a route progress observer. A no-op when it was never
    /// registered.
    pub fn unregister_route_progress_observer(&self, observer: &Arc<dyn RouteProgressObserver>) {
        self.core.progress_observers.remove(observer);
    }
}

/// Schedules a fire-and-forget route push on the blocking pool.
///
/// The token is checked inside the blocking task, so a handoff scheduled
/// just before `stop()` never reaches the engine afterwards.
fn push_route(engine: &Arc<dyn NavigationEngine>, route: Route, cancel: &CancellationToken) {
    let engine = engine.clone();
    let token = cancel.clone();
    tokio::task::spawn_blocking(move || {
        if !token.is_cancelled() {
            engine.set_route(&route);
        }
    });
}

/// Drains the conflating relay for the lifetime of one trip.
///
/// Every taken fix updates the session state, is fanned out to the location
/// observers and then handed to the engine on the blocking pool. Terminates
/// when the relay is closed or the trip is cancelled.
async fn dispatch_loop(
    core: Arc<SessionCore>,
    relay: Arc<ConflatedSlot<RawLocation>>,
    cancel: CancellationToken,
) {
    loop {
        let location = tokio::select! {
            _ = cancel.cancelled() => break,
            taken = relay.take() => match taken {
                Some(location) => location,
                None => break,
            },
        };

        {
            let mut state = core.state.write().unwrap_or_else(|e| e.into_inner());
            state.raw_location = Some(location.clone());
        }
        let observers = core.location_observers.snapshot();
        notify_each(&observers, "location", |o| {
            o.on_raw_location_changed(&location)
        });

        let engine = core.engine.clone();
        let token = cancel.clone();
        tokio::task::spawn_blocking(move || {
            if !token.is_cancelled() {
                engine.update_location(&location);
            }
        });
    }
    debug!("Raw location dispatch loop finished");
}

/// Polls the navigation engine at a fixed interval for the lifetime of one
/// trip.
///
/// Ticks are anchored to the start time (`start + N * interval`), so slow
/// status queries do not accumulate drift. A failed query skips the tick and
/// keeps the previous values; a result arriving after cancellation is
/// dropped without a state update or notification.
async fn poll_loop(core: Arc<SessionCore>, interval: Duration, cancel: CancellationToken) {
    let start = tokio::time::Instant::now();
    let mut ticker = tokio::time::interval_at(start + interval, interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let engine = core.engine.clone();
        let query = tokio::task::spawn_blocking(move || engine.get_status(Utc::now()));
        let status = tokio::select! {
            _ = cancel.cancelled() => break,
            joined = query => match joined {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => {
                    warn!("Engine status query failed, skipping this tick. Error: {e}");
                    continue;
                }
                Err(e) => {
                    error!("Engine status task failed, skipping this tick. Error: {e}");
                    continue;
                }
            },
        };

        {
            let mut state = core.state.write().unwrap_or_else(|e| e.into_inner());
            state.enhanced_location = Some(status.enhanced_location.clone());
            if let Some(ref progress) = status.route_progress {
                state.route_progress = Some(progress.clone());
            }
        }
        let observers = core.location_observers.snapshot();
        notify_each(&observers, "location", |o| {
            o.on_enhanced_location_changed(&status.enhanced_location)
        });
        if let Some(ref progress) = status.route_progress {
            let observers = core.progress_observers.snapshot();
            notify_each(&observers, "route progress", |o| {
                o.on_route_progress_changed(progress)
            });
        }
    }
    debug!("Engine poll loop finished");
}
