// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Trip-state synchronization engine
//!
//! Merges an asynchronous location stream with periodic status polls from an
//! opaque navigation engine and redistributes location and route-progress
//! events to any number of observers. Route computation, map-matching and
//! off-route detection stay with the [`NavigationEngine`] collaborator; the
//! location provider is consumed only through the narrow [`LocationProvider`]
//! capability.
//!
//! Execution contexts: observer callbacks run on the session's dispatch
//! tasks on the async runtime and must not block. All engine calls run on
//! the blocking pool and never on the runtime's async workers, so engine
//! implementations may be CPU- or I/O-bound.

use chrono::{DateTime, Utc};
use common::location::{EnhancedLocation, RawLocation};
use common::route::{Route, RouteProgress};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

pub mod error;
pub mod observer;
pub mod relay;
pub mod session;
mod state;

pub use error::{EngineError, ProviderError, SessionError};
pub use observer::{LocationObserver, RouteProgressObserver};
pub use session::{DEFAULT_STATUS_POLL_INTERVAL, TripSession};

use relay::ConflatedSlot;

/// Requested quality of service for a location update subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationPriority {
    /// Most precise fixes the provider can produce, regardless of power use.
    HighAccuracy,
    /// Block-level accuracy with reduced power use.
    BalancedPower,
    /// Coarse fixes, minimal power use.
    LowPower,
    /// No active measurements, only fixes other consumers triggered anyway.
    Passive,
}

/// Configuration for a location update subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationRequest {
    /// Desired interval between fixes. Providers may deliver faster or
    /// slower; the session conflates whatever arrives.
    pub interval: Duration,
    pub priority: LocationPriority,
}

impl Default for LocationRequest {
    fn default() -> Self {
        LocationRequest {
            interval: Duration::from_millis(1000),
            priority: LocationPriority::HighAccuracy,
        }
    }
}

/// Result of a navigation engine status query.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineStatus {
    pub enhanced_location: EnhancedLocation,
    /// Progress along the active route; `None` while no route is set.
    pub route_progress: Option<RouteProgress>,
}

/// Delivery handle handed to a [`LocationProvider`] on subscription.
///
/// The provider's own delivery context is treated as foreign: the sink is
/// cheap to clone, `Send + Sync` and may be called from any thread. It feeds
/// the session's conflating relay, so a slow consumer only ever costs the
/// provider the freshest undelivered fix.
#[derive(Clone)]
pub struct LocationSink {
    relay: Arc<ConflatedSlot<RawLocation>>,
}

impl LocationSink {
    pub(crate) fn new(relay: Arc<ConflatedSlot<RawLocation>>) -> Self {
        LocationSink { relay }
    }

    /// Delivers one raw fix. Fixes arriving after the session stopped the
    /// subscription are dropped.
    pub fn deliver(&self, location: RawLocation) {
        if !self.relay.put(location) {
            debug!("Dropped a location fix, the session relay is closed");
        }
    }

    /// Reports a terminal provider failure.
    ///
    /// Stops the session's location consumption; the session itself stays
    /// intact and can be restarted later.
    pub fn fail(&self, error: ProviderError) {
        error!("Location provider failed, stopping location consumption. Error: {error}");
        self.relay.close();
    }
}

/// Capability interface of an external continuous position provider.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    /// Subscribes to position updates. The provider delivers zero or more
    /// fixes through the sink until [`remove_updates`](Self::remove_updates)
    /// is called or a terminal failure is reported via [`LocationSink::fail`].
    async fn request_updates(
        &self,
        request: &LocationRequest,
        sink: LocationSink,
    ) -> Result<(), ProviderError>;

    /// Cancels the active subscription. A no-op when none is active.
    async fn remove_updates(&self);
}

/// The opaque navigation engine collaborating with the session.
///
/// All methods are invoked on the blocking pool and may block.
pub trait NavigationEngine: Send + Sync {
    /// Hands the active route to the engine. Fire-and-forget.
    fn set_route(&self, route: &Route);

    /// Feeds a raw fix into the engine's fusion. Fire-and-forget.
    fn update_location(&self, location: &RawLocation);

    /// Queries the fused location and route progress at the given time.
    fn get_status(&self, now: DateTime<Utc>) -> Result<EngineStatus, EngineError>;
}

/// Opaque lifecycle host of the trip, e.g. a foreground service.
///
/// `start_service` and `stop_service` are invoked exactly once per
/// `start()`/`stop()` pair of the session.
pub trait TripServiceHost: Send + Sync {
    fn start_service(&self);
    fn stop_service(&self);
}
