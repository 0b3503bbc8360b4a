// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Simulated collaborators for headless runs without GPS hardware or a real
//! navigation engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::location::{EnhancedLocation, RawLocation};
use common::position::{Position, distance_between};
use common::route::{Route, RouteProgress};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};
use trip_session::{
    EngineError, EngineStatus, LocationProvider, LocationRequest, LocationSink, NavigationEngine,
    ProviderError, TripServiceHost,
};

struct WalkConfig {
    waypoints: Vec<Position>,
    velocity: f64,
    fix_interval: Duration,
}

/// A location provider that walks a list of waypoints at constant speed.
///
/// Each subscription spawns a task that interpolates linearly between
/// consecutive waypoints and delivers one fix per requested interval. The
/// walk ends at the final waypoint; the subscription then goes quiet without
/// failing.
pub struct SimulatedLocationProvider {
    waypoints: Vec<Position>,
    velocity: f64,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SimulatedLocationProvider {
    pub fn new(waypoints: Vec<Position>, velocity: f64) -> Self {
        SimulatedLocationProvider {
            waypoints,
            velocity,
            task: Mutex::new(None),
        }
    }
}

#[async_trait]
impl LocationProvider for SimulatedLocationProvider {
    async fn request_updates(
        &self,
        request: &LocationRequest,
        sink: LocationSink,
    ) -> Result<(), ProviderError> {
        if self.waypoints.len() < 2 {
            return Err(ProviderError::Unavailable(
                "the simulated provider needs at least two waypoints".into(),
            ));
        }
        let config = WalkConfig {
            waypoints: self.waypoints.clone(),
            velocity: self.velocity,
            fix_interval: request.interval,
        };
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = task.take() {
            previous.abort();
        }
        *task = Some(tokio::spawn(walk_route(config, sink)));
        Ok(())
    }

    async fn remove_updates(&self) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = task.take() {
            task.abort();
        }
    }
}

async fn walk_route(config: WalkConfig, sink: LocationSink) {
    let step = config.velocity * config.fix_interval.as_secs_f64();
    let mut ticker = tokio::time::interval(config.fix_interval);
    let mut leg = 0_usize;
    let mut traveled_on_leg = 0.0_f64;
    loop {
        ticker.tick().await;
        let Some(position) = position_on_route(
            &config.waypoints,
            &mut leg,
            &mut traveled_on_leg,
        ) else {
            debug!("Simulated walk reached the final waypoint");
            break;
        };
        let mut fix = RawLocation::new(position, Utc::now());
        fix.speed = Some(config.velocity);
        fix.horizontal_accuracy = Some(2.5);
        sink.deliver(fix);
        traveled_on_leg += step;
    }
}

fn position_on_route(
    waypoints: &[Position],
    leg: &mut usize,
    traveled_on_leg: &mut f64,
) -> Option<Position> {
    loop {
        if *leg + 1 >= waypoints.len() {
            return None;
        }
        let from = waypoints[*leg];
        let to = waypoints[*leg + 1];
        let leg_length = distance_between(&from, &to);
        if *traveled_on_leg < leg_length || leg_length == 0.0 {
            let fraction = if leg_length > 0.0 {
                *traveled_on_leg / leg_length
            } else {
                1.0
            };
            return Some(Position::new(
                from.latitude + (to.latitude - from.latitude) * fraction,
                from.longitude + (to.longitude - from.longitude) * fraction,
            ));
        }
        *traveled_on_leg -= leg_length;
        *leg += 1;
    }
}

struct EngineInner {
    route: Option<Route>,
    last_fix: Option<RawLocation>,
    distance_traveled: f64,
}

/// A stand-in navigation engine without map data.
///
/// The enhanced location echoes the latest raw fix; progress is the
/// accumulated distance over all received fixes projected onto the active
/// route.
pub struct DeadReckoningEngine {
    inner: Mutex<EngineInner>,
}

impl Default for DeadReckoningEngine {
    fn default() -> Self {
        DeadReckoningEngine {
            inner: Mutex::new(EngineInner {
                route: None,
                last_fix: None,
                distance_traveled: 0.0,
            }),
        }
    }
}

impl NavigationEngine for DeadReckoningEngine {
    fn set_route(&self, route: &Route) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        info!("Engine received route '{}' ({:.0} m)", route.name, route.distance);
        inner.route = Some(route.clone());
        inner.distance_traveled = 0.0;
    }

    fn update_location(&self, location: &RawLocation) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let step = inner
            .last_fix
            .as_ref()
            .map(|previous| distance_between(&previous.position, &location.position))
            .unwrap_or(0.0);
        inner.distance_traveled += step;
        inner.last_fix = Some(location.clone());
    }

    fn get_status(&self, now: DateTime<Utc>) -> Result<EngineStatus, EngineError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(fix) = inner.last_fix.as_ref() else {
            return Err(EngineError::StatusQuery("no location fix received yet".into()));
        };
        let mut enhanced = EnhancedLocation::new(fix.position, now);
        enhanced.speed = fix.speed;
        enhanced.bearing = fix.bearing;
        let route_progress = inner
            .route
            .as_ref()
            .map(|route| RouteProgress::along(route, inner.distance_traveled));
        Ok(EngineStatus {
            enhanced_location: enhanced,
            route_progress,
        })
    }
}

/// Service host that only logs its lifecycle transitions.
pub struct LoggingServiceHost;

impl TripServiceHost for LoggingServiceHost {
    fn start_service(&self) {
        info!("Trip service started");
    }

    fn stop_service(&self) {
        info!("Trip service stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_interpolates_within_the_first_leg() {
        let waypoints = vec![
            Position::new(52.026649, 11.282535),
            Position::new(52.026751, 11.282047),
        ];
        let mut leg = 0;
        let mut traveled = 0.0;
        let start = position_on_route(&waypoints, &mut leg, &mut traveled).unwrap();
        assert_eq!(start, waypoints[0]);

        traveled = distance_between(&waypoints[0], &waypoints[1]) / 2.0;
        let midpoint = position_on_route(&waypoints, &mut leg, &mut traveled).unwrap();
        assert!(midpoint.latitude > waypoints[0].latitude);
        assert!(midpoint.latitude < waypoints[1].latitude);
    }

    #[test]
    fn walk_ends_after_the_final_waypoint() {
        let waypoints = vec![
            Position::new(52.026649, 11.282535),
            Position::new(52.026751, 11.282047),
        ];
        let mut leg = 0;
        let mut traveled = distance_between(&waypoints[0], &waypoints[1]) + 1.0;
        assert_eq!(position_on_route(&waypoints, &mut leg, &mut traveled), None);
    }

    #[test]
    fn dead_reckoning_progress_follows_the_updates() {
        let engine = DeadReckoningEngine::default();
        let route = Route::new(
            "straight",
            vec![
                Position::new(52.026649, 11.282535),
                Position::new(52.026751, 11.282047),
            ],
            10.0,
        );
        engine.set_route(&route);
        engine.update_location(&RawLocation::new(route.waypoints[0], Utc::now()));
        engine.update_location(&RawLocation::new(route.waypoints[1], Utc::now()));

        let status = engine.get_status(Utc::now()).unwrap();
        let progress = status.route_progress.unwrap();
        assert_eq!(progress.fraction_traveled, 1.0);
        assert_eq!(status.enhanced_location.position, route.waypoints[1]);
    }
}
