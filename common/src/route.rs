// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::position::{Position, distance_between};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Represents the active route plan of a trip.
///
/// A `Route` is set externally and handed to the navigation engine; the
/// session itself never computes or modifies route geometry. There is exactly
/// one current route per session with last-write-wins semantics and no
/// history.
///
/// # Fields
///
/// - `name` – Human readable identifier of the route.
/// - `waypoints` – The route geometry as an ordered list of coordinates.
/// - `distance` – The total route length in meters.
/// - `duration` – The expected travel time for the whole route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub waypoints: Vec<Position>,
    pub distance: f64,
    pub duration: Duration,
}

impl Route {
    /// Creates a new [`Route`] from a name and waypoint list.
    ///
    /// The total distance is accumulated over the waypoint legs; the expected
    /// duration is derived from the distance and the given average speed in
    /// meters per second.
    pub fn new(name: &str, waypoints: Vec<Position>, average_speed: f64) -> Self {
        let distance = waypoints
            .windows(2)
            .map(|leg| distance_between(&leg[0], &leg[1]))
            .sum::<f64>();
        let duration = if average_speed > 0.0 {
            Duration::from_secs_f64(distance / average_speed)
        } else {
            Duration::default()
        };
        Route {
            name: name.to_owned(),
            waypoints,
            distance,
            duration,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Represents engine-computed advancement metrics along the active route.
///
/// A `RouteProgress` is produced only by the navigation engine status poll;
/// the session stores and redistributes it unchanged.
///
/// # Fields
///
/// - `distance_traveled` – Covered distance along the route in meters.
/// - `distance_remaining` – Remaining distance along the route in meters.
/// - `fraction_traveled` – Covered share of the route in the range `0.0..=1.0`.
/// - `duration_remaining` – Expected remaining travel time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteProgress {
    pub distance_traveled: f64,
    pub distance_remaining: f64,
    pub fraction_traveled: f64,
    pub duration_remaining: Duration,
}

impl RouteProgress {
    /// Derives a [`RouteProgress`] from the traveled distance and the route.
    ///
    /// The traveled distance is clamped to the route length, so overshooting
    /// the final waypoint reports a completed route instead of a fraction
    /// above `1.0`.
    pub fn along(route: &Route, distance_traveled: f64) -> Self {
        let distance_traveled = distance_traveled.clamp(0.0, route.distance);
        let distance_remaining = route.distance - distance_traveled;
        let fraction_traveled = if route.distance > 0.0 {
            distance_traveled / route.distance
        } else {
            1.0
        };
        RouteProgress {
            distance_traveled,
            distance_remaining,
            fraction_traveled,
            duration_remaining: route.duration.mul_f64(1.0 - fraction_traveled),
        }
    }
}
