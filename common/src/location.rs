// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::position::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a raw position fix as reported by a location provider.
///
/// A `RawLocation` is an immutable snapshot of what the provider measured:
/// no filtering, fusion or map-matching has been applied to it. Every field
/// except the coordinate and the timestamp is optional since providers differ
/// in what they can measure.
///
/// # Fields
///
/// - `position` – The measured coordinate.
/// - `altitude` – Altitude above the WGS84 ellipsoid in meters, if known.
/// - `speed` – Ground speed in meters per second, if known.
/// - `bearing` – Direction of travel in degrees clockwise from north, if known.
/// - `horizontal_accuracy` – Estimated horizontal accuracy radius in meters, if known.
/// - `time` – UTC timestamp of the fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLocation {
    pub position: Position,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub bearing: Option<f64>,
    pub horizontal_accuracy: Option<f64>,
    pub time: DateTime<Utc>,
}

impl RawLocation {
    /// Creates a new [`RawLocation`] carrying only a coordinate and timestamp.
    ///
    /// All optional measurements are unset.
    pub fn new(position: Position, time: DateTime<Utc>) -> Self {
        RawLocation {
            position,
            altitude: None,
            speed: None,
            bearing: None,
            horizontal_accuracy: None,
            time,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Represents an engine-fused, map-matched position.
///
/// An `EnhancedLocation` is produced by the navigation engine from raw fixes
/// and the active route. Unlike [`RawLocation`], its coordinate is expected to
/// lie on the route geometry when a route is active.
///
/// # Fields
///
/// - `position` – The map-matched coordinate.
/// - `bearing` – Direction of travel in degrees clockwise from north, if known.
/// - `speed` – Ground speed in meters per second, if known.
/// - `time` – UTC timestamp the engine associated with this snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedLocation {
    pub position: Position,
    pub bearing: Option<f64>,
    pub speed: Option<f64>,
    pub time: DateTime<Utc>,
}

impl EnhancedLocation {
    /// Creates a new [`EnhancedLocation`] with the given coordinate and timestamp.
    pub fn new(position: Position, time: DateTime<Utc>) -> Self {
        EnhancedLocation {
            position,
            bearing: None,
            speed: None,
            time,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
