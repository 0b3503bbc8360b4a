// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate with latitude and longitude.
///
/// The `Position` struct stores a point on Earth in decimal degrees.
/// Latitude values range from -90.0 to 90.0, and longitude values range
/// from -180.0 to 180.0.
///
/// # Fields
///
/// - `latitude` – The latitude in decimal degrees (positive for north, negative for south).
/// - `longitude` – The longitude in decimal degrees (positive for east, negative for west).
///
/// # Example
///
/// ```rust
/// use common::position::Position;
///
/// let pos = Position {
///     latitude: 52.5200,
///     longitude: 13.4050,
/// };
///
/// println!("{:?}", pos);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    /// Creates a new [`Position`] with the given latitude and longitude.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Position {
            latitude,
            longitude,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Calculates the approximate distance in meters between two geographic positions.
///
/// Uses a simplified equirectangular approximation that treats the Earth's
/// surface as locally flat, trading accuracy over long distances or near the
/// poles for speed. Latitude and longitude are expected in degrees.
pub fn distance_between(pos1: &Position, pos2: &Position) -> f64 {
    let lat = (pos1.latitude + pos2.latitude) / 2.0 * 0.01745;
    let dx = 111300.0 * lat.cos() * (pos1.longitude - pos2.longitude);
    let dy = 111300.0 * (pos1.latitude - pos2.latitude);
    (dx * dx + dy * dy).sqrt()
}
