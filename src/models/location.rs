// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coordinates and cached location fixes.

use geo::Point;
use serde::{Deserialize, Deserializer, Serialize};

/// A latitude/longitude pair in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// As a geo point (x = longitude, y = latitude).
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Wire shapes the backend uses for a position.
#[derive(Deserialize)]
#[serde(untagged)]
enum CoordinatesRepr {
    Named {
        latitude: f64,
        longitude: f64,
    },
    Short {
        lat: f64,
        #[serde(alias = "lon")]
        lng: f64,
    },
    /// GeoJSON point: `{"type": "Point", "coordinates": [lon, lat]}`
    GeoJson {
        coordinates: [f64; 2],
    },
}

impl<'de> Deserialize<'de> for Coordinates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match CoordinatesRepr::deserialize(deserializer)? {
            CoordinatesRepr::Named {
                latitude,
                longitude,
            } => Coordinates::new(latitude, longitude),
            CoordinatesRepr::Short { lat, lng } => Coordinates::new(lat, lng),
            CoordinatesRepr::GeoJson {
                coordinates: [lon, lat],
            } => Coordinates::new(lat, lon),
        })
    }
}

/// A captured platform location reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at_epoch_ms: i64,
    pub permission_granted: bool,
}

impl LocationFix {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A recorded grant/deny decision, persisted so later sessions do not
/// re-prompt right away.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    pub granted: bool,
    pub decided_at_epoch_ms: i64,
}
