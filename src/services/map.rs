// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map region fitting and gym markers for the map surface.

use crate::models::{Coordinates, GymListing};
use geo::{BoundingRect, MultiPoint};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::{Deserialize, Serialize};

/// Kilometers per degree of latitude.
const KM_PER_DEGREE: f64 = 111.32;

/// Extra room around the fitted markers.
const REGION_PADDING: f64 = 1.4;

/// Smallest delta we hand to the map (about 1 km).
const MIN_DELTA: f64 = 0.01;

/// Visible map region in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRegion {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Region centered on `center` showing `radius_km` in every direction.
    pub fn around(center: Coordinates, radius_km: f64) -> Self {
        let latitude_delta = ((radius_km * 2.0) / KM_PER_DEGREE).max(MIN_DELTA);
        let cos_lat = center.latitude.to_radians().cos().abs().max(0.01);
        Self {
            latitude: center.latitude,
            longitude: center.longitude,
            latitude_delta,
            longitude_delta: (latitude_delta / cos_lat).min(360.0),
        }
    }

    /// Smallest padded region containing every point, or `None` for none.
    pub fn fit(points: &[Coordinates]) -> Option<Self> {
        let multi: MultiPoint<f64> = points.iter().map(|c| c.to_point()).collect();
        let rect = multi.bounding_rect()?;
        let center = rect.center();

        Some(Self {
            latitude: center.y,
            longitude: center.x,
            latitude_delta: (rect.height() * REGION_PADDING).max(MIN_DELTA),
            longitude_delta: (rect.width() * REGION_PADDING).max(MIN_DELTA),
        })
    }

    pub fn contains(&self, point: Coordinates) -> bool {
        (point.latitude - self.latitude).abs() <= self.latitude_delta / 2.0
            && (point.longitude - self.longitude).abs() <= self.longitude_delta / 2.0
    }
}

/// Gym markers as a GeoJSON feature collection (one point per listing).
pub fn markers_geojson(listings: &[GymListing]) -> FeatureCollection {
    let features = listings
        .iter()
        .map(|listing| {
            let gym = &listing.gym;
            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), gym.name.clone().into());
            properties.insert("address".to_string(), gym.address.clone().into());
            properties.insert("distanceKm".to_string(), listing.distance_km.into());
            if let Some(rating) = gym.rating {
                properties.insert("rating".to_string(), rating.into());
            }

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::Point(vec![
                    gym.coordinates.longitude,
                    gym.coordinates.latitude,
                ]))),
                id: gym.id.clone().map(geojson::feature::Id::String),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gym;

    #[test]
    fn fit_covers_all_points() {
        let points = [
            Coordinates::new(37.40, -122.10),
            Coordinates::new(37.45, -122.20),
            Coordinates::new(37.42, -122.15),
        ];
        let region = MapRegion::fit(&points).unwrap();

        assert!((region.latitude - 37.425).abs() < 1e-9);
        assert!((region.longitude + 122.15).abs() < 1e-9);
        for p in points {
            assert!(region.contains(p));
        }
    }

    #[test]
    fn fit_single_point_has_min_span() {
        let region = MapRegion::fit(&[Coordinates::new(10.0, 20.0)]).unwrap();
        assert_eq!(region.latitude_delta, MIN_DELTA);
        assert_eq!(region.longitude_delta, MIN_DELTA);
        assert!(MapRegion::fit(&[]).is_none());
    }

    #[test]
    fn around_widens_longitude_away_from_equator() {
        let equator = MapRegion::around(Coordinates::new(0.0, 0.0), 10.0);
        let north = MapRegion::around(Coordinates::new(60.0, 0.0), 10.0);
        assert!((equator.latitude_delta - north.latitude_delta).abs() < 1e-12);
        assert!(north.longitude_delta > equator.longitude_delta * 1.9);
    }

    #[test]
    fn markers_are_lon_lat_points() {
        let gym = Gym {
            id: Some("g1".to_string()),
            name: "Iron Temple".to_string(),
            address: String::new(),
            coordinates: Coordinates::new(52.5, 13.4),
            rating: None,
            pricing: None,
        };
        let listing = GymListing::from_gym(gym, Coordinates::new(52.5, 13.4));
        let collection = markers_geojson(&[listing]);

        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["geometry"]["coordinates"][0], 13.4);
        assert_eq!(json["features"][0]["id"], "g1");
        assert!(json["features"][0]["properties"].get("rating").is_none());
    }
}
