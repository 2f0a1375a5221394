// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym records and distance-annotated listings.

use crate::error::AppError;
use crate::models::entry::Identified;
use crate::models::location::Coordinates;
use crate::models::normalize::{coerce_number, non_empty};
use crate::services::resource::Resource;
use geo::{Distance, Haversine};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Membership pricing advertised by a gym.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GymPricing {
    #[serde(default)]
    pub monthly: Option<f64>,
    #[serde(default)]
    pub day_pass: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// A gym as returned by the discovery endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gym {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(alias = "location")]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub pricing: Option<GymPricing>,
}

impl Identified for Gym {
    fn server_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// A gym plus its distance from the current fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GymListing {
    #[serde(flatten)]
    pub gym: Gym,
    pub distance_km: f64,
}

impl GymListing {
    /// Annotate a gym with its great-circle distance from `origin`.
    pub fn from_gym(gym: Gym, origin: Coordinates) -> Self {
        let meters = Haversine.distance(origin.to_point(), gym.coordinates.to_point());
        // One decimal is all the list shows.
        let distance_km = (meters / 100.0).round() / 10.0;
        Self { gym, distance_km }
    }
}

/// "Suggest a gym" form input.
#[derive(Debug, Clone, Default)]
pub struct GymInput {
    pub name: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
}

/// Normalized create/update body for `/gyms`.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GymPayload {
    #[validate(length(min = 1, message = "Gym name is required"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,
}

/// Gym resource family.
pub struct Gyms;

impl Resource for Gyms {
    type Entry = Gym;
    type Input = GymInput;
    type Payload = GymPayload;

    const NAME: &'static str = "gym";
    const PATH: &'static str = "/gyms";
    const LIST_KEY: Option<&'static str> = Some("gyms");

    fn normalize(input: GymInput) -> Result<GymPayload, AppError> {
        let payload = GymPayload {
            name: input.name.trim().to_string(),
            address: non_empty(Some(input.address)),
            latitude: coerce_number(&input.latitude),
            longitude: coerce_number(&input.longitude),
        };
        payload.validate()?;
        Ok(payload)
    }

    fn draft(payload: &GymPayload) -> Gym {
        Gym {
            id: None,
            name: payload.name.clone(),
            address: payload.address.clone().unwrap_or_default(),
            coordinates: Coordinates::new(payload.latitude, payload.longitude),
            rating: None,
            pricing: None,
        }
    }

    fn payload_of(entry: &Gym) -> GymPayload {
        GymPayload {
            name: entry.name.clone(),
            address: non_empty(Some(entry.address.clone())),
            latitude: entry.coordinates.latitude,
            longitude: entry.coordinates.longitude,
        }
    }
}
