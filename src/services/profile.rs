// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile fetch with a cached fallback.

use crate::db::{keys, DeviceStore};
use crate::error::AppError;
use crate::models::{ApiResult, UserProfile};
use crate::services::gateway::{ApiRequest, AuthGateway};
use crate::services::resource::{unwrap_envelope, UNREADABLE_RESPONSE_MESSAGE};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const PROFILE_PATH: &str = "/users/auth0/profile";

#[derive(Clone)]
pub struct ProfileService {
    gateway: AuthGateway,
    store: DeviceStore,
    cached: Arc<RwLock<Option<UserProfile>>>,
}

impl ProfileService {
    pub fn new(gateway: AuthGateway, store: DeviceStore) -> Self {
        let snapshot = store.get::<UserProfile>(keys::PROFILE_SNAPSHOT);
        Self {
            gateway,
            store,
            cached: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Fetch the profile. On failure the last known profile (if any) comes
    /// back as data with `success = false`.
    pub async fn fetch(&self) -> ApiResult<UserProfile> {
        let outcome = self.fetch_inner().await;
        if let Ok((profile, _)) = &outcome {
            *self.cached.write().await = Some(profile.clone());
            if let Err(e) = self.store.put(keys::PROFILE_SNAPSHOT, profile).await {
                tracing::warn!(error = %e, "Failed to persist profile snapshot");
            }
        }

        let mut result = ApiResult::from(outcome);
        if !result.success {
            result.data = self.cached.read().await.clone();
            tracing::warn!(
                error = %result.message,
                has_cached = result.data.is_some(),
                "Profile fetch failed"
            );
        }
        result
    }

    async fn fetch_inner(&self) -> Result<(UserProfile, String), AppError> {
        let body = self.gateway.execute(&ApiRequest::get(PROFILE_PATH)).await?;
        let (data, message) = unwrap_envelope(body)?;

        // Some deployments nest the profile under `user`.
        let data = match data {
            Some(serde_json::Value::Object(mut obj)) if obj.contains_key("user") => {
                obj.remove("user")
            }
            other => other,
        };
        let data = data.ok_or_else(|| AppError::Transport(UNREADABLE_RESPONSE_MESSAGE.to_string()))?;
        let profile = serde_json::from_value(data).map_err(|e| {
            tracing::warn!(error = %e, "Undecodable profile");
            AppError::Transport(UNREADABLE_RESPONSE_MESSAGE.to_string())
        })?;
        Ok((profile, message))
    }

    /// Last known profile, without I/O.
    pub async fn cached(&self) -> Option<UserProfile> {
        self.cached.read().await.clone()
    }

    /// Forget the cached profile (logout).
    pub async fn clear(&self) {
        *self.cached.write().await = None;
        if let Err(e) = self.store.remove(keys::PROFILE_SNAPSHOT).await {
            tracing::warn!(error = %e, "Failed to drop profile snapshot");
        }
    }
}
