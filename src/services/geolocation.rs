// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geolocation cache and permission state machine.
//!
//! Keeps the last fix in the device store so that screens reopened within the
//! TTL never touch the platform location service. States move
//! `NoPermission -> PermissionRequested -> PermissionGranted -> LocationFresh
//! -> LocationStale`, and back to `PermissionGranted` on re-acquisition.

use crate::config::Config;
use crate::db::{keys, DeviceStore};
use crate::models::{Coordinates, LocationFix, PermissionRecord};
use crate::time_utils::{age_of, now_epoch_ms};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// Platform error codes reported by `current_position`.
pub mod codes {
    pub const PERMISSION_DENIED: i32 = 1;
    pub const POSITION_UNAVAILABLE: i32 = 2;
    pub const TIMEOUT: i32 = 3;
    pub const PLAY_SERVICE_NOT_AVAILABLE: i32 = 4;
    pub const SETTINGS_NOT_SATISFIED: i32 = 5;
    pub const INTERNAL_ERROR: i32 = -1;
}

/// Outcome of the platform permission dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionResult {
    Granted,
    Denied,
    /// "Ask me later" or any other non-answer
    AskLater,
}

/// Options passed to the platform location read.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest platform-cached position the platform may hand back
    pub maximum_age: Duration,
    /// Minimum movement in meters between updates
    pub distance_filter: f64,
}

/// Error reported by the platform location service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("location error {code}: {message}")]
pub struct PositionError {
    pub code: i32,
    pub message: String,
}

/// Platform geolocation service.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Show the permission dialog.
    async fn request_permission(&self) -> PermissionResult;

    /// Read the current position once.
    async fn current_position(&self, options: &PositionOptions)
        -> Result<Coordinates, PositionError>;
}

/// Why no location could be obtained. Display strings are user-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location access is required to find gyms near you.")]
    PermissionRequired,

    #[error("Location skipped. Enable location to see gyms near you.")]
    Skipped,

    #[error("Location permission denied. Enable it in settings to see nearby gyms.")]
    PermissionDenied,

    #[error("Your location is currently unavailable. Please try again.")]
    Unavailable,

    #[error("Getting your location timed out. Please try again.")]
    Timeout,

    #[error("Location services are not available on this device.")]
    ServiceUnavailable,

    #[error("Unable to get your location: {0}")]
    Other(String),
}

impl From<PositionError> for LocationError {
    fn from(err: PositionError) -> Self {
        match err.code {
            codes::PERMISSION_DENIED => LocationError::PermissionDenied,
            codes::POSITION_UNAVAILABLE => LocationError::Unavailable,
            codes::TIMEOUT => LocationError::Timeout,
            codes::PLAY_SERVICE_NOT_AVAILABLE | codes::SETTINGS_NOT_SATISFIED => {
                LocationError::ServiceUnavailable
            }
            _ => LocationError::Other(err.message),
        }
    }
}

/// Where the cache stands.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationState {
    NoPermission,
    PermissionRequested,
    PermissionGranted,
    LocationFresh(LocationFix),
    LocationStale(LocationFix),
}

/// Persisted last-known-location cache.
pub struct GeolocationCache {
    provider: Arc<dyn LocationProvider>,
    store: DeviceStore,
    ttl: chrono::Duration,
    timeout: Duration,
    state: watch::Sender<LocationState>,
    restored: AtomicBool,
    /// Held for the duration of a platform read.
    read_lock: Mutex<()>,
}

impl GeolocationCache {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        store: DeviceStore,
        ttl: chrono::Duration,
        timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(LocationState::NoPermission);
        Self {
            provider,
            store,
            ttl,
            timeout,
            state,
            restored: AtomicBool::new(false),
            read_lock: Mutex::new(()),
        }
    }

    pub fn from_config(
        config: &Config,
        provider: Arc<dyn LocationProvider>,
        store: DeviceStore,
    ) -> Self {
        Self::new(
            provider,
            store,
            chrono::Duration::minutes(config.location_ttl_minutes),
            Duration::from_secs(config.location_timeout_secs),
        )
    }

    pub fn state(&self) -> LocationState {
        self.state.borrow().clone()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LocationState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: LocationState) {
        let prev = self.state.send_replace(next.clone());
        if std::mem::discriminant(&prev) != std::mem::discriminant(&next) {
            tracing::info!(from = state_name(&prev), to = state_name(&next), "Location state changed");
        }
    }

    /// Re-evaluate the persisted fix (app start or focus).
    ///
    /// A fix younger than the TTL is reused without any platform call. An
    /// older one is discarded and the state falls back to what the last
    /// permission decision allows.
    pub async fn restore(&self) -> LocationState {
        self.restored.store(true, Ordering::SeqCst);

        if let Some(fix) = self.store.get::<LocationFix>(keys::LOCATION_FIX) {
            let age = age_of(fix.captured_at_epoch_ms, Utc::now());
            if self.within_ttl(age) {
                tracing::debug!(age_secs = age.num_seconds(), "Reusing persisted location fix");
                self.set_state(LocationState::LocationFresh(fix));
                return self.state();
            }

            tracing::info!(age_mins = age.num_minutes(), "Persisted location fix is stale, discarding");
            self.set_state(LocationState::LocationStale(fix));
            if let Err(e) = self.store.remove(keys::LOCATION_FIX).await {
                tracing::warn!(error = %e, "Failed to discard stale location fix");
            }
        }

        let next = if self.permission_granted() {
            LocationState::PermissionGranted
        } else {
            LocationState::NoPermission
        };
        self.set_state(next);
        self.state()
    }

    /// The current fix if it is still within the TTL.
    pub fn current_fix(&self) -> Option<LocationFix> {
        match self.state() {
            LocationState::LocationFresh(fix)
                if self.within_ttl(age_of(fix.captured_at_epoch_ms, Utc::now())) =>
            {
                Some(fix)
            }
            _ => None,
        }
    }

    /// Get a location without user interaction beyond a first-time prompt.
    ///
    /// Fresh fix: returned as-is. Permission granted: acquire. Never asked:
    /// prompt. Previously denied: `PermissionRequired` with no prompt.
    pub async fn locate(&self) -> Result<Coordinates, LocationError> {
        if !self.restored.load(Ordering::SeqCst) {
            self.restore().await;
        }

        if let Some(fix) = self.current_fix() {
            return Ok(fix.coordinates());
        }

        match self.state() {
            LocationState::PermissionGranted
            | LocationState::LocationFresh(_)
            | LocationState::LocationStale(_) => self.acquire().await,
            LocationState::PermissionRequested => Err(LocationError::PermissionRequired),
            LocationState::NoPermission => match self.permission_record() {
                Some(record) if !record.granted => Err(LocationError::PermissionRequired),
                Some(_) => self.acquire().await,
                None => self.enable_location().await,
            },
        }
    }

    /// Explicit user request to turn location on: prompt, then acquire.
    pub async fn enable_location(&self) -> Result<Coordinates, LocationError> {
        self.set_state(LocationState::PermissionRequested);
        let answer = self.provider.request_permission().await;
        let granted = answer == PermissionResult::Granted;
        self.record_permission(granted).await;

        if !granted {
            tracing::info!(answer = ?answer, "Location permission not granted");
            self.set_state(LocationState::NoPermission);
            return Err(LocationError::PermissionDenied);
        }

        self.set_state(LocationState::PermissionGranted);
        self.acquire().await
    }

    /// The user chose to skip location.
    pub fn skip(&self) -> LocationError {
        self.set_state(LocationState::NoPermission);
        LocationError::Skipped
    }

    /// Read the platform position now, bounded by the configured timeout.
    ///
    /// Callers that queue behind an in-flight read get that read's fix.
    /// Failure or timeout downgrades permission to not-granted.
    pub async fn acquire(&self) -> Result<Coordinates, LocationError> {
        let requested_at = now_epoch_ms();
        let _guard = self.read_lock.lock().await;

        if let LocationState::LocationFresh(fix) = self.state() {
            if fix.captured_at_epoch_ms >= requested_at {
                return Ok(fix.coordinates());
            }
        }

        let options = PositionOptions {
            enable_high_accuracy: true,
            timeout: self.timeout,
            maximum_age: Duration::from_secs(10),
            distance_filter: 0.0,
        };

        let outcome = tokio::time::timeout(self.timeout, self.provider.current_position(&options))
            .await
            .map_err(|_| LocationError::Timeout)
            .and_then(|read| read.map_err(LocationError::from));

        match outcome {
            Ok(coordinates) => {
                let fix = LocationFix {
                    latitude: coordinates.latitude,
                    longitude: coordinates.longitude,
                    captured_at_epoch_ms: now_epoch_ms(),
                    permission_granted: true,
                };
                if let Err(e) = self.store.put(keys::LOCATION_FIX, &fix).await {
                    tracing::warn!(error = %e, "Failed to persist location fix");
                }
                self.set_state(LocationState::LocationFresh(fix));
                Ok(coordinates)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Location read failed, downgrading permission");
                self.record_permission(false).await;
                self.set_state(LocationState::NoPermission);
                Err(err)
            }
        }
    }

    /// A negative age means the clock moved back since the fix was taken;
    /// such a fix cannot be trusted.
    fn within_ttl(&self, age: chrono::Duration) -> bool {
        age >= chrono::Duration::zero() && age < self.ttl
    }

    fn permission_record(&self) -> Option<PermissionRecord> {
        self.store.get(keys::LOCATION_PERMISSION)
    }

    fn permission_granted(&self) -> bool {
        match self.permission_record() {
            Some(record) => record.granted,
            None => self
                .store
                .get::<LocationFix>(keys::LOCATION_FIX)
                .is_some_and(|fix| fix.permission_granted),
        }
    }

    async fn record_permission(&self, granted: bool) {
        let record = PermissionRecord {
            granted,
            decided_at_epoch_ms: now_epoch_ms(),
        };
        if let Err(e) = self.store.put(keys::LOCATION_PERMISSION, &record).await {
            tracing::warn!(error = %e, "Failed to persist location permission");
        }
    }
}

fn state_name(state: &LocationState) -> &'static str {
    match state {
        LocationState::NoPermission => "no_permission",
        LocationState::PermissionRequested => "permission_requested",
        LocationState::PermissionGranted => "permission_granted",
        LocationState::LocationFresh(_) => "location_fresh",
        LocationState::LocationStale(_) => "location_stale",
    }
}

/// Provider with a fixed position, for desktop runs and simulators.
/// With no position configured, permission is denied.
pub struct FixedLocationProvider {
    position: Option<Coordinates>,
}

impl FixedLocationProvider {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn request_permission(&self) -> PermissionResult {
        match self.position {
            Some(_) => PermissionResult::Granted,
            None => PermissionResult::Denied,
        }
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        self.position.ok_or_else(|| PositionError {
            code: codes::POSITION_UNAVAILABLE,
            message: "No fixed position configured".to_string(),
        })
    }
}
