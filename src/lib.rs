// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! FitClub client: the fetch / optimistic-fallback / cache layer of the
//! FitClub member app.
//!
//! This crate provides authenticated access to the FitClub backend, diet and
//! workout logging that never loses the user's input, and gym discovery
//! around a cached location fix.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod scope;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DeviceStore;
use error::AppError;
use models::{DietLogs, Gyms, SessionCredential, WorkoutSessions};
use services::{
    AuthGateway, AuthorizeRequest, GeolocationCache, GymFeed, IdentityProvider, LocationProvider,
    LogBook, ProfileService, ResourceService, Session,
};
use std::sync::Arc;

/// Everything a running client shares, built once at startup.
#[derive(Clone)]
pub struct FitClub {
    pub config: Config,
    pub session: Session,
    pub gateway: AuthGateway,
    pub store: DeviceStore,
    pub location: Arc<GeolocationCache>,
    pub profile: ProfileService,
}

impl FitClub {
    pub fn new(
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        location_provider: Arc<dyn LocationProvider>,
        store: DeviceStore,
    ) -> Result<Self, AppError> {
        let authorize = AuthorizeRequest {
            scopes: config.auth0_scopes.clone(),
            audience: config.auth0_audience.clone(),
            redirect_uri: config.auth0_redirect_uri.clone(),
        };
        let session = Session::new(identity, store.clone(), authorize);
        let gateway = AuthGateway::new(&config, session.clone())?;
        let location = Arc::new(GeolocationCache::from_config(
            &config,
            location_provider,
            store.clone(),
        ));
        let profile = ProfileService::new(gateway.clone(), store.clone());

        Ok(Self {
            config,
            session,
            gateway,
            store,
            location,
            profile,
        })
    }

    /// A fresh diet log screen.
    pub fn diet_log(&self) -> LogBook<DietLogs> {
        LogBook::new(
            ResourceService::new(self.gateway.clone()),
            self.config.delete_policy,
        )
    }

    /// A fresh workout log screen.
    pub fn workout_log(&self) -> LogBook<WorkoutSessions> {
        LogBook::new(
            ResourceService::new(self.gateway.clone()),
            self.config.delete_policy,
        )
    }

    /// A fresh gym list screen.
    pub fn gym_feed(&self) -> GymFeed {
        GymFeed::new(
            ResourceService::new(self.gateway.clone()),
            self.location.clone(),
            &self.config,
        )
    }

    pub fn profile(&self) -> &ProfileService {
        &self.profile
    }

    pub async fn login(&self) -> Result<SessionCredential, AppError> {
        self.session.login().await
    }

    /// Log out and forget per-user cached data.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.session.logout().await?;
        self.profile.clear().await;
        Ok(())
    }
}
