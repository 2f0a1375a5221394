// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - client logic layer.

pub mod gateway;
pub mod geolocation;
pub mod gym;
pub mod identity;
pub mod logbook;
pub mod map;
pub mod profile;
pub mod reconciler;
pub mod resource;
pub mod session;

pub use gateway::{ApiRequest, AuthGateway};
pub use geolocation::{
    FixedLocationProvider, GeolocationCache, LocationError, LocationProvider, LocationState,
    PermissionResult, PositionError, PositionOptions,
};
pub use gym::{EmptyAction, EmptyState, FeedStatus, GymFeed};
pub use identity::{Auth0CredentialsManager, AuthorizeRequest, IdentityProvider};
pub use logbook::{LogBook, PendingSync};
pub use map::MapRegion;
pub use profile::ProfileService;
pub use reconciler::Reconciler;
pub use resource::{Page, PageQuery, Resource, ResourceService};
pub use session::{CredentialSource, Session};
