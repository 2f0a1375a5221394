// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym discovery feed.
//!
//! Paged listing of gyms around the current fix. Pages are appended within
//! one location session and the list resets whenever the origin, radius or
//! query changes. No gym request is made without a location.

use crate::config::Config;
use crate::models::{Coordinates, GymListing, Gyms};
use crate::scope::ScreenScope;
use crate::services::geolocation::GeolocationCache;
use crate::services::map::{markers_geojson, MapRegion};
use crate::services::resource::{PageQuery, ResourceService};
use geojson::FeatureCollection;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// What the feed is doing.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedStatus {
    Idle,
    Loading,
    Ready,
    /// No usable location; the screen offers "Enable Location".
    LocationRequired { message: String },
    /// The last fetch failed; the screen offers "Retry".
    Error { message: String },
}

/// Action offered on the empty screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyAction {
    EnableLocation,
    Retry,
}

/// What to render when there are no listings.
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyState {
    pub title: String,
    pub message: String,
    pub action: Option<EmptyAction>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Filters {
    radius_km: f64,
    search: Option<String>,
    sort: Option<String>,
    filter: Option<String>,
}

struct FeedState {
    listings: Vec<GymListing>,
    /// Last page loaded (0 = none)
    page: u32,
    has_more: bool,
    status: FeedStatus,
    /// Origin the current listings were computed from
    origin: Option<Coordinates>,
    filters: Filters,
    /// Filters the current listings were loaded with
    loaded_filters: Option<Filters>,
}

impl FeedState {
    fn reset(&mut self) {
        self.listings.clear();
        self.page = 0;
        self.has_more = false;
        self.loaded_filters = None;
    }
}

struct FeedInner {
    service: ResourceService<Gyms>,
    location: Arc<GeolocationCache>,
    state: Mutex<FeedState>,
    /// One page fetch in flight at a time.
    fetch_lock: Mutex<()>,
    scope: ScreenScope,
    page_size: u32,
    grace: Duration,
}

/// Gym list screen state.
pub struct GymFeed {
    inner: Arc<FeedInner>,
}

impl GymFeed {
    pub fn new(
        service: ResourceService<Gyms>,
        location: Arc<GeolocationCache>,
        config: &Config,
    ) -> Self {
        let state = FeedState {
            listings: Vec::new(),
            page: 0,
            has_more: false,
            status: FeedStatus::Idle,
            origin: None,
            filters: Filters {
                radius_km: config.gym_radius_km,
                ..Default::default()
            },
            loaded_filters: None,
        };

        Self {
            inner: Arc::new(FeedInner {
                service,
                location,
                state: Mutex::new(state),
                fetch_lock: Mutex::new(()),
                scope: ScreenScope::new(),
                page_size: config.gym_page_size.max(1),
                grace: Duration::from_secs(config.empty_list_grace_secs),
            }),
        }
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.inner.scope
    }

    /// Locate, then load page 1 (resetting if the origin or filters moved).
    pub async fn refresh(&self) -> FeedStatus {
        self.inner.refresh().await
    }

    /// Append the next page. A no-op when there is nothing more, no origin
    /// yet, or another fetch is running.
    pub async fn load_more(&self) -> FeedStatus {
        self.inner.load_more().await
    }

    /// Explicit "Enable Location": prompt, then refresh.
    pub async fn enable_location(&self) -> FeedStatus {
        let inner = &self.inner;
        let Some(located) = inner.scope.run(inner.location.enable_location()).await else {
            return self.status().await;
        };
        match located {
            Ok(_) => inner.refresh().await,
            Err(e) => {
                inner
                    .set_status(FeedStatus::LocationRequired {
                        message: e.to_string(),
                    })
                    .await
            }
        }
    }

    pub async fn set_radius(&self, radius_km: f64) -> FeedStatus {
        self.update_filters(|f| f.radius_km = radius_km).await
    }

    pub async fn set_search(&self, search: impl Into<String>) -> FeedStatus {
        let search = search.into();
        self.update_filters(|f| f.search = Some(search).filter(|s| !s.trim().is_empty()))
            .await
    }

    pub async fn set_sort(&self, sort: impl Into<String>) -> FeedStatus {
        let sort = sort.into();
        self.update_filters(|f| f.sort = Some(sort).filter(|s| !s.trim().is_empty()))
            .await
    }

    pub async fn set_filter(&self, filter: impl Into<String>) -> FeedStatus {
        let filter = filter.into();
        self.update_filters(|f| f.filter = Some(filter).filter(|s| !s.trim().is_empty()))
            .await
    }

    async fn update_filters(&self, change: impl FnOnce(&mut Filters)) -> FeedStatus {
        {
            let mut state = self.inner.state.lock().await;
            let before = state.filters.clone();
            change(&mut state.filters);
            if state.filters != before {
                tracing::debug!(filters = ?state.filters, "Gym filters changed, resetting");
                state.reset();
            }
        }
        self.inner.refresh().await
    }

    /// After the grace period, if the list is still empty with no error on
    /// screen and no fix in hand, locate again and refresh.
    ///
    /// The task yields `None` when it decided (or was cancelled) not to act.
    pub fn schedule_grace_acquire(&self) -> JoinHandle<Option<FeedStatus>> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.scope.run(tokio::time::sleep(inner.grace)).await?;

            let idle_and_empty = {
                let state = inner.state.lock().await;
                state.listings.is_empty()
                    && matches!(state.status, FeedStatus::Idle | FeedStatus::Ready)
            };
            if !idle_and_empty || inner.location.current_fix().is_some() {
                return None;
            }

            tracing::info!("Gym list still empty after grace period, re-acquiring location");
            Some(inner.refresh().await)
        })
    }

    pub async fn status(&self) -> FeedStatus {
        self.inner.state.lock().await.status.clone()
    }

    pub async fn listings(&self) -> Vec<GymListing> {
        self.inner.state.lock().await.listings.clone()
    }

    pub async fn has_more_gyms(&self) -> bool {
        self.inner.state.lock().await.has_more
    }

    pub async fn radius_km(&self) -> f64 {
        self.inner.state.lock().await.filters.radius_km
    }

    /// What to show instead of the list, or `None` when there are listings.
    pub async fn empty_state(&self) -> Option<EmptyState> {
        let state = self.inner.state.lock().await;
        if !state.listings.is_empty() {
            return None;
        }

        Some(match &state.status {
            FeedStatus::LocationRequired { message } => EmptyState {
                title: "Location required".to_string(),
                message: message.clone(),
                action: Some(EmptyAction::EnableLocation),
            },
            FeedStatus::Error { message } => EmptyState {
                title: "Couldn't load gyms".to_string(),
                message: message.clone(),
                action: Some(EmptyAction::Retry),
            },
            FeedStatus::Ready => EmptyState {
                title: "No gyms nearby".to_string(),
                message: format!(
                    "No gyms found within {} km. Try a larger radius.",
                    state.filters.radius_km
                ),
                action: Some(EmptyAction::Retry),
            },
            FeedStatus::Idle | FeedStatus::Loading => EmptyState {
                title: "Finding gyms near you".to_string(),
                message: "Hang tight while we look around.".to_string(),
                action: None,
            },
        })
    }

    /// Region fitted to the listings and the origin.
    pub async fn map_region(&self) -> Option<MapRegion> {
        let state = self.inner.state.lock().await;
        let origin = state.origin?;
        if state.listings.is_empty() {
            return Some(MapRegion::around(origin, state.filters.radius_km));
        }
        let points: Vec<Coordinates> = std::iter::once(origin)
            .chain(state.listings.iter().map(|l| l.gym.coordinates))
            .collect();
        MapRegion::fit(&points)
    }

    pub async fn markers(&self) -> FeatureCollection {
        markers_geojson(&self.inner.state.lock().await.listings)
    }
}

impl Drop for GymFeed {
    fn drop(&mut self) {
        self.inner.scope.cancel();
    }
}

impl FeedInner {
    async fn set_status(&self, status: FeedStatus) -> FeedStatus {
        self.state.lock().await.status = status.clone();
        status
    }

    async fn refresh(&self) -> FeedStatus {
        let _fetch = self.fetch_lock.lock().await;

        let Some(located) = self.scope.run(self.location.locate()).await else {
            return FeedStatus::Idle;
        };
        let origin = match located {
            Ok(origin) => origin,
            Err(e) => {
                tracing::info!(error = %e, "No location, not fetching gyms");
                return self
                    .set_status(FeedStatus::LocationRequired {
                        message: e.to_string(),
                    })
                    .await;
            }
        };

        let query = {
            let mut state = self.state.lock().await;
            let moved = state.origin != Some(origin);
            let refiltered = state.loaded_filters.as_ref() != Some(&state.filters);
            if moved || refiltered {
                state.reset();
            }
            state.origin = Some(origin);
            state.status = FeedStatus::Loading;
            self.query_for(1, origin, &state.filters)
        };

        self.fetch_page(query, true).await
    }

    async fn load_more(&self) -> FeedStatus {
        let Ok(_fetch) = self.fetch_lock.try_lock() else {
            tracing::debug!("Gym fetch already in flight, ignoring load more");
            return self.state.lock().await.status.clone();
        };

        let query = {
            let mut state = self.state.lock().await;
            let Some(origin) = state.origin else {
                return state.status.clone();
            };
            if !state.has_more || state.page == 0 {
                return state.status.clone();
            }
            state.status = FeedStatus::Loading;
            self.query_for(state.page + 1, origin, &state.filters)
        };

        self.fetch_page(query, false).await
    }

    fn query_for(&self, page: u32, origin: Coordinates, filters: &Filters) -> (PageQuery, Filters) {
        let mut query = PageQuery::new(page, self.page_size);
        query.sort = filters.sort.clone();
        query.filter = filters.filter.clone();
        query.search = filters.search.clone();
        query.extra = vec![
            ("radius".to_string(), filters.radius_km.to_string()),
            ("lat".to_string(), origin.latitude.to_string()),
            ("lon".to_string(), origin.longitude.to_string()),
        ];
        (query, filters.clone())
    }

    async fn fetch_page(&self, (query, filters): (PageQuery, Filters), first: bool) -> FeedStatus {
        let Some(result) = self.scope.run(self.service.list_paged(&query)).await else {
            return FeedStatus::Idle;
        };

        let mut state = self.state.lock().await;
        if self.scope.is_cancelled() {
            return state.status.clone();
        }

        let page = match result.data {
            Some(page) if result.success => page,
            _ => {
                tracing::warn!(page = query.page, error = %result.message, "Gym fetch failed");
                state.status = FeedStatus::Error {
                    message: result.message,
                };
                return state.status.clone();
            }
        };

        let Some(origin) = state.origin else {
            return state.status.clone();
        };

        if first {
            state.listings.clear();
        }
        let mut seen: HashSet<String> = state
            .listings
            .iter()
            .filter_map(|l| l.gym.id.clone())
            .collect();
        let fetched = page.items.len();
        for gym in page.items {
            if let Some(id) = &gym.id {
                if !seen.insert(id.clone()) {
                    continue;
                }
            }
            state.listings.push(GymListing::from_gym(gym, origin));
        }

        state.page = query.page;
        state.has_more = page.has_more;
        state.loaded_filters = Some(filters);
        state.status = FeedStatus::Ready;
        tracing::debug!(
            page = query.page,
            fetched,
            total = state.listings.len(),
            has_more = state.has_more,
            "Gym page loaded"
        );
        state.status.clone()
    }
}
