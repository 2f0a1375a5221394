// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym feed tests: location gating, paging, resets and empty states.

mod common;

use common::{create_test_app, home, test_config, ScriptedIdentity, ScriptedLocation};
use fitclub_client::config::Config;
use fitclub_client::services::{EmptyAction, FeedStatus, LocationProvider};
use fitclub_client::FitClub;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_with(config: Config, location: Arc<dyn LocationProvider>) -> FitClub {
    create_test_app(config, ScriptedIdentity::with_token("token-a"), location)
}

/// Gyms `g{from}..g{to}` spread north of home.
fn gyms(from: usize, to: usize) -> serde_json::Value {
    let home = home();
    json!((from..to)
        .map(|i| json!({
            "_id": format!("g{}", i),
            "name": format!("Gym {}", i),
            "address": format!("{} Main St", i),
            "location": {
                "latitude": home.latitude + i as f64 * 0.001,
                "longitude": home.longitude
            },
            "rating": 4.0
        }))
        .collect::<Vec<_>>())
}

async fn mount_page(server: &MockServer, page: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/gyms"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"gyms": body}
        })))
        .mount(server)
        .await;
}

fn ids(listings: &[fitclub_client::models::GymListing]) -> Vec<String> {
    listings
        .iter()
        .map(|l| l.gym.id.clone().unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn test_denied_location_shows_location_required() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/gyms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let app = app_with(test_config(&server), ScriptedLocation::denied());
    let feed = app.gym_feed();

    let status = feed.refresh().await;
    assert!(matches!(status, FeedStatus::LocationRequired { .. }));

    let empty = feed.empty_state().await.unwrap();
    assert_eq!(empty.title, "Location required");
    assert_eq!(empty.action, Some(EmptyAction::EnableLocation));
    assert!(feed.listings().await.is_empty());
}

#[tokio::test]
async fn test_load_more_appends_until_short_page() {
    let server = MockServer::start().await;
    mount_page(&server, "1", gyms(0, 20)).await;
    Mock::given(method("GET"))
        .and(path("/api/gyms"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"gyms": gyms(20, 25)}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_with(test_config(&server), ScriptedLocation::granted(home()));
    let feed = app.gym_feed();

    assert_eq!(feed.refresh().await, FeedStatus::Ready);
    let page_one = feed.listings().await;
    assert_eq!(page_one.len(), 20);
    assert!(feed.has_more_gyms().await);

    assert_eq!(feed.load_more().await, FeedStatus::Ready);
    let both = feed.listings().await;
    assert_eq!(both.len(), 25);
    assert_eq!(ids(&both[..20]), ids(&page_one));
    assert_eq!(both[24].gym.id.as_deref(), Some("g24"));
    assert!(!feed.has_more_gyms().await);

    // Nothing more to fetch; page 2 is not requested again.
    feed.load_more().await;
    assert_eq!(feed.listings().await.len(), 25);
}

#[tokio::test]
async fn test_listings_carry_distance_from_fix() {
    let server = MockServer::start().await;
    mount_page(&server, "1", gyms(0, 3)).await;

    let app = app_with(test_config(&server), ScriptedLocation::granted(home()));
    let feed = app.gym_feed();
    feed.refresh().await;

    let listings = feed.listings().await;
    assert_eq!(listings[0].distance_km, 0.0);
    // 0.002 degrees of latitude is about 0.2 km.
    assert_eq!(listings[2].distance_km, 0.2);

    let requests = server.received_requests().await.unwrap();
    let query: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(query.contains(&("radius".to_string(), "10".to_string())));
    assert!(query.contains(&("lat".to_string(), home().latitude.to_string())));
    assert!(query.contains(&("lon".to_string(), home().longitude.to_string())));
}

#[tokio::test]
async fn test_same_request_twice_is_idempotent() {
    let server = MockServer::start().await;
    mount_page(&server, "1", gyms(0, 7)).await;

    let app = app_with(test_config(&server), ScriptedLocation::granted(home()));
    let feed = app.gym_feed();

    feed.refresh().await;
    let first = feed.listings().await;
    feed.refresh().await;
    let second = feed.listings().await;

    assert_eq!(first, second);
    assert_eq!(first.len(), 7);
}

#[tokio::test]
async fn test_radius_change_resets_and_reloads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/gyms"))
        .and(query_param("radius", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"gyms": gyms(100, 102)}
        })))
        .mount(&server)
        .await;
    mount_page(&server, "1", gyms(0, 20)).await;

    let app = app_with(test_config(&server), ScriptedLocation::granted(home()));
    let feed = app.gym_feed();

    feed.refresh().await;
    assert_eq!(feed.listings().await.len(), 20);

    assert_eq!(feed.set_radius(25.0).await, FeedStatus::Ready);
    assert_eq!(feed.radius_km().await, 25.0);
    let listings = feed.listings().await;
    assert_eq!(ids(&listings), vec!["g100", "g101"]);
    assert!(!feed.has_more_gyms().await);
}

#[tokio::test]
async fn test_fetch_failure_keeps_listings_and_offers_retry() {
    let server = MockServer::start().await;
    mount_page(&server, "1", gyms(0, 4)).await;

    let app = app_with(test_config(&server), ScriptedLocation::granted(home()));
    let feed = app.gym_feed();
    feed.refresh().await;

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/gyms"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "Search is down"})))
        .mount(&server)
        .await;

    let status = feed.refresh().await;
    assert_eq!(
        status,
        FeedStatus::Error {
            message: "Search is down".to_string()
        }
    );
    assert_eq!(feed.listings().await.len(), 4);
    assert!(feed.empty_state().await.is_none());
}

#[tokio::test]
async fn test_failure_with_no_listings_shows_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/gyms"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let app = app_with(test_config(&server), ScriptedLocation::granted(home()));
    let feed = app.gym_feed();
    feed.refresh().await;

    let empty = feed.empty_state().await.unwrap();
    assert_eq!(empty.action, Some(EmptyAction::Retry));
}

#[tokio::test]
async fn test_enable_location_then_loads() {
    let server = MockServer::start().await;
    mount_page(&server, "1", gyms(0, 2)).await;

    let location = ScriptedLocation::granted(home());
    let app = app_with(test_config(&server), location.clone());
    let feed = app.gym_feed();

    assert_eq!(feed.enable_location().await, FeedStatus::Ready);
    assert_eq!(location.permission_calls(), 1);
    assert_eq!(feed.listings().await.len(), 2);
}

#[tokio::test]
async fn test_grace_period_triggers_acquisition() {
    let server = MockServer::start().await;
    mount_page(&server, "1", gyms(0, 3)).await;

    let location = ScriptedLocation::granted(home());
    let mut config = test_config(&server);
    config.empty_list_grace_secs = 1;
    let app = app_with(config, location.clone());
    let feed = app.gym_feed();

    let status = feed.schedule_grace_acquire().await.unwrap();
    assert_eq!(status, Some(FeedStatus::Ready));
    assert_eq!(location.position_calls(), 1);
    assert_eq!(feed.listings().await.len(), 3);

    // Listings present: the grace check does nothing.
    assert_eq!(feed.schedule_grace_acquire().await.unwrap(), None);
    assert_eq!(location.position_calls(), 1);
}

#[tokio::test]
async fn test_grace_task_stops_with_screen() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let location = ScriptedLocation::granted(home());
    let mut config = test_config(&server);
    config.empty_list_grace_secs = 1;
    let app = app_with(config, location.clone());
    let feed = app.gym_feed();

    let handle = feed.schedule_grace_acquire();
    drop(feed);

    assert_eq!(handle.await.unwrap(), None);
    assert_eq!(location.position_calls(), 0);
}

#[tokio::test]
async fn test_map_region_and_markers_cover_listings() {
    let server = MockServer::start().await;
    mount_page(&server, "1", gyms(0, 5)).await;

    let app = app_with(test_config(&server), ScriptedLocation::granted(home()));
    let feed = app.gym_feed();
    assert!(feed.map_region().await.is_none());

    feed.refresh().await;

    let region = feed.map_region().await.unwrap();
    assert!(region.contains(home()));
    for listing in feed.listings().await {
        assert!(region.contains(listing.gym.coordinates));
    }

    let markers = feed.markers().await;
    assert_eq!(markers.features.len(), 5);
}

#[tokio::test]
async fn test_search_is_sent_and_blank_search_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/gyms"))
        .and(query_param("search", "yoga"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"gyms": gyms(50, 51)}
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "1", gyms(0, 3)).await;

    let app = app_with(test_config(&server), ScriptedLocation::granted(home()));
    let feed = app.gym_feed();
    feed.refresh().await;
    assert_eq!(feed.listings().await.len(), 3);

    assert_eq!(feed.set_search("yoga").await, FeedStatus::Ready);
    assert_eq!(ids(&feed.listings().await), vec!["g50"]);

    // Clearing the search goes back to the unfiltered list.
    feed.set_search("  ").await;
    assert_eq!(feed.listings().await.len(), 3);
}
