// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile service tests: caching and the stale-data fallback.

mod common;

use common::{create_test_app, create_test_app_with_store, test_config};
use common::{ScriptedIdentity, ScriptedLocation};
use fitclub_client::db::{keys, DeviceStore};
use fitclub_client::models::UserProfile;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn profile_body() -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "_id": "u1",
            "name": "Sam Lee",
            "email": "sam@example.com",
            "membership": "Premium",
            "memberSince": "2024-02-01",
            "picture": "https://cdn.example.com/sam.png"
        }
    })
}

#[tokio::test]
async fn test_fetch_caches_and_persists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/auth0/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(
        test_config(&server),
        ScriptedIdentity::with_token("t"),
        ScriptedLocation::denied(),
    );

    let result = app.profile().fetch().await;
    assert!(result.success);
    let profile = result.data.unwrap();
    assert_eq!(profile.id, "u1");
    assert_eq!(profile.membership.as_deref(), Some("Premium"));
    assert_eq!(
        profile.avatar_url.as_deref(),
        Some("https://cdn.example.com/sam.png")
    );

    assert_eq!(app.profile().cached().await, Some(profile.clone()));
    assert_eq!(
        app.store.get::<UserProfile>(keys::PROFILE_SNAPSHOT),
        Some(profile)
    );
}

#[tokio::test]
async fn test_failed_fetch_returns_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/auth0/profile"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "Try later"})))
        .mount(&server)
        .await;

    let store = DeviceStore::new_mock();
    let snapshot: UserProfile =
        serde_json::from_value(profile_body()["data"].clone()).unwrap();
    store.put(keys::PROFILE_SNAPSHOT, &snapshot).await.unwrap();

    let app = create_test_app_with_store(
        test_config(&server),
        ScriptedIdentity::with_token("t"),
        ScriptedLocation::denied(),
        store,
    );

    let result = app.profile().fetch().await;
    assert!(!result.success);
    assert_eq!(result.message, "Try later");
    assert_eq!(result.data, Some(snapshot));
}

#[tokio::test]
async fn test_failed_fetch_without_cache_has_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let app = create_test_app(
        test_config(&server),
        ScriptedIdentity::with_token("t"),
        ScriptedLocation::denied(),
    );

    let result = app.profile().fetch().await;
    assert!(!result.success);
    assert!(result.data.is_none());
}
