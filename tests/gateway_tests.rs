// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated request gateway tests.
//!
//! Credential resolution order, unauthenticated fallback, status pass-through
//! and transport failures.

mod common;

use common::{create_test_app, create_test_app_with_store, create_test_jwt, test_config};
use common::{ScriptedIdentity, ScriptedLocation};
use fitclub_client::db::{keys, DeviceStore};
use fitclub_client::error::AppError;
use fitclub_client::models::SessionCredential;
use fitclub_client::services::{ApiRequest, CredentialSource};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_attaches_identity_provider_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/auth0/profile"))
        .and(header("authorization", "Bearer provider-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(
        test_config(&server),
        ScriptedIdentity::with_token("provider-token"),
        ScriptedLocation::denied(),
    );

    let body = app
        .gateway
        .execute(&ApiRequest::get("/users/auth0/profile"))
        .await
        .expect("request should succeed");
    assert_eq!(body, json!({"ok": true}));

    // The provider's credential is written through for session restore.
    let stored: Option<SessionCredential> = app.store.get(keys::SESSION_CREDENTIAL);
    assert_eq!(stored.unwrap().access_token, "provider-token");
}

#[tokio::test]
async fn test_falls_back_to_persisted_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/auth0/profile"))
        .and(header("authorization", "Bearer persisted-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store = DeviceStore::new_mock();
    store
        .put(
            keys::SESSION_CREDENTIAL,
            &SessionCredential::new("persisted-token"),
        )
        .await
        .unwrap();

    let app = create_test_app_with_store(
        test_config(&server),
        ScriptedIdentity::signed_out(),
        ScriptedLocation::denied(),
        store,
    );

    let (_, source) = app.session.credential().await.unwrap();
    assert_eq!(source, CredentialSource::Persisted);

    app.gateway
        .execute(&ApiRequest::get("/users/auth0/profile"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_expired_credential_sends_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/gyms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = DeviceStore::new_mock();
    let expired = SessionCredential::new(create_test_jwt("user-1", -60));
    assert!(expired.expires_at.is_some());
    store.put(keys::SESSION_CREDENTIAL, &expired).await.unwrap();

    let app = create_test_app_with_store(
        test_config(&server),
        ScriptedIdentity::signed_out(),
        ScriptedLocation::denied(),
        store,
    );

    assert!(!app.session.is_authenticated().await);
    app.gateway.execute(&ApiRequest::get("/gyms")).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_send_passes_non_2xx_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/gyms"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .mount(&server)
        .await;

    let app = create_test_app(
        test_config(&server),
        ScriptedIdentity::with_token("t"),
        ScriptedLocation::denied(),
    );

    let response = app.gateway.send(&ApiRequest::get("/gyms")).await.unwrap();
    assert_eq!(response.status().as_u16(), 503);
}

#[tokio::test]
async fn test_execute_maps_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/diet/auth0/logs"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Calories are required"})),
        )
        .mount(&server)
        .await;

    let app = create_test_app(
        test_config(&server),
        ScriptedIdentity::with_token("t"),
        ScriptedLocation::denied(),
    );

    let err = app
        .gateway
        .execute(&ApiRequest::post("/diet/auth0/logs").json(json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Server { status: 422, .. }));
    assert_eq!(err.user_message(), "Calories are required");
}

#[tokio::test]
async fn test_transport_failure_is_an_error() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    // Nothing listens on the discard port.
    config.api_base_url = "http://127.0.0.1:9/api".to_string();

    let app = create_test_app(
        config,
        ScriptedIdentity::with_token("t"),
        ScriptedLocation::denied(),
    );

    let err = app.gateway.send(&ApiRequest::get("/gyms")).await.unwrap_err();
    assert!(matches!(err, AppError::Transport(_) | AppError::Timeout));
    assert!(!err.user_message().is_empty());
}
