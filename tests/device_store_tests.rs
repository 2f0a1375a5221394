// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed device store and session persistence tests.

mod common;

use common::{create_test_app_with_store, ScriptedIdentity, ScriptedLocation};
use fitclub_client::config::Config;
use fitclub_client::db::{keys, DeviceStore};
use fitclub_client::models::{LocationFix, SessionCredential};

#[tokio::test]
async fn test_values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let store = DeviceStore::open(&path).await.unwrap();
    let fix = LocationFix {
        latitude: 52.52,
        longitude: 13.405,
        captured_at_epoch_ms: 1_700_000_000_000,
        permission_granted: true,
    };
    store.put(keys::LOCATION_FIX, &fix).await.unwrap();
    store
        .put(keys::SESSION_CREDENTIAL, &SessionCredential::new("abc"))
        .await
        .unwrap();
    store.remove(keys::SESSION_CREDENTIAL).await.unwrap();

    let reopened = DeviceStore::open(&path).await.unwrap();
    assert_eq!(reopened.get::<LocationFix>(keys::LOCATION_FIX), Some(fix));
    assert!(reopened.get::<serde_json::Value>(keys::SESSION_CREDENTIAL).is_none());
}

#[tokio::test]
async fn test_missing_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = DeviceStore::open(dir.path().join("absent.json")).await.unwrap();
    assert!(store.get::<serde_json::Value>(keys::LOCATION_FIX).is_none());
}

#[tokio::test]
async fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    tokio::fs::write(&path, "{not json").await.unwrap();

    assert!(DeviceStore::open(&path).await.is_err());
}

#[tokio::test]
async fn test_undecodable_value_reads_as_none() {
    let store = DeviceStore::new_mock();
    store.put(keys::LOCATION_FIX, &"not a fix").await.unwrap();
    assert!(store.get::<LocationFix>(keys::LOCATION_FIX).is_none());
}

#[tokio::test]
async fn test_credential_debug_is_redacted() {
    let credential = SessionCredential::new("super-secret-token");
    let debug = format!("{:?}", credential);
    assert!(!debug.contains("super-secret-token"));
    assert!(debug.contains("redacted"));
}

#[tokio::test]
async fn test_login_persists_and_logout_clears() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = DeviceStore::open(&path).await.unwrap();

    let app = create_test_app_with_store(
        Config::default(),
        ScriptedIdentity::with_token("login-token"),
        ScriptedLocation::denied(),
        store,
    );

    let credential = app.login().await.unwrap();
    assert_eq!(credential.access_token, "login-token");
    let reopened = DeviceStore::open(&path).await.unwrap();
    assert!(reopened.get::<serde_json::Value>(keys::SESSION_CREDENTIAL).is_some());

    app.logout().await.unwrap();
    let reopened = DeviceStore::open(&path).await.unwrap();
    assert!(reopened.get::<serde_json::Value>(keys::SESSION_CREDENTIAL).is_none());
    assert!(reopened.get::<serde_json::Value>(keys::PROFILE_SNAPSHOT).is_none());
}
