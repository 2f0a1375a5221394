// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! Everything has a sensible default except the Auth0 tenant, which the
//! client cannot guess.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// How a 401 from the backend is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedPolicy {
    /// Report a session-expired error to the user.
    Surface,
    /// Fail the call but keep quiet about it.
    Silent,
    /// Fetch fresh credentials once and retry the request once.
    Reauthenticate,
}

impl FromStr for UnauthorizedPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" | "alert" => Ok(Self::Surface),
            "silent" | "ignore" => Ok(Self::Silent),
            "reauthenticate" | "reauth" => Ok(Self::Reauthenticate),
            _ => Err(ConfigError::Invalid("FITCLUB_ON_UNAUTHORIZED")),
        }
    }
}

/// What happens to a visible entry when its server-side delete fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// The entry stays gone; the server call is fire-and-forget.
    BestEffort,
    /// The entry is put back where it was and flagged as failed.
    RestoreOnFailure,
}

impl FromStr for DeletePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            "restore_on_failure" | "restore-on-failure" | "restore" => Ok(Self::RestoreOnFailure),
            _ => Err(ConfigError::Invalid("FITCLUB_DELETE_POLICY")),
        }
    }
}

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Backend ---
    /// Base URL of the REST API, including the `/api` prefix
    pub api_base_url: String,
    /// Transport timeout applied to every backend request
    pub request_timeout_secs: u64,
    /// 401 handling
    pub unauthorized_policy: UnauthorizedPolicy,
    /// Server-side delete failure handling
    pub delete_policy: DeletePolicy,

    // --- Identity provider (Auth0) ---
    pub auth0_domain: String,
    pub auth0_client_id: String,
    pub auth0_audience: String,
    pub auth0_redirect_uri: String,
    pub auth0_scopes: Vec<String>,
    /// Refresh token used to bootstrap a session without the browser flow
    pub auth0_refresh_token: Option<String>,

    // --- Device ---
    /// Location of the JSON key-value store
    pub store_path: PathBuf,
    /// Maximum age of a cached location fix
    pub location_ttl_minutes: i64,
    /// Bound on a single platform location read
    pub location_timeout_secs: u64,

    // --- Gym discovery ---
    pub gym_page_size: u32,
    pub gym_radius_km: f64,
    /// How long an empty gym list waits before re-acquiring location
    pub empty_list_grace_secs: u64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            request_timeout_secs: 15,
            unauthorized_policy: UnauthorizedPolicy::Reauthenticate,
            delete_policy: DeletePolicy::BestEffort,
            auth0_domain: "fitclub-test.eu.auth0.com".to_string(),
            auth0_client_id: "test_client_id".to_string(),
            auth0_audience: "https://api.fitclub.test".to_string(),
            auth0_redirect_uri: "fitclub://callback".to_string(),
            auth0_scopes: default_scopes(),
            auth0_refresh_token: None,
            store_path: PathBuf::from("fitclub_store.json"),
            location_ttl_minutes: 30,
            location_timeout_secs: 30,
            gym_page_size: 20,
            gym_radius_km: 10.0,
            empty_list_grace_secs: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            api_base_url: env::var("FITCLUB_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            request_timeout_secs: parse_or("FITCLUB_REQUEST_TIMEOUT_SECS", 15),
            unauthorized_policy: match env::var("FITCLUB_ON_UNAUTHORIZED") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.unauthorized_policy,
            },
            delete_policy: match env::var("FITCLUB_DELETE_POLICY") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.delete_policy,
            },

            auth0_domain: env::var("AUTH0_DOMAIN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AUTH0_DOMAIN"))?,
            auth0_client_id: env::var("AUTH0_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AUTH0_CLIENT_ID"))?,
            auth0_audience: env::var("AUTH0_AUDIENCE").unwrap_or(defaults.auth0_audience),
            auth0_redirect_uri: env::var("AUTH0_REDIRECT_URI")
                .unwrap_or(defaults.auth0_redirect_uri),
            auth0_scopes: env::var("AUTH0_SCOPES")
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or(defaults.auth0_scopes),
            auth0_refresh_token: env::var("AUTH0_REFRESH_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),

            store_path: env::var("FITCLUB_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            location_ttl_minutes: parse_or("FITCLUB_LOCATION_TTL_MINUTES", 30),
            location_timeout_secs: parse_or("FITCLUB_LOCATION_TIMEOUT_SECS", 30),

            gym_page_size: parse_or("FITCLUB_GYM_PAGE_SIZE", 20),
            gym_radius_km: parse_or("FITCLUB_GYM_RADIUS_KM", 10.0),
            empty_list_grace_secs: parse_or("FITCLUB_EMPTY_LIST_GRACE_SECS", 5),
        })
    }
}

fn default_scopes() -> Vec<String> {
    ["openid", "profile", "email", "offline_access"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
