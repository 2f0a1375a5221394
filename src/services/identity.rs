// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider seam and the Auth0 credentials manager.
//!
//! The interactive browser login belongs to the platform SDK; what the
//! client needs is a source of bearer tokens that keeps itself fresh.

use crate::error::AppError;
use crate::models::SessionCredential;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// What to ask the identity provider for at login.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizeRequest {
    pub scopes: Vec<String>,
    pub audience: String,
    pub redirect_uri: String,
}

/// Identity provider contract (Auth0 SDK or a test double).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the login flow and return a credential usable against the backend.
    async fn authorize(&self, request: &AuthorizeRequest) -> Result<SessionCredential, AppError>;

    /// Current credential from the provider's credential manager, if any.
    async fn get_credentials(&self) -> Result<Option<SessionCredential>, AppError>;

    /// Obtain a new credential even if the held one looks valid. Used after
    /// the backend rejected the current token.
    async fn refresh_credentials(&self) -> Result<Option<SessionCredential>, AppError>;

    /// Forget the provider-side session.
    async fn clear_session(&self) -> Result<(), AppError>;
}

/// Credentials held by the manager.
#[derive(Clone)]
struct HeldCredentials {
    credential: SessionCredential,
    refresh_token: Option<String>,
}

impl HeldCredentials {
    /// Still usable for at least the refresh margin.
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        self.credential
            .expires_at
            .is_none_or(|expires_at| now + margin < expires_at)
    }
}

/// Token response from `POST /oauth/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Auth0 credentials manager using the refresh-token grant.
pub struct Auth0CredentialsManager {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    audience: String,
    /// Refresh token to fall back on when nothing is held yet.
    seed_refresh_token: Mutex<Option<String>>,
    held: Mutex<Option<HeldCredentials>>,
}

impl Auth0CredentialsManager {
    /// Create a manager for an Auth0 tenant. `domain` may be a bare host
    /// (`tenant.eu.auth0.com`) or a full base URL.
    pub fn new(domain: &str, client_id: impl Into<String>, audience: impl Into<String>) -> Self {
        Self::with_refresh_token(domain, client_id, audience, None)
    }

    /// Like [`Auth0CredentialsManager::new`], seeded with a refresh token so
    /// a session can start without the browser flow.
    pub fn with_refresh_token(
        domain: &str,
        client_id: impl Into<String>,
        audience: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Self {
        let base = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", domain.trim_end_matches('/'))
        };

        Self {
            http: reqwest::Client::new(),
            token_url: format!("{}/oauth/token", base),
            client_id: client_id.into(),
            audience: audience.into(),
            seed_refresh_token: Mutex::new(refresh_token),
            held: Mutex::new(None),
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::with_refresh_token(
            &config.auth0_domain,
            config.auth0_client_id.clone(),
            config.auth0_audience.clone(),
            config.auth0_refresh_token.clone(),
        )
    }

    /// Refresh an access token.
    async fn refresh(
        &self,
        refresh_token: &str,
        scope: Option<&str>,
    ) -> Result<TokenResponse, AppError> {
        let mut body = serde_json::json!({
            "grant_type": "refresh_token",
            "client_id": self.client_id,
            "refresh_token": refresh_token,
            "audience": self.audience,
        });
        if let Some(scope) = scope {
            body["scope"] = serde_json::Value::String(scope.to_string());
        }

        let response = self
            .http
            .post(&self.token_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Auth0 token refresh failed");
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(AppError::Unauthorized { silent: false });
            }
            return Err(AppError::from_response(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to parse token response: {}", e)))
    }

    /// Refresh with whatever refresh token is available and hold the result.
    async fn refresh_and_hold(
        &self,
        previous: Option<HeldCredentials>,
        scope: Option<&str>,
    ) -> Result<Option<HeldCredentials>, AppError> {
        let refresh_token = match previous.as_ref().and_then(|c| c.refresh_token.clone()) {
            Some(t) => Some(t),
            None => self.seed_refresh_token.lock().await.clone(),
        };
        let Some(refresh_token) = refresh_token else {
            return Ok(None);
        };

        let tokens = self.refresh(&refresh_token, scope).await?;

        // The token's own `exp` wins; `expires_in` covers opaque tokens.
        let mut credential = SessionCredential::new(tokens.access_token);
        if credential.expires_at.is_none() {
            credential = SessionCredential::with_expiry(
                credential.access_token,
                Utc::now() + Duration::seconds(tokens.expires_in),
            );
        }
        let held = HeldCredentials {
            credential,
            // Auth0 only rotates the refresh token when rotation is enabled.
            refresh_token: tokens.refresh_token.or(Some(refresh_token)),
        };
        tracing::info!(expires_at = ?held.credential.expires_at, "Auth0 credentials refreshed");
        Ok(Some(held))
    }
}

#[async_trait]
impl IdentityProvider for Auth0CredentialsManager {
    async fn authorize(&self, request: &AuthorizeRequest) -> Result<SessionCredential, AppError> {
        let mut held = self.held.lock().await;
        let scope = request.scopes.join(" ");

        match self.refresh_and_hold(held.clone(), Some(&scope)).await? {
            Some(fresh) => {
                let credential = fresh.credential.clone();
                *held = Some(fresh);
                Ok(credential)
            }
            None => Err(AppError::PermissionDenied(
                "Interactive login is required".to_string(),
            )),
        }
    }

    async fn get_credentials(&self) -> Result<Option<SessionCredential>, AppError> {
        // Holding the lock across the refresh keeps concurrent callers from
        // refreshing twice.
        let mut held = self.held.lock().await;

        if let Some(current) = held.as_ref() {
            if current.is_fresh(Utc::now()) {
                return Ok(Some(current.credential.clone()));
            }
        }

        match self.refresh_and_hold(held.clone(), None).await? {
            Some(fresh) => {
                let credential = fresh.credential.clone();
                *held = Some(fresh);
                Ok(Some(credential))
            }
            None => Ok(None),
        }
    }

    async fn refresh_credentials(&self) -> Result<Option<SessionCredential>, AppError> {
        let mut held = self.held.lock().await;

        match self.refresh_and_hold(held.clone(), None).await {
            Ok(Some(fresh)) => {
                let credential = fresh.credential.clone();
                *held = Some(fresh);
                Ok(Some(credential))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                // A refresh token the tenant rejected is no good for next time.
                if e.is_unauthorized() {
                    *held = None;
                }
                Err(e)
            }
        }
    }

    async fn clear_session(&self) -> Result<(), AppError> {
        *self.held.lock().await = None;
        *self.seed_refresh_token.lock().await = None;
        tracing::info!("Auth0 session cleared");
        Ok(())
    }
}
