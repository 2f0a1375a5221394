// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated request gateway.
//!
//! Handles:
//! - Attaching the session's bearer credential to every request
//! - One transport timeout for all backend calls
//! - Response checking and the configured 401 policy

use crate::config::{Config, UnauthorizedPolicy};
use crate::error::AppError;
use crate::services::session::Session;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;

/// An outbound backend request, relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Gateway to the backend REST API.
#[derive(Clone)]
pub struct AuthGateway {
    http: reqwest::Client,
    base_url: Arc<str>,
    session: Session,
    policy: UnauthorizedPolicy,
}

impl AuthGateway {
    pub fn new(config: &Config, session: Session) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: Arc::from(config.api_base_url.trim_end_matches('/')),
            session,
            policy: config.unauthorized_policy,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Dispatch a request with whatever credential the session resolves.
    ///
    /// Non-2xx responses are returned as-is; only transport failures are
    /// errors here.
    pub async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response, AppError> {
        let credential = self.session.credential().await;
        self.dispatch(request, credential.as_ref().map(|(c, _)| c.access_token.as_str()))
            .await
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<reqwest::Response, AppError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        match access_token {
            Some(token) => builder = builder.bearer_auth(token),
            None => tracing::debug!(path = %request.path, "No credential, sending unauthenticated"),
        }

        tracing::debug!(method = %request.method, path = %request.path, "Dispatching request");
        Ok(builder.send().await?)
    }

    /// Send, check the status, apply the 401 policy and return the JSON body
    /// (`Null` for empty bodies).
    pub async fn execute(&self, request: &ApiRequest) -> Result<serde_json::Value, AppError> {
        let response = self.send(request).await?;

        if response.status().as_u16() != 401 {
            return check_response_json(response).await;
        }

        match self.policy {
            UnauthorizedPolicy::Surface => Err(AppError::Unauthorized { silent: false }),
            UnauthorizedPolicy::Silent => {
                tracing::debug!(path = %request.path, "Ignoring 401 by policy");
                Err(AppError::Unauthorized { silent: true })
            }
            UnauthorizedPolicy::Reauthenticate => {
                tracing::info!(path = %request.path, "Got 401, re-authenticating once");
                let Some(fresh) = self.session.reauthenticate().await else {
                    return Err(AppError::Unauthorized { silent: false });
                };
                let retry = self.dispatch(request, Some(&fresh.access_token)).await?;
                if retry.status().as_u16() == 401 {
                    return Err(AppError::Unauthorized { silent: false });
                }
                check_response_json(retry).await
            }
        }
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json(response: reqwest::Response) -> Result<serde_json::Value, AppError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        if status.as_u16() == 429 {
            tracing::warn!("Backend rate limit hit (429)");
        }
        return Err(AppError::from_response(status.as_u16(), &body));
    }

    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| {
        AppError::Transport(format!("Invalid JSON from server (HTTP {}): {}", status, e))
    })
}
