// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use fitclub_client::config::Config;
use fitclub_client::db::DeviceStore;
use fitclub_client::error::AppError;
use fitclub_client::models::{Coordinates, SessionCredential};
use fitclub_client::services::{
    AuthorizeRequest, IdentityProvider, LocationProvider, PermissionResult, PositionError,
    PositionOptions,
};
use fitclub_client::FitClub;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::MockServer;

/// Identity provider double that hands out a scripted sequence of tokens.
///
/// `get_credentials` keeps returning the current token, like a credentials
/// manager whose token is not near expiry. Each forced refresh advances to
/// the next token; the last one repeats once the script runs out.
pub struct ScriptedIdentity {
    tokens: Vec<Option<String>>,
    current: AtomicUsize,
    refreshes: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedIdentity {
    pub fn new(tokens: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            tokens: tokens.iter().map(|t| t.map(str::to_string)).collect(),
            current: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
        })
    }

    pub fn with_token(token: &str) -> Arc<Self> {
        Self::new(&[Some(token)])
    }

    pub fn signed_out() -> Arc<Self> {
        Self::new(&[None])
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    fn token_at(&self, n: usize) -> Option<SessionCredential> {
        self.tokens
            .get(n)
            .or_else(|| self.tokens.last())
            .cloned()
            .flatten()
            .map(SessionCredential::new)
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    async fn authorize(&self, _request: &AuthorizeRequest) -> Result<SessionCredential, AppError> {
        match self.get_credentials().await? {
            Some(credential) => Ok(credential),
            None => Err(AppError::PermissionDenied("Login cancelled".to_string())),
        }
    }

    async fn get_credentials(&self) -> Result<Option<SessionCredential>, AppError> {
        Ok(self.token_at(self.current.load(Ordering::SeqCst)))
    }

    async fn refresh_credentials(&self) -> Result<Option<SessionCredential>, AppError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        let n = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(self.token_at(n))
    }

    async fn clear_session(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Location provider double that counts platform calls.
pub struct ScriptedLocation {
    permission: PermissionResult,
    /// `None` never answers (for timeout tests).
    position: Option<Result<Coordinates, PositionError>>,
    permission_calls: AtomicUsize,
    position_calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedLocation {
    pub fn granted(at: Coordinates) -> Arc<Self> {
        Arc::new(Self {
            permission: PermissionResult::Granted,
            position: Some(Ok(at)),
            permission_calls: AtomicUsize::new(0),
            position_calls: AtomicUsize::new(0),
        })
    }

    pub fn denied() -> Arc<Self> {
        Arc::new(Self {
            permission: PermissionResult::Denied,
            position: None,
            permission_calls: AtomicUsize::new(0),
            position_calls: AtomicUsize::new(0),
        })
    }

    pub fn ask_later() -> Arc<Self> {
        Arc::new(Self {
            permission: PermissionResult::AskLater,
            position: None,
            permission_calls: AtomicUsize::new(0),
            position_calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(code: i32) -> Arc<Self> {
        Arc::new(Self {
            permission: PermissionResult::Granted,
            position: Some(Err(PositionError {
                code,
                message: "platform failure".to_string(),
            })),
            permission_calls: AtomicUsize::new(0),
            position_calls: AtomicUsize::new(0),
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            permission: PermissionResult::Granted,
            position: None,
            permission_calls: AtomicUsize::new(0),
            position_calls: AtomicUsize::new(0),
        })
    }

    pub fn permission_calls(&self) -> usize {
        self.permission_calls.load(Ordering::SeqCst)
    }

    pub fn position_calls(&self) -> usize {
        self.position_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationProvider for ScriptedLocation {
    async fn request_permission(&self) -> PermissionResult {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        self.permission
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        self.position_calls.fetch_add(1, Ordering::SeqCst);
        match &self.position {
            Some(result) => result.clone(),
            None => std::future::pending::<Result<Coordinates, PositionError>>().await,
        }
    }
}

/// Somewhere in Palo Alto.
#[allow(dead_code)]
pub fn home() -> Coordinates {
    Coordinates::new(37.4419, -122.1430)
}

/// Config pointing at a mock backend.
#[allow(dead_code)]
pub fn test_config(server: &MockServer) -> Config {
    Config {
        api_base_url: format!("{}/api", server.uri()),
        request_timeout_secs: 5,
        ..Config::default()
    }
}

/// Create a test client against the mock backend with an in-memory store.
#[allow(dead_code)]
pub fn create_test_app(
    config: Config,
    identity: Arc<dyn IdentityProvider>,
    location: Arc<dyn LocationProvider>,
) -> FitClub {
    create_test_app_with_store(config, identity, location, DeviceStore::new_mock())
}

#[allow(dead_code)]
pub fn create_test_app_with_store(
    config: Config,
    identity: Arc<dyn IdentityProvider>,
    location: Arc<dyn LocationProvider>,
    store: DeviceStore,
) -> FitClub {
    FitClub::new(config, identity, location, store).expect("Failed to build test client")
}

/// Test helper to create a JWT expiring `exp_offset_secs` from now.
#[allow(dead_code)]
pub fn create_test_jwt(subject: &str, exp_offset_secs: i64) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = serde_json::json!({
        "sub": subject,
        "iat": now,
        "exp": now + exp_offset_secs,
    });

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"test_signing_key_32_bytes_long!!"),
    )
    .expect("Failed to create JWT")
}
