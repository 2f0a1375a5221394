// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and session credential models.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// User profile as returned by `/users/auth0/profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// Membership tier (e.g. "Basic", "Premium")
    #[serde(default)]
    pub membership: Option<String>,
    /// When the membership started (ISO 8601)
    #[serde(default)]
    pub member_since: Option<String>,
    #[serde(default, alias = "picture")]
    pub avatar_url: Option<String>,
}

/// Bearer credential for the backend.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub access_token: String,
    /// Expiry read from the token itself; `None` means provider-managed.
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionCredential {
    /// Wrap an access token, reading its expiry when it is a JWT.
    pub fn new(access_token: impl Into<String>) -> Self {
        let access_token = access_token.into();
        let expires_at = token_expiry(&access_token);
        Self {
            access_token,
            expires_at,
        }
    }

    pub fn with_expiry(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: Some(expires_at),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Read the `exp` claim of a JWT without verifying it. The backend verifies
/// tokens; the client only needs to know when to stop sending one.
fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    data.claims
        .exp
        .and_then(|exp| DateTime::from_timestamp(exp, 0))
}
