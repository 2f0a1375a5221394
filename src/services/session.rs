// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Explicit session object threaded through every service.
//!
//! Built once at startup and cloned into the gateway; there is no ambient
//! auth state anywhere else in the crate.

use crate::db::{keys, DeviceStore};
use crate::error::AppError;
use crate::models::SessionCredential;
use crate::services::identity::{AuthorizeRequest, IdentityProvider};
use chrono::Utc;
use std::sync::Arc;

/// Where a resolved credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    IdentityProvider,
    Persisted,
}

/// The user's session.
#[derive(Clone)]
pub struct Session {
    identity: Arc<dyn IdentityProvider>,
    store: DeviceStore,
    authorize: AuthorizeRequest,
}

impl Session {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: DeviceStore,
        authorize: AuthorizeRequest,
    ) -> Self {
        Self {
            identity,
            store,
            authorize,
        }
    }

    /// Log in through the identity provider and persist the credential.
    pub async fn login(&self) -> Result<SessionCredential, AppError> {
        let credential = self.identity.authorize(&self.authorize).await?;
        self.persist(&credential).await;
        tracing::info!(expires_at = ?credential.expires_at, "Logged in");
        Ok(credential)
    }

    /// Resolve the credential to attach to an outbound request.
    ///
    /// The identity provider's credential manager is asked first; the
    /// persisted credential is the fallback. Expired credentials are skipped
    /// from either source.
    pub async fn credential(&self) -> Option<(SessionCredential, CredentialSource)> {
        let now = Utc::now();

        match self.identity.get_credentials().await {
            Ok(Some(credential)) if !credential.is_expired(now) => {
                let stored: Option<SessionCredential> = self.store.get(keys::SESSION_CREDENTIAL);
                if stored.as_ref() != Some(&credential) {
                    self.persist(&credential).await;
                }
                return Some((credential, CredentialSource::IdentityProvider));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Credential manager unavailable, trying persisted credential");
            }
        }

        self.store
            .get::<SessionCredential>(keys::SESSION_CREDENTIAL)
            .filter(|c| !c.is_expired(now))
            .map(|c| (c, CredentialSource::Persisted))
    }

    /// Force a credential refresh after a 401.
    ///
    /// A refresh that hands back the rejected token counts as a failure, and
    /// the persisted credential is dropped since the server just refused it.
    pub async fn reauthenticate(&self) -> Option<SessionCredential> {
        let rejected: Option<SessionCredential> = self.store.get(keys::SESSION_CREDENTIAL);

        match self.identity.refresh_credentials().await {
            Ok(Some(fresh))
                if rejected.as_ref().map(|c| c.access_token.as_str())
                    != Some(fresh.access_token.as_str()) =>
            {
                self.persist(&fresh).await;
                Some(fresh)
            }
            Ok(_) => {
                self.forget().await;
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Re-authentication failed");
                self.forget().await;
                None
            }
        }
    }

    /// Clear the provider session and the persisted credential.
    pub async fn logout(&self) -> Result<(), AppError> {
        if let Err(e) = self.identity.clear_session().await {
            tracing::warn!(error = %e, "Identity provider failed to clear session");
        }
        self.store.remove(keys::SESSION_CREDENTIAL).await?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Whether some credential is currently available.
    pub async fn is_authenticated(&self) -> bool {
        self.credential().await.is_some()
    }

    async fn persist(&self, credential: &SessionCredential) {
        if let Err(e) = self.store.put(keys::SESSION_CREDENTIAL, credential).await {
            tracing::warn!(error = %e, "Failed to persist session credential");
        }
    }

    async fn forget(&self) {
        if let Err(e) = self.store.remove(keys::SESSION_CREDENTIAL).await {
            tracing::warn!(error = %e, "Failed to drop persisted credential");
        }
    }
}
