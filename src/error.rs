// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error taxonomy and the shared user-facing message rule.

use crate::services::geolocation::LocationError;

/// Shown when neither the server nor the transport said anything useful.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Shown for a 401 under the surfacing policies.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Client error type. Every variant maps to one human-readable string via
/// [`AppError::user_message`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error (HTTP {status}): {}", message.as_deref().unwrap_or("no message"))]
    Server {
        status: u16,
        message: Option<String>,
    },

    #[error("Authentication required")]
    Unauthorized {
        /// Whether the UI should stay quiet about this failure
        silent: bool,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Build a server error from a non-2xx status and its raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        AppError::Server {
            status,
            message: server_message(body),
        }
    }

    /// The single string shown to the user for this error.
    ///
    /// Server-supplied message first, then the transport's own description,
    /// then a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Server {
                message: Some(msg), ..
            } => msg.clone(),
            AppError::Server { message: None, .. } => GENERIC_ERROR_MESSAGE.to_string(),
            AppError::Transport(desc) if !desc.trim().is_empty() => desc.clone(),
            AppError::Transport(_) => GENERIC_ERROR_MESSAGE.to_string(),
            AppError::Timeout => "The request timed out. Please try again.".to_string(),
            AppError::Unauthorized { silent: true } => String::new(),
            AppError::Unauthorized { silent: false } => SESSION_EXPIRED_MESSAGE.to_string(),
            AppError::PermissionDenied(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Location(err) => err.to_string(),
            AppError::Storage(_) | AppError::Internal(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .into_iter()
            .find_map(|(field, errs)| {
                errs.first().map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .unwrap_or_else(|| "Invalid input".to_string());

        AppError::Validation(message)
    }
}

/// Pull a human-readable message out of an error body, if it carries one.
pub fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let pick = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    pick("message")
        .or_else(|| pick("error"))
        .or_else(|| pick("error_description"))
        .or_else(|| {
            value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        })
}
