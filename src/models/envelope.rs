// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Uniform result envelope returned by every resource call.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// `{success, message, data}`: what callers get back no matter how the
/// call went. `data` is `None` on failure unless stale data is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct ApiResult<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResult<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Failure that still carries previously known data.
    pub fn stale(data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
        }
    }
}

impl<T> From<Result<(T, String), AppError>> for ApiResult<T> {
    fn from(result: Result<(T, String), AppError>) -> Self {
        match result {
            Ok((data, message)) => ApiResult::ok(data, message),
            Err(err) => {
                tracing::debug!(error = %err, "Resource call failed");
                ApiResult::fail(err.user_message())
            }
        }
    }
}

/// The backend's own response wrapper. `success` is optional because some
/// endpoints return a bare body.
#[derive(Debug, Deserialize)]
pub(crate) struct ServerEnvelope {
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_has_no_data() {
        let result: ApiResult<u32> = Err(AppError::Timeout).map(|v: u32| (v, String::new())).into();
        assert!(!result.success);
        assert!(result.data.is_none());
        assert!(!result.message.is_empty());
    }

    #[test]
    fn serializes_null_data() {
        let result: ApiResult<Vec<u32>> = ApiResult::fail("nope");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "message": "nope", "data": null})
        );
    }
}
