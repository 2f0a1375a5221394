// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generic resource service.
//!
//! One implementation of fetch / create / update / delete / list for every
//! resource family. A [`Resource`] impl supplies the base path, the list key
//! the backend wraps collections in, and the form-to-payload transform.
//! Every operation resolves to an [`ApiResult`]; errors never escape.

use crate::error::AppError;
use crate::models::envelope::ServerEnvelope;
use crate::models::{ApiResult, Identified};
use crate::services::gateway::{ApiRequest, AuthGateway};
use crate::time_utils::format_day;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Shown when a response arrives but cannot be decoded.
pub const UNREADABLE_RESPONSE_MESSAGE: &str =
    "The server sent a response the app could not read. Please try again later.";

/// A REST resource family (diet logs, workout sessions, gyms, ...).
pub trait Resource: Send + Sync + 'static {
    /// What the server stores and returns.
    type Entry: Identified + DeserializeOwned + Serialize + Clone + Send + Sync + 'static;
    /// Raw form input.
    type Input: Send + 'static;
    /// Normalized create/update body.
    type Payload: Serialize + Clone + Send + Sync + 'static;

    /// Short name used in logs and messages.
    const NAME: &'static str;
    /// Collection path relative to the API base.
    const PATH: &'static str;
    /// Key the backend nests list responses under, if any.
    const LIST_KEY: Option<&'static str> = None;

    /// Coerce and validate form input.
    fn normalize(input: Self::Input) -> Result<Self::Payload, AppError>;

    /// Local stand-in for an entry the server has not confirmed yet.
    fn draft(payload: &Self::Payload) -> Self::Entry;

    /// Rebuild the request body for an existing entry (resubmission).
    fn payload_of(entry: &Self::Entry) -> Self::Payload;
}

/// Query for a paged listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub sort: Option<String>,
    pub filter: Option<String>,
    pub search: Option<String>,
    /// Resource-specific parameters (e.g. gym `radius`, `lat`, `lon`)
    pub extra: Vec<(String, String)>,
}

impl PageQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            sort: None,
            filter: None,
            search: None,
            extra: Vec::new(),
        }
    }

    fn to_request(&self, path: &str) -> ApiRequest {
        let mut request = ApiRequest::get(path)
            .query("page", self.page)
            .query("limit", self.limit);
        for (key, value) in [
            ("sort", &self.sort),
            ("filter", &self.filter),
            ("search", &self.search),
        ] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                request = request.query(key, value);
            }
        }
        for (key, value) in &self.extra {
            request = request.query(key, value);
        }
        request
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    /// A full page came back, so there may be another one.
    pub has_more: bool,
    /// Total count, when the backend reports one.
    pub total: Option<u64>,
}

/// Service for one resource family.
pub struct ResourceService<R: Resource> {
    gateway: AuthGateway,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(gateway: AuthGateway) -> Self {
        Self {
            gateway,
            _resource: PhantomData,
        }
    }

    /// Entries for one day (`GET {path}?date=YYYY-MM-DD`).
    pub async fn fetch_by_date(&self, date: NaiveDate) -> ApiResult<Vec<R::Entry>> {
        let request = ApiRequest::get(R::PATH).query("date", format_day(date));
        self.run(&request, |data| {
            let items = extract_list::<R::Entry>(data, R::LIST_KEY)?;
            tracing::debug!(resource = R::NAME, %date, count = items.len(), "Fetched entries");
            Ok(Some(items))
        })
        .await
    }

    /// Normalize the form input and create the entry.
    pub async fn create(&self, input: R::Input) -> ApiResult<R::Entry> {
        match R::normalize(input) {
            Ok(payload) => self.create_payload(&payload).await,
            Err(e) => ApiResult::fail(e.user_message()),
        }
    }

    /// Create from an already-normalized payload.
    pub async fn create_payload(&self, payload: &R::Payload) -> ApiResult<R::Entry> {
        let request = match to_body(payload) {
            Ok(body) => ApiRequest::post(R::PATH).json(body),
            Err(e) => return ApiResult::fail(e.user_message()),
        };
        self.run(&request, single_entry::<R::Entry>).await
    }

    /// Normalize the form input and replace the entry with id `id`.
    pub async fn update(&self, id: &str, input: R::Input) -> ApiResult<R::Entry> {
        let payload = match R::normalize(input) {
            Ok(payload) => payload,
            Err(e) => return ApiResult::fail(e.user_message()),
        };
        let request = match to_body(&payload) {
            Ok(body) => ApiRequest::put(item_path(R::PATH, id)).json(body),
            Err(e) => return ApiResult::fail(e.user_message()),
        };
        self.run(&request, single_entry::<R::Entry>).await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let request = ApiRequest::delete(item_path(R::PATH, id));
        let result = self.run(&request, |_| Ok(Some(()))).await;
        if result.success {
            tracing::info!(resource = R::NAME, id, "Entry deleted");
        }
        result
    }

    /// One page of the collection.
    pub async fn list_paged(&self, query: &PageQuery) -> ApiResult<Page<R::Entry>> {
        let request = query.to_request(R::PATH);
        let page = query.page;
        let limit = query.limit;

        self.run(&request, move |data| {
            let total = data.as_ref().and_then(total_of);
            let raw = raw_list(data, R::LIST_KEY)?;
            // Count what the server sent, not what decoded.
            let has_more = limit > 0 && raw.len() == limit as usize;
            let items = decode_items::<R::Entry>(raw);
            Ok(Some(Page {
                items,
                page,
                limit,
                has_more,
                total,
            }))
        })
        .await
    }

    /// Execute a request and fold every outcome into the envelope.
    ///
    /// `decode` may return `None` on success, e.g. for a create answered with
    /// a bare `{success: true}`.
    async fn run<T>(
        &self,
        request: &ApiRequest,
        decode: impl FnOnce(Option<serde_json::Value>) -> Result<Option<T>, AppError>,
    ) -> ApiResult<T> {
        let outcome = async {
            let body = self.gateway.execute(request).await?;
            let (data, message) = unwrap_envelope(body)?;
            Ok::<_, AppError>((decode(data)?, message))
        }
        .await;

        match outcome {
            Ok((data, message)) => ApiResult {
                success: true,
                message,
                data,
            },
            Err(e) => {
                tracing::warn!(
                    resource = R::NAME,
                    method = %request.method,
                    path = %request.path,
                    error = %e,
                    "Resource call failed"
                );
                ApiResult::fail(e.user_message())
            }
        }
    }
}

fn item_path(base: &str, id: &str) -> String {
    format!("{}/{}", base, urlencoding::encode(id))
}

fn to_body<P: Serialize>(payload: &P) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(payload)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode payload: {}", e)))
}

/// Split a response body into `(data, message)`.
///
/// Accepts the `{success, message, data}` wrapper or a bare body. A wrapper
/// saying `success: false` is a failure even on HTTP 2xx.
pub(crate) fn unwrap_envelope(
    body: serde_json::Value,
) -> Result<(Option<serde_json::Value>, String), AppError> {
    let is_wrapper = body
        .as_object()
        .is_some_and(|obj| obj.get("success").is_some_and(|s| s.is_boolean()));
    if !is_wrapper {
        let data = (!body.is_null()).then_some(body);
        return Ok((data, String::new()));
    }

    let envelope: ServerEnvelope = serde_json::from_value(body).map_err(|e| {
        tracing::warn!(error = %e, "Malformed response envelope");
        AppError::Transport(UNREADABLE_RESPONSE_MESSAGE.to_string())
    })?;
    let message = envelope.message.unwrap_or_default();

    if envelope.success == Some(false) {
        return Err(AppError::Server {
            status: 200,
            message: Some(message).filter(|m| !m.trim().is_empty()),
        });
    }

    Ok((envelope.data.filter(|d| !d.is_null()), message))
}

/// Pull a list out of `data`: a bare array, an object holding the array
/// under `list_key`, or nothing at all. Undecodable items are skipped.
pub(crate) fn extract_list<T: DeserializeOwned>(
    data: Option<serde_json::Value>,
    list_key: Option<&str>,
) -> Result<Vec<T>, AppError> {
    Ok(decode_items(raw_list(data, list_key)?))
}

fn raw_list(
    data: Option<serde_json::Value>,
    list_key: Option<&str>,
) -> Result<Vec<serde_json::Value>, AppError> {
    match data {
        None => Ok(Vec::new()),
        Some(serde_json::Value::Array(items)) => Ok(items),
        Some(serde_json::Value::Object(mut obj)) => {
            let nested = list_key
                .and_then(|key| obj.remove(key))
                .or_else(|| obj.remove("items"));
            match nested {
                Some(serde_json::Value::Array(items)) => Ok(items),
                Some(serde_json::Value::Null) | None => Ok(Vec::new()),
                Some(other) => Err(not_a_list(&other)),
            }
        }
        Some(other) => Err(not_a_list(&other)),
    }
}

fn decode_items<T: DeserializeOwned>(items: Vec<serde_json::Value>) -> Vec<T> {
    // One bad record should not hide the rest of the list.
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(index = i, error = %e, "Skipping undecodable list item");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        tracing::warn!(
            skipped = total - decoded.len(),
            total,
            "Some list items could not be read"
        );
    }
    decoded
}

fn single_entry<T: DeserializeOwned>(
    data: Option<serde_json::Value>,
) -> Result<Option<T>, AppError> {
    data.map(|value| {
        serde_json::from_value(value).map_err(|e| {
            tracing::warn!(error = %e, "Undecodable entry in response");
            AppError::Transport(UNREADABLE_RESPONSE_MESSAGE.to_string())
        })
    })
    .transpose()
}

fn total_of(data: &serde_json::Value) -> Option<u64> {
    data.get("total")
        .or_else(|| data.get("pagination").and_then(|p| p.get("total")))
        .and_then(|t| t.as_u64())
}

fn not_a_list(value: &serde_json::Value) -> AppError {
    tracing::warn!(kind = json_kind(value), "Expected a list in response");
    AppError::Transport(UNREADABLE_RESPONSE_MESSAGE.to_string())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
