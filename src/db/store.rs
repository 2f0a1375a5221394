// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistent key-value store for the device.
//!
//! Values are JSON documents keyed by string. The whole map is held in memory
//! and flushed to a single JSON file on every write, which is plenty for the
//! handful of keys the client keeps (credential, last fix, profile snapshot).

use crate::error::AppError;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Device key-value store.
#[derive(Clone)]
pub struct DeviceStore {
    entries: Arc<DashMap<String, serde_json::Value>>,
    /// Backing file; `None` keeps everything in memory.
    path: Option<Arc<PathBuf>>,
    /// Serializes file writes so two flushes never interleave.
    write_lock: Arc<Mutex<()>>,
}

impl DeviceStore {
    /// Open (or create) a store backed by the JSON file at `path`.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();
        let entries = DashMap::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(content) if !content.trim().is_empty() => {
                let map: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content)
                    .map_err(|e| {
                        AppError::Storage(format!("Corrupt store file {}: {}", path.display(), e))
                    })?;
                for (k, v) in map {
                    entries.insert(k, v);
                }
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened device store");

        Ok(Self {
            entries: Arc::new(entries),
            path: Some(Arc::new(path)),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create an in-memory store for testing (nothing touches disk).
    pub fn new_mock() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            path: None,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Read and deserialize a value. Undecodable values read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?.value().clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring undecodable stored value");
                None
            }
        }
    }

    /// Store a value and flush.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let value = serde_json::to_value(value)
            .map_err(|e| AppError::Storage(format!("Failed to encode {}: {}", key, e)))?;
        self.entries.insert(key.to_string(), value);
        self.flush().await
    }

    /// Remove a value and flush. Removing a missing key is not an error.
    pub async fn remove(&self, key: &str) -> Result<(), AppError> {
        if self.entries.remove(key).is_some() {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let _guard = self.write_lock.lock().await;

        // Sorted keys keep the file stable across writes.
        let snapshot: BTreeMap<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let content = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| AppError::Storage(format!("Failed to encode store: {}", e)))?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", dir.display(), e)))?;
        }

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path.as_ref())
            .await
            .map_err(|e| AppError::Storage(format!("Failed to replace {}: {}", path.display(), e)))?;

        Ok(())
    }
}
