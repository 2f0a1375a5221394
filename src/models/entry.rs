// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Locally tracked resource entries.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Prefix of client-assigned ids for entries the server has not seen yet.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Notice attached to entries whose sync failed.
pub const SYNC_FAILED_NOTICE: &str = "Saved locally, sync failed";

/// A value the server identifies by id once persisted.
pub trait Identified {
    /// Server-assigned id, if the value carries one.
    fn server_id(&self) -> Option<&str>;
}

/// Whether an id was assigned by the client.
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

/// Sync state of a visible entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Exists locally only; a sync is in flight.
    Pending,
    /// Confirmed by the server.
    Synced,
    /// Sync failed; kept locally and flagged.
    Failed,
}

/// An entry in a visible list together with its sync bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntry<T> {
    /// Current key: the server id once synced, the local id before.
    pub key: String,
    /// The temporary id this entry was created under, if any.
    pub local_id: Option<String>,
    pub status: SyncStatus,
    /// Why the last sync failed.
    pub sync_error: Option<String>,
    pub value: T,
}

impl<T> TrackedEntry<T> {
    pub fn is_local(&self) -> bool {
        is_local_id(&self.key)
    }

    /// Warning to show next to the entry, if any.
    pub fn notice(&self) -> Option<String> {
        match (&self.status, &self.sync_error) {
            (SyncStatus::Failed, Some(err)) if !err.is_empty() => {
                Some(format!("{}: {}", SYNC_FAILED_NOTICE, err))
            }
            (SyncStatus::Failed, _) => Some(SYNC_FAILED_NOTICE.to_string()),
            _ => None,
        }
    }
}
