// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local-state reconciler.
//!
//! Keeps the visible list consistent with optimistic local edits and server
//! truth. Every mutation is keyed by entry key, so completions arriving out of
//! order only touch their own entry. Entries the server has not confirmed are
//! never dropped by a refresh.

use crate::models::entry::{Identified, LOCAL_ID_PREFIX};
use crate::models::{ApiResult, SyncStatus, TrackedEntry};
use crate::time_utils::now_epoch_ms;
use std::collections::{HashMap, HashSet};

/// Visible list of entries with their sync state, newest first.
#[derive(Debug, Clone)]
pub struct Reconciler<T> {
    entries: Vec<TrackedEntry<T>>,
    /// Last timestamp handed out for a local key.
    last_local_ms: i64,
    /// Entries removed while their create was in flight: key -> former index.
    withdrawn: HashMap<String, usize>,
}

impl<T> Default for Reconciler<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            last_local_ms: 0,
            withdrawn: HashMap::new(),
        }
    }
}

impl<T: Identified + Clone> Reconciler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a pending entry under a fresh local key and return the key.
    pub fn insert_optimistic(&mut self, value: T) -> String {
        let key = self.next_local_key();
        self.entries.insert(
            0,
            TrackedEntry {
                key: key.clone(),
                local_id: Some(key.clone()),
                status: SyncStatus::Pending,
                sync_error: None,
                value,
            },
        );
        tracing::debug!(key = %key, "Optimistic insert");
        key
    }

    /// `local-<epoch_ms>`, bumped past the last key so two inserts in the
    /// same millisecond still get distinct keys.
    fn next_local_key(&mut self) -> String {
        let ms = now_epoch_ms().max(self.last_local_ms + 1);
        self.last_local_ms = ms;
        format!("{}{}", LOCAL_ID_PREFIX, ms)
    }

    /// Apply the outcome of a sync for the entry under `key`.
    ///
    /// Returns false when the entry is gone (deleted or dropped meanwhile),
    /// in which case nothing changes.
    pub fn reconcile(&mut self, key: &str, result: &ApiResult<T>) -> bool {
        let Some(index) = self.position(key) else {
            tracing::debug!(key, "Sync finished for an entry no longer listed");
            return false;
        };

        if !result.success {
            let entry = &mut self.entries[index];
            entry.status = SyncStatus::Failed;
            entry.sync_error = Some(result.message.clone()).filter(|m| !m.is_empty());
            tracing::warn!(key, error = %result.message, "Sync failed, keeping local copy");
            return true;
        }

        let server = result.data.as_ref();
        let server_id = server.and_then(|v| v.server_id()).map(str::to_string);

        // A refresh may have listed the server copy before this create
        // completed; keep that one and drop the optimistic copy.
        if let Some(id) = &server_id {
            let duplicate = self
                .entries
                .iter()
                .enumerate()
                .any(|(i, e)| i != index && e.key == *id);
            if duplicate {
                self.entries.remove(index);
                tracing::debug!(key, server_id = %id, "Dropped optimistic duplicate");
                return true;
            }
        }

        let entry = &mut self.entries[index];
        if let Some(value) = server {
            entry.value = value.clone();
        }
        if let Some(id) = server_id {
            entry.key = id;
        }
        entry.status = SyncStatus::Synced;
        entry.sync_error = None;
        tracing::debug!(local_key = key, key = %entry.key, "Entry synced");
        true
    }

    /// Replace the synced part of the list with the server's view.
    ///
    /// Pending and failed entries stay on top, in their current order.
    /// Server items without an id get a derived key so they still display.
    pub fn merge_server(&mut self, items: Vec<T>) {
        let mut kept: Vec<TrackedEntry<T>> = self
            .entries
            .drain(..)
            .filter(|e| e.status != SyncStatus::Synced)
            .collect();

        let mut seen: HashSet<String> = HashSet::new();
        let mut merged = Vec::with_capacity(items.len());
        for (i, value) in items.into_iter().enumerate() {
            let key = match value.server_id() {
                Some(id) => id.to_string(),
                None => format!("server-{}", i),
            };
            if !seen.insert(key.clone()) {
                continue;
            }
            merged.push(TrackedEntry {
                key,
                local_id: None,
                status: SyncStatus::Synced,
                sync_error: None,
                value,
            });
        }

        // Kept entries whose server copy just arrived are no longer unsynced.
        kept.retain(|e| !seen.contains(&e.key));
        let unsynced = kept.len();
        kept.extend(merged);
        self.entries = kept;
        tracing::debug!(total = self.entries.len(), unsynced, "Merged server entries");
    }

    /// Remove the entry immediately, returning it with its former index.
    ///
    /// A pending local entry is remembered as withdrawn so the create still
    /// in flight can be undone once it lands.
    pub fn remove(&mut self, key: &str) -> Option<(usize, TrackedEntry<T>)> {
        let index = self.position(key)?;
        let entry = self.entries.remove(index);
        if entry.status == SyncStatus::Pending && entry.is_local() {
            tracing::debug!(key, "Pending entry withdrawn");
            self.withdrawn.insert(entry.key.clone(), index);
        }
        Some((index, entry))
    }

    /// Former index of an entry removed while its create was in flight.
    /// Clears the mark.
    pub fn take_withdrawn(&mut self, key: &str) -> Option<usize> {
        self.withdrawn.remove(key)
    }

    /// Put a removed entry back at (or as close as possible to) `index`.
    pub fn restore(&mut self, index: usize, entry: TrackedEntry<T>) {
        if self.position(&entry.key).is_some() {
            return;
        }
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
    }

    /// Mark an entry pending again ahead of a resubmission.
    pub fn mark_pending(&mut self, key: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.status = SyncStatus::Pending;
                entry.sync_error = None;
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[TrackedEntry<T>] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&TrackedEntry<T>> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }
}
