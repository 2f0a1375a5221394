// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Log book: the diet and workout screen flow.
//!
//! Ties a resource service to a reconciler and a screen scope. Submissions
//! show up in the list before the network is touched; syncs run as spawned
//! tasks that commit only while the scope is live.

use crate::config::DeletePolicy;
use crate::error::AppError;
use crate::models::entry::{is_local_id, Identified};
use crate::models::{
    ApiResult, DietLogs, NutritionStats, SyncStatus, TrackedEntry, WorkoutSessions,
    WorkoutSummary,
};
use crate::scope::ScreenScope;
use crate::services::reconciler::Reconciler;
use crate::services::resource::{Resource, ResourceService};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Handle to a sync running in the background.
pub struct PendingSync<T> {
    key: String,
    handle: JoinHandle<Option<ApiResult<T>>>,
}

impl<T> PendingSync<T> {
    /// Key of the entry being synced (the local key for creates).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Wait for the sync. `None` if the screen went away first.
    pub async fn wait(self) -> Option<ApiResult<T>> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Sync task did not complete");
                None
            }
        }
    }
}

/// Visible list for one resource family.
pub struct LogBook<R: Resource> {
    service: ResourceService<R>,
    state: Arc<Mutex<Reconciler<R::Entry>>>,
    scope: ScreenScope,
    delete_policy: DeletePolicy,
}

impl<R: Resource> LogBook<R> {
    pub fn new(service: ResourceService<R>, delete_policy: DeletePolicy) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(Reconciler::new())),
            scope: ScreenScope::new(),
            delete_policy,
        }
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    /// Fetch a day's entries and merge them under the unsynced ones.
    ///
    /// On failure the current list is left alone and returned as stale data
    /// alongside the error message.
    pub async fn load(&self, date: NaiveDate) -> ApiResult<Vec<TrackedEntry<R::Entry>>> {
        let Some(result) = self.scope.run(self.service.fetch_by_date(date)).await else {
            return ApiResult::fail("Cancelled");
        };

        let mut state = self.state.lock().await;
        if !result.success {
            tracing::warn!(resource = R::NAME, %date, error = %result.message, "Load failed, showing cached entries");
            return ApiResult::stale(Some(state.entries().to_vec()), result.message);
        }
        if self.scope.is_cancelled() {
            return ApiResult::fail("Cancelled");
        }

        state.merge_server(result.data.unwrap_or_default());
        ApiResult::ok(state.entries().to_vec(), result.message)
    }

    /// Validate, insert optimistically and start the sync.
    ///
    /// A validation error returns right away with nothing inserted.
    pub async fn submit(&self, input: R::Input) -> Result<PendingSync<R::Entry>, AppError> {
        let payload = R::normalize(input)?;
        let key = self.state.lock().await.insert_optimistic(R::draft(&payload));
        tracing::info!(resource = R::NAME, key = %key, "Entry submitted");
        Ok(self.spawn_create(key, payload))
    }

    /// Retry the sync of a failed local entry.
    ///
    /// Returns `None` when there is no such entry or it is not a failed
    /// local one.
    pub async fn resubmit(&self, key: &str) -> Option<PendingSync<R::Entry>> {
        let payload = {
            let mut state = self.state.lock().await;
            let entry = state.get(key)?;
            if entry.status != SyncStatus::Failed || !is_local_id(&entry.key) {
                return None;
            }
            let payload = R::payload_of(&entry.value);
            state.mark_pending(key);
            payload
        };
        tracing::info!(resource = R::NAME, key, "Resubmitting entry");
        Some(self.spawn_create(key.to_string(), payload))
    }

    fn spawn_create(&self, key: String, payload: R::Payload) -> PendingSync<R::Entry> {
        let service = self.service.clone();
        let state = self.state.clone();
        let scope = self.scope.clone();
        let policy = self.delete_policy;
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let result = scope.run(service.create_payload(&payload)).await?;
            let withdrawn = {
                let mut state = state.lock().await;
                if scope.is_cancelled() {
                    return None;
                }
                if state.reconcile(&task_key, &result) {
                    return Some(result);
                }
                state.take_withdrawn(&task_key)
            };

            // Deleted while the create was in flight: undo it server-side.
            let created = result.data.as_ref().filter(|_| result.success);
            if let (Some(index), Some(entry)) = (withdrawn, created) {
                if let Some(id) = entry.server_id().map(str::to_string) {
                    // A refresh may already have listed the server copy.
                    state.lock().await.remove(&id);
                    tracing::info!(resource = R::NAME, key = %task_key, id = %id, "Deleting entry created after removal");
                    let removed = TrackedEntry {
                        key: id.clone(),
                        local_id: Some(task_key.clone()),
                        status: SyncStatus::Synced,
                        sync_error: None,
                        value: entry.clone(),
                    };
                    delete_remote(&service, &state, &scope, policy, index, removed).await;
                }
            }
            Some(result)
        });

        PendingSync { key, handle }
    }

    /// Remove an entry from the list now and delete it server-side in the
    /// background.
    ///
    /// Returns the background delete, or `None` when nothing was sent (no
    /// such entry, or it only ever existed locally).
    pub async fn delete(&self, key: &str) -> Option<PendingSync<()>> {
        let (index, entry) = self.state.lock().await.remove(key)?;
        tracing::info!(resource = R::NAME, key, "Entry removed");

        if is_local_id(&entry.key) {
            return None;
        }

        let service = self.service.clone();
        let state = self.state.clone();
        let scope = self.scope.clone();
        let policy = self.delete_policy;

        let handle = tokio::spawn(async move {
            delete_remote(&service, &state, &scope, policy, index, entry).await
        });

        Some(PendingSync {
            key: key.to_string(),
            handle,
        })
    }

    /// Snapshot of the visible list, newest first.
    pub async fn entries(&self) -> Vec<TrackedEntry<R::Entry>> {
        self.state.lock().await.entries().to_vec()
    }

    pub async fn get(&self, key: &str) -> Option<TrackedEntry<R::Entry>> {
        self.state.lock().await.get(key).cloned()
    }
}

/// Delete `entry` server-side, putting it back at `index` as failed when the
/// policy asks for it.
async fn delete_remote<R: Resource>(
    service: &ResourceService<R>,
    state: &Mutex<Reconciler<R::Entry>>,
    scope: &ScreenScope,
    policy: DeletePolicy,
    index: usize,
    entry: TrackedEntry<R::Entry>,
) -> Option<ApiResult<()>> {
    let result = scope.run(service.delete(&entry.key)).await?;
    if !result.success {
        tracing::warn!(resource = R::NAME, id = %entry.key, error = %result.message, "Server delete failed");
        if policy == DeletePolicy::RestoreOnFailure && !scope.is_cancelled() {
            let mut restored = entry;
            restored.status = SyncStatus::Failed;
            restored.sync_error = Some(result.message.clone()).filter(|m| !m.is_empty());
            state.lock().await.restore(index, restored);
        }
    }
    Some(result)
}

impl LogBook<DietLogs> {
    /// Totals over every visible meal, synced or not.
    pub async fn stats(&self) -> NutritionStats {
        NutritionStats::from_entries(self.state.lock().await.entries())
    }
}

impl LogBook<WorkoutSessions> {
    pub async fn summary(&self) -> WorkoutSummary {
        WorkoutSummary::from_entries(self.state.lock().await.entries())
    }
}

impl<R: Resource> Drop for LogBook<R> {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
