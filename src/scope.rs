// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Screen-scoped cancellation.
//!
//! Each screen flow (log book, gym feed) owns a scope. Work started from the
//! screen runs through [`ScreenScope::run`]; once the screen is torn down the
//! scope is cancelled and pending results are dropped instead of committed.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct ScreenScope {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ScreenScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenScope {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Cancel the scope. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the scope is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only errors on a closed
        // channel, which cannot happen while we hold it.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Race `fut` against cancellation. `None` means the scope was cancelled
    /// first (or already was) and the result must not be committed.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = fut => Some(output),
        }
    }
}
