// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, Utc};

/// Current time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a calendar day the way the backend keys daily logs (`YYYY-MM-DD`).
pub fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Age of an epoch-millisecond timestamp relative to `now`.
pub fn age_of(captured_at_epoch_ms: i64, now: DateTime<Utc>) -> chrono::Duration {
    chrono::Duration::milliseconds(now.timestamp_millis() - captured_at_epoch_ms)
}
