// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device-local persistence.

pub mod store;

pub use store::DeviceStore;

/// Store keys as constants.
pub mod keys {
    pub const SESSION_CREDENTIAL: &str = "session.credential";
    pub const LOCATION_FIX: &str = "location.lastFix";
    pub const LOCATION_PERMISSION: &str = "location.permission";
    pub const PROFILE_SNAPSHOT: &str = "profile.snapshot";
}
