// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the client.

pub mod diet;
pub mod entry;
pub mod envelope;
pub mod gym;
pub mod location;
pub mod normalize;
pub mod stats;
pub mod user;
pub mod workout;

pub use diet::{DietLogs, MealInput, MealLog, MealPayload, MealType};
pub use entry::{Identified, SyncStatus, TrackedEntry};
pub use envelope::ApiResult;
pub use gym::{Gym, GymInput, GymListing, GymPricing, Gyms};
pub use location::{Coordinates, LocationFix, PermissionRecord};
pub use stats::{NutritionStats, WorkoutSummary};
pub use user::{SessionCredential, UserProfile};
pub use workout::{Exercise, ExerciseInput, WorkoutInput, WorkoutSession, WorkoutSessions};
