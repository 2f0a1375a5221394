// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily aggregates shown above the diet and workout lists.
//!
//! Computed from every visible entry, synced or not, so a meal the user just
//! typed counts toward today's totals even while its sync is pending.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{MealLog, TrackedEntry, WorkoutSession};

/// Nutrition totals for a day's meals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionStats {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub meal_count: u32,
    /// Calories per meal type ("breakfast", "lunch", ...)
    #[serde(default)]
    pub calories_by_meal_type: HashMap<String, f64>,
    /// Meals not yet confirmed by the server
    #[serde(default)]
    pub unsynced_count: u32,
}

impl NutritionStats {
    pub fn from_entries(entries: &[TrackedEntry<MealLog>]) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            stats.add(&entry.value);
            if entry.status != crate::models::SyncStatus::Synced {
                stats.unsynced_count += 1;
            }
        }
        stats
    }

    fn add(&mut self, meal: &MealLog) {
        self.total_calories += meal.calories;
        self.total_protein += meal.protein;
        self.total_carbs += meal.carbs;
        self.total_fat += meal.fat;
        self.meal_count += 1;
        *self
            .calories_by_meal_type
            .entry(meal.meal_type.as_str().to_string())
            .or_insert(0.0) += meal.calories;
    }
}

/// Workout totals for a day's sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    pub total_sessions: u32,
    pub total_minutes: u32,
    pub total_calories_burned: f64,
    pub total_sets: u32,
    /// Session count per workout type
    #[serde(default)]
    pub sessions_by_type: HashMap<String, u32>,
}

impl WorkoutSummary {
    pub fn from_entries(entries: &[TrackedEntry<WorkoutSession>]) -> Self {
        let mut summary = Self::default();
        for session in entries.iter().map(|e| &e.value) {
            summary.total_sessions += 1;
            summary.total_minutes += session.duration_minutes;
            summary.total_calories_burned += session.calories_burned;
            summary.total_sets += session.exercises.iter().map(|e| e.sets).sum::<u32>();
            *summary
                .sessions_by_type
                .entry(session.workout_type.clone())
                .or_insert(0) += 1;
        }
        summary
    }
}
