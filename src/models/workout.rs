// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout session model.

use crate::error::AppError;
use crate::models::entry::Identified;
use crate::models::normalize::{coerce_count, coerce_number, non_empty};
use crate::services::resource::Resource;
use crate::time_utils::{format_day, today};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Workout type used when the form leaves it blank.
pub const DEFAULT_WORKOUT_TYPE: &str = "general";

/// One exercise row of the session form.
#[derive(Debug, Clone, Default)]
pub struct ExerciseInput {
    pub name: String,
    pub sets: String,
    pub reps: String,
    pub weight_kg: String,
}

/// What the user typed into the log-workout form.
#[derive(Debug, Clone, Default)]
pub struct WorkoutInput {
    pub name: String,
    pub workout_type: Option<String>,
    pub duration_minutes: String,
    pub calories_burned: String,
    pub exercises: Vec<ExerciseInput>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// A performed exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub sets: u32,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub weight_kg: f64,
}

/// Normalized create/update body for `/workouts/auth0/sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPayload {
    #[validate(length(min = 1, message = "Workout name is required"))]
    pub name: String,
    pub workout_type: String,
    #[validate(range(max = 1440, message = "Duration must be at most 24 hours"))]
    pub duration_minutes: u32,
    #[validate(range(min = 0.0, max = 10000.0, message = "Calories burned must be between 0 and 10000"))]
    pub calories_burned: f64,
    pub exercises: Vec<Exercise>,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A logged workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default = "default_workout_type")]
    pub workout_type: String,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub calories_burned: f64,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_workout_type() -> String {
    DEFAULT_WORKOUT_TYPE.to_string()
}

impl Identified for WorkoutSession {
    fn server_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Workout session resource family.
pub struct WorkoutSessions;

impl Resource for WorkoutSessions {
    type Entry = WorkoutSession;
    type Input = WorkoutInput;
    type Payload = WorkoutPayload;

    const NAME: &'static str = "workout";
    const PATH: &'static str = "/workouts/auth0/sessions";
    const LIST_KEY: Option<&'static str> = Some("sessions");

    fn normalize(input: WorkoutInput) -> Result<WorkoutPayload, AppError> {
        let exercises = input
            .exercises
            .into_iter()
            .filter(|e| !e.name.trim().is_empty())
            .map(|e| Exercise {
                name: e.name.trim().to_string(),
                sets: coerce_count(&e.sets),
                reps: coerce_count(&e.reps),
                weight_kg: coerce_number(&e.weight_kg).max(0.0),
            })
            .collect();

        let payload = WorkoutPayload {
            name: input.name.trim().to_string(),
            workout_type: non_empty(input.workout_type)
                .map(|t| t.to_ascii_lowercase())
                .unwrap_or_else(default_workout_type),
            duration_minutes: coerce_count(&input.duration_minutes),
            calories_burned: coerce_number(&input.calories_burned),
            exercises,
            date: format_day(input.date.unwrap_or_else(today)),
            notes: non_empty(input.notes),
        };
        payload.validate()?;
        Ok(payload)
    }

    fn draft(payload: &WorkoutPayload) -> WorkoutSession {
        WorkoutSession {
            id: None,
            name: payload.name.clone(),
            workout_type: payload.workout_type.clone(),
            duration_minutes: payload.duration_minutes,
            calories_burned: payload.calories_burned,
            exercises: payload.exercises.clone(),
            date: Some(payload.date.clone()),
            notes: payload.notes.clone(),
        }
    }

    fn payload_of(entry: &WorkoutSession) -> WorkoutPayload {
        WorkoutPayload {
            name: entry.name.clone(),
            workout_type: entry.workout_type.clone(),
            duration_minutes: entry.duration_minutes,
            calories_burned: entry.calories_burned,
            exercises: entry.exercises.clone(),
            date: entry.date.clone().unwrap_or_else(|| format_day(today())),
            notes: entry.notes.clone(),
        }
    }
}
