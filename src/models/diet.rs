// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Diet log model: raw form input, normalized payload, stored meal.

use crate::error::AppError;
use crate::models::entry::Identified;
use crate::models::normalize::{coerce_number, non_empty};
use crate::services::resource::Resource;
use crate::time_utils::{format_day, today};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Meal slot within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MealType {
    #[default]
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    /// Parse free text; anything unrecognized is breakfast.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            "snack" | "snacks" => MealType::Snack,
            _ => MealType::Breakfast,
        }
    }
}

impl From<String> for MealType {
    fn from(s: String) -> Self {
        MealType::parse_or_default(&s)
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// What the user typed into the custom-meal form.
#[derive(Debug, Clone, Default)]
pub struct MealInput {
    pub meal_name: String,
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
    pub meal_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Normalized create/update body for `/diet/auth0/logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MealPayload {
    #[validate(length(min = 1, message = "Meal name is required"))]
    pub meal_name: String,
    #[validate(range(min = 0.0, max = 10000.0, message = "Calories must be between 0 and 10000"))]
    pub calories: f64,
    #[validate(range(min = 0.0, max = 1000.0, message = "Protein must be between 0 and 1000 g"))]
    pub protein: f64,
    #[validate(range(min = 0.0, max = 1000.0, message = "Carbs must be between 0 and 1000 g"))]
    pub carbs: f64,
    #[validate(range(min = 0.0, max = 1000.0, message = "Fat must be between 0 and 1000 g"))]
    pub fat: f64,
    pub meal_type: MealType,
    /// Day the meal belongs to (`YYYY-MM-DD`)
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A logged meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct MealLog {
    /// Server id (absent until persisted)
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub meal_name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub meal_type: MealType,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub logged_at: Option<DateTime<Utc>>,
}

impl Identified for MealLog {
    fn server_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Diet log resource family.
pub struct DietLogs;

impl Resource for DietLogs {
    type Entry = MealLog;
    type Input = MealInput;
    type Payload = MealPayload;

    const NAME: &'static str = "diet";
    const PATH: &'static str = "/diet/auth0/logs";
    const LIST_KEY: Option<&'static str> = Some("logs");

    fn normalize(input: MealInput) -> Result<MealPayload, AppError> {
        let payload = MealPayload {
            meal_name: input.meal_name.trim().to_string(),
            calories: coerce_number(&input.calories),
            protein: coerce_number(&input.protein),
            carbs: coerce_number(&input.carbs),
            fat: coerce_number(&input.fat),
            meal_type: input
                .meal_type
                .as_deref()
                .map(MealType::parse_or_default)
                .unwrap_or_default(),
            date: format_day(input.date.unwrap_or_else(today)),
            notes: non_empty(input.notes),
        };
        payload.validate()?;
        Ok(payload)
    }

    fn draft(payload: &MealPayload) -> MealLog {
        MealLog {
            id: None,
            meal_name: payload.meal_name.clone(),
            calories: payload.calories,
            protein: payload.protein,
            carbs: payload.carbs,
            fat: payload.fat,
            meal_type: payload.meal_type,
            date: Some(payload.date.clone()),
            notes: payload.notes.clone(),
            logged_at: Some(Utc::now()),
        }
    }

    fn payload_of(entry: &MealLog) -> MealPayload {
        MealPayload {
            meal_name: entry.meal_name.clone(),
            calories: entry.calories,
            protein: entry.protein,
            carbs: entry.carbs,
            fat: entry.fat,
            meal_type: entry.meal_type,
            date: entry.date.clone().unwrap_or_else(|| format_day(today())),
            notes: entry.notes.clone(),
        }
    }
}
