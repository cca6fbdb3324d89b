// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Intake log entries.

use crate::models::goals::MacroTotals;
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One logged food intake, stored under `users/{uid}/intake/{entry}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct IntakeEntry {
    /// When the food was eaten (Unix epoch milliseconds)
    pub ts: i64,
    #[serde(default)]
    pub kcal: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// FoodData Central ID when logged from a search result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub fdc_id: Option<u64>,
}

impl IntakeEntry {
    pub fn macros(&self) -> MacroTotals {
        MacroTotals {
            kcal: self.kcal,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

/// Sum the macros of a set of entries.
pub fn sum_macros<'a>(entries: impl IntoIterator<Item = &'a IntakeEntry>) -> MacroTotals {
    entries
        .into_iter()
        .fold(MacroTotals::default(), |mut acc, entry| {
            acc.accumulate(&entry.macros());
            acc
        })
}

/// Request body for logging an intake entry.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewIntakeEntry {
    /// Defaults to the current time.
    pub ts: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub kcal: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub protein: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub carbs: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub fat: f64,
    #[validate(length(max = 200))]
    pub name: Option<String>,
    pub fdc_id: Option<u64>,
}

impl NewIntakeEntry {
    pub fn into_entry(self, now_millis: i64) -> IntakeEntry {
        IntakeEntry {
            ts: self.ts.unwrap_or(now_millis),
            kcal: self.kcal,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
            name: self.name,
            fdc_id: self.fdc_id,
        }
    }
}
