// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily macro goals, totals, progress and tips.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Four macro quantities: calories plus grams of protein, carbs and fat.
///
/// Used both for goal targets and for summed intake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MacroTotals {
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
}

impl MacroTotals {
    /// Add another set of macros into this one.
    pub fn accumulate(&mut self, other: &MacroTotals) {
        self.kcal += other.kcal;
        self.protein += other.protein;
        self.carbs += other.carbs;
        self.fat += other.fat;
    }
}

/// Goals document stored at `users/{uid}/settings/goals`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Goals {
    #[serde(default)]
    pub daily: MacroTotals,
}

/// Partial goals update. Present fields replace the stored ones.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GoalsPatch {
    #[validate(nested)]
    pub daily: Option<MacroTotals>,
}

impl Goals {
    /// Shallow merge: each field present in `patch` replaces ours.
    pub fn merged(self, patch: &GoalsPatch) -> Goals {
        Goals {
            daily: patch.daily.unwrap_or(self.daily),
        }
    }

    /// Per-macro completion percentages against the daily targets.
    pub fn progress(&self, totals: &MacroTotals) -> Progress {
        let g = &self.daily;
        Progress {
            kcal: percent(totals.kcal, g.kcal),
            protein: percent(totals.protein, g.protein),
            carbs: percent(totals.carbs, g.carbs),
            fat: percent(totals.fat, g.fat),
        }
    }

    /// Advice strings for the day so far. A macro with no target gets none.
    pub fn tips(&self, totals: &MacroTotals) -> Vec<&'static str> {
        let g = &self.daily;
        let t = totals;
        let mut tips = Vec::new();

        if g.kcal != 0.0 {
            if t.kcal < g.kcal * 0.85 {
                tips.push("Calories below 85% — consider an extra snack.");
            }
            if t.kcal > g.kcal * 1.10 {
                tips.push("Calories exceed 110% — go lighter next meal.");
            }
        }
        if g.protein != 0.0 && t.protein < g.protein {
            tips.push("Protein below target — add tofu/lean meat/yogurt.");
        }
        if g.carbs != 0.0 && t.carbs < g.carbs * 0.8 {
            tips.push("Carbs low — whole grains or fruit can help.");
        }
        if g.fat != 0.0 && t.fat > g.fat * 1.2 {
            tips.push("Fat >120% — reduce oils/high-fat toppings.");
        }

        tips
    }
}

/// Completion percentages, each in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Progress {
    pub kcal: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

/// `round(value / target * 100)` capped at 100; zero when there is no target.
pub fn percent(value: f64, target: f64) -> u32 {
    if target == 0.0 || !target.is_finite() {
        return 0;
    }
    let pct = (value / target * 100.0 + 0.5).floor();
    pct.clamp(0.0, 100.0) as u32
}
