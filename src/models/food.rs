// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Normalized food search results.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Macros scaled to a 100 g reference serving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Per100 {
    pub kcal: f64,
    pub carbs_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
}

impl Per100 {
    /// True when all four macros are zero.
    pub fn is_empty(&self) -> bool {
        self.kcal == 0.0 && self.carbs_g == 0.0 && self.protein_g == 0.0 && self.fat_g == 0.0
    }

    pub fn rounded(&self) -> Per100 {
        Per100 {
            kcal: round1(self.kcal),
            carbs_g: round1(self.carbs_g),
            protein_g: round1(self.protein_g),
            fat_g: round1(self.fat_g),
        }
    }

    pub fn scaled(&self, factor: f64) -> Per100 {
        Per100 {
            kcal: self.kcal * factor,
            carbs_g: self.carbs_g * factor,
            protein_g: self.protein_g * factor,
            fat_g: self.fat_g * factor,
        }
    }
}

/// Round to one decimal place, halves toward positive infinity.
/// Non-finite input becomes zero.
pub fn round1(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 10.0 + 0.5).floor() / 10.0
}

/// A food search result. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FoodItem {
    pub name: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub fdc_id: u64,
    pub per100: Per100,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round1_rounds_half_up() {
        assert_eq!(round1(1.25), 1.3);
        assert_eq!(round1(399.96), 400.0);
        assert_eq!(round1(-1.25), -1.2);
        assert_eq!(round1(f64::NAN), 0.0);
    }

    #[test]
    fn empty_means_all_zero() {
        assert!(Per100::default().is_empty());
        assert!(!Per100 {
            fat_g: 0.1,
            ..Default::default()
        }
        .is_empty());
    }
}
