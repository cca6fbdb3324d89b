// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-100 g macro estimates from FoodData Central records.
//!
//! Records come in several shapes depending on data type. Foundation and
//! SR Legacy foods carry per-100 g `foodNutrients`; branded foods often
//! carry only per-serving `labelNutrients` plus a serving size.

use crate::models::{FoodItem, Per100};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

/// Nutrient numbers used for the four macros.
pub mod codes {
    pub const ENERGY_KCAL: &str = "1008";
    pub const CARBOHYDRATE: &str = "1005";
    pub const PROTEIN: &str = "1003";
    pub const FAT: &str = "1004";
}

const GRAMS_PER_OZ: f64 = 28.3495;
const GRAMS_PER_FL_OZ: f64 = 29.5735;

static HOUSEHOLD_SERVING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9.]+)\s*(g|ml|oz|fl\s*oz)").expect("household serving pattern is valid")
});

/// A food record as returned by `/foods/search` or `/food/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodRecord {
    pub fdc_id: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lowercase_description: Option<String>,
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub food_nutrients: Option<Vec<FoodNutrientEntry>>,
    #[serde(default)]
    pub label_nutrients: Option<LabelNutrients>,
    /// Number or numeric string.
    #[serde(default)]
    pub serving_size: Option<Value>,
    #[serde(default)]
    pub serving_size_unit: Option<String>,
    #[serde(default)]
    pub household_serving_full_text: Option<String>,
}

/// One entry of `foodNutrients`.
///
/// Search results put the code in `nutrientNumber` and the quantity in
/// `value`; detail records nest it under `nutrient` with an `amount`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrientEntry {
    #[serde(default)]
    pub nutrient: Option<NutrientRef>,
    #[serde(default)]
    pub nutrient_number: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NutrientRef {
    #[serde(default)]
    pub number: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
}

/// Per-serving label values on branded foods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelNutrients {
    #[serde(default)]
    pub calories: Option<LabelValue>,
    #[serde(default)]
    pub carbohydrates: Option<LabelValue>,
    #[serde(default)]
    pub protein: Option<LabelValue>,
    #[serde(default)]
    pub fat: Option<LabelValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelValue {
    #[serde(default)]
    pub value: Option<Value>,
}

impl LabelValue {
    fn number(&self) -> f64 {
        self.value.as_ref().and_then(loose_number).unwrap_or(0.0)
    }
}

/// Numeric and string codes compare equal (`1008` == `"1008"`).
fn code_matches(candidate: Option<&Value>, code: &str) -> bool {
    match candidate {
        Some(Value::String(s)) => s.trim() == code,
        Some(Value::Number(n)) => match (n.as_f64(), code.parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => false,
        },
        _ => false,
    }
}

impl FoodNutrientEntry {
    fn has_code(&self, code: &str) -> bool {
        let nested = self.nutrient.as_ref();
        code_matches(nested.and_then(|n| n.number.as_ref()), code)
            || code_matches(nested.and_then(|n| n.id.as_ref()), code)
            || code_matches(self.nutrient_number.as_ref(), code)
    }

    /// `amount` if numeric, else `value` if numeric, else zero.
    fn quantity(&self) -> f64 {
        self.amount
            .as_ref()
            .and_then(Value::as_f64)
            .or_else(|| self.value.as_ref().and_then(Value::as_f64))
            .unwrap_or(0.0)
    }
}

/// Quantity of the first nutrient entry with `code`, or zero.
pub fn nutrient_amount(entries: &[FoodNutrientEntry], code: &str) -> f64 {
    entries
        .iter()
        .find(|entry| entry.has_code(code))
        .map(FoodNutrientEntry::quantity)
        .unwrap_or(0.0)
}

/// Macros from `foodNutrients`, if any of them is non-zero.
pub fn direct_per100(record: &FoodRecord) -> Option<Per100> {
    let entries = record.food_nutrients.as_deref().unwrap_or_default();
    let per100 = Per100 {
        kcal: nutrient_amount(entries, codes::ENERGY_KCAL),
        carbs_g: nutrient_amount(entries, codes::CARBOHYDRATE),
        protein_g: nutrient_amount(entries, codes::PROTEIN),
        fat_g: nutrient_amount(entries, codes::FAT),
    };
    (!per100.is_empty()).then_some(per100)
}

/// Grams in one serving, from the declared size or the household text.
pub fn grams_per_serving(record: &FoodRecord) -> Option<f64> {
    let size = record
        .serving_size
        .as_ref()
        .and_then(loose_number)
        .unwrap_or(0.0);

    if size != 0.0 {
        let unit = record.serving_size_unit.as_deref().unwrap_or_default();
        if let Some(factor) = unit_factor(unit) {
            return Some(size * factor);
        }
    }

    let text = record.household_serving_full_text.as_deref()?;
    let caps = HOUSEHOLD_SERVING.captures(text)?;
    let qty = parse_leading_float(&caps[1])?;
    let grams = qty * unit_factor(&caps[2])?;
    (grams != 0.0).then_some(grams)
}

/// Grams per unit. Volumes assume the density of water.
fn unit_factor(unit: &str) -> Option<f64> {
    let unit: String = unit
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match unit.as_str() {
        "g" | "grm" => Some(1.0),
        "ml" | "mlt" => Some(1.0),
        "oz" => Some(GRAMS_PER_OZ),
        "floz" => Some(GRAMS_PER_FL_OZ),
        _ => None,
    }
}

/// Longest numeric prefix of `s` (`"1.5.2"` parses as 1.5).
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let mut seen_dot = false;
    let end = s
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                false
            } else {
                !c.is_ascii_digit()
            }
        })
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Per-100 g macros derived from the label and the serving size.
pub fn per100_from_label(record: &FoodRecord) -> Option<Per100> {
    let grams = grams_per_serving(record)?;
    let label = record.label_nutrients.as_ref()?;

    let field = |v: &Option<LabelValue>| v.as_ref().map(LabelValue::number).unwrap_or(0.0);
    let per_serving = Per100 {
        kcal: field(&label.calories),
        carbs_g: field(&label.carbohydrates),
        protein_g: field(&label.protein),
        fat_g: field(&label.fat),
    };
    if per_serving.is_empty() {
        return None;
    }

    Some(per_serving.scaled(100.0 / grams))
}

/// Estimate without any further lookups: direct nutrients, then the label.
pub fn estimate_per100(record: &FoodRecord) -> Option<Per100> {
    direct_per100(record).or_else(|| per100_from_label(record))
}

/// First non-empty of description, lowercase description, ingredients.
pub fn display_name(record: &FoodRecord) -> String {
    [
        &record.description,
        &record.lowercase_description,
        &record.ingredients,
    ]
    .into_iter()
    .flatten()
    .find(|s| !s.trim().is_empty())
    .cloned()
    .unwrap_or_else(|| format!("FDC {}", record.fdc_id))
}

/// Build a search result from an estimate. All-zero results are dropped.
pub fn food_item(record: &FoodRecord, per100: Option<Per100>) -> Option<FoodItem> {
    let per100 = per100?.rounded();
    if per100.is_empty() {
        return None;
    }
    Some(FoodItem {
        name: display_name(record),
        fdc_id: record.fdc_id,
        per100,
    })
}

/// Order by name ignoring case, ties broken by the raw name.
pub fn sort_items(items: &mut [FoodItem]) {
    items.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.fdc_id.cmp(&b.fdc_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> FoodRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn direct_nutrients_from_search_shape() {
        let r = record(json!({
            "fdcId": 1,
            "description": "Apple",
            "foodNutrients": [
                {"nutrientNumber": "1008", "value": 52},
                {"nutrientNumber": "1005", "value": 13.81},
                {"nutrientNumber": "1003", "value": 0.26},
                {"nutrientNumber": "1004", "value": 0.17}
            ]
        }));
        let per100 = direct_per100(&r).unwrap().rounded();
        assert_eq!(per100.kcal, 52.0);
        assert_eq!(per100.carbs_g, 13.8);
        assert_eq!(per100.protein_g, 0.3);
        assert_eq!(per100.fat_g, 0.2);
    }

    #[test]
    fn direct_nutrients_from_detail_shape_with_numeric_codes() {
        let r = record(json!({
            "fdcId": 2,
            "foodNutrients": [
                {"nutrient": {"id": 1008, "number": "208"}, "amount": 100},
                {"nutrient": {"id": 1003}, "amount": "bad", "value": 7.5}
            ]
        }));
        let per100 = direct_per100(&r).unwrap();
        assert_eq!(per100.kcal, 100.0);
        assert_eq!(per100.protein_g, 7.5);
        assert_eq!(per100.carbs_g, 0.0);
    }

    #[test]
    fn label_with_gram_serving() {
        let r = record(json!({
            "fdcId": 3,
            "servingSize": 50,
            "servingSizeUnit": "g",
            "labelNutrients": {"calories": {"value": 200}}
        }));
        assert!(direct_per100(&r).is_none());
        let per100 = estimate_per100(&r).unwrap().rounded();
        assert_eq!(per100.kcal, 400.0);
        assert_eq!(per100.fat_g, 0.0);
    }

    #[test]
    fn serving_units() {
        let base = |size: Value, unit: &str| {
            grams_per_serving(&record(json!({
                "fdcId": 4,
                "servingSize": size,
                "servingSizeUnit": unit
            })))
        };
        assert_eq!(base(json!(240), "ml"), Some(240.0));
        assert_eq!(base(json!(240), "MLT"), Some(240.0));
        assert_eq!(base(json!("30"), "GRM"), Some(30.0));
        assert_eq!(base(json!(1), "oz"), Some(GRAMS_PER_OZ));
        assert_eq!(base(json!(2), "fl oz"), Some(2.0 * GRAMS_PER_FL_OZ));
        assert_eq!(base(json!(1), "cup"), None);
        assert_eq!(base(json!(0), "g"), None);
    }

    #[test]
    fn household_text_fallback() {
        let r = record(json!({
            "fdcId": 5,
            "servingSizeUnit": "cup",
            "servingSize": 1,
            "householdServingFullText": "1 Bottle (12 FL OZ)"
        }));
        assert_eq!(grams_per_serving(&r), Some(12.0 * GRAMS_PER_FL_OZ));

        let r = record(json!({
            "fdcId": 6,
            "householdServingFullText": "2 pieces (28g)"
        }));
        assert_eq!(grams_per_serving(&r), Some(28.0));

        let r = record(json!({"fdcId": 7, "householdServingFullText": "1 cup"}));
        assert_eq!(grams_per_serving(&r), None);
    }

    #[test]
    fn household_quantity_uses_ascii_digits() {
        let r = record(json!({
            "fdcId": 9,
            "householdServingFullText": "\u{0663} g portion (30 g)"
        }));
        assert_eq!(grams_per_serving(&r), Some(30.0));
    }

    #[test]
    fn label_without_values_gives_no_estimate() {
        let r = record(json!({
            "fdcId": 8,
            "servingSize": 100,
            "servingSizeUnit": "g",
            "labelNutrients": {"calories": {"value": 0}, "fat": {}}
        }));
        assert!(per100_from_label(&r).is_none());
    }

    #[test]
    fn leading_float() {
        assert_eq!(parse_leading_float("12"), Some(12.0));
        assert_eq!(parse_leading_float("1.5.2"), Some(1.5));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("."), None);
    }

    #[test]
    fn name_fallbacks() {
        assert_eq!(
            display_name(&record(json!({"fdcId": 9, "description": "", "lowercaseDescription": "oats"}))),
            "oats"
        );
        assert_eq!(
            display_name(&record(json!({"fdcId": 9, "ingredients": "WATER, SALT"}))),
            "WATER, SALT"
        );
        assert_eq!(display_name(&record(json!({"fdcId": 9}))), "FDC 9");
    }

    #[test]
    fn zero_after_rounding_is_dropped() {
        let r = record(json!({"fdcId": 10, "description": "Water"}));
        let tiny = Per100 {
            kcal: 0.04,
            ..Default::default()
        };
        assert!(food_item(&r, Some(tiny)).is_none());
        assert!(food_item(&r, None).is_none());
    }

    #[test]
    fn sort_is_case_insensitive_with_stable_ties() {
        let item = |name: &str, id| FoodItem {
            name: name.to_string(),
            fdc_id: id,
            per100: Per100 {
                kcal: 1.0,
                ..Default::default()
            },
        };
        let mut items = vec![item("banana", 1), item("Apple", 2), item("apple", 3), item("Banana", 4)];
        sort_items(&mut items);
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Apple", "apple", "Banana", "banana"]);
    }
}
