//! Record validation and completion.
//!
//! [`complete`] turns any partially-populated candidate into a full
//! [`NutritionRecord`]. It is pure and total: whatever the recovery
//! strategies hand it, the returned record satisfies the whole field
//! contract. Fields that arrive present and well-typed are kept as-is;
//! numeric macro values are normalized to gram-suffixed strings.

use serde_json::Value;

use nutrilog_core::{AnalysisSource, IndividualFood, NutritionRecord, NutritionalBreakdown};

/// Placeholder when no food name survived recovery.
const DEFAULT_FOOD: &str = "Unidentified meal";

/// Calorie figure used when none could be recovered.
const DEFAULT_CALORIES: f64 = 450.0;

/// Portion split across the first three detected foods.
const PORTION_RATIOS: [f64; 3] = [0.6, 0.3, 0.1];

const PORTION_LABELS: [&str; 3] = ["1 large serving", "1 medium serving", "1 small serving"];

/// Complete a candidate into a valid record.
///
/// `source` and `fingerprint` always win over whatever the candidate claims:
/// the tag must reflect the recovery path actually taken.
pub fn complete(candidate: Value, source: AnalysisSource, fingerprint: &str) -> NutritionRecord {
    let obj = match candidate {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };

    let foods_detected = obj
        .get("foods_detected")
        .and_then(string_list)
        .filter(|foods| !foods.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_FOOD.to_string()]);

    let total_calories = obj
        .get("total_calories")
        .and_then(coerce_f64)
        .filter(|c| *c > 0.0)
        .map(f64::floor)
        .unwrap_or(DEFAULT_CALORIES);

    let confidence_score = obj
        .get("confidence_score")
        .and_then(coerce_f64)
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.8);

    let nutritional_breakdown = breakdown(obj.get("nutritional_breakdown"), total_calories);

    let individual_foods = obj
        .get("individual_foods")
        .and_then(Value::as_array)
        .map(|entries| coerce_individual_foods(entries, total_calories))
        .filter(|foods| !foods.is_empty())
        .unwrap_or_else(|| derive_individual_foods(&foods_detected, total_calories));

    let health_tips = obj
        .get("health_tips")
        .and_then(string_list)
        .filter(|tips| !tips.is_empty())
        .map(|mut tips| {
            tips.truncate(3);
            tips
        })
        .unwrap_or_else(|| derive_tips(&foods_detected));

    let note = obj
        .get("note")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} (ID: {})", source.label(), fingerprint));

    NutritionRecord {
        foods_detected,
        total_calories,
        nutritional_breakdown,
        individual_foods,
        health_tips,
        confidence_score,
        analysis_source: source,
        image_id: fingerprint.to_string(),
        note,
    }
}

/// Interpret a JSON value as a calorie/score figure.
pub(crate) fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Interpret a JSON value as a gram figure, normalized to `"<integer>g"`.
fn gram_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else if let Some(stripped) = trimmed.strip_suffix('g') {
                stripped
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .map(|n| format!("{}g", n.floor() as i64))
            } else {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .map(|n| format!("{}g", n.floor() as i64))
            }
        }
        Value::Number(n) => n.as_f64().map(|v| format!("{}g", v.floor() as i64)),
        _ => None,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    let strings: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .collect();
    Some(strings)
}

fn grams(calories: f64, ratio: f64, kcal_per_gram: f64) -> String {
    format!("{}g", (calories * ratio / kcal_per_gram).floor() as i64)
}

/// Meal-level breakdown, field-by-field: present well-typed values are
/// kept, missing ones are derived from the total with fixed macro ratios
/// (protein 16% at 4 kcal/g, carbohydrate 54% at 4, fat 30% at 9).
fn breakdown(value: Option<&Value>, total_calories: f64) -> NutritionalBreakdown {
    let map = value.and_then(Value::as_object);
    let field = |name: &str| map.and_then(|m| m.get(name)).and_then(gram_string);

    NutritionalBreakdown {
        // Always mirrors the authoritative total.
        calories: total_calories,
        protein: field("protein").unwrap_or_else(|| grams(total_calories, 0.16, 4.0)),
        carbohydrates: field("carbohydrates").unwrap_or_else(|| grams(total_calories, 0.54, 4.0)),
        fat: field("fat").unwrap_or_else(|| grams(total_calories, 0.30, 9.0)),
        fiber: field("fiber")
            .unwrap_or_else(|| format!("{}g", ((total_calories / 120.0).floor() as i64).max(4))),
        sugar: field("sugar")
            .unwrap_or_else(|| format!("{}g", ((total_calories / 150.0).floor() as i64).max(3))),
    }
}

/// Keep model-supplied per-food entries, coercing each field and filling
/// gaps from the entry's portion share of the total.
fn coerce_individual_foods(entries: &[Value], total_calories: f64) -> Vec<IndividualFood> {
    entries
        .iter()
        .take(3)
        .enumerate()
        .filter_map(|(i, entry)| {
            let map = entry.as_object()?;
            let name = map.get("name").and_then(Value::as_str)?.trim();
            if name.is_empty() {
                return None;
            }

            let calories = map
                .get("calories")
                .and_then(coerce_f64)
                .filter(|c| *c > 0.0)
                .unwrap_or_else(|| (total_calories * PORTION_RATIOS[i]).floor());

            Some(IndividualFood {
                name: name.to_string(),
                estimated_portion: map
                    .get("estimated_portion")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| PORTION_LABELS[i].to_string()),
                calories,
                protein: map
                    .get("protein")
                    .and_then(gram_string)
                    .unwrap_or_else(|| grams(calories, 0.15, 4.0)),
                carbs: map
                    .get("carbs")
                    .and_then(gram_string)
                    .unwrap_or_else(|| grams(calories, 0.55, 4.0)),
                fat: map
                    .get("fat")
                    .and_then(gram_string)
                    .unwrap_or_else(|| grams(calories, 0.30, 9.0)),
            })
        })
        .collect()
}

/// Split the total across the first three detected foods (60/30/10) and
/// derive per-entry macros from each entry's own calories (15/55/30%).
fn derive_individual_foods(foods: &[String], total_calories: f64) -> Vec<IndividualFood> {
    foods
        .iter()
        .take(3)
        .enumerate()
        .map(|(i, name)| {
            let calories = (total_calories * PORTION_RATIOS[i]).floor();
            IndividualFood {
                name: name.clone(),
                estimated_portion: PORTION_LABELS[i].to_string(),
                calories,
                protein: grams(calories, 0.15, 4.0),
                carbs: grams(calories, 0.55, 4.0),
                fat: grams(calories, 0.30, 9.0),
            }
        })
        .collect()
}

fn derive_tips(foods: &[String]) -> Vec<String> {
    vec![
        format!("The combination of {} provides good energy", foods.join(", ")),
        "Keep your daily nutrition balanced with vegetables".to_string(),
        "Drink enough water through the day".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FP: &str = "a1b2c3d4";

    #[test]
    fn test_empty_candidate_gets_full_defaults() {
        let record = complete(json!({}), AnalysisSource::ExtractedLlm, FP);

        assert_eq!(record.foods_detected, vec![DEFAULT_FOOD.to_string()]);
        assert_eq!(record.total_calories, 450.0);
        assert_eq!(record.confidence_score, 0.8);
        assert_eq!(record.nutritional_breakdown.calories, 450.0);
        assert_eq!(record.individual_foods.len(), 1);
        assert_eq!(record.health_tips.len(), 3);
        assert_eq!(record.image_id, FP);
        assert!(record.note.contains(FP));
    }

    #[test]
    fn test_non_object_candidate_is_total() {
        let record = complete(json!("not even an object"), AnalysisSource::PatternJson, FP);
        assert!(!record.foods_detected.is_empty());
        assert!(record.total_calories > 0.0);
    }

    #[test]
    fn test_macro_derivation_for_600_kcal() {
        let record = complete(
            json!({"foods_detected": ["Nasi goreng"], "total_calories": 600}),
            AnalysisSource::DirectJson,
            FP,
        );

        let breakdown = &record.nutritional_breakdown;
        assert_eq!(breakdown.protein, "24g"); // floor(600 * 0.16 / 4)
        assert_eq!(breakdown.carbohydrates, "81g"); // floor(600 * 0.54 / 4)
        assert_eq!(breakdown.fat, "20g"); // floor(600 * 0.30 / 9)
        assert_eq!(breakdown.fiber, "5g"); // max(4, floor(600 / 120))
        assert_eq!(breakdown.sugar, "4g"); // max(3, floor(600 / 150))
    }

    #[test]
    fn test_fiber_and_sugar_floors() {
        let record = complete(
            json!({"foods_detected": ["Es teh"], "total_calories": 100}),
            AnalysisSource::DirectJson,
            FP,
        );
        assert_eq!(record.nutritional_breakdown.fiber, "4g");
        assert_eq!(record.nutritional_breakdown.sugar, "3g");
    }

    #[test]
    fn test_portion_split_60_30_10() {
        let record = complete(
            json!({
                "foods_detected": ["Nasi putih", "Ayam goreng", "Sayur bayam"],
                "total_calories": 1000,
            }),
            AnalysisSource::DirectJson,
            FP,
        );

        let calories: Vec<f64> = record.individual_foods.iter().map(|f| f.calories).collect();
        assert_eq!(calories, vec![600.0, 300.0, 100.0]);
        // Per-entry macros come from the entry's own calories.
        assert_eq!(record.individual_foods[0].protein, "22g"); // floor(600 * 0.15 / 4)
        assert_eq!(record.individual_foods[0].carbs, "82g"); // floor(600 * 0.55 / 4)
        assert_eq!(record.individual_foods[0].fat, "20g"); // floor(600 * 0.30 / 9)
    }

    #[test]
    fn test_present_fields_are_not_overwritten() {
        let record = complete(
            json!({
                "foods_detected": ["Rendang"],
                "total_calories": 720,
                "confidence_score": 0.93,
                "health_tips": ["Already present tip"],
                "nutritional_breakdown": {
                    "calories": 720,
                    "protein": "30g",
                    "carbohydrates": "80g",
                    "fat": "25g",
                    "fiber": "6g",
                    "sugar": "5g",
                },
            }),
            AnalysisSource::DirectJson,
            FP,
        );

        assert_eq!(record.confidence_score, 0.93);
        assert_eq!(record.health_tips, vec!["Already present tip".to_string()]);
        assert_eq!(record.nutritional_breakdown.protein, "30g");
    }

    #[test]
    fn test_numeric_macros_are_normalized_to_gram_strings() {
        let record = complete(
            json!({
                "foods_detected": ["Soto ayam"],
                "total_calories": 480,
                "nutritional_breakdown": {"protein": 19, "fat": "16"},
            }),
            AnalysisSource::CodeBlockJson,
            FP,
        );

        assert_eq!(record.nutritional_breakdown.protein, "19g");
        assert_eq!(record.nutritional_breakdown.fat, "16g");
        // Missing fields still derived from the total.
        assert_eq!(record.nutritional_breakdown.carbohydrates, "64g");
    }

    #[test]
    fn test_string_calories_are_coerced() {
        let record = complete(
            json!({"foods_detected": ["Mie ayam"], "total_calories": "620"}),
            AnalysisSource::DirectJson,
            FP,
        );
        assert_eq!(record.total_calories, 620.0);
    }

    #[test]
    fn test_negative_calories_fall_back_to_default() {
        let record = complete(
            json!({"foods_detected": ["Gudeg"], "total_calories": -50}),
            AnalysisSource::DirectJson,
            FP,
        );
        assert_eq!(record.total_calories, 450.0);
    }

    #[test]
    fn test_individual_foods_capped_at_three() {
        let record = complete(
            json!({
                "foods_detected": ["A1", "B2", "C3", "D4", "E5"],
                "total_calories": 500,
            }),
            AnalysisSource::DirectJson,
            FP,
        );
        assert_eq!(record.individual_foods.len(), 3);
    }

    #[test]
    fn test_idempotence_on_complete_record() {
        let first = complete(
            json!({
                "foods_detected": ["Nasi putih", "Ayam goreng"],
                "total_calories": 580,
                "health_tips": ["tip one", "tip two", "tip three"],
            }),
            AnalysisSource::DirectJson,
            FP,
        );

        let again = complete(
            serde_json::to_value(&first).unwrap(),
            first.analysis_source,
            &first.image_id,
        );
        assert_eq!(again, first);
    }
}
