//! Heuristic field extraction from free-text model replies.
//!
//! Used when no JSON survives recovery: ordered regex families pull food
//! names, a calorie figure, and tips out of prose. First matching pattern
//! per family wins; families with no match get documented defaults. Each
//! extractor is a pure function over the text so it can be tested in
//! isolation from the pipeline.

use regex::Regex;
use serde_json::{json, Value};

/// Food name used when no food family matched.
const DEFAULT_FOOD: &str = "Meal from photo";

/// Calorie figure used when no calorie family matched.
const DEFAULT_CALORIES: f64 = 450.0;

/// Compiled pattern families for heuristic extraction.
pub struct HeuristicExtractor {
    food_patterns: Vec<Regex>,
    calorie_patterns: Vec<Regex>,
    tip_patterns: Vec<Regex>,
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        let compile = |patterns: &[&str]| {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("static extraction pattern"))
                .collect()
        };

        Self {
            food_patterns: compile(&[
                r"(?i)foods?[:\s]+([^.\n]+)",
                r"(?i)detected[:\s]+([^.\n]+)",
                r"(?i)consists of[:\s]+([^.\n]+)",
                r"(?i)menu[:\s]+([^.\n]+)",
                r#"(?i)foods_detected["':\s\[]*([^\]]+)"#,
            ]),
            calorie_patterns: compile(&[
                r#"(?i)total_calories["':\s]*(\d{3,4})"#,
                r"(?i)(\d{3,4})\s*k?cal",
                r"(?i)kalori[:\s]*(\d{3,4})",
                r#"(?i)calories["':\s]*(\d{3,4})"#,
            ]),
            tip_patterns: compile(&[
                r#"(?i)health_tips["':\s\[]*([^\]]+)"#,
                r"(?i)tips?[:\s]+([^.\n]+)",
                r"(?i)suggestions?[:\s]+([^.\n]+)",
            ]),
        }
    }

    /// Build a stage-5 candidate from free text.
    ///
    /// Always produces a candidate; missing families get defaults (one
    /// generic food name, 450 kcal, three generic tips via the validator).
    pub fn extract(&self, text: &str) -> Option<Value> {
        let foods = self
            .extract_foods(text)
            .unwrap_or_else(|| vec![DEFAULT_FOOD.to_string()]);
        let calories = self.extract_calories(text).unwrap_or(DEFAULT_CALORIES);

        let mut candidate = json!({
            "foods_detected": foods,
            "total_calories": calories,
            "confidence_score": 0.75,
        });
        if let Some(tips) = self.extract_tips(text) {
            candidate["health_tips"] = json!(tips);
        }
        Some(candidate)
    }

    /// First matching food pattern, split into at most three names.
    pub fn extract_foods(&self, text: &str) -> Option<Vec<String>> {
        for pattern in &self.food_patterns {
            if let Some(captures) = pattern.captures(text) {
                let foods = split_listing(&captures[1], 3);
                if !foods.is_empty() {
                    return Some(foods);
                }
            }
        }
        None
    }

    /// First 3-4 digit calorie figure near a calorie keyword.
    pub fn extract_calories(&self, text: &str) -> Option<f64> {
        for pattern in &self.calorie_patterns {
            if let Some(captures) = pattern.captures(text) {
                if let Ok(calories) = captures[1].parse::<f64>() {
                    return Some(calories);
                }
            }
        }
        None
    }

    /// First matching tip pattern, split into at most three tips.
    pub fn extract_tips(&self, text: &str) -> Option<Vec<String>> {
        for pattern in &self.tip_patterns {
            if let Some(captures) = pattern.captures(text) {
                let tips = split_listing(&captures[1], 3);
                if !tips.is_empty() {
                    return Some(tips);
                }
            }
        }
        None
    }
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a captured listing on commas/semicolons/" and ", trimming quotes
/// and dropping fragments too short to be names.
fn split_listing(captured: &str, limit: usize) -> Vec<String> {
    captured
        .replace(" and ", ",")
        .split([',', ';'])
        .map(|part| part.trim().trim_matches(['"', '\'']).trim().to_string())
        .filter(|part| part.len() > 2)
        .take(limit)
        .collect()
}
