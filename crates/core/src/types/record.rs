//! The canonical nutrition record produced by photo analysis.
//!
//! Field names and types are the wire contract shared with persistence and
//! presentation; they must not drift.

use serde::{Deserialize, Serialize};

/// Which recovery strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    /// Whole reply parsed as JSON.
    DirectJson,
    /// JSON recovered from a fenced code block.
    CodeBlockJson,
    /// JSON recovered by brace-scanning the reply.
    PatternJson,
    /// Fields recovered by regex extraction over free text.
    ExtractedLlm,
    /// Deterministic synthesis from the fallback table.
    SmartFallback,
}

impl AnalysisSource {
    /// Human-readable label used in record notes.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DirectJson => "Direct JSON parse",
            Self::CodeBlockJson => "Code block JSON parse",
            Self::PatternJson => "Pattern match JSON parse",
            Self::ExtractedLlm => "Manual extraction from model reply",
            Self::SmartFallback => "Consistent photo-based analysis",
        }
    }
}

/// Meal-level macro totals. Macro fields carry a gram suffix (`"24g"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionalBreakdown {
    /// Mirrors the record's `total_calories`.
    pub calories: f64,
    pub protein: String,
    pub carbohydrates: String,
    pub fat: String,
    pub fiber: String,
    pub sugar: String,
}

/// Per-food estimate within a meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualFood {
    pub name: String,
    pub estimated_portion: String,
    pub calories: f64,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}

/// A complete nutrition analysis for one meal photo.
///
/// Every record returned by the analyzer satisfies the full field set; the
/// validator guarantees it regardless of which recovery path produced the
/// record. `total_calories` is always positive and `analysis_source` always
/// reflects the path actually taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    pub foods_detected: Vec<String>,
    pub total_calories: f64,
    pub nutritional_breakdown: NutritionalBreakdown,
    pub individual_foods: Vec<IndividualFood>,
    pub health_tips: Vec<String>,
    pub confidence_score: f64,
    pub analysis_source: AnalysisSource,
    pub image_id: String,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_source_serializes_snake_case() {
        let tag = serde_json::to_string(&AnalysisSource::CodeBlockJson).unwrap();
        assert_eq!(tag, "\"code_block_json\"");

        let parsed: AnalysisSource = serde_json::from_str("\"smart_fallback\"").unwrap();
        assert_eq!(parsed, AnalysisSource::SmartFallback);
    }
}
