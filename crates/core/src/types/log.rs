//! Stored analysis logs and daily aggregation types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::NutritionRecord;

/// Daily meal slot. One record per (user, date, meal type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            "snack" => Some(Self::Snack),
            _ => None,
        }
    }
}

/// One persisted analysis. The raw image bytes stay in storage and are not
/// carried on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionLog {
    pub id: i64,
    pub username: String,
    pub meal_type: Option<MealType>,
    pub record: NutritionRecord,
    pub logged_at: DateTime<Utc>,
}

/// Macro totals over one day's meals. Gram figures are plain numbers here;
/// the `"Ng"` suffix is stripped during aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub total_calories: f64,
    pub total_protein_g: f64,
    pub total_carbs_g: f64,
    pub total_fat_g: f64,
    pub meal_count: usize,
}
