//! Free-text advice generation.
//!
//! Stateless single-call helpers on top of the analyzer's model client.
//! Model trouble here is never surfaced: a static advisory string stands in.

use nutrilog_core::{NutritionLog, NutritionRecord};

use crate::analyzer::FoodAnalyzer;

/// Advice returned when the model is unreachable.
pub const DEFAULT_ADVICE: &str = "Aim for balanced meals: plenty of vegetables and fruit, \
go easy on fried food, and drink enough water.";

/// Summary returned when no meals have been logged for the day.
pub const EMPTY_DAY_SUMMARY: &str = "No meals logged yet today.";

impl FoodAnalyzer {
    /// Short personalized advice for one analyzed meal.
    pub async fn nutrition_advice(&self, record: &NutritionRecord) -> String {
        let foods = record.foods_detected.join(", ");
        let prompt = format!(
            "Give short nutrition advice for this meal: {} (total calories: {}).\n\n\
             Cover:\n1. A brief evaluation\n2. What to add or swap\n3. One healthy habit\n\n\
             At most 200 words.",
            foods, record.total_calories
        );

        match self.llm().complete(&prompt).await {
            Ok(reply) => reply.content,
            Err(e) => {
                tracing::warn!(error = %e, "Advice generation failed, using default advice");
                DEFAULT_ADVICE.to_string()
            }
        }
    }

    /// One-paragraph narrative over a day's logged meals.
    pub async fn daily_summary_narrative(&self, logs: &[NutritionLog]) -> String {
        if logs.is_empty() {
            return EMPTY_DAY_SUMMARY.to_string();
        }

        let total_calories: f64 = logs.iter().map(|log| log.record.total_calories).sum();
        let prompt = format!(
            "Daily nutrition recap:\n- Meals logged: {}\n- Estimated calories: {} kcal\n\n\
             Give a brief evaluation and one suggestion for tomorrow (at most 150 words).",
            logs.len(),
            total_calories
        );

        match self.llm().complete(&prompt).await {
            Ok(reply) => reply.content,
            Err(e) => {
                tracing::warn!(error = %e, "Daily summary generation failed, using default advice");
                DEFAULT_ADVICE.to_string()
            }
        }
    }
}
