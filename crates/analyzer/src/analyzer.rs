//! The photo-analysis facade.

use std::sync::Arc;

use nutrilog_core::{traits::LlmClient, NutritionRecord, Result};

use crate::image::{fingerprint_image, prepare_image};
use crate::recovery::RecoveryPipeline;

/// Instruction block sent with every meal photo. Demands JSON-only output
/// in the documented schema; the recovery pipeline handles everything the
/// model does anyway.
pub const NUTRITION_PROMPT: &str = r#"Analyze this food image and provide nutrition data in VALID JSON format ONLY.

IMPORTANT: Do NOT provide explanations about image processing or computer vision.
ONLY analyze the actual food in the image and respond with JSON.

Required JSON format:
{
    "foods_detected": ["specific food name 1", "specific food name 2"],
    "total_calories": 450,
    "nutritional_breakdown": {
        "calories": 450,
        "protein": "20g",
        "carbohydrates": "55g",
        "fat": "15g",
        "fiber": "8g",
        "sugar": "5g"
    },
    "individual_foods": [
        {
            "name": "food name",
            "estimated_portion": "1 plate (200g)",
            "calories": 300,
            "protein": "15g",
            "carbs": "40g",
            "fat": "10g"
        }
    ],
    "health_tips": ["tip 1", "tip 2", "tip 3"],
    "confidence_score": 0.8
}

Analyze Indonesian foods specifically. Provide realistic calorie estimates.
RESPOND WITH ONLY THE JSON - NO EXPLANATIONS."#;

/// One-photo nutrition analyzer.
///
/// Owns nothing global: the model client and recovery pipeline are injected
/// and the caller manages their lifecycle.
pub struct FoodAnalyzer {
    llm: Arc<dyn LlmClient>,
    pipeline: RecoveryPipeline,
}

impl FoodAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            pipeline: RecoveryPipeline::new(),
        }
    }

    /// Substitute a pipeline, e.g. with a custom fallback table.
    pub fn with_pipeline(llm: Arc<dyn LlmClient>, pipeline: RecoveryPipeline) -> Self {
        Self { llm, pipeline }
    }

    pub(crate) fn llm(&self) -> &dyn LlmClient {
        self.llm.as_ref()
    }

    /// Analyze one meal photo.
    ///
    /// Only an undecodable image is a hard error. A model failure converges
    /// with a parse failure: both end in the deterministic fallback keyed on
    /// the photo's fingerprint, so the caller always gets a usable record.
    pub async fn analyze(&self, image_bytes: &[u8]) -> Result<NutritionRecord> {
        let prepared = prepare_image(image_bytes)?;
        let fingerprint = fingerprint_image(image_bytes)?;

        tracing::info!(
            image_id = %fingerprint,
            width = prepared.width,
            height = prepared.height,
            "Analyzing meal photo"
        );

        match self
            .llm
            .complete_with_image(NUTRITION_PROMPT, &prepared.data_uri())
            .await
        {
            Ok(reply) => {
                tracing::debug!(
                    image_id = %fingerprint,
                    reply_len = reply.content.len(),
                    "Model reply received"
                );
                Ok(self.pipeline.recover(&reply.content, &fingerprint))
            }
            Err(e) => {
                tracing::warn!(
                    image_id = %fingerprint,
                    error = %e,
                    "Model call failed, synthesizing fallback record"
                );
                Ok(self.pipeline.fallback_record(&fingerprint))
            }
        }
    }
}
