//! The response-recovery pipeline.
//!
//! Ordered extraction strategies over a raw model reply, first success
//! wins. Every path ends in the validator, so [`RecoveryPipeline::recover`]
//! is total: any input text, including empty or hostile ones, yields a full
//! record tagged with the strategy that actually produced it.

use regex::Regex;
use serde_json::Value;

use nutrilog_core::{AnalysisSource, NutritionRecord};

use crate::extract::HeuristicExtractor;
use crate::fallback::{select_meal, smart_fallback_candidate, FallbackMeal, FALLBACK_MEALS};
use crate::validate;

/// Refusal/meta phrases that mark a reply as carrying no usable signal.
const EXPLANATION_MARKERS: &[&str] = &["image processing", "computer vision", "cannot analyze"];

/// Ordered recovery over raw model text.
///
/// Holds the compiled patterns and the fallback table as read-only state;
/// both are injected at construction so tests can substitute their own
/// table. No lazily-initialized globals.
pub struct RecoveryPipeline {
    fenced_block: Regex,
    extractor: HeuristicExtractor,
    fallback_table: Vec<FallbackMeal>,
}

impl RecoveryPipeline {
    pub fn new() -> Self {
        Self::with_fallback_table(FALLBACK_MEALS.to_vec())
    }

    pub fn with_fallback_table(fallback_table: Vec<FallbackMeal>) -> Self {
        assert!(!fallback_table.is_empty(), "fallback table must be non-empty");
        Self {
            fenced_block: Regex::new(r"(?si)```(?:json)?\s*(\{.*?\})\s*```")
                .expect("static fence pattern"),
            extractor: HeuristicExtractor::new(),
            fallback_table,
        }
    }

    /// Recover a valid record from whatever the model returned.
    pub fn recover(&self, raw_text: &str, fingerprint: &str) -> NutritionRecord {
        // Stage 1: the whole reply is JSON once fence markers are stripped.
        if let Some(candidate) = try_direct_parse(raw_text) {
            tracing::debug!(image_id = %fingerprint, "Recovered via direct JSON parse");
            return self.finish(candidate, AnalysisSource::DirectJson, fingerprint);
        }

        // Stage 2: JSON inside a fenced code block, tagged or not.
        if let Some(candidate) = self.try_fenced_blocks(raw_text) {
            tracing::debug!(image_id = %fingerprint, "Recovered via fenced code block");
            return self.finish(candidate, AnalysisSource::CodeBlockJson, fingerprint);
        }

        // Stage 3: any balanced brace-delimited substring.
        if let Some(candidate) = try_brace_scan(raw_text) {
            tracing::debug!(image_id = %fingerprint, "Recovered via brace scan");
            return self.finish(candidate, AnalysisSource::PatternJson, fingerprint);
        }

        // Stage 4: generic refusal/meta replies carry no signal worth
        // running heuristics on.
        if is_general_explanation(raw_text) {
            tracing::debug!(image_id = %fingerprint, "Reply is a generic explanation, skipping extraction");
            return self.fallback_record(fingerprint);
        }

        // Stage 5: regex families over the prose.
        if let Some(candidate) = self.extractor.extract(raw_text) {
            tracing::debug!(image_id = %fingerprint, "Recovered via heuristic extraction");
            return self.finish(candidate, AnalysisSource::ExtractedLlm, fingerprint);
        }

        // Stage 6: deterministic synthesis. Never fails.
        self.fallback_record(fingerprint)
    }

    /// Stage-6 record, also used directly when the model call itself fails.
    pub fn fallback_record(&self, fingerprint: &str) -> NutritionRecord {
        let meal = select_meal(&self.fallback_table, fingerprint);
        tracing::debug!(image_id = %fingerprint, foods = ?meal.foods, "Synthesizing fallback record");
        self.finish(
            smart_fallback_candidate(meal),
            AnalysisSource::SmartFallback,
            fingerprint,
        )
    }

    fn finish(
        &self,
        candidate: Value,
        source: AnalysisSource,
        fingerprint: &str,
    ) -> NutritionRecord {
        validate::complete(candidate, source, fingerprint)
    }

    fn try_fenced_blocks(&self, raw_text: &str) -> Option<Value> {
        self.fenced_block
            .captures_iter(raw_text)
            .filter_map(|captures| serde_json::from_str(captures[1].trim()).ok())
            .find(shape_check)
    }
}

impl Default for RecoveryPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// The acceptance gate between "JSON-ish blob" and "nutrition answer":
/// a non-empty `foods_detected` list plus a numeric-or-coercible
/// `total_calories`.
pub fn shape_check(candidate: &Value) -> bool {
    let foods_ok = candidate
        .get("foods_detected")
        .and_then(Value::as_array)
        .map(|foods| !foods.is_empty())
        .unwrap_or(false);
    let calories_ok = candidate
        .get("total_calories")
        .and_then(validate::coerce_f64)
        .is_some();
    foods_ok && calories_ok
}

fn try_direct_parse(raw_text: &str) -> Option<Value> {
    let cleaned = raw_text.trim().replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    if !(cleaned.starts_with('{') && cleaned.ends_with('}')) {
        return None;
    }
    serde_json::from_str(cleaned).ok().filter(shape_check)
}

fn try_brace_scan(raw_text: &str) -> Option<Value> {
    brace_candidates(raw_text)
        .into_iter()
        .filter_map(|chunk| serde_json::from_str(chunk).ok())
        .find(shape_check)
}

/// Balanced brace-delimited substrings, in order of appearance. Nested
/// objects stay inside their enclosing candidate.
fn brace_candidates(text: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, byte) in text.bytes().enumerate() {
        match byte {
            b'{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    candidates.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    candidates
}

fn is_general_explanation(raw_text: &str) -> bool {
    let lowered = raw_text.to_lowercase();
    EXPLANATION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
