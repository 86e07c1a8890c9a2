#![deny(unused)]
//! Food-photo analysis for NutriLog.
//!
//! This crate turns an unreliable, free-text vision-model reply into a
//! structurally valid [`nutrilog_core::NutritionRecord`]:
//! - Image preparation and fingerprinting under model token limits
//! - The ordered response-recovery pipeline (direct parse through
//!   deterministic fallback)
//! - The record validator/completer
//! - Advice generation helpers

pub mod advice;
pub mod analyzer;
pub mod extract;
pub mod fallback;
pub mod image;
pub mod recovery;
pub mod validate;

pub use analyzer::{FoodAnalyzer, NUTRITION_PROMPT};
pub use extract::HeuristicExtractor;
pub use fallback::{FallbackMeal, FALLBACK_MEALS};
pub use image::{fingerprint_image, prepare_image, PreparedImage};
pub use recovery::RecoveryPipeline;
pub use validate::complete;
