//! Trait seams between the layers.

pub mod llm;
pub mod store;

pub use llm::{LlmClient, LlmResponse, LlmUsage};
pub use store::NutritionStore;
