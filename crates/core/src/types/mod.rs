//! Shared type definitions.

pub mod log;
pub mod profile;
pub mod record;
pub mod user;

pub use log::{DailySummary, MealType, NutritionLog};
pub use profile::{ActivityLevel, BmiCategory, BmiReport, Gender, UserProfile};
pub use record::{AnalysisSource, IndividualFood, NutritionRecord, NutritionalBreakdown};
pub use user::UserAccount;
