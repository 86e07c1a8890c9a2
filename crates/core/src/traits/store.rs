//! Persistence trait.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;

use crate::error::Result;
use crate::types::{
    DailySummary, MealType, NutritionLog, NutritionRecord, UserAccount, UserProfile,
};

/// Persistence seam for accounts, profiles, and nutrition logs.
///
/// Records are persisted verbatim; the store never inspects or rewrites the
/// analyzer's output beyond the daily-summary aggregation.
#[async_trait]
pub trait NutritionStore: Send + Sync {
    /// Register a new account. Fails on duplicate username or email.
    async fn create_user(&self, username: &str, email: &str, password: &str) -> Result<()>;

    /// Verify credentials and return the account.
    async fn authenticate(&self, username: &str, password: &str) -> Result<UserAccount>;

    /// Append one analysis log; returns the new log id.
    async fn save_log(
        &self,
        username: &str,
        record: &NutritionRecord,
        image_bytes: Bytes,
    ) -> Result<i64>;

    /// Most recent logs for a user, newest first.
    async fn recent_logs(&self, username: &str, limit: usize) -> Result<Vec<NutritionLog>>;

    /// Replace the meal in a (date, meal-type) slot.
    async fn upsert_daily_meal(
        &self,
        username: &str,
        date: NaiveDate,
        meal_type: MealType,
        record: &NutritionRecord,
        image_bytes: Bytes,
    ) -> Result<()>;

    /// All meals logged for a date, in timestamp order.
    async fn daily_meals(&self, username: &str, date: NaiveDate) -> Result<Vec<NutritionLog>>;

    /// Aggregate calories and macros over a day's meals.
    async fn daily_summary(&self, username: &str, date: NaiveDate) -> Result<DailySummary>;

    /// Create or update a body profile.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()>;

    /// Fetch a body profile, if one has been saved.
    async fn get_profile(&self, username: &str) -> Result<Option<UserProfile>>;
}
