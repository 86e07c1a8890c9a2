//! SQLite-backed nutrition store.
//!
//! One connection behind an async mutex; every statement runs on the
//! blocking pool. Records are persisted verbatim as JSON text next to the
//! raw image bytes.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use nutrilog_core::{
    traits::NutritionStore, ActivityLevel, DailySummary, Error, Gender, MealType, NutritionLog,
    NutritionRecord, Result, UserAccount, UserProfile,
};

use crate::auth;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS user_profiles (
    username TEXT PRIMARY KEY,
    height_cm REAL NOT NULL,
    current_weight_kg REAL NOT NULL,
    target_weight_kg REAL NOT NULL,
    age INTEGER NOT NULL,
    gender TEXT NOT NULL,
    activity_level TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS nutrition_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    meal_type TEXT,
    record TEXT NOT NULL,
    image BLOB NOT NULL,
    logged_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_logs_user ON nutrition_logs (username, logged_at);

CREATE TABLE IF NOT EXISTS daily_meals (
    username TEXT NOT NULL,
    date TEXT NOT NULL,
    meal_type TEXT NOT NULL,
    record TEXT NOT NULL,
    image BLOB NOT NULL,
    logged_at TEXT NOT NULL,
    PRIMARY KEY (username, date, meal_type)
);
";

/// SQLite persistence for accounts, profiles, and logs.
pub struct SqliteStore {
    conn: Arc<tokio::sync::Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::storage(format!("DB open error: {e}")))?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage(format!("DB open error: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::storage(format!("schema error: {e}")))?;
        Ok(Self {
            conn: Arc::new(tokio::sync::Mutex::new(conn)),
        })
    }
}

/// Strip the `"Ng"` suffix off a macro figure. Unparseable values count as
/// zero rather than poisoning the whole summary.
pub fn parse_grams(value: &str) -> f64 {
    value
        .trim()
        .trim_end_matches('g')
        .trim()
        .parse()
        .unwrap_or(0.0)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::storage(format!("bad timestamp {value:?}: {e}")))
}

type LogRow = (i64, String, Option<String>, String, String);

fn log_from_row(row: LogRow) -> Result<NutritionLog> {
    let (id, username, meal_type, record_json, logged_at) = row;
    Ok(NutritionLog {
        id,
        username,
        meal_type: meal_type.as_deref().and_then(MealType::parse),
        record: serde_json::from_str(&record_json)?,
        logged_at: parse_timestamp(&logged_at)?,
    })
}

#[async_trait]
impl NutritionStore for SqliteStore {
    async fn create_user(&self, username: &str, email: &str, password: &str) -> Result<()> {
        let conn = self.conn.clone();
        let username = username.to_string();
        let email = email.to_string();
        let password_hash = auth::hash_password(password)?;
        let created_at = Utc::now().to_rfc3339();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let existing: Option<String> = conn
                .query_row(
                    "SELECT username FROM users WHERE username = ?1 OR email = ?2",
                    params![username, email],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| Error::storage(format!("user lookup failed: {e}")))?;
            if existing.is_some() {
                return Err(Error::invalid_request("username or email already exists"));
            }

            conn.execute(
                "INSERT INTO users (username, email, password_hash, created_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, 1)",
                params![username, email, password_hash, created_at],
            )
            .map_err(|e| Error::storage(format!("user insert failed: {e}")))?;

            tracing::info!(username = %username, "User created");
            Ok(())
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<UserAccount> {
        let conn = self.conn.clone();
        let username = username.to_string();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let row: Option<(String, String, String, String, i64)> = conn
                .query_row(
                    "SELECT username, email, password_hash, created_at, is_active
                     FROM users WHERE username = ?1",
                    params![username],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| Error::storage(format!("user lookup failed: {e}")))?;

            // One error for every failure mode: do not leak which part failed.
            let Some((username, email, password_hash, created_at, is_active)) = row else {
                return Err(Error::unauthorized("invalid username or password"));
            };
            if is_active == 0 || !auth::verify_password(&password, &password_hash) {
                return Err(Error::unauthorized("invalid username or password"));
            }

            Ok(UserAccount {
                username,
                email,
                password_hash,
                created_at: parse_timestamp(&created_at)?,
                is_active: true,
            })
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }

    async fn save_log(
        &self,
        username: &str,
        record: &NutritionRecord,
        image_bytes: Bytes,
    ) -> Result<i64> {
        let conn = self.conn.clone();
        let username = username.to_string();
        let record_json = serde_json::to_string(record)?;
        let image = image_bytes.to_vec();
        let logged_at = Utc::now().to_rfc3339();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO nutrition_logs (username, meal_type, record, image, logged_at)
                 VALUES (?1, NULL, ?2, ?3, ?4)",
                params![username, record_json, image, logged_at],
            )
            .map_err(|e| Error::storage(format!("log insert failed: {e}")))?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }

    async fn recent_logs(&self, username: &str, limit: usize) -> Result<Vec<NutritionLog>> {
        let conn = self.conn.clone();
        let username = username.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(
                    "SELECT id, username, meal_type, record, logged_at FROM nutrition_logs
                     WHERE username = ?1 ORDER BY logged_at DESC, id DESC LIMIT ?2",
                )
                .map_err(|e| Error::storage(format!("log query failed: {e}")))?;

            let rows = stmt
                .query_map(params![username, limit as i64], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                })
                .map_err(|e| Error::storage(format!("log query failed: {e}")))?;

            let mut logs = Vec::new();
            for row in rows {
                let row = row.map_err(|e| Error::storage(format!("log row failed: {e}")))?;
                logs.push(log_from_row(row)?);
            }
            Ok(logs)
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }

    async fn upsert_daily_meal(
        &self,
        username: &str,
        date: NaiveDate,
        meal_type: MealType,
        record: &NutritionRecord,
        image_bytes: Bytes,
    ) -> Result<()> {
        let conn = self.conn.clone();
        let username = username.to_string();
        let date = date.format("%Y-%m-%d").to_string();
        let record_json = serde_json::to_string(record)?;
        let image = image_bytes.to_vec();
        let logged_at = Utc::now().to_rfc3339();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT OR REPLACE INTO daily_meals
                 (username, date, meal_type, record, image, logged_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    username,
                    date,
                    meal_type.as_str(),
                    record_json,
                    image,
                    logged_at
                ],
            )
            .map_err(|e| Error::storage(format!("daily meal upsert failed: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }

    async fn daily_meals(&self, username: &str, date: NaiveDate) -> Result<Vec<NutritionLog>> {
        let conn = self.conn.clone();
        let username = username.to_string();
        let date = date.format("%Y-%m-%d").to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(
                    "SELECT rowid, username, meal_type, record, logged_at FROM daily_meals
                     WHERE username = ?1 AND date = ?2 ORDER BY logged_at ASC",
                )
                .map_err(|e| Error::storage(format!("meal query failed: {e}")))?;

            let rows = stmt
                .query_map(params![username, date], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                })
                .map_err(|e| Error::storage(format!("meal query failed: {e}")))?;

            let mut meals = Vec::new();
            for row in rows {
                let row = row.map_err(|e| Error::storage(format!("meal row failed: {e}")))?;
                meals.push(log_from_row(row)?);
            }
            Ok(meals)
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }

    async fn daily_summary(&self, username: &str, date: NaiveDate) -> Result<DailySummary> {
        let meals = self.daily_meals(username, date).await?;

        let mut summary = DailySummary {
            meal_count: meals.len(),
            ..DailySummary::default()
        };
        for meal in &meals {
            let breakdown = &meal.record.nutritional_breakdown;
            summary.total_calories += meal.record.total_calories;
            summary.total_protein_g += parse_grams(&breakdown.protein);
            summary.total_carbs_g += parse_grams(&breakdown.carbohydrates);
            summary.total_fat_g += parse_grams(&breakdown.fat);
        }
        Ok(summary)
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        let conn = self.conn.clone();
        let profile = profile.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT OR REPLACE INTO user_profiles
                 (username, height_cm, current_weight_kg, target_weight_kg, age, gender,
                  activity_level, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    profile.username,
                    profile.height_cm,
                    profile.current_weight_kg,
                    profile.target_weight_kg,
                    profile.age,
                    profile.gender.as_str(),
                    profile.activity_level.as_str(),
                    profile.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::storage(format!("profile upsert failed: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }

    async fn get_profile(&self, username: &str) -> Result<Option<UserProfile>> {
        let conn = self.conn.clone();
        let username = username.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let row: Option<(String, f64, f64, f64, u32, String, String, String)> = conn
                .query_row(
                    "SELECT username, height_cm, current_weight_kg, target_weight_kg, age,
                            gender, activity_level, updated_at
                     FROM user_profiles WHERE username = ?1",
                    params![username],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                            row.get(7)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| Error::storage(format!("profile query failed: {e}")))?;

            let Some((username, height, current, target, age, gender, activity, updated_at)) = row
            else {
                return Ok(None);
            };

            Ok(Some(UserProfile {
                username,
                height_cm: height,
                current_weight_kg: current,
                target_weight_kg: target,
                age,
                gender: Gender::parse(&gender)
                    .ok_or_else(|| Error::storage(format!("bad gender value {gender:?}")))?,
                activity_level: ActivityLevel::parse(&activity)
                    .ok_or_else(|| Error::storage(format!("bad activity value {activity:?}")))?,
                updated_at: parse_timestamp(&updated_at)?,
            }))
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }
}
