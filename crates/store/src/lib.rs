#![deny(unused)]
//! Persistence for NutriLog.
//!
//! SQLite-backed storage for accounts, body profiles, and nutrition logs,
//! plus the BMI and calorie-needs arithmetic derived from profiles.

pub mod auth;
pub mod bmi;
pub mod sqlite;

pub use sqlite::SqliteStore;
