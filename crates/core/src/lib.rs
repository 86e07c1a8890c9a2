#![deny(unused)]
//! Core types, traits, and error definitions for NutriLog.
//!
//! This crate provides the foundational building blocks shared across all
//! layers of the nutrition logger: the record wire types, the error
//! taxonomy, the LLM and store seams, configuration, and tracing setup.

pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
