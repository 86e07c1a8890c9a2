#![deny(unused)]
//! Model gateway for NutriLog.
//!
//! This crate provides:
//! - An OpenAI-compatible chat-completions client with multimodal support
//! - A mock client for tests

pub mod mock;
pub mod openai_compat;

pub use mock::MockLlmClient;
pub use openai_compat::{OpenAiCompatClient, OpenAiCompatConfig};
