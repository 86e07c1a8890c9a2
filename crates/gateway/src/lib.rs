#![deny(unused)]
//! HTTP surface for NutriLog.
//!
//! Axum server exposing auth, photo analysis, log history, daily summaries,
//! profiles, and advice. The analyzer and store arrive via shared state;
//! nothing here owns a lifecycle.

pub mod auth;
pub mod routes;
pub mod server;

pub use server::{AppState, GatewayConfig, GatewayServer};
