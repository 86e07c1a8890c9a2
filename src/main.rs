#![deny(unused)]
//! NutriLog - food-photo nutrition logger.
//!
//! A meal photo goes to a vision-capable model, the reply is recovered into
//! a structurally valid nutrition record, and records are stored per user
//! for daily tracking and BMI reporting.

use std::sync::Arc;

use nutrilog_analyzer::FoodAnalyzer;
use nutrilog_core::config::AppConfig;
use nutrilog_core::traits::NutritionStore;
use nutrilog_gateway::{auth::AuthKeys, GatewayConfig, GatewayServer};
use nutrilog_model_gateway::{OpenAiCompatClient, OpenAiCompatConfig};
use nutrilog_store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Config load failed ({e}), using defaults");
        AppConfig::default()
    });

    nutrilog_core::logging::configure_tracing(config.logging.json_logs);

    tracing::info!("Starting NutriLog v{}", env!("CARGO_PKG_VERSION"));

    // =========================================================================
    // Persistence
    // =========================================================================
    tracing::info!(path = %config.store.database_path, "Opening SQLite store");
    let store: Arc<dyn NutritionStore> = Arc::new(SqliteStore::new(&config.store.database_path)?);

    // =========================================================================
    // Model client and analyzer
    // =========================================================================
    tracing::info!(
        base_url = %config.model.base_url,
        model = %config.model.model,
        "Initializing model client"
    );
    let llm = Arc::new(OpenAiCompatClient::new(OpenAiCompatConfig::from_model_config(
        &config.model,
    ))?);
    let analyzer = FoodAnalyzer::new(llm);

    // =========================================================================
    // HTTP gateway
    // =========================================================================
    let auth = AuthKeys::new(config.auth.jwt_secret.as_ref(), config.auth.token_ttl_hours)?;
    let gateway_config = GatewayConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        ..GatewayConfig::default()
    };

    let server = GatewayServer::new(gateway_config, analyzer, store, auth);
    server.run().await?;

    Ok(())
}
