//! Axum-based HTTP server for NutriLog.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use nutrilog_analyzer::FoodAnalyzer;
use nutrilog_core::{traits::NutritionStore, Error, Result};

use crate::auth::AuthKeys;
use crate::routes;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Enable request tracing.
    pub enable_tracing: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            enable_tracing: true,
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Photo analyzer.
    pub analyzer: FoodAnalyzer,
    /// Persistence.
    pub store: Arc<dyn NutritionStore>,
    /// Token keys.
    pub auth: AuthKeys,
}

/// Gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: Arc<AppState>,
}

impl GatewayServer {
    /// Create a new gateway server.
    pub fn new(
        config: GatewayConfig,
        analyzer: FoodAnalyzer,
        store: Arc<dyn NutritionStore>,
        auth: AuthKeys,
    ) -> Self {
        Self {
            config,
            state: Arc::new(AppState {
                analyzer,
                store,
                auth,
            }),
        }
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(routes::health_handler))
            .route("/v1/auth/register", post(routes::register_handler))
            .route("/v1/auth/login", post(routes::login_handler))
            .route("/v1/analyze", post(routes::analyze_handler))
            .route("/v1/logs", get(routes::logs_handler))
            .route("/v1/summary", get(routes::summary_handler))
            .route(
                "/v1/profile",
                get(routes::get_profile_handler).put(routes::put_profile_handler),
            )
            .route("/v1/advice", post(routes::advice_handler))
            .with_state(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any));
        }

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Run the server until shutdown.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let router = self.build_router();

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::internal(format!("bind {addr} failed: {e}")))?;

        tracing::info!(addr = %addr, "Gateway listening");

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::internal(format!("server error: {e}")))
    }
}
