use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Base URL of the OpenAI-compatible chat-completions API.
    pub base_url: String,
    /// Vision-capable model identifier.
    pub model: String,
    pub api_key: Option<Secret<String>>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub database_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<Secret<String>>,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    pub json_logs: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("NUTRILOG_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__SERVER__PORT=3000 to app.server.port
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 3000,
            },
            model: ModelConfig {
                base_url: "https://api.sambanova.ai/v1".into(),
                model: "Llama-4-Maverick-17B-128E-Instruct".into(),
                api_key: None,
                max_tokens: 1500,
                temperature: 0.4,
                request_timeout_secs: 60,
            },
            store: StoreConfig {
                database_path: "nutrilog.db".into(),
            },
            auth: AuthConfig {
                jwt_secret: None,
                token_ttl_hours: 24,
            },
            logging: LoggingConfig { json_logs: false },
        }
    }
}
