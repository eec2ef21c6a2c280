use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

/// Token pricing.
#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    /// Tokens charged per PDF page, and flat per image.
    pub cost_per_page: i64,
    /// Tokens credited to a freshly registered account.
    pub signup_grant: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            cost_per_page: 1,
            signup_grant: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub allowed_mime_types: Vec<String>,
    /// Maximum accepted file size in bytes.
    pub max_file_size: usize,
    /// Number of characters of extracted text echoed back on success.
    pub preview_chars: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_mime_types: DEFAULT_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
            max_file_size: 32 * 1024 * 1024,
            preview_chars: 200,
        }
    }
}

const DEFAULT_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg", "application/pdf"];

/// Location of the OCR/RAG extraction service.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub tokens: TokenConfig,
    pub upload: UploadConfig,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", vec!["http://localhost:5173"])?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 100)?
            .set_default("database.min_connections", 5)?
            .set_default("auth.token_ttl_days", 7)?
            .set_default("tokens.cost_per_page", 1)?
            .set_default("tokens.signup_grant", 0)?
            .set_default("upload.allowed_mime_types", DEFAULT_MIME_TYPES.to_vec())?
            .set_default("upload.max_file_size", 32 * 1024 * 1024)?
            .set_default("upload.preview_chars", 200)?
            .set_default("gateway.base_url", "http://127.0.0.1:8001")?
            .set_default("gateway.timeout_secs", 120)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., STUDY__TOKENS__COST_PER_PAGE)
            .add_source(Environment::with_prefix("STUDY").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the ledger and upload pipeline cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tokens.cost_per_page <= 0 {
            return Err(ConfigError::Message(
                "tokens.cost_per_page must be a positive integer".into(),
            ));
        }
        if self.tokens.signup_grant < 0 {
            return Err(ConfigError::Message(
                "tokens.signup_grant must not be negative".into(),
            ));
        }
        if self.upload.allowed_mime_types.is_empty() {
            return Err(ConfigError::Message(
                "upload.allowed_mime_types must not be empty".into(),
            ));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "gateway.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
