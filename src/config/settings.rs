//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Document store configuration
    pub database: DatabaseSettings,

    /// Redis configuration
    pub redis: RedisSettings,

    /// Analytics counter backend
    pub analytics: AnalyticsSettings,

    /// Identity token verification settings
    pub auth: AuthSettings,

    /// Outbound email settings
    pub email: EmailSettings,

    /// Application lifecycle rules
    pub applications: ApplicationSettings,

    /// Snowflake ID generator settings
    pub snowflake: SnowflakeSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// Which store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Backend selection
    pub backend: StorageBackend,

    /// Database connection URL (ignored for the memory backend)
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Run embedded migrations at startup
    pub run_migrations: bool,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    #[serde(default)]
    pub url: String,

    /// Prefix applied to every analytics key
    pub key_prefix: String,
}

/// Which store keeps analytics counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsBackend {
    Redis,
    Memory,
}

/// Analytics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsSettings {
    pub backend: AnalyticsBackend,
}

/// Identity token verification.
///
/// Tokens are issued by the identity provider and signed with a shared secret.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Shared HS256 secret
    pub token_secret: String,

    /// Expected `iss` claim, if any
    pub issuer: Option<String>,

    /// Expected `aud` claim, if any
    pub audience: Option<String>,

    /// Clock skew tolerance in seconds
    pub leeway_secs: u64,
}

/// Which transport delivers email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    /// Transactional email HTTP API
    Http,
    /// Log and keep messages in memory
    Log,
}

/// Outbound email configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    pub provider: EmailProvider,

    /// Transactional API endpoint
    #[serde(default)]
    pub api_url: String,

    /// Transactional API key
    #[serde(default)]
    pub api_key: String,

    /// Sender address, e.g. "Volunteer Match <no-reply@example.org>"
    pub from: String,

    /// Public web app URL used for links inside emails
    pub app_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Application lifecycle rules.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    /// Withdrawals close this many hours before the opportunity starts
    pub withdrawal_cutoff_hours: i64,
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-31)
    pub machine_id: u16,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Minimum required length for the token secret (256 bits = 32 bytes)
pub const MIN_TOKEN_SECRET_LENGTH: usize = 32;

/// Default withdrawal cutoff before an opportunity starts.
pub const DEFAULT_WITHDRAWAL_CUTOFF_HOURS: i64 = 12;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. built-in defaults
    /// 2. config/default.toml (base configuration)
    /// 3. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 4. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if a required value is missing for the selected backends.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Self::builder(&environment)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("auth.token_secret", std::env::var("AUTH_TOKEN_SECRET").ok())?
            .set_override_option("email.api_key", std::env::var("EMAIL_API_KEY").ok())?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    /// Settings suitable for tests and local runs: memory store, log mailer.
    pub fn in_memory(token_secret: &str) -> Result<Self, ConfigError> {
        Self::builder("test")?
            .set_override("database.backend", "memory")?
            .set_override("analytics.backend", "memory")?
            .set_override("email.provider", "log")?
            .set_override("auth.token_secret", token_secret)?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("redis.key_prefix", "vm:analytics")?
            .set_default("analytics.backend", "redis")?
            .set_default("auth.leeway_secs", 30)?
            .set_default("email.provider", "log")?
            .set_default("email.from", "Volunteer Match <no-reply@volunteer-match.local>")?
            .set_default("email.app_url", "http://localhost:5173")?
            .set_default("email.timeout_secs", 10)?
            .set_default(
                "applications.withdrawal_cutoff_hours",
                DEFAULT_WITHDRAWAL_CUTOFF_HOURS,
            )?
            .set_default("snowflake.machine_id", 1)?
            .set_default("cors.allowed_origins", vec!["http://localhost:5173"])
    }

    fn validate(settings: Self) -> Result<Self, ConfigError> {
        if settings.auth.token_secret.len() < MIN_TOKEN_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "Token secret must be at least {} characters for security. Current length: {}",
                MIN_TOKEN_SECRET_LENGTH,
                settings.auth.token_secret.len()
            )));
        }
        if settings.database.backend == StorageBackend::Postgres && settings.database.url.is_empty()
        {
            return Err(ConfigError::Message(
                "database.url is required for the postgres backend".into(),
            ));
        }
        if settings.analytics.backend == AnalyticsBackend::Redis && settings.redis.url.is_empty() {
            return Err(ConfigError::Message(
                "redis.url is required for the redis analytics backend".into(),
            ));
        }
        if settings.email.provider == EmailProvider::Http
            && (settings.email.api_url.is_empty() || settings.email.api_key.is_empty())
        {
            return Err(ConfigError::Message(
                "email.api_url and email.api_key are required for the http provider".into(),
            ));
        }
        if settings.applications.withdrawal_cutoff_hours < 0 {
            return Err(ConfigError::Message(
                "applications.withdrawal_cutoff_hours must not be negative".into(),
            ));
        }
        Ok(settings)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
