use crate::auth::TokenService;
use crate::error::set_expose_error_details;
use crate::helpers::retry::RetryConfig;
use crate::schemas::AppState;
use ::config::{Config, Environment};
use anyhow::{Context, Result, bail};
use sea_orm::Database;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info, warn};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://scmdash.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;

/// Runtime settings, read from the environment (and `.env`) over built-in defaults.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    /// Required; there is no fallback secret.
    pub jwt_secret: Option<String>,
    pub jwt_expiry_hours: i64,
    pub expose_error_details: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("expose_error_details", &self.expose_error_details)
            .finish()
    }
}

impl AppConfig {
    /// Load from `.env` and the process environment.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_environment(Environment::default().try_parsing(true))
    }

    /// Load from an explicit environment source.
    pub fn from_environment(environment: Environment) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("jwt_expiry_hours", DEFAULT_JWT_EXPIRY_HOURS)?
            .set_default("expose_error_details", false)?
            .add_source(environment)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        if config.jwt_expiry_hours <= 0 {
            bail!("JWT_EXPIRY_HOURS must be positive, got {}", config.jwt_expiry_hours);
        }
        Ok(config)
    }

    /// The signing secret, rejecting a missing or blank value.
    pub fn jwt_secret(&self) -> Result<&str> {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Ok(secret),
            _ => bail!("JWT_SECRET must be set to a non-empty value"),
        }
    }
}

/// Initialize application state from loaded configuration
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    let secret = config.jwt_secret()?;
    if secret.len() < 32 {
        warn!("JWT_SECRET is shorter than 32 bytes; use a longer random value in production");
    }

    set_expose_error_details(config.expose_error_details);
    if config.expose_error_details {
        warn!("EXPOSE_ERROR_DETAILS is enabled; 500 responses include internal error chains");
    }

    // Connect to database
    info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", config.database_url))?;

    let tokens = TokenService::new(
        secret.as_bytes(),
        chrono::Duration::hours(config.jwt_expiry_hours),
    );

    Ok(AppState {
        db,
        tokens,
        retry: RetryConfig::default(),
    })
}
