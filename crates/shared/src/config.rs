//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Step-up verification configuration.
    #[serde(default)]
    pub verification: VerificationConfig,
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// Refresh token expiration in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> u64 {
    604_800 // 7 days
}

/// Step-up verification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Lifetime of a pending verification record in seconds.
    #[serde(default = "default_pending_ttl")]
    pub pending_ttl_secs: u64,
    /// Number of backup codes issued per batch.
    #[serde(default = "default_backup_code_count")]
    pub backup_code_count: u8,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            pending_ttl_secs: default_pending_ttl(),
            backup_code_count: default_backup_code_count(),
        }
    }
}

fn default_pending_ttl() -> u64 {
    300 // 5 minutes
}

fn default_backup_code_count() -> u8 {
    10
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
