/// Configuration module
///
/// Loads configuration from TOML files and environment variables.
/// Priority: API_URL > APP__* ENV > TOML > defaults
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub url: String,
    #[serde(default = "default_verify_path")]
    pub verify_path: String,
    /// 0 disables the timeout
    #[serde(default)]
    pub request_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WalletConfig {
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApiConfig {
    /// Full endpoint URL; tolerates a trailing slash on the base
    pub fn verify_url(&self) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), self.verify_path)
    }
}

// Defaults
fn default_api_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_verify_path() -> String {
    "/api/verify".to_string()
}

fn default_user_agent() -> String {
    format!("wallet-verify/{}", env!("CARGO_PKG_VERSION"))
}

fn default_keypair_path() -> String {
    "~/.config/solana/id.json".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            url: default_api_url(),
            verify_path: default_verify_path(),
            request_timeout_ms: 0,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        WalletConfig {
            keypair_path: default_keypair_path(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

pub fn load_config() -> Result<Config, config::ConfigError> {
    let env = env::var("APP__ENV").unwrap_or_else(|_| "dev".to_string());

    let mut builder = config::Config::builder();

    // Try to load TOML file, but don't fail if it doesn't exist
    let config_path = format!("configs/{}/default", env);
    if std::path::Path::new(&format!("{}.toml", config_path)).exists() {
        builder = builder.add_source(config::File::with_name(&config_path).required(false));
    }

    // Environment variables override with APP__ prefix
    builder = builder.add_source(
        config::Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    // The frontend build convention: a bare API_URL wins over everything
    builder = builder.set_override_option("api.url", env::var("API_URL").ok())?;

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in ["API_URL", "APP__API__URL", "APP__API__REQUEST_TIMEOUT_MS", "APP__ENV"] {
            env::remove_var(key);
        }
        env::set_var("APP__ENV", "test-missing");
    }

    #[test]
    #[serial]
    fn defaults_apply_without_sources() {
        clear_env();
        let config = load_config().unwrap();
        assert_eq!(config.api.url, "http://127.0.0.1:5000");
        assert_eq!(config.api.verify_url(), "http://127.0.0.1:5000/api/verify");
        assert_eq!(config.api.request_timeout_ms, 0);
        assert_eq!(config.wallet.keypair_path, "~/.config/solana/id.json");
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    #[serial]
    fn app_env_overrides_defaults() {
        clear_env();
        env::set_var("APP__API__URL", "https://verify.example");
        env::set_var("APP__API__REQUEST_TIMEOUT_MS", "2500");
        let config = load_config().unwrap();
        assert_eq!(config.api.url, "https://verify.example");
        assert_eq!(config.api.request_timeout_ms, 2500);
        clear_env();
    }

    #[test]
    #[serial]
    fn bare_api_url_wins() {
        clear_env();
        env::set_var("APP__API__URL", "https://ignored.example");
        env::set_var("API_URL", "https://abcd.ngrok-free.app/");
        let config = load_config().unwrap();
        assert_eq!(config.api.verify_url(), "https://abcd.ngrok-free.app/api/verify");
        clear_env();
    }
}
