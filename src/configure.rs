use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub cancel_window_secs: u32,
    pub log_level: String,
    pub log_to_file: bool,
    pub log_file: String,
    /// Session token from a previous `login`, if any
    pub access_token: Option<String>,
    pub user_id: Option<u64>,
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    let s = Config::builder()
        // Set defaults
        .set_default("api_base_url", "http://localhost:8000")?
        .set_default("request_timeout_ms", 10_000)?
        .set_default("cancel_window_secs", 5)?
        .set_default("log_level", "info")?
        .set_default("log_to_file", false)?
        .set_default("log_file", "log/finvo.log")?
        // Add configuration from a file
        .add_source(File::with_name("config/config.yaml").required(false))
        // Add configuration from environment variables
        .add_source(config::Environment::with_prefix("FINVO"))
        .build()?;

    s.try_deserialize()
}
