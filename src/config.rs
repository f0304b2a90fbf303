// src/config.rs

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub user_id: i64,
    pub watchlist: String,
    pub strategy: String,
    pub chart_lookback_days: u32,
    pub export_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Defaults, then an optional `Settings.{toml,json,..}`, then `SCREENER_*` variables.
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name("Settings").required(false))
            .add_source(Environment::with_prefix("SCREENER"));

        let config = builder.build()?;
        config.try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("api_url", "http://localhost:5001")?
            .set_default("timeout_secs", 30)?
            .set_default("user_id", 1)?
            .set_default("watchlist", "BIST TUM")?
            .set_default("strategy", "XTUMYV27Strategy")?
            .set_default("chart_lookback_days", 90)?
            .set_default("export_dir", ".")?
            .set_default("log_dir", "logs")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
