//! Handles settings for the application. Configuration is written in
//! `settings.toml` and every key can be overridden from the environment,
//! e.g. `BUDGET_SYNC__DESTINATIONS__YNAB__ACCESS_TOKEN`.
//!
//! See `settings.toml` for the configuration.
use std::path::PathBuf;

use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use engine::DestinationsConfig;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "settings";
const DEFAULT_DAYS_BACK: u64 = 30;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Import {
    /// JSON document produced by the scraper.
    pub path: PathBuf,
    pub days_back: u64,
}

impl Default for Import {
    fn default() -> Self {
        Self {
            path: PathBuf::from("transactions.json"),
            days_back: DEFAULT_DAYS_BACK,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub import: Import,
    #[serde(default)]
    pub destinations: DestinationsConfig,
}

impl Settings {
    pub fn new(path: Option<&str>) -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false));
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings = builder
            .add_source(Environment::with_prefix("BUDGET_SYNC").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
