//! Layered CLI configuration.
//!
//! Sources, lowest precedence first: built-in defaults, `metaquery.toml` in
//! the working directory (or the file given with `--config`), then
//! `METAQUERY__*` environment variables (`METAQUERY__LOGGING__LEVEL=debug`).
//! A `.env` file is loaded into the environment before anything is read.

use std::path::Path;

use anyhow::Context;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};
use metaquery::Dialect;
use serde::Deserialize;

const DEFAULT_FILE: &str = "metaquery";
const ENV_PREFIX: &str = "METAQUERY";
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub dialect: Dialect,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// JSON lines instead of human-readable output
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputConfig {
    pub pretty: bool,
}

impl Config {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = defaults()?;
        let builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_FILE).required(false)),
        };
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration sources")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn validate(&self) -> Result<(), String> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            ));
        }
        Ok(())
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("dialect", Dialect::default().as_str())?
        .set_default("logging.level", "warn")?
        .set_default("logging.json", false)?
        .set_default("output.pretty", false)
}
