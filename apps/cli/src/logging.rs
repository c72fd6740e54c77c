//! Logging initialization for the CLI
//!
//! Events go to stderr so stdout carries only the composed output.
//! `RUST_LOG` overrides the configured level.

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = build_env_filter(config);
    let subscriber = tracing_subscriber::registry().with(env_filter);

    let installed = if config.json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    installed.context("Failed to install tracing subscriber")?;

    tracing::debug!(level = %config.level, json = config.json, "Logging initialized");
    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level for the library and the CLI.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(config)))
}

fn default_directives(config: &LoggingConfig) -> String {
    format!("metaquery={0},metaquery_cli={0}", config.level)
}
