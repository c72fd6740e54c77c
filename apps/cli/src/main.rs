//! metaquery: compose search criteria documents into parameterized SQL.
//!
//! Reads a criteria tree as JSON from a file or stdin and prints the
//! composed statement with its parameters.

mod config;
mod logging;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use metaquery::{ComposedQuery, Dialect, EntityNode, QueryBuilder};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "metaquery")]
#[command(author, version, about = "Compose metadata search criteria into PostgreSQL statements")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (default: ./metaquery.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the statement and parameters as JSON
    Compose {
        #[command(flatten)]
        source: SourceArgs,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Verify placeholder/parameter alignment and list the CTEs
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Criteria document, `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Metadata column dialect: jsonb or json
    #[arg(short, long)]
    dialect: Option<Dialect>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Compose { source, pretty } => {
            let (query, _) = run(&source, &config)?;
            let output = if pretty || config.output.pretty {
                serde_json::to_string_pretty(&query)?
            } else {
                serde_json::to_string(&query)?
            };
            println!("{output}");
        }
        Commands::Check { source } => {
            let (query, aliases) = run(&source, &config)?;
            println!("placeholders: {}", query.max_placeholder());
            println!("parameters:   {}", query.parameters.len());
            println!("ctes:         {}", aliases.join(", "));
            anyhow::ensure!(
                query.is_aligned(),
                "statement uses {} placeholders but {} parameters were bound",
                query.max_placeholder(),
                query.parameters.len()
            );
            println!("ok");
        }
    }

    Ok(())
}

fn run(source: &SourceArgs, config: &Config) -> anyhow::Result<(ComposedQuery, Vec<String>)> {
    let raw = read_input(&source.input)?;
    let criteria = EntityNode::from_json_str(&raw).context("Failed to decode criteria")?;

    let dialect = source.dialect.unwrap_or(config.dialect);
    tracing::info!(%dialect, input = %source.input.display(), "Composing criteria");

    let plan = QueryBuilder::new(dialect)
        .plan(&criteria)
        .context("Failed to compose query")?;
    let aliases = plan.cte_aliases().into_iter().map(String::from).collect();
    Ok((plan.into_composed(), aliases))
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read criteria from stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read criteria from {}", path.display()))
    }
}
