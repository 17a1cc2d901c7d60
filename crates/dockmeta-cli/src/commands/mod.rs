//! CLI command definitions and dispatch.

pub mod enrich;
pub mod inspect;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dockmeta_common::config::{DockerMetadataConfig, DockmetaConfig};
use dockmeta_runtime::enricher::Enricher;
use dockmeta_runtime::observer::EnrichObserver;
use dockmeta_runtime::store::MetadataStore;

/// Dockmeta — attach Docker container metadata to log events.
#[derive(Parser, Debug)]
#[command(name = "dockmeta", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file.
    #[arg(
        short,
        long,
        global = true,
        env = "DOCKMETA_CONFIG",
        default_value = dockmeta_common::constants::DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enrich newline-delimited JSON events from stdin or a file.
    Enrich(enrich::EnrichArgs),
    /// Print the metadata derived for one container.
    Inspect(inspect::InspectArgs),
    /// Check the configuration and compile every metadata template.
    Validate,
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command
/// fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = DockmetaConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    tracing::debug!(path = %cli.config.display(), "configuration loaded");

    match cli.command {
        Command::Enrich(args) => enrich::execute(&args, &config),
        Command::Inspect(args) => inspect::execute(&args, &config),
        Command::Validate => validate::execute(&config),
    }
}

/// Connects to the runtime and builds an enricher with a fresh store.
fn build_enricher(
    docker: &DockerMetadataConfig,
    observer: Arc<dyn EnrichObserver>,
) -> anyhow::Result<Enricher> {
    let client = dockmeta_runtime::client::connect(&docker.connection)
        .context("connecting to the container runtime")?;
    Ok(Enricher::new(
        docker.extraction.clone(),
        client,
        Arc::new(MetadataStore::new()),
    )
    .with_observer(observer))
}
