//! `dockmeta inspect` — Show the metadata derived for one container.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use dockmeta_common::config::DockmetaConfig;
use dockmeta_common::types::ContainerId;
use dockmeta_runtime::enricher::Enricher;
use dockmeta_runtime::observer::NoopObserver;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Container ID or name.
    pub container: String,
}

/// Executes the `inspect` command.
///
/// Runs regardless of the `enabled` flag so a configuration can be tried
/// out before it is switched on.
///
/// # Errors
///
/// Returns an error if the runtime cannot be reached or does not know the
/// container.
pub fn execute(args: &InspectArgs, config: &DockmetaConfig) -> anyhow::Result<()> {
    let enricher = super::build_enricher(&config.docker_metadata, Arc::new(NoopObserver))?;
    let id = ContainerId::new(&args.container);
    write_metadata(&enricher, &id, &mut io::stdout().lock())
}

fn write_metadata<W: Write>(enricher: &Enricher, id: &ContainerId, out: &mut W) -> anyhow::Result<()> {
    let metadata = enricher
        .metadata_for(id)
        .with_context(|| format!("deriving metadata for container {id}"))?;
    serde_json::to_writer_pretty(&mut *out, &metadata)?;
    writeln!(out)?;
    Ok(())
}
