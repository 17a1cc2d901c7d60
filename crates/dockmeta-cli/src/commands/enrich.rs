//! `dockmeta enrich` — Enrich a stream of JSON events.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use dockmeta_common::config::DockmetaConfig;
use dockmeta_common::types::Event;
use dockmeta_runtime::enricher::{EnrichOutcome, Enricher};
use dockmeta_runtime::metrics::EnrichMetrics;

/// Arguments for the `enrich` command.
#[derive(Args, Debug)]
pub struct EnrichArgs {
    /// Read events from this file instead of stdin.
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

/// Executes the `enrich` command.
///
/// Events go to stdout one per line. Lines that are not JSON objects, and
/// events that gain no metadata, are written back exactly as read.
///
/// # Errors
///
/// Returns an error if the input cannot be read, stdout cannot be written,
/// or the runtime client cannot be configured.
pub fn execute(args: &EnrichArgs, config: &DockmetaConfig) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let metrics = Arc::new(EnrichMetrics::new());
    let enricher = if config.docker_metadata.enabled {
        Some(super::build_enricher(
            &config.docker_metadata,
            metrics.clone(),
        )?)
    } else {
        tracing::info!("docker metadata disabled; passing events through");
        None
    };

    let mut out = BufWriter::new(io::stdout().lock());
    let lines = pump(reader, &mut out, enricher.as_ref())?;
    out.flush().context("flushing stdout")?;

    tracing::info!(lines, metrics = ?metrics.snapshot(), "enrichment finished");
    Ok(())
}

/// Copies `reader` to `writer` line by line, enriching JSON object events.
///
/// Lines are handled as raw bytes; anything that does not decode as a JSON
/// object, invalid UTF-8 included, is copied unchanged. A final line without
/// a newline gets one.
///
/// Returns the number of lines processed.
fn pump<R: BufRead, W: Write>(
    mut reader: R,
    writer: &mut W,
    enricher: Option<&Enricher>,
) -> anyhow::Result<u64> {
    let mut lines = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader
            .read_until(b'\n', &mut buf)
            .context("reading input")?
            == 0
        {
            break;
        }
        lines += 1;

        let line = buf.strip_suffix(b"\n").unwrap_or(&buf);
        let enriched = enricher.and_then(|enricher| {
            let mut event = serde_json::from_slice(line)
                .ok()
                .and_then(Event::from_value)?;
            match enricher.enrich(&mut event) {
                EnrichOutcome::Enriched { .. } => Some(event),
                _ => None,
            }
        });

        match enriched {
            Some(event) => serde_json::to_writer(&mut *writer, &event)?,
            None => writer.write_all(line)?,
        }
        writer.write_all(b"\n")?;
    }
    Ok(lines)
}
