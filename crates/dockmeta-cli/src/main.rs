//! # dockmeta — Docker metadata for log events
//!
//! Reads newline-delimited JSON events, attaches metadata about the
//! container each event came from, and writes them back out.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod commands;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    commands::execute(cli)
}

/// Logs go to stderr; stdout carries the event stream.
fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
