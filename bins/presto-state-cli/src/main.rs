// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `presto-state` entry point.

use anyhow::Result;
use clap::Parser;
use presto_state_cli::cli::Cli;
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// Env var holding an `EnvFilter` directive; wins over `-v`.
const LOG_ENV: &str = "PRESTO_STATE_LOG";

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut out = std::io::stdout().lock();
    presto_state_cli::run(cli, &mut out)?;
    out.flush()?;
    Ok(())
}
