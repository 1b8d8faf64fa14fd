// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Library half of the `presto-state` binary: argument definitions,
//! subcommands and summaries, kept here so tests can drive them directly.
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod summary;

use anyhow::Result;
use cli::Cli;
use presto_state_app_core::config::ConfigService;
use presto_state_config_fs::FsConfigStore;
use std::io::Write;
use tracing::warn;

/// Opens the preference store and runs the parsed command.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let store = match &cli.config_dir {
        Some(dir) => FsConfigStore::with_base(dir),
        None => FsConfigStore::new(),
    };
    let config = match store {
        Ok(store) => Some(ConfigService::new(store)),
        Err(err) => {
            warn!(%err, "preferences unavailable, using defaults");
            None
        }
    };
    commands::execute(cli.command, config.as_ref(), out)
}
