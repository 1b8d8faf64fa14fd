// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Subcommand implementations. Output goes to the supplied writer; logs go
//! through `tracing`.

use crate::cli::{Command, DecodeArgs, Emit, FormatExprArgs, Kind, PlanArgs, PrefsCommand};
use crate::summary::Summary;
use anyhow::{bail, Context, Result};
use presto_state_app_core::config::{ConfigService, ConfigStore};
use presto_state_app_core::prefs::{CliPrefs, DecodePrefs, PrefsOverride, PREFS_KEY};
use presto_state_decode::{decode_best_effort, decode_str, decode_value, Decode, Registry};
use presto_state_model::{
    standard_registry, BufferInfo, Expression, MemoryPoolInfo, OutputBufferInfo, PlanFragment,
    QueryInfo, StageInfo, TaskInfo,
};
use presto_state_visit::{collect_table_scans, format_expression, PlanPrinter, PrintOptions};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Runs one subcommand. `config` is `None` when no preference store could
/// be opened; everything but `prefs` then runs on defaults.
pub fn execute<S: ConfigStore>(
    command: Command,
    config: Option<&ConfigService<S>>,
    out: &mut dyn Write,
) -> Result<()> {
    let stored = config.map_or_else(CliPrefs::default, load_prefs);
    match command {
        Command::Decode(args) => decode(args, &stored, out),
        Command::Plan(args) => plan(&args, &stored, out),
        Command::FormatExpr(args) => format_expr(&args, out),
        Command::Prefs(command) => {
            let Some(config) = config else {
                bail!("no configuration directory available; pass --config-dir");
            };
            prefs(command, config, stored, out)
        }
    }
}

fn load_prefs<S: ConfigStore>(config: &ConfigService<S>) -> CliPrefs {
    match config.load_or_default(PREFS_KEY) {
        Ok(prefs) => prefs,
        Err(err) => {
            warn!(%err, "ignoring stored preferences");
            CliPrefs::default()
        }
    }
}

/// Reads `path`, or stdin for `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn registry() -> Result<&'static Registry> {
    standard_registry().context("building the standard registry")
}

fn decode(args: DecodeArgs, stored: &CliPrefs, out: &mut dyn Write) -> Result<()> {
    let prefs = stored
        .clone()
        .with_overrides(PrefsOverride {
            best_effort: args.best_effort,
            pretty: args.pretty,
            ..PrefsOverride::default()
        })
        .decode;
    let raw = read_input(&args.input)?;
    debug!(kind = ?args.kind, bytes = raw.len(), best_effort = prefs.best_effort, "decoding");
    match args.kind {
        Kind::Query => emit::<QueryInfo>(raw, &prefs, args.emit, out),
        Kind::Stage => emit::<StageInfo>(raw, &prefs, args.emit, out),
        Kind::Task => emit::<TaskInfo>(raw, &prefs, args.emit, out),
        Kind::OutputBuffer => emit::<OutputBufferInfo>(raw, &prefs, args.emit, out),
        Kind::Buffer => emit::<BufferInfo>(raw, &prefs, args.emit, out),
        Kind::MemoryPool => emit::<MemoryPoolInfo>(raw, &prefs, args.emit, out),
        Kind::Fragment => emit::<PlanFragment>(raw, &prefs, args.emit, out),
        Kind::Expression => emit::<Expression>(raw, &prefs, args.emit, out),
    }
}

fn emit<T>(raw: String, prefs: &DecodePrefs, emit: Emit, out: &mut dyn Write) -> Result<()>
where
    T: Decode + Serialize + Summary,
{
    let registry = registry()?;
    let value = if prefs.best_effort {
        let (raw, result) = decode_best_effort::<T>(registry, raw).into_parts();
        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(path = %err.path, "{} kept undecoded", T::LABEL);
                writeln!(out, "error: {err}")?;
                writeln!(out, "{}", raw.trim_end())?;
                return Ok(());
            }
        }
    } else {
        decode_str::<T>(registry, &raw).with_context(|| format!("decoding {}", T::LABEL))?
    };
    info!("decoded {}", T::LABEL);
    match emit {
        Emit::Summary => {
            for line in value.summary() {
                writeln!(out, "{line}")?;
            }
        }
        Emit::Json => {
            let text = if prefs.pretty {
                serde_json::to_string_pretty(&value)?
            } else {
                serde_json::to_string(&value)?
            };
            writeln!(out, "{text}")?;
        }
    }
    Ok(())
}

fn plan(args: &PlanArgs, stored: &CliPrefs, out: &mut dyn Write) -> Result<()> {
    let prefs = stored
        .clone()
        .with_overrides(PrefsOverride {
            show_layout: args.show_layout,
            indent: args.indent,
            ..PrefsOverride::default()
        })
        .plan;
    let printer = PlanPrinter::new(PrintOptions {
        indent: prefs.indent,
        show_layout: prefs.show_layout,
    });
    let payload: Value =
        serde_json::from_str(&read_input(&args.input)?).context("parsing plan input")?;
    let registry = registry()?;

    // A query snapshot carries its fragments inside the stage tree.
    let query;
    let single;
    let fragments: Vec<&PlanFragment> = if payload.get("queryId").is_some() {
        query = decode_value::<QueryInfo>(registry, &payload).context("decoding query")?;
        query.fragments()
    } else {
        single = decode_value::<PlanFragment>(registry, &payload).context("decoding fragment")?;
        vec![&single]
    };
    if fragments.is_empty() {
        warn!("query has no planned stages");
    }

    for fragment in fragments {
        write!(out, "{}", printer.print_fragment(fragment)?)?;
        if args.scans {
            for scan in collect_table_scans(&fragment.root)? {
                writeln!(
                    out,
                    "  scan {} reads {}:{} ({})",
                    scan.node_id, scan.connector_id, scan.table, scan.handle_variant
                )?;
            }
        }
    }
    Ok(())
}

/// A `--param` value: JSON when it parses, a string otherwise.
pub fn parse_param(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

fn format_expr(args: &FormatExprArgs, out: &mut dyn Write) -> Result<()> {
    let expr: Expression = decode_str(registry()?, &read_input(&args.input)?)
        .context("decoding expression")?;
    let params: Vec<Value> = args.params.iter().map(|p| parse_param(p)).collect();
    // No --param at all means placeholders stay as `?`.
    let params = (!params.is_empty()).then_some(params.as_slice());
    writeln!(out, "{}", format_expression(&expr, params)?)?;
    Ok(())
}

fn prefs<S: ConfigStore>(
    command: PrefsCommand,
    config: &ConfigService<S>,
    stored: CliPrefs,
    out: &mut dyn Write,
) -> Result<()> {
    let shown = match command {
        PrefsCommand::Show => stored,
        PrefsCommand::Set(set) => {
            let updated = stored.clone().with_overrides(PrefsOverride {
                best_effort: set.best_effort,
                pretty: set.pretty,
                show_layout: set.show_layout,
                indent: set.indent,
            });
            if updated.plan.indent == 0 {
                warn!("indent 0 flattens plans");
            }
            if updated != stored {
                config.save(PREFS_KEY, &updated).context("saving preferences")?;
                info!("preferences saved");
            }
            updated
        }
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&shown)?)?;
    Ok(())
}
