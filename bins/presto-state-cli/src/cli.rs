// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line surface.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Decode and inspect Presto coordinator state snapshots.
#[derive(Parser, Debug)]
#[command(name = "presto-state", author, version, about)]
pub struct Cli {
    /// Raise log verbosity (repeatable). `PRESTO_STATE_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Keep preferences under this directory instead of the platform config dir.
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,
    /// Subcommand.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a payload and print a summary or the re-encoded JSON.
    Decode(DecodeArgs),
    /// Print the plan of a fragment, or of every fragment in a query.
    Plan(PlanArgs),
    /// Render an expression tree as SQL.
    FormatExpr(FormatExprArgs),
    /// Show or change stored preferences.
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

/// What a payload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// `QueryInfo`.
    Query,
    /// `StageInfo`.
    Stage,
    /// `TaskInfo`.
    Task,
    /// `OutputBufferInfo`.
    OutputBuffer,
    /// `BufferInfo`.
    Buffer,
    /// `MemoryPoolInfo`.
    MemoryPool,
    /// `PlanFragment`.
    Fragment,
    /// `Expression`.
    Expression,
}

/// Output form of `decode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Emit {
    /// Human-readable key facts.
    #[default]
    Summary,
    /// The decoded value encoded back to JSON.
    Json,
}

/// `decode` arguments.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Payload type.
    #[arg(long, value_enum)]
    pub kind: Kind,
    /// Keep going on failure: print the error and the raw payload.
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub best_effort: Option<bool>,
    /// Pretty-print JSON output.
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub pretty: Option<bool>,
    /// Output form.
    #[arg(long, value_enum, default_value_t = Emit::Summary)]
    pub emit: Emit,
    /// Input file, or `-` for stdin.
    pub input: PathBuf,
}

/// `plan` arguments.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Append output symbols to each node.
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub show_layout: Option<bool>,
    /// Spaces per nesting level.
    #[arg(long)]
    pub indent: Option<usize>,
    /// List the tables each plan reads.
    #[arg(long)]
    pub scans: bool,
    /// `QueryInfo` or `PlanFragment` file, or `-` for stdin.
    pub input: PathBuf,
}

/// `format-expr` arguments.
#[derive(Args, Debug)]
pub struct FormatExprArgs {
    /// Value for the next placeholder, as JSON (bare words are strings).
    #[arg(long = "param", value_name = "VALUE")]
    pub params: Vec<String>,
    /// Expression file, or `-` for stdin.
    pub input: PathBuf,
}

/// `prefs` subcommands.
#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Print the stored preferences.
    Show,
    /// Update stored preferences.
    Set(PrefsSetArgs),
}

/// `prefs set` arguments; omitted values stay unchanged.
#[derive(Args, Debug)]
pub struct PrefsSetArgs {
    /// Default for `decode --best-effort`.
    #[arg(long, value_name = "BOOL")]
    pub best_effort: Option<bool>,
    /// Default for `decode --pretty`.
    #[arg(long, value_name = "BOOL")]
    pub pretty: Option<bool>,
    /// Default for `plan --show-layout`.
    #[arg(long, value_name = "BOOL")]
    pub show_layout: Option<bool>,
    /// Default for `plan --indent`.
    #[arg(long)]
    pub indent: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_flag_means_true() {
        let cli = Cli::try_parse_from(["presto-state", "decode", "--kind", "task", "--best-effort", "t.json"])
            .unwrap();
        let Command::Decode(args) = cli.command else {
            panic!("expected decode");
        };
        assert_eq!(args.best_effort, Some(true));
        assert_eq!(args.pretty, None);
        assert_eq!(args.emit, Emit::Summary);
    }

    #[test]
    fn repeated_params_keep_their_order() {
        let cli = Cli::try_parse_from([
            "presto-state", "-vv", "format-expr", "--param", "42", "--param", "x", "-",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::FormatExpr(args) = cli.command else {
            panic!("expected format-expr");
        };
        assert_eq!(args.params, ["42", "x"]);
        assert_eq!(args.input, PathBuf::from("-"));
    }
}
