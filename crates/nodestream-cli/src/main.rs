// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! nodestream CLI entrypoint.
//!
//! Developer commands for working with node streams:
//!
//! ```text
//! nodestream inspect <stream>                 # header, sizes, dictionary counts
//! nodestream to-json <stream> [-o out.json]   # decode to the JSON tree model
//! nodestream from-json <tree.json> [--version v] [-o out.bin]
//! nodestream transcode <stream> [--to v] [-o out.bin]
//! nodestream config show|set|path
//! ```
//!
//! Writer version and depth limit default to the stored codec config. Pass
//! `-v` / `-vv` for debug / trace logs on stderr; `RUST_LOG` is honoured too.
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use nodestream::StreamVersion;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect, convert and transcode node streams")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Config directory (defaults to the platform config dir).
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the first tree of a stream.
    Inspect {
        /// Stream file.
        input: PathBuf,
        /// Emit the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Decode the first tree of a stream to JSON.
    ToJson {
        /// Stream file.
        input: PathBuf,
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Encode a JSON tree as a stream.
    FromJson {
        /// JSON tree file.
        input: PathBuf,
        /// Stream version to write (lithium, neon-sr2, sodium-sr1, magnesium).
        #[arg(long)]
        version: Option<StreamVersion>,
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-encode the first tree of a stream in another version.
    Transcode {
        /// Stream file.
        input: PathBuf,
        /// Target version.
        #[arg(long)]
        to: Option<StreamVersion>,
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show or change the stored codec config.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective codec config as JSON.
    Show,
    /// Update stored settings.
    Set {
        /// Default writer version.
        #[arg(long)]
        version: Option<StreamVersion>,
        /// Nesting limit for readers and writers.
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Print the file the codec config is stored in.
    Path,
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let config_dir = cli.config_dir.as_deref();

    match cli.command {
        Command::Inspect { input, json } => commands::inspect(config_dir, &input, json),
        Command::ToJson { input, output } => commands::to_json(config_dir, &input, output.as_deref()),
        Command::FromJson {
            input,
            version,
            output,
        } => commands::from_json(config_dir, &input, version, output.as_deref()),
        Command::Transcode { input, to, output } => {
            commands::transcode(config_dir, &input, to, output.as_deref())
        }
        Command::Config { action } => match action {
            ConfigAction::Show => commands::config_show(config_dir),
            ConfigAction::Set { version, max_depth } => {
                commands::config_set(config_dir, version, max_depth)
            }
            ConfigAction::Path => commands::config_path(config_dir),
        },
    }
}
