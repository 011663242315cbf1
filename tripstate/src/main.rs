//! `tripstate`: scaffold, replay store operations, and inspect state documents.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use tripstate::exit_codes;
use tripstate::io::config::{TripstateConfig, config_path, load_config};
use tripstate::io::document::load_document;
use tripstate::io::init::{InitOptions, init_project};
use tripstate::logging;
use tripstate::replay::{ReplayOptions, replay_files};
use tripstate::state::default_document;
use tripstate::store::StateStore;

#[derive(Parser)]
#[command(
    name = "tripstate",
    version,
    about = "Trip planner state store: replay scripted updates and inspect documents"
)]
struct Cli {
    /// Config file (defaults to `tripstate.toml` in the working directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write `tripstate.toml` and the built-in initial document.
    Init {
        /// Overwrite existing files.
        #[arg(long)]
        force: bool,
        /// Reject writes that would coerce non-container values.
        #[arg(long)]
        strict: bool,
    },
    /// Apply a replay script and print each notification as a JSON line.
    Replay {
        /// Replay script (JSON).
        #[arg(short, long)]
        script: PathBuf,
        /// Initial document; overrides `[document] path` from the config.
        #[arg(short, long)]
        document: Option<PathBuf>,
        /// Print the final document after the notifications.
        #[arg(long = "final")]
        print_final: bool,
    },
    /// Print the value at a dot-separated path (the whole document if omitted).
    Get {
        path: Option<String>,
        /// Document to read; overrides `[document] path` from the config.
        #[arg(short, long)]
        document: Option<PathBuf>,
    },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("resolve working directory")?;
    let config = || load_config(&config_path(cli.config.as_deref(), &cwd));
    match cli.command {
        Command::Init { force, strict } => cmd_init(&cwd, force, strict),
        Command::Replay {
            script,
            document,
            print_final,
        } => cmd_replay(config()?, script, document, print_final),
        Command::Get { path, document } => {
            cmd_get(&config()?, path.as_deref(), document.as_deref())
        }
    }
}

fn cmd_init(root: &Path, force: bool, strict: bool) -> Result<i32> {
    let paths = init_project(root, &InitOptions { force, strict })?;
    println!("wrote {}", paths.config_path.display());
    println!("wrote {}", paths.document_path.display());
    Ok(exit_codes::OK)
}

fn cmd_replay(
    config: TripstateConfig,
    script: PathBuf,
    document: Option<PathBuf>,
    print_final: bool,
) -> Result<i32> {
    let report = replay_files(&ReplayOptions {
        script,
        document,
        config,
    })?;
    for notification in &report.notifications {
        println!("{}", serde_json::to_string(notification)?);
    }
    if print_final {
        println!("{}", serde_json::to_string_pretty(&report.document)?);
    }
    Ok(exit_codes::OK)
}

fn cmd_get(config: &TripstateConfig, path: Option<&str>, document: Option<&Path>) -> Result<i32> {
    let source = document.or(config.document.path.as_deref());
    let initial = match source {
        Some(file) => load_document(file, config.document.schema.as_deref())?,
        None => default_document(),
    };
    let store = StateStore::with_policy(initial, config.coercion_policy());
    let path = path.unwrap_or("");
    match store.get(path) {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(exit_codes::OK)
        }
        None => {
            debug!(path, "path absent");
            Ok(exit_codes::ABSENT)
        }
    }
}
