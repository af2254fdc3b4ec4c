//! Command-line front end for the grove tree engine.
//!
//! Reads a seed forest, runs a script of intents through a session and
//! prints the resulting forest. Nothing is written back to the input files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use grove::core::invariants::validate_invariants;
use grove::io::config::{CONFIG_FILE, GroveConfig, load_config, write_config};
use grove::io::forest_store::{load_children, load_forest, render_json, render_outline};
use grove::load::source::FixtureSource;
use grove::session::{Intent, TreeSession};

#[derive(Parser)]
#[command(
    name = "grove",
    version,
    about = "Editable lazily loaded tree engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default `grove.toml` if missing.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Check a forest file for invariant violations (duplicate ids, etc.).
    Validate {
        forest: PathBuf,
    },
    /// Print an indented outline of a forest file.
    Show {
        forest: PathBuf,
    },
    /// Run a JSON script of intents against a forest and print the result.
    Apply {
        forest: PathBuf,
        /// JSON array of intents, e.g. `[{"op":"rename","id":"r1","name":"A"}]`.
        #[arg(long)]
        script: PathBuf,
        /// JSON object mapping node ids to their lazily loaded children.
        #[arg(long)]
        children: Option<PathBuf>,
        /// Config file (defaults to `grove.toml` when present).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print an outline instead of JSON.
        #[arg(long)]
        outline: bool,
    },
}

fn main() {
    grove::logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(force),
        Command::Validate { forest } => cmd_validate(&forest),
        Command::Show { forest } => cmd_show(&forest),
        Command::Apply {
            forest,
            script,
            children,
            config,
            outline,
        } => cmd_apply(
            &forest,
            &script,
            children.as_deref(),
            config.as_deref(),
            outline,
        ),
    }
}

fn cmd_init(force: bool) -> Result<()> {
    let path = Path::new(CONFIG_FILE);
    if !force && path.exists() {
        return Ok(());
    }
    write_config(path, &GroveConfig::default()).context("write grove.toml")
}

fn cmd_validate(path: &Path) -> Result<()> {
    let forest = load_forest(path)?;
    info!(nodes = forest.walk().len(), "forest is valid");
    Ok(())
}

fn cmd_show(path: &Path) -> Result<()> {
    let forest = load_forest(path)?;
    print!("{}", render_outline(&forest));
    Ok(())
}

fn cmd_apply(
    forest_path: &Path,
    script_path: &Path,
    children_path: Option<&Path>,
    config_path: Option<&Path>,
    outline: bool,
) -> Result<()> {
    let config = load_config(config_path.unwrap_or(Path::new(CONFIG_FILE)))?;
    let forest = load_forest(forest_path)?;
    let source = match children_path {
        Some(path) => load_children(path)?,
        None => FixtureSource::default(),
    };
    let raw = fs::read_to_string(script_path)
        .with_context(|| format!("read script {}", script_path.display()))?;
    let script: Vec<Intent> = serde_json::from_str(&raw)
        .with_context(|| format!("parse script {}", script_path.display()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("build runtime")?;
    let session = TreeSession::with_config(forest, source, &config);
    let result = runtime.block_on(async {
        for (step, intent) in script.iter().enumerate() {
            info!(step, ?intent, "apply");
            session
                .apply(intent)
                .await
                .with_context(|| format!("script step {}", step))?;
        }
        anyhow::Ok(session.forest())
    })?;

    // Loaded children come from the fixture unchecked.
    let errors = validate_invariants(&result);
    if !errors.is_empty() {
        bail!("result violates invariants:\n- {}", errors.join("\n- "));
    }
    if outline {
        print!("{}", render_outline(&result));
    } else {
        print!("{}", render_json(&result)?);
    }
    Ok(())
}
