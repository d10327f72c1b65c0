//! Tag-driven payload generator CLI.
//!
//! Reads a marked-up template plus a TOML generator configuration and prints
//! one generated payload per line on stdout.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tagforge::core::markup::Mode;
use tagforge::core::types::{Operation, PersistentOperation};
use tagforge::engine::Engine;
use tagforge::exit_codes;
use tagforge::io::config::{config_dir, load_config};
use tagforge::io::corpus::CorpusManifest;
use tagforge::logging;
use tracing::info;

#[derive(Parser)]
#[command(name = "tagforge", version, about = "Tag-driven payload generator")]
struct Cli {
    /// Raise log verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every generated payload, one per line.
    Generate {
        template: PathBuf,
        #[arg(long)]
        config: PathBuf,
        /// Stop after this many payloads.
        #[arg(long)]
        limit: Option<usize>,
        /// Shuffle list-based strategies (overrides the config file).
        #[arg(long)]
        randomize: bool,
        /// Seed alias generation and shuffling (overrides the config file).
        #[arg(long)]
        seed: Option<u64>,
        /// Emit JSON lines with `index`, `label` and `body`.
        #[arg(long)]
        json: bool,
    },
    /// Print the template with every region showing its literal text.
    Preview {
        template: PathBuf,
        #[arg(long)]
        config: PathBuf,
    },
    /// Print the detected mode, aliased template and operations as JSON.
    Inspect {
        template: PathBuf,
        #[arg(long)]
        config: PathBuf,
    },
    /// List the keywords of a corpus directory.
    Corpus { dir: PathBuf },
}

#[derive(Debug, Default, Clone, Copy)]
struct Overrides {
    randomize: bool,
    seed: Option<u64>,
}

#[derive(Serialize)]
struct Inspection<'a> {
    mode: Mode,
    template: &'a str,
    operations: &'a [Operation],
    persistent: &'a [PersistentOperation],
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Generate {
            template,
            config,
            limit,
            randomize,
            seed,
            json,
        } => cmd_generate(&template, &config, limit, Overrides { randomize, seed }, json),
        Command::Preview { template, config } => cmd_preview(&template, &config),
        Command::Inspect { template, config } => cmd_inspect(&template, &config),
        Command::Corpus { dir } => cmd_corpus(&dir),
    }
}

fn cmd_generate(
    template: &Path,
    config: &Path,
    limit: Option<usize>,
    overrides: Overrides,
    json: bool,
) -> Result<i32> {
    let engine = build_engine(template, config, overrides)?;
    let mut out = io::stdout().lock();
    let mut count = 0;
    for payload in engine.take(limit.unwrap_or(usize::MAX)) {
        let payload = payload?;
        if json {
            let line = serde_json::to_string(&payload).context("serialize payload")?;
            writeln!(out, "{line}").context("write stdout")?;
        } else {
            writeln!(out, "{}", payload.body).context("write stdout")?;
        }
        count += 1;
    }
    out.flush().context("flush stdout")?;
    info!(count, "generation finished");
    if count == 0 {
        return Ok(exit_codes::EMPTY);
    }
    Ok(exit_codes::OK)
}

fn cmd_preview(template: &Path, config: &Path) -> Result<i32> {
    let engine = build_engine(template, config, Overrides::default())?;
    println!("{}", engine.evaluate_with_originals()?);
    Ok(exit_codes::OK)
}

fn cmd_inspect(template: &Path, config: &Path) -> Result<i32> {
    let engine = build_engine(template, config, Overrides::default())?;
    let inspection = Inspection {
        mode: engine.mode(),
        template: engine.aliased_template(),
        operations: engine.operations(),
        persistent: engine.persistent_operations(),
    };
    let rendered = serde_json::to_string_pretty(&inspection).context("serialize inspection")?;
    println!("{rendered}");
    Ok(exit_codes::OK)
}

fn cmd_corpus(dir: &Path) -> Result<i32> {
    let manifest = CorpusManifest::load(dir)?;
    for keyword in manifest.keywords() {
        println!("{keyword}");
    }
    Ok(exit_codes::OK)
}

fn build_engine(template: &Path, config: &Path, overrides: Overrides) -> Result<Engine> {
    let cfg = load_config(config)?;
    let base_dir = config_dir(config);
    let transforms = cfg.build_transforms(&base_dir)?;
    let source = read_template(template)?;

    let mut builder = Engine::builder(&source, transforms)
        .randomize_lists(overrides.randomize || cfg.randomize_lists);
    if let Some(seed) = overrides.seed.or(cfg.seed) {
        builder = builder.seed(seed);
    }
    if let Some(words) = cfg.word_source(&base_dir) {
        builder = builder.words(words);
    }
    let engine = builder
        .build()
        .with_context(|| format!("parse template {}", template.display()))?;
    info!(mode = ?engine.mode(), operations = engine.operations().len(), "engine ready");
    Ok(engine)
}

/// Read a template file; one trailing newline is not part of the template.
fn read_template(path: &Path) -> Result<String> {
    let mut contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    if contents.ends_with('\n') {
        contents.pop();
        if contents.ends_with('\r') {
            contents.pop();
        }
    }
    Ok(contents)
}
