//! # renalyser CLI (`rnl`)
//!
//! The `rnl` binary drives the dataset pipeline: store initialization,
//! validation and cleaning of CSV uploads, browsing stored datasets, and
//! PDF section extraction.
//!
//! ## Usage
//!
//! ```bash
//! rnl --config ./config/renalyser.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rnl init` | Create the SQLite store and run schema migrations |
//! | `rnl validate <file>` | Summarize a CSV, relay it to the LLM, store the original |
//! | `rnl clean <file>` | Deduplicate and impute a CSV, store the cleaned dataset |
//! | `rnl run <task> <file>` | Run a task by name |
//! | `rnl list` | List stored datasets with a short preview |
//! | `rnl show <fingerprint>` | Print a stored dataset in full |
//! | `rnl stats` | Store statistics |
//! | `rnl sections <file>` | Segment a PDF and store annotated sections |
//! | `rnl describe <file>` | Print the summary that would be sent to the LLM |

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use renalyser::config::{self, Config};
use renalyser::error::ConfigError;
use renalyser::pipeline::Task;
use renalyser::session::Session;
use renalyser::{records, sections_cmd, stats, task_cmd};

/// Exit status for missing required configuration.
const EXIT_CONFIG_MISSING: i32 = 2;

/// renalyser: research dataset validation, cleaning and storage.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. The file is optional; `RENALYSER_STORE_URL` and the LLM API key
/// variable override or supply what it leaves out.
#[derive(Parser)]
#[command(
    name = "rnl",
    about = "renalyser: validate, clean and store research datasets",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/renalyser.toml")]
    config: PathBuf,

    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the store schema.
    ///
    /// Idempotent: running it again leaves existing records untouched.
    Init,

    /// Validate a CSV upload with the language model and store it.
    Validate { file: PathBuf },

    /// Clean a CSV upload and store the cleaned dataset.
    Clean { file: PathBuf },

    /// Run a task by name (`validate` or `clean`).
    Run { task: String, file: PathBuf },

    /// List stored datasets.
    List,

    /// Print one stored dataset in full.
    ///
    /// Accepts the full fingerprint or a unique prefix.
    Show { fingerprint: String },

    /// Show store statistics.
    Stats,

    /// Extract, segment and annotate a PDF upload.
    Sections {
        file: PathBuf,

        /// Print the sections without writing them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the statistical summary of a CSV without calling the LLM.
    Describe {
        file: PathBuf,

        /// Print the full prompt instead of the summary.
        #[arg(long)]
        prompt: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "renalyser=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        if let Some(cfg_err) = err.downcast_ref::<ConfigError>() {
            if matches!(cfg_err, ConfigError::Missing { .. }) {
                eprintln!("Warning: {}", cfg_err);
                process::exit(EXIT_CONFIG_MISSING);
            }
        }
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Commands that never touch the store
    if let Commands::Describe { file, prompt } = &cli.command {
        return task_cmd::run_describe(file, *prompt);
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let session = Session::open(cfg).await?;
            session.close().await;
            println!("Store initialized successfully.");
        }
        Commands::Validate { file } => run_task(cfg, Task::Validate.name(), file).await?,
        Commands::Clean { file } => run_task(cfg, Task::Clean.name(), file).await?,
        Commands::Run { task, file } => {
            task.parse::<Task>()?;
            run_task(cfg, &task, file).await?;
        }
        Commands::List => {
            let session = Session::open(cfg).await?;
            let result = records::run_list(session.store().as_ref()).await;
            session.close().await;
            result?;
        }
        Commands::Show { fingerprint } => {
            let session = Session::open(cfg).await?;
            let result = records::run_show(session.store().as_ref(), &fingerprint).await;
            session.close().await;
            result?;
        }
        Commands::Stats => {
            let session = Session::open(cfg).await?;
            let result = stats::run_stats(&session).await;
            session.close().await;
            result?;
        }
        Commands::Sections { file, dry_run } => {
            if !dry_run {
                cfg.sections_url()?;
            }
            sections_cmd::run_sections(&cfg, &file, dry_run).await?;
        }
        Commands::Describe { .. } => {}
    }

    Ok(())
}

/// Check required inputs, then run one task inside a session.
async fn run_task(cfg: Config, task: &str, file: PathBuf) -> anyhow::Result<()> {
    cfg.store_url()?;
    cfg.require_api_key()?;

    let session = Session::open(cfg).await?;
    let result = task_cmd::run_task(&session, task, &file).await;
    session.close().await;
    result
}
