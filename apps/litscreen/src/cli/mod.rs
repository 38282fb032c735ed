//! # litscreen CLI Module
//!
//! ## Available Commands
//!
//! - `normalize` - Normalize raw source payloads into one record index
//! - `screen` - Run the full merge and screening pipeline, write the report
//! - `title-filter` - Apply the title exclusion filter to a candidates CSV
//! - `terms` - Show the evidence term lists and active switches
//! - `serve` - Start the HTTP server

mod commands;

use crate::settings::{Overrides, Settings};
use clap::{Args, Parser, Subcommand};
use litscreen_core::ScreenError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// litscreen - literature record unification and evidence screening
///
/// Collapses duplicate records from several bibliographic databases and
/// screens them for mechanical-ventilation weaning and reinforcement
/// learning evidence.
#[derive(Parser, Debug)]
#[command(name = "litscreen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Settings file (defaults to ./litscreen.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Switches shared by the screening commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ScreeningFlags {
    /// Also require reinforcement-learning evidence at the title stage
    #[arg(long)]
    pub strict_rl: bool,

    /// Match evidence terms case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// Skip the rescue pass over title-stage exclusions
    #[arg(long)]
    pub no_rescue: bool,

    /// Identifiers per abstract provider call
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Pause between provider calls, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

impl ScreeningFlags {
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            strict_rl: self.strict_rl,
            case_sensitive: self.case_sensitive,
            no_rescue: self.no_rescue,
            batch_size: self.batch_size,
            delay_ms: self.delay_ms,
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize raw payloads into unified_index.{jsonl,csv}
    Normalize {
        /// Directory holding the downloaded payload files
        #[arg(short, long)]
        raw_dir: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Merge, screen and write the full report
    Screen {
        /// Directory holding the downloaded payload files
        #[arg(short, long)]
        raw_dir: Option<PathBuf>,

        /// Output directory for the report files
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Local abstract store (JSON keyed by lookup kind)
        #[arg(short, long)]
        abstracts: Option<PathBuf>,

        #[command(flatten)]
        flags: ScreeningFlags,
    },

    /// Remove candidates whose titles fail the exclusion filter
    TitleFilter {
        /// Candidates CSV with a title column
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV for the kept rows
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show evidence term lists and active switches
    Terms {
        #[command(flatten)]
        flags: ScreeningFlags,
    },

    /// Start HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Local abstract store shared by every request
        #[arg(short, long)]
        abstracts: Option<PathBuf>,

        #[command(flatten)]
        flags: ScreeningFlags,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), ScreenError> {
    let settings = Settings::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Normalize { raw_dir, out } => {
            let raw_dir = resolve_raw_dir(&settings, raw_dir);
            let out = resolve_out_dir(&settings, out);
            cmd_normalize(&raw_dir, &out, json_mode)
        }
        Commands::Screen {
            raw_dir,
            out_dir,
            abstracts,
            flags,
        } => {
            let raw_dir = resolve_raw_dir(&settings, raw_dir);
            let out_dir = resolve_out_dir(&settings, out_dir);
            let abstracts = abstracts.or_else(|| settings.paths.abstracts.clone());
            // SleepPacer blocks; keep it off the runtime workers
            tokio::task::spawn_blocking(move || {
                cmd_screen(
                    &settings,
                    &flags.overrides(),
                    &raw_dir,
                    &out_dir,
                    abstracts.as_deref(),
                    json_mode,
                )
            })
            .await
            .map_err(|e| ScreenError::Io(format!("Screening task failed: {}", e)))?
        }
        Commands::TitleFilter { input, output } => cmd_title_filter(&input, &output, json_mode),
        Commands::Terms { flags } => cmd_terms(&settings, &flags.overrides(), json_mode),
        Commands::Serve {
            host,
            port,
            abstracts,
            flags,
        } => {
            let abstracts = abstracts.or_else(|| settings.paths.abstracts.clone());
            cmd_serve(&settings, &flags.overrides(), &host, port, abstracts.as_deref()).await
        }
    }
}

/// Default directory for raw payloads.
pub const DEFAULT_RAW_DIR: &str = "data/raw";

/// Default directory for outputs.
pub const DEFAULT_OUT_DIR: &str = "data/processed";

fn resolve_raw_dir(settings: &Settings, flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| settings.paths.raw_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RAW_DIR))
}

fn resolve_out_dir(settings: &Settings, flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| settings.paths.out_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR))
}
