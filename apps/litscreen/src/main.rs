//! # litscreen
//!
//! Literature record unification and evidence screening.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   apps/litscreen (THE BINARY)                │
//! │                                                              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌───────────────────┐  │
//! │  │    CLI      │   │  HTTP API   │   │ Sources / Store / │  │
//! │  │   (clap)    │   │   (axum)    │   │ Report (files)    │  │
//! │  └──────┬──────┘   └──────┬──────┘   └─────────┬─────────┘  │
//! │         └─────────────────┼────────────────────┘            │
//! │                           ▼                                 │
//! │                  ┌─────────────────┐                        │
//! │                  │ litscreen-core  │                        │
//! │                  │   (THE LOGIC)   │                        │
//! │                  └─────────────────┘                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! litscreen normalize --raw-dir data/raw --out data/processed
//! litscreen screen --raw-dir data/raw --out-dir data/processed --abstracts abstracts.json
//! litscreen title-filter -i abstract_check.csv -o filtered.csv
//! litscreen serve --port 8080
//! ```

use clap::Parser;
use litscreen::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // LITSCREEN_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("LITSCREEN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "litscreen=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  litscreen v{}
  record unification · evidence screening · PRISMA accounting
"#,
        env!("CARGO_PKG_VERSION")
    );
}
