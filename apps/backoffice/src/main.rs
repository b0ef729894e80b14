//! # Apotheca Back-Office Entry Point
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        apotheca (CLI)                                   │
//! │                                                                         │
//! │  main.rs ────► logging, config, database, dispatch                      │
//! │                                                                         │
//! │  cli.rs ─────► Cli::parse ──► Command ──► execute ──► text on stdout    │
//! │                                                                         │
//! │  commands/ ──► dashboard, withdraw, settle_checkout, ...                │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SQLite Database                          │  │
//! │  │  apotheca.db (one documents table, WAL mode)                     │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Parse arguments
//! 2. Initialize tracing (logging to stderr)
//! 3. Load apotheca.toml and `APOTHECA_*` overrides
//! 4. Open the database & run migrations
//! 5. Run the command, print its output

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use apotheca_backoffice::cli::{self, Cli};
use apotheca_backoffice::{init_tracing, AppConfig, DbState};

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors and --help exit here, before logging starts
    let args = Cli::parse();
    init_tracing();

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error");
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    info!(db_path = %config.database.path.display(), "Opening database");
    let db = match DbState::open(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Could not open database");
            eprintln!("Could not open database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = cli::execute(&args.command, &db, &config).await;
    db.inner().close().await;

    match result {
        Ok(output) => {
            println!("{}", output.trim_end());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(code = ?e.code, "Command failed");
            eprintln!("{}", e.message);
            ExitCode::FAILURE
        }
    }
}
