//! # Apotheca Back Office
//!
//! Command layer of the pharmacy POS: checkout, catalog, ledger,
//! purchasing, expenses and reports over an `apotheca-db` store.
//!
//! ## Module Organization
//! ```text
//! apotheca_backoffice/
//! ├── lib.rs          ◄─── You are here (startup helpers)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── cart.rs     ◄─── Checkout behind a Mutex
//! │   └── config.rs   ◄─── apotheca.toml + environment
//! ├── commands/       ◄─── One module per screen
//! ├── saga.rs         ◄─── Compensation for multi-step writes
//! ├── cli.rs          ◄─── `apotheca` argument parsing and output
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State Management
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Back-Office State                                    │
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐    │
//! │  │    DbState       │ │    CartState     │ │    AppConfig         │    │
//! │  │                  │ │                  │ │                      │    │
//! │  │  • Database      │ │  • Checkout      │ │  • Store name        │    │
//! │  │  • Repositories  │ │  • Lines, tender │ │  • UTC offset        │    │
//! │  │                  │ │                  │ │  • Stock thresholds  │    │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘    │
//! │                                                                         │
//! │  Each command takes only the state it needs.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod saga;
pub mod state;

#[cfg(test)]
mod test_support;

use tracing_subscriber::EnvFilter;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::{AppConfig, CartState, DbState};

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=apotheca=trace` - Show trace for apotheca crates only
/// - Default: INFO, DEBUG for apotheca crates
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,apotheca=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
