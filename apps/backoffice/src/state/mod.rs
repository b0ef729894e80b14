//! # State Module
//!
//! Application state for the back office, split by concern so each
//! command declares exactly what it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   DbState    │  │  CartState   │  │    AppConfig     │              │
//! │  │              │  │              │  │                  │              │
//! │  │  Database    │  │  Arc<Mutex<  │  │  store name      │              │
//! │  │  (document   │  │   Checkout   │  │  UTC offset      │              │
//! │  │   store)     │  │  >>          │  │  thresholds      │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: the store is Send + Sync (pool or mutex inside)            │
//! │  • CartState: tokio Mutex, held through settlement                     │
//! │  • AppConfig: read-only after load                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod db;

pub use cart::CartState;
pub use config::{AppConfig, ConfigError, DatabaseConfig, InventoryConfig, StoreConfig};
pub use db::DbState;
