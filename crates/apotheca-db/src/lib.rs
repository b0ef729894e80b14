//! # apotheca-db: Document Store for the Pharmacy Back Office
//!
//! Every pharmacy record is a JSON document in a named collection. This
//! crate provides the store abstraction, its SQLite and in-memory backends
//! and one typed repository per collection.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Apotheca Data Flow                               │
//! │                                                                         │
//! │  Backoffice command (settle_checkout)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   apotheca-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │ DocumentStore│  │   │
//! │  │   │   (pool.rs)   │    │               │    │   (trait)    │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │───►│ LedgerRepo    │───►│ SQLite       │  │   │
//! │  │   │ Migrations    │    │ SaleRepo  ... │    │ Memory       │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        documents(collection, id, body JSON, version)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - `DocumentStore` trait and its backends
//! - [`repository`] - Typed repositories (product, ledger, sale, ...)
//! - [`pool`] - Connection pool creation and the `Database` handle
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use apotheca_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/apotheca.db")).await?;
//!
//! let hits = db.products().search("panadol").await?;
//! let cash = db.ledger().balance(LedgerAccount::Cash).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    ExpenseRepository, LedgerRepository, OutstandingRepository, ProductRepository,
    PurchaseRepository, SaleRepository, UserRepository, VendorRepository,
};
pub use store::{
    collections, Document, DocumentStore, MemoryDocumentStore, SqliteDocumentStore, SumGuard,
};
