//! # Repository Module
//!
//! Typed access to each collection of the document store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories over Documents                          │
//! │                                                                         │
//! │  Command (backoffice)                                                   │
//! │       │  db.products().take_stock(&id, 20)                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── encode / decode  (Product ⇄ JSON body, id kept out of the body)    │
//! │  └── picks the store primitive (increment with floor 0)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Arc<dyn DocumentStore>  (SQLite or memory)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - catalog, search, guarded stock changes
//! - [`VendorRepository`] - supplier directory
//! - [`LedgerRepository`] - per-account journals, guarded debits
//! - [`SaleRepository`] - bills and profit entries
//! - [`OutstandingRepository`] - customer dues
//! - [`PurchaseRepository`] - pending and settled vendor payments
//! - [`ExpenseRepository`] - operating expenses
//! - [`UserRepository`] - back-office logins

use serde::de::DeserializeOwned;

use crate::error::DbResult;
use crate::store::Document;

pub mod dues;
pub mod expense;
pub mod ledger;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod user;
pub mod vendor;

pub use dues::OutstandingRepository;
pub use expense::ExpenseRepository;
pub use ledger::LedgerRepository;
pub use product::ProductRepository;
pub use purchase::PurchaseRepository;
pub use sale::SaleRepository;
pub use user::UserRepository;
pub use vendor::VendorRepository;

pub(crate) fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> DbResult<Vec<T>> {
    docs.into_iter().map(Document::decode::<T>).collect()
}

pub(crate) fn decode_opt<T: DeserializeOwned>(doc: Option<Document>) -> DbResult<Option<T>> {
    doc.map(Document::decode::<T>).transpose()
}
