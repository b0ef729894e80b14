//! # Back-Office Commands
//!
//! Every operation the counter and the back office can perform.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs         ◄─── You are here (exports)
//! ├── catalog.rs     ◄─── Product add-or-update, search, stock levels
//! ├── checkout.rs    ◄─── Cart, payment capture, settlement
//! ├── ledger.rs      ◄─── Deposits, withdrawals, balances
//! ├── dues.rs        ◄─── Outstanding customer balances
//! ├── vendors.rs     ◄─── Vendor directory
//! ├── purchasing.rs  ◄─── Pending vendor payments and their settlement
//! ├── expenses.rs    ◄─── Shop spending
//! ├── reports.rs     ◄─── Dashboard, expiry, sales and profit views
//! └── auth.rs        ◄─── Login users
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Caller (CLI, UI shell, test)                                           │
//! │  ────────────────────────────                                           │
//! │  commands::ledger::withdraw(&db, &config, Cash, amount).await           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  async fn withdraw(                                                     │
//! │      db: &DbState,        ◄── Store handle                              │
//! │      config: &AppConfig,  ◄── Business day, currency format             │
//! │      account, amount,     ◄── Operator input                            │
//! │  ) -> ApiResult<LedgerReceipt>                                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Ok(receipt) or Err(ApiError { code, message })                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Injection
//! Each command takes only the state it needs:
//! ```rust,ignore
//! // Only needs the store
//! async fn list_vendors(db: &DbState)
//!
//! // Only needs the cart
//! async fn get_cart(cart: &CartState)
//!
//! // Store, cart and config
//! async fn settle_checkout(db: &DbState, cart: &CartState, config: &AppConfig)
//! ```

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod dues;
pub mod expenses;
pub mod ledger;
pub mod purchasing;
pub mod reports;
pub mod vendors;
