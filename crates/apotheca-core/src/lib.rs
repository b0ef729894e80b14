//! # apotheca-core: Pure Business Logic for the Pharmacy Counter
//!
//! Everything the pharmacy does that is arithmetic or a rule lives here:
//! pack/tab pricing, the checkout state machine, expiry and low-stock
//! classification, daily sales aggregation and report rendering.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Apotheca Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/backoffice (commands, CLI)                 │   │
//! │  │   add_to_cart, settle_checkout, withdraw, pay_pending_payment   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ apotheca-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │reporting │ │ export │ │   │
//! │  │   │ Product │ │  Money  │ │Checkout │ │ expiry   │ │ Report │ │   │
//! │  │   │  Bill   │ │  (PKR)  │ │CartLine │ │ daily    │ │ text/  │ │   │
//! │  │   │ Ledger  │ │         │ │         │ │ weekly   │ │ html   │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              apotheca-db (document store + repositories)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Bill, LedgerEntry, ...)
//! - [`money`] - Integer money in paisa
//! - [`cart`] - Checkout cart and its state machine
//! - [`reporting`] - Expiry, stock and sales aggregation
//! - [`export`] - Tabular report rendering for printing
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use apotheca_core::money::Money;
//!
//! // Rs 120.00 per pack of 10 tablets
//! let pack = Money::from_minor(12_000);
//! let tab = pack.div_round(10);
//! assert_eq!(tab.minor(), 1_200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod export;
pub mod money;
pub mod reporting;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartLine, Checkout, CheckoutState, PaymentSummary, Tender};
pub use error::{CoreError, CoreResult, ValidationError};
pub use export::Report;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Customer name recorded when the cashier leaves the field blank.
pub const DEFAULT_CUSTOMER_NAME: &str = "Walking Customer";

/// Products with fewer whole packs than this are reported as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Products expiring within this many days are "expiring soon".
pub const DEFAULT_EXPIRY_WARNING_DAYS: i64 = 180;

/// Maximum distinct lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single cart or purchase line.
///
/// Guards against typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;
