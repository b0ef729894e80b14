//! # Cart State
//!
//! Holds the counter's single in-progress checkout.
//!
//! ## Thread Safety
//! The checkout is wrapped in `Arc<tokio::sync::Mutex<T>>`:
//! 1. Every cart command takes the lock exclusively
//! 2. Settlement keeps the lock across its store calls, so the cart cannot
//!    change (or be settled twice) while the sale is being written
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Operator Action          Command                 Checkout Change       │
//! │  ───────────────          ───────                 ───────────────       │
//! │                                                                         │
//! │  Pick product ───────────► add_to_cart() ───────► lines.push(line)      │
//! │  Remove line ────────────► remove_from_cart() ──► lines.remove(i)       │
//! │  Generate bill ──────────► begin_payment() ─────► AwaitingPayment       │
//! │  Edit cart ──────────────► return_to_cart() ────► BuildingCart          │
//! │  Confirm payment ────────► settle_checkout() ───► Settled → new cart    │
//! │  Cancel ─────────────────► cancel_checkout() ───► empty BuildingCart    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};

use apotheca_core::Checkout;

/// Shared handle to the counter's checkout.
#[derive(Debug, Clone)]
pub struct CartState {
    checkout: Arc<Mutex<Checkout>>,
}

impl CartState {
    /// Creates a new empty cart state.
    pub fn new() -> Self {
        CartState {
            checkout: Arc::new(Mutex::new(Checkout::new(Utc::now()))),
        }
    }

    /// Exclusive access to the checkout until the guard is dropped.
    pub async fn lock(&self) -> MutexGuard<'_, Checkout> {
        self.checkout.lock().await
    }

    /// A copy of the checkout as it is right now.
    pub async fn snapshot(&self) -> Checkout {
        self.checkout.lock().await.clone()
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new()
    }
}
