//! # Checkout Commands
//!
//! The sale counter: build a cart, capture the tender, settle.
//!
//! ## Checkout Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Lifecycle                                   │
//! │                                                                         │
//! │  ┌──────────────┐  begin_payment   ┌──────────────────┐                 │
//! │  │ BuildingCart │ ───────────────► │ AwaitingPayment  │                 │
//! │  │              │ ◄─────────────── │                  │                 │
//! │  └──────────────┘  return_to_cart  └────────┬─────────┘                 │
//! │     ▲   add_to_cart                         │ settle_checkout           │
//! │     │   remove_from_cart                    ▼                           │
//! │     │                              ┌──────────────────┐                 │
//! │     └───────── new cart ────────── │     Settled      │                 │
//! │                                    └──────────────────┘                 │
//! │  cancel_checkout: any state ──► empty BuildingCart, nothing written     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Settlement
//! ```text
//! 1. take stock for every line (guarded, never below zero)
//! 2. insert the bill
//! 3. insert one profit entry per line
//! 4. cash short? insert an outstanding balance linked to the bill
//! 5. credit the account with min(cash given, total)
//! ```
//! Steps 1-4 register their undo with a [`Saga`]. If any step fails the
//! earlier ones are undone and the cart stays in AwaitingPayment so the
//! cashier can retry or go back. The credit is never undone: another
//! counter may already have withdrawn it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use apotheca_core::{
    Bill, CartLine, Checkout, CheckoutState, CoreError, LedgerEntry, LedgerEntryKind, Money,
    OutstandingBalance, PaymentSummary, ProfitEntry, SellUnit, Tender,
};
use apotheca_db::collections::{BILLS, OUTSTANDING, PROFITS};
use apotheca_db::Database;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::saga::{Compensation, Saga};
use crate::state::{AppConfig, CartState, DbState};

/// Cart contents as the counter screen shows them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub state: CheckoutState,
    pub lines: Vec<CartLine>,
    pub total: Money,
    pub tender: Option<Tender>,
}

impl From<&Checkout> for CartResponse {
    fn from(checkout: &Checkout) -> Self {
        CartResponse {
            state: checkout.state,
            lines: checkout.lines.clone(),
            total: checkout.total(),
            tender: checkout.tender.clone(),
        }
    }
}

/// What a settled sale produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub bill: Bill,
    pub summary: PaymentSummary,
    /// Present when the customer paid less than the total.
    pub outstanding: Option<OutstandingBalance>,
}

pub async fn get_cart(cart: &CartState) -> CartResponse {
    debug!("get_cart command");
    CartResponse::from(&*cart.lock().await)
}

/// Adds a product to the cart, or increases the quantity of the line with
/// the same product and unit.
///
/// Stock is checked here, counting what is already in the cart, and
/// again at settlement.
pub async fn add_to_cart(
    db: &DbState,
    cart: &CartState,
    product_id: &str,
    quantity: i64,
    unit: SellUnit,
) -> ApiResult<CartResponse> {
    debug!(product_id = %product_id, quantity, unit = %unit, "add_to_cart command");

    let product = db
        .inner()
        .products()
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "Product not found."))?;

    let mut checkout = cart.lock().await;
    checkout.add_line(&product, quantity, unit)?;
    debug!(lines = checkout.lines.len(), total = %checkout.total(), "Cart updated");
    Ok(CartResponse::from(&*checkout))
}

pub async fn remove_from_cart(cart: &CartState, index: usize) -> ApiResult<CartResponse> {
    debug!(index, "remove_from_cart command");
    let mut checkout = cart.lock().await;
    checkout.remove_line(index)?;
    Ok(CartResponse::from(&*checkout))
}

/// Discards the cart. Nothing has been written yet, so nothing is undone.
pub async fn cancel_checkout(cart: &CartState) -> CartResponse {
    debug!("cancel_checkout command");
    let mut checkout = cart.lock().await;
    checkout.cancel();
    CartResponse::from(&*checkout)
}

/// "Generate bill": captures customer, account and cash given.
pub async fn begin_payment(cart: &CartState, tender: Tender) -> ApiResult<PaymentSummary> {
    debug!(account = %tender.account, cash = %tender.cash_given, "begin_payment command");
    let mut checkout = cart.lock().await;
    let summary = checkout.begin_payment(tender)?;
    debug!(total = %summary.total, remaining = %summary.remaining_balance, "Awaiting payment");
    Ok(summary)
}

pub async fn return_to_cart(cart: &CartState) -> ApiResult<CartResponse> {
    debug!("return_to_cart command");
    let mut checkout = cart.lock().await;
    checkout.back_to_cart()?;
    Ok(CartResponse::from(&*checkout))
}

/// Confirms payment and writes the sale.
///
/// The cart lock is held for the whole settlement.
pub async fn settle_checkout(
    db: &DbState,
    cart: &CartState,
    config: &AppConfig,
) -> ApiResult<SaleReceipt> {
    debug!("settle_checkout command");
    let mut checkout = cart.lock().await;

    let summary = checkout.summary()?;
    let tender = checkout
        .tender
        .clone()
        .ok_or_else(|| ApiError::new(ErrorCode::PaymentError, "No payment details captured"))?;

    let now = Utc::now();
    let day = config.business_day(now);
    let db = db.inner();

    let mut saga = Saga::new("checkout", db);
    let receipt = match write_sale(db, &mut saga, &checkout, &tender, summary, now, day).await {
        Ok(receipt) => receipt,
        Err(e) => return Err(saga.abort(e).await),
    };
    saga.commit();

    checkout.mark_settled()?;
    checkout.reset(now);

    info!(
        sale_id = %receipt.bill.id,
        total = %summary.total,
        received = %summary.amount_received,
        account = %tender.account,
        "Sale settled"
    );
    Ok(receipt)
}

async fn write_sale(
    db: &Database,
    saga: &mut Saga<'_>,
    checkout: &Checkout,
    tender: &Tender,
    summary: PaymentSummary,
    now: DateTime<Utc>,
    day: NaiveDate,
) -> ApiResult<SaleReceipt> {
    // 1. Stock
    for line in &checkout.lines {
        take_line_stock(db, line).await?;
        saga.record(Compensation::RestoreStock {
            product_id: line.product_id.clone(),
            units: line.stock_units(),
        });
    }

    // 2. Bill
    let mut bill = Bill {
        id: String::new(),
        customer_name: tender.customer_name.clone(),
        account: tender.account,
        items: checkout.to_bill_lines(),
        total: summary.total,
        cash_given: summary.cash_given,
        amount_received: summary.amount_received,
        remaining_balance: summary.remaining_balance,
        business_day: day,
        created_at: now,
    };
    bill.id = db.sales().insert_bill(&bill).await?;
    saga.record(Compensation::delete(BILLS, bill.id.clone()));

    // 3. Profit per line
    for line in &bill.items {
        let entry = ProfitEntry {
            id: String::new(),
            sale_id: bill.id.clone(),
            product_id: line.product_id.clone(),
            product_name: line.product_name.clone(),
            unit: line.unit,
            quantity_sold: line.quantity,
            profit: line.profit(),
            business_day: day,
            created_at: now,
        };
        let id = db.sales().insert_profit(&entry).await?;
        saga.record(Compensation::delete(PROFITS, id));
    }

    // 4. Shortfall
    let outstanding = if summary.is_short() {
        let mut due = OutstandingBalance {
            id: String::new(),
            sale_id: bill.id.clone(),
            customer_name: tender.customer_name.clone(),
            remaining: summary.remaining_balance,
            created_at: now,
        };
        due.id = db.dues().insert(&due).await?;
        saga.record(Compensation::delete(OUTSTANDING, due.id.clone()));
        info!(sale_id = %bill.id, remaining = %due.remaining, customer = %due.customer_name, "Outstanding balance recorded");
        Some(due)
    } else {
        None
    };

    // 5. Ledger credit, last: once money is in the journal another counter
    // may spend it, so nothing after this step may fail or be undone.
    if summary.amount_received.is_positive() {
        let entry = LedgerEntry {
            id: String::new(),
            account: tender.account,
            kind: LedgerEntryKind::Sale,
            amount: summary.amount_received,
            reference_id: Some(bill.id.clone()),
            memo: Some(tender.customer_name.clone()),
            business_day: day,
            created_at: now,
        };
        db.ledger().append(&entry).await?;
    }

    Ok(SaleReceipt {
        bill,
        summary,
        outstanding,
    })
}

/// Guarded decrement for one line. Another counter may have sold the
/// stock since the line was added.
async fn take_line_stock(db: &Database, line: &CartLine) -> ApiResult<()> {
    let units = line.stock_units();
    match db.products().take_stock(&line.product_id, units).await {
        Ok(Some(left)) => {
            debug!(product_id = %line.product_id, units, left, "Stock taken");
            Ok(())
        }
        Ok(None) => {
            let available = db
                .products()
                .get_by_id(&line.product_id)
                .await?
                .map(|p| p.stock_units)
                .unwrap_or(0);
            Err(CoreError::InsufficientStock {
                product: line.product_name.clone(),
                available,
                requested: units,
            }
            .into())
        }
        Err(e) if e.is_not_found() => Err(ApiError::new(ErrorCode::NotFound, "Product not found.")),
        Err(e) => Err(e.into()),
    }
}
