//! # Reporting
//!
//! Read-only aggregation behind the dashboard, stock, expiry, sellings and
//! profit screens. Every function takes already-loaded documents and a
//! `today`; nothing here reads the clock.
//!
//! ## Business Day
//! ```text
//! created_at (UTC) ──► + store offset (default +05:00) ──► date
//!
//!   2026-03-01T20:30Z  ──►  2026-03-02 01:30 +05:00  ──►  2026-03-02
//! ```
//! Documents carry the resulting `businessDay` so day views are a single
//! equality query.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Bill, Expense, LedgerAccount, ProfitEntry, Product};

// =============================================================================
// Business Day
// =============================================================================

/// Calendar day of `ts` in the store's time zone.
pub fn business_day(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

// =============================================================================
// Expiry
// =============================================================================

/// Whole days from `today` until `expiry`. Zero or negative means expired.
#[inline]
pub fn remaining_days(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    ExpiringSoon,
    Ok,
}

/// Classifies `remaining` days against the warning window.
///
/// ## Example
/// ```rust
/// use apotheca_core::reporting::{classify_expiry, ExpiryStatus};
///
/// assert_eq!(classify_expiry(0, 180), ExpiryStatus::Expired);
/// assert_eq!(classify_expiry(180, 180), ExpiryStatus::ExpiringSoon);
/// assert_eq!(classify_expiry(181, 180), ExpiryStatus::Ok);
/// ```
pub fn classify_expiry(remaining: i64, warning_days: i64) -> ExpiryStatus {
    if remaining <= 0 {
        ExpiryStatus::Expired
    } else if remaining <= warning_days {
        ExpiryStatus::ExpiringSoon
    } else {
        ExpiryStatus::Ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryRow {
    pub product_id: String,
    pub name: String,
    pub company: String,
    pub batch: Option<String>,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    pub remaining_days: i64,
    pub status: ExpiryStatus,
}

/// Expired and expiring-soon products, soonest first.
pub fn expiry_report(products: &[Product], today: NaiveDate, warning_days: i64) -> Vec<ExpiryRow> {
    let mut rows: Vec<ExpiryRow> = products
        .iter()
        .filter_map(|p| {
            let remaining = remaining_days(p.expiry_date, today);
            match classify_expiry(remaining, warning_days) {
                ExpiryStatus::Ok => None,
                status => Some(ExpiryRow {
                    product_id: p.id.clone(),
                    name: p.name.clone(),
                    company: p.company.clone(),
                    batch: p.batch.clone(),
                    expiry_date: p.expiry_date,
                    remaining_days: remaining,
                    status,
                }),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date).then(a.name.cmp(&b.name)));
    rows
}

// =============================================================================
// Stock
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    InStock,
    Low,
    Out,
}

/// Out when nothing is left, Low when whole packs fall below `threshold`.
pub fn stock_level(product: &Product, threshold: i64) -> StockLevel {
    if product.stock_units <= 0 {
        StockLevel::Out
    } else if product.packs_on_hand() < threshold {
        StockLevel::Low
    } else {
        StockLevel::InStock
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockRow {
    pub product_id: String,
    pub name: String,
    pub company: String,
    pub packs: i64,
    pub loose_tabs: i64,
    pub stock_units: i64,
    pub selling_price: Money,
    pub level: StockLevel,
}

impl StockRow {
    pub fn from_product(product: &Product, threshold: i64) -> Self {
        StockRow {
            product_id: product.id.clone(),
            name: product.name.clone(),
            company: product.company.clone(),
            packs: product.packs_on_hand(),
            loose_tabs: product.loose_tabs(),
            stock_units: product.stock_units,
            selling_price: product.selling_price,
            level: stock_level(product, threshold),
        }
    }
}

/// Every product with its stock level, sorted by name.
pub fn stock_rows(products: &[Product], threshold: i64) -> Vec<StockRow> {
    let mut rows: Vec<StockRow> = products
        .iter()
        .map(|p| StockRow::from_product(p, threshold))
        .collect();
    rows.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    rows
}

/// Low and out-of-stock products, emptiest first.
pub fn low_stock(products: &[Product], threshold: i64) -> Vec<StockRow> {
    let mut rows: Vec<StockRow> = stock_rows(products, threshold)
        .into_iter()
        .filter(|r| r.level != StockLevel::InStock)
        .collect();
    rows.sort_by_key(|r| r.stock_units);
    rows
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    #[ts(as = "String")]
    pub day: NaiveDate,
    pub total_sales: Money,
    pub products_sold: i64,
    pub bill_count: i64,
}

impl DailySales {
    fn empty(day: NaiveDate) -> Self {
        DailySales {
            day,
            total_sales: Money::zero(),
            products_sold: 0,
            bill_count: 0,
        }
    }
}

/// One row per business day that has bills, newest first.
pub fn sales_by_day(bills: &[Bill]) -> Vec<DailySales> {
    let mut days: BTreeMap<NaiveDate, DailySales> = BTreeMap::new();
    for bill in bills {
        let row = days
            .entry(bill.business_day)
            .or_insert_with(|| DailySales::empty(bill.business_day));
        row.total_sales += bill.total;
        row.products_sold += bill.products_sold();
        row.bill_count += 1;
    }
    days.into_values().rev().collect()
}

/// Bills of one business day in the order they were rung up.
pub fn sales_for_day(bills: &[Bill], day: NaiveDate) -> Vec<Bill> {
    let mut rows: Vec<Bill> = bills
        .iter()
        .filter(|b| b.business_day == day)
        .cloned()
        .collect();
    rows.sort_by_key(|b| b.created_at);
    rows
}

/// The seven days ending `today`, oldest first, with empty days zero-filled.
pub fn weekly_sales(bills: &[Bill], today: NaiveDate) -> Vec<DailySales> {
    let start = today - Duration::days(6);
    let mut days: BTreeMap<NaiveDate, DailySales> = (0..7)
        .map(|i| {
            let day = start + Duration::days(i);
            (day, DailySales::empty(day))
        })
        .collect();
    for bill in bills {
        if let Some(row) = days.get_mut(&bill.business_day) {
            row.total_sales += bill.total;
            row.products_sold += bill.products_sold();
            row.bill_count += 1;
        }
    }
    days.into_values().collect()
}

// =============================================================================
// Profit
// =============================================================================

pub fn profit_for_day(entries: &[ProfitEntry], day: NaiveDate) -> Money {
    entries
        .iter()
        .filter(|e| e.business_day == day)
        .map(|e| e.profit)
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailyProfit {
    #[ts(as = "String")]
    pub day: NaiveDate,
    pub profit: Money,
    pub quantity_sold: i64,
}

/// Profit per business day, newest first.
pub fn profit_by_day(entries: &[ProfitEntry]) -> Vec<DailyProfit> {
    let mut days: BTreeMap<NaiveDate, DailyProfit> = BTreeMap::new();
    for entry in entries {
        let row = days.entry(entry.business_day).or_insert(DailyProfit {
            day: entry.business_day,
            profit: Money::zero(),
            quantity_sold: 0,
        });
        row.profit += entry.profit;
        row.quantity_sold += entry.quantity_sold;
    }
    days.into_values().rev().collect()
}

// =============================================================================
// Expenses
// =============================================================================

pub fn expenses_total(expenses: &[Expense]) -> Money {
    expenses.iter().map(|e| e.amount).sum()
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub account: LedgerAccount,
    pub balance: Money,
}

/// Landing-page numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[ts(as = "String")]
    pub today: NaiveDate,
    pub today_sales: Money,
    pub today_bills: i64,
    pub today_profit: Money,
    pub product_count: i64,
    pub expired_count: i64,
    pub expiring_soon_count: i64,
    pub low_stock_count: i64,
    pub outstanding_total: Money,
    pub balances: Vec<AccountBalance>,
    pub weekly_sales: Vec<DailySales>,
}

/// Inputs for [`DashboardSummary::build`].
pub struct DashboardInputs<'a> {
    pub today: NaiveDate,
    pub products: &'a [Product],
    pub bills: &'a [Bill],
    pub profits: &'a [ProfitEntry],
    pub outstanding_total: Money,
    pub balances: Vec<AccountBalance>,
    pub low_stock_threshold: i64,
    pub expiry_warning_days: i64,
}

impl DashboardSummary {
    pub fn build(inputs: DashboardInputs<'_>) -> Self {
        let today = inputs.today;
        let todays_bills: Vec<&Bill> = inputs
            .bills
            .iter()
            .filter(|b| b.business_day == today)
            .collect();

        let expiry = expiry_report(inputs.products, today, inputs.expiry_warning_days);
        let expired_count = expiry
            .iter()
            .filter(|r| r.status == ExpiryStatus::Expired)
            .count() as i64;

        DashboardSummary {
            today,
            today_sales: todays_bills.iter().map(|b| b.total).sum(),
            today_bills: todays_bills.len() as i64,
            today_profit: profit_for_day(inputs.profits, today),
            product_count: inputs.products.len() as i64,
            expired_count,
            expiring_soon_count: expiry.len() as i64 - expired_count,
            low_stock_count: low_stock(inputs.products, inputs.low_stock_threshold).len() as i64,
            outstanding_total: inputs.outstanding_total,
            balances: inputs.balances,
            weekly_sales: weekly_sales(inputs.bills, today),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
