//! # Sale Repository
//!
//! Bills (`bills`) and the per-line profit entries posted with them
//! (`profits`).
//!
//! ## Day Queries
//! ```text
//! Bill { businessDay: "2026-03-02", ... }
//!                │
//!   bills_for_day(2026-03-02)  →  query_eq(bills, businessDay, "2026-03-02")
//!   bills_between(a, b)        →  query_range(bills, businessDay, a, b)
//! ```
//! ISO dates sort lexically, so string range queries are day ranges.

use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use apotheca_core::{Bill, ProfitEntry};

use super::{decode_all, decode_opt};
use crate::error::DbResult;
use crate::store::{
    collections::{BILLS, PROFITS},
    encode, DocumentStore,
};

const DAY_FIELD: &str = "businessDay";

#[derive(Clone)]
pub struct SaleRepository {
    store: Arc<dyn DocumentStore>,
}

impl SaleRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        SaleRepository { store }
    }

    // =========================================================================
    // Bills
    // =========================================================================

    pub async fn insert_bill(&self, bill: &Bill) -> DbResult<String> {
        let id = self.store.create(BILLS, encode(bill)?).await?;
        debug!(id = %id, total = %bill.total, "Bill recorded");
        Ok(id)
    }

    pub async fn get_bill(&self, id: &str) -> DbResult<Option<Bill>> {
        decode_opt(self.store.get(BILLS, id).await?)
    }

    pub async fn list_bills(&self) -> DbResult<Vec<Bill>> {
        decode_all(self.store.list(BILLS).await?)
    }

    pub async fn bills_for_day(&self, day: NaiveDate) -> DbResult<Vec<Bill>> {
        let docs = self
            .store
            .query_eq(BILLS, DAY_FIELD, &json!(day.to_string()))
            .await?;
        decode_all(docs)
    }

    /// Bills with `start <= businessDay < end`.
    pub async fn bills_between(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Bill>> {
        let docs = self
            .store
            .query_range(
                BILLS,
                DAY_FIELD,
                &json!(start.to_string()),
                &json!(end.to_string()),
            )
            .await?;
        decode_all(docs)
    }

    pub async fn delete_bill(&self, id: &str) -> DbResult<bool> {
        self.store.delete(BILLS, id).await
    }

    // =========================================================================
    // Profits
    // =========================================================================

    pub async fn insert_profit(&self, entry: &ProfitEntry) -> DbResult<String> {
        self.store.create(PROFITS, encode(entry)?).await
    }

    pub async fn list_profits(&self) -> DbResult<Vec<ProfitEntry>> {
        decode_all(self.store.list(PROFITS).await?)
    }

    pub async fn profits_for_day(&self, day: NaiveDate) -> DbResult<Vec<ProfitEntry>> {
        let docs = self
            .store
            .query_eq(PROFITS, DAY_FIELD, &json!(day.to_string()))
            .await?;
        decode_all(docs)
    }

    pub async fn profits_for_sale(&self, sale_id: &str) -> DbResult<Vec<ProfitEntry>> {
        let docs = self.store.query_eq(PROFITS, "saleId", &json!(sale_id)).await?;
        decode_all(docs)
    }

    pub async fn delete_profit(&self, id: &str) -> DbResult<bool> {
        self.store.delete(PROFITS, id).await
    }
}
