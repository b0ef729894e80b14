//! # Product Repository
//!
//! Catalog documents in the `products` collection.
//!
//! ## Key Operations
//! - Add-or-update lookups by name
//! - Substring search
//! - Guarded stock changes
//!
//! ## Stock Changes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Stock Moves                                      │
//! │                                                                         │
//! │  Checkout sells 2 packs of Panadol (10 tabs/pack)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  take_stock(id, 20)                                                     │
//! │       │  increment(products, id, stockUnits, -20, floor = 0)            │
//! │       ▼                                                                 │
//! │  Some(30)  ← stock left         None ← would go negative, unchanged     │
//! │                                                                         │
//! │  Purchase settlement: add_stock(id, units)   (no floor)                 │
//! │  Saga rollback:       add_stock(id, units)   (undo a take)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

use apotheca_core::{Product, ProductDraft};

use super::{decode_all, decode_opt};
use crate::error::{DbError, DbResult};
use crate::store::{collections::PRODUCTS, encode, DocumentStore};

/// Field holding on-hand stock in tabs.
pub const STOCK_FIELD: &str = "stockUnits";

/// Repository for product documents.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let hits = repo.search("pana").await?;
/// let left = repo.take_stock(&hits[0].id, 20).await?;
/// ```
#[derive(Clone)]
pub struct ProductRepository {
    store: Arc<dyn DocumentStore>,
}

impl ProductRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        ProductRepository { store }
    }

    /// Inserts a product and returns its new id. `product.id` is ignored.
    pub async fn insert(&self, product: &Product) -> DbResult<String> {
        let id = self.store.create(PRODUCTS, encode(product)?).await?;
        debug!(id = %id, name = %product.name, "Product inserted");
        Ok(id)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        decode_opt(self.store.get(PRODUCTS, id).await?)
    }

    /// Products whose name equals `name` exactly (after trimming).
    pub async fn find_by_name(&self, name: &str) -> DbResult<Vec<Product>> {
        let docs = self
            .store
            .query_eq(PRODUCTS, "name", &json!(name.trim()))
            .await?;
        decode_all(docs)
    }

    /// The product a purchase line restocks: same name, same company
    /// (company compared case-insensitively).
    pub async fn find_by_name_and_company(
        &self,
        name: &str,
        company: &str,
    ) -> DbResult<Option<Product>> {
        let company = company.trim().to_lowercase();
        Ok(self
            .find_by_name(name)
            .await?
            .into_iter()
            .find(|p| p.company.trim().to_lowercase() == company))
    }

    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        decode_all(self.store.list(PRODUCTS).await?)
    }

    /// Case-insensitive substring match on name, generic name and company.
    /// An empty term returns every product.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Product>> {
        let term = term.trim().to_lowercase();
        debug!(term = %term, "Searching products");

        let products = self.list_all().await?;
        if term.is_empty() {
            return Ok(products);
        }

        let hits: Vec<Product> = products
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&term)
                    || p.company.to_lowercase().contains(&term)
                    || p
                        .generic_name
                        .as_deref()
                        .is_some_and(|g| g.to_lowercase().contains(&term))
            })
            .collect();

        debug!(count = hits.len(), "Search returned products");
        Ok(hits)
    }

    /// Overwrites the stored document with `product`.
    pub async fn replace(&self, product: &Product) -> DbResult<()> {
        self.store
            .update_fields(PRODUCTS, &product.id, encode(product)?)
            .await
    }

    /// Removes `units` tabs from stock unless that would go below zero.
    ///
    /// Returns the stock left, or `None` when there wasn't enough (stock
    /// is then unchanged).
    pub async fn take_stock(&self, id: &str, units: i64) -> DbResult<Option<i64>> {
        match self
            .store
            .increment(PRODUCTS, id, STOCK_FIELD, -units, Some(0))
            .await
        {
            Ok(left) => Ok(Some(left)),
            Err(DbError::GuardRejected { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Adds `units` tabs to stock and returns the new level.
    pub async fn add_stock(&self, id: &str, units: i64) -> DbResult<i64> {
        self.store
            .increment(PRODUCTS, id, STOCK_FIELD, units, None)
            .await
    }

    /// Copies prices, expiry and pack size of a purchase line onto an
    /// existing product. Stock is left alone.
    pub async fn refresh_from_purchase(
        &self,
        id: &str,
        draft: &ProductDraft,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let mut patch = Map::new();
        patch.insert("purchasePrice".into(), serde_json::to_value(draft.purchase_price)?);
        patch.insert("sellingPrice".into(), serde_json::to_value(draft.selling_price)?);
        patch.insert("expiryDate".into(), serde_json::to_value(draft.expiry_date)?);
        patch.insert("tabsPerPack".into(), Value::from(draft.tabs_per_pack));
        patch.insert("updatedAt".into(), serde_json::to_value(now)?);
        if let Some(batch) = &draft.batch {
            patch.insert("batch".into(), Value::from(batch.clone()));
        }
        if let Some(vendor_id) = &draft.vendor_id {
            patch.insert("vendorId".into(), Value::from(vendor_id.clone()));
        }
        self.store.update_fields(PRODUCTS, id, patch).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        self.store.delete(PRODUCTS, id).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        Ok(self.store.list(PRODUCTS).await?.len() as i64)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
