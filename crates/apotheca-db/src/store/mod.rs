//! # Document Store
//!
//! The storage seam: schemaless JSON documents grouped into named
//! collections, plus the two guarded primitives that keep stock and ledger
//! balances from going negative under concurrent writers.
//!
//! ## Backends
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Arc<dyn DocumentStore>                              │
//! │                              │                                          │
//! │          ┌───────────────────┴────────────────────┐                     │
//! │          ▼                                        ▼                     │
//! │  SqliteDocumentStore                     MemoryDocumentStore            │
//! │  (documents table, json_extract)         (Mutex<HashMap<..>>)           │
//! │  production                              tests, --db :memory: demos     │
//! │                                                                         │
//! │  Guarded primitives                                                     │
//! │  ──────────────────                                                     │
//! │  increment(products, id, "stockUnits", -20, floor = 0)                  │
//! │      single UPDATE … WHERE current + delta >= floor                     │
//! │                                                                         │
//! │  create_guarded(Cash, {amount: -500}, SumGuard{amount, floor 0})        │
//! │      BEGIN IMMEDIATE → SUM(amount) → check → INSERT → COMMIT            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DbError, DbResult};

pub mod memory;
pub mod sqlite;

#[cfg(test)]
pub(crate) mod conformance;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

// =============================================================================
// Collections
// =============================================================================

/// Collection names. Ledger journals use `LedgerAccount::collection()`.
pub mod collections {
    pub const PRODUCTS: &str = "products";
    pub const VENDORS: &str = "vendors";
    pub const PENDING_PAYMENTS: &str = "pendingPayments";
    pub const PAYMENTS: &str = "payments";
    pub const PROFITS: &str = "profits";
    pub const BILLS: &str = "bills";
    pub const OUTSTANDING: &str = "remaings";
    pub const EXPENSES: &str = "duesSpendings";
    pub const LOGIN: &str = "login";
}

// =============================================================================
// Document
// =============================================================================

/// A stored document: its id and its JSON body (without the id).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Map<String, Value>,
}

impl Document {
    /// Deserializes the body into `T`, injecting the id as `"id"`.
    pub fn decode<T: DeserializeOwned>(self) -> DbResult<T> {
        let mut body = self.body;
        body.insert("id".to_string(), Value::String(self.id));
        Ok(serde_json::from_value(Value::Object(body))?)
    }
}

/// Serializes `value` into a document body, dropping its `"id"` field.
pub fn encode<T: Serialize>(value: &T) -> DbResult<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(DbError::Serialization(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Floor on the sum of one numeric field across a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SumGuard {
    pub field: String,
    pub floor: i64,
}

impl SumGuard {
    pub fn new(field: impl Into<String>, floor: i64) -> Self {
        SumGuard {
            field: field.into(),
            floor,
        }
    }
}

/// Checks that `field` is a plain identifier and returns its JSON path.
///
/// Only top-level fields are addressable; this also keeps user input out
/// of the path expression.
pub fn json_path(field: &str) -> DbResult<String> {
    let mut chars = field.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid {
        return Err(DbError::InvalidField(field.to_string()));
    }
    Ok(format!("$.{}", field))
}

// =============================================================================
// DocumentStore Trait
// =============================================================================

/// Interface for document persistence.
///
/// Implementations:
/// - `SqliteDocumentStore`: SQLite file (or `sqlite::memory:`)
/// - `MemoryDocumentStore`: in-process map for tests
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document under a fresh id and returns the id.
    async fn create(&self, collection: &str, body: Map<String, Value>) -> DbResult<String>;

    /// Inserts a document under a caller-chosen id (used to restore a
    /// document a compensation step deleted).
    async fn create_with_id(
        &self,
        collection: &str,
        id: &str,
        body: Map<String, Value>,
    ) -> DbResult<()>;

    async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Document>>;

    /// Every document in insertion order.
    async fn list(&self, collection: &str) -> DbResult<Vec<Document>>;

    /// Documents whose `field` equals `value` (scalar values only).
    async fn query_eq(&self, collection: &str, field: &str, value: &Value)
        -> DbResult<Vec<Document>>;

    /// Documents with `low <= field < high`.
    async fn query_range(
        &self,
        collection: &str,
        field: &str,
        low: &Value,
        high: &Value,
    ) -> DbResult<Vec<Document>>;

    /// Merges `partial` into the body (JSON merge patch; `null` removes).
    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        partial: Map<String, Value>,
    ) -> DbResult<()>;

    /// Deletes a document. Returns whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> DbResult<bool>;

    /// Atomically adds `delta` to an integer field and returns the new
    /// value. With a `floor`, the update is refused with
    /// `DbError::GuardRejected` when the result would fall below it.
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> DbResult<i64>;

    /// Inserts a document only if the collection's sum of `guard.field`,
    /// including the new document, stays at or above `guard.floor`.
    async fn create_guarded(
        &self,
        collection: &str,
        body: Map<String, Value>,
        guard: &SumGuard,
    ) -> DbResult<String>;

    /// Sum of an integer field across a collection (missing counts as 0).
    async fn sum(&self, collection: &str, field: &str) -> DbResult<i64>;

    async fn health_check(&self) -> bool;

    async fn close(&self);
}

// =============================================================================
// Unit Tests
// =============================================================================
