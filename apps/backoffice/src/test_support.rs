//! Fixtures shared by the command tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};

use apotheca_core::{LedgerAccount, LedgerEntry, LedgerEntryKind, Money, ProductDraft, Vendor};
use apotheca_db::{
    Database, DbError, DbResult, Document, DocumentStore, LedgerRepository, MemoryDocumentStore,
    SumGuard,
};

use crate::state::DbState;

/// A catalog line: `packs` packs of `tabs` tabs at `price` rupees a pack,
/// bought at 80% of the price.
pub fn draft(name: &str, packs: i64, tabs: i64, price: i64) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        company: "GSK".to_string(),
        quantity: packs,
        tabs_per_pack: tabs,
        purchase_price: Money::from_minor(price * 80),
        selling_price: Money::from_rupees(price),
        expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        vendor_id: None,
        batch: None,
        generic_name: None,
    }
}

pub async fn product(db: &DbState, name: &str, packs: i64, tabs: i64, price: i64) -> String {
    db.inner()
        .products()
        .insert(&draft(name, packs, tabs, price).into_product(Utc::now()))
        .await
        .unwrap()
}

pub async fn vendor(db: &DbState, name: &str, company: &str) -> String {
    db.inner()
        .vendors()
        .insert(&Vendor {
            id: String::new(),
            name: name.to_string(),
            company_name: company.to_string(),
            phone_number: "0300-1234567".to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap()
}

/// Deposits `rupees` into `account`.
pub async fn fund(db: &DbState, account: LedgerAccount, rupees: i64) {
    let now = Utc::now();
    db.inner()
        .ledger()
        .append(&LedgerEntry {
            id: String::new(),
            account,
            kind: LedgerEntryKind::Deposit,
            amount: Money::from_rupees(rupees),
            reference_id: None,
            memo: None,
            business_day: now.date_naive(),
            created_at: now,
        })
        .await
        .unwrap();
}

pub async fn balance(db: &DbState, account: LedgerAccount) -> Money {
    db.inner().ledger().balance(account).await.unwrap()
}

/// A withdrawal made by another counter just before the failing insert.
struct Interleaved {
    account: LedgerAccount,
    amount: Money,
    accepted: Arc<AtomicBool>,
}

/// Memory store whose inserts into one collection always fail.
pub struct FailingStore {
    inner: Arc<MemoryDocumentStore>,
    fail_collection: String,
    interleaved: Option<Interleaved>,
}

impl FailingStore {
    pub fn failing_on(collection: &str) -> DbState {
        let store = FailingStore {
            inner: Arc::new(MemoryDocumentStore::new()),
            fail_collection: collection.to_string(),
            interleaved: None,
        };
        DbState::new(Database::with_store(Arc::new(store)))
    }

    /// Like `failing_on`, but a guarded withdrawal of `rupees` from
    /// `account` lands right before the failure. The flag reports whether
    /// that withdrawal was accepted.
    pub fn withdrawing_before_failure(
        collection: &str,
        account: LedgerAccount,
        rupees: i64,
    ) -> (DbState, Arc<AtomicBool>) {
        let accepted = Arc::new(AtomicBool::new(false));
        let store = FailingStore {
            inner: Arc::new(MemoryDocumentStore::new()),
            fail_collection: collection.to_string(),
            interleaved: Some(Interleaved {
                account,
                amount: Money::from_rupees(rupees),
                accepted: accepted.clone(),
            }),
        };
        (DbState::new(Database::with_store(Arc::new(store))), accepted)
    }

    async fn check(&self, collection: &str) -> DbResult<()> {
        if collection != self.fail_collection {
            return Ok(());
        }
        if let Some(other) = &self.interleaved {
            let now = Utc::now();
            let ledger = LedgerRepository::new(self.inner.clone());
            let taken = ledger
                .try_debit(&LedgerEntry {
                    id: String::new(),
                    account: other.account,
                    kind: LedgerEntryKind::Withdrawal,
                    amount: -other.amount,
                    reference_id: None,
                    memo: None,
                    business_day: now.date_naive(),
                    created_at: now,
                })
                .await?;
            other.accepted.store(taken.is_some(), Ordering::SeqCst);
        }
        Err(DbError::QueryFailed(format!("injected failure on {}", collection)))
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn create(&self, collection: &str, body: Map<String, Value>) -> DbResult<String> {
        self.check(collection).await?;
        self.inner.create(collection, body).await
    }

    async fn create_with_id(
        &self,
        collection: &str,
        id: &str,
        body: Map<String, Value>,
    ) -> DbResult<()> {
        self.inner.create_with_id(collection, id, body).await
    }

    async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: &str) -> DbResult<Vec<Document>> {
        self.inner.list(collection).await
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> DbResult<Vec<Document>> {
        self.inner.query_eq(collection, field, value).await
    }

    async fn query_range(
        &self,
        collection: &str,
        field: &str,
        low: &Value,
        high: &Value,
    ) -> DbResult<Vec<Document>> {
        self.inner.query_range(collection, field, low, high).await
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        partial: Map<String, Value>,
    ) -> DbResult<()> {
        self.inner.update_fields(collection, id, partial).await
    }

    async fn delete(&self, collection: &str, id: &str) -> DbResult<bool> {
        self.inner.delete(collection, id).await
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> DbResult<i64> {
        self.inner.increment(collection, id, field, delta, floor).await
    }

    async fn create_guarded(
        &self,
        collection: &str,
        body: Map<String, Value>,
        guard: &SumGuard,
    ) -> DbResult<String> {
        self.check(collection).await?;
        self.inner.create_guarded(collection, body, guard).await
    }

    async fn sum(&self, collection: &str, field: &str) -> DbResult<i64> {
        self.inner.sum(collection, field).await
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}
