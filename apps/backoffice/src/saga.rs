//! # Compensating Steps for Multi-Document Writes
//!
//! Checkout and vendor-payment settlement each touch several collections.
//! The store has no cross-document transaction, so every completed step
//! records how to undo itself; on failure the recorded steps run in
//! reverse.
//!
//! ```text
//! settle_checkout
//! ───────────────────────────────────────────────────────────────────────
//!  step                         recorded compensation
//!  take_stock(p1, 20)      ──►  RestoreStock { p1, 20 }
//!  take_stock(p2, 5)       ──►  RestoreStock { p2, 5 }
//!  insert bill b1          ──►  DeleteDocument { bills, b1 }
//!  insert profit x1        ──►  DeleteDocument { profits, x1 }
//!  insert due d1       ✗ fails
//!                               rollback: x1, b1, p2, p1 (reverse order)
//! ```
//!
//! Ledger credits have no compensation; they are always the last step.
//! Debits are undone with `RefundDebit`, which can only raise a balance.
//!
//! A compensation that itself fails is logged and reported; the command
//! then returns `SETTLEMENT_FAILED` instead of the original error so the
//! operator knows the records need a look.

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use apotheca_core::LedgerAccount;
use apotheca_db::{collections::PRODUCTS, Database, DbResult};

use crate::error::{ApiError, ErrorCode};

/// How to undo one completed step.
#[derive(Debug, Clone)]
pub enum Compensation {
    /// Put back stock that was taken.
    RestoreStock { product_id: String, units: i64 },

    /// Remove a ledger debit that was appended.
    RefundDebit { account: LedgerAccount, id: String },

    /// Take back stock that was added.
    RemoveStock { product_id: String, units: i64 },

    /// Remove a document that was inserted.
    DeleteDocument { collection: String, id: String },

    /// Recreate a document that was deleted, under its old id.
    RecreateDocument {
        collection: String,
        id: String,
        body: Map<String, Value>,
    },

    /// Put back fields that were overwritten.
    RestoreFields {
        collection: String,
        id: String,
        fields: Map<String, Value>,
    },
}

impl Compensation {
    pub fn delete(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Compensation::DeleteDocument {
            collection: collection.into(),
            id: id.into(),
        }
    }

    async fn apply(&self, db: &Database) -> DbResult<()> {
        match self {
            Compensation::RestoreStock { product_id, units } => {
                db.products().add_stock(product_id, *units).await?;
            }
            Compensation::RemoveStock { product_id, units } => {
                // Sold again since it was added: the guard refuses to go negative
                if db.products().take_stock(product_id, *units).await?.is_none() {
                    return Err(apotheca_db::DbError::guard_rejected(
                        PRODUCTS,
                        Some(product_id),
                        "stockUnits",
                    ));
                }
            }
            Compensation::RefundDebit { account, id } => {
                db.ledger().remove_debit(*account, id).await?;
            }
            Compensation::DeleteDocument { collection, id } => {
                db.store().delete(collection, id).await?;
            }
            Compensation::RecreateDocument {
                collection,
                id,
                body,
            } => {
                db.store().create_with_id(collection, id, body.clone()).await?;
            }
            Compensation::RestoreFields {
                collection,
                id,
                fields,
            } => {
                db.store()
                    .update_fields(collection, id, fields.clone())
                    .await?;
            }
        }
        Ok(())
    }
}

/// Compensations recorded by one in-flight operation.
pub struct Saga<'a> {
    name: &'static str,
    db: &'a Database,
    steps: Vec<Compensation>,
}

impl<'a> Saga<'a> {
    pub fn new(name: &'static str, db: &'a Database) -> Self {
        Saga {
            name,
            db,
            steps: Vec::new(),
        }
    }

    /// Records the undo of a step that just succeeded.
    pub fn record(&mut self, step: Compensation) {
        self.steps.push(step);
    }

    /// The operation completed; nothing will be undone.
    pub fn commit(self) {
        info!(saga = self.name, steps = self.steps.len(), "Saga committed");
    }

    /// Undoes every recorded step, newest first, and returns `cause`, or
    /// a `SETTLEMENT_FAILED` error if any undo step failed.
    pub async fn abort(self, cause: ApiError) -> ApiError {
        warn!(saga = self.name, cause = %cause, "Rolling back");
        let failures = self.rollback().await;
        if failures.is_empty() {
            cause
        } else {
            ApiError::new(
                ErrorCode::SettlementFailed,
                format!(
                    "{} The operation was only partly undone ({} step(s) failed); please check the records.",
                    cause.message,
                    failures.len()
                ),
            )
        }
    }

    /// Runs the compensations in reverse. Keeps going past failures and
    /// returns the steps that could not be undone.
    pub async fn rollback(self) -> Vec<Compensation> {
        let mut failures = Vec::new();
        for step in self.steps.into_iter().rev() {
            match step.apply(self.db).await {
                Ok(()) => info!(saga = self.name, step = ?step, "Compensated"),
                Err(e) => {
                    error!(saga = self.name, step = ?step, error = %e, "Compensation failed");
                    failures.push(step);
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apotheca_core::{LedgerEntry, LedgerEntryKind, Money, ProductDraft};
    use apotheca_db::collections::BILLS;
    use chrono::{NaiveDate, Utc};
    use serde_json::json;

    async fn product(db: &Database, packs: i64) -> String {
        let draft = ProductDraft {
            name: "Panadol".to_string(),
            company: "GSK".to_string(),
            quantity: packs,
            tabs_per_pack: 10,
            purchase_price: Money::from_rupees(40),
            selling_price: Money::from_rupees(50),
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            vendor_id: None,
            batch: None,
            generic_name: None,
        };
        db.products()
            .insert(&draft.into_product(Utc::now()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rollback_runs_in_reverse() {
        let db = Database::in_memory();
        let id = product(&db, 5).await;

        let mut saga = Saga::new("test", &db);
        db.products().take_stock(&id, 20).await.unwrap();
        saga.record(Compensation::RestoreStock {
            product_id: id.clone(),
            units: 20,
        });
        let bill = db
            .store()
            .create(BILLS, json!({"total": 100}).as_object().cloned().unwrap())
            .await
            .unwrap();
        saga.record(Compensation::delete(BILLS, bill.clone()));

        let failures = saga.rollback().await;
        assert!(failures.is_empty());
        assert_eq!(
            db.products().get_by_id(&id).await.unwrap().unwrap().stock_units,
            50
        );
        assert!(db.store().get(BILLS, &bill).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_compensation_is_reported() {
        let db = Database::in_memory();
        let id = product(&db, 1).await;

        let mut saga = Saga::new("test", &db);
        // Nothing to take back: 10 units on hand, 50 to remove
        saga.record(Compensation::RemoveStock {
            product_id: id,
            units: 50,
        });

        let err = saga.abort(ApiError::internal("boom")).await;
        assert_eq!(err.code, ErrorCode::SettlementFailed);
    }

    #[tokio::test]
    async fn test_refund_debit_never_removes_a_credit() {
        let db = Database::in_memory();
        let now = Utc::now();
        let mut entry = LedgerEntry {
            id: String::new(),
            account: LedgerAccount::Cash,
            kind: LedgerEntryKind::Sale,
            amount: Money::from_rupees(80),
            reference_id: None,
            memo: None,
            business_day: now.date_naive(),
            created_at: now,
        };
        let credit = db.ledger().append(&entry).await.unwrap();
        entry.kind = LedgerEntryKind::Withdrawal;
        entry.amount = Money::from_rupees(-80);
        db.ledger().try_debit(&entry).await.unwrap().unwrap();

        let mut saga = Saga::new("test", &db);
        saga.record(Compensation::RefundDebit {
            account: LedgerAccount::Cash,
            id: credit,
        });
        let err = saga.abort(ApiError::internal("boom")).await;

        assert_eq!(err.code, ErrorCode::SettlementFailed);
        assert_eq!(
            db.ledger().balance(LedgerAccount::Cash).await.unwrap(),
            Money::zero()
        );
    }

    #[tokio::test]
    async fn test_clean_abort_returns_cause() {
        let db = Database::in_memory();
        let saga = Saga::new("test", &db);
        let err = saga.abort(ApiError::insufficient_balance("Cash")).await;
        assert_eq!(err.code, ErrorCode::InsufficientBalance);
    }
}
