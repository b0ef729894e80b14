//! # Purchase Repository
//!
//! Saved purchases awaiting payment (`pendingPayments`) and the record of
//! each settled vendor payment (`payments`).
//!
//! ```text
//! save_purchase ──► pendingPayments/{id}
//!                        │ pay_pending_payment
//!                        ▼
//!                   payments/{id}  + ledger debit + products restocked
//!                   pendingPayments/{id} deleted
//! ```

use serde_json::json;
use std::sync::Arc;

use apotheca_core::{PendingVendorPayment, VendorPayment};

use super::{decode_all, decode_opt};
use crate::error::DbResult;
use crate::store::{
    collections::{PAYMENTS, PENDING_PAYMENTS},
    encode, DocumentStore,
};

#[derive(Clone)]
pub struct PurchaseRepository {
    store: Arc<dyn DocumentStore>,
}

impl PurchaseRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        PurchaseRepository { store }
    }

    // =========================================================================
    // Pending
    // =========================================================================

    pub async fn insert_pending(&self, pending: &PendingVendorPayment) -> DbResult<String> {
        self.store.create(PENDING_PAYMENTS, encode(pending)?).await
    }

    pub async fn get_pending(&self, id: &str) -> DbResult<Option<PendingVendorPayment>> {
        decode_opt(self.store.get(PENDING_PAYMENTS, id).await?)
    }

    pub async fn list_pending(&self) -> DbResult<Vec<PendingVendorPayment>> {
        decode_all(self.store.list(PENDING_PAYMENTS).await?)
    }

    pub async fn pending_for_vendor(&self, vendor_id: &str) -> DbResult<Vec<PendingVendorPayment>> {
        let docs = self
            .store
            .query_eq(PENDING_PAYMENTS, "vendorId", &json!(vendor_id))
            .await?;
        decode_all(docs)
    }

    pub async fn delete_pending(&self, id: &str) -> DbResult<bool> {
        self.store.delete(PENDING_PAYMENTS, id).await
    }

    /// Recreates a deleted pending payment under its original id.
    pub async fn restore_pending(&self, pending: &PendingVendorPayment) -> DbResult<()> {
        self.store
            .create_with_id(PENDING_PAYMENTS, &pending.id, encode(pending)?)
            .await
    }

    // =========================================================================
    // Settled
    // =========================================================================

    pub async fn insert_payment(&self, payment: &VendorPayment) -> DbResult<String> {
        self.store.create(PAYMENTS, encode(payment)?).await
    }

    pub async fn list_payments(&self) -> DbResult<Vec<VendorPayment>> {
        decode_all(self.store.list(PAYMENTS).await?)
    }

    pub async fn payments_for_vendor(&self, vendor_id: &str) -> DbResult<Vec<VendorPayment>> {
        let docs = self
            .store
            .query_eq(PAYMENTS, "vendorId", &json!(vendor_id))
            .await?;
        decode_all(docs)
    }

    pub async fn delete_payment(&self, id: &str) -> DbResult<bool> {
        self.store.delete(PAYMENTS, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use apotheca_core::{Money, ProductDraft};
    use chrono::{NaiveDate, Utc};

    fn pending(vendor_id: &str) -> PendingVendorPayment {
        PendingVendorPayment {
            id: String::new(),
            vendor_id: vendor_id.to_string(),
            vendor_name: "Ali".to_string(),
            company_name: "Ali Traders".to_string(),
            items: vec![ProductDraft {
                name: "Panadol".to_string(),
                company: "GSK".to_string(),
                quantity: 10,
                tabs_per_pack: 10,
                purchase_price: Money::from_rupees(40),
                selling_price: Money::from_rupees(50),
                expiry_date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
                vendor_id: Some(vendor_id.to_string()),
                batch: None,
                generic_name: None,
            }],
            total_bill: Money::from_rupees(400),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_pending_lifecycle() {
        let purchases = Database::in_memory().purchases();
        let id = purchases.insert_pending(&pending("v1")).await.unwrap();
        purchases.insert_pending(&pending("v2")).await.unwrap();

        assert_eq!(purchases.pending_for_vendor("v1").await.unwrap().len(), 1);
        let stored = purchases.get_pending(&id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].quantity, 10);

        assert!(purchases.delete_pending(&id).await.unwrap());
        purchases.restore_pending(&stored).await.unwrap();
        assert!(purchases.get_pending(&id).await.unwrap().is_some());
        assert_eq!(purchases.list_pending().await.unwrap().len(), 2);
    }
}
