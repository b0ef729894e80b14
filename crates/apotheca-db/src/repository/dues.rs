//! # Outstanding Balance Repository
//!
//! Customer dues (`remaings`): the shortfall of a short-paid checkout.
//!
//! Settlement claims a due by deleting it before the ledger is credited.
//! Only the caller whose delete removed the document gets it back from
//! [`OutstandingRepository::claim`], so one due is credited at most once.

use std::sync::Arc;

use apotheca_core::{Money, OutstandingBalance};

use super::{decode_all, decode_opt};
use crate::error::DbResult;
use crate::store::{collections::OUTSTANDING, encode, DocumentStore};

#[derive(Clone)]
pub struct OutstandingRepository {
    store: Arc<dyn DocumentStore>,
}

impl OutstandingRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        OutstandingRepository { store }
    }

    pub async fn insert(&self, due: &OutstandingBalance) -> DbResult<String> {
        self.store.create(OUTSTANDING, encode(due)?).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<OutstandingBalance>> {
        decode_opt(self.store.get(OUTSTANDING, id).await?)
    }

    pub async fn list(&self) -> DbResult<Vec<OutstandingBalance>> {
        decode_all(self.store.list(OUTSTANDING).await?)
    }

    /// Sum of all remaining balances (zero or negative).
    pub async fn total(&self) -> DbResult<Money> {
        Ok(Money::from_minor(self.store.sum(OUTSTANDING, "remaining").await?))
    }

    /// Removes the due and returns it, or `None` if it was already gone
    /// (never existed, or another settlement claimed it first).
    pub async fn claim(&self, id: &str) -> DbResult<Option<OutstandingBalance>> {
        let Some(due) = self.get(id).await? else {
            return Ok(None);
        };
        if !self.store.delete(OUTSTANDING, id).await? {
            return Ok(None);
        }
        Ok(Some(due))
    }

    /// Puts a claimed due back under its original id.
    pub async fn restore(&self, due: &OutstandingBalance) -> DbResult<()> {
        self.store
            .create_with_id(OUTSTANDING, &due.id, encode(due)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        self.store.delete(OUTSTANDING, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use chrono::Utc;

    fn due(rupees: i64) -> OutstandingBalance {
        OutstandingBalance {
            id: String::new(),
            sale_id: "s1".to_string(),
            customer_name: "Ahmed".to_string(),
            remaining: Money::from_rupees(rupees),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_claim_is_single_use() {
        let dues = Database::in_memory().dues();
        let id = dues.insert(&due(-20)).await.unwrap();
        assert_eq!(dues.total().await.unwrap(), Money::from_rupees(-20));

        let claimed = dues.claim(&id).await.unwrap().unwrap();
        assert_eq!(claimed.id, id);
        assert!(dues.claim(&id).await.unwrap().is_none());
        assert!(dues.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_keeps_id() {
        let dues = Database::in_memory().dues();
        let id = dues.insert(&due(-35)).await.unwrap();
        let claimed = dues.claim(&id).await.unwrap().unwrap();

        dues.restore(&claimed).await.unwrap();
        let back = dues.get(&id).await.unwrap().unwrap();
        assert_eq!(back.remaining, Money::from_rupees(-35));
        assert_eq!(back.sale_id, "s1");
    }
}
