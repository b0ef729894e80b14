//! # Outstanding Balances
//!
//! Money customers still owe from short-paid sales.
//!
//! Settling a due claims (deletes) it before crediting the account, so two
//! cashiers settling the same due cannot both credit it.
//!
//! ```text
//! settle_outstanding(due d1, JazzCash)
//!   claim d1 ──── gone ──────────────► NOT_FOUND, nothing credited
//!      │
//!      ▼
//!   credit |remaining| ── fails ──► restore d1 under its old id
//!      │
//!      ▼
//!   done
//! ```

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info};

use apotheca_core::{LedgerAccount, LedgerEntry, LedgerEntryKind, Money, OutstandingBalance};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppConfig, DbState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueSettled {
    pub due: OutstandingBalance,
    pub account: LedgerAccount,
    pub credited: Money,
}

/// Open dues, oldest first.
pub async fn list_outstanding(db: &DbState) -> ApiResult<Vec<OutstandingBalance>> {
    debug!("list_outstanding command");
    let mut dues = db.inner().dues().list().await?;
    dues.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(dues)
}

/// Sum of open dues. Zero or negative.
pub async fn outstanding_total(db: &DbState) -> ApiResult<Money> {
    Ok(db.inner().dues().total().await?)
}

pub async fn settle_outstanding(
    db: &DbState,
    config: &AppConfig,
    due_id: &str,
    account: LedgerAccount,
) -> ApiResult<DueSettled> {
    debug!(due_id = %due_id, account = %account, "settle_outstanding command");
    let db = db.inner();

    let Some(due) = db.dues().claim(due_id).await? else {
        return Err(ApiError::not_found("Outstanding balance", due_id));
    };

    let credited = due.remaining.abs();
    let now = Utc::now();
    let entry = LedgerEntry {
        id: String::new(),
        account,
        kind: LedgerEntryKind::DueSettlement,
        amount: credited,
        reference_id: Some(due.sale_id.clone()),
        memo: Some(due.customer_name.clone()),
        business_day: config.business_day(now),
        created_at: now,
    };

    if credited.is_positive() {
        if let Err(e) = db.ledger().append(&entry).await {
            if let Err(restore_err) = db.dues().restore(&due).await {
                error!(due_id = %due.id, error = %restore_err, "Could not restore claimed due");
            }
            return Err(e.into());
        }
    }

    info!(
        due_id = %due.id,
        customer = %due.customer_name,
        account = %account,
        credited = %credited,
        "Outstanding balance settled"
    );
    Ok(DueSettled {
        due,
        account,
        credited,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{balance, FailingStore};

    async fn owe(db: &DbState, customer: &str, rupees: i64) -> String {
        db.inner()
            .dues()
            .insert(&OutstandingBalance {
                id: String::new(),
                sale_id: "sale-1".to_string(),
                customer_name: customer.to_string(),
                remaining: Money::from_rupees(-rupees),
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_settle_credits_absolute_value_once() {
        let db = DbState::in_memory();
        let config = AppConfig::default();
        let id = owe(&db, "Bilal", 20).await;
        assert_eq!(outstanding_total(&db).await.unwrap(), Money::from_rupees(-20));

        let settled = settle_outstanding(&db, &config, &id, LedgerAccount::JazzCash)
            .await
            .unwrap();
        assert_eq!(settled.credited, Money::from_rupees(20));
        assert!(list_outstanding(&db).await.unwrap().is_empty());
        assert_eq!(
            balance(&db, LedgerAccount::JazzCash).await,
            Money::from_rupees(20)
        );

        let err = settle_outstanding(&db, &config, &id, LedgerAccount::JazzCash)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(
            balance(&db, LedgerAccount::JazzCash).await,
            Money::from_rupees(20)
        );
    }

    #[tokio::test]
    async fn test_failed_credit_restores_due() {
        let db = FailingStore::failing_on(LedgerAccount::Cash.collection());
        let config = AppConfig::default();
        let id = owe(&db, "Bilal", 20).await;

        settle_outstanding(&db, &config, &id, LedgerAccount::Cash)
            .await
            .unwrap_err();

        let dues = list_outstanding(&db).await.unwrap();
        assert_eq!(dues.len(), 1);
        assert_eq!(dues[0].id, id);
    }
}
