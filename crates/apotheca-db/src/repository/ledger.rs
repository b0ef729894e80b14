//! # Ledger Repository
//!
//! One append-only journal per payment method. The balance of an account
//! is the sum of its entries' `amount`; it is never stored.
//!
//! ```text
//! Cash journal                       balance
//! ────────────────────────────────   ───────
//! +100.00  sale          bill b1      100.00
//!  +50.00  deposit                    150.00
//!  -60.00  withdrawal                  90.00
//! -100.00  vendor_payment  ✗ rejected  (would be -10.00)
//! ```
//!
//! Credits are plain appends. Debits go through `try_debit`, which is a
//! guarded append with floor 0.

use std::sync::Arc;
use tracing::{debug, info};

use apotheca_core::{LedgerAccount, LedgerEntry, Money};

use super::{decode_all, decode_opt};
use crate::error::{DbError, DbResult};
use crate::store::{encode, DocumentStore, SumGuard};

const AMOUNT_FIELD: &str = "amount";

#[derive(Clone)]
pub struct LedgerRepository {
    store: Arc<dyn DocumentStore>,
}

impl LedgerRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        LedgerRepository { store }
    }

    /// Appends an entry to its account's journal without a balance check.
    pub async fn append(&self, entry: &LedgerEntry) -> DbResult<String> {
        let id = self
            .store
            .create(entry.account.collection(), encode(entry)?)
            .await?;
        debug!(account = %entry.account, amount = %entry.amount, "Ledger entry appended");
        Ok(id)
    }

    /// Appends a debit (negative `amount`) only if the balance stays at or
    /// above zero. Returns `None` when the account can't cover it.
    pub async fn try_debit(&self, entry: &LedgerEntry) -> DbResult<Option<String>> {
        match self
            .store
            .create_guarded(
                entry.account.collection(),
                encode(entry)?,
                &SumGuard::new(AMOUNT_FIELD, 0),
            )
            .await
        {
            Ok(id) => {
                info!(account = %entry.account, amount = %entry.amount, "Ledger debited");
                Ok(Some(id))
            }
            Err(DbError::GuardRejected { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn balance(&self, account: LedgerAccount) -> DbResult<Money> {
        let minor = self.store.sum(account.collection(), AMOUNT_FIELD).await?;
        Ok(Money::from_minor(minor))
    }

    /// Balances of every account, in display order.
    pub async fn balances(&self) -> DbResult<Vec<(LedgerAccount, Money)>> {
        let mut out = Vec::with_capacity(LedgerAccount::ALL.len());
        for account in LedgerAccount::ALL {
            out.push((account, self.balance(account).await?));
        }
        Ok(out)
    }

    pub async fn entries(&self, account: LedgerAccount) -> DbResult<Vec<LedgerEntry>> {
        decode_all(self.store.list(account.collection()).await?)
    }

    /// Removes a debit (negative entry). Undoing a debit only raises the
    /// balance; credits are refused since another counter may have spent
    /// them. Returns `false` if the entry is gone.
    pub async fn remove_debit(&self, account: LedgerAccount, id: &str) -> DbResult<bool> {
        let collection = account.collection();
        let Some(entry) = decode_opt::<LedgerEntry>(self.store.get(collection, id).await?)? else {
            return Ok(false);
        };
        if !entry.amount.is_negative() {
            return Err(DbError::guard_rejected(collection, Some(id), AMOUNT_FIELD));
        }
        let removed = self.store.delete(collection, id).await?;
        info!(account = %account, amount = %entry.amount, "Ledger debit removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use apotheca_core::LedgerEntryKind;
    use chrono::{NaiveDate, Utc};

    fn entry(account: LedgerAccount, kind: LedgerEntryKind, rupees: i64) -> LedgerEntry {
        LedgerEntry {
            id: String::new(),
            account,
            kind,
            amount: Money::from_rupees(rupees),
            reference_id: None,
            memo: None,
            business_day: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_balance_is_sum_of_entries() {
        let ledger = Database::in_memory().ledger();
        ledger
            .append(&entry(LedgerAccount::Cash, LedgerEntryKind::Sale, 100))
            .await
            .unwrap();
        ledger
            .append(&entry(LedgerAccount::Cash, LedgerEntryKind::Deposit, 50))
            .await
            .unwrap();
        ledger
            .append(&entry(LedgerAccount::JazzCash, LedgerEntryKind::Deposit, 7))
            .await
            .unwrap();

        assert_eq!(
            ledger.balance(LedgerAccount::Cash).await.unwrap(),
            Money::from_rupees(150)
        );
        let balances = ledger.balances().await.unwrap();
        assert_eq!(balances.len(), 4);
        assert_eq!(balances[1], (LedgerAccount::JazzCash, Money::from_rupees(7)));
        assert_eq!(balances[3].1, Money::zero());
    }

    #[tokio::test]
    async fn test_overdraft_rejected_and_balance_unchanged() {
        let ledger = Database::in_memory().ledger();
        ledger
            .append(&entry(LedgerAccount::Cash, LedgerEntryKind::Deposit, 100))
            .await
            .unwrap();

        let ok = ledger
            .try_debit(&entry(LedgerAccount::Cash, LedgerEntryKind::Withdrawal, -60))
            .await
            .unwrap();
        assert!(ok.is_some());

        let rejected = ledger
            .try_debit(&entry(LedgerAccount::Cash, LedgerEntryKind::Withdrawal, -41))
            .await
            .unwrap();
        assert!(rejected.is_none());
        assert_eq!(
            ledger.balance(LedgerAccount::Cash).await.unwrap(),
            Money::from_rupees(40)
        );
        assert_eq!(ledger.entries(LedgerAccount::Cash).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_debit() {
        let ledger = Database::in_memory().ledger();
        ledger
            .append(&entry(LedgerAccount::EasyPesa, LedgerEntryKind::Deposit, 50))
            .await
            .unwrap();
        let id = ledger
            .try_debit(&entry(LedgerAccount::EasyPesa, LedgerEntryKind::Expense, -30))
            .await
            .unwrap()
            .unwrap();

        assert!(ledger.remove_debit(LedgerAccount::EasyPesa, &id).await.unwrap());
        assert!(!ledger.remove_debit(LedgerAccount::EasyPesa, &id).await.unwrap());
        assert_eq!(
            ledger.balance(LedgerAccount::EasyPesa).await.unwrap(),
            Money::from_rupees(50)
        );
    }

    #[tokio::test]
    async fn test_remove_debit_refuses_credits() {
        let ledger = Database::in_memory().ledger();
        let id = ledger
            .append(&entry(LedgerAccount::Cash, LedgerEntryKind::Sale, 80))
            .await
            .unwrap();
        ledger
            .try_debit(&entry(LedgerAccount::Cash, LedgerEntryKind::Withdrawal, -80))
            .await
            .unwrap()
            .unwrap();

        let err = ledger.remove_debit(LedgerAccount::Cash, &id).await.unwrap_err();
        assert!(matches!(err, DbError::GuardRejected { .. }));
        assert_eq!(ledger.balance(LedgerAccount::Cash).await.unwrap(), Money::zero());
    }
}
