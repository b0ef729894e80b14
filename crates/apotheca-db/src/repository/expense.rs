//! Operating expenses (`duesSpendings`).

use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;

use apotheca_core::Expense;

use super::{decode_all, decode_opt};
use crate::error::DbResult;
use crate::store::{collections::EXPENSES, encode, DocumentStore};

#[derive(Clone)]
pub struct ExpenseRepository {
    store: Arc<dyn DocumentStore>,
}

impl ExpenseRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        ExpenseRepository { store }
    }

    pub async fn insert(&self, expense: &Expense) -> DbResult<String> {
        self.store.create(EXPENSES, encode(expense)?).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Expense>> {
        decode_opt(self.store.get(EXPENSES, id).await?)
    }

    pub async fn list(&self) -> DbResult<Vec<Expense>> {
        decode_all(self.store.list(EXPENSES).await?)
    }

    /// Expenses with `start <= businessDay < end`.
    pub async fn between(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Expense>> {
        let docs = self
            .store
            .query_range(
                EXPENSES,
                "businessDay",
                &json!(start.to_string()),
                &json!(end.to_string()),
            )
            .await?;
        decode_all(docs)
    }

    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        self.store.delete(EXPENSES, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use apotheca_core::{ExpenseCategory, LedgerAccount, Money};
    use chrono::Utc;

    #[tokio::test]
    async fn test_expense_crud_and_range() {
        let expenses = Database::in_memory().expenses();
        let day = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let id = expenses
            .insert(&Expense {
                id: String::new(),
                category: ExpenseCategory::Rent,
                amount: Money::from_rupees(25_000),
                account: LedgerAccount::BankTransfer,
                business_day: day,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let stored = expenses.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.category, ExpenseCategory::Rent);

        let march = expenses
            .between(
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(march.len(), 1);

        assert!(expenses.delete(&id).await.unwrap());
        assert!(expenses.list().await.unwrap().is_empty());
    }
}
