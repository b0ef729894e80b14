//! # Expense Commands
//!
//! Shop spending (electricity, rent, software, maintenance) paid out of a
//! ledger account.
//!
//! ```text
//! pay_expense(Rent, 15000, BankTransfer)
//!   1. guarded debit of BankTransfer ── short ──► "Insufficient balance in BankTransfer."
//!   2. duesSpendings/{id}            ── fails ──► debit removed
//! ```
//!
//! Deleting an expense removes the record only. The ledger debit stays in
//! the account journal, which is append-only.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use apotheca_core::reporting::expenses_total;
use apotheca_core::validation::validate_amount;
use apotheca_core::{Expense, ExpenseCategory, LedgerAccount, LedgerEntry, LedgerEntryKind, Money, Report};
use apotheca_db::collections::EXPENSES;

use crate::error::{ApiError, ApiResult};
use crate::saga::{Compensation, Saga};
use crate::state::{AppConfig, DbState};

pub async fn pay_expense(
    db: &DbState,
    config: &AppConfig,
    category: ExpenseCategory,
    amount: Money,
    account: LedgerAccount,
) -> ApiResult<Expense> {
    debug!(category = %category, amount = %amount, account = %account, "pay_expense command");
    validate_amount(amount)?;

    let db = db.inner();
    let now = Utc::now();
    let day = config.business_day(now);

    let debit = LedgerEntry {
        id: String::new(),
        account,
        kind: LedgerEntryKind::Expense,
        amount: -amount,
        reference_id: None,
        memo: Some(category.label().to_string()),
        business_day: day,
        created_at: now,
    };
    let Some(entry_id) = db.ledger().try_debit(&debit).await? else {
        return Err(ApiError::insufficient_balance(account));
    };

    let mut saga = Saga::new("expense", db);
    saga.record(Compensation::RefundDebit {
        account,
        id: entry_id,
    });

    let mut expense = Expense {
        id: String::new(),
        category,
        amount,
        account,
        business_day: day,
        created_at: now,
    };
    expense.id = match db.expenses().insert(&expense).await {
        Ok(id) => id,
        Err(e) => return Err(saga.abort(e.into()).await),
    };
    saga.commit();

    info!(id = %expense.id, category = %category, amount = %amount, "Expense paid");
    Ok(expense)
}

/// Expenses, newest first. With a range, only `from <= day < to`.
pub async fn list_expenses(
    db: &DbState,
    range: Option<(NaiveDate, NaiveDate)>,
) -> ApiResult<Vec<Expense>> {
    debug!(range = ?range, "list_expenses command");
    let expenses = db.inner().expenses();
    let mut rows = match range {
        Some((from, to)) => expenses.between(from, to).await?,
        None => expenses.list().await?,
    };
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(rows)
}

pub async fn delete_expense(db: &DbState, id: &str) -> ApiResult<()> {
    debug!(id = %id, "delete_expense command");
    if !db.inner().expenses().delete(id).await? {
        return Err(ApiError::not_found("Expense", id));
    }
    info!(id = %id, collection = EXPENSES, "Expense deleted");
    Ok(())
}

/// Printable expense list with a total row.
pub async fn expense_report(
    db: &DbState,
    config: &AppConfig,
    range: Option<(NaiveDate, NaiveDate)>,
) -> ApiResult<Report> {
    debug!("expense_report command");
    let expenses = list_expenses(db, range).await?;

    let subtitle = match range {
        Some((from, to)) => format!("Expense Report - {} to {}", from, to),
        None => "Expense Report".to_string(),
    };
    let mut report = Report::new(
        config.store.name.clone(),
        ["Date", "Category", "Account", "Amount"],
    )
    .subtitle(subtitle);

    for expense in &expenses {
        report.push_row([
            expense.business_day.to_string(),
            expense.category.label().to_string(),
            expense.account.to_string(),
            config.format_currency(expense.amount),
        ]);
    }
    report.push_row([
        "Total".to_string(),
        String::new(),
        String::new(),
        config.format_currency(expenses_total(&expenses)),
    ]);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{balance, fund, FailingStore};

    #[tokio::test]
    async fn test_pay_debits_account() {
        let db = DbState::in_memory();
        let config = AppConfig::default();
        fund(&db, LedgerAccount::BankTransfer, 20_000).await;

        let expense = pay_expense(
            &db,
            &config,
            ExpenseCategory::Rent,
            Money::from_rupees(15_000),
            LedgerAccount::BankTransfer,
        )
        .await
        .unwrap();
        assert_eq!(expense.category, ExpenseCategory::Rent);
        assert_eq!(
            balance(&db, LedgerAccount::BankTransfer).await,
            Money::from_rupees(5_000)
        );
        assert_eq!(list_expenses(&db, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_short_account_rejected() {
        let db = DbState::in_memory();
        let config = AppConfig::default();
        fund(&db, LedgerAccount::Cash, 100).await;

        let err = pay_expense(
            &db,
            &config,
            ExpenseCategory::ElectricityBill,
            Money::from_rupees(101),
            LedgerAccount::Cash,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientBalance);
        assert!(list_expenses(&db, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_record_removes_debit() {
        let db = FailingStore::failing_on(EXPENSES);
        let config = AppConfig::default();
        fund(&db, LedgerAccount::Cash, 100).await;

        pay_expense(
            &db,
            &config,
            ExpenseCategory::Miscellaneous,
            Money::from_rupees(40),
            LedgerAccount::Cash,
        )
        .await
        .unwrap_err();
        assert_eq!(balance(&db, LedgerAccount::Cash).await, Money::from_rupees(100));
    }

    #[tokio::test]
    async fn test_report_and_delete() {
        let db = DbState::in_memory();
        let config = AppConfig::default();
        fund(&db, LedgerAccount::Cash, 1_000).await;

        let a = pay_expense(
            &db,
            &config,
            ExpenseCategory::SoftwareBill,
            Money::from_rupees(300),
            LedgerAccount::Cash,
        )
        .await
        .unwrap();
        pay_expense(
            &db,
            &config,
            ExpenseCategory::ShopMaintenance,
            Money::from_rupees(200),
            LedgerAccount::Cash,
        )
        .await
        .unwrap();

        let report = expense_report(&db, &config, None).await.unwrap();
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[2][3], "PKR 500.00");
        assert!(report.to_text().contains("Software Bill"));

        delete_expense(&db, &a.id).await.unwrap();
        assert_eq!(list_expenses(&db, None).await.unwrap().len(), 1);
        let err = delete_expense(&db, &a.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
