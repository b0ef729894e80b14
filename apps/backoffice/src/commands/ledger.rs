//! # Ledger Commands
//!
//! Deposits, withdrawals and balances of the four payment accounts.
//!
//! ```text
//! deposit(Cash, 500)   ──► append  { kind: deposit,    amount: +500 }
//! withdraw(Cash, 200)  ──► guarded { kind: withdrawal, amount: -200 }
//!                              │
//!                              ├── sum stays ≥ 0 ──► appended
//!                              └── would go < 0  ──► "Insufficient balance in Cash."
//! ```

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use apotheca_core::reporting::AccountBalance;
use apotheca_core::validation::validate_amount;
use apotheca_core::{LedgerAccount, LedgerEntry, LedgerEntryKind, Money};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppConfig, DbState};

/// Result of a deposit or withdrawal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReceipt {
    pub entry_id: String,
    pub account: LedgerAccount,
    pub balance: Money,
    pub message: String,
}

pub async fn deposit(
    db: &DbState,
    config: &AppConfig,
    account: LedgerAccount,
    amount: Money,
) -> ApiResult<LedgerReceipt> {
    debug!(account = %account, amount = %amount, "deposit command");
    validate_amount(amount)?;

    let now = Utc::now();
    let entry = LedgerEntry {
        id: String::new(),
        account,
        kind: LedgerEntryKind::Deposit,
        amount,
        reference_id: None,
        memo: None,
        business_day: config.business_day(now),
        created_at: now,
    };
    let ledger = db.inner().ledger();
    let entry_id = ledger.append(&entry).await?;
    let balance = ledger.balance(account).await?;

    info!(account = %account, amount = %amount, balance = %balance, "Deposit recorded");
    Ok(LedgerReceipt {
        entry_id,
        account,
        balance,
        message: format!("Deposited {} successfully.", config.format_currency(amount)),
    })
}

pub async fn withdraw(
    db: &DbState,
    config: &AppConfig,
    account: LedgerAccount,
    amount: Money,
) -> ApiResult<LedgerReceipt> {
    debug!(account = %account, amount = %amount, "withdraw command");
    validate_amount(amount)?;

    let now = Utc::now();
    let entry = LedgerEntry {
        id: String::new(),
        account,
        kind: LedgerEntryKind::Withdrawal,
        amount: -amount,
        reference_id: None,
        memo: None,
        business_day: config.business_day(now),
        created_at: now,
    };
    let ledger = db.inner().ledger();
    let Some(entry_id) = ledger.try_debit(&entry).await? else {
        warn!(account = %account, amount = %amount, "Withdrawal rejected");
        return Err(ApiError::insufficient_balance(account));
    };
    let balance = ledger.balance(account).await?;

    info!(account = %account, amount = %amount, balance = %balance, "Withdrawal recorded");
    Ok(LedgerReceipt {
        entry_id,
        account,
        balance,
        message: format!("Withdrawn {} successfully.", config.format_currency(amount)),
    })
}

pub async fn account_balance(db: &DbState, account: LedgerAccount) -> ApiResult<Money> {
    debug!(account = %account, "account_balance command");
    Ok(db.inner().ledger().balance(account).await?)
}

/// All four balances, in display order.
pub async fn account_balances(db: &DbState) -> ApiResult<Vec<AccountBalance>> {
    debug!("account_balances command");
    let balances = db.inner().ledger().balances().await?;
    Ok(balances
        .into_iter()
        .map(|(account, balance)| AccountBalance { account, balance })
        .collect())
}

pub async fn ledger_entries(db: &DbState, account: LedgerAccount) -> ApiResult<Vec<LedgerEntry>> {
    debug!(account = %account, "ledger_entries command");
    let mut entries = db.inner().ledger().entries(account).await?;
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(entries)
}
