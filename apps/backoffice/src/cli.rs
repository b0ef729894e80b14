//! # `apotheca` Command Line
//!
//! Back-office tasks from a terminal.
//!
//! ```text
//! apotheca [--config <file>] <command> [args]
//!
//!   dashboard                     today's numbers and balances
//!   stock                         packs and loose tabs per product
//!   low-stock                     products below the threshold
//!   expiring                      expired and expiring-soon products
//!   balances                      the four account balances
//!   sales [YYYY-MM-DD]            per-day totals, or one day's bills
//!   profits [YYYY-MM-DD]          profit rows, optionally for one day
//!   dues                          open customer balances
//!   vendors                       vendor directory
//!   pending                       unpaid vendor purchases
//!   expenses                      expense report
//!   deposit <account> <amount>    credit an account
//!   withdraw <account> <amount>   debit an account (never below zero)
//!   add-user <username> <password>
//! ```

use std::fmt::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use apotheca_core::{LedgerAccount, Money, Report};

use crate::commands::{auth, catalog, dues, expenses, ledger, purchasing, reports, vendors};
use crate::error::ApiResult;
use crate::state::{AppConfig, DbState};

/// Pharmacy back office: stock, sales, ledgers and reports.
#[derive(Parser, Debug)]
#[command(name = "apotheca", author, version, about)]
pub struct Cli {
    /// Config file (default: apotheca.toml in the platform config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Today's numbers and balances
    Dashboard,
    /// Packs and loose tabs per product
    Stock,
    /// Products below the low-stock threshold
    LowStock,
    /// Expired and expiring-soon products
    Expiring,
    /// The four account balances
    Balances,
    /// Per-day totals, or one day's bills
    Sales {
        /// Business day, YYYY-MM-DD
        day: Option<NaiveDate>,
    },
    /// Profit rows, optionally for one day
    Profits {
        /// Business day, YYYY-MM-DD
        day: Option<NaiveDate>,
    },
    /// Open customer balances
    Dues,
    /// Vendor directory
    Vendors,
    /// Unpaid vendor purchases
    Pending,
    /// Expense report
    Expenses,
    /// Credit Cash, JazzCash, EasyPesa or BankTransfer
    Deposit { account: LedgerAccount, amount: Money },
    /// Debit an account (never below zero)
    Withdraw { account: LedgerAccount, amount: Money },
    /// Create a back-office login
    AddUser { username: String, password: String },
}

/// Runs a command and renders its result as text for stdout.
pub async fn execute(command: &Command, db: &DbState, config: &AppConfig) -> ApiResult<String> {
    let money = |m: Money| config.format_currency(m);

    let report = match command {
        Command::Dashboard => {
            let s = reports::dashboard(db, config).await?;
            let mut out = String::new();
            let _ = writeln!(out, "{}  {}", config.store.name, s.today);
            let _ = writeln!(out);
            let _ = writeln!(out, "Today's sales     {} ({} bills)", money(s.today_sales), s.today_bills);
            let _ = writeln!(out, "Today's profit    {}", money(s.today_profit));
            let _ = writeln!(out, "Outstanding       {}", money(s.outstanding_total));
            let _ = writeln!(
                out,
                "Products          {} ({} expired, {} expiring soon, {} low stock)",
                s.product_count, s.expired_count, s.expiring_soon_count, s.low_stock_count
            );
            let total: Money = s.balances.iter().map(|b| b.balance).sum();
            let _ = writeln!(out, "All accounts      {}", money(total));
            for b in &s.balances {
                let _ = writeln!(out, "  {:<15} {}", b.account.to_string(), money(b.balance));
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "Last 7 days");
            for day in &s.weekly_sales {
                let _ = writeln!(out, "  {}  {}", day.day, money(day.total_sales));
            }
            return Ok(out);
        }

        Command::Stock | Command::LowStock => {
            let rows = if *command == Command::Stock {
                catalog::stock_levels(db, config).await?
            } else {
                reports::low_stock(db, config).await?
            };
            let mut report = Report::new(
                config.store.name.clone(),
                ["Product", "Company", "Packs", "Tabs", "Price", "Level"],
            );
            for r in rows {
                report.push_row([
                    r.name,
                    r.company,
                    r.packs.to_string(),
                    r.loose_tabs.to_string(),
                    money(r.selling_price),
                    format!("{:?}", r.level),
                ]);
            }
            report
        }

        Command::Expiring => {
            let mut report = Report::new(
                config.store.name.clone(),
                ["Product", "Company", "Batch", "Expiry", "Days", "Status"],
            )
            .subtitle("Expiring Products");
            for r in reports::expiring_products(db, config).await? {
                report.push_row([
                    r.name,
                    r.company,
                    r.batch.unwrap_or_default(),
                    r.expiry_date.to_string(),
                    r.remaining_days.to_string(),
                    format!("{:?}", r.status),
                ]);
            }
            report
        }

        Command::Balances => {
            let mut report = Report::new(config.store.name.clone(), ["Account", "Balance"]);
            for b in ledger::account_balances(db).await? {
                report.push_row([b.account.to_string(), money(b.balance)]);
            }
            report
        }

        Command::Sales { day: Some(day) } => reports::sales_report(db, config, *day).await?,
        Command::Sales { day: None } => {
            let mut report = Report::new(
                config.store.name.clone(),
                ["Date", "Bills", "Products Sold", "Total Sales"],
            )
            .subtitle("Sales by Day");
            for d in reports::sales_by_day(db).await? {
                report.push_row([
                    d.day.to_string(),
                    d.bill_count.to_string(),
                    d.products_sold.to_string(),
                    money(d.total_sales),
                ]);
            }
            report
        }

        Command::Profits { day } => reports::profit_report(db, config, *day).await?,

        Command::Dues => {
            let mut report = Report::new(
                config.store.name.clone(),
                ["Id", "Customer", "Remaining", "Since"],
            )
            .subtitle("Outstanding Balances");
            for d in dues::list_outstanding(db).await? {
                report.push_row([
                    d.id,
                    d.customer_name,
                    money(d.remaining),
                    config.business_day(d.created_at).to_string(),
                ]);
            }
            report
        }

        Command::Vendors => {
            let mut report = Report::new(
                config.store.name.clone(),
                ["Id", "Name", "Company", "Phone"],
            );
            for v in vendors::list_vendors(db).await? {
                report.push_row([v.id, v.name, v.company_name, v.phone_number]);
            }
            report
        }

        Command::Pending => {
            let mut report = Report::new(
                config.store.name.clone(),
                ["Id", "Vendor", "Company", "Lines", "Total"],
            )
            .subtitle("Pending Vendor Payments");
            for p in purchasing::list_pending_payments(db).await? {
                report.push_row([
                    p.id,
                    p.vendor_name,
                    p.company_name,
                    p.items.len().to_string(),
                    money(p.total_bill),
                ]);
            }
            report
        }

        Command::Expenses => expenses::expense_report(db, config, None).await?,

        Command::Deposit { account, amount } => {
            return Ok(ledger::deposit(db, config, *account, *amount).await?.message);
        }
        Command::Withdraw { account, amount } => {
            return Ok(ledger::withdraw(db, config, *account, *amount).await?.message);
        }

        Command::AddUser { username, password } => {
            let user = auth::create_user(db, username, password).await?;
            return Ok(format!("User '{}' created.", user.username));
        }
    };

    Ok(report.to_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(s: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("apotheca").chain(s.split_whitespace()))
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("dashboard").unwrap().command, Command::Dashboard);
        assert_eq!(parse("low-stock").unwrap().command, Command::LowStock);
        assert_eq!(parse("sales").unwrap().command, Command::Sales { day: None });
        assert_eq!(
            parse("sales 2026-03-02").unwrap().command,
            Command::Sales {
                day: NaiveDate::from_ymd_opt(2026, 3, 2)
            }
        );
        assert_eq!(parse("--help").unwrap_err().kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_parse_config_flag_anywhere() {
        let cli = parse("balances --config /tmp/a.toml").unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/a.toml")));
        assert_eq!(cli.command, Command::Balances);

        let cli = parse("-c /tmp/b.toml dues").unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/b.toml")));
    }

    #[test]
    fn test_parse_money_commands() {
        assert_eq!(
            parse("deposit jazzcash 250.50").unwrap().command,
            Command::Deposit {
                account: LedgerAccount::JazzCash,
                amount: Money::from_minor(25_050)
            }
        );
        assert_eq!(
            parse("withdraw Cash").unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(
            parse("withdraw Wallet 10").unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert_eq!(parse("refund").unwrap_err().kind(), ErrorKind::InvalidSubcommand);
        assert_eq!(parse("stock extra").unwrap_err().kind(), ErrorKind::UnknownArgument);
        assert_eq!(
            parse("sales yesterday").unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
    }

    #[tokio::test]
    async fn test_execute_ledger_round_trip() {
        let db = DbState::in_memory();
        let config = AppConfig::default();

        let out = execute(
            &Command::Deposit {
                account: LedgerAccount::Cash,
                amount: Money::from_rupees(500),
            },
            &db,
            &config,
        )
        .await
        .unwrap();
        assert_eq!(out, "Deposited PKR 500.00 successfully.");

        let err = execute(
            &Command::Withdraw {
                account: LedgerAccount::Cash,
                amount: Money::from_rupees(501),
            },
            &db,
            &config,
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "Insufficient balance in Cash.");

        let out = execute(&Command::Balances, &db, &config).await.unwrap();
        assert!(out.contains("PKR 500.00"));
        assert!(out.contains("BankTransfer"));
    }

    #[tokio::test]
    async fn test_execute_dashboard_on_empty_store() {
        let db = DbState::in_memory();
        let out = execute(&Command::Dashboard, &db, &AppConfig::default())
            .await
            .unwrap();
        assert!(out.starts_with("Apotheca Pharmacy"));
        assert!(out.contains("Last 7 days"));
    }
}
