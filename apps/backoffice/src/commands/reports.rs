//! # Report Commands
//!
//! Read-only views. Every call loads the collections it needs and
//! aggregates in memory through `apotheca_core::reporting`.
//!
//! ```text
//! ┌──────────────────┬─────────────────────────────┬──────────────────────┐
//! │ Command          │ Reads                       │ Aggregation          │
//! ├──────────────────┼─────────────────────────────┼──────────────────────┤
//! │ dashboard        │ products bills profits      │ DashboardSummary     │
//! │                  │ remaings ledgers            │                      │
//! │ expiring_products│ products                    │ expiry_report        │
//! │ low_stock        │ products                    │ low_stock            │
//! │ sales_by_day     │ bills                       │ sales_by_day         │
//! │ sales_for_day    │ bills (businessDay == d)    │ sales_for_day        │
//! │ weekly_sales     │ bills (last 7 days)         │ weekly_sales         │
//! │ profits          │ profits                     │ profit_by_day        │
//! └──────────────────┴─────────────────────────────┴──────────────────────┘
//! ```

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::debug;

use apotheca_core::reporting::{
    self, AccountBalance, DailyProfit, DailySales, DashboardInputs, DashboardSummary, ExpiryRow,
    StockRow,
};
use apotheca_core::{Bill, Money, ProfitEntry, Report};

use crate::error::ApiResult;
use crate::state::{AppConfig, DbState};

/// Profit entries plus the per-day rollup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitOverview {
    pub today_profit: Money,
    pub by_day: Vec<DailyProfit>,
    /// Newest first.
    pub entries: Vec<ProfitEntry>,
}

pub async fn dashboard(db: &DbState, config: &AppConfig) -> ApiResult<DashboardSummary> {
    debug!("dashboard command");
    let db = db.inner();
    let today = config.today();

    let products = db.products().list_all().await?;
    let bills = db.sales().list_bills().await?;
    let profits = db.sales().list_profits().await?;
    let outstanding_total = db.dues().total().await?;
    let balances = db
        .ledger()
        .balances()
        .await?
        .into_iter()
        .map(|(account, balance)| AccountBalance { account, balance })
        .collect();

    Ok(DashboardSummary::build(DashboardInputs {
        today,
        products: &products,
        bills: &bills,
        profits: &profits,
        outstanding_total,
        balances,
        low_stock_threshold: config.inventory.low_stock_threshold,
        expiry_warning_days: config.inventory.expiry_warning_days,
    }))
}

/// Expired and expiring-soon products, soonest first.
pub async fn expiring_products(db: &DbState, config: &AppConfig) -> ApiResult<Vec<ExpiryRow>> {
    debug!("expiring_products command");
    let products = db.inner().products().list_all().await?;
    Ok(reporting::expiry_report(
        &products,
        config.today(),
        config.inventory.expiry_warning_days,
    ))
}

pub async fn low_stock(db: &DbState, config: &AppConfig) -> ApiResult<Vec<StockRow>> {
    debug!("low_stock command");
    let products = db.inner().products().list_all().await?;
    Ok(reporting::low_stock(
        &products,
        config.inventory.low_stock_threshold,
    ))
}

/// Sales per business day, newest first.
pub async fn sales_by_day(db: &DbState) -> ApiResult<Vec<DailySales>> {
    debug!("sales_by_day command");
    let bills = db.inner().sales().list_bills().await?;
    Ok(reporting::sales_by_day(&bills))
}

/// Bills of one day in the order they were rung up.
pub async fn sales_for_day(db: &DbState, day: NaiveDate) -> ApiResult<Vec<Bill>> {
    debug!(day = %day, "sales_for_day command");
    let bills = db.inner().sales().bills_for_day(day).await?;
    Ok(reporting::sales_for_day(&bills, day))
}

/// Last seven days ending today, oldest first.
pub async fn weekly_sales(db: &DbState, config: &AppConfig) -> ApiResult<Vec<DailySales>> {
    debug!("weekly_sales command");
    let today = config.today();
    let bills = db
        .inner()
        .sales()
        .bills_between(today - Duration::days(6), today + Duration::days(1))
        .await?;
    Ok(reporting::weekly_sales(&bills, today))
}

/// Printable list of one day's bills.
pub async fn sales_report(db: &DbState, config: &AppConfig, day: NaiveDate) -> ApiResult<Report> {
    debug!(day = %day, "sales_report command");
    let bills = sales_for_day(db, day).await?;
    let offset = config.offset();

    let mut report = Report::new(
        config.store.name.clone(),
        ["Customer", "Time", "Items", "Amount", "Received", "Account"],
    )
    .subtitle(format!("Sales Report - {}", day));

    for bill in &bills {
        let items = bill
            .items
            .iter()
            .map(|l| format!("{} x{} {}", l.product_name, l.quantity, l.unit))
            .collect::<Vec<_>>()
            .join(", ");
        report.push_row([
            bill.customer_name.clone(),
            bill.created_at.with_timezone(&offset).format("%H:%M").to_string(),
            items,
            config.format_currency(bill.total),
            config.format_currency(bill.amount_received),
            bill.account.to_string(),
        ]);
    }

    let total: Money = bills.iter().map(|b| b.total).sum();
    let products: i64 = bills.iter().map(Bill::products_sold).sum();
    report.push_row([
        "Total".to_string(),
        String::new(),
        format!("{} products", products),
        config.format_currency(total),
    ]);
    Ok(report)
}

pub async fn profits(db: &DbState, config: &AppConfig) -> ApiResult<ProfitOverview> {
    debug!("profits command");
    let mut entries = db.inner().sales().list_profits().await?;
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(ProfitOverview {
        today_profit: reporting::profit_for_day(&entries, config.today()),
        by_day: reporting::profit_by_day(&entries),
        entries,
    })
}

/// Printable profit rows: date, product, profit, quantity. With a day,
/// only that day.
pub async fn profit_report(
    db: &DbState,
    config: &AppConfig,
    day: Option<NaiveDate>,
) -> ApiResult<Report> {
    debug!(day = ?day, "profit_report command");
    let sales = db.inner().sales();
    let mut entries = match day {
        Some(d) => sales.profits_for_day(d).await?,
        None => sales.list_profits().await?,
    };
    entries.sort_by_key(|e| e.created_at);

    let subtitle = match day {
        Some(d) => format!("Profit Report - {}", d),
        None => "Profit Report".to_string(),
    };
    let mut report = Report::new(
        config.store.name.clone(),
        ["Date", "Product", "Profit", "Quantity"],
    )
    .subtitle(subtitle);

    for entry in &entries {
        report.push_row([
            entry.business_day.to_string(),
            entry.product_name.clone(),
            config.format_currency(entry.profit),
            format!("{} {}", entry.quantity_sold, entry.unit),
        ]);
    }
    let total: Money = entries.iter().map(|e| e.profit).sum();
    report.push_row([
        "Total".to_string(),
        String::new(),
        config.format_currency(total),
    ]);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::checkout::{add_to_cart, begin_payment, settle_checkout};
    use crate::state::CartState;
    use crate::test_support::{fund, product};
    use apotheca_core::reporting::{ExpiryStatus, StockLevel};
    use apotheca_core::{LedgerAccount, SellUnit, Tender};
    use chrono::Utc;

    async fn sell(db: &DbState, config: &AppConfig, id: &str, packs: i64, cash: i64) {
        let cart = CartState::new();
        add_to_cart(db, &cart, id, packs, SellUnit::Pack).await.unwrap();
        begin_payment(
            &cart,
            Tender {
                customer_name: "Sana".to_string(),
                account: LedgerAccount::Cash,
                cash_given: Money::from_rupees(cash),
            },
        )
        .await
        .unwrap();
        settle_checkout(db, &cart, config).await.unwrap();
    }

    #[tokio::test]
    async fn test_dashboard_reflects_sales() {
        let db = DbState::in_memory();
        let config = AppConfig::default();
        fund(&db, LedgerAccount::JazzCash, 10).await;
        let panadol = product(&db, "Panadol", 20, 10, 50).await;
        product(&db, "Brufen", 3, 10, 90).await;

        sell(&db, &config, &panadol, 2, 80).await;

        let summary = dashboard(&db, &config).await.unwrap();
        assert_eq!(summary.today, config.today());
        assert_eq!(summary.today_sales, Money::from_rupees(100));
        assert_eq!(summary.today_bills, 1);
        assert_eq!(summary.today_profit, Money::from_rupees(20));
        assert_eq!(summary.product_count, 2);
        assert_eq!(summary.low_stock_count, 1);
        assert_eq!(summary.outstanding_total, Money::from_rupees(-20));
        assert_eq!(summary.balances[0].balance, Money::from_rupees(80));
        assert_eq!(summary.balances[1].balance, Money::from_rupees(10));
        assert_eq!(summary.weekly_sales.len(), 7);
        assert_eq!(summary.weekly_sales[6].total_sales, Money::from_rupees(100));
    }

    #[tokio::test]
    async fn test_expiry_boundaries() {
        let db = DbState::in_memory();
        let config = AppConfig::default();
        let today = config.today();

        for (name, days) in [("Soon", 180), ("Later", 181), ("Today", 0), ("Gone", -3)] {
            let mut d = crate::test_support::draft(name, 1, 10, 50);
            d.expiry_date = today + Duration::days(days);
            db.inner()
                .products()
                .insert(&d.into_product(Utc::now()))
                .await
                .unwrap();
        }

        let rows = expiring_products(&db, &config).await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Gone", "Today", "Soon"]);
        assert_eq!(rows[1].status, ExpiryStatus::Expired);
        assert_eq!(rows[2].status, ExpiryStatus::ExpiringSoon);
        assert_eq!(rows[2].remaining_days, 180);
    }

    #[tokio::test]
    async fn test_low_stock_threshold_from_config() {
        let db = DbState::in_memory();
        let mut config = AppConfig::default();
        product(&db, "Panadol", 5, 10, 50).await;
        product(&db, "Brufen", 0, 10, 90).await;

        let rows = low_stock(&db, &config).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.level == StockLevel::Out));

        config.inventory.low_stock_threshold = 1;
        let rows = low_stock(&db, &config).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Brufen");
    }

    #[tokio::test]
    async fn test_sales_views_and_report() {
        let db = DbState::in_memory();
        let config = AppConfig::default();
        let panadol = product(&db, "Panadol", 20, 10, 50).await;

        sell(&db, &config, &panadol, 2, 100).await;
        sell(&db, &config, &panadol, 1, 50).await;

        let days = sales_by_day(&db).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].total_sales, Money::from_rupees(150));
        assert_eq!(days[0].products_sold, 3);

        let today = config.today();
        let bills = sales_for_day(&db, today).await.unwrap();
        assert_eq!(bills.len(), 2);
        assert!(bills[0].created_at <= bills[1].created_at);

        let week = weekly_sales(&db, &config).await.unwrap();
        assert_eq!(week[6].bill_count, 2);

        let report = sales_report(&db, &config, today).await.unwrap();
        assert_eq!(report.title, "Apotheca Pharmacy");
        assert_eq!(
            report.subtitle.as_deref(),
            Some(format!("Sales Report - {}", today).as_str())
        );
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[2][3], "PKR 150.00");
        assert!(report.to_html().contains("<td>Sana</td>"));
    }

    #[tokio::test]
    async fn test_profit_views() {
        let db = DbState::in_memory();
        let config = AppConfig::default();
        let panadol = product(&db, "Panadol", 20, 10, 50).await;
        sell(&db, &config, &panadol, 3, 150).await;

        let overview = profits(&db, &config).await.unwrap();
        assert_eq!(overview.today_profit, Money::from_rupees(30));
        assert_eq!(overview.by_day.len(), 1);
        assert_eq!(overview.entries.len(), 1);

        let report = profit_report(&db, &config, Some(config.today()))
            .await
            .unwrap();
        assert_eq!(report.rows[0][1], "Panadol");
        assert_eq!(report.rows[0][3], "3 pack");
        assert_eq!(report.rows[1][2], "PKR 30.00");
    }
}
