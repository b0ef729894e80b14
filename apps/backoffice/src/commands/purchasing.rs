//! # Purchasing Commands
//!
//! Incoming stock is recorded as a pending vendor payment and only enters
//! the catalog once the vendor is paid.
//!
//! ## Purchase Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save_purchase(vendor, lines)                                           │
//! │      └──► pendingPayments/{id}   totalBill = Σ purchasePrice × packs    │
//! │                                                                         │
//! │  pay_pending_payment(id, account)                                       │
//! │      1. guarded ledger debit of totalBill ── short ──► rejected         │
//! │      2. payments/{id}                                                   │
//! │      3. per line:                                                       │
//! │           same name + company in catalog ──► add stock, refresh prices  │
//! │           otherwise                      ──► new product for vendor     │
//! │      4. delete pendingPayments/{id}                                     │
//! │                                                                         │
//! │  Any failure undoes the completed steps in reverse (see saga.rs).       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde_json::Map;
use tracing::{debug, info};

use apotheca_core::validation::validate_purchase_line;
use apotheca_core::{
    CoreError, LedgerAccount, LedgerEntry, LedgerEntryKind, Money, PendingVendorPayment,
    ProductDraft, VendorPayment,
};
use apotheca_db::collections::{PAYMENTS, PENDING_PAYMENTS, PRODUCTS};
use apotheca_db::store::encode;
use apotheca_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::saga::{Compensation, Saga};
use crate::state::{AppConfig, DbState};

/// Fields `refresh_from_purchase` overwrites on a matched product.
const REFRESHED_FIELDS: [&str; 7] = [
    "purchasePrice",
    "sellingPrice",
    "expiryDate",
    "tabsPerPack",
    "updatedAt",
    "batch",
    "vendorId",
];

/// Records a purchase from `vendor_id` as a pending payment.
pub async fn save_purchase(
    db: &DbState,
    vendor_id: &str,
    items: Vec<ProductDraft>,
) -> ApiResult<PendingVendorPayment> {
    debug!(vendor_id = %vendor_id, lines = items.len(), "save_purchase command");
    if items.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }
    for item in &items {
        validate_purchase_line(item)?;
    }

    let db = db.inner();
    let vendor = db
        .vendors()
        .get(vendor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor", vendor_id))?;

    let items: Vec<ProductDraft> = items
        .into_iter()
        .map(|item| ProductDraft {
            vendor_id: Some(vendor.id.clone()),
            ..item
        })
        .collect();
    let total_bill: Money = items.iter().map(ProductDraft::line_cost).sum();

    let mut pending = PendingVendorPayment {
        id: String::new(),
        vendor_id: vendor.id.clone(),
        vendor_name: vendor.name.clone(),
        company_name: vendor.company_name.clone(),
        items,
        total_bill,
        created_at: Utc::now(),
    };
    pending.id = db.purchases().insert_pending(&pending).await?;

    info!(
        id = %pending.id,
        vendor = %pending.vendor_name,
        total = %pending.total_bill,
        "Purchase saved as pending payment"
    );
    Ok(pending)
}

/// Unpaid purchases, oldest first.
pub async fn list_pending_payments(db: &DbState) -> ApiResult<Vec<PendingVendorPayment>> {
    debug!("list_pending_payments command");
    let mut pending = db.inner().purchases().list_pending().await?;
    pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(pending)
}

/// Pays a pending purchase from `account` and brings its lines into stock.
pub async fn pay_pending_payment(
    db: &DbState,
    config: &AppConfig,
    pending_id: &str,
    account: LedgerAccount,
) -> ApiResult<VendorPayment> {
    debug!(pending_id = %pending_id, account = %account, "pay_pending_payment command");
    let db = db.inner();

    let pending = db
        .purchases()
        .get_pending(pending_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Pending payment", pending_id))?;

    let mut saga = Saga::new("vendor_payment", db);
    let payment = match settle_purchase(db, &mut saga, config, &pending, account).await {
        Ok(payment) => payment,
        Err(e) => return Err(saga.abort(e).await),
    };
    saga.commit();

    info!(
        pending_id = %pending.id,
        vendor = %pending.vendor_name,
        account = %account,
        amount = %payment.amount,
        "Vendor paid"
    );
    Ok(payment)
}

async fn settle_purchase(
    db: &Database,
    saga: &mut Saga<'_>,
    config: &AppConfig,
    pending: &PendingVendorPayment,
    account: LedgerAccount,
) -> ApiResult<VendorPayment> {
    let now = Utc::now();
    let day = config.business_day(now);

    // 1. Debit
    let debit = LedgerEntry {
        id: String::new(),
        account,
        kind: LedgerEntryKind::VendorPayment,
        amount: -pending.total_bill,
        reference_id: Some(pending.id.clone()),
        memo: Some(pending.vendor_name.clone()),
        business_day: day,
        created_at: now,
    };
    if pending.total_bill.is_positive() {
        let Some(entry_id) = db.ledger().try_debit(&debit).await? else {
            return Err(ApiError::insufficient_balance(account));
        };
        saga.record(Compensation::RefundDebit {
            account,
            id: entry_id,
        });
    }

    // 2. Payment record
    let mut payment = VendorPayment {
        id: String::new(),
        pending_id: pending.id.clone(),
        vendor_id: pending.vendor_id.clone(),
        vendor_name: pending.vendor_name.clone(),
        account,
        amount: pending.total_bill,
        items: pending.items.clone(),
        business_day: day,
        paid_at: now,
    };
    payment.id = db.purchases().insert_payment(&payment).await?;
    saga.record(Compensation::delete(PAYMENTS, payment.id.clone()));

    // 3. Stock
    for line in &pending.items {
        let line = ProductDraft {
            vendor_id: Some(pending.vendor_id.clone()),
            ..line.clone()
        };
        match db
            .products()
            .find_by_name_and_company(&line.name, &line.company)
            .await?
        {
            Some(existing) => {
                let units = line.stock_units();
                let level = db.products().add_stock(&existing.id, units).await?;
                saga.record(Compensation::RemoveStock {
                    product_id: existing.id.clone(),
                    units,
                });

                let mut previous = encode(&existing)?;
                let fields: Map<_, _> = REFRESHED_FIELDS
                    .iter()
                    .filter_map(|f| previous.remove(*f).map(|v| (f.to_string(), v)))
                    .collect();
                saga.record(Compensation::RestoreFields {
                    collection: PRODUCTS.to_string(),
                    id: existing.id.clone(),
                    fields,
                });
                db.products()
                    .refresh_from_purchase(&existing.id, &line, now)
                    .await?;
                debug!(product_id = %existing.id, units, level, "Restocked");
            }
            None => {
                let product = line.into_product(now);
                let id = db.products().insert(&product).await?;
                saga.record(Compensation::delete(PRODUCTS, id.clone()));
                debug!(product_id = %id, name = %product.name, "New product from purchase");
            }
        }
    }

    // 4. Close the pending payment
    let body = encode(pending)?;
    if !db.purchases().delete_pending(&pending.id).await? {
        return Err(ApiError::not_found("Pending payment", &pending.id));
    }
    saga.record(Compensation::RecreateDocument {
        collection: PENDING_PAYMENTS.to_string(),
        id: pending.id.clone(),
        body,
    });

    Ok(payment)
}

/// Completed vendor payments, newest first, optionally for one vendor.
pub async fn list_vendor_payments(
    db: &DbState,
    vendor_id: Option<&str>,
) -> ApiResult<Vec<VendorPayment>> {
    debug!(vendor_id = ?vendor_id, "list_vendor_payments command");
    let purchases = db.inner().purchases();
    let mut payments = match vendor_id {
        Some(id) => purchases.payments_for_vendor(id).await?,
        None => purchases.list_payments().await?,
    };
    payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
    Ok(payments)
}
