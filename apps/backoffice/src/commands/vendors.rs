//! Vendor directory commands.

use chrono::Utc;
use tracing::{debug, info, warn};

use apotheca_core::validation::validate_vendor_fields;
use apotheca_core::Vendor;

use crate::error::{ApiError, ApiResult};
use crate::state::DbState;

/// Adds a vendor. Name, company and phone are all required.
pub async fn add_vendor(
    db: &DbState,
    name: &str,
    company_name: &str,
    phone_number: &str,
) -> ApiResult<Vendor> {
    debug!(name = %name, company = %company_name, "add_vendor command");
    validate_vendor_fields(name, company_name, phone_number)?;

    let mut vendor = Vendor {
        id: String::new(),
        name: name.trim().to_string(),
        company_name: company_name.trim().to_string(),
        phone_number: phone_number.trim().to_string(),
        created_at: Utc::now(),
    };
    vendor.id = db.inner().vendors().insert(&vendor).await?;

    info!(id = %vendor.id, name = %vendor.name, "Vendor added");
    Ok(vendor)
}

/// Vendors sorted by name.
pub async fn list_vendors(db: &DbState) -> ApiResult<Vec<Vendor>> {
    debug!("list_vendors command");
    let mut vendors = db.inner().vendors().list().await?;
    vendors.sort_by_key(|v| v.name.to_lowercase());
    Ok(vendors)
}

/// Removes a vendor that has no unpaid purchases.
pub async fn remove_vendor(db: &DbState, id: &str) -> ApiResult<()> {
    debug!(id = %id, "remove_vendor command");
    let db = db.inner();

    let pending = db.purchases().pending_for_vendor(id).await?;
    if !pending.is_empty() {
        warn!(id = %id, pending = pending.len(), "Vendor has unpaid purchases");
        return Err(ApiError::business(format!(
            "Vendor has {} pending payment(s) and cannot be removed",
            pending.len()
        )));
    }

    if !db.vendors().delete(id).await? {
        return Err(ApiError::not_found("Vendor", id));
    }
    info!(id = %id, "Vendor removed");
    Ok(())
}
