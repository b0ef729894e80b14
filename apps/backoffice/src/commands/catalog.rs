//! # Catalog Commands
//!
//! Product add-or-update, listing, search and stock levels.
//!
//! ## Add-or-Update Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Add Product Form                                     │
//! │                                                                         │
//! │  name "Panadol 500mg", company "GSK", 12 packs × 10 tabs ...            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_product_draft ──── invalid ──► VALIDATION_ERROR, no write     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  vendor_id set? ──► vendor must exist                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  products where name == "Panadol 500mg"                                 │
//! │       ├── found  ──► overwrite every editable field (updated)           │
//! │       └── none   ──► insert new product                 (created)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use apotheca_core::reporting::{stock_rows, StockRow};
use apotheca_core::validation::validate_product_draft;
use apotheca_core::{Product, ProductDraft};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppConfig, DbState};

/// Outcome of [`add_or_update_product`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSaved {
    pub id: String,
    /// `false` when an existing product with the same name was overwritten.
    pub created: bool,
}

/// Products supplied by one vendor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorProducts {
    pub vendor_id: Option<String>,
    pub vendor_name: String,
    pub products: Vec<Product>,
}

/// Adds a product, or overwrites the product with the same name.
pub async fn add_or_update_product(db: &DbState, draft: ProductDraft) -> ApiResult<ProductSaved> {
    debug!(name = %draft.name, "add_or_update_product command");
    validate_product_draft(&draft)?;

    let db = db.inner();
    if let Some(vendor_id) = &draft.vendor_id {
        if db.vendors().get(vendor_id).await?.is_none() {
            return Err(ApiError::not_found("Vendor", vendor_id));
        }
    }

    let now = Utc::now();
    let existing = db.products().find_by_name(&draft.name).await?;

    if let Some(mut product) = existing.into_iter().next() {
        draft.overwrite(&mut product, now);
        db.products().replace(&product).await?;
        info!(id = %product.id, name = %product.name, "Product updated");
        return Ok(ProductSaved {
            id: product.id,
            created: false,
        });
    }

    let product = draft.into_product(now);
    let id = db.products().insert(&product).await?;
    info!(id = %id, name = %product.name, units = product.stock_units, "Product added");
    Ok(ProductSaved { id, created: true })
}

pub async fn list_products(db: &DbState) -> ApiResult<Vec<Product>> {
    debug!("list_products command");
    Ok(db.inner().products().list_all().await?)
}

/// Products grouped by supplying vendor, vendors by name. Products with no
/// (or an unknown) vendor are grouped last.
pub async fn list_products_by_vendor(db: &DbState) -> ApiResult<Vec<VendorProducts>> {
    debug!("list_products_by_vendor command");
    let db = db.inner();
    let vendors = db.vendors().list().await?;
    let products = db.products().list_all().await?;

    let mut grouped: BTreeMap<Option<String>, Vec<Product>> = BTreeMap::new();
    for product in products {
        let key = product
            .vendor_id
            .clone()
            .filter(|id| vendors.iter().any(|v| &v.id == id));
        grouped.entry(key).or_default().push(product);
    }

    let unassigned = grouped.remove(&None);
    let mut groups: Vec<VendorProducts> = grouped
        .into_iter()
        .map(|(vendor_id, products)| {
            let vendor_name = vendors
                .iter()
                .find(|v| Some(&v.id) == vendor_id.as_ref())
                .map(|v| format!("{} ({})", v.name, v.company_name))
                .unwrap_or_default();
            VendorProducts {
                vendor_id,
                vendor_name,
                products,
            }
        })
        .collect();
    groups.sort_by(|a, b| a.vendor_name.cmp(&b.vendor_name));

    if let Some(products) = unassigned {
        groups.push(VendorProducts {
            vendor_id: None,
            vendor_name: "No vendor".to_string(),
            products,
        });
    }
    Ok(groups)
}

pub async fn get_product(db: &DbState, id: &str) -> ApiResult<Product> {
    debug!(id = %id, "get_product command");
    db.inner()
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// Exact-name lookup used by the sale screen.
pub async fn find_product_by_name(db: &DbState, name: &str) -> ApiResult<Product> {
    debug!(name = %name, "find_product_by_name command");
    db.inner()
        .products()
        .find_by_name(name)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::new(crate::error::ErrorCode::NotFound, "Product not found."))
}

/// Case-insensitive substring search over name, generic name and company.
pub async fn search_products(db: &DbState, term: &str) -> ApiResult<Vec<Product>> {
    debug!(term = %term, "search_products command");
    Ok(db.inner().products().search(term).await?)
}

/// Deletes a product. Bills and profit entries keep their own copies of
/// the name and prices.
pub async fn delete_product(db: &DbState, id: &str) -> ApiResult<()> {
    debug!(id = %id, "delete_product command");
    if !db.inner().products().delete(id).await? {
        return Err(ApiError::not_found("Product", id));
    }
    info!(id = %id, "Product deleted");
    Ok(())
}

/// Packs and loose tabs left per product.
pub async fn stock_levels(db: &DbState, config: &AppConfig) -> ApiResult<Vec<StockRow>> {
    debug!("stock_levels command");
    let products = db.inner().products().list_all().await?;
    Ok(stock_rows(&products, config.inventory.low_stock_threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{draft, vendor};
    use apotheca_core::reporting::StockLevel;
    use apotheca_core::Money;

    #[tokio::test]
    async fn test_new_name_round_trips() {
        let db = DbState::in_memory();
        let mut input = draft("Brufen 400mg", 12, 10, 90);
        input.generic_name = Some("Ibuprofen".to_string());
        input.batch = Some("B-77".to_string());

        let saved = add_or_update_product(&db, input.clone()).await.unwrap();
        assert!(saved.created);

        let found = find_product_by_name(&db, "Brufen 400mg").await.unwrap();
        assert_eq!(found.id, saved.id);
        assert_eq!(found.company, input.company);
        assert_eq!(found.packs_on_hand(), 12);
        assert_eq!(found.tabs_per_pack, 10);
        assert_eq!(found.purchase_price, input.purchase_price);
        assert_eq!(found.selling_price, input.selling_price);
        assert_eq!(found.expiry_date, input.expiry_date);
        assert_eq!(found.generic_name.as_deref(), Some("Ibuprofen"));
        assert_eq!(found.batch.as_deref(), Some("B-77"));
    }

    #[tokio::test]
    async fn test_same_name_overwrites() {
        let db = DbState::in_memory();
        let first = add_or_update_product(&db, draft("Panadol", 5, 10, 50))
            .await
            .unwrap();
        let mut again = draft("Panadol", 8, 20, 60);
        again.company = "Haleon".to_string();
        let second = add_or_update_product(&db, again).await.unwrap();

        assert!(!second.created);
        assert_eq!(first.id, second.id);
        assert_eq!(list_products(&db).await.unwrap().len(), 1);

        let p = get_product(&db, &first.id).await.unwrap();
        assert_eq!(p.company, "Haleon");
        assert_eq!(p.stock_units, 160);
        assert_eq!(p.selling_price, Money::from_rupees(60));
    }

    #[tokio::test]
    async fn test_invalid_draft_writes_nothing() {
        let db = DbState::in_memory();
        let mut bad = draft("Panadol", 5, 10, 50);
        bad.tabs_per_pack = 0;
        let err = add_or_update_product(&db, bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(list_products(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_price_beyond_bound_is_rejected() {
        let db = DbState::in_memory();
        let mut bad = draft("Panadol", 5, 10, 50);
        bad.selling_price = "92233720368547758.07".parse().unwrap();
        let err = add_or_update_product(&db, bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(list_products(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_vendor_is_rejected() {
        let db = DbState::in_memory();
        let mut input = draft("Panadol", 5, 10, 50);
        input.vendor_id = Some("nope".to_string());
        let err = add_or_update_product(&db, input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_missing_name_message() {
        let db = DbState::in_memory();
        let err = find_product_by_name(&db, "Nothing").await.unwrap_err();
        assert_eq!(err.message, "Product not found.");
    }

    #[tokio::test]
    async fn test_search_and_delete() {
        let db = DbState::in_memory();
        add_or_update_product(&db, draft("Panadol Extra", 5, 10, 70))
            .await
            .unwrap();
        let keep = add_or_update_product(&db, draft("Brufen", 5, 10, 90))
            .await
            .unwrap();

        let hits = search_products(&db, "dol ex").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Panadol Extra");

        delete_product(&db, &keep.id).await.unwrap();
        let err = delete_product(&db, &keep.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_grouped_by_vendor() {
        let db = DbState::in_memory();
        let ali = vendor(&db, "Ali", "Ali Traders").await;

        let mut supplied = draft("Panadol", 5, 10, 50);
        supplied.vendor_id = Some(ali.clone());
        add_or_update_product(&db, supplied).await.unwrap();
        add_or_update_product(&db, draft("ORS", 5, 1, 25)).await.unwrap();

        let groups = list_products_by_vendor(&db).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].vendor_id.as_deref(), Some(ali.as_str()));
        assert_eq!(groups[0].vendor_name, "Ali (Ali Traders)");
        assert_eq!(groups[1].vendor_name, "No vendor");
        assert_eq!(groups[1].products[0].name, "ORS");
    }

    #[tokio::test]
    async fn test_stock_levels_show_packs_and_tabs() {
        let db = DbState::in_memory();
        let config = AppConfig::default();
        let saved = add_or_update_product(&db, draft("Panadol", 12, 10, 50))
            .await
            .unwrap();
        db.inner().products().take_stock(&saved.id, 25).await.unwrap();

        let rows = stock_levels(&db, &config).await.unwrap();
        assert_eq!(rows[0].packs, 9);
        assert_eq!(rows[0].loose_tabs, 5);
        assert_eq!(rows[0].level, StockLevel::Low);
    }
}
