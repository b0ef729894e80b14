//! Vendor directory (`vendors`).

use std::sync::Arc;

use apotheca_core::Vendor;

use super::{decode_all, decode_opt};
use crate::error::DbResult;
use crate::store::{collections::VENDORS, encode, DocumentStore};

#[derive(Clone)]
pub struct VendorRepository {
    store: Arc<dyn DocumentStore>,
}

impl VendorRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        VendorRepository { store }
    }

    pub async fn insert(&self, vendor: &Vendor) -> DbResult<String> {
        self.store.create(VENDORS, encode(vendor)?).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Vendor>> {
        decode_opt(self.store.get(VENDORS, id).await?)
    }

    pub async fn list(&self) -> DbResult<Vec<Vendor>> {
        decode_all(self.store.list(VENDORS).await?)
    }

    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        self.store.delete(VENDORS, id).await
    }
}
