//! Back-office logins (`login`). Only password hashes are stored; hashing
//! and verification live in the backoffice auth commands.

use serde_json::json;
use std::sync::Arc;

use apotheca_core::UserAccount;

use super::decode_all;
use crate::error::{DbError, DbResult};
use crate::store::{collections::LOGIN, encode, DocumentStore};

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        UserRepository { store }
    }

    /// Inserts a user. Usernames are unique.
    pub async fn insert(&self, user: &UserAccount) -> DbResult<String> {
        if self.find_by_username(&user.username).await?.is_some() {
            return Err(DbError::duplicate("username", user.username.clone()));
        }
        self.store.create(LOGIN, encode(user)?).await
    }

    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<UserAccount>> {
        let docs = self
            .store
            .query_eq(LOGIN, "username", &json!(username.trim()))
            .await?;
        Ok(decode_all(docs)?.into_iter().next())
    }

    pub async fn list(&self) -> DbResult<Vec<UserAccount>> {
        decode_all(self.store.list(LOGIN).await?)
    }

    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        self.store.delete(LOGIN, id).await
    }
}
