//! In-process document store.
//!
//! Same contract as the SQLite backend, held in a `HashMap` behind a
//! mutex. Each operation takes the lock once, so guarded operations are
//! atomic with respect to each other.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{json_path, Document, DocumentStore, SumGuard};
use crate::error::{DbError, DbResult};

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, HashMap<String, Vec<Document>>>> {
        self.collections
            .lock()
            .map_err(|_| DbError::Internal("memory store lock poisoned".to_string()))
    }
}

/// Orders two scalars the way SQLite orders json_extract results: numbers
/// numerically, strings lexically, anything else not comparable.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn matches_eq(field: Option<&Value>, wanted: &Value) -> bool {
    match (field, wanted) {
        (None, Value::Null) | (Some(Value::Null), Value::Null) => true,
        (Some(v), w) => compare(v, w) == Some(Ordering::Equal),
        (None, _) => false,
    }
}

fn ensure_scalar(value: &Value) -> DbResult<()> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(DbError::InvalidField(
            "only scalar values can be compared".to_string(),
        )),
        _ => Ok(()),
    }
}

/// RFC 7396 merge patch.
fn merge_patch(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.remove(&key);
            }
            Value::Object(inner) => match target.get_mut(&key) {
                Some(Value::Object(existing)) => merge_patch(existing, inner),
                _ => {
                    let mut fresh = Map::new();
                    merge_patch(&mut fresh, inner);
                    target.insert(key, Value::Object(fresh));
                }
            },
            other => {
                target.insert(key, other);
            }
        }
    }
}

fn integer_field(body: &Map<String, Value>, field: &str) -> DbResult<i64> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| DbError::InvalidField(format!("{} is not an integer", field))),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, body: Map<String, Value>) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        self.create_with_id(collection, &id, body).await?;
        Ok(id)
    }

    async fn create_with_id(
        &self,
        collection: &str,
        id: &str,
        body: Map<String, Value>,
    ) -> DbResult<()> {
        let mut collections = self.lock()?;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| d.id == id) {
            return Err(DbError::duplicate("id", id));
        }
        docs.push(Document {
            id: id.to_string(),
            body,
        });
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Document>> {
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn list(&self, collection: &str) -> DbResult<Vec<Document>> {
        let collections = self.lock()?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> DbResult<Vec<Document>> {
        json_path(field)?;
        ensure_scalar(value)?;
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| matches_eq(d.body.get(field), value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn query_range(
        &self,
        collection: &str,
        field: &str,
        low: &Value,
        high: &Value,
    ) -> DbResult<Vec<Document>> {
        json_path(field)?;
        ensure_scalar(low)?;
        ensure_scalar(high)?;
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| match d.body.get(field) {
                        Some(v) => {
                            matches!(
                                compare(v, low),
                                Some(Ordering::Greater) | Some(Ordering::Equal)
                            ) && compare(v, high) == Some(Ordering::Less)
                        }
                        None => false,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        partial: Map<String, Value>,
    ) -> DbResult<()> {
        let mut collections = self.lock()?;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| DbError::not_found(collection, id))?;
        merge_patch(&mut doc.body, partial);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> DbResult<bool> {
        let mut collections = self.lock()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() != before)
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> DbResult<i64> {
        json_path(field)?;
        let mut collections = self.lock()?;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| DbError::not_found(collection, id))?;

        let next = integer_field(&doc.body, field)? + delta;
        if let Some(floor) = floor {
            if next < floor {
                return Err(DbError::guard_rejected(collection, Some(id), field));
            }
        }
        doc.body.insert(field.to_string(), Value::from(next));
        Ok(next)
    }

    async fn create_guarded(
        &self,
        collection: &str,
        body: Map<String, Value>,
        guard: &SumGuard,
    ) -> DbResult<String> {
        json_path(&guard.field)?;
        let mut collections = self.lock()?;
        let docs = collections.entry(collection.to_string()).or_default();

        let mut total = integer_field(&body, &guard.field)?;
        for doc in docs.iter() {
            total += integer_field(&doc.body, &guard.field)?;
        }
        if total < guard.floor {
            return Err(DbError::guard_rejected(collection, None, &guard.field));
        }

        let id = Uuid::new_v4().to_string();
        docs.push(Document {
            id: id.clone(),
            body,
        });
        Ok(id)
    }

    async fn sum(&self, collection: &str, field: &str) -> DbResult<i64> {
        json_path(field)?;
        let collections = self.lock()?;
        let mut total = 0;
        if let Some(docs) = collections.get(collection) {
            for doc in docs {
                total += integer_field(&doc.body, field)?;
            }
        }
        Ok(total)
    }

    async fn health_check(&self) -> bool {
        self.lock().is_ok()
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;

    #[tokio::test]
    async fn test_memory_store_contract() {
        conformance::run_all(&MemoryDocumentStore::new()).await;
    }

    #[test]
    fn test_merge_patch_nested() {
        let mut target = serde_json::json!({"a": {"b": 1, "c": 2}, "d": 3})
            .as_object()
            .cloned()
            .unwrap();
        let patch = serde_json::json!({"a": {"b": null, "e": 5}, "d": null})
            .as_object()
            .cloned()
            .unwrap();
        merge_patch(&mut target, patch);
        assert_eq!(Value::Object(target), serde_json::json!({"a": {"c": 2, "e": 5}}));
    }
}
