//! # SQLite Document Store
//!
//! All collections share one `documents` table; bodies are JSON text and
//! fields are reached with `json_extract(body, '$.field')`.
//!
//! ## Guarded Writes
//! ```text
//! increment (stock):
//!   UPDATE documents
//!      SET body = json_set(body, $.f, current + delta)
//!    WHERE collection = ? AND id = ?
//!      AND (floor IS NULL OR current + delta >= floor)
//!   RETURNING new value
//!   ── no row? ──► document exists ? GuardRejected : NotFound
//!
//! create_guarded (ledger debit):
//!   BEGIN IMMEDIATE            ← write lock before reading the sum
//!   SELECT SUM(json_extract(body, $.amount))
//!   sum + new < floor ? ROLLBACK, GuardRejected
//!   INSERT …; COMMIT
//! ```

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{json_path, Document, DocumentStore, SumGuard};
use crate::error::{DbError, DbResult};

/// Document store backed by a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

/// A JSON scalar in the form SQLite compares it.
///
/// Booleans bind as 0/1 because that is what `json_extract` returns for
/// `false`/`true`.
enum Scalar {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl Scalar {
    fn from_json(value: &Value) -> DbResult<Self> {
        match value {
            Value::Null => Ok(Scalar::Null),
            Value::Bool(b) => Ok(Scalar::Int(i64::from(*b))),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Scalar::Int(i)),
                None => n
                    .as_f64()
                    .map(Scalar::Real)
                    .ok_or_else(|| DbError::InvalidField(format!("unsupported number {}", n))),
            },
            Value::String(s) => Ok(Scalar::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(DbError::InvalidField(
                "only scalar values can be compared".to_string(),
            )),
        }
    }

    fn bind<'q>(
        self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            Scalar::Null => query.bind(Option::<String>::None),
            Scalar::Int(v) => query.bind(v),
            Scalar::Real(v) => query.bind(v),
            Scalar::Text(v) => query.bind(v),
        }
    }
}

fn row_to_document(row: &SqliteRow) -> DbResult<Document> {
    let id: String = row.try_get("id")?;
    let body: String = row.try_get("body")?;
    match serde_json::from_str(&body)? {
        Value::Object(body) => Ok(Document { id, body }),
        _ => Err(DbError::Serialization(format!(
            "document {} is not a JSON object",
            id
        ))),
    }
}

fn rows_to_documents(rows: Vec<SqliteRow>) -> DbResult<Vec<Document>> {
    rows.iter().map(row_to_document).collect()
}

fn field_value(body: &Map<String, Value>, field: &str) -> DbResult<i64> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| DbError::InvalidField(format!("{} is not an integer", field))),
    }
}

impl SqliteDocumentStore {
    /// Wraps a pool whose schema is already migrated.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteDocumentStore { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn insert(
        conn: &mut SqliteConnection,
        collection: &str,
        id: &str,
        body: &Map<String, Value>,
    ) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();
        let body = serde_json::to_string(body)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, created_at, updated_at, version)
            VALUES (?1, ?2, ?3, ?4, ?4, 1)
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(body)
        .bind(now)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn guarded_insert(
        conn: &mut SqliteConnection,
        collection: &str,
        id: &str,
        body: &Map<String, Value>,
        guard: &SumGuard,
        path: &str,
    ) -> DbResult<()> {
        let current: i64 = sqlx::query_scalar(
            r#"
            SELECT CAST(COALESCE(SUM(json_extract(body, ?2)), 0) AS INTEGER)
            FROM documents
            WHERE collection = ?1
            "#,
        )
        .bind(collection)
        .bind(path)
        .fetch_one(&mut *conn)
        .await?;

        let after = current + field_value(body, &guard.field)?;
        if after < guard.floor {
            debug!(
                collection = %collection,
                current,
                after,
                floor = guard.floor,
                "Guarded insert rejected"
            );
            return Err(DbError::guard_rejected(collection, None, &guard.field));
        }

        Self::insert(conn, collection, id, body).await
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
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
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut conn, collection, id, &body).await?;
        debug!(collection = %collection, id = %id, "Document created");
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Document>> {
        let row = sqlx::query("SELECT id, body FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn list(&self, collection: &str) -> DbResult<Vec<Document>> {
        let rows =
            sqlx::query("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY rowid")
                .bind(collection)
                .fetch_all(&self.pool)
                .await?;
        rows_to_documents(rows)
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> DbResult<Vec<Document>> {
        let path = json_path(field)?;
        let scalar = Scalar::from_json(value)?;
        let query = sqlx::query(
            r#"
            SELECT id, body FROM documents
            WHERE collection = ?1 AND json_extract(body, ?2) IS ?3
            ORDER BY rowid
            "#,
        )
        .bind(collection)
        .bind(path);
        let rows = scalar.bind(query).fetch_all(&self.pool).await?;
        rows_to_documents(rows)
    }

    async fn query_range(
        &self,
        collection: &str,
        field: &str,
        low: &Value,
        high: &Value,
    ) -> DbResult<Vec<Document>> {
        let path = json_path(field)?;
        let low = Scalar::from_json(low)?;
        let high = Scalar::from_json(high)?;
        let query = sqlx::query(
            r#"
            SELECT id, body FROM documents
            WHERE collection = ?1
              AND json_extract(body, ?2) >= ?3
              AND json_extract(body, ?2) < ?4
            ORDER BY rowid
            "#,
        )
        .bind(collection)
        .bind(path);
        let rows = high
            .bind(low.bind(query))
            .fetch_all(&self.pool)
            .await?;
        rows_to_documents(rows)
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        partial: Map<String, Value>,
    ) -> DbResult<()> {
        let patch = serde_json::to_string(&partial)?;
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = json_patch(body, ?3), updated_at = ?4, version = version + 1
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(patch)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> DbResult<i64> {
        let path = json_path(field)?;
        let row = sqlx::query(
            r#"
            UPDATE documents
            SET body = json_set(body, ?3, COALESCE(json_extract(body, ?3), 0) + ?4),
                updated_at = ?5,
                version = version + 1
            WHERE collection = ?1 AND id = ?2
              AND (?6 IS NULL OR COALESCE(json_extract(body, ?3), 0) + ?4 >= ?6)
            RETURNING CAST(json_extract(body, ?3) AS INTEGER) AS value
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&path)
        .bind(delta)
        .bind(Utc::now().to_rfc3339())
        .bind(floor)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row.try_get("value")?);
        }

        let exists = sqlx::query("SELECT 1 FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if !exists {
            return Err(DbError::not_found(collection, id));
        }

        debug!(
            collection = %collection,
            id = %id,
            field = %field,
            delta,
            "Guarded increment rejected"
        );
        Err(DbError::guard_rejected(collection, Some(id), field))
    }

    async fn create_guarded(
        &self,
        collection: &str,
        body: Map<String, Value>,
        guard: &SumGuard,
    ) -> DbResult<String> {
        let path = json_path(&guard.field)?;
        let id = Uuid::new_v4().to_string();

        // IMMEDIATE takes the write lock before the sum is read, so two
        // debits cannot both pass the check. Dropping the transaction
        // without a commit rolls it back.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Self::guarded_insert(&mut tx, collection, &id, &body, guard, &path).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn sum(&self, collection: &str, field: &str) -> DbResult<i64> {
        let path = json_path(field)?;
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT CAST(COALESCE(SUM(json_extract(body, ?2)), 0) AS INTEGER)
            FROM documents
            WHERE collection = ?1
            "#,
        )
        .bind(collection)
        .bind(path)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    async fn store() -> SqliteDocumentStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::migrations::run_migrations(&pool).await.unwrap();
        SqliteDocumentStore::new(pool)
    }

    #[tokio::test]
    async fn test_sqlite_store_contract() {
        conformance::run_all(&store().await).await;
    }

    #[tokio::test]
    async fn test_concurrent_guarded_decrements_never_oversell() {
        let store = Arc::new(store().await);
        let id = store
            .create(
                "products",
                json!({"stockUnits": 50}).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .increment("products", &id, "stockUnits", -10, Some(0))
                    .await
                    .is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 5);

        let doc = store.get("products", &id).await.unwrap().unwrap();
        assert_eq!(doc.body.get("stockUnits"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn test_guarded_insert_returns_connection_without_open_transaction() {
        let store = store().await;
        let guard = SumGuard::new("amount", 0);
        let body = |amount: i64| json!({ "amount": amount }).as_object().cloned().unwrap();

        store.create_guarded("Cash", body(100), &guard).await.unwrap();
        let err = store.create_guarded("Cash", body(-500), &guard).await.unwrap_err();
        assert!(matches!(err, DbError::GuardRejected { .. }));

        // Single-connection pool: a leftover transaction would make BEGIN fail
        let mut conn = store.pool().acquire().await.unwrap();
        sqlx::query("BEGIN").execute(&mut *conn).await.unwrap();
        sqlx::query("ROLLBACK").execute(&mut *conn).await.unwrap();
        drop(conn);

        store.create_guarded("Cash", body(-40), &guard).await.unwrap();
        assert_eq!(store.sum("Cash", "amount").await.unwrap(), 60);
    }

    #[tokio::test]
    async fn test_body_stored_as_json() {
        let store = store().await;
        let id = store
            .create("vendors", json!({"name": "Ali"}).as_object().cloned().unwrap())
            .await
            .unwrap();
        let name: String = sqlx::query_scalar(
            "SELECT json_extract(body, '$.name') FROM documents WHERE id = ?1",
        )
        .bind(&id)
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(name, "Ali");
    }
}
