//! Behaviour every `DocumentStore` backend must share. Each backend's test
//! module calls [`run_all`] on a fresh store.

use serde_json::{json, Map, Value};

use super::{DocumentStore, SumGuard};
use crate::error::DbError;

fn body(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

pub async fn run_all(store: &dyn DocumentStore) {
    create_get_list(store).await;
    queries(store).await;
    update_and_delete(store).await;
    guarded_increment(store).await;
    guarded_create(store).await;
}

async fn create_get_list(store: &dyn DocumentStore) {
    let a = store
        .create("things", body(json!({"name": "a", "n": 1})))
        .await
        .unwrap();
    let b = store
        .create("things", body(json!({"name": "b", "n": 2})))
        .await
        .unwrap();
    assert_ne!(a, b);

    let doc = store.get("things", &a).await.unwrap().unwrap();
    assert_eq!(doc.body.get("name"), Some(&json!("a")));
    assert!(store.get("things", "missing").await.unwrap().is_none());
    assert!(store.get("other", &a).await.unwrap().is_none());

    let ids: Vec<String> = store
        .list("things")
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, vec![a.clone(), b]);
    assert!(store.list("empty").await.unwrap().is_empty());

    store
        .create_with_id("things", "fixed", body(json!({"name": "c"})))
        .await
        .unwrap();
    assert!(store
        .create_with_id("things", "fixed", body(json!({"name": "d"})))
        .await
        .is_err());
}

async fn queries(store: &dyn DocumentStore) {
    for (day, total) in [("2026-01-01", 100), ("2026-01-02", 50), ("2026-01-03", 70)] {
        store
            .create(
                "bills",
                body(json!({"businessDay": day, "total": total, "paid": total > 60})),
            )
            .await
            .unwrap();
    }

    let hits = store
        .query_eq("bills", "businessDay", &json!("2026-01-02"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].body.get("total"), Some(&json!(50)));

    let hits = store.query_eq("bills", "total", &json!(70)).await.unwrap();
    assert_eq!(hits.len(), 1);

    let hits = store.query_eq("bills", "paid", &json!(true)).await.unwrap();
    assert_eq!(hits.len(), 2);

    let hits = store
        .query_eq("bills", "customer", &Value::Null)
        .await
        .unwrap();
    assert_eq!(hits.len(), 3);

    let hits = store
        .query_range("bills", "businessDay", &json!("2026-01-01"), &json!("2026-01-03"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);

    assert!(matches!(
        store.query_eq("bills", "bad field", &json!(1)).await,
        Err(DbError::InvalidField(_))
    ));
    assert_eq!(store.sum("bills", "total").await.unwrap(), 220);
    assert_eq!(store.sum("nothing", "total").await.unwrap(), 0);
}

async fn update_and_delete(store: &dyn DocumentStore) {
    let id = store
        .create("vendors", body(json!({"name": "Ali", "phone": "0300", "city": "Lahore"})))
        .await
        .unwrap();

    store
        .update_fields("vendors", &id, body(json!({"phone": "0311", "city": null})))
        .await
        .unwrap();
    let doc = store.get("vendors", &id).await.unwrap().unwrap();
    assert_eq!(doc.body.get("name"), Some(&json!("Ali")));
    assert_eq!(doc.body.get("phone"), Some(&json!("0311")));
    assert!(doc.body.get("city").is_none());

    let err = store
        .update_fields("vendors", "missing", body(json!({"x": 1})))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    assert!(store.delete("vendors", &id).await.unwrap());
    assert!(!store.delete("vendors", &id).await.unwrap());
}

async fn guarded_increment(store: &dyn DocumentStore) {
    let id = store
        .create("products", body(json!({"name": "Panadol", "stockUnits": 50})))
        .await
        .unwrap();

    let left = store
        .increment("products", &id, "stockUnits", -20, Some(0))
        .await
        .unwrap();
    assert_eq!(left, 30);

    let err = store
        .increment("products", &id, "stockUnits", -31, Some(0))
        .await
        .unwrap_err();
    assert!(err.is_guard_rejected());

    let doc = store.get("products", &id).await.unwrap().unwrap();
    assert_eq!(doc.body.get("stockUnits"), Some(&json!(30)));

    assert_eq!(
        store
            .increment("products", &id, "stockUnits", -30, Some(0))
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        store
            .increment("products", &id, "stockUnits", 15, None)
            .await
            .unwrap(),
        15
    );
    // Missing fields start at zero.
    assert_eq!(
        store
            .increment("products", &id, "returns", 2, None)
            .await
            .unwrap(),
        2
    );

    let err = store
        .increment("products", "missing", "stockUnits", 1, None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

async fn guarded_create(store: &dyn DocumentStore) {
    let guard = SumGuard::new("amount", 0);

    store
        .create_guarded("Cash", body(json!({"amount": 10000})), &guard)
        .await
        .unwrap();
    store
        .create_guarded("Cash", body(json!({"amount": -6000})), &guard)
        .await
        .unwrap();

    let err = store
        .create_guarded("Cash", body(json!({"amount": -5000})), &guard)
        .await
        .unwrap_err();
    assert!(err.is_guard_rejected());
    assert_eq!(store.sum("Cash", "amount").await.unwrap(), 4000);
    assert_eq!(store.list("Cash").await.unwrap().len(), 2);

    // Empty collection: the first debit is checked against zero.
    let err = store
        .create_guarded("JazzCash", body(json!({"amount": -1})), &guard)
        .await
        .unwrap_err();
    assert!(err.is_guard_rejected());
    assert!(store.list("JazzCash").await.unwrap().is_empty());
}
