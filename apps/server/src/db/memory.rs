//! In-process document store
//!
//! Holds every collection in memory behind a single `RwLock`. It mirrors the
//! managed backend's read semantics (order-by excludes documents without the
//! field, ties break on document id, cursors resume strictly after a snapshot)
//! so it can stand in for it in development and tests.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    query::{CollectionQuery, WriteBatch, WriteOp},
    traits::DocumentStore,
};
use crate::{
    models::{Collection, Document, JsonMap, SortDirection},
    Error, Result,
};

type Collections = HashMap<Collection, BTreeMap<String, JsonMap>>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document under a caller-chosen key, replacing any previous one.
    pub async fn put(&self, collection: Collection, id: &str, data: JsonMap) -> Document {
        let document = Document::new(id, data);
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(document.id.clone(), document.data.clone());
        document
    }

    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }

    fn matching(collections: &Collections, query: &CollectionQuery) -> Vec<Document> {
        let Some(documents) = collections.get(&query.collection) else {
            return Vec::new();
        };

        let mut matched: Vec<Document> = documents
            .iter()
            .filter(|(_, data)| query.matches_fields(data))
            .map(|(id, data)| Document {
                id: id.clone(),
                data: data.clone(),
            })
            .collect();
        matched.sort_by(|a, b| compare_documents(a, b, &query.order_by, query.direction));
        matched
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn count(&self, query: &CollectionQuery) -> Result<u64> {
        let collections = self.collections.read().await;
        let count = collections.get(&query.collection).map_or(0, |documents| {
            documents
                .values()
                .filter(|data| query.matches_fields(data))
                .count()
        });
        Ok(count as u64)
    }

    async fn find(&self, query: &CollectionQuery) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let matched = Self::matching(&collections, query);

        let start = match &query.start_after {
            Some(cursor) => matched.partition_point(|doc| {
                compare_documents(doc, cursor, &query.order_by, query.direction)
                    != Ordering::Greater
            }),
            None => 0,
        };
        let limit = query.limit.unwrap_or(usize::MAX);

        Ok(matched.into_iter().skip(start).take(limit).collect())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn insert(&self, collection: Collection, data: JsonMap) -> Result<Document> {
        let id = Uuid::new_v4().simple().to_string();
        Ok(self.put(collection, &id, data).await)
    }

    async fn update(&self, collection: Collection, id: &str, patch: JsonMap) -> Result<Document> {
        let mut collections = self.collections.write().await;
        let data = apply_update(&mut collections, collection, id, patch)?;
        Ok(Document {
            id: id.to_string(),
            data,
        })
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        apply_delete(&mut collections, collection, id)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut collections = self.collections.write().await;

        // Stage on a copy so a failing op leaves the store untouched.
        let mut staged = collections.clone();
        for op in batch.ops {
            match op {
                WriteOp::Update {
                    collection,
                    id,
                    patch,
                    expect,
                } => {
                    check_expected(&staged, collection, &id, &expect)?;
                    apply_update(&mut staged, collection, &id, patch)?;
                }
                WriteOp::Delete { collection, id } => {
                    apply_delete(&mut staged, collection, &id)?;
                }
            }
        }

        *collections = staged;
        Ok(())
    }
}

fn apply_update(
    collections: &mut Collections,
    collection: Collection,
    id: &str,
    patch: JsonMap,
) -> Result<JsonMap> {
    let data = collections
        .get_mut(&collection)
        .and_then(|documents| documents.get_mut(id))
        .ok_or_else(|| Error::record_not_found(collection.as_str(), id))?;

    for (key, value) in patch {
        if key != "id" {
            data.insert(key, value);
        }
    }
    Ok(data.clone())
}

fn check_expected(
    collections: &Collections,
    collection: Collection,
    id: &str,
    expect: &JsonMap,
) -> Result<()> {
    let data = collections
        .get(&collection)
        .and_then(|documents| documents.get(id))
        .ok_or_else(|| Error::record_not_found(collection.as_str(), id))?;

    match WriteOp::stale_field(expect, data) {
        Some(field) => Err(Error::Conflict(format!(
            "{}/{} changed concurrently ({})",
            collection, id, field
        ))),
        None => Ok(()),
    }
}

fn apply_delete(collections: &mut Collections, collection: Collection, id: &str) -> Result<()> {
    collections
        .get_mut(&collection)
        .and_then(|documents| documents.remove(id))
        .map(|_| ())
        .ok_or_else(|| Error::record_not_found(collection.as_str(), id))
}

/// Order two documents by `field`, then by id, in the given direction.
fn compare_documents(a: &Document, b: &Document, field: &str, direction: SortDirection) -> Ordering {
    let null = JsonValue::Null;
    let ordering = compare_values(a.field(field).unwrap_or(&null), b.field(field).unwrap_or(&null))
        .then_with(|| a.id.cmp(&b.id));
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Total order over JSON values: null < bool < number < string < array < object.
fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    fn rank(value: &JsonValue) -> u8 {
        match value {
            JsonValue::Null => 0,
            JsonValue::Bool(_) => 1,
            JsonValue::Number(_) => 2,
            JsonValue::String(_) => 3,
            JsonValue::Array(_) => 4,
            JsonValue::Object(_) => 5,
        }
    }

    match (a, b) {
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Array(x), JsonValue::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Filter;
    use serde_json::json;

    fn map(value: JsonValue) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .put(Collection::Rooms, "r-3", map(json!({"createdAt": "2024-01-03", "floor": 1})))
            .await;
        store
            .put(Collection::Rooms, "r-1", map(json!({"createdAt": "2024-01-01", "floor": 2})))
            .await;
        store
            .put(Collection::Rooms, "r-2", map(json!({"createdAt": "2024-01-02", "floor": 1})))
            .await;
        store
            .put(Collection::Rooms, "r-x", map(json!({"floor": 1})))
            .await;
        store
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[tokio::test]
    async fn find_orders_by_field_and_skips_documents_without_it() {
        let store = seeded().await;
        let query = CollectionQuery::new(Collection::Rooms, "createdAt");
        let docs = store.find(&query).await.unwrap();
        assert_eq!(ids(&docs), vec!["r-1", "r-2", "r-3"]);
        assert_eq!(store.count(&query).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn descending_order_reverses_ties_too() {
        let store = seeded().await;
        let query = CollectionQuery::new(Collection::Rooms, "floor").with_direction(SortDirection::Desc);
        let docs = store.find(&query).await.unwrap();
        assert_eq!(ids(&docs), vec!["r-1", "r-x", "r-3", "r-2"]);
    }

    #[tokio::test]
    async fn start_after_resumes_strictly_after_cursor() {
        let store = seeded().await;
        let query = CollectionQuery::new(Collection::Rooms, "createdAt");
        let first = store.find(&query.clone().with_limit(1)).await.unwrap();
        let rest = store
            .find(&query.start_after(first[0].clone()).with_limit(5))
            .await
            .unwrap();
        assert_eq!(ids(&rest), vec!["r-2", "r-3"]);
    }

    #[tokio::test]
    async fn filters_apply_to_count_and_find() {
        let store = seeded().await;
        let query = CollectionQuery::new(Collection::Rooms, "createdAt")
            .with_filters([Filter::eq("floor", 1)]);
        assert_eq!(store.count(&query).await.unwrap(), 2);
        assert_eq!(ids(&store.find(&query).await.unwrap()), vec!["r-2", "r-3"]);
    }

    #[tokio::test]
    async fn update_merges_and_reports_missing_documents() {
        let store = seeded().await;
        let updated = store
            .update(Collection::Rooms, "r-1", map(json!({"floor": 7, "id": "ignored"})))
            .await
            .unwrap();
        assert_eq!(updated.data["floor"], 7);
        assert_eq!(updated.data["createdAt"], "2024-01-01");
        assert!(!updated.data.contains_key("id"));

        let err = store
            .update(Collection::Rooms, "missing", JsonMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn failed_batch_leaves_store_untouched() {
        let store = seeded().await;
        let batch = WriteBatch::new()
            .update(Collection::Rooms, "r-1", map(json!({"floor": 9})))
            .delete(Collection::Rooms, "missing");
        assert!(store.commit(batch).await.is_err());

        let room = store.get(Collection::Rooms, "r-1").await.unwrap().unwrap();
        assert_eq!(room.data["floor"], 2);
    }

    #[tokio::test]
    async fn guarded_update_conflicts_when_fields_changed() {
        let store = seeded().await;
        let guarded = |floor: i64| {
            WriteBatch::new()
                .update_if(
                    Collection::Rooms,
                    "r-1",
                    map(json!({"floor": 5})),
                    map(json!({"floor": floor, "wing": null})),
                )
                .update(Collection::Rooms, "r-2", map(json!({"floor": 6})))
        };

        let err = store.commit(guarded(3)).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        let untouched = store.get(Collection::Rooms, "r-2").await.unwrap().unwrap();
        assert_eq!(untouched.data["floor"], 1);

        store.commit(guarded(2)).await.unwrap();
        let room = store.get(Collection::Rooms, "r-1").await.unwrap().unwrap();
        assert_eq!(room.data["floor"], 5);
    }

    #[tokio::test]
    async fn count_agrees_with_find() {
        let store = seeded().await;
        for query in [
            CollectionQuery::new(Collection::Rooms, "floor"),
            CollectionQuery::new(Collection::Rooms, "createdAt").with_filters([Filter::eq("floor", 2)]),
            CollectionQuery::new(Collection::Rooms, "createdAt").with_filters([Filter::eq("floor", "1")]),
            CollectionQuery::new(Collection::Beds, "createdAt"),
        ] {
            let found = store.find(&query).await.unwrap();
            assert_eq!(store.count(&query).await.unwrap(), found.len() as u64, "{query:?}");
        }
    }

    #[tokio::test]
    async fn insert_assigns_fresh_keys() {
        let store = MemoryStore::new();
        let a = store.insert(Collection::Beds, JsonMap::new()).await.unwrap();
        let b = store.insert(Collection::Beds, JsonMap::new()).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(Collection::Beds).await, 2);
    }

    #[test]
    fn value_order_ranks_types_before_contents() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(10), &json!("1")), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
    }
}
