//! Backend query and batch-write descriptions

use serde_json::Value as JsonValue;

use crate::models::{Collection, Document, Filter, JsonMap, SortDirection};

/// A filtered, ordered, cursor-positioned read against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub collection: Collection,
    pub filters: Vec<Filter>,
    pub order_by: String,
    pub direction: SortDirection,
    pub limit: Option<usize>,
    /// Resume strictly after this document in query order
    pub start_after: Option<Document>,
}

impl CollectionQuery {
    pub fn new(collection: Collection, order_by: impl Into<String>) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: order_by.into(),
            direction: SortDirection::Asc,
            limit: None,
            start_after: None,
        }
    }

    pub fn with_filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, cursor: Document) -> Self {
        self.start_after = Some(cursor);
        self
    }

    /// True when the document passes every filter and has the order field.
    pub fn matches(&self, document: &Document) -> bool {
        self.matches_fields(&document.data)
    }

    pub fn matches_fields(&self, data: &JsonMap) -> bool {
        data.contains_key(&self.order_by) && self.filters.iter().all(|f| f.matches_fields(data))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Merge `patch` into the document. Every field in `expect` must still hold
    /// the given value at commit time, an absent field counting as null.
    Update {
        collection: Collection,
        id: String,
        patch: JsonMap,
        expect: JsonMap,
    },
    Delete {
        collection: Collection,
        id: String,
    },
}

impl WriteOp {
    /// First expected field whose current value differs, if any.
    pub fn stale_field<'a>(expect: &'a JsonMap, data: &JsonMap) -> Option<&'a str> {
        expect
            .iter()
            .find(|(field, value)| data.get(*field).unwrap_or(&JsonValue::Null) != *value)
            .map(|(field, _)| field.as_str())
    }

    pub fn target(&self) -> (Collection, &str) {
        match self {
            WriteOp::Update { collection, id, .. } | WriteOp::Delete { collection, id } => {
                (*collection, id)
            }
        }
    }
}

/// Writes applied atomically by `DocumentStore::commit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(self, collection: Collection, id: impl Into<String>, patch: JsonMap) -> Self {
        self.update_if(collection, id, patch, JsonMap::new())
    }

    /// Update guarded by the field values the caller last read.
    pub fn update_if(
        mut self,
        collection: Collection,
        id: impl Into<String>,
        patch: JsonMap,
        expect: JsonMap,
    ) -> Self {
        self.ops.push(WriteOp::Update {
            collection,
            id: id.into(),
            patch,
            expect,
        });
        self
    }

    pub fn delete(mut self, collection: Collection, id: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Delete {
            collection,
            id: id.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}
