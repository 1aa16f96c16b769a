//! Core trait for document storage backends

use crate::{
    db::query::{CollectionQuery, WriteBatch},
    models::{Collection, Document, JsonMap},
    Result,
};
use async_trait::async_trait;

/// Storage boundary to the document database
///
/// Any backend (managed document database, PostgreSQL, in-memory, ...) can
/// implement this trait. Reads are cursor-based: there is no native offset, so
/// callers page by locating a document and querying after it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Count documents matching the query's filters and order field
    ///
    /// `limit` and `start_after` are ignored.
    async fn count(&self, query: &CollectionQuery) -> Result<u64>;

    /// Fetch documents matching the query, ordered by the order field and then
    /// by document id, positioned after `start_after` and capped at `limit`
    async fn find(&self, query: &CollectionQuery) -> Result<Vec<Document>>;

    /// Point read by document key
    ///
    /// # Returns
    /// * `Ok(Some(document))` - Document exists
    /// * `Ok(None)` - No document under that key
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>>;

    /// Insert a new document under a server-assigned key
    async fn insert(&self, collection: Collection, data: JsonMap) -> Result<Document>;

    /// Shallow-merge `patch` into a stored document
    ///
    /// # Errors
    /// * `RecordNotFound` - If the document doesn't exist
    async fn update(&self, collection: Collection, id: &str, patch: JsonMap) -> Result<Document>;

    /// Remove a document
    ///
    /// # Errors
    /// * `RecordNotFound` - If the document doesn't exist
    async fn delete(&self, collection: Collection, id: &str) -> Result<()>;

    /// Apply every write in the batch, or none of them
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}
