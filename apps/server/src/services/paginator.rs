//! Count-then-skip pagination over cursor-only backends
//!
//! The backend has no numeric offset. Page N is read by:
//! 1. counting the matching documents,
//! 2. reading the `(N - 1) * size` documents that precede the page and taking
//!    the last one as a cursor,
//! 3. reading `size` documents after that cursor.
//!
//! The three reads run strictly in that order. Page 1 skips step 2 and an empty
//! collection stops after step 1.

use std::sync::Arc;

use crate::{
    db::{CollectionQuery, DocumentStore},
    models::{Document, PageQuery, PageResult, Pagination, Record},
    Result,
};

#[derive(Clone)]
pub struct Paginator {
    store: Arc<dyn DocumentStore>,
}

impl Paginator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Read one page of raw records.
    ///
    /// A page number past the end of the data does not produce an empty page:
    /// when the offset window holds fewer than `offset` records no cursor is
    /// applied and the page is read from the first record. Backend failures are
    /// returned unchanged.
    #[tracing::instrument(
        name = "paginate",
        skip_all,
        fields(
            collection = %query.collection,
            page = query.page_number,
            per_page = query.page_size,
        )
    )]
    pub async fn paginate(&self, query: &PageQuery) -> Result<PageResult<Record>> {
        query.validate()?;

        let base = CollectionQuery::new(query.collection, query.order_by.clone())
            .with_filters(query.filters.iter().cloned())
            .with_direction(query.direction);

        let total_count = self.store.count(&base).await?;
        tracing::debug!(total_count, "Counted matching records");
        if total_count == 0 {
            return Ok(PageResult::empty(query));
        }

        let mut page_query = base.clone().with_limit(query.page_size as usize);

        let offset = query.offset();
        if offset > 0 {
            let window = self.store.find(&base.with_limit(offset)).await?;
            match window.into_iter().nth(offset - 1) {
                Some(cursor) => {
                    tracing::debug!(offset, cursor = %cursor.id, "Positioned page cursor");
                    page_query = page_query.start_after(cursor);
                }
                None => {
                    tracing::debug!(
                        offset,
                        total_count,
                        "Offset window shorter than offset; reading without a cursor"
                    );
                }
            }
        }

        let documents = self.store.find(&page_query).await?;
        tracing::debug!(returned = documents.len(), "Read page");

        Ok(PageResult {
            items: documents.into_iter().map(Document::into_record).collect(),
            pagination: Pagination::new(query.page_number, query.page_size, total_count),
        })
    }
}
