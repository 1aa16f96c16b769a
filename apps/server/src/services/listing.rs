//! Tenant-scoped, aggregated listings

use std::sync::Arc;

use super::{
    actor::{Access, ActorContext},
    aggregate::{resolve_page, Aggregate},
    paginator::Paginator,
};
use crate::{
    db::DocumentStore,
    models::{PageQuery, PageResult},
    Error, Result,
};

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn DocumentStore>,
    paginator: Paginator,
}

impl ListingService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            paginator: Paginator::new(store.clone()),
            store,
        }
    }

    /// Read one page of `T`, confined to the actor's scope, with references resolved.
    #[tracing::instrument(
        name = "list_records",
        skip_all,
        fields(collection = %T::COLLECTION, actor = %ctx.actor_id, role = %ctx.role)
    )]
    pub async fn list<T: Aggregate>(&self, ctx: &ActorContext, query: PageQuery) -> Result<PageResult<T>> {
        if query.collection != T::COLLECTION {
            return Err(Error::Internal(format!(
                "Page query for {} used to list {}",
                query.collection,
                T::COLLECTION
            )));
        }
        ctx.authorize_listing(T::COLLECTION)?;

        let query = query.with_filters(ctx.scope_filters(T::COLLECTION));
        let page = self.paginator.paginate(&query).await?;
        let page = page.map_items(|records| records.into_iter().map(T::from_record).collect())?;

        let items = resolve_page(self.store.as_ref(), ctx, page.items).await?;
        tracing::debug!(returned = items.len(), "Listed records");

        Ok(PageResult {
            items,
            pagination: page.pagination,
        })
    }

    /// Read one record of `T` with references resolved.
    #[tracing::instrument(
        name = "get_record",
        skip_all,
        fields(collection = %T::COLLECTION, id = %id, actor = %ctx.actor_id)
    )]
    pub async fn get<T: Aggregate>(&self, ctx: &ActorContext, id: &str) -> Result<T> {
        ctx.authorize(T::COLLECTION, Access::Read)?;

        let document = self
            .store
            .get(T::COLLECTION, id)
            .await?
            .ok_or_else(|| Error::record_not_found(T::COLLECTION.as_str(), id))?;
        ctx.authorize_record(T::COLLECTION, &document)?;

        T::from_record(document.into_record())?
            .aggregate(self.store.as_ref(), ctx)
            .await
    }
}
