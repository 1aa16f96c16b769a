//! Paginator read sequence tests
//!
//! Tests cover:
//! - The count / offset-window / data query sequence and its limits
//! - Skipping the offset window on page 1
//! - Stopping after the count when nothing matches
//! - Page numbers past the end of the data
//! - Backend failures propagating unchanged

#[allow(unused)]
mod support;

use medora::{
    db::MemoryStore,
    models::{Collection, PageQuery, SortDirection},
    services::Paginator,
    Error,
};
use serde_json::json;
use std::sync::Arc;
use support::{seed_rooms, Call, RecordingStore};

async fn rooms(count: usize) -> Arc<RecordingStore> {
    let store = MemoryStore::new();
    seed_rooms(&store, count, "h-1").await;
    Arc::new(RecordingStore::new(store))
}

fn ids(items: &[medora::models::Record]) -> Vec<String> {
    items
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn third_page_issues_count_window_and_cursor_queries() -> anyhow::Result<()> {
    let store = rooms(25).await;
    let paginator = Paginator::new(store.clone());

    let page = paginator
        .paginate(&PageQuery::new(Collection::Rooms, 10, 3))
        .await?;

    assert_eq!(
        ids(&page.items),
        vec!["room-021", "room-022", "room-023", "room-024", "room-025"]
    );
    assert_eq!(
        serde_json::to_value(page.pagination)?,
        json!({"page": 3, "perPage": 10, "totalPages": 3, "totalCount": 25})
    );

    let calls = store.calls();
    assert_eq!(calls.len(), 3, "{calls:?}");

    let Call::Count(count) = &calls[0] else {
        panic!("first call should be the count, got {:?}", calls[0]);
    };
    assert_eq!(count.limit, None);
    assert!(count.start_after.is_none());

    let Call::Find(window) = &calls[1] else {
        panic!("second call should be the offset window, got {:?}", calls[1]);
    };
    assert_eq!(window.limit, Some(20));
    assert!(window.start_after.is_none());

    let Call::Find(data) = &calls[2] else {
        panic!("third call should be the data query, got {:?}", calls[2]);
    };
    assert_eq!(data.limit, Some(10));
    assert_eq!(
        data.start_after.as_ref().map(|cursor| cursor.id.as_str()),
        Some("room-020")
    );

    Ok(())
}

#[tokio::test]
async fn first_page_skips_the_offset_window() -> anyhow::Result<()> {
    let store = rooms(25).await;
    let paginator = Paginator::new(store.clone());

    let page = paginator
        .paginate(&PageQuery::new(Collection::Rooms, 10, 1))
        .await?;

    assert_eq!(page.items.len(), 10);
    assert_eq!(store.counts().len(), 1);
    let finds = store.finds();
    assert_eq!(finds.len(), 1);
    assert_eq!(finds[0].limit, Some(10));
    assert!(finds[0].start_after.is_none());
    Ok(())
}

#[tokio::test]
async fn empty_result_stops_after_the_count() -> anyhow::Result<()> {
    let store = rooms(5).await;
    let paginator = Paginator::new(store.clone());

    let page = paginator
        .paginate(&PageQuery::new(Collection::Rooms, 10, 1).with_filter("hospital", "h-none"))
        .await?;

    assert!(page.items.is_empty());
    assert_eq!(
        serde_json::to_value(page.pagination)?,
        json!({"totalCount": 0, "page": 1, "perPage": 10, "totalPages": 0})
    );
    assert_eq!(store.calls().len(), 1);
    assert!(store.finds().is_empty());
    Ok(())
}

#[tokio::test]
async fn filters_and_order_reach_every_query() -> anyhow::Result<()> {
    let store = rooms(12).await;
    let paginator = Paginator::new(store.clone());

    let query = PageQuery::new(Collection::Rooms, 2, 2)
        .with_filter("floor", 1)
        .order_by("number", SortDirection::Desc);
    paginator.paginate(&query).await?;

    let counts = store.counts();
    let finds = store.finds();
    for recorded in counts.iter().chain(finds.iter()) {
        assert_eq!(recorded.filters, query.filters);
        assert_eq!(recorded.order_by, "number");
        assert_eq!(recorded.direction, SortDirection::Desc);
    }
    Ok(())
}

#[tokio::test]
async fn page_past_the_end_reads_from_the_start() -> anyhow::Result<()> {
    let store = rooms(25).await;
    let paginator = Paginator::new(store.clone());

    let page = paginator
        .paginate(&PageQuery::new(Collection::Rooms, 10, 5))
        .await?;

    // The 40-record window holds only 25, so no cursor is applied.
    let finds = store.finds();
    assert_eq!(finds.len(), 2);
    assert_eq!(finds[0].limit, Some(40));
    assert!(finds[1].start_after.is_none());

    assert_eq!(page.items.len(), 10);
    assert_eq!(ids(&page.items)[0], "room-001");
    assert_eq!(page.pagination.page, 5);
    assert_eq!(page.pagination.total_pages, 3);
    Ok(())
}

#[tokio::test]
async fn backend_failure_propagates_unchanged() {
    let store = MemoryStore::new();
    seed_rooms(&store, 15, "h-1").await;
    let store = Arc::new(RecordingStore::new(store).with_failing_finds());
    let paginator = Paginator::new(store.clone());

    let result = paginator
        .paginate(&PageQuery::new(Collection::Rooms, 10, 2))
        .await;

    let err = tokio_test::assert_err!(result);
    assert!(matches!(err, Error::Database(sqlx::Error::PoolTimedOut)));
    // No retry after the failing window query.
    assert_eq!(store.finds().len(), 1);
}

#[tokio::test]
async fn total_pages_is_the_ceiling_for_every_size() -> anyhow::Result<()> {
    let store = rooms(23).await;
    let paginator = Paginator::new(store.clone());

    for per_page in 1..=25u32 {
        let page = paginator
            .paginate(&PageQuery::new(Collection::Rooms, per_page, 1))
            .await?;
        assert_eq!(page.pagination.total_pages, 23u64.div_ceil(u64::from(per_page)));
        assert!(page.items.len() <= per_page as usize);
    }
    Ok(())
}
