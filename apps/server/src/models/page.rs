//! Page queries and page results

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{Collection, Filter, SortDirection};
use crate::{Error, Result};

/// One page request against a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub collection: Collection,
    pub filters: Vec<Filter>,
    pub order_by: String,
    pub direction: SortDirection,
    pub page_size: u32,
    /// 1-based
    pub page_number: u32,
}

impl PageQuery {
    pub const DEFAULT_ORDER_BY: &'static str = "createdAt";

    pub fn new(collection: Collection, page_size: u32, page_number: u32) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: Self::DEFAULT_ORDER_BY.to_string(),
            direction: SortDirection::Asc,
            page_size,
            page_number,
        }
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.filters.push(Filter::eq(field, value));
        self
    }

    pub fn with_filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = field.into();
        self.direction = direction;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_number < 1 {
            return Err(Error::Validation(
                "Page number must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(Error::Validation(
                "Page size must be greater than 0".to_string(),
            ));
        }
        if self.order_by.trim().is_empty() {
            return Err(Error::Validation(
                "Order-by field must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of records that precede this page.
    pub fn offset(&self) -> usize {
        (self.page_number.saturating_sub(1) as usize) * self.page_size as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u64,
    pub total_count: u64,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total_count: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total_count.div_ceil(u64::from(per_page))
        };
        Self {
            page,
            per_page,
            total_pages,
            total_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PageResult<T> {
    pub fn empty(query: &PageQuery) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::new(query.page_number, query.page_size, 0),
        }
    }

    /// Replace the items, keeping the pagination metadata.
    pub fn map_items<U>(self, f: impl FnOnce(Vec<T>) -> Result<Vec<U>>) -> Result<PageResult<U>> {
        Ok(PageResult {
            items: f(self.items)?,
            pagination: self.pagination,
        })
    }
}
