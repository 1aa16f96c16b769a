//! Custom Axum extractors for record payloads and listing parameters.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::{
    config::PaginationConfig,
    models::{Collection, Filter, JsonMap, PageQuery, SortDirection},
    Error, Result,
};

/// A JSON request body that must be an object.
pub struct JsonObject(pub JsonMap);

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<JsonValue>::from_request(req, state)
            .await
            .map_err(|e| Error::Validation(format!("Invalid JSON body: {}", e.body_text())))?;

        match value {
            JsonValue::Object(map) => Ok(JsonObject(map)),
            other => Err(Error::Validation(format!(
                "Request body must be a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Listing parameters: `page`, `perPage`, `orderBy`, `direction` and any
/// number of `where.<field>=<value>` equality filters.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct ListParams {
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, message = "perPage must be at least 1"))]
    pub per_page: Option<u32>,
    #[validate(length(min = 1, message = "orderBy must not be empty"))]
    pub order_by: Option<String>,
    pub direction: Option<SortDirection>,
    pub filters: Vec<Filter>,
}

const FILTER_PREFIX: &str = "where.";

impl ListParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self> {
        let mut params = ListParams::default();

        for (key, value) in pairs {
            match key.as_str() {
                "page" => params.page = Some(parse_number("page", &value)?),
                "perPage" => params.per_page = Some(parse_number("perPage", &value)?),
                "orderBy" => params.order_by = Some(value),
                "direction" => params.direction = Some(SortDirection::parse(&value)?),
                _ => {
                    let field = key.strip_prefix(FILTER_PREFIX).ok_or_else(|| {
                        Error::Validation(format!("Unknown query parameter: {}", key))
                    })?;
                    if field.is_empty() {
                        return Err(Error::Validation(
                            "Filter parameters need a field name after 'where.'".to_string(),
                        ));
                    }
                    params.filters.push(Filter::eq(field, filter_value(&value)));
                }
            }
        }

        params
            .validate()
            .map_err(|e| Error::Validation(e.to_string()))?;
        Ok(params)
    }

    /// Apply configured defaults and limits.
    pub fn into_page_query(self, collection: Collection, config: &PaginationConfig) -> Result<PageQuery> {
        let per_page = self.per_page.unwrap_or(config.default_page_size);
        if per_page > config.max_page_size {
            return Err(Error::Validation(format!(
                "perPage must not exceed {}",
                config.max_page_size
            )));
        }

        Ok(PageQuery::new(collection, per_page, self.page.unwrap_or(1))
            .with_filters(self.filters)
            .order_by(
                self.order_by
                    .unwrap_or_else(|| config.default_order_by.clone()),
                self.direction.unwrap_or_default(),
            ))
    }
}

fn parse_number(name: &str, value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| Error::Validation(format!("{} must be a positive integer", name)))
}

/// Filter values are JSON literals when they parse as JSON, strings otherwise.
fn filter_value(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

/// Extractor for [`ListParams`] from the query string.
pub struct ListQuery(pub ListParams);

#[async_trait]
impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| Error::Validation(e.body_text()))?;
        ListParams::from_pairs(pairs).map(ListQuery)
    }
}
