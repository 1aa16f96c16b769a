//! Record listing and CRUD handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::{collection_from_path, for_collection};
use crate::{
    api::extractors::{JsonObject, ListQuery},
    auth::Actor,
    state::AppState,
    Result,
};

/// `GET /api/:collection`
pub async fn list_records(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(collection): Path<String>,
    ListQuery(params): ListQuery,
) -> Result<Response> {
    let collection = collection_from_path(&collection)?;
    let query = params.into_page_query(collection, &state.config.pagination)?;

    for_collection!(collection, E => {
        let page = state.listings.list::<E>(&actor, query).await?;
        Ok(Json(page).into_response())
    })
}

/// `GET /api/:collection/:id`
pub async fn read_record(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Response> {
    let collection = collection_from_path(&collection)?;

    for_collection!(collection, E => {
        let record = state.listings.get::<E>(&actor, &id).await?;
        Ok(Json(record).into_response())
    })
}

/// `POST /api/:collection`
pub async fn create_record(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(collection): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<Response> {
    let collection = collection_from_path(&collection)?;

    for_collection!(collection, E => {
        let record = state.records.create::<E>(&actor, body).await?;
        Ok((StatusCode::CREATED, Json(record)).into_response())
    })
}

/// `PATCH /api/:collection/:id`
pub async fn update_record(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((collection, id)): Path<(String, String)>,
    JsonObject(patch): JsonObject,
) -> Result<Response> {
    let collection = collection_from_path(&collection)?;

    for_collection!(collection, E => {
        let record = state.records.update::<E>(&actor, &id, patch).await?;
        Ok(Json(record).into_response())
    })
}

/// `DELETE /api/:collection/:id`
pub async fn delete_record(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let collection = collection_from_path(&collection)?;
    state.records.delete(&actor, collection, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
