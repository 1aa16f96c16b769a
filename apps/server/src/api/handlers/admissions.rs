//! Patient admission handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use validator::Validate;

use super::collection_from_path;
use crate::{
    api::extractors::JsonObject,
    auth::Actor,
    models::{Collection, JsonMap},
    state::AppState,
    Error, Result,
};

#[derive(Debug, Deserialize, Validate)]
pub struct AdmitRequest {
    #[validate(length(min = 1, message = "bed must not be empty"))]
    pub bed: String,
}

impl AdmitRequest {
    fn from_body(body: JsonMap) -> Result<Self> {
        let request: AdmitRequest = serde_json::from_value(serde_json::Value::Object(body))
            .map_err(|e| Error::Validation(format!("Invalid admission request: {}", e)))?;
        request
            .validate()
            .map_err(|e| Error::Validation(e.to_string()))?;
        Ok(request)
    }
}

/// `POST /api/patients/:id/admit` and `POST /api/patients/:id/discharge`
pub async fn patient_action(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((collection, id, action)): Path<(String, String, String)>,
    body: Option<JsonObject>,
) -> Result<StatusCode> {
    let collection = collection_from_path(&collection)?;
    if collection != Collection::Patients {
        return Err(Error::NotFound(format!(
            "No '{}' action on {}",
            action, collection
        )));
    }

    match action.as_str() {
        "admit" => {
            let JsonObject(body) = body.ok_or_else(|| {
                Error::Validation("Admission requires a JSON body with a 'bed'".to_string())
            })?;
            let request = AdmitRequest::from_body(body)?;
            state.admissions.admit(&actor, &id, &request.bed).await?;
        }
        "discharge" => state.admissions.discharge(&actor, &id).await?,
        other => {
            return Err(Error::NotFound(format!("Unknown patient action: {}", other)));
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
