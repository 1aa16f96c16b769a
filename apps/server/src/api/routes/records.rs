//! Record routes
//!
//! Every collection shares one set of routes; the handlers resolve the
//! `:collection` segment to its entity type. Patient admissions are an
//! action segment under a single record.

use crate::api::handlers::{
    create_record, delete_record, list_records, patient_action, read_record, update_record,
};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/:collection", get(list_records).post(create_record))
        .route("/:collection/", get(list_records).post(create_record))
        .route(
            "/:collection/:id",
            get(read_record).patch(update_record).delete(delete_record),
        )
        .route("/:collection/:id/:action", post(patient_action))
}
