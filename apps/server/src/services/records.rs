//! Create, update and delete for every collection
//!
//! Writes never link a record to one the actor could not read: every reference
//! set by a payload must name an existing record of the same hospital.

use chrono::{SecondsFormat, Utc};
use futures::future::try_join_all;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::actor::{Access, ActorContext};
use crate::{
    db::DocumentStore,
    models::{Collection, Document, Entity, JsonMap},
    Error, Result,
};

const IMMUTABLE_FIELDS: [&str; 2] = ["createdAt", "hospital"];

#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn DocumentStore>,
}

impl RecordService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(
        name = "create_record",
        skip_all,
        fields(collection = %T::COLLECTION, actor = %ctx.actor_id)
    )]
    pub async fn create<T: Entity>(&self, ctx: &ActorContext, mut data: JsonMap) -> Result<T> {
        ctx.authorize(T::COLLECTION, Access::Write)?;

        data.remove("id");
        data.insert(
            "createdAt".to_string(),
            JsonValue::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        stamp_tenant(ctx, T::COLLECTION, &mut data)?;
        for field in T::MANAGED_FIELDS {
            if data.get(*field).is_some_and(|value| !is_unset(value)) {
                return Err(managed_field(field));
            }
        }
        if T::COLLECTION == Collection::Beds {
            data.insert("occupied".to_string(), JsonValue::Bool(false));
        }
        check_shape::<T>("new", &data)?;
        self.check_references::<T>(&data, data.get("hospital")).await?;

        let document = self.store.insert(T::COLLECTION, data).await?;
        tracing::info!(id = %document.id, "Record created");

        T::from_record(document.into_record())
    }

    #[tracing::instrument(
        name = "update_record",
        skip_all,
        fields(collection = %T::COLLECTION, id = %id, actor = %ctx.actor_id)
    )]
    pub async fn update<T: Entity>(&self, ctx: &ActorContext, id: &str, mut patch: JsonMap) -> Result<T> {
        ctx.authorize(T::COLLECTION, Access::Write)?;
        let current = self.load(ctx, T::COLLECTION, id).await?;

        patch.remove("id");
        for field in IMMUTABLE_FIELDS {
            if let Some(value) = patch.remove(field) {
                if current.field(field) != Some(&value) {
                    return Err(Error::Validation(format!(
                        "Field '{}' cannot be changed",
                        field
                    )));
                }
            }
        }
        for field in T::MANAGED_FIELDS {
            if let Some(value) = patch.remove(*field) {
                if current.field(field).unwrap_or(&JsonValue::Null) != &value {
                    return Err(managed_field(field));
                }
            }
        }

        let mut merged = current.data.clone();
        merged.extend(patch.clone());
        check_shape::<T>(id, &merged)?;
        self.check_references::<T>(&patch, current.field("hospital")).await?;

        let document = self.store.update(T::COLLECTION, id, patch).await?;
        tracing::info!("Record updated");

        T::from_record(document.into_record())
    }

    #[tracing::instrument(
        name = "delete_record",
        skip_all,
        fields(collection = %collection, id = %id, actor = %ctx.actor_id)
    )]
    pub async fn delete(&self, ctx: &ActorContext, collection: Collection, id: &str) -> Result<()> {
        ctx.authorize(collection, Access::Write)?;
        self.load(ctx, collection, id).await?;

        self.store.delete(collection, id).await?;
        tracing::info!("Record deleted");
        Ok(())
    }

    /// Check every reference set in `data` names a record of `hospital`.
    ///
    /// Missing and foreign targets get the same error, so ids of other
    /// hospitals stay undisclosed.
    async fn check_references<T: Entity>(
        &self,
        data: &JsonMap,
        hospital: Option<&JsonValue>,
    ) -> Result<()> {
        let targets: Vec<(&str, Collection, &str)> = T::REFERENCES
            .iter()
            .filter_map(|(field, collection)| {
                let id = data.get(*field)?.as_str().filter(|id| !id.trim().is_empty())?;
                Some((*field, *collection, id))
            })
            .collect();
        if targets.is_empty() {
            return Ok(());
        }

        let found = try_join_all(
            targets
                .iter()
                .map(|(_, collection, id)| self.store.get(*collection, id)),
        )
        .await?;

        for ((field, collection, id), document) in targets.iter().zip(found) {
            let linkable = document.is_some_and(|document| {
                !collection.is_tenant_scoped() || document.field("hospital") == hospital
            });
            if !linkable {
                tracing::debug!(field = %field, target = %collection, id = %id, "Rejected reference");
                return Err(Error::Validation(format!(
                    "Field '{}' does not reference a known {} record",
                    field, collection
                )));
            }
        }
        Ok(())
    }

    async fn load(&self, ctx: &ActorContext, collection: Collection, id: &str) -> Result<Document> {
        let document = self
            .store
            .get(collection, id)
            .await?
            .ok_or_else(|| Error::record_not_found(collection.as_str(), id))?;
        ctx.authorize_record(collection, &document)?;
        Ok(document)
    }
}

/// Set `hospital` on a new tenant-scoped record.
fn stamp_tenant(ctx: &ActorContext, collection: Collection, data: &mut JsonMap) -> Result<()> {
    if !collection.is_tenant_scoped() {
        return Ok(());
    }

    let given = data
        .get("hospital")
        .filter(|value| !value.is_null())
        .cloned();

    match (ctx.tenant(), given) {
        (Some(tenant), None) => {
            data.insert("hospital".to_string(), JsonValue::String(tenant.to_string()));
            Ok(())
        }
        (Some(tenant), Some(value)) if value.as_str() == Some(tenant) => Ok(()),
        (Some(_), Some(_)) => Err(Error::Forbidden(
            "Records can only be created in the actor's own hospital".to_string(),
        )),
        (None, Some(JsonValue::String(hospital))) if !hospital.is_empty() => Ok(()),
        (None, _) => Err(Error::Validation(format!(
            "Records in {} require a hospital",
            collection
        ))),
    }
}

/// Value a client may give an admission-managed field on create.
fn is_unset(value: &JsonValue) -> bool {
    matches!(value, JsonValue::Null | JsonValue::Bool(false))
}

fn managed_field(field: &str) -> Error {
    Error::Validation(format!(
        "Field '{}' is set by admissions and discharges only",
        field
    ))
}

/// Check the stored fields decode as `T`.
fn check_shape<T: Entity>(id: &str, data: &JsonMap) -> Result<()> {
    let record = Document::new(id, data.clone()).into_record();
    serde_json::from_value::<T>(JsonValue::Object(record))
        .map(|_| ())
        .map_err(|e| Error::Validation(format!("Invalid {} record: {}", T::COLLECTION, e)))
}
