//! Bed admissions and discharges
//!
//! An admission touches up to three documents (the patient, the new bed and
//! the bed the patient leaves). They are written in one batch so a failure
//! never leaves a bed occupied by nobody or a patient in two beds. The batch
//! is guarded by the values read beforehand, so two admissions racing for the
//! same bed or the same patient cannot both commit.

use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

use super::actor::{Access, ActorContext};
use crate::{
    db::{DocumentStore, WriteBatch},
    models::{Bed, Collection, Document, Entity, JsonMap},
    Error, Result,
};

#[derive(Clone)]
pub struct AdmissionService {
    store: Arc<dyn DocumentStore>,
}

fn fields(value: JsonValue) -> JsonMap {
    match value {
        JsonValue::Object(map) => map,
        _ => JsonMap::new(),
    }
}

/// The listed fields as currently stored, absent ones as null.
fn snapshot(document: &Document, names: &[&str]) -> JsonMap {
    names
        .iter()
        .map(|name| {
            let value = document.field(name).cloned().unwrap_or(JsonValue::Null);
            (name.to_string(), value)
        })
        .collect()
}

fn bed_of(patient: &Document) -> Option<&str> {
    patient
        .field("bed")
        .and_then(JsonValue::as_str)
        .filter(|id| !id.is_empty())
}

impl AdmissionService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn authorize(&self, ctx: &ActorContext) -> Result<()> {
        ctx.authorize(Collection::Patients, Access::Write)?;
        ctx.authorize(Collection::Beds, Access::Write)
    }

    fn visible(
        ctx: &ActorContext,
        collection: Collection,
        id: &str,
        found: Option<Document>,
    ) -> Result<Document> {
        let document = found.ok_or_else(|| Error::record_not_found(collection.as_str(), id))?;
        ctx.authorize_record(collection, &document)?;
        Ok(document)
    }

    #[tracing::instrument(
        name = "admit_patient",
        skip_all,
        fields(patient = %patient_id, bed = %bed_id, actor = %ctx.actor_id)
    )]
    pub async fn admit(&self, ctx: &ActorContext, patient_id: &str, bed_id: &str) -> Result<()> {
        self.authorize(ctx)?;

        let (patient, bed) = futures::try_join!(
            self.store.get(Collection::Patients, patient_id),
            self.store.get(Collection::Beds, bed_id),
        )?;
        let patient = Self::visible(ctx, Collection::Patients, patient_id, patient)?;
        let bed = Self::visible(ctx, Collection::Beds, bed_id, bed)?;

        if patient.field("hospital") != bed.field("hospital") {
            return Err(Error::Conflict(format!(
                "Patient {} and bed {} belong to different hospitals",
                patient_id, bed_id
            )));
        }

        let bed_seen = snapshot(&bed, &["occupied", "patient"]);
        let bed_state = Bed::from_record(bed.into_record())?;
        if bed_state.occupied && bed_state.patient.as_deref() != Some(patient_id) {
            return Err(Error::Conflict(format!("Bed {} is already occupied", bed_id)));
        }

        let mut batch = WriteBatch::new()
            .update_if(
                Collection::Patients,
                patient_id,
                fields(json!({ "bed": bed_id })),
                snapshot(&patient, &["bed"]),
            )
            .update_if(
                Collection::Beds,
                bed_id,
                fields(json!({ "occupied": true, "patient": patient_id })),
                bed_seen,
            );
        if let Some(previous) = bed_of(&patient).filter(|previous| *previous != bed_id) {
            tracing::debug!(previous_bed = %previous, "Releasing previous bed");
            batch = batch.update(
                Collection::Beds,
                previous,
                fields(json!({ "occupied": false, "patient": null })),
            );
        }

        self.store.commit(batch).await?;
        tracing::info!("Patient admitted");
        Ok(())
    }

    #[tracing::instrument(
        name = "discharge_patient",
        skip_all,
        fields(patient = %patient_id, actor = %ctx.actor_id)
    )]
    pub async fn discharge(&self, ctx: &ActorContext, patient_id: &str) -> Result<()> {
        self.authorize(ctx)?;

        let found = self.store.get(Collection::Patients, patient_id).await?;
        let patient = Self::visible(ctx, Collection::Patients, patient_id, found)?;
        let bed_id = bed_of(&patient)
            .ok_or_else(|| Error::Conflict(format!("Patient {} has no bed", patient_id)))?;

        let batch = WriteBatch::new()
            .update_if(
                Collection::Patients,
                patient_id,
                fields(json!({ "bed": null })),
                snapshot(&patient, &["bed"]),
            )
            .update(
                Collection::Beds,
                bed_id,
                fields(json!({ "occupied": false, "patient": null })),
            );

        self.store.commit(batch).await?;
        tracing::info!(bed = %bed_id, "Patient discharged");
        Ok(())
    }
}
