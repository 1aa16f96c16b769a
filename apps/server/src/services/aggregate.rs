//! Reference resolution ("aggregation")
//!
//! Replaces the id held in each reference field with the referenced record.
//! All reads for one page are dispatched together: sibling references of a
//! record are joined, and records are joined across the page. The only
//! sequential step is a nested reference, which needs its parent record first.
//!
//! Resolution is fail-fast. The first failing point read aborts the whole
//! aggregation and no partially resolved page is returned. Referenced records
//! the actor may not see are never embedded.

use async_trait::async_trait;
use futures::future::try_join_all;

use super::actor::ActorContext;
use crate::{
    db::DocumentStore,
    models::{
        Appointment, Bed, Doctor, Entity, Hospital, Medicine, Nurse, Patient, Reference, Room,
        SubscriptionPlan,
    },
    Result,
};

impl<T: Entity> Reference<T> {
    /// Resolve the reference with one point read on `T::COLLECTION`.
    ///
    /// Resolved references and blank ids are returned untouched without a read.
    /// A referenced record that does not exist, or lies outside the actor's
    /// scope, leaves the reference unresolved.
    pub async fn resolve(self, store: &dyn DocumentStore, ctx: &ActorContext) -> Result<Self> {
        let id = match &self {
            Reference::Unresolved(id) if !id.trim().is_empty() => id.clone(),
            _ => return Ok(self),
        };

        let Some(document) = store.get(T::COLLECTION, &id).await? else {
            tracing::warn!(
                collection = %T::COLLECTION,
                id = %id,
                "Referenced record does not exist; leaving reference unresolved"
            );
            return Ok(self);
        };

        if ctx.authorize_record(T::COLLECTION, &document).is_err() {
            tracing::warn!(
                collection = %T::COLLECTION,
                id = %id,
                actor = %ctx.actor_id,
                "Referenced record is outside the actor's scope; leaving reference unresolved"
            );
            return Ok(self);
        }

        Ok(Reference::Resolved(T::from_record(document.into_record())?))
    }
}

async fn resolve_field<T: Entity>(
    field: Option<Reference<T>>,
    store: &dyn DocumentStore,
    ctx: &ActorContext,
) -> Result<Option<Reference<T>>> {
    match field {
        Some(reference) => Ok(Some(reference.resolve(store, ctx).await?)),
        None => Ok(None),
    }
}

/// An entity whose reference fields can be resolved in place.
#[async_trait]
pub trait Aggregate: Entity {
    async fn aggregate(self, store: &dyn DocumentStore, ctx: &ActorContext) -> Result<Self>;
}

/// Aggregate every record of a page concurrently, preserving order.
#[tracing::instrument(name = "resolve_page", skip_all, fields(records = items.len()))]
pub async fn resolve_page<T: Aggregate>(
    store: &dyn DocumentStore,
    ctx: &ActorContext,
    items: Vec<T>,
) -> Result<Vec<T>> {
    try_join_all(items.into_iter().map(|item| item.aggregate(store, ctx))).await
}

#[async_trait]
impl Aggregate for Hospital {
    async fn aggregate(mut self, store: &dyn DocumentStore, ctx: &ActorContext) -> Result<Self> {
        self.plan = resolve_field(self.plan.take(), store, ctx).await?;
        Ok(self)
    }
}

#[async_trait]
impl Aggregate for SubscriptionPlan {
    async fn aggregate(self, _store: &dyn DocumentStore, _ctx: &ActorContext) -> Result<Self> {
        Ok(self)
    }
}

#[async_trait]
impl Aggregate for Doctor {
    async fn aggregate(mut self, store: &dyn DocumentStore, ctx: &ActorContext) -> Result<Self> {
        self.hospital = resolve_field(self.hospital.take(), store, ctx).await?;
        Ok(self)
    }
}

#[async_trait]
impl Aggregate for Nurse {
    async fn aggregate(mut self, store: &dyn DocumentStore, ctx: &ActorContext) -> Result<Self> {
        self.hospital = resolve_field(self.hospital.take(), store, ctx).await?;
        Ok(self)
    }
}

#[async_trait]
impl Aggregate for Patient {
    async fn aggregate(mut self, store: &dyn DocumentStore, ctx: &ActorContext) -> Result<Self> {
        self.bed = resolve_field(self.bed.take(), store, ctx).await?;
        Ok(self)
    }
}

#[async_trait]
impl Aggregate for Room {
    async fn aggregate(mut self, store: &dyn DocumentStore, ctx: &ActorContext) -> Result<Self> {
        self.hospital = resolve_field(self.hospital.take(), store, ctx).await?;
        Ok(self)
    }
}

#[async_trait]
impl Aggregate for Bed {
    async fn aggregate(mut self, store: &dyn DocumentStore, ctx: &ActorContext) -> Result<Self> {
        self.room = resolve_field(self.room.take(), store, ctx).await?;
        Ok(self)
    }
}

#[async_trait]
impl Aggregate for Medicine {
    async fn aggregate(mut self, store: &dyn DocumentStore, ctx: &ActorContext) -> Result<Self> {
        self.hospital = resolve_field(self.hospital.take(), store, ctx).await?;
        Ok(self)
    }
}

/// Appointments resolve doctor and patient together, then the doctor's
/// hospital and the patient's bed together.
#[async_trait]
impl Aggregate for Appointment {
    async fn aggregate(mut self, store: &dyn DocumentStore, ctx: &ActorContext) -> Result<Self> {
        let (doctor, patient) = futures::try_join!(
            resolve_field(self.doctor.take(), store, ctx),
            resolve_field(self.patient.take(), store, ctx),
        )?;

        let (doctor, patient) = futures::try_join!(
            resolve_doctor_hospital(doctor, store, ctx),
            resolve_patient_bed(patient, store, ctx),
        )?;

        self.doctor = doctor;
        self.patient = patient;
        Ok(self)
    }
}

async fn resolve_doctor_hospital(
    doctor: Option<Reference<Doctor>>,
    store: &dyn DocumentStore,
    ctx: &ActorContext,
) -> Result<Option<Reference<Doctor>>> {
    match doctor {
        Some(Reference::Resolved(mut doctor)) => {
            doctor.hospital = resolve_field(doctor.hospital.take(), store, ctx).await?;
            Ok(Some(Reference::Resolved(doctor)))
        }
        other => Ok(other),
    }
}

async fn resolve_patient_bed(
    patient: Option<Reference<Patient>>,
    store: &dyn DocumentStore,
    ctx: &ActorContext,
) -> Result<Option<Reference<Patient>>> {
    match patient {
        Some(Reference::Resolved(mut patient)) => {
            patient.bed = resolve_field(patient.bed.take(), store, ctx).await?;
            Ok(Some(Reference::Resolved(patient)))
        }
        other => Ok(other),
    }
}
