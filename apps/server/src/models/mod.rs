//! Domain models for the hospital records service

pub mod appointment;
pub mod collection;
pub mod document;
pub mod hospital;
pub mod medicine;
pub mod page;
pub mod reference;
pub mod staff;
pub mod ward;

use serde::{de::DeserializeOwned, Serialize};

pub use appointment::Appointment;
pub use collection::Collection;
pub use document::{Document, Filter, FilterOp, JsonMap, Record, SortDirection};
pub use hospital::{Hospital, SubscriptionPlan};
pub use medicine::Medicine;
pub use page::{PageQuery, PageResult, Pagination};
pub use reference::Reference;
pub use staff::{Doctor, Nurse};
pub use ward::{Bed, Patient, Room};

/// A typed view of the records stored in one collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Reference fields a client may set, with the collection each points into.
    /// The tenant field `hospital` is handled separately.
    const REFERENCES: &'static [(&'static str, Collection)] = &[];

    /// Fields only the admission workflow writes.
    const MANAGED_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> &str;

    /// Decode a raw record into the entity.
    fn from_record(record: Record) -> crate::Result<Self> {
        Ok(serde_json::from_value(serde_json::Value::Object(record))?)
    }
}
