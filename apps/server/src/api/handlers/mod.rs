//! Request handlers for API endpoints
//!
//! Handlers resolve the collection named in the path to its entity type,
//! hand the request to a service and format the result.

pub mod admissions;
pub mod records;

pub use admissions::*;
pub use records::*;

use crate::{models::Collection, Error, Result};

/// Run `$body` with `$entity` bound to the entity type stored in `$collection`.
macro_rules! for_collection {
    ($collection:expr, $entity:ident => $body:expr) => {{
        use $crate::models::{
            Appointment, Bed, Collection, Doctor, Hospital, Medicine, Nurse, Patient, Room,
            SubscriptionPlan,
        };
        match $collection {
            Collection::Hospitals => {
                type $entity = Hospital;
                $body
            }
            Collection::SubscriptionPlans => {
                type $entity = SubscriptionPlan;
                $body
            }
            Collection::Doctors => {
                type $entity = Doctor;
                $body
            }
            Collection::Nurses => {
                type $entity = Nurse;
                $body
            }
            Collection::Patients => {
                type $entity = Patient;
                $body
            }
            Collection::Rooms => {
                type $entity = Room;
                $body
            }
            Collection::Beds => {
                type $entity = Bed;
                $body
            }
            Collection::Appointments => {
                type $entity = Appointment;
                $body
            }
            Collection::Medicines => {
                type $entity = Medicine;
                $body
            }
        }
    }};
}
pub(crate) use for_collection;

/// Unknown collections in a path are a missing resource, not a bad request.
pub(crate) fn collection_from_path(name: &str) -> Result<Collection> {
    Collection::parse(name).map_err(|_| Error::NotFound(format!("Unknown collection: {}", name)))
}
