use serde::{Deserialize, Serialize};

use super::{Collection, Doctor, Entity, JsonMap, Patient, Reference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub scheduled_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Owning hospital id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<Reference<Doctor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<Reference<Patient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Entity for Appointment {
    const COLLECTION: Collection = Collection::Appointments;
    const REFERENCES: &'static [(&'static str, Collection)] = &[
        ("doctor", Collection::Doctors),
        ("patient", Collection::Patients),
    ];

    fn id(&self) -> &str {
        &self.id
    }
}
