//! Patients and the rooms and beds they occupy

use serde::{Deserialize, Serialize};

use super::{Collection, Entity, Hospital, JsonMap, Reference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// Owning hospital id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bed: Option<Reference<Bed>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Entity for Patient {
    const COLLECTION: Collection = Collection::Patients;
    const MANAGED_FIELDS: &'static [&'static str] = &["bed"];

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<Reference<Hospital>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Entity for Room {
    const COLLECTION: Collection = Collection::Rooms;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bed {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub occupied: bool,
    /// Id of the admitted patient while occupied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,
    /// Owning hospital id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Reference<Room>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Entity for Bed {
    const COLLECTION: Collection = Collection::Beds;
    const REFERENCES: &'static [(&'static str, Collection)] = &[("room", Collection::Rooms)];
    const MANAGED_FIELDS: &'static [&'static str] = &["occupied", "patient"];

    fn id(&self) -> &str {
        &self.id
    }
}
