use serde::{Deserialize, Serialize};

use super::{Collection, Entity, Hospital, JsonMap, Reference};

/// A stocked medicine in a hospital's pharmacy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<Reference<Hospital>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Entity for Medicine {
    const COLLECTION: Collection = Collection::Medicines;

    fn id(&self) -> &str {
        &self.id
    }
}
