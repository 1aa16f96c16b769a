use serde::{Deserialize, Serialize};

use super::{Collection, Entity, JsonMap, Reference};

/// A tenant of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Reference<SubscriptionPlan>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Entity for Hospital {
    const COLLECTION: Collection = Collection::Hospitals;
    const REFERENCES: &'static [(&'static str, Collection)] =
        &[("plan", Collection::SubscriptionPlans)];

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_beds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_staff: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Entity for SubscriptionPlan {
    const COLLECTION: Collection = Collection::SubscriptionPlans;

    fn id(&self) -> &str {
        &self.id
    }
}
