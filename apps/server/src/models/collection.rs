//! Named document collections

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every collection the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Hospitals,
    SubscriptionPlans,
    Doctors,
    Nurses,
    Patients,
    Rooms,
    Beds,
    Appointments,
    Medicines,
}

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::Hospitals,
        Collection::SubscriptionPlans,
        Collection::Doctors,
        Collection::Nurses,
        Collection::Patients,
        Collection::Rooms,
        Collection::Beds,
        Collection::Appointments,
        Collection::Medicines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Hospitals => "hospitals",
            Collection::SubscriptionPlans => "subscriptionPlans",
            Collection::Doctors => "doctors",
            Collection::Nurses => "nurses",
            Collection::Patients => "patients",
            Collection::Rooms => "rooms",
            Collection::Beds => "beds",
            Collection::Appointments => "appointments",
            Collection::Medicines => "medicines",
        }
    }

    pub fn parse(name: &str) -> crate::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| crate::Error::Validation(format!("Unknown collection: {}", name)))
    }

    /// Tenant-scoped collections carry a `hospital` field with the owning hospital id.
    pub fn is_tenant_scoped(&self) -> bool {
        !matches!(self, Collection::Hospitals | Collection::SubscriptionPlans)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
