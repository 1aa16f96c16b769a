//! The acting user and what they may see
//!
//! Every service entry point takes an `ActorContext` explicitly. Tenant-bound
//! roles only ever see records of their own hospital: listings get extra
//! equality filters and single-record access is checked against the stored
//! document.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    models::{Collection, Document, Filter},
    Error, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    HospitalAdmin,
    Doctor,
    Nurse,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::HospitalAdmin => "hospital_admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    fn verb(&self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    /// Subject id; for the patient role this is the patient record id
    pub actor_id: String,
    pub role: Role,
    /// Owning hospital for every role except super admin
    pub hospital: Option<String>,
}

impl ActorContext {
    pub fn new(actor_id: impl Into<String>, role: Role, hospital: Option<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            role,
            hospital,
        }
    }

    /// The actor used when authentication is disabled.
    pub fn system() -> Self {
        Self::new("system", Role::SuperAdmin, None)
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Hospital the actor is bound to, `None` for super admins.
    pub fn tenant(&self) -> Option<&str> {
        if self.is_super_admin() {
            None
        } else {
            self.hospital.as_deref().filter(|h| !h.is_empty())
        }
    }

    fn require_tenant(&self) -> Result<&str> {
        self.tenant().ok_or_else(|| {
            Error::Forbidden(format!(
                "Role {} requires a hospital assignment",
                self.role
            ))
        })
    }

    /// Check the role may read or write a collection at all.
    pub fn authorize(&self, collection: Collection, access: Access) -> Result<()> {
        use Collection::*;

        let allowed = match (self.role, access) {
            (Role::SuperAdmin, _) => return Ok(()),
            (Role::HospitalAdmin, Access::Read) => true,
            (Role::HospitalAdmin, Access::Write) => collection.is_tenant_scoped(),
            (Role::Doctor | Role::Nurse, Access::Read) => collection.is_tenant_scoped(),
            (Role::Doctor, Access::Write) => collection == Appointments,
            (Role::Nurse, Access::Write) => matches!(collection, Patients | Beds),
            (Role::Patient, Access::Read) => matches!(collection, Appointments | Doctors | Patients),
            (Role::Patient, Access::Write) => false,
        };

        if !allowed {
            return Err(Error::Forbidden(format!(
                "Role {} may not {} {}",
                self.role,
                access.verb(),
                collection
            )));
        }
        self.require_tenant()?;
        Ok(())
    }

    /// Check the role may page through a collection.
    pub fn authorize_listing(&self, collection: Collection) -> Result<()> {
        self.authorize(collection, Access::Read)?;
        match (self.role, collection) {
            (Role::SuperAdmin, _) => Ok(()),
            (_, Collection::Hospitals) => Err(Error::Forbidden(
                "Listing hospitals requires the super_admin role".to_string(),
            )),
            (Role::Patient, Collection::Patients) => Err(Error::Forbidden(
                "Patients may only read their own record".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Equality filters that confine a listing to what the actor may see.
    pub fn scope_filters(&self, collection: Collection) -> Vec<Filter> {
        let Some(tenant) = self.tenant() else {
            return Vec::new();
        };

        let mut filters = Vec::new();
        if collection.is_tenant_scoped() {
            filters.push(Filter::eq("hospital", tenant));
        }
        if self.role == Role::Patient && collection == Collection::Appointments {
            filters.push(Filter::eq("patient", self.actor_id.clone()));
        }
        filters
    }

    /// Check a stored document is visible to the actor.
    ///
    /// Records outside the actor's scope are reported as missing.
    pub fn authorize_record(&self, collection: Collection, document: &Document) -> Result<()> {
        if self.is_super_admin() {
            return Ok(());
        }
        let tenant = self.require_tenant()?;

        let visible = match collection {
            Collection::Hospitals => document.id == tenant,
            Collection::SubscriptionPlans => true,
            _ => {
                self.scope_filters(collection)
                    .iter()
                    .all(|filter| filter.matches(document))
                    && (self.role != Role::Patient
                        || collection != Collection::Patients
                        || document.id == self.actor_id)
            }
        };

        if visible {
            Ok(())
        } else {
            Err(Error::record_not_found(collection.as_str(), &document.id))
        }
    }
}
