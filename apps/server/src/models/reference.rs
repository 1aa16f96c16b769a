//! References between records
//!
//! A reference field holds either the id of another record (`Unresolved`) or,
//! once aggregated, the referenced record itself (`Resolved`). On the wire the
//! two forms are distinguished by shape: a string or an object.

use serde::{Deserialize, Serialize};

use super::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Resolved(T),
    Unresolved(String),
}

impl<T> Reference<T> {
    pub fn unresolved(id: impl Into<String>) -> Self {
        Reference::Unresolved(id.into())
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved(_))
    }

    /// An unresolved reference with a blank id points nowhere.
    pub fn is_empty(&self) -> bool {
        matches!(self, Reference::Unresolved(id) if id.trim().is_empty())
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Reference::Resolved(value) => Some(value),
            Reference::Unresolved(_) => None,
        }
    }
}

impl<T: Entity> Reference<T> {
    /// Id of the referenced record, whichever form the reference is in.
    pub fn id(&self) -> &str {
        match self {
            Reference::Resolved(value) => value.id(),
            Reference::Unresolved(id) => id,
        }
    }
}

impl<T> From<String> for Reference<T> {
    fn from(id: String) -> Self {
        Reference::Unresolved(id)
    }
}

impl<T> From<&str> for Reference<T> {
    fn from(id: &str) -> Self {
        Reference::Unresolved(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Hospital;
    use serde_json::json;

    #[test]
    fn string_decodes_as_unresolved() {
        let reference: Reference<Hospital> = serde_json::from_value(json!("h-1")).unwrap();
        assert_eq!(reference, Reference::unresolved("h-1"));
        assert_eq!(reference.id(), "h-1");
        assert!(!reference.is_resolved());
    }

    #[test]
    fn object_decodes_as_resolved() {
        let reference: Reference<Hospital> =
            serde_json::from_value(json!({"id": "h-1", "name": "St. Mary"})).unwrap();
        assert!(reference.is_resolved());
        assert_eq!(reference.id(), "h-1");
        assert_eq!(reference.resolved().unwrap().name, "St. Mary");
    }

    #[test]
    fn blank_id_is_empty() {
        assert!(Reference::<Hospital>::unresolved("").is_empty());
        assert!(Reference::<Hospital>::unresolved("  ").is_empty());
        assert!(!Reference::<Hospital>::unresolved("h-1").is_empty());
    }

    #[test]
    fn resolved_encodes_as_object_and_unresolved_as_string() {
        let unresolved = Reference::<Hospital>::unresolved("h-1");
        assert_eq!(serde_json::to_value(&unresolved).unwrap(), json!("h-1"));

        let resolved: Reference<Hospital> =
            serde_json::from_value(json!({"id": "h-1", "name": "St. Mary"})).unwrap();
        assert!(serde_json::to_value(&resolved).unwrap().is_object());
    }
}
