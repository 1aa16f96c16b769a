//! Stored documents, raw records and query filters

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub type JsonMap = serde_json::Map<String, JsonValue>;

/// A raw record: the stored fields of a document with its key injected as `id`.
pub type Record = JsonMap;

/// A document as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Backend document key
    pub id: String,
    /// Stored fields (never contains `id`)
    pub data: JsonMap,
}

impl Document {
    pub fn new(id: impl Into<String>, mut data: JsonMap) -> Self {
        data.remove("id");
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.data.get(name)
    }

    /// Merge the document key into its fields.
    ///
    /// The key always wins over a stored `id` field.
    pub fn into_record(self) -> Record {
        let mut record = JsonMap::with_capacity(self.data.len() + 1);
        record.insert("id".to_string(), JsonValue::String(self.id));
        for (key, value) in self.data {
            if key != "id" {
                record.insert(key, value);
            }
        }
        record
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FilterOp {
    #[default]
    #[serde(rename = "==")]
    Eq,
}

/// An equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    #[serde(default)]
    pub op: FilterOp,
    pub value: JsonValue,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.matches_fields(&document.data)
    }

    /// Test the filter against stored fields without building a `Document`.
    pub fn matches_fields(&self, data: &JsonMap) -> bool {
        match self.op {
            FilterOp::Eq => data.get(&self.field) == Some(&self.value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> crate::Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(crate::Error::Validation(format!(
                "Invalid sort direction '{}': expected 'asc' or 'desc'",
                other
            ))),
        }
    }
}
