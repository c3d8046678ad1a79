//! Physical table descriptor.

use serde::{Deserialize, Serialize};

/// Identifies one physical relation.
///
/// Created once from generated metadata and shared read-only by every builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Table {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
}

impl Table {
    /// Creates a table descriptor without an explicit schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
        }
    }

    /// Creates a table descriptor qualified by `schema`.
    pub fn with_schema(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: Some(schema.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }
}
