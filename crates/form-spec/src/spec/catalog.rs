use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::field::Field;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse field catalog: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to encode field catalog: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Ordered field schema for one document template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Catalog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Catalog {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            id: None,
            title: None,
            fields,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(CatalogError::Parse)
    }

    pub fn to_json_pretty(&self) -> Result<String, CatalogError> {
        serde_json::to_string_pretty(self).map_err(CatalogError::Encode)
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Catalog position of every key. Duplicate keys resolve to their first occurrence.
    pub fn positions(&self) -> HashMap<&str, usize> {
        let mut positions = HashMap::with_capacity(self.fields.len());
        for (index, field) in self.fields.iter().enumerate() {
            positions.entry(field.key.as_str()).or_insert(index);
        }
        positions
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// JSON Schema describing the catalog document format.
pub fn catalog_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(Catalog);
    serde_json::to_value(schema).unwrap_or_default()
}
