//! Metadata models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::common::{option_timestamp, timestamp, ValuesWrapper};

/// Free-form metadata values keyed by field name.
pub type MetadataValues = BTreeMap<String, serde_json::Value>;

/// Metadata attached to one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub id: String,
    pub document_id: String,
    pub values: MetadataValues,
    pub tags: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "option_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub schema_name: Option<String>,
}

/// Body for creating a document's metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetadataRequest {
    pub schema_name: Option<String>,
    pub values: MetadataValues,
    pub tags: Vec<String>,
}

/// Body for replacing a document's metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMetadataRequest {
    pub schema_name: Option<String>,
    pub values: MetadataValues,
    pub tags: Vec<String>,
}

/// One hit of a metadata search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataSearchResult {
    pub document_id: String,
    pub document_name: String,
    pub metadata: Option<Metadata>,
    pub score: f64,
}

/// Schema describing the fields a document's metadata may carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataSchema {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub version: String,
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub fields: Option<ValuesWrapper<MetadataSchemaField>>,
    pub file_types: Option<Vec<String>>,
    pub category_id: Option<String>,
    pub field_count: u32,
}

/// A single field of a [`MetadataSchema`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataSchemaField {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    /// Numeric field type code as defined by the API
    #[serde(rename = "type")]
    pub field_type: i32,
    pub is_required: bool,
    pub default_value: Option<String>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub validation_regex: Option<String>,
    pub order: i32,
    pub option_items: Option<ValuesWrapper<MetadataFieldOption>>,
}

/// Selectable value of an enumerated field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataFieldOption {
    pub label: String,
    pub value: String,
}

/// Metadata to check against a named schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidateMetadataRequest {
    pub schema_name: String,
    pub metadata: MetadataValues,
}

/// Outcome of a schema validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Search criteria sent JSON-encoded in the `searchCriteriaJson` query parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchCriteria<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}
