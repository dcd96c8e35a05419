//! Request and response models for the Qutora API
//!
//! Field names follow the API's camelCase JSON. Missing fields fall back to
//! their defaults so partial payloads still decode.

pub mod category;
pub mod common;
pub mod document;
pub mod metadata;
pub mod storage;

// Re-export commonly used types
pub use category::{Category, CreateCategoryRequest, UpdateCategoryRequest};
pub use common::{PagedEnvelope, PagedResponse, ValuesWrapper};
pub use document::{
    CreateDocumentRequest, Document, DocumentCreateResponse, DocumentShare, DocumentVersion,
    UpdateDocumentRequest,
};
pub use metadata::{
    CreateMetadataRequest, Metadata, MetadataFieldOption, MetadataSchema, MetadataSchemaField,
    MetadataSearchResult, MetadataValues, UpdateMetadataRequest, ValidateMetadataRequest,
    ValidationResult,
};
pub use storage::{Bucket, StorageProvider};
