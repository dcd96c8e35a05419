//! Domain services
//!
//! One async trait per API domain. Each domain has a raw implementation that
//! maps calls onto [`ApiClient`](crate::http::ApiClient); categories, metadata
//! and storage also have a read-through cached implementation of the same
//! trait. [`QutoraClient`](crate::QutoraClient) picks one per domain at
//! construction.

mod categories;
mod documents;
mod metadata;
mod storage;

pub use categories::{CachedCategoryService, CategoryClient, CategoryService};
pub use documents::{DocumentClient, DocumentService};
pub use metadata::{CachedMetadataService, MetadataClient, MetadataService};
pub use storage::{CachedStorageService, StorageClient, StorageService, DEFAULT_BUCKET_PAGE_SIZE};

use crate::error::{ApiError, ApiResult};

/// Rejects blank identifiers before any request is issued.
pub(crate) fn require(value: &str, what: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        Err(ApiError::InvalidArgument(format!(
            "{} cannot be null or empty",
            what
        )))
    } else {
        Ok(())
    }
}
