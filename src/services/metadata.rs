//! Metadata service
//!
//! Document metadata, tags and schemas. Search and validation results are
//! never cached.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::cache::ReadThroughCache;
use crate::error::{ApiError, ApiResult};
use crate::http::endpoints::metadata as endpoints;
use crate::http::ApiClient;
use crate::models::metadata::SearchCriteria;
use crate::models::{
    CreateMetadataRequest, Metadata, MetadataSchema, MetadataSearchResult, PagedEnvelope,
    PagedResponse, UpdateMetadataRequest, ValidateMetadataRequest, ValidationResult,
    ValuesWrapper,
};
use crate::services::require;

/// Error text the API returns when the tag listing is not supported without a filter.
const TAGS_REQUIRED: &str = "tags field is required";

// == Contract ==
#[async_trait]
pub trait MetadataService: Send + Sync + fmt::Debug {
    async fn document_metadata(&self, document_id: &str) -> ApiResult<Metadata>;

    async fn create_document_metadata(
        &self,
        document_id: &str,
        request: &CreateMetadataRequest,
    ) -> ApiResult<Metadata>;

    async fn update_document_metadata(
        &self,
        document_id: &str,
        request: &UpdateMetadataRequest,
    ) -> ApiResult<Metadata>;

    async fn search(&self, query: &str) -> ApiResult<Vec<MetadataSearchResult>>;

    async fn search_paged(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> ApiResult<Vec<MetadataSearchResult>>;

    /// Every tag in use. Empty when the API refuses an unfiltered listing.
    async fn tags(&self) -> ApiResult<Vec<String>>;

    async fn tags_paged(&self, page: u32, page_size: u32) -> ApiResult<PagedResponse<String>>;

    /// Checks `request.metadata` against the named schema.
    async fn validate(&self, request: &ValidateMetadataRequest) -> ApiResult<ValidationResult>;

    async fn schemas(
        &self,
        page: u32,
        page_size: u32,
        query: Option<&str>,
    ) -> ApiResult<Vec<MetadataSchema>>;

    /// `None` when the API answers with an empty body.
    async fn schema(&self, schema_id: &str) -> ApiResult<Option<MetadataSchema>>;
}

// == Raw Implementation ==
#[derive(Debug, Clone)]
pub struct MetadataClient {
    api: ApiClient,
}

impl MetadataClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn run_search(
        &self,
        criteria: SearchCriteria<'_>,
    ) -> ApiResult<Vec<MetadataSearchResult>> {
        let criteria_json = serde_json::to_string(&criteria)
            .map_err(|e| ApiError::Serialization(format!("search criteria: {}", e)))?;
        let paging = criteria.page.zip(criteria.page_size);

        let envelope: Option<PagedEnvelope<MetadataSearchResult>> =
            self.api.get(&endpoints::search(&criteria_json, paging)).await?;
        Ok(envelope.map(|e| e.items.values).unwrap_or_default())
    }
}

fn is_tags_required(error: &ApiError) -> bool {
    error.status().is_some() && error.to_string().contains(TAGS_REQUIRED)
}

#[async_trait]
impl MetadataService for MetadataClient {
    async fn document_metadata(&self, document_id: &str) -> ApiResult<Metadata> {
        require(document_id, "Document ID")?;
        self.api.get(&endpoints::document(document_id)).await
    }

    async fn create_document_metadata(
        &self,
        document_id: &str,
        request: &CreateMetadataRequest,
    ) -> ApiResult<Metadata> {
        require(document_id, "Document ID")?;
        self.api.post(&endpoints::document(document_id), request).await
    }

    async fn update_document_metadata(
        &self,
        document_id: &str,
        request: &UpdateMetadataRequest,
    ) -> ApiResult<Metadata> {
        require(document_id, "Document ID")?;
        self.api.put(&endpoints::document(document_id), request).await
    }

    async fn search(&self, query: &str) -> ApiResult<Vec<MetadataSearchResult>> {
        self.run_search(SearchCriteria {
            query,
            page: None,
            page_size: None,
        })
        .await
    }

    async fn search_paged(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> ApiResult<Vec<MetadataSearchResult>> {
        self.run_search(SearchCriteria {
            query,
            page: Some(page),
            page_size: Some(page_size),
        })
        .await
    }

    async fn tags(&self) -> ApiResult<Vec<String>> {
        match self.api.get::<Option<ValuesWrapper<String>>>(&endpoints::tags()).await {
            Ok(tags) => Ok(tags.map(Vec::from).unwrap_or_default()),
            Err(e) if is_tags_required(&e) => {
                warn!(error = %e, "Tag listing requires a filter, returning no tags");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn tags_paged(&self, page: u32, page_size: u32) -> ApiResult<PagedResponse<String>> {
        let endpoint = endpoints::tags_paged(page, page_size);
        match self.api.get::<Option<PagedEnvelope<String>>>(&endpoint).await {
            Ok(envelope) => Ok(envelope.map(PagedResponse::from).unwrap_or_default()),
            Err(e) if is_tags_required(&e) => {
                warn!(error = %e, "Tag listing requires a filter, returning an empty page");
                Ok(PagedResponse::default())
            }
            Err(e) => Err(e),
        }
    }

    async fn validate(&self, request: &ValidateMetadataRequest) -> ApiResult<ValidationResult> {
        require(&request.schema_name, "Schema name")?;
        let result: Option<ValidationResult> = self
            .api
            .post(&endpoints::validate(&request.schema_name), &request.metadata)
            .await?;
        Ok(result.unwrap_or_default())
    }

    async fn schemas(
        &self,
        page: u32,
        page_size: u32,
        query: Option<&str>,
    ) -> ApiResult<Vec<MetadataSchema>> {
        let envelope: Option<PagedEnvelope<MetadataSchema>> = self
            .api
            .get(&endpoints::schemas_paged(page, page_size, query))
            .await?;
        Ok(envelope.map(|e| e.items.values).unwrap_or_default())
    }

    async fn schema(&self, schema_id: &str) -> ApiResult<Option<MetadataSchema>> {
        require(schema_id, "Schema ID")?;
        self.api.get(&endpoints::schema_by_id(schema_id)).await
    }
}

// == Cached Implementation ==
/// Read-through decorator for metadata reads.
#[derive(Debug, Clone)]
pub struct CachedMetadataService {
    inner: Arc<dyn MetadataService>,
    cache: ReadThroughCache,
}

impl CachedMetadataService {
    pub fn new(inner: Arc<dyn MetadataService>, cache: ReadThroughCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl MetadataService for CachedMetadataService {
    async fn document_metadata(&self, document_id: &str) -> ApiResult<Metadata> {
        let key = self.cache.key("document", document_id)?;
        self.cache
            .get_or_fetch(&key, || self.inner.document_metadata(document_id))
            .await
    }

    async fn create_document_metadata(
        &self,
        document_id: &str,
        request: &CreateMetadataRequest,
    ) -> ApiResult<Metadata> {
        let metadata = self
            .inner
            .create_document_metadata(document_id, request)
            .await?;
        let key = self.cache.key("document", document_id)?;
        self.cache.invalidate(Some(&key)).await;
        Ok(metadata)
    }

    async fn update_document_metadata(
        &self,
        document_id: &str,
        request: &UpdateMetadataRequest,
    ) -> ApiResult<Metadata> {
        let metadata = self
            .inner
            .update_document_metadata(document_id, request)
            .await?;
        let key = self.cache.key("document", document_id)?;
        self.cache.invalidate(Some(&key)).await;
        Ok(metadata)
    }

    async fn search(&self, query: &str) -> ApiResult<Vec<MetadataSearchResult>> {
        self.inner.search(query).await
    }

    async fn search_paged(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> ApiResult<Vec<MetadataSearchResult>> {
        self.inner.search_paged(query, page, page_size).await
    }

    async fn tags(&self) -> ApiResult<Vec<String>> {
        let key = self.cache.key("tags", &())?;
        self.cache.get_or_fetch(&key, || self.inner.tags()).await
    }

    async fn tags_paged(&self, page: u32, page_size: u32) -> ApiResult<PagedResponse<String>> {
        let key = self.cache.key("tags-paged", &(page, page_size))?;
        self.cache
            .get_or_fetch(&key, || self.inner.tags_paged(page, page_size))
            .await
    }

    async fn validate(&self, request: &ValidateMetadataRequest) -> ApiResult<ValidationResult> {
        self.inner.validate(request).await
    }

    async fn schemas(
        &self,
        page: u32,
        page_size: u32,
        query: Option<&str>,
    ) -> ApiResult<Vec<MetadataSchema>> {
        let key = self.cache.key("schemas", &(page, page_size, query))?;
        self.cache
            .get_or_fetch(&key, || self.inner.schemas(page, page_size, query))
            .await
    }

    async fn schema(&self, schema_id: &str) -> ApiResult<Option<MetadataSchema>> {
        let key = self.cache.key("schema", schema_id)?;
        self.cache
            .get_or_fetch(&key, || self.inner.schema(schema_id))
            .await
    }
}
