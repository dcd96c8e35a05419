//! Storage service
//!
//! Read-only listings of the buckets and providers the caller can use.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::ReadThroughCache;
use crate::error::ApiResult;
use crate::http::endpoints::storage as endpoints;
use crate::http::ApiClient;
use crate::models::{Bucket, PagedEnvelope, PagedResponse, StorageProvider, ValuesWrapper};

/// Page size used when callers have no preference.
pub const DEFAULT_BUCKET_PAGE_SIZE: u32 = 20;

#[async_trait]
pub trait StorageService: Send + Sync + fmt::Debug {
    async fn accessible_buckets(&self, page: u32, page_size: u32)
        -> ApiResult<PagedResponse<Bucket>>;

    async fn accessible_providers(&self) -> ApiResult<Vec<StorageProvider>>;
}

// == Raw Implementation ==
#[derive(Debug, Clone)]
pub struct StorageClient {
    api: ApiClient,
}

impl StorageClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl StorageService for StorageClient {
    async fn accessible_buckets(
        &self,
        page: u32,
        page_size: u32,
    ) -> ApiResult<PagedResponse<Bucket>> {
        let envelope: Option<PagedEnvelope<Bucket>> = self
            .api
            .get(&endpoints::accessible_buckets(page, page_size))
            .await?;
        Ok(envelope.map(PagedResponse::from).unwrap_or_default())
    }

    async fn accessible_providers(&self) -> ApiResult<Vec<StorageProvider>> {
        let wrapper: Option<ValuesWrapper<StorageProvider>> =
            self.api.get(&endpoints::accessible_providers()).await?;
        Ok(wrapper.map(Vec::from).unwrap_or_default())
    }
}

// == Cached Implementation ==
#[derive(Debug, Clone)]
pub struct CachedStorageService {
    inner: Arc<dyn StorageService>,
    cache: ReadThroughCache,
}

impl CachedStorageService {
    pub fn new(inner: Arc<dyn StorageService>, cache: ReadThroughCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl StorageService for CachedStorageService {
    async fn accessible_buckets(
        &self,
        page: u32,
        page_size: u32,
    ) -> ApiResult<PagedResponse<Bucket>> {
        let key = self.cache.key("buckets", &(page, page_size))?;
        self.cache
            .get_or_fetch(&key, || self.inner.accessible_buckets(page, page_size))
            .await
    }

    async fn accessible_providers(&self) -> ApiResult<Vec<StorageProvider>> {
        let key = self.cache.key("providers", &())?;
        self.cache
            .get_or_fetch(&key, || self.inner.accessible_providers())
            .await
    }
}
