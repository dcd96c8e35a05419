//! Client composition
//!
//! Wires transport, executor, cache store and services together. The choice
//! between raw and cached services is made once, here.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::{
    build_cache_store, CacheMetrics, CacheStats, CacheStore, KeyValueBackend, NullCacheStore,
    ReadThroughCache,
};
use crate::config::ClientOptions;
use crate::error::ApiResult;
use crate::http::endpoints;
use crate::http::{ApiClient, RequestExecutor, ReqwestTransport, RetryPolicy, Transport};
use crate::services::{
    CachedCategoryService, CachedMetadataService, CachedStorageService, CategoryClient,
    CategoryService, DocumentClient, DocumentService, MetadataClient, MetadataService,
    StorageClient, StorageService,
};

// == Builder ==
/// Builds a [`QutoraClient`] with optional custom transport or cache backend.
#[derive(Debug)]
pub struct QutoraClientBuilder {
    options: ClientOptions,
    transport: Option<Arc<dyn Transport>>,
    backend: Option<Arc<dyn KeyValueBackend>>,
}

impl QutoraClientBuilder {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            transport: None,
            backend: None,
        }
    }

    /// Sends requests through `transport` instead of the default HTTP client.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Backend for the distributed cache provider.
    pub fn with_cache_backend(mut self, backend: Arc<dyn KeyValueBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Validates the options and assembles the client.
    pub fn build(self) -> ApiResult<QutoraClient> {
        let options = self.options;
        options.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&options)?),
        };
        let cancel = CancellationToken::new();
        let executor = RequestExecutor::new(transport, RetryPolicy::new(options.max_retry_attempts));
        let api = ApiClient::new(executor, cancel);

        let mut categories: Arc<dyn CategoryService> = Arc::new(CategoryClient::new(api.clone()));
        let mut metadata: Arc<dyn MetadataService> = Arc::new(MetadataClient::new(api.clone()));
        let mut storage: Arc<dyn StorageService> = Arc::new(StorageClient::new(api.clone()));
        let documents: Arc<dyn DocumentService> = Arc::new(DocumentClient::new(api.clone()));

        let (store, metrics) = if options.cache.is_active() {
            let store = build_cache_store(&options.cache, self.backend)?;
            let metrics = options
                .cache
                .enable_metrics
                .then(|| Arc::new(CacheMetrics::new()));
            let cache = |domain: &'static str| {
                ReadThroughCache::new(store.clone(), &options.cache, domain, metrics.clone())
            };

            categories = Arc::new(CachedCategoryService::new(categories, cache("categories")));
            metadata = Arc::new(CachedMetadataService::new(metadata, cache("metadata")));
            storage = Arc::new(CachedStorageService::new(storage, cache("storage")));
            (store, metrics)
        } else {
            (Arc::new(NullCacheStore::new()) as Arc<dyn CacheStore>, None)
        };

        info!(
            base_url = %options.base_url,
            cache = store.provider_name(),
            max_retries = options.max_retry_attempts,
            timeout_secs = options.timeout_seconds,
            "Qutora client created"
        );

        Ok(QutoraClient {
            options,
            api,
            store,
            metrics,
            categories,
            documents,
            metadata,
            storage,
        })
    }
}

// == Client ==
/// Entry point to the Qutora API.
///
/// Dropping or [closing](Self::close) the client cancels every in-flight and
/// future call made through it, including calls on service handles.
#[derive(Debug)]
pub struct QutoraClient {
    options: ClientOptions,
    api: ApiClient,
    store: Arc<dyn CacheStore>,
    metrics: Option<Arc<CacheMetrics>>,
    categories: Arc<dyn CategoryService>,
    documents: Arc<dyn DocumentService>,
    metadata: Arc<dyn MetadataService>,
    storage: Arc<dyn StorageService>,
}

impl QutoraClient {
    /// Client with the default HTTP transport.
    pub fn new(options: ClientOptions) -> ApiResult<Self> {
        QutoraClientBuilder::new(options).build()
    }

    pub fn builder(options: ClientOptions) -> QutoraClientBuilder {
        QutoraClientBuilder::new(options)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn categories(&self) -> &dyn CategoryService {
        self.categories.as_ref()
    }

    pub fn documents(&self) -> &dyn DocumentService {
        self.documents.as_ref()
    }

    pub fn metadata(&self) -> &dyn MetadataService {
        self.metadata.as_ref()
    }

    pub fn storage(&self) -> &dyn StorageService {
        self.storage.as_ref()
    }

    /// One unretried request to check reachability and credentials.
    pub async fn test_connection(&self) -> bool {
        self.api.probe(&endpoints::documents::list(1, 1)).await
    }

    /// Cache counters, when metrics are enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.metrics.as_ref().map(|m| m.snapshot())
    }

    /// Drops every cached read the store can enumerate.
    pub async fn clear_cache(&self) {
        self.store.clear().await;
    }

    /// Cancels in-flight calls and rejects new ones.
    pub fn close(&self) {
        self.api.cancellation_token().cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.api.cancellation_token().is_cancelled()
    }
}

impl Drop for QutoraClient {
    fn drop(&mut self) {
        self.close();
    }
}
