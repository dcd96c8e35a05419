//! Category service

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::ReadThroughCache;
use crate::error::ApiResult;
use crate::http::endpoints::categories as endpoints;
use crate::http::ApiClient;
use crate::models::{
    Category, CreateCategoryRequest, PagedEnvelope, PagedResponse, UpdateCategoryRequest,
    ValuesWrapper,
};
use crate::services::require;

// == Contract ==
#[async_trait]
pub trait CategoryService: Send + Sync + fmt::Debug {
    /// Categories visible to the caller.
    async fn categories(&self) -> ApiResult<Vec<Category>>;

    /// Every category, regardless of nesting.
    async fn all_categories(&self) -> ApiResult<Vec<Category>>;

    async fn category(&self, category_id: &str) -> ApiResult<Category>;

    async fn create_category(&self, name: &str, description: Option<&str>)
        -> ApiResult<Category>;

    async fn update_category(
        &self,
        category_id: &str,
        request: &UpdateCategoryRequest,
    ) -> ApiResult<Category>;

    async fn delete_category(&self, category_id: &str) -> ApiResult<()>;

    /// Categories without a parent.
    async fn root_categories(&self) -> ApiResult<Vec<Category>>;

    async fn subcategories(&self, category_id: &str) -> ApiResult<Vec<Category>>;

    async fn categories_paged(
        &self,
        page: u32,
        page_size: u32,
        search_term: Option<&str>,
    ) -> ApiResult<PagedResponse<Category>>;
}

// == Raw Implementation ==
/// Calls the API directly.
#[derive(Debug, Clone)]
pub struct CategoryClient {
    api: ApiClient,
}

impl CategoryClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn list(&self, endpoint: &str) -> ApiResult<Vec<Category>> {
        let wrapper: Option<ValuesWrapper<Category>> = self.api.get(endpoint).await?;
        Ok(wrapper.map(Vec::from).unwrap_or_default())
    }
}

#[async_trait]
impl CategoryService for CategoryClient {
    async fn categories(&self) -> ApiResult<Vec<Category>> {
        self.list(&endpoints::all()).await
    }

    async fn all_categories(&self) -> ApiResult<Vec<Category>> {
        self.list(&endpoints::all()).await
    }

    async fn category(&self, category_id: &str) -> ApiResult<Category> {
        require(category_id, "Category ID")?;
        self.api.get(&endpoints::by_id(category_id)).await
    }

    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> ApiResult<Category> {
        require(name, "Category name")?;
        let request = CreateCategoryRequest {
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        self.api.post(&endpoints::base(), &request).await
    }

    async fn update_category(
        &self,
        category_id: &str,
        request: &UpdateCategoryRequest,
    ) -> ApiResult<Category> {
        require(category_id, "Category ID")?;
        require(&request.name, "Category name")?;
        self.api.put(&endpoints::by_id(category_id), request).await
    }

    async fn delete_category(&self, category_id: &str) -> ApiResult<()> {
        require(category_id, "Category ID")?;
        self.api.delete(&endpoints::by_id(category_id)).await
    }

    async fn root_categories(&self) -> ApiResult<Vec<Category>> {
        self.list(&endpoints::root()).await
    }

    async fn subcategories(&self, category_id: &str) -> ApiResult<Vec<Category>> {
        require(category_id, "Category ID")?;
        self.list(&endpoints::subcategories(category_id)).await
    }

    async fn categories_paged(
        &self,
        page: u32,
        page_size: u32,
        search_term: Option<&str>,
    ) -> ApiResult<PagedResponse<Category>> {
        let envelope: Option<PagedEnvelope<Category>> = self
            .api
            .get(&endpoints::paged(page, page_size, search_term))
            .await?;

        Ok(match envelope {
            Some(envelope) => envelope.into(),
            None => PagedResponse {
                page_size,
                ..PagedResponse::default()
            },
        })
    }
}

// == Cached Implementation ==
/// Read-through decorator. Writes drop every cached category read.
#[derive(Debug, Clone)]
pub struct CachedCategoryService {
    inner: Arc<dyn CategoryService>,
    cache: ReadThroughCache,
}

impl CachedCategoryService {
    pub fn new(inner: Arc<dyn CategoryService>, cache: ReadThroughCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl CategoryService for CachedCategoryService {
    async fn categories(&self) -> ApiResult<Vec<Category>> {
        let key = self.cache.key("list", &())?;
        self.cache
            .get_or_fetch(&key, || self.inner.categories())
            .await
    }

    async fn all_categories(&self) -> ApiResult<Vec<Category>> {
        let key = self.cache.key("all", &())?;
        self.cache
            .get_or_fetch(&key, || self.inner.all_categories())
            .await
    }

    async fn category(&self, category_id: &str) -> ApiResult<Category> {
        let key = self.cache.key("by-id", category_id)?;
        self.cache
            .get_or_fetch(&key, || self.inner.category(category_id))
            .await
    }

    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> ApiResult<Category> {
        let category = self.inner.create_category(name, description).await?;
        self.cache.invalidate(None).await;
        Ok(category)
    }

    async fn update_category(
        &self,
        category_id: &str,
        request: &UpdateCategoryRequest,
    ) -> ApiResult<Category> {
        let category = self.inner.update_category(category_id, request).await?;
        let key = self.cache.key("by-id", category_id)?;
        self.cache.invalidate(Some(&key)).await;
        Ok(category)
    }

    async fn delete_category(&self, category_id: &str) -> ApiResult<()> {
        self.inner.delete_category(category_id).await?;
        let key = self.cache.key("by-id", category_id)?;
        self.cache.invalidate(Some(&key)).await;
        Ok(())
    }

    async fn root_categories(&self) -> ApiResult<Vec<Category>> {
        let key = self.cache.key("root", &())?;
        self.cache
            .get_or_fetch(&key, || self.inner.root_categories())
            .await
    }

    async fn subcategories(&self, category_id: &str) -> ApiResult<Vec<Category>> {
        let key = self.cache.key("subcategories", category_id)?;
        self.cache
            .get_or_fetch(&key, || self.inner.subcategories(category_id))
            .await
    }

    async fn categories_paged(
        &self,
        page: u32,
        page_size: u32,
        search_term: Option<&str>,
    ) -> ApiResult<PagedResponse<Category>> {
        let key = self.cache.key("paged", &(page, page_size, search_term))?;
        self.cache
            .get_or_fetch(&key, || {
                self.inner.categories_paged(page, page_size, search_term)
            })
            .await
    }
}
