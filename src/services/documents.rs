//! Document service
//!
//! Documents are never cached: contents are large and change with every
//! new version.

use std::fmt;

use async_trait::async_trait;

use crate::error::{ApiError, ApiResult};
use crate::http::endpoints::documents as endpoints;
use crate::http::{ApiClient, MultipartForm};
use crate::models::{
    CreateDocumentRequest, Document, DocumentCreateResponse, DocumentVersion, PagedEnvelope,
    PagedResponse, UpdateDocumentRequest, ValuesWrapper,
};
use crate::services::require;

#[async_trait]
pub trait DocumentService: Send + Sync + fmt::Debug {
    async fn documents(&self, page: u32, size: u32) -> ApiResult<PagedResponse<Document>>;

    /// `None` when the API answers with an empty body.
    async fn document(&self, document_id: &str, include_metadata: bool)
        -> ApiResult<Option<Document>>;

    /// Uploads `content` as a new document.
    ///
    /// # Arguments
    /// * `file_name` - Name of the uploaded file
    /// * `content` - File bytes
    /// * `request` - Display name, placement and share options
    async fn create_document(
        &self,
        file_name: &str,
        content: Vec<u8>,
        request: &CreateDocumentRequest,
    ) -> ApiResult<Document>;

    async fn update_document(
        &self,
        document_id: &str,
        request: &UpdateDocumentRequest,
    ) -> ApiResult<Document>;

    async fn download_document(&self, document_id: &str) -> ApiResult<Vec<u8>>;

    /// First page of the category's documents, as the API pages it by default.
    async fn documents_by_category(&self, category_id: &str) -> ApiResult<Vec<Document>>;

    async fn documents_by_category_paged(
        &self,
        category_id: &str,
        page: u32,
        page_size: u32,
    ) -> ApiResult<PagedResponse<Document>>;

    async fn versions(&self, document_id: &str) -> ApiResult<Vec<DocumentVersion>>;

    async fn create_version(
        &self,
        document_id: &str,
        file_name: &str,
        content: Vec<u8>,
        change_description: Option<&str>,
    ) -> ApiResult<DocumentVersion>;
}

// == Raw Implementation ==
#[derive(Debug, Clone)]
pub struct DocumentClient {
    api: ApiClient,
}

impl DocumentClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Shorthand upload with a display name and an optional bucket.
    pub async fn upload(
        &self,
        file_name: &str,
        content: Vec<u8>,
        name: &str,
        bucket_id: Option<&str>,
    ) -> ApiResult<Document> {
        let mut request = CreateDocumentRequest::new(name);
        request.bucket_id = bucket_id.map(str::to_string);
        self.create_document(file_name, content, &request).await
    }

    async fn paged(&self, endpoint: &str) -> ApiResult<PagedResponse<Document>> {
        let envelope: Option<PagedEnvelope<Document>> = self.api.get(endpoint).await?;
        Ok(envelope.map(PagedResponse::from).unwrap_or_default())
    }
}

#[async_trait]
impl DocumentService for DocumentClient {
    async fn documents(&self, page: u32, size: u32) -> ApiResult<PagedResponse<Document>> {
        self.paged(&endpoints::list(page, size)).await
    }

    async fn document(
        &self,
        document_id: &str,
        include_metadata: bool,
    ) -> ApiResult<Option<Document>> {
        require(document_id, "Document ID")?;
        self.api
            .get(&endpoints::by_id(document_id, include_metadata))
            .await
    }

    async fn create_document(
        &self,
        file_name: &str,
        content: Vec<u8>,
        request: &CreateDocumentRequest,
    ) -> ApiResult<Document> {
        require(file_name, "File name")?;
        require(&request.name, "Document name")?;
        if content.is_empty() {
            return Err(ApiError::InvalidArgument(
                "File content cannot be empty".to_string(),
            ));
        }

        let form = request
            .form_fields()
            .into_iter()
            .fold(MultipartForm::with_file(file_name, content), |form, (name, value)| {
                form.text(name, value)
            });

        let response: DocumentCreateResponse = self
            .api
            .post_multipart(&endpoints::create(&request.query_params()), form)
            .await?;
        Ok(response.document)
    }

    async fn update_document(
        &self,
        document_id: &str,
        request: &UpdateDocumentRequest,
    ) -> ApiResult<Document> {
        require(document_id, "Document ID")?;
        let body = UpdateDocumentRequest {
            id: document_id.to_string(),
            ..request.clone()
        };
        self.api.put(&endpoints::by_id(document_id, false), &body).await
    }

    async fn download_document(&self, document_id: &str) -> ApiResult<Vec<u8>> {
        require(document_id, "Document ID")?;
        self.api
            .download_bytes(&endpoints::download(document_id))
            .await
    }

    async fn documents_by_category(&self, category_id: &str) -> ApiResult<Vec<Document>> {
        require(category_id, "Category ID")?;
        let page = self
            .paged(&endpoints::by_category(category_id, None))
            .await?;
        Ok(page.items)
    }

    async fn documents_by_category_paged(
        &self,
        category_id: &str,
        page: u32,
        page_size: u32,
    ) -> ApiResult<PagedResponse<Document>> {
        require(category_id, "Category ID")?;
        self.paged(&endpoints::by_category(category_id, Some((page, page_size))))
            .await
    }

    async fn versions(&self, document_id: &str) -> ApiResult<Vec<DocumentVersion>> {
        require(document_id, "Document ID")?;
        let wrapper: Option<ValuesWrapper<DocumentVersion>> =
            self.api.get(&endpoints::versions(document_id)).await?;
        Ok(wrapper.map(Vec::from).unwrap_or_default())
    }

    async fn create_version(
        &self,
        document_id: &str,
        file_name: &str,
        content: Vec<u8>,
        change_description: Option<&str>,
    ) -> ApiResult<DocumentVersion> {
        require(document_id, "Document ID")?;
        require(file_name, "File name")?;

        let mut form = MultipartForm::with_file(file_name, content);
        if let Some(description) = change_description.filter(|d| !d.is_empty()) {
            form = form.text("changeDescription", description);
        }

        self.api
            .post_multipart(&endpoints::versions(document_id), form)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::ScriptedTransport;
    use crate::http::{RequestBody, RequestExecutor, RetryPolicy};
    use reqwest::Method;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn client(transport: Arc<ScriptedTransport>) -> DocumentClient {
        DocumentClient::new(ApiClient::new(
            RequestExecutor::new(transport, RetryPolicy::new(0)),
            CancellationToken::new(),
        ))
    }

    fn multipart(transport: &ScriptedTransport, index: usize) -> MultipartForm {
        match &transport.requests()[index].body {
            RequestBody::Multipart(form) => form.clone(),
            other => panic!("expected multipart body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_document_sends_form_and_storage_query() {
        let transport = Arc::new(
            ScriptedTransport::new().respond(200, r#"{"document":{"id":"d1","name":"Report"}}"#),
        );
        let request = CreateDocumentRequest::new("Report")
            .with_bucket("b1")
            .with_category("c1");

        let document = client(transport.clone())
            .create_document("report.pdf", vec![1, 2, 3], &request)
            .await
            .unwrap();

        assert_eq!(document.id, "d1");
        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.endpoint, "/api/documents?bucketId=b1");

        let form = multipart(&transport, 0);
        let file = form.file.as_ref().unwrap();
        assert_eq!(file.file_name, "report.pdf");
        assert_eq!(file.content, vec![1, 2, 3]);
        assert_eq!(form.text[0], ("name".to_string(), "Report".to_string()));
        assert!(form
            .text
            .contains(&("categoryId".to_string(), "c1".to_string())));
    }

    #[tokio::test]
    async fn test_create_document_rejects_empty_content() {
        let transport = Arc::new(ScriptedTransport::new());
        let result = client(transport.clone())
            .upload("a.txt", Vec::new(), "A", None)
            .await;

        assert!(matches!(result, Err(ApiError::InvalidArgument(_))));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_update_sets_path_id() {
        let transport = Arc::new(ScriptedTransport::new().respond(200, r#"{"id":"d1"}"#));
        let request = UpdateDocumentRequest {
            id: "ignored".to_string(),
            name: "Renamed".to_string(),
            ..UpdateDocumentRequest::default()
        };

        client(transport.clone())
            .update_document("d1", &request)
            .await
            .unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::PUT);
        let RequestBody::Json(bytes) = &sent.body else {
            panic!("expected json body");
        };
        let body: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(body["id"], "d1");
        assert_eq!(body["name"], "Renamed");
    }

    #[tokio::test]
    async fn test_versions_and_new_version() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(200, r#"{"$values":[{"id":"v1","versionNumber":1,"isCurrent":true}]}"#)
                .respond(200, r#"{"id":"v2","versionNumber":2}"#),
        );
        let client = client(transport.clone());

        let versions = client.versions("d1").await.unwrap();
        assert_eq!(versions[0].version_number, 1);

        let version = client
            .create_version("d1", "v2.pdf", vec![9], Some("typo fix"))
            .await
            .unwrap();
        assert_eq!(version.version_number, 2);

        let form = multipart(&transport, 1);
        assert_eq!(
            form.text,
            vec![("changeDescription".to_string(), "typo fix".to_string())]
        );
        assert_eq!(transport.endpoints()[1], "/api/documents/d1/versions");
    }

    #[tokio::test]
    async fn test_document_by_id_with_metadata() {
        let transport = Arc::new(ScriptedTransport::new().respond(200, ""));
        let document = client(transport.clone()).document("d1", true).await.unwrap();

        assert_eq!(document, None);
        assert_eq!(
            transport.endpoints(),
            vec!["/api/documents/d1?includeMetadata=true".to_string()]
        );
    }

    #[tokio::test]
    async fn test_documents_by_category_unwraps_page() {
        let body = r#"{"items":{"$values":[{"id":"d1"},{"id":"d2"}]},"totalCount":2}"#;
        let transport = Arc::new(ScriptedTransport::new().respond(200, body));

        let documents = client(transport).documents_by_category("c1").await.unwrap();
        assert_eq!(documents.len(), 2);
    }
}
