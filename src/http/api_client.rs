//! Typed JSON verbs over the request executor.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::http::executor::RequestExecutor;
use crate::http::transport::{ApiRequest, MultipartForm, RawResponse, RequestBody};

// == Api Client ==
/// Cheap-to-clone handle shared by every service of one client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    executor: Arc<RequestExecutor>,
    cancel: CancellationToken,
}

impl ApiClient {
    pub fn new(executor: RequestExecutor, cancel: CancellationToken) -> Self {
        Self {
            executor: Arc::new(executor),
            cancel,
        }
    }

    /// Token that aborts every call made through this client.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    // == Verbs ==
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        let response = self.run(ApiRequest::get(endpoint)).await?;
        decode(endpoint, &response)
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let request = ApiRequest::new(Method::POST, endpoint, json_body(body)?);
        let response = self.run(request).await?;
        decode(endpoint, &response)
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let request = ApiRequest::new(Method::PUT, endpoint, json_body(body)?);
        let response = self.run(request).await?;
        decode(endpoint, &response)
    }

    /// Deletes a resource; any 2xx counts as success.
    pub async fn delete(&self, endpoint: &str) -> ApiResult<()> {
        self.run(ApiRequest::delete(endpoint)).await?;
        Ok(())
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: MultipartForm,
    ) -> ApiResult<T> {
        let request = ApiRequest::new(Method::POST, endpoint, RequestBody::Multipart(form));
        let response = self.run(request).await?;
        decode(endpoint, &response)
    }

    /// Raw response body of a GET.
    pub async fn download_bytes(&self, endpoint: &str) -> ApiResult<Vec<u8>> {
        let response = self.run(ApiRequest::get(endpoint)).await?;
        Ok(response.body)
    }

    /// Single unretried GET; true on any 2xx.
    pub async fn probe(&self, endpoint: &str) -> bool {
        match self
            .executor
            .execute_once(&ApiRequest::get(endpoint), &self.cancel)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!(endpoint = endpoint, error = %e, "Probe failed");
                false
            }
        }
    }

    async fn run(&self, request: ApiRequest) -> ApiResult<RawResponse> {
        self.executor.execute(&request, &self.cancel).await
    }
}

fn json_body<B: Serialize + ?Sized>(body: &B) -> ApiResult<RequestBody> {
    serde_json::to_vec(body)
        .map(RequestBody::Json)
        .map_err(|e| ApiError::Serialization(format!("request body: {}", e)))
}

/// Decodes a success body. An empty body decodes as JSON `null`.
fn decode<T: DeserializeOwned>(endpoint: &str, response: &RawResponse) -> ApiResult<T> {
    let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &response.body
    };

    serde_json::from_slice(body)
        .map_err(|e| ApiError::Serialization(format!("{} response: {}", endpoint, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::executor::RetryPolicy;
    use crate::http::test_support::ScriptedTransport;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Item {
        id: String,
    }

    fn client(transport: Arc<ScriptedTransport>) -> ApiClient {
        ApiClient::new(
            RequestExecutor::new(transport, RetryPolicy::new(0)),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_get_decodes_json() {
        let transport = Arc::new(ScriptedTransport::new().respond(200, r#"{"id":"a"}"#));
        let item: Item = client(transport).get("/api/items/a").await.unwrap();
        assert_eq!(item, Item { id: "a".into() });
    }

    #[tokio::test]
    async fn test_empty_body_is_none() {
        let transport = Arc::new(ScriptedTransport::new().respond(200, "  "));
        let item: Option<Item> = client(transport).get("/api/items/a").await.unwrap();
        assert_eq!(item, None);
    }

    #[tokio::test]
    async fn test_malformed_body_is_serialization_error() {
        let transport = Arc::new(ScriptedTransport::new().respond(200, "<html>"));
        let result: ApiResult<Item> = client(transport.clone()).get("/api/items/a").await;
        assert!(matches!(result, Err(ApiError::Serialization(_))));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let transport = Arc::new(ScriptedTransport::new().respond(201, r#"{"id":"new"}"#));
        let body = serde_json::json!({ "name": "Invoices" });

        let item: Item = client(transport.clone())
            .post("/api/categories", &body)
            .await
            .unwrap();

        assert_eq!(item.id, "new");
        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(
            request.body,
            RequestBody::Json(br#"{"name":"Invoices"}"#.to_vec())
        );
    }

    #[tokio::test]
    async fn test_delete_ignores_body() {
        let transport = Arc::new(ScriptedTransport::new().respond(204, ""));
        client(transport.clone()).delete("/api/categories/c1").await.unwrap();
        assert_eq!(transport.requests()[0].method, Method::DELETE);
    }

    #[tokio::test]
    async fn test_download_returns_raw_bytes() {
        let transport = Arc::new(ScriptedTransport::new().respond(200, "%PDF-1.7"));
        let bytes = client(transport).download_bytes("/api/documents/d1/download").await.unwrap();
        assert_eq!(bytes, b"%PDF-1.7".to_vec());
    }

    #[tokio::test]
    async fn test_probe_reports_status() {
        let transport = Arc::new(ScriptedTransport::new().respond(401, "").respond(200, "{}"));
        let client = client(transport);
        assert!(!client.probe("/api/documents").await);
        assert!(client.probe("/api/documents").await);
    }
}
