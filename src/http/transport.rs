//! HTTP transport
//!
//! One request in, one status and body out. Retries, status classification
//! and decoding live above this layer.

use std::borrow::Cow;
use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use thiserror::Error;

use crate::config::ClientOptions;
use crate::error::{ApiError, ApiResult};

const API_KEY_HEADER: &str = "x-qutora-key";
const API_SECRET_HEADER: &str = "x-qutora-secret";
const FILE_CONTENT_TYPE: &str = "application/octet-stream";

// == Request ==
/// A file attached to a multipart request.
#[derive(Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("content_len", &self.content.len())
            .finish()
    }
}

/// Owned multipart body, rebuilt for every attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub text: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

impl MultipartForm {
    /// Form carrying `content` as the `file` part.
    pub fn with_file(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            text: Vec::new(),
            file: Some(FilePart {
                field: "file".to_string(),
                file_name: file_name.into(),
                content,
            }),
        }
    }

    /// Appends a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.text.push((name.into(), value.into()));
        self
    }

    fn to_reqwest(&self) -> Result<reqwest::multipart::Form, TransportError> {
        let mut form = reqwest::multipart::Form::new();

        if let Some(file) = &self.file {
            let part = reqwest::multipart::Part::bytes(file.content.clone())
                .file_name(file.file_name.clone())
                .mime_str(FILE_CONTENT_TYPE)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            form = form.part(file.field.clone(), part);
        }

        for (name, value) in &self.text {
            form = form.text(name.clone(), value.clone());
        }

        Ok(form)
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    /// Pre-encoded JSON
    Json(Vec<u8>),
    Multipart(MultipartForm),
}

/// One logical API request, replayable across attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path and query relative to the base URL, e.g. `/api/categories/all`
    pub endpoint: String,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint, RequestBody::Empty)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint, RequestBody::Empty)
    }
}

// == Response ==
/// Status and body of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

// == Transport Error ==
/// Failure before a status was received.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Connection refused, reset, or body read failure
    #[error("connection failed: {0}")]
    Connection(String),

    /// Per-attempt timeout elapsed
    #[error("timed out: {0}")]
    Timeout(String),

    /// The request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connection(message) => ApiError::Transport { message },
            TransportError::Timeout(message) => ApiError::Timeout { message },
            TransportError::InvalidRequest(message) => ApiError::InvalidArgument(message),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

// == Transport ==
/// Sends a single request attempt.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Builds the HTTP client with credentials, timeout and headers from `options`.
    pub fn new(options: &ClientOptions) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            header_value("API key", &options.api_key)?,
        );
        headers.insert(
            HeaderName::from_static(API_SECRET_HEADER),
            header_value("API secret", &options.api_secret)?,
        );

        for (name, value) in &options.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ApiError::Configuration(format!("invalid header name '{}': {}", name, e))
            })?;
            headers.insert(name, header_value("default header", value)?);
        }

        let client = reqwest::Client::builder()
            .timeout(options.timeout())
            .user_agent(options.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        // Normalize base URL (remove trailing slash)
        let base_url = options.base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// Absolute URL of `endpoint`.
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}

fn header_value(what: &str, value: &str) -> ApiResult<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|_| ApiError::Configuration(format!("{} is not a valid header value", what)))?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.endpoint));

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(bytes.clone()),
            RequestBody::Multipart(form) => builder.multipart(form.to_reqwest()?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { status, body })
    }
}
