//! HTTP layer
//!
//! Transport, retrying executor, typed client and endpoint paths.

mod api_client;
pub mod endpoints;
mod executor;
mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use api_client::ApiClient;
pub use executor::{RequestExecutor, RetryPolicy, RetryState, MAX_RETRY_ATTEMPTS};
pub use transport::{
    ApiRequest, FilePart, MultipartForm, RawResponse, RequestBody, ReqwestTransport, Transport,
    TransportError,
};
