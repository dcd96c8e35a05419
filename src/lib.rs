//! Qutora SDK - Client library for the Qutora document management API
//!
//! Provides typed services over a retrying HTTP executor, with read-through
//! caching of category, metadata and storage reads.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
pub mod tasks;

pub use client::{QutoraClient, QutoraClientBuilder};
pub use config::{CacheOptions, CacheProviderKind, ClientOptions};
pub use error::{ApiError, ApiResult};
