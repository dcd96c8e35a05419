//! Configuration Module
//!
//! Client options with defaults, environment loading and validation.

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};
use crate::http::MAX_RETRY_ATTEMPTS;

// == Defaults ==
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_USER_AGENT: &str = "Qutora.SDK/1.0.0";
const DEFAULT_CACHE_TTL_SECONDS: u64 = 15 * 60;
const DEFAULT_KEY_PREFIX: &str = "qutora";
const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

// == Cache Provider Kind ==
/// Which cache store backs the read-through layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheProviderKind {
    /// In-process store with a key registry
    #[default]
    Memory,
    /// External key-value service supplied by the caller
    Distributed,
    /// No caching
    None,
}

impl CacheProviderKind {
    /// Parses a provider name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Some(Self::Memory),
            "distributed" | "redis" => Some(Self::Distributed),
            "none" | "off" | "disabled" => Some(Self::None),
            _ => None,
        }
    }
}

// == Cache Options ==
/// Cache configuration consumed by the read-through layer.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Whether reads go through the cache at all
    pub enabled: bool,
    /// Backing store
    pub provider: CacheProviderKind,
    /// TTL applied to every cached read
    pub default_ttl: Duration,
    /// First segment of every cache key
    pub key_prefix: String,
    /// Count hits, misses, writes and invalidations
    pub enable_metrics: bool,
    /// How often the memory store sweeps expired entries
    pub sweep_interval: Duration,
}

impl CacheOptions {
    /// True when services should be wrapped by the read-through cache.
    pub fn is_active(&self) -> bool {
        self.enabled && self.provider != CacheProviderKind::None
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: CacheProviderKind::Memory,
            default_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            enable_metrics: false,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECONDS),
        }
    }
}

// == Client Options ==
/// Client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the API, e.g. `https://api.qutora.io`
    pub base_url: String,
    /// API key sent as `X-QUTORA-Key`
    pub api_key: String,
    /// API secret sent as `X-QUTORA-Secret`
    pub api_secret: String,
    /// Per-attempt request timeout in seconds
    pub timeout_seconds: u64,
    /// Retries after the first attempt for transient failures
    pub max_retry_attempts: u32,
    /// User agent header value
    pub user_agent: String,
    /// Extra headers sent with every request
    pub default_headers: BTreeMap<String, String>,
    /// Cache configuration
    pub cache: CacheOptions,
}

impl ClientOptions {
    /// Creates options for the given endpoint and credentials, defaults elsewhere.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Self::default()
        }
    }

    /// Creates options by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `QUTORA_BASE_URL`, `QUTORA_API_KEY`, `QUTORA_API_SECRET` (default: empty)
    /// - `QUTORA_TIMEOUT_SECONDS` (default: 30)
    /// - `QUTORA_MAX_RETRY_ATTEMPTS` (default: 3)
    /// - `QUTORA_CACHE_ENABLED` (default: true)
    /// - `QUTORA_CACHE_PROVIDER` - memory, distributed or none (default: memory)
    /// - `QUTORA_CACHE_TTL_SECONDS` (default: 900)
    /// - `QUTORA_CACHE_KEY_PREFIX` (default: qutora)
    ///
    /// Unparsable values fall back to the defaults; call [`validate`](Self::validate)
    /// before use.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cache_defaults = CacheOptions::default();

        Self {
            base_url: env::var("QUTORA_BASE_URL").unwrap_or_default(),
            api_key: env::var("QUTORA_API_KEY").unwrap_or_default(),
            api_secret: env::var("QUTORA_API_SECRET").unwrap_or_default(),
            timeout_seconds: parse_env("QUTORA_TIMEOUT_SECONDS")
                .unwrap_or(defaults.timeout_seconds),
            max_retry_attempts: parse_env("QUTORA_MAX_RETRY_ATTEMPTS")
                .unwrap_or(defaults.max_retry_attempts),
            user_agent: defaults.user_agent,
            default_headers: defaults.default_headers,
            cache: CacheOptions {
                enabled: parse_env("QUTORA_CACHE_ENABLED").unwrap_or(cache_defaults.enabled),
                provider: env::var("QUTORA_CACHE_PROVIDER")
                    .ok()
                    .and_then(|v| CacheProviderKind::parse(&v))
                    .unwrap_or(cache_defaults.provider),
                default_ttl: parse_env("QUTORA_CACHE_TTL_SECONDS")
                    .map(Duration::from_secs)
                    .unwrap_or(cache_defaults.default_ttl),
                key_prefix: env::var("QUTORA_CACHE_KEY_PREFIX")
                    .unwrap_or(cache_defaults.key_prefix),
                ..cache_defaults
            },
        }
    }

    // == Validate ==
    /// Checks the options, returning a configuration error for the first problem found.
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ApiError::Configuration("BaseUrl is required".to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ApiError::Configuration("ApiKey is required".to_string()));
        }
        if self.api_secret.trim().is_empty() {
            return Err(ApiError::Configuration("ApiSecret is required".to_string()));
        }
        if self.timeout_seconds == 0 {
            return Err(ApiError::Configuration(
                "TimeoutSeconds must be greater than 0".to_string(),
            ));
        }
        if self.max_retry_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ApiError::Configuration(format!(
                "MaxRetryAttempts must be at most {}",
                MAX_RETRY_ATTEMPTS
            )));
        }
        if self.cache.default_ttl.is_zero() {
            return Err(ApiError::Configuration(
                "Cache default TTL must be greater than 0".to_string(),
            ));
        }

        match url::Url::parse(&self.base_url) {
            Ok(url) if url.has_host() => Ok(()),
            _ => Err(ApiError::Configuration(
                "BaseUrl must be a valid absolute URI".to_string(),
            )),
        }
    }

    /// Per-attempt request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: BTreeMap::new(),
            cache: CacheOptions::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
