// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Generic request pipeline shared by every upstream client
//!
//! A [`ProviderExecutor`] is one upstream's instantiation of the call
//! pattern: cache lookup, rate-limit wait, HTTP GET, status classification
//! and cache store. Provider clients only build paths and cache keys.

use std::{sync::Arc, time::Duration};

use api_client::{ApiError, ApiResult, InscriptionContent, Payload, ProviderStatus};
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ETAG, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::Value;
use shared_types::Upstream;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::{Url, form_urlencoded};

use crate::{ApiKey, LimiterRegistry, TokenBucket, TtlCache, cache::Lookup};

/// Default per-request deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Static configuration of one upstream provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Base URL every path is appended to
    pub base_url: Url,
    /// API key, if configured
    pub api_key: Option<ApiKey>,
    /// Published request budget; `None` picks the upstream default for the
    /// credential state
    pub max_requests_per_minute: Option<u32>,
    /// Per-request deadline
    pub timeout: Duration,
}

impl ProviderSettings {
    /// Production defaults for `upstream`, without a credential
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the built-in base URL does not
    /// parse, which would be a programming error.
    pub fn for_upstream(upstream: Upstream) -> ApiResult<Self> {
        Ok(Self {
            base_url: parse_base_url(upstream.default_base_url())?,
            api_key: None,
            max_requests_per_minute: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Replace the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<ApiKey>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Replace the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Requests per minute this provider will be limited to, before buffering
    pub fn effective_max_requests_per_minute(&self, upstream: Upstream) -> u32 {
        self.max_requests_per_minute.unwrap_or_else(|| {
            upstream.default_max_requests_per_minute(self.api_key.is_some())
        })
    }
}

/// Parse a base URL, reporting failures as configuration errors
///
/// # Errors
///
/// Returns [`ApiError::Configuration`] if `raw` is not an absolute URL that
/// can carry path segments.
pub fn parse_base_url(raw: &str) -> ApiResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| ApiError::configuration(format!("invalid base URL '{raw}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::configuration(format!(
            "base URL '{raw}' cannot carry a path"
        )));
    }
    Ok(url)
}

/// How an upstream expects its credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Raw key in a custom header
    Header(&'static str),
    /// `Authorization: Bearer <key>`
    Bearer,
}

impl AuthScheme {
    fn header(self, key: &ApiKey) -> ApiResult<(HeaderName, HeaderValue)> {
        let (name, value) = match self {
            Self::Header(name) => (
                HeaderName::from_static(name),
                HeaderValue::from_str(key.expose()),
            ),
            Self::Bearer => (
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key.expose())),
            ),
        };
        let mut value =
            value.map_err(|_| ApiError::configuration("API key contains invalid characters"))?;
        value.set_sensitive(true);
        Ok((name, value))
    }
}

/// State shared by every provider: the response cache and the limiters
#[derive(Debug, Clone)]
pub struct SharedResources {
    /// Response cache
    pub cache: Arc<TtlCache>,
    /// Rate limiters, one per upstream
    pub limiters: Arc<LimiterRegistry>,
    /// Fraction of each published budget actually used
    pub rate_limit_buffer: f64,
}

/// Relative request target: path segments plus ordered query parameters
///
/// Dynamic segments are percent-encoded when the URL is built; the query
/// string is form-encoded in insertion order and doubles as a cache key
/// component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    /// Start from a static path such as `/ordinals/v1/inscriptions`
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
            query: Vec::new(),
        }
    }

    /// Append a dynamic path segment
    #[must_use]
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter when a value is present
    #[must_use]
    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Form-encoded query string, empty when there are no parameters
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish()
    }

    fn resolve(&self, base: &Url) -> ApiResult<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::configuration(format!("base URL '{base}' cannot carry a path")))?
            .pop_if_empty()
            .extend(&self.segments);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

/// Raw upstream response
#[derive(Debug)]
struct Fetched {
    status: StatusCode,
    etag: Option<String>,
    content_type: Option<String>,
    body: Vec<u8>,
}

/// One upstream's request pipeline
#[derive(Debug)]
pub struct ProviderExecutor {
    upstream: Upstream,
    client: Client,
    base_url: Url,
    limiter: Arc<TokenBucket>,
    cache: Arc<TtlCache>,
    timeout: Duration,
    has_credential: bool,
}

impl ProviderExecutor {
    /// Build the pipeline for `upstream`
    ///
    /// The limiter is registered under the upstream's name in the shared
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the limiter cannot be registered
    /// or the HTTP client cannot be built.
    pub fn new(
        upstream: Upstream,
        auth: AuthScheme,
        settings: &ProviderSettings,
        shared: &SharedResources,
    ) -> ApiResult<Self> {
        let max_requests_per_minute = settings.effective_max_requests_per_minute(upstream);
        let limiter = shared
            .limiters
            .get(
                upstream.name(),
                max_requests_per_minute,
                shared.rate_limit_buffer,
            )
            .map_err(|e| ApiError::configuration(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &settings.api_key {
            let (name, value) = auth.header(key)?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("ordinals-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            upstream,
            client,
            base_url: settings.base_url.clone(),
            limiter,
            cache: Arc::clone(&shared.cache),
            timeout: settings.timeout,
            has_credential: settings.api_key.is_some(),
        })
    }

    /// Upstream served by this executor
    pub const fn upstream(&self) -> Upstream {
        self.upstream
    }

    /// Whether requests carry a credential
    pub const fn has_credential(&self) -> bool {
        self.has_credential
    }

    /// Current limiter and credential state
    pub fn status(&self) -> ProviderStatus {
        ProviderStatus {
            upstream: self.upstream,
            base_url: self.base_url.to_string(),
            credential_configured: self.has_credential,
            max_requests_per_minute: self.limiter.max_requests_per_minute(),
            available_tokens: self.limiter.available(),
        }
    }

    /// Fetch a JSON resource through the cache
    ///
    /// The body is returned as received; `T` is only its typed view.
    /// A fresh cache hit returns without touching the network or the limiter.
    /// On a miss the call waits for a rate-limit token, then:
    /// - 2xx: parses the body, caches it with its `ETag` and returns it
    /// - 429: returns the stale value if there is one (the expired entry
    ///   this call found, or one stored since), otherwise
    ///   [`ApiError::RateLimited`]
    /// - other statuses: [`ApiError::Http`] carrying the body, or the status
    ///   text when the body is empty
    ///
    /// # Errors
    ///
    /// See above; transport failures map to [`ApiError::Network`] or
    /// [`ApiError::Timeout`] and bodies that are not JSON to
    /// [`ApiError::InvalidResponse`].
    pub async fn get_json<T>(
        &self,
        endpoint: &Endpoint,
        cache_key: &str,
        ttl: Duration,
    ) -> ApiResult<Payload<T>> {
        let expired = match self.cache.lookup(cache_key) {
            Lookup::Fresh(hit) => return Ok(Payload::new(self.upstream, hit.value)),
            Lookup::Expired(value) => Some(value),
            Lookup::Missing => None,
        };

        self.limiter.wait().await;
        let fetched = self.fetch(endpoint).await?;

        if fetched.status.is_success() {
            let value: Value = serde_json::from_slice(&fetched.body).map_err(|e| {
                ApiError::InvalidResponse {
                    upstream: self.upstream,
                    message: e.to_string(),
                }
            })?;
            self.cache.set(cache_key, value.clone(), ttl, fetched.etag);
            return Ok(Payload::new(self.upstream, value));
        }

        if fetched.status == StatusCode::TOO_MANY_REQUESTS {
            let stale = match expired {
                Some(value) => {
                    self.cache.record_stale_hit();
                    Some(value)
                }
                None => self.cache.get_stale(cache_key),
            };
            if let Some(stale) = stale {
                warn!(
                    upstream = self.upstream.name(),
                    cache_key, "rate limited by upstream, serving stale cached value"
                );
                return Ok(Payload::new(self.upstream, stale));
            }
            warn!(upstream = self.upstream.name(), cache_key, "rate limited by upstream");
            return Err(ApiError::RateLimited {
                upstream: self.upstream,
            });
        }

        let body = String::from_utf8_lossy(&fetched.body).into_owned();
        let message = if body.is_empty() {
            status_text(fetched.status)
        } else {
            body
        };
        warn!(
            upstream = self.upstream.name(),
            status = fetched.status.as_u16(),
            cache_key,
            "upstream returned an error status"
        );
        Err(ApiError::Http {
            upstream: self.upstream,
            status: fetched.status.as_u16(),
            message,
        })
    }

    /// Fetch raw content without caching
    ///
    /// Always consumes a rate-limit token. Textual bodies (`text/*`, JSON and
    /// SVG) are returned verbatim; anything else becomes a base64 data URI.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::RateLimited`] on 429, [`ApiError::Http`] with the
    /// status text on any other non-2xx status, and transport errors as in
    /// [`Self::get_json`].
    pub async fn get_content(&self, endpoint: &Endpoint) -> ApiResult<InscriptionContent> {
        self.limiter.wait().await;
        let fetched = self.fetch(endpoint).await?;

        if fetched.status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited {
                upstream: self.upstream,
            });
        }
        if !fetched.status.is_success() {
            return Err(ApiError::Http {
                upstream: self.upstream,
                status: fetched.status.as_u16(),
                message: status_text(fetched.status),
            });
        }

        let content_type = fetched
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let data = if is_textual(&content_type) {
            String::from_utf8_lossy(&fetched.body).into_owned()
        } else {
            format!("data:{content_type};base64,{}", STANDARD.encode(&fetched.body))
        };

        Ok(InscriptionContent { content_type, data })
    }

    async fn fetch(&self, endpoint: &Endpoint) -> ApiResult<Fetched> {
        let url = endpoint.resolve(&self.base_url)?;
        debug!(upstream = self.upstream.name(), %url, "requesting upstream");

        match timeout(self.timeout, self.send(url)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    upstream = self.upstream.name(),
                    timeout_ms = self.timeout.as_millis(),
                    "upstream request timed out"
                );
                Err(ApiError::Timeout {
                    upstream: self.upstream,
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    async fn send(&self, url: Url) -> ApiResult<Fetched> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.network_error(&e))?;

        let status = response.status();
        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };
        let etag = header(ETAG);
        let content_type = header(CONTENT_TYPE);

        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) if status.is_success() => return Err(self.network_error(&e)),
            Err(_) => Vec::new(),
        };

        Ok(Fetched {
            status,
            etag,
            content_type,
            body,
        })
    }

    fn network_error(&self, error: &reqwest::Error) -> ApiError {
        warn!(upstream = self.upstream.name(), error = %error, "upstream request failed");
        ApiError::Network {
            upstream: self.upstream,
            message: error.to_string(),
        }
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| status.as_str().to_string(), str::to_owned)
}

fn is_textual(content_type: &str) -> bool {
    content_type.starts_with("text/") || content_type.contains("json") || content_type.contains("svg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_dynamic_segments() {
        let base = Url::parse("https://api.hiro.so").unwrap();
        let url = Endpoint::new("/runes/v1/etchings")
            .segment("UNCOMMON•GOODS")
            .resolve(&base)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.hiro.so/runes/v1/etchings/UNCOMMON%E2%80%A2GOODS"
        );

        let url = Endpoint::new("/v1/address")
            .segment("a/b")
            .resolve(&base)
            .unwrap();
        assert_eq!(url.path(), "/v1/address/a%2Fb");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let base = Url::parse("http://127.0.0.1:8080/proxy/").unwrap();
        let url = Endpoint::new("/v1/rune").segment("X").resolve(&base).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/proxy/v1/rune/X");
    }

    #[test]
    fn query_string_preserves_insertion_order() {
        let endpoint = Endpoint::new("/ordinals/v1/inscriptions")
            .query_opt("address", Some("bc1p x"))
            .query_opt("rarity", None::<&str>)
            .query("offset", 0)
            .query("limit", 20);
        assert_eq!(endpoint.query_string(), "address=bc1p+x&offset=0&limit=20");

        let url = endpoint
            .resolve(&Url::parse("https://api.hiro.so").unwrap())
            .unwrap();
        assert_eq!(url.query(), Some("address=bc1p+x&offset=0&limit=20"));
    }

    #[test]
    fn textual_content_types() {
        assert!(is_textual("text/plain;charset=utf-8"));
        assert!(is_textual("application/json"));
        assert!(is_textual("image/svg+xml"));
        assert!(!is_textual("image/png"));
        assert!(!is_textual(DEFAULT_CONTENT_TYPE));
    }

    #[test]
    fn settings_pick_rate_by_credential() {
        let settings = ProviderSettings::for_upstream(Upstream::Hiro).unwrap();
        assert_eq!(settings.effective_max_requests_per_minute(Upstream::Hiro), 50);

        let settings = settings.with_api_key(ApiKey::new("k").ok());
        assert_eq!(settings.effective_max_requests_per_minute(Upstream::Hiro), 500);
    }

    #[test]
    fn invalid_base_urls_are_configuration_errors() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(ApiError::Configuration { .. })
        ));
        assert!(matches!(
            parse_base_url("mailto:ops@example.com"),
            Err(ApiError::Configuration { .. })
        ));
    }
}
