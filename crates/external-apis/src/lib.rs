// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! External API integrations for Bitcoin Ordinals data providers
//!
//! This crate provides clients for the Hiro, Ordiscan and Magic Eden APIs on
//! top of a shared resource-governance layer, plus the registry that owns
//! them and orchestrates multi-provider fallback.
//!
//! # Architecture
//!
//! - **Client Implementations**: [`hiro`], [`ordiscan`], [`magic_eden`] - path and cache-key builders
//! - **Request Pipeline**: [`executor::ProviderExecutor`] - cache, rate limit, HTTP, status handling
//! - **Resource Governance**: [`cache::TtlCache`] and [`rate_limit::TokenBucket`]
//! - **Fallback**: [`fallback::with_fallback`] - credential-gated primary/secondary sequencing
//! - **Registry Pattern**: [`registry::ProviderRegistry`] - owns clients, cache and limiters
//! - **Credentials**: [`credential::ApiKey`] - non-empty, redacted API keys
//!
//! # Features
//!
//! - **Stale Reads**: a 429 from an upstream is answered from the last cached value when possible
//! - **Fair Waiting**: rate-limited callers are served in arrival order
//! - **Typed Errors**: every failure names the upstream that produced it
//! - **Testing Support**: wiremock-based integration tests for every pipeline branch

pub mod cache;
pub mod credential;
pub mod executor;
pub mod fallback;
pub mod hiro;
pub mod magic_eden;
pub mod ordiscan;
pub mod rate_limit;
pub mod registry;

pub use cache::{CacheKey, CacheStats, CachedValue, Lookup, TtlCache};
pub use credential::{ApiKey, EmptyApiKey};
pub use executor::{
    AuthScheme, DEFAULT_TIMEOUT, Endpoint, ProviderExecutor, ProviderSettings, SharedResources,
    parse_base_url,
};
pub use fallback::with_fallback;
pub use hiro::HiroClient;
pub use magic_eden::MagicEdenClient;
pub use ordiscan::OrdiscanClient;
pub use rate_limit::{LimiterRegistry, RateLimitError, TokenBucket};
pub use registry::{ProviderRegistry, RegistrySettings};
