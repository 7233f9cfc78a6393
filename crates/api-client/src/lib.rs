// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared abstractions for Ordinals data provider clients
//!
//! This crate holds the pieces every upstream integration agrees on, so that
//! the provider implementations and the action layer can depend on them
//! without depending on each other.
//!
//! # Core Abstractions
//!
//! - **`UpstreamClient` Trait**: identity and credential presence of a provider client
//! - **Error Handling**: `ApiError`, one variant per failure class, every message naming its upstream
//! - **Data Types**: pagination envelopes, raw inscription content and fallback results
//! - **Health**: per-provider status snapshots for the health endpoint

use shared_types::Upstream;
use thiserror::Error;

pub mod health;
pub mod types;

pub use health::*;
pub use types::*;

/// Result alias used by every provider call
pub type ApiResult<T> = Result<T, ApiError>;

/// Common interface of the upstream provider clients
///
/// Credential presence, not observed health, decides whether the fallback
/// orchestrator attempts a provider at all.
pub trait UpstreamClient: Send + Sync {
    /// Which upstream this client talks to
    fn upstream(&self) -> Upstream;

    /// Whether an API key was configured for this client
    fn has_credential(&self) -> bool;
}

/// Errors surfaced by provider calls and input validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    /// Caller supplied arguments that failed validation
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Upstream answered 429 and no cached copy was available
    #[error("{upstream} API 429: Rate limited")]
    RateLimited { upstream: Upstream },

    /// Upstream answered with a non-success status
    #[error("{upstream} API {status}: {message}")]
    Http {
        upstream: Upstream,
        status: u16,
        message: String,
    },

    /// Transport-level failure before a response was received
    #[error("{upstream} API request failed: {message}")]
    Network { upstream: Upstream, message: String },

    /// Upstream did not answer within the configured deadline
    #[error("{upstream} API request timed out after {timeout_ms} ms")]
    Timeout { upstream: Upstream, timeout_ms: u64 },

    /// Response body did not match the expected shape
    #[error("{upstream} API returned an invalid response: {message}")]
    InvalidResponse { upstream: Upstream, message: String },

    /// Neither provider of a fallback pair has a credential
    #[error(
        "No API key configured. Set {} or {}.",
        primary.api_key_env(),
        secondary.api_key_env()
    )]
    NoCredential {
        primary: Upstream,
        secondary: Upstream,
    },

    /// Client or limiter construction failed
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ApiError {
    /// Build a validation error from any message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Build a configuration error from any message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Upstream that produced this error, when there is exactly one
    pub fn upstream(&self) -> Option<Upstream> {
        match self {
            Self::RateLimited { upstream }
            | Self::Http { upstream, .. }
            | Self::Network { upstream, .. }
            | Self::Timeout { upstream, .. }
            | Self::InvalidResponse { upstream, .. } => Some(*upstream),
            Self::Validation { .. } | Self::NoCredential { .. } | Self::Configuration { .. } => {
                None
            }
        }
    }

    /// Short machine-readable label, used as a metrics dimension
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::RateLimited { .. } => "rate_limited",
            Self::Http { .. } => "http",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::NoCredential { .. } => "no_credential",
            Self::Configuration { .. } => "configuration",
        }
    }
}
