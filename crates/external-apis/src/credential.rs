// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Upstream API credentials
//!
//! [`ApiKey`] guarantees the wrapped key is non-empty, so "configured" and
//! "present" mean the same thing everywhere a credential gates behavior.
//! An empty environment variable therefore counts as not configured.
//!
//! ```rust
//! use external_apis::ApiKey;
//!
//! assert!(ApiKey::new("secret").is_ok());
//! assert!(ApiKey::new("   ").is_err());
//! assert!(ApiKey::from_optional(Some(String::new())).is_none());
//! ```

use core::fmt;
use std::str::FromStr;

/// Non-empty API key whose `Debug` output never reveals the secret
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(Box<str>);

/// Error returned when an API key is empty or whitespace-only
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("API key cannot be empty or whitespace-only")]
pub struct EmptyApiKey;

impl ApiKey {
    /// Wrap a key, rejecting empty and whitespace-only strings
    pub fn new(key: impl Into<String>) -> Result<Self, EmptyApiKey> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            Err(EmptyApiKey)
        } else {
            Ok(Self(trimmed.into()))
        }
    }

    /// Convert an optional raw value, treating empty strings as absent
    pub fn from_optional(key: Option<String>) -> Option<Self> {
        key.and_then(|key| Self::new(key).ok())
    }

    /// Borrow the secret for use in a request header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl FromStr for ApiKey {
    type Err = EmptyApiKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
