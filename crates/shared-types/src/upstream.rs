// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Upstream data provider identifiers
//!
//! This module provides type-safe identifiers for the external Ordinals data
//! providers, together with their static connection defaults.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

/// Upstream providers queried for Bitcoin Ordinals metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
pub enum Upstream {
    /// Hiro Ordinals, BRC-20 and Runes API
    Hiro,
    /// Ordiscan API
    Ordiscan,
    /// Magic Eden Ordinals marketplace API
    MagicEden,
}

impl Upstream {
    /// Returns the machine name used in cache keys, limiter names and metrics
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hiro => "hiro",
            Self::Ordiscan => "ordiscan",
            Self::MagicEden => "magiceden",
        }
    }

    /// Returns the human-readable name used in error messages
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Hiro => "Hiro",
            Self::Ordiscan => "Ordiscan",
            Self::MagicEden => "Magic Eden",
        }
    }

    /// Returns the prefix used for this upstream's cache keys
    pub const fn cache_prefix(self) -> &'static str {
        match self {
            Self::Hiro => "hiro",
            Self::Ordiscan => "ordiscan",
            Self::MagicEden => "me",
        }
    }

    /// Returns the environment variable holding this upstream's API key
    pub const fn api_key_env(self) -> &'static str {
        match self {
            Self::Hiro => "HIRO_API_KEY",
            Self::Ordiscan => "ORDISCAN_API_KEY",
            Self::MagicEden => "MAGIC_EDEN_API_KEY",
        }
    }

    /// Returns the production base URL
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::Hiro => "https://api.hiro.so",
            Self::Ordiscan => "https://api.ordiscan.com",
            Self::MagicEden => "https://api-mainnet.magiceden.dev",
        }
    }

    /// Returns the default request budget per minute
    ///
    /// Authenticated tiers allow more traffic; Ordiscan is kept conservative
    /// for its free-tier daily limits either way.
    pub const fn default_max_requests_per_minute(self, has_api_key: bool) -> u32 {
        match (self, has_api_key) {
            (Self::Hiro, true) => 500,
            (Self::Hiro, false) => 50,
            (Self::Ordiscan, _) => 60,
            (Self::MagicEden, true) => 120,
            (Self::MagicEden, false) => 30,
        }
    }

    /// Returns all known upstreams
    pub const fn all() -> &'static [Self] {
        &[Self::Hiro, Self::Ordiscan, Self::MagicEden]
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Upstream {
    type Err = UpstreamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hiro" => Ok(Self::Hiro),
            "ordiscan" => Ok(Self::Ordiscan),
            "magiceden" | "magic-eden" | "magic_eden" | "me" => Ok(Self::MagicEden),
            _ => Err(UpstreamParseError(s.to_string())),
        }
    }
}

impl Serialize for Upstream {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Upstream {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Error type for upstream name parsing
#[derive(Debug, thiserror::Error)]
#[error("unknown upstream: {0}. Known upstreams are: hiro, ordiscan, magiceden")]
pub struct UpstreamParseError(pub String);
