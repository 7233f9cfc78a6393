// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Health snapshot types for upstream providers

use serde::{Deserialize, Serialize};
use shared_types::Upstream;
use utoipa::ToSchema;

/// Point-in-time view of one upstream provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProviderStatus {
    /// Which upstream this status describes
    pub upstream: Upstream,
    /// Base URL requests are sent to
    pub base_url: String,
    /// Whether an API key is configured
    pub credential_configured: bool,
    /// Configured request budget per minute, before the safety buffer
    pub max_requests_per_minute: u32,
    /// Tokens currently available in the limiter
    pub available_tokens: f64,
}

impl ProviderStatus {
    /// Whether a call right now would proceed without waiting on the limiter
    pub fn has_capacity(&self) -> bool {
        self.available_tokens >= 1.0
    }

    /// Human-readable summary of the status
    pub fn description(&self) -> String {
        let credential = if self.credential_configured {
            "authenticated"
        } else {
            "anonymous"
        };
        format!(
            "{} ({credential}, {:.1} tokens available)",
            self.upstream, self.available_tokens
        )
    }
}
