// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the Ordinals API server:
//! configuration, the provider registry, and coordinated cancellation.

use std::sync::Arc;

use api_client::ProviderStatus;
use external_apis::{CacheStats, ProviderRegistry};
use serde::{Deserialize, Serialize};
use shared_types::Upstream;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::config::{Environment, ServerConfig};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    /// Provider clients, cache and limiters
    pub registry: Arc<ProviderRegistry>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `registry` - Provider registry shared by every request
    /// * `cancellation_token` - Token for coordinated cancellation
    pub fn new(
        config: ServerConfig,
        registry: Arc<ProviderRegistry>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            registry,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Snapshot of service, provider and cache health
    ///
    /// The service is degraded when neither inscription provider has a
    /// credential, since most actions then fail before reaching the network.
    pub fn health_check(&self) -> HealthCheck {
        let providers = self.registry.provider_status();

        let inscription_sources = providers.iter().filter(|status| {
            matches!(status.upstream, Upstream::Hiro | Upstream::Ordiscan)
                && status.credential_configured
        });
        let status = if inscription_sources.count() == 0 {
            HealthStatus::Degraded {
                reason: "no Hiro or Ordiscan API key configured".into(),
            }
        } else {
            HealthStatus::Up
        };

        HealthCheck {
            status,
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            providers,
            cache: self.registry.cache_stats(),
        }
    }
}

/// Health status of the service
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Service is fully operational
    Up,

    /// Service is running but cannot answer most actions
    Degraded {
        /// Human-readable explanation of the degradation condition
        reason: Box<str>,
    },
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Credential and rate-limit state of every upstream
    pub providers: Vec<ProviderStatus>,
    /// Response cache counters
    pub cache: CacheStats,
}

#[cfg(test)]
mod tests {
    use external_apis::{ApiKey, RegistrySettings};

    use super::*;

    fn state_with(settings: &RegistrySettings) -> ServerState {
        ServerState::new(
            ServerConfig::for_testing(),
            Arc::new(ProviderRegistry::new(settings).unwrap()),
            CancellationToken::new(),
        )
    }

    #[test]
    fn server_state_with_cancellation_token() {
        let token = CancellationToken::new();
        let state = ServerState::new(
            ServerConfig::for_testing(),
            Arc::new(ProviderRegistry::new(&RegistrySettings::defaults().unwrap()).unwrap()),
            token.clone(),
        );

        assert!(!state.cancellation_token.is_cancelled());
        token.cancel();
        assert!(state.cancellation_token.is_cancelled());
    }

    #[test]
    fn health_is_degraded_without_inscription_credentials() {
        let mut settings = RegistrySettings::defaults().unwrap();
        settings.magic_eden.api_key = ApiKey::new("me").ok();

        let health = state_with(&settings).health_check();
        assert!(matches!(health.status, HealthStatus::Degraded { .. }));
        assert_eq!(health.environment, Environment::Testing);
        assert_eq!(health.providers.len(), 3);
        assert_eq!(health.cache.entries, 0);
    }

    #[test]
    fn health_is_up_with_one_inscription_credential() {
        let mut settings = RegistrySettings::defaults().unwrap();
        settings.ordiscan.api_key = ApiKey::new("ord").ok();

        let health = state_with(&settings).health_check();
        assert_eq!(health.status, HealthStatus::Up);

        let ordiscan = health
            .providers
            .iter()
            .find(|status| status.upstream == Upstream::Ordiscan)
            .unwrap();
        assert!(ordiscan.credential_configured);
    }
}
