// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider registry owning every upstream client and their shared state
//!
//! The registry is built once at startup and handed to the action layer.
//! It owns the response cache and the limiter registry, so independent
//! registries (for example in tests) never share rate-limit budgets.

use std::sync::Arc;

use api_client::{ApiResult, Page, Pagination, Payload, ProviderStatus, Sourced};
use shared_types::Upstream;
use tracing::info;

use crate::{
    CacheStats, HiroClient, LimiterRegistry, MagicEdenClient, OrdiscanClient, ProviderSettings,
    SharedResources, TtlCache,
    cache::DEFAULT_MAX_ENTRIES,
    fallback::with_fallback,
    hiro::{Brc20Balance, InscriptionMeta, InscriptionQuery, RuneBalance, RuneEtching},
    ordiscan::{OrdiscanBrc20Balance, OrdiscanInscription, OrdiscanRune, OrdiscanRuneBalance},
    rate_limit::DEFAULT_RATE_LIMIT_BUFFER,
};

/// Inscription from either provider
pub type AnyInscription = Sourced<Payload<InscriptionMeta>, Payload<OrdiscanInscription>>;
/// Address inscriptions from either provider
pub type AnyAddressInscriptions =
    Sourced<Payload<Page<InscriptionMeta>>, Payload<Vec<OrdiscanInscription>>>;
/// BRC-20 balances from either provider
pub type AnyBrc20Balances =
    Sourced<Payload<Page<Brc20Balance>>, Payload<Vec<OrdiscanBrc20Balance>>>;
/// Rune balances from either provider
pub type AnyRuneBalances =
    Sourced<Payload<Page<RuneBalance>>, Payload<Vec<OrdiscanRuneBalance>>>;
/// Rune details from either provider
pub type AnyRune = Sourced<Payload<RuneEtching>, Payload<OrdiscanRune>>;

/// Settings for every provider plus the shared cache and limiter tuning
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Hiro settings
    pub hiro: ProviderSettings,
    /// Ordiscan settings
    pub ordiscan: ProviderSettings,
    /// Magic Eden settings
    pub magic_eden: ProviderSettings,
    /// Fraction of each published budget actually used
    pub rate_limit_buffer: f64,
    /// Maximum number of cached responses
    pub cache_max_entries: usize,
}

impl RegistrySettings {
    /// Production endpoints, no credentials, default tuning
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a built-in base URL does not parse.
    pub fn defaults() -> ApiResult<Self> {
        Ok(Self {
            hiro: ProviderSettings::for_upstream(Upstream::Hiro)?,
            ordiscan: ProviderSettings::for_upstream(Upstream::Ordiscan)?,
            magic_eden: ProviderSettings::for_upstream(Upstream::MagicEden)?,
            rate_limit_buffer: DEFAULT_RATE_LIMIT_BUFFER,
            cache_max_entries: DEFAULT_MAX_ENTRIES,
        })
    }

    /// Settings of one provider
    pub const fn provider(&self, upstream: Upstream) -> &ProviderSettings {
        match upstream {
            Upstream::Hiro => &self.hiro,
            Upstream::Ordiscan => &self.ordiscan,
            Upstream::MagicEden => &self.magic_eden,
        }
    }
}

/// Owner of the upstream clients, the cache and the limiters
#[derive(Debug)]
pub struct ProviderRegistry {
    cache: Arc<TtlCache>,
    limiters: Arc<LimiterRegistry>,
    hiro: HiroClient,
    ordiscan: OrdiscanClient,
    magic_eden: MagicEdenClient,
}

impl ProviderRegistry {
    /// Build every client from `settings`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a limiter or HTTP client cannot be
    /// built.
    pub fn new(settings: &RegistrySettings) -> ApiResult<Self> {
        let shared = SharedResources {
            cache: Arc::new(TtlCache::new(settings.cache_max_entries)),
            limiters: Arc::new(LimiterRegistry::new()),
            rate_limit_buffer: settings.rate_limit_buffer,
        };

        let registry = Self {
            hiro: HiroClient::new(&settings.hiro, &shared)?,
            ordiscan: OrdiscanClient::new(&settings.ordiscan, &shared)?,
            magic_eden: MagicEdenClient::new(&settings.magic_eden, &shared)?,
            cache: shared.cache,
            limiters: shared.limiters,
        };

        for status in registry.provider_status() {
            info!(
                upstream = status.upstream.name(),
                base_url = %status.base_url,
                credential_configured = status.credential_configured,
                max_requests_per_minute = status.max_requests_per_minute,
                "configured upstream provider"
            );
        }

        Ok(registry)
    }

    /// Hiro client
    pub const fn hiro(&self) -> &HiroClient {
        &self.hiro
    }

    /// Ordiscan client
    pub const fn ordiscan(&self) -> &OrdiscanClient {
        &self.ordiscan
    }

    /// Magic Eden client
    pub const fn magic_eden(&self) -> &MagicEdenClient {
        &self.magic_eden
    }

    /// Shared response cache
    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// Number of registered rate limiters
    pub fn limiter_count(&self) -> usize {
        self.limiters.len()
    }

    /// Inscription metadata, Hiro first, then Ordiscan
    pub async fn inscription(&self, id: &str) -> ApiResult<AnyInscription> {
        with_fallback(
            &self.hiro,
            &self.ordiscan,
            self.hiro.inscription(id),
            self.ordiscan.inscription(id),
        )
        .await
    }

    /// Inscriptions owned by an address, Hiro search first, then Ordiscan
    pub async fn address_inscriptions(
        &self,
        address: &str,
        page: Pagination,
    ) -> ApiResult<AnyAddressInscriptions> {
        let query = InscriptionQuery::for_address(address, page);
        with_fallback(
            &self.hiro,
            &self.ordiscan,
            self.hiro.search_inscriptions(&query),
            self.ordiscan.address_inscriptions(address, page),
        )
        .await
    }

    /// BRC-20 balances of an address, Hiro first, then Ordiscan
    pub async fn brc20_balances(
        &self,
        address: &str,
        page: Pagination,
    ) -> ApiResult<AnyBrc20Balances> {
        with_fallback(
            &self.hiro,
            &self.ordiscan,
            self.hiro.brc20_balances(address, page),
            self.ordiscan.address_brc20(address, page),
        )
        .await
    }

    /// Rune balances of an address, Hiro first, then Ordiscan
    pub async fn rune_balances(
        &self,
        address: &str,
        page: Pagination,
    ) -> ApiResult<AnyRuneBalances> {
        with_fallback(
            &self.hiro,
            &self.ordiscan,
            self.hiro.rune_balances(address, page),
            self.ordiscan.address_runes(address, page),
        )
        .await
    }

    /// Rune details, Hiro first, then Ordiscan
    pub async fn rune(&self, name: &str) -> ApiResult<AnyRune> {
        with_fallback(
            &self.hiro,
            &self.ordiscan,
            self.hiro.rune(name),
            self.ordiscan.rune(name),
        )
        .await
    }

    /// Status of every provider
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        vec![
            self.hiro.executor().status(),
            self.ordiscan.executor().status(),
            self.magic_eden.executor().status(),
        ]
    }

    /// Cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use crate::ApiKey;

    use super::*;

    #[test]
    fn registry_registers_one_limiter_per_upstream() {
        let registry = ProviderRegistry::new(&RegistrySettings::defaults().unwrap()).unwrap();
        assert_eq!(registry.limiter_count(), 3);
        assert!(registry.cache().is_empty());

        let status = registry.provider_status();
        assert_eq!(status.len(), 3);
        assert!(status.iter().all(|s| !s.credential_configured));
        assert_eq!(status[0].max_requests_per_minute, 50);
        assert!((status[0].available_tokens - 40.0).abs() < 1e-6);
    }

    #[test]
    fn credentials_raise_default_budgets() {
        let mut settings = RegistrySettings::defaults().unwrap();
        settings.hiro = settings.hiro.with_api_key(ApiKey::new("h").ok());
        settings.magic_eden = settings.magic_eden.with_api_key(ApiKey::new("m").ok());

        let registry = ProviderRegistry::new(&settings).unwrap();
        let rpm: Vec<u32> = registry
            .provider_status()
            .iter()
            .map(|s| s.max_requests_per_minute)
            .collect();
        assert_eq!(rpm, vec![500, 60, 120]);
    }

    #[test]
    fn invalid_buffer_is_a_configuration_error() {
        let mut settings = RegistrySettings::defaults().unwrap();
        settings.rate_limit_buffer = 0.0;
        assert!(matches!(
            ProviderRegistry::new(&settings),
            Err(api_client::ApiError::Configuration { .. })
        ));
    }
}
