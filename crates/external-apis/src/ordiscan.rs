// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Ordiscan API integration
//!
//! Ordiscan backs collections, rare sats, rune market data and transaction
//! lookups, and is the secondary source for inscriptions, runes and
//! balances. List endpoints return bare arrays.

use api_client::{ApiResult, Pagination, Payload, UpstreamClient};
use serde::{Deserialize, Serialize};
use shared_types::{ResourceKind, Upstream};

use crate::{AuthScheme, CacheKey, Endpoint, ProviderExecutor, ProviderSettings, SharedResources};

/// Inscription as reported by Ordiscan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct OrdiscanInscription {
    pub inscription_id: String,
    pub inscription_number: i64,
    pub content_type: Option<String>,
    pub owner_address: Option<String>,
    pub owner_output: Option<String>,
    pub sat: Option<u64>,
    pub rarity: Option<String>,
    pub genesis_transaction: Option<String>,
    pub genesis_block: Option<u64>,
    pub genesis_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_slug: Option<String>,
}

/// Rare sat held in one of an address's outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RareSatBalance {
    pub sat: u64,
    pub rarity: String,
    pub output: String,
    pub offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Collection details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct OrdiscanCollection {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub inscription_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_count: Option<u64>,
}

/// Rune as reported by Ordiscan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct OrdiscanRune {
    pub name: String,
    pub spaced_name: String,
    pub rune_number: u64,
    pub symbol: Option<String>,
    pub divisibility: u8,
    pub total_supply: Option<String>,
    pub minted: Option<String>,
    pub premine: Option<String>,
    pub etching_txid: Option<String>,
    pub etching_block: Option<u64>,
    #[serde(default)]
    pub turbo: bool,
}

/// Market data of a rune
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct OrdiscanRuneMarket {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_24h_usd: Option<f64>,
}

/// Rune balance of an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct OrdiscanRuneBalance {
    pub name: String,
    pub spaced_name: String,
    pub balance: String,
    pub symbol: Option<String>,
    pub divisibility: u8,
}

/// When a rune name becomes available for etching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RuneUnlockDate {
    pub name: String,
    pub unlock_block: u64,
    pub estimated_date: String,
}

/// BRC-20 balance of an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct OrdiscanBrc20Balance {
    pub tick: String,
    pub available_balance: String,
    pub transferrable_balance: String,
    pub overall_balance: String,
}

/// Rune movement inside a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct OrdiscanTxRune {
    pub name: String,
    pub spaced_name: String,
    pub amount: String,
    pub address: Option<String>,
    pub operation: String,
}

/// Collection trait of an inscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct InscriptionTrait {
    pub trait_type: String,
    pub value: String,
}

/// Ordiscan API client
#[derive(Debug)]
pub struct OrdiscanClient {
    executor: ProviderExecutor,
}

impl OrdiscanClient {
    /// Create a client sharing the cache and limiters in `shared`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the limiter or HTTP client cannot be
    /// built.
    pub fn new(settings: &ProviderSettings, shared: &SharedResources) -> ApiResult<Self> {
        let executor =
            ProviderExecutor::new(Upstream::Ordiscan, AuthScheme::Bearer, settings, shared)?;
        Ok(Self { executor })
    }

    /// Underlying request pipeline
    pub const fn executor(&self) -> &ProviderExecutor {
        &self.executor
    }

    fn key(resource: &str) -> CacheKey {
        CacheKey::new(Upstream::Ordiscan, resource)
    }

    async fn paged_list<T>(
        &self,
        endpoint: Endpoint,
        key: CacheKey,
        page: Pagination,
        kind: ResourceKind,
    ) -> ApiResult<Payload<Vec<T>>> {
        let endpoint = endpoint
            .query("offset", page.offset)
            .query("limit", page.limit);
        let key = key.param(page.offset).param(page.limit);
        self.executor
            .get_json(&endpoint, key.as_str(), kind.ttl())
            .await
    }

    /// Inscription by id or number
    pub async fn inscription(&self, id: &str) -> ApiResult<Payload<OrdiscanInscription>> {
        self.executor
            .get_json(
                &Endpoint::new("/v1/inscription").segment(id),
                Self::key("inscription").param(id).as_str(),
                ResourceKind::InscriptionMeta.ttl(),
            )
            .await
    }

    /// Inscriptions owned by an address
    pub async fn address_inscriptions(
        &self,
        address: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Vec<OrdiscanInscription>>> {
        self.paged_list(
            Endpoint::new("/v1/address")
                .segment(address)
                .segment("inscriptions"),
            Self::key("addrinsc").param(address),
            page,
            ResourceKind::Balance,
        )
        .await
    }

    /// Rare sats held by an address
    pub async fn address_rare_sats(
        &self,
        address: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Vec<RareSatBalance>>> {
        self.paged_list(
            Endpoint::new("/v1/address")
                .segment(address)
                .segment("rare-sats"),
            Self::key("raresats").param(address),
            page,
            ResourceKind::Balance,
        )
        .await
    }

    /// Collection details by slug
    pub async fn collection(&self, slug: &str) -> ApiResult<Payload<OrdiscanCollection>> {
        self.executor
            .get_json(
                &Endpoint::new("/v1/collection").segment(slug),
                Self::key("collection").param(slug).as_str(),
                ResourceKind::CollectionInfo.ttl(),
            )
            .await
    }

    /// Inscriptions belonging to a collection
    pub async fn collection_inscriptions(
        &self,
        slug: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Vec<OrdiscanInscription>>> {
        self.paged_list(
            Endpoint::new("/v1/collection")
                .segment(slug)
                .segment("inscriptions"),
            Self::key("collinsc").param(slug),
            page,
            ResourceKind::CollectionInfo,
        )
        .await
    }

    /// Rune by name
    pub async fn rune(&self, name: &str) -> ApiResult<Payload<OrdiscanRune>> {
        self.executor
            .get_json(
                &Endpoint::new("/v1/rune").segment(name),
                Self::key("rune").param(name).as_str(),
                ResourceKind::RuneEtching.ttl(),
            )
            .await
    }

    /// Market data of a rune
    pub async fn rune_market(&self, name: &str) -> ApiResult<Payload<OrdiscanRuneMarket>> {
        self.executor
            .get_json(
                &Endpoint::new("/v1/rune").segment(name).segment("market"),
                Self::key("runemarket").param(name).as_str(),
                ResourceKind::Marketplace.ttl(),
            )
            .await
    }

    /// Rune balances of an address
    pub async fn address_runes(
        &self,
        address: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Vec<OrdiscanRuneBalance>>> {
        self.paged_list(
            Endpoint::new("/v1/address").segment(address).segment("runes"),
            Self::key("addrrunes").param(address),
            page,
            ResourceKind::Balance,
        )
        .await
    }

    /// Unlock height and estimated date of a rune name
    pub async fn rune_unlock_date(&self, name: &str) -> ApiResult<Payload<RuneUnlockDate>> {
        self.executor
            .get_json(
                &Endpoint::new("/v1/rune/unlock").segment(name),
                Self::key("runeunlock").param(name).as_str(),
                ResourceKind::Static.ttl(),
            )
            .await
    }

    /// BRC-20 balances of an address
    pub async fn address_brc20(
        &self,
        address: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Vec<OrdiscanBrc20Balance>>> {
        self.paged_list(
            Endpoint::new("/v1/address").segment(address).segment("brc20"),
            Self::key("addrbrc20").param(address),
            page,
            ResourceKind::Balance,
        )
        .await
    }

    /// Inscriptions created in a transaction
    pub async fn tx_inscriptions(
        &self,
        txid: &str,
    ) -> ApiResult<Payload<Vec<OrdiscanInscription>>> {
        self.executor
            .get_json(
                &Endpoint::new("/v1/tx").segment(txid).segment("inscriptions"),
                Self::key("txinsc").param(txid).as_str(),
                ResourceKind::InscriptionMeta.ttl(),
            )
            .await
    }

    /// Rune movements in a transaction
    pub async fn tx_runes(&self, txid: &str) -> ApiResult<Payload<Vec<OrdiscanTxRune>>> {
        self.executor
            .get_json(
                &Endpoint::new("/v1/tx").segment(txid).segment("runes"),
                Self::key("txrunes").param(txid).as_str(),
                ResourceKind::InscriptionMeta.ttl(),
            )
            .await
    }

    /// Collection traits of an inscription
    pub async fn inscription_traits(&self, id: &str) -> ApiResult<Payload<Vec<InscriptionTrait>>> {
        self.executor
            .get_json(
                &Endpoint::new("/v1/inscription").segment(id).segment("traits"),
                Self::key("traits").param(id).as_str(),
                ResourceKind::Static.ttl(),
            )
            .await
    }
}

impl UpstreamClient for OrdiscanClient {
    fn upstream(&self) -> Upstream {
        Upstream::Ordiscan
    }

    fn has_credential(&self) -> bool {
        self.executor.has_credential()
    }
}
