// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Magic Eden Ordinals marketplace integration

use api_client::{ApiResult, Pagination, Payload, UpstreamClient};
use serde::{Deserialize, Serialize};
use shared_types::{ResourceKind, Upstream};

use crate::{AuthScheme, CacheKey, Endpoint, ProviderExecutor, ProviderSettings, SharedResources};

/// Active listing of a collection item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MeListing {
    pub id: String,
    pub token_id: Option<String>,
    pub inscription_id: Option<String>,
    /// Price in BTC
    pub price: f64,
    pub seller: Option<String>,
    pub collection_symbol: Option<String>,
    pub listed_at: Option<String>,
}

/// Aggregate marketplace statistics of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct MeCollectionStats {
    pub symbol: String,
    pub floor_price: Option<f64>,
    pub total_listed: Option<u64>,
    pub total_volume: Option<f64>,
    pub owners: Option<u64>,
    pub supply: Option<u64>,
}

/// Marketplace event of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MeActivity {
    /// Event kind such as `list`, `delist` or `buying_broadcasted`
    pub kind: String,
    pub token_inscription_id: Option<String>,
    pub collection_symbol: Option<String>,
    pub seller_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_address: Option<String>,
    pub price: Option<f64>,
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
}

/// Magic Eden API client
#[derive(Debug)]
pub struct MagicEdenClient {
    executor: ProviderExecutor,
}

impl MagicEdenClient {
    /// Create a client sharing the cache and limiters in `shared`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the limiter or HTTP client cannot be
    /// built.
    pub fn new(settings: &ProviderSettings, shared: &SharedResources) -> ApiResult<Self> {
        let executor =
            ProviderExecutor::new(Upstream::MagicEden, AuthScheme::Bearer, settings, shared)?;
        Ok(Self { executor })
    }

    /// Underlying request pipeline
    pub const fn executor(&self) -> &ProviderExecutor {
        &self.executor
    }

    /// Listed items of a collection
    pub async fn collection_listings(
        &self,
        symbol: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Vec<MeListing>>> {
        let endpoint = Endpoint::new("/v2/ord/btc/tokens")
            .query("collectionSymbol", symbol)
            .query("offset", page.offset)
            .query("limit", page.limit)
            .query("listed", true);
        let key = CacheKey::new(Upstream::MagicEden, "listings")
            .param(symbol)
            .param(page.offset)
            .param(page.limit);
        self.executor
            .get_json(&endpoint, key.as_str(), ResourceKind::Marketplace.ttl())
            .await
    }

    /// Floor price, volume and supply of a collection
    pub async fn collection_stats(&self, symbol: &str) -> ApiResult<Payload<MeCollectionStats>> {
        let endpoint = Endpoint::new("/v2/ord/btc/stat").query("collectionSymbol", symbol);
        let key = CacheKey::new(Upstream::MagicEden, "stats").param(symbol);
        self.executor
            .get_json(&endpoint, key.as_str(), ResourceKind::Marketplace.ttl())
            .await
    }

    /// Recent marketplace events of a collection
    pub async fn collection_activities(
        &self,
        symbol: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Vec<MeActivity>>> {
        let endpoint = Endpoint::new("/v2/ord/btc/activities")
            .query("collectionSymbol", symbol)
            .query("offset", page.offset)
            .query("limit", page.limit);
        let key = CacheKey::new(Upstream::MagicEden, "activity")
            .param(symbol)
            .param(page.offset)
            .param(page.limit);
        self.executor
            .get_json(&endpoint, key.as_str(), ResourceKind::Activity.ttl())
            .await
    }
}

impl UpstreamClient for MagicEdenClient {
    fn upstream(&self) -> Upstream {
        Upstream::MagicEden
    }

    fn has_credential(&self) -> bool {
        self.executor.has_credential()
    }
}
