// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Hiro Ordinals, BRC-20 and Runes API integration
//!
//! Hiro is the primary source for inscription metadata, sat details, BRC-20
//! and rune data. Every list endpoint returns a [`Page`] envelope.

use api_client::{ApiResult, InscriptionContent, Page, Pagination, Payload, UpstreamClient};
use serde::{Deserialize, Serialize};
use shared_types::{Brc20Operation, ResourceKind, SatRarity, Upstream};

use crate::{AuthScheme, CacheKey, Endpoint, ProviderExecutor, ProviderSettings, SharedResources};

/// Header carrying the Hiro API key
pub const HIRO_API_KEY_HEADER: &str = "x-hiro-api-key";

/// Inscription metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct InscriptionMeta {
    pub id: String,
    pub number: i64,
    pub address: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub genesis_address: Option<String>,
    pub genesis_block_height: Option<u64>,
    pub genesis_block_hash: Option<String>,
    pub genesis_tx_id: Option<String>,
    pub genesis_fee: Option<String>,
    pub genesis_timestamp: Option<i64>,
    pub tx_id: Option<String>,
    pub location: Option<String>,
    pub output: Option<String>,
    pub value: Option<String>,
    pub offset: Option<String>,
    pub sat_ordinal: Option<String>,
    pub sat_rarity: Option<String>,
    pub sat_coinbase_height: Option<u64>,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub recursive: bool,
    pub recursion_refs: Option<Vec<String>>,
    pub timestamp: Option<i64>,
    pub curse_type: Option<String>,
}

/// One ownership change of an inscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Transfer {
    pub block_height: u64,
    pub block_hash: Option<String>,
    pub address: Option<String>,
    pub tx_id: String,
    pub location: Option<String>,
    pub output: Option<String>,
    pub value: Option<String>,
    pub offset: Option<String>,
    pub timestamp: Option<i64>,
}

/// Ordinal-theory details of a single satoshi
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SatInfo {
    pub coinbase_height: u64,
    pub cycle: u64,
    pub decimal: String,
    pub degree: String,
    pub inscription_id: Option<String>,
    pub epoch: u64,
    pub name: String,
    pub offset: u64,
    pub percentile: String,
    pub period: u64,
    pub rarity: String,
}

/// BRC-20 token lookup: deployment plus current supply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Brc20TokenDetails {
    pub token: Brc20Token,
    pub supply: Brc20Supply,
}

/// Supply counters of a BRC-20 token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Brc20Supply {
    pub max_supply: String,
    pub minted_supply: String,
    pub holders: u64,
}

/// BRC-20 token deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Brc20Token {
    pub id: String,
    pub number: i64,
    pub block_height: u64,
    pub tx_id: String,
    pub address: String,
    pub ticker: String,
    pub max_supply: String,
    pub mint_limit: Option<String>,
    pub decimals: u8,
    pub deploy_timestamp: i64,
    pub minted_supply: String,
    pub tx_count: u64,
}

/// BRC-20 balance of an address for one ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Brc20Balance {
    pub ticker: String,
    pub available_balance: String,
    pub transferrable_balance: String,
    pub overall_balance: String,
}

/// Parameters of a BRC-20 deploy operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Brc20DeployDetails {
    pub max_supply: String,
    pub mint_limit: Option<String>,
    pub decimals: u8,
}

/// Amount of a BRC-20 mint operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Brc20MintDetails {
    pub amount: String,
}

/// Amount and sender of a BRC-20 transfer operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Brc20TransferDetails {
    pub amount: String,
    pub from_address: String,
}

/// One BRC-20 event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Brc20Activity {
    pub operation: String,
    pub ticker: String,
    pub inscription_id: String,
    pub block_height: u64,
    pub block_hash: Option<String>,
    pub tx_id: String,
    pub address: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy: Option<Brc20DeployDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mint: Option<Brc20MintDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<Brc20TransferDetails>,
}

/// Holder of a BRC-20 token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Brc20Holder {
    pub address: String,
    pub overall_balance: String,
}

/// Supply counters of a rune
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RuneSupply {
    pub current: String,
    pub minted: String,
    pub mint_percentage: String,
    pub mintable: bool,
    pub burned: String,
    pub premine: String,
    pub total_mints: String,
    pub total_burns: String,
}

/// Open-mint terms of a rune
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RuneMintTerms {
    pub amount: Option<String>,
    pub cap: Option<String>,
    pub height_start: Option<u64>,
    pub height_end: Option<u64>,
    pub offset_start: Option<u64>,
    pub offset_end: Option<u64>,
}

/// Rune etching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RuneEtching {
    pub id: String,
    pub name: String,
    pub spaced_name: String,
    pub number: u64,
    pub block_height: Option<u64>,
    pub tx_index: Option<u64>,
    pub tx_id: Option<String>,
    pub divisibility: u8,
    pub premine: Option<String>,
    pub symbol: String,
    #[serde(default)]
    pub turbo: bool,
    pub supply: Option<RuneSupply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mint_terms: Option<RuneMintTerms>,
    #[serde(default)]
    pub cenotaph: bool,
    pub timestamp: Option<i64>,
}

/// Short reference to a rune embedded in balances and activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RuneRef {
    pub id: String,
    pub name: String,
    pub spaced_name: String,
}

/// Rune balance of an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RuneBalance {
    pub rune: RuneRef,
    pub address: Option<String>,
    pub balance: String,
}

/// Holder of a rune
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RuneHolder {
    pub address: String,
    pub balance: String,
}

/// One rune event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RuneActivity {
    pub rune: RuneRef,
    pub address: Option<String>,
    pub receiver_address: Option<String>,
    pub amount: Option<String>,
    pub operation: String,
    pub block_height: Option<u64>,
    pub tx_index: Option<u64>,
    pub tx_id: Option<String>,
    pub output: Option<String>,
    pub timestamp: Option<i64>,
}

/// Inscription counts per block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct InscriptionStats {
    pub count: u64,
    pub count_accum: u64,
}

/// Filters of the inscription search endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct InscriptionQuery {
    pub address: Option<String>,
    pub mime_type: Option<String>,
    pub rarity: Option<SatRarity>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub from_number: Option<i64>,
    pub to_number: Option<i64>,
    pub recursive: Option<bool>,
    pub cursed: Option<bool>,
    pub page: Pagination,
}

impl InscriptionQuery {
    /// Query for every inscription owned by `address`
    pub fn for_address(address: impl Into<String>, page: Pagination) -> Self {
        Self {
            address: Some(address.into()),
            page,
            ..Self::default()
        }
    }

    fn endpoint(&self) -> Endpoint {
        Endpoint::new("/ordinals/v1/inscriptions")
            .query_opt("address", self.address.as_deref())
            .query_opt("mime_type", self.mime_type.as_deref())
            .query_opt("rarity", self.rarity)
            .query_opt("from_block_height", self.from_block)
            .query_opt("to_block_height", self.to_block)
            .query_opt("from_number", self.from_number)
            .query_opt("to_number", self.to_number)
            .query_opt("recursive", self.recursive)
            .query_opt("cursed", self.cursed)
            .query("offset", self.page.offset)
            .query("limit", self.page.limit)
    }
}

/// Filters of the BRC-20 activity endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Brc20ActivityQuery {
    pub ticker: Option<String>,
    pub address: Option<String>,
    pub operation: Option<Brc20Operation>,
    pub page: Pagination,
}

impl Brc20ActivityQuery {
    fn endpoint(&self) -> Endpoint {
        Endpoint::new("/ordinals/v1/brc-20/activity")
            .query_opt("ticker", self.ticker.as_deref())
            .query_opt("address", self.address.as_deref())
            .query_opt("operation", self.operation)
            .query("offset", self.page.offset)
            .query("limit", self.page.limit)
    }
}

fn paged(endpoint: Endpoint, page: Pagination) -> Endpoint {
    endpoint.query("offset", page.offset).query("limit", page.limit)
}

fn paged_key(key: CacheKey, page: Pagination) -> CacheKey {
    key.param(page.offset).param(page.limit)
}

/// Hiro API client
#[derive(Debug)]
pub struct HiroClient {
    executor: ProviderExecutor,
}

impl HiroClient {
    /// Create a client sharing the cache and limiters in `shared`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the limiter or HTTP client cannot be
    /// built.
    pub fn new(settings: &ProviderSettings, shared: &SharedResources) -> ApiResult<Self> {
        let executor = ProviderExecutor::new(
            Upstream::Hiro,
            AuthScheme::Header(HIRO_API_KEY_HEADER),
            settings,
            shared,
        )?;
        Ok(Self { executor })
    }

    /// Underlying request pipeline
    pub const fn executor(&self) -> &ProviderExecutor {
        &self.executor
    }

    fn key(resource: &str) -> CacheKey {
        CacheKey::new(Upstream::Hiro, resource)
    }

    /// Inscription metadata by id or number
    pub async fn inscription(&self, id: &str) -> ApiResult<Payload<InscriptionMeta>> {
        self.executor
            .get_json(
                &Endpoint::new("/ordinals/v1/inscriptions").segment(id),
                Self::key("inscription").param(id).as_str(),
                ResourceKind::InscriptionMeta.ttl(),
            )
            .await
    }

    /// Filtered inscription listing
    pub async fn search_inscriptions(
        &self,
        query: &InscriptionQuery,
    ) -> ApiResult<Payload<Page<InscriptionMeta>>> {
        let endpoint = query.endpoint();
        let key = Self::key("inscriptions").param(endpoint.query_string());
        self.executor
            .get_json(&endpoint, key.as_str(), ResourceKind::InscriptionMeta.ttl())
            .await
    }

    /// Raw inscription content, never cached
    pub async fn inscription_content(&self, id: &str) -> ApiResult<InscriptionContent> {
        self.executor
            .get_content(
                &Endpoint::new("/ordinals/v1/inscriptions")
                    .segment(id)
                    .segment("content"),
            )
            .await
    }

    /// Transfer history of an inscription
    pub async fn inscription_transfers(
        &self,
        id: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Page<Transfer>>> {
        let endpoint = Endpoint::new("/ordinals/v1/inscriptions")
            .segment(id)
            .segment("transfers");
        self.executor
            .get_json(
                &paged(endpoint, page),
                paged_key(Self::key("transfers").param(id), page).as_str(),
                ResourceKind::Activity.ttl(),
            )
            .await
    }

    /// Sat details by ordinal number
    pub async fn sat(&self, ordinal: &str) -> ApiResult<Payload<SatInfo>> {
        self.executor
            .get_json(
                &Endpoint::new("/ordinals/v1/sats").segment(ordinal),
                Self::key("sat").param(ordinal).as_str(),
                ResourceKind::SatRarity.ttl(),
            )
            .await
    }

    /// BRC-20 token by ticker
    pub async fn brc20_token(&self, ticker: &str) -> ApiResult<Payload<Brc20TokenDetails>> {
        self.executor
            .get_json(
                &Endpoint::new("/ordinals/v1/brc-20/tokens").segment(ticker),
                Self::key("brc20").param(ticker).as_str(),
                ResourceKind::InscriptionMeta.ttl(),
            )
            .await
    }

    /// BRC-20 balances of an address
    pub async fn brc20_balances(
        &self,
        address: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Page<Brc20Balance>>> {
        self.executor
            .get_json(
                &paged(
                    Endpoint::new("/ordinals/v1/brc-20/balances").segment(address),
                    page,
                ),
                paged_key(Self::key("brc20bal").param(address), page).as_str(),
                ResourceKind::Balance.ttl(),
            )
            .await
    }

    /// BRC-20 events, optionally filtered
    pub async fn brc20_activity(
        &self,
        query: &Brc20ActivityQuery,
    ) -> ApiResult<Payload<Page<Brc20Activity>>> {
        let endpoint = query.endpoint();
        let key = Self::key("brc20act").param(endpoint.query_string());
        self.executor
            .get_json(&endpoint, key.as_str(), ResourceKind::Activity.ttl())
            .await
    }

    /// Largest holders of a BRC-20 token
    pub async fn brc20_holders(
        &self,
        ticker: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Page<Brc20Holder>>> {
        let endpoint = Endpoint::new("/ordinals/v1/brc-20/tokens")
            .segment(ticker)
            .segment("holders");
        self.executor
            .get_json(
                &paged(endpoint, page),
                paged_key(Self::key("brc20holders").param(ticker), page).as_str(),
                ResourceKind::Balance.ttl(),
            )
            .await
    }

    /// Rune etching by name or id
    pub async fn rune(&self, name: &str) -> ApiResult<Payload<RuneEtching>> {
        self.executor
            .get_json(
                &Endpoint::new("/runes/v1/etchings").segment(name),
                Self::key("rune").param(name).as_str(),
                ResourceKind::RuneEtching.ttl(),
            )
            .await
    }

    /// Paginated list of rune etchings
    pub async fn runes(&self, page: Pagination) -> ApiResult<Payload<Page<RuneEtching>>> {
        let endpoint = paged(Endpoint::new("/runes/v1/etchings"), page);
        let key = Self::key("runes").param(endpoint.query_string());
        self.executor
            .get_json(&endpoint, key.as_str(), ResourceKind::RuneEtching.ttl())
            .await
    }

    /// Rune balances of an address
    pub async fn rune_balances(
        &self,
        address: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Page<RuneBalance>>> {
        let endpoint = Endpoint::new("/runes/v1/addresses")
            .segment(address)
            .segment("balances");
        self.executor
            .get_json(
                &paged(endpoint, page),
                paged_key(Self::key("runebal").param(address), page).as_str(),
                ResourceKind::Balance.ttl(),
            )
            .await
    }

    /// Largest holders of a rune
    pub async fn rune_holders(
        &self,
        name: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Page<RuneHolder>>> {
        let endpoint = Endpoint::new("/runes/v1/etchings")
            .segment(name)
            .segment("holders");
        self.executor
            .get_json(
                &paged(endpoint, page),
                paged_key(Self::key("runeholders").param(name), page).as_str(),
                ResourceKind::Balance.ttl(),
            )
            .await
    }

    /// Recent events of a rune
    pub async fn rune_activity(
        &self,
        name: &str,
        page: Pagination,
    ) -> ApiResult<Payload<Page<RuneActivity>>> {
        let endpoint = Endpoint::new("/runes/v1/etchings")
            .segment(name)
            .segment("activity");
        self.executor
            .get_json(
                &paged(endpoint, page),
                paged_key(Self::key("runeact").param(name), page).as_str(),
                ResourceKind::Activity.ttl(),
            )
            .await
    }

    /// Inscription counts per block
    pub async fn inscription_stats(&self) -> ApiResult<Payload<Page<InscriptionStats>>> {
        self.executor
            .get_json(
                &Endpoint::new("/ordinals/v1/stats/inscriptions"),
                Self::key("stats").as_str(),
                ResourceKind::CollectionInfo.ttl(),
            )
            .await
    }
}

impl UpstreamClient for HiroClient {
    fn upstream(&self) -> Upstream {
        Upstream::Hiro
    }

    fn has_credential(&self) -> bool {
        self.executor.has_credential()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_query_orders_filters_before_pagination() {
        let query = InscriptionQuery {
            address: Some("bc1pxyz".to_string()),
            rarity: Some(SatRarity::Uncommon),
            from_block: Some(800_000),
            cursed: Some(false),
            page: Pagination::new(Some(40), Some(10)).unwrap(),
            ..InscriptionQuery::default()
        };
        assert_eq!(
            query.endpoint().query_string(),
            "address=bc1pxyz&rarity=uncommon&from_block_height=800000&cursed=false&offset=40&limit=10"
        );
    }

    #[test]
    fn activity_query_defaults_to_first_page() {
        let query = Brc20ActivityQuery {
            ticker: Some("ordi".to_string()),
            operation: Some(Brc20Operation::TransferSend),
            ..Brc20ActivityQuery::default()
        };
        assert_eq!(
            query.endpoint().query_string(),
            "ticker=ordi&operation=transfer_send&offset=0&limit=20"
        );
    }

    #[test]
    fn activity_without_details_omits_them() {
        let activity: Brc20Activity = serde_json::from_value(serde_json::json!({
            "operation": "mint",
            "ticker": "ordi",
            "inscription_id": "abc",
            "block_height": 1,
            "block_hash": null,
            "tx_id": "t",
            "address": "bc1q",
            "timestamp": 0,
            "mint": {"amount": "1000"}
        }))
        .unwrap();
        let value = serde_json::to_value(&activity).unwrap();
        assert!(value.get("deploy").is_none());
        assert_eq!(value["mint"]["amount"], "1000");
    }
}
