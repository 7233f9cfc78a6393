// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Typed arguments of every action
//!
//! Each type doubles as the action's input schema: field doc comments become
//! the property descriptions published by `GET /tools`. Unknown fields are
//! ignored. `offset` and `limit` also accept numeric strings.

use api_client::{ApiError, ApiResult};
use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use shared_types::{Brc20Operation, SatRarity};
use utoipa::ToSchema;

use super::validation::{genesis_id, inscription_ref, optional, required, sat_ordinal, txid};

/// Normalization and checks run after decoding, before any upstream call
pub trait Validate: Sized {
    /// Trim strings and reject values no upstream would accept
    fn validate(self) -> ApiResult<Self>;
}

/// Inscription lookup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct InscriptionArgs {
    /// Inscription ID ({txid}i{index}) or inscription number
    pub id: String,
}

impl Validate for InscriptionArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            id: inscription_ref("id", self.id)?,
        })
    }
}

/// Collection traits of an inscription
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct InscriptionTraitsArgs {
    /// Inscription ID ({txid}i{index})
    pub id: String,
}

impl Validate for InscriptionTraitsArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            id: genesis_id("id", self.id)?,
        })
    }
}

/// Transfer history of an inscription
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct InscriptionTransfersArgs {
    /// Inscription ID ({txid}i{index}) or inscription number
    pub id: String,
    /// Pagination offset
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub offset: Option<u64>,
    /// Results per page (max 60)
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub limit: Option<u32>,
}

impl Validate for InscriptionTransfersArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            id: inscription_ref("id", self.id)?,
            ..self
        })
    }
}

/// Inscription search filters
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, ToSchema)]
pub struct SearchInscriptionsArgs {
    /// Filter by owner Bitcoin address
    pub address: Option<String>,
    /// Filter by MIME type (e.g., image/png, text/plain)
    pub mime_type: Option<String>,
    /// Filter by sat rarity
    #[schema(inline)]
    pub rarity: Option<SatRarity>,
    /// Start block height
    pub from_block: Option<u64>,
    /// End block height
    pub to_block: Option<u64>,
    /// Start inscription number
    pub from_number: Option<i64>,
    /// End inscription number
    pub to_number: Option<i64>,
    /// Filter recursive inscriptions
    pub recursive: Option<bool>,
    /// Filter cursed inscriptions
    pub cursed: Option<bool>,
    /// Pagination offset
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub offset: Option<u64>,
    /// Results per page (max 60)
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub limit: Option<u32>,
}

impl Validate for SearchInscriptionsArgs {
    fn validate(self) -> ApiResult<Self> {
        if let (Some(from), Some(to)) = (self.from_block, self.to_block)
            && from > to
        {
            return Err(ApiError::validation(format!(
                "from_block ({from}) must not exceed to_block ({to})"
            )));
        }
        if let (Some(from), Some(to)) = (self.from_number, self.to_number)
            && from > to
        {
            return Err(ApiError::validation(format!(
                "from_number ({from}) must not exceed to_number ({to})"
            )));
        }
        Ok(Self {
            address: optional(self.address),
            mime_type: optional(self.mime_type),
            ..self
        })
    }
}

/// Holdings of a Bitcoin address
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct AddressArgs {
    /// Bitcoin address (bc1p..., bc1q..., 1..., 3...)
    pub address: String,
    /// Pagination offset
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub offset: Option<u64>,
    /// Results per page (max 60)
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub limit: Option<u32>,
}

impl Validate for AddressArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            address: required("address", self.address)?,
            ..self
        })
    }
}

/// Satoshi lookup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct SatArgs {
    /// Satoshi ordinal number (e.g., 1857578125803250)
    pub ordinal: String,
}

impl Validate for SatArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            ordinal: sat_ordinal("ordinal", self.ordinal)?,
        })
    }
}

/// BRC-20 token lookup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct Brc20TokenArgs {
    /// BRC-20 token ticker (e.g., ordi, sats)
    pub ticker: String,
}

impl Validate for Brc20TokenArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            ticker: required("ticker", self.ticker)?,
        })
    }
}

/// Holders of a BRC-20 token
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct Brc20HoldersArgs {
    /// BRC-20 token ticker (e.g., ordi, sats)
    pub ticker: String,
    /// Pagination offset
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub offset: Option<u64>,
    /// Results per page (max 60)
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub limit: Option<u32>,
}

impl Validate for Brc20HoldersArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            ticker: required("ticker", self.ticker)?,
            ..self
        })
    }
}

/// BRC-20 activity filters
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, ToSchema)]
pub struct Brc20ActivityArgs {
    /// Filter by BRC-20 ticker
    pub ticker: Option<String>,
    /// Filter by Bitcoin address
    pub address: Option<String>,
    /// Filter by operation type
    #[schema(inline)]
    pub operation: Option<Brc20Operation>,
    /// Pagination offset
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub offset: Option<u64>,
    /// Results per page (max 60)
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub limit: Option<u32>,
}

impl Validate for Brc20ActivityArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            ticker: optional(self.ticker),
            address: optional(self.address),
            ..self
        })
    }
}

/// Rune lookup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct RuneArgs {
    /// Rune name (e.g., UNCOMMON•GOODS or UNCOMMONGOODS)
    pub name: String,
}

impl Validate for RuneArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            name: required("name", self.name)?,
        })
    }
}

/// Rune name availability
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct RuneUnlockArgs {
    /// Rune name to check availability for
    pub name: String,
}

impl Validate for RuneUnlockArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            name: required("name", self.name)?,
        })
    }
}

/// Paginated rune listing (holders, activity)
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct RunePageArgs {
    /// Rune name (e.g., UNCOMMON•GOODS or UNCOMMONGOODS)
    pub name: String,
    /// Pagination offset
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub offset: Option<u64>,
    /// Results per page (max 60)
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub limit: Option<u32>,
}

impl Validate for RunePageArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            name: required("name", self.name)?,
            ..self
        })
    }
}

/// Pagination only
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, ToSchema)]
pub struct PageArgs {
    /// Pagination offset
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub offset: Option<u64>,
    /// Results per page (max 60)
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub limit: Option<u32>,
}

impl Validate for PageArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(self)
    }
}

/// Collection lookup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct CollectionArgs {
    /// Collection slug/symbol (e.g., bitcoin-puppets, nodemonkes)
    pub slug: String,
}

impl Validate for CollectionArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            slug: required("slug", self.slug)?,
        })
    }
}

/// Inscriptions of a collection
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct CollectionPageArgs {
    /// Collection slug/symbol
    pub slug: String,
    /// Pagination offset
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub offset: Option<u64>,
    /// Results per page (max 60)
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub limit: Option<u32>,
}

impl Validate for CollectionPageArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            slug: required("slug", self.slug)?,
            ..self
        })
    }
}

/// Marketplace listings of a collection
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct CollectionListingsArgs {
    /// Collection symbol on Magic Eden
    pub collection_symbol: String,
    /// Pagination offset
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub offset: Option<u64>,
    /// Results per page (max 60)
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub limit: Option<u32>,
}

impl Validate for CollectionListingsArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            collection_symbol: required("collection_symbol", self.collection_symbol)?,
            ..self
        })
    }
}

/// Transaction lookup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct TxArgs {
    /// Bitcoin transaction ID
    pub txid: String,
}

impl Validate for TxArgs {
    fn validate(self) -> ApiResult<Self> {
        Ok(Self {
            txid: txid("txid", self.txid)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pagination_accepts_numeric_strings() {
        let args: AddressArgs = serde_json::from_value(json!({
            "address": "bc1p",
            "offset": "40",
            "limit": 10
        }))
        .unwrap();
        assert_eq!(args.offset, Some(40));
        assert_eq!(args.limit, Some(10));

        let args: PageArgs = serde_json::from_value(json!({})).unwrap();
        assert_eq!(args, PageArgs::default());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let args: SatArgs = serde_json::from_value(json!({
            "ordinal": "1",
            "rarity": "rare"
        }))
        .unwrap();
        assert_eq!(args.ordinal, "1");
    }

    #[test]
    fn enums_use_wire_names() {
        let args: Brc20ActivityArgs =
            serde_json::from_value(json!({ "operation": "transfer_send" })).unwrap();
        assert_eq!(args.operation, Some(Brc20Operation::TransferSend));

        let args: SearchInscriptionsArgs =
            serde_json::from_value(json!({ "rarity": "mythic" })).unwrap();
        assert_eq!(args.rarity, Some(SatRarity::Mythic));

        assert!(
            serde_json::from_value::<SearchInscriptionsArgs>(json!({ "rarity": "shiny" })).is_err()
        );
    }

    #[test]
    fn search_rejects_inverted_ranges() {
        let args = SearchInscriptionsArgs {
            from_block: Some(800_000),
            to_block: Some(790_000),
            ..SearchInscriptionsArgs::default()
        };
        assert!(args.validate().is_err());

        let args = SearchInscriptionsArgs {
            address: Some("  ".to_string()),
            mime_type: Some(" text/plain ".to_string()),
            ..SearchInscriptionsArgs::default()
        }
        .validate()
        .unwrap();
        assert_eq!(args.address, None);
        assert_eq!(args.mime_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn required_fields_are_trimmed() {
        let args = CollectionListingsArgs {
            collection_symbol: " nodemonkes ".to_string(),
            offset: None,
            limit: Some(5),
        }
        .validate()
        .unwrap();
        assert_eq!(args.collection_symbol, "nodemonkes");
        assert_eq!(args.limit, Some(5));

        let err = RuneArgs {
            name: String::new(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: name must not be empty");
    }
}
