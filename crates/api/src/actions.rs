// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Action catalogue and dispatch
//!
//! An action is a named, schema-described query against the provider
//! registry. Invoking one never fails at the transport level: validation
//! errors, upstream errors and unknown names all come back as a
//! [`ToolResult`] with `is_error = true` and an `Error: <message>` text.
//! Successful results carry the upstream payload as pretty-printed JSON.

pub mod args;
pub mod validation;

use std::fmt;

use api_client::{ApiError, Pagination};
use external_apis::{
    ProviderRegistry,
    hiro::{Brc20ActivityQuery, InscriptionQuery},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use utoipa::{PartialSchema, ToSchema};

use self::args::{
    AddressArgs, Brc20ActivityArgs, Brc20HoldersArgs, Brc20TokenArgs, CollectionArgs,
    CollectionListingsArgs, CollectionPageArgs, InscriptionArgs, InscriptionTraitsArgs,
    InscriptionTransfersArgs, PageArgs, RuneArgs, RunePageArgs, RuneUnlockArgs, SatArgs,
    SearchInscriptionsArgs, TxArgs, Validate,
};
use crate::metrics;

/// Every action exposed by the server, in catalogue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ActionName {
    GetInscription,
    SearchInscriptions,
    GetInscriptionContent,
    GetInscriptionTransfers,
    GetAddressInscriptions,
    GetBrc20Balances,
    GetRuneBalances,
    GetAddressRareSats,
    GetSatInfo,
    GetBrc20Token,
    GetRuneInfo,
    GetCollectionInfo,
    GetCollectionInscriptions,
    GetCollectionListings,
    GetInscriptionTraits,
    GetRuneMarketInfo,
    ListRunes,
    GetRuneHolders,
    GetRuneActivity,
    GetRuneUnlockDate,
    GetBrc20Activity,
    GetBrc20Holders,
    GetTxInscriptions,
    GetTxRunes,
}

const ALL_ACTIONS: [ActionName; 24] = [
    ActionName::GetInscription,
    ActionName::SearchInscriptions,
    ActionName::GetInscriptionContent,
    ActionName::GetInscriptionTransfers,
    ActionName::GetAddressInscriptions,
    ActionName::GetBrc20Balances,
    ActionName::GetRuneBalances,
    ActionName::GetAddressRareSats,
    ActionName::GetSatInfo,
    ActionName::GetBrc20Token,
    ActionName::GetRuneInfo,
    ActionName::GetCollectionInfo,
    ActionName::GetCollectionInscriptions,
    ActionName::GetCollectionListings,
    ActionName::GetInscriptionTraits,
    ActionName::GetRuneMarketInfo,
    ActionName::ListRunes,
    ActionName::GetRuneHolders,
    ActionName::GetRuneActivity,
    ActionName::GetRuneUnlockDate,
    ActionName::GetBrc20Activity,
    ActionName::GetBrc20Holders,
    ActionName::GetTxInscriptions,
    ActionName::GetTxRunes,
];

impl ActionName {
    /// All actions in catalogue order
    pub const fn all() -> &'static [Self] {
        &ALL_ACTIONS
    }

    /// Look up an action by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_ACTIONS.iter().copied().find(|action| action.as_str() == name)
    }

    /// Wire name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetInscription => "get_inscription",
            Self::SearchInscriptions => "search_inscriptions",
            Self::GetInscriptionContent => "get_inscription_content",
            Self::GetInscriptionTransfers => "get_inscription_transfers",
            Self::GetAddressInscriptions => "get_address_inscriptions",
            Self::GetBrc20Balances => "get_brc20_balances",
            Self::GetRuneBalances => "get_rune_balances",
            Self::GetAddressRareSats => "get_address_rare_sats",
            Self::GetSatInfo => "get_sat_info",
            Self::GetBrc20Token => "get_brc20_token",
            Self::GetRuneInfo => "get_rune_info",
            Self::GetCollectionInfo => "get_collection_info",
            Self::GetCollectionInscriptions => "get_collection_inscriptions",
            Self::GetCollectionListings => "get_collection_listings",
            Self::GetInscriptionTraits => "get_inscription_traits",
            Self::GetRuneMarketInfo => "get_rune_market_info",
            Self::ListRunes => "list_runes",
            Self::GetRuneHolders => "get_rune_holders",
            Self::GetRuneActivity => "get_rune_activity",
            Self::GetRuneUnlockDate => "get_rune_unlock_date",
            Self::GetBrc20Activity => "get_brc20_activity",
            Self::GetBrc20Holders => "get_brc20_holders",
            Self::GetTxInscriptions => "get_tx_inscriptions",
            Self::GetTxRunes => "get_tx_runes",
        }
    }

    /// Human-readable description published in the catalogue
    pub const fn description(self) -> &'static str {
        match self {
            Self::GetInscription => {
                "Get detailed metadata for a Bitcoin Ordinals inscription by its ID or number. Returns owner address, content type, sat rarity, genesis info, and more."
            }
            Self::SearchInscriptions => {
                "Search and list Bitcoin Ordinals inscriptions with filters. Filter by address, MIME type, sat rarity, block range, inscription number range, recursive/cursed status."
            }
            Self::GetInscriptionContent => {
                "Get the raw content of a Bitcoin Ordinals inscription. Returns text content directly or base64-encoded binary data with content type."
            }
            Self::GetInscriptionTransfers => {
                "Get the transfer history for a Bitcoin Ordinals inscription. Shows each transfer with block, address, transaction, and timestamp."
            }
            Self::GetAddressInscriptions => {
                "Get all Ordinals inscriptions owned by a Bitcoin address. Returns inscription IDs, numbers, content types, and sat rarity."
            }
            Self::GetBrc20Balances => {
                "Get BRC-20 token balances held by a Bitcoin address. Returns ticker, available, transferrable, and overall balances."
            }
            Self::GetRuneBalances => {
                "Get Rune balances held by a Bitcoin address. Returns rune names, IDs, and amounts held."
            }
            Self::GetAddressRareSats => {
                "Get rare satoshis held by a Bitcoin address. Returns sat ordinal number, rarity level (uncommon/rare/epic/legendary/mythic), and UTXO location."
            }
            Self::GetSatInfo => {
                "Get information about a specific satoshi by its ordinal number. Returns rarity level, epoch, cycle, period, name, and any inscription on it."
            }
            Self::GetBrc20Token => {
                "Get details for a BRC-20 token by ticker. Returns max supply, minted supply, mint limit, decimals, deploy inscription, and transaction count."
            }
            Self::GetRuneInfo => {
                "Get details for a Bitcoin Rune by name. Returns symbol, divisibility, supply, premine, mint terms, and etching transaction."
            }
            Self::GetCollectionInfo => {
                "Get details for an Ordinals collection. Returns name, description, inscription count, floor price, volume, and owner count."
            }
            Self::GetCollectionInscriptions => {
                "List inscriptions in an Ordinals collection. Returns inscription IDs, numbers, content types, and owners."
            }
            Self::GetCollectionListings => {
                "Get active marketplace listings for an Ordinals collection on Magic Eden. Returns listed inscriptions with prices in BTC."
            }
            Self::GetInscriptionTraits => {
                "Get trait information for a collection inscription. Returns trait types and values (e.g., background, body, eyes)."
            }
            Self::GetRuneMarketInfo => {
                "Get market data for a Bitcoin Rune. Returns price in USD, market cap, and 24h volume."
            }
            Self::ListRunes => {
                "List Bitcoin Runes with pagination. Returns rune name, symbol, supply, divisibility, mint terms, and etching info."
            }
            Self::GetRuneHolders => {
                "Get top holders of a Bitcoin Rune. Returns addresses and balances sorted by amount held."
            }
            Self::GetRuneActivity => {
                "Get recent activity (mints, transfers, burns) for a Bitcoin Rune. Returns operation type, addresses, amounts, and timestamps."
            }
            Self::GetRuneUnlockDate => {
                "Check when a rune name becomes available for etching. Returns unlock block height and estimated date."
            }
            Self::GetBrc20Activity => {
                "Get BRC-20 token activity (deploy, mint, transfer events). Filter by ticker, address, or operation type."
            }
            Self::GetBrc20Holders => {
                "Get top holders of a BRC-20 token. Returns addresses and balances sorted by amount held."
            }
            Self::GetTxInscriptions => {
                "Get all Ordinals inscriptions contained in a Bitcoin transaction. Returns inscription IDs, numbers, and content types."
            }
            Self::GetTxRunes => {
                "Get all Rune transfers in a Bitcoin transaction. Returns rune names, amounts, addresses, and operation types."
            }
        }
    }

    /// JSON Schema of the action's arguments object
    pub fn input_schema(self) -> Value {
        match self {
            Self::GetInscription | Self::GetInscriptionContent => schema_of::<InscriptionArgs>(),
            Self::SearchInscriptions => schema_of::<SearchInscriptionsArgs>(),
            Self::GetInscriptionTransfers => schema_of::<InscriptionTransfersArgs>(),
            Self::GetInscriptionTraits => schema_of::<InscriptionTraitsArgs>(),
            Self::GetAddressInscriptions
            | Self::GetBrc20Balances
            | Self::GetRuneBalances
            | Self::GetAddressRareSats => schema_of::<AddressArgs>(),
            Self::GetSatInfo => schema_of::<SatArgs>(),
            Self::GetBrc20Token => schema_of::<Brc20TokenArgs>(),
            Self::GetBrc20Holders => schema_of::<Brc20HoldersArgs>(),
            Self::GetBrc20Activity => schema_of::<Brc20ActivityArgs>(),
            Self::GetRuneInfo | Self::GetRuneMarketInfo => schema_of::<RuneArgs>(),
            Self::GetRuneUnlockDate => schema_of::<RuneUnlockArgs>(),
            Self::GetRuneHolders | Self::GetRuneActivity => schema_of::<RunePageArgs>(),
            Self::ListRunes => schema_of::<PageArgs>(),
            Self::GetCollectionInfo => schema_of::<CollectionArgs>(),
            Self::GetCollectionInscriptions => schema_of::<CollectionPageArgs>(),
            Self::GetCollectionListings => schema_of::<CollectionListingsArgs>(),
            Self::GetTxInscriptions | Self::GetTxRunes => schema_of::<TxArgs>(),
        }
    }

    /// Catalogue entry
    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.as_str().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn schema_of<T: PartialSchema>() -> Value {
    serde_json::to_value(T::schema()).unwrap_or_default()
}

/// Catalogue entry of one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToolDescriptor {
    /// Wire name
    pub name: String,
    /// What the action returns
    pub description: String,
    /// JSON Schema of the arguments object
    #[schema(value_type = Object)]
    pub input_schema: Value,
}

/// Kind of a result content block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Plain text
    Text,
}

/// One content block of a tool result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TextContent {
    /// Always `text`
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Pretty-printed JSON payload or `Error: <message>`
    pub text: String,
}

/// Outcome of an action invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ToolResult {
    /// Result content blocks
    pub content: Vec<TextContent>,
    /// Whether the action failed
    pub is_error: bool,
}

impl ToolResult {
    /// Successful result carrying `text`
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent {
                kind: ContentKind::Text,
                text: text.into(),
            }],
            is_error: false,
        }
    }

    /// Failed result; the message is prefixed with `Error: `
    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            content: vec![TextContent {
                kind: ContentKind::Text,
                text: format!("Error: {message}"),
            }],
            is_error: true,
        }
    }
}

/// Failure of a single action
#[derive(Debug, Error)]
enum ActionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ActionError {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Api(err) => err.kind(),
            Self::Encode(_) => "encode",
        }
    }
}

/// Catalogue of every action
pub fn catalogue() -> Vec<ToolDescriptor> {
    ActionName::all()
        .iter()
        .map(|action| action.descriptor())
        .collect()
}

/// Invoke an action by name
///
/// Unknown names and every failure are reported in-band; see the module
/// docs.
#[instrument(skip_all, fields(action = %name))]
pub async fn invoke(
    registry: &ProviderRegistry,
    name: &str,
    args: Map<String, Value>,
) -> ToolResult {
    let Some(action) = ActionName::from_name(name) else {
        warn!("unknown action requested");
        return ToolResult::error(format!("Unknown tool: {name}"));
    };

    let started = Instant::now();
    let outcome = execute(registry, action, args).await;
    let elapsed = started.elapsed().as_secs_f64();

    match outcome {
        Ok(text) => {
            metrics::observe_action(action.as_str(), "success", elapsed);
            debug!(elapsed_secs = elapsed, "action succeeded");
            ToolResult::text(text)
        }
        Err(err) => {
            metrics::observe_action(action.as_str(), "error", elapsed);
            metrics::record_action_error(action.as_str(), err.kind());
            warn!(kind = err.kind(), error = %err, "action failed");
            ToolResult::error(err)
        }
    }
}

fn parse<T>(mut args: Map<String, Value>) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate + PartialSchema,
{
    strip_unknown::<T>(&mut args);
    serde_json::from_value::<T>(Value::Object(args))
        .map_err(|e| ApiError::validation(e.to_string()))?
        .validate()
}

/// Drop arguments the schema of `T` does not declare
fn strip_unknown<T: PartialSchema>(args: &mut Map<String, Value>) {
    let schema = schema_of::<T>();
    let Some(known) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    args.retain(|name, _| {
        let declared = known.contains_key(name);
        if !declared {
            warn!(argument = %name, "ignoring undeclared argument");
        }
        declared
    });
}

fn render<T: Serialize>(value: &T) -> Result<String, ActionError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[allow(clippy::too_many_lines)]
async fn execute(
    registry: &ProviderRegistry,
    action: ActionName,
    args: Map<String, Value>,
) -> Result<String, ActionError> {
    match action {
        ActionName::GetInscription => {
            let args: InscriptionArgs = parse(args)?;
            render(&registry.inscription(&args.id).await?)
        }
        ActionName::SearchInscriptions => {
            let args: SearchInscriptionsArgs = parse(args)?;
            let query = InscriptionQuery {
                page: Pagination::new(args.offset, args.limit)?,
                address: args.address,
                mime_type: args.mime_type,
                rarity: args.rarity,
                from_block: args.from_block,
                to_block: args.to_block,
                from_number: args.from_number,
                to_number: args.to_number,
                recursive: args.recursive,
                cursed: args.cursed,
            };
            render(&registry.hiro().search_inscriptions(&query).await?)
        }
        ActionName::GetInscriptionContent => {
            let args: InscriptionArgs = parse(args)?;
            render(&registry.hiro().inscription_content(&args.id).await?)
        }
        ActionName::GetInscriptionTransfers => {
            let args: InscriptionTransfersArgs = parse(args)?;
            let page = Pagination::new(args.offset, args.limit)?;
            render(&registry.hiro().inscription_transfers(&args.id, page).await?)
        }
        ActionName::GetAddressInscriptions => {
            let args: AddressArgs = parse(args)?;
            let page = Pagination::new(args.offset, args.limit)?;
            render(&registry.address_inscriptions(&args.address, page).await?)
        }
        ActionName::GetBrc20Balances => {
            let args: AddressArgs = parse(args)?;
            let page = Pagination::new(args.offset, args.limit)?;
            render(&registry.brc20_balances(&args.address, page).await?)
        }
        ActionName::GetRuneBalances => {
            let args: AddressArgs = parse(args)?;
            let page = Pagination::new(args.offset, args.limit)?;
            render(&registry.rune_balances(&args.address, page).await?)
        }
        ActionName::GetAddressRareSats => {
            let args: AddressArgs = parse(args)?;
            let page = Pagination::new(args.offset, args.limit)?;
            render(&registry.ordiscan().address_rare_sats(&args.address, page).await?)
        }
        ActionName::GetSatInfo => {
            let args: SatArgs = parse(args)?;
            render(&registry.hiro().sat(&args.ordinal).await?)
        }
        ActionName::GetBrc20Token => {
            let args: Brc20TokenArgs = parse(args)?;
            render(&registry.hiro().brc20_token(&args.ticker).await?)
        }
        ActionName::GetRuneInfo => {
            let args: RuneArgs = parse(args)?;
            render(&registry.rune(&args.name).await?)
        }
        ActionName::GetCollectionInfo => {
            let args: CollectionArgs = parse(args)?;
            render(&registry.ordiscan().collection(&args.slug).await?)
        }
        ActionName::GetCollectionInscriptions => {
            let args: CollectionPageArgs = parse(args)?;
            let page = Pagination::new(args.offset, args.limit)?;
            render(
                &registry
                    .ordiscan()
                    .collection_inscriptions(&args.slug, page)
                    .await?,
            )
        }
        ActionName::GetCollectionListings => {
            let args: CollectionListingsArgs = parse(args)?;
            let page = Pagination::new(args.offset, args.limit)?;
            render(
                &registry
                    .magic_eden()
                    .collection_listings(&args.collection_symbol, page)
                    .await?,
            )
        }
        ActionName::GetInscriptionTraits => {
            let args: InscriptionTraitsArgs = parse(args)?;
            render(&registry.ordiscan().inscription_traits(&args.id).await?)
        }
        ActionName::GetRuneMarketInfo => {
            let args: RuneArgs = parse(args)?;
            render(&registry.ordiscan().rune_market(&args.name).await?)
        }
        ActionName::ListRunes => {
            let args: PageArgs = parse(args)?;
            let page = Pagination::new(args.offset, args.limit)?;
            render(&registry.hiro().runes(page).await?)
        }
        ActionName::GetRuneHolders => {
            let args: RunePageArgs = parse(args)?;
            let page = Pagination::new(args.offset, args.limit)?;
            render(&registry.hiro().rune_holders(&args.name, page).await?)
        }
        ActionName::GetRuneActivity => {
            let args: RunePageArgs = parse(args)?;
            let page = Pagination::new(args.offset, args.limit)?;
            render(&registry.hiro().rune_activity(&args.name, page).await?)
        }
        ActionName::GetRuneUnlockDate => {
            let args: RuneUnlockArgs = parse(args)?;
            render(&registry.ordiscan().rune_unlock_date(&args.name).await?)
        }
        ActionName::GetBrc20Activity => {
            let args: Brc20ActivityArgs = parse(args)?;
            let query = Brc20ActivityQuery {
                page: Pagination::new(args.offset, args.limit)?,
                ticker: args.ticker,
                address: args.address,
                operation: args.operation,
            };
            render(&registry.hiro().brc20_activity(&query).await?)
        }
        ActionName::GetBrc20Holders => {
            let args: Brc20HoldersArgs = parse(args)?;
            let page = Pagination::new(args.offset, args.limit)?;
            render(&registry.hiro().brc20_holders(&args.ticker, page).await?)
        }
        ActionName::GetTxInscriptions => {
            let args: TxArgs = parse(args)?;
            render(&registry.ordiscan().tx_inscriptions(&args.txid).await?)
        }
        ActionName::GetTxRunes => {
            let args: TxArgs = parse(args)?;
            render(&registry.ordiscan().tx_runes(&args.txid).await?)
        }
    }
}
