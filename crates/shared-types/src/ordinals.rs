// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Enumerated filter values of the Ordinals protocols

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Rarity of a satoshi, as defined by the ordinal theory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SatRarity {
    /// Any sat that is not the first of its block
    Common,
    /// First sat of each block
    Uncommon,
    /// First sat of each difficulty adjustment period
    Rare,
    /// First sat of each halving epoch
    Epic,
    /// First sat of each cycle
    Legendary,
    /// First sat of the genesis block
    Mythic,
}

impl SatRarity {
    /// Returns the query value used by upstream filters
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
            Self::Mythic => "mythic",
        }
    }
}

impl fmt::Display for SatRarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BRC-20 inscription operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Brc20Operation {
    /// Token deployment
    Deploy,
    /// Token mint
    Mint,
    /// Transfer inscription creation
    Transfer,
    /// Transfer inscription being sent
    TransferSend,
}

impl Brc20Operation {
    /// Returns the query value used by upstream filters
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::Mint => "mint",
            Self::Transfer => "transfer",
            Self::TransferSend => "transfer_send",
        }
    }
}

impl fmt::Display for Brc20Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rarity_round_trips_through_json() {
        let parsed: SatRarity = serde_json::from_str("\"legendary\"").unwrap();
        assert_eq!(parsed, SatRarity::Legendary);
        assert_eq!(parsed.to_string(), "legendary");
        assert!(serde_json::from_str::<SatRarity>("\"shiny\"").is_err());
    }

    #[test]
    fn operation_uses_snake_case() {
        let parsed: Brc20Operation = serde_json::from_str("\"transfer_send\"").unwrap();
        assert_eq!(parsed, Brc20Operation::TransferSend);
        assert_eq!(Brc20Operation::Deploy.as_str(), "deploy");
    }
}
