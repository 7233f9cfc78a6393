// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Resource kinds and their cache lifetimes

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const MINUTE_MS: u64 = 60 * 1000;

/// Category of upstream data, used to pick a cache TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Sat rarity and other data that never changes
    SatRarity,
    /// Immutable data such as traits and rune unlock heights
    Static,
    /// Inscription metadata, rarely changes
    InscriptionMeta,
    /// Rune etchings, static after creation
    RuneEtching,
    /// Collection details including prices
    CollectionInfo,
    /// Address balances during active trading
    Balance,
    /// Marketplace listings and prices
    Marketplace,
    /// Real-time activity feeds
    Activity,
}

impl ResourceKind {
    /// Returns how long a value of this kind stays fresh in the cache
    pub const fn ttl(self) -> Duration {
        match self {
            Self::SatRarity | Self::Static => Duration::from_millis(24 * 60 * MINUTE_MS),
            Self::InscriptionMeta | Self::RuneEtching => Duration::from_millis(5 * MINUTE_MS),
            Self::CollectionInfo => Duration::from_millis(2 * MINUTE_MS),
            Self::Balance => Duration::from_millis(MINUTE_MS),
            Self::Marketplace | Self::Activity => Duration::from_millis(30 * 1000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_presets() {
        assert_eq!(ResourceKind::SatRarity.ttl().as_millis(), 86_400_000);
        assert_eq!(ResourceKind::Static.ttl().as_millis(), 86_400_000);
        assert_eq!(ResourceKind::InscriptionMeta.ttl().as_millis(), 300_000);
        assert_eq!(ResourceKind::RuneEtching.ttl().as_millis(), 300_000);
        assert_eq!(ResourceKind::CollectionInfo.ttl().as_millis(), 120_000);
        assert_eq!(ResourceKind::Balance.ttl().as_millis(), 60_000);
        assert_eq!(ResourceKind::Marketplace.ttl().as_millis(), 30_000);
        assert_eq!(ResourceKind::Activity.ttl().as_millis(), 30_000);
    }
}
