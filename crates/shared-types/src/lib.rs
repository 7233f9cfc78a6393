// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the Ordinals API service
//!
//! This crate provides common types that are shared across multiple crates
//! in the workspace, avoiding circular dependencies.

pub mod ordinals;
pub mod resource;
pub mod upstream;

pub use ordinals::{Brc20Operation, SatRarity};
pub use resource::ResourceKind;
pub use upstream::{Upstream, UpstreamParseError};
