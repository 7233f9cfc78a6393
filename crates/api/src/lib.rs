// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Ordinals API Server Implementation
//!
//! This crate provides the HTTP server that exposes Bitcoin Ordinals, BRC-20 and
//! Runes lookups as a catalogue of named actions. Each action validates its JSON
//! arguments, calls the upstream providers through the shared registry and returns
//! a text result.
//!
//! # Module Structure
//!
//! - [`actions`]: The action catalogue, argument validation and dispatch
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and HTTP response handling with proper status codes
//! - [`extractors`]: JSON body extraction with categorized error messages
//! - [`state`]: Shared application state and health reporting
//! - [`server`]: Main server implementation, lifecycle, and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`middleware`]: Request metrics by matched route
//! - [`metrics`]: Prometheus collectors and the scrape endpoint
//! - [`openapi`]: `OpenAPI` specification endpoint
//!
//! # Key Features
//!
//! - **Provider Fallback**: Hiro first, Ordiscan when Hiro fails and a key is configured
//! - **Rate Limiting**: Per-upstream token buckets shared by every client of that upstream
//! - **Caching**: Response cache with stale reads when an upstream answers 429
//! - **Graceful Shutdown**: Coordinated termination using `CancellationToken` with timeouts

pub mod actions;
pub mod config;
pub mod docs;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use actions::{ActionName, ToolResult};
pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use state::{HealthCheck, ServerState};
