// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration and handlers for the Ordinals API server.

pub mod handlers;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use handlers::{call_tool_handler, health_handler, list_tools_handler};

use crate::{
    metrics::metrics_handler, middleware::http_metrics_middleware, openapi::openapi_spec,
    state::ServerState,
};

/// Create application routes
pub fn create_routes() -> Router<ServerState> {
    // Operational endpoints are excluded from request metrics
    let ops_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api-doc/openapi.json", get(openapi_spec));

    let tool_routes = Router::new()
        .route("/tools", get(list_tools_handler))
        .route("/tools/{name}", post(call_tool_handler))
        .route_layer(middleware::from_fn(http_metrics_middleware));

    Router::new().merge(ops_routes).merge(tool_routes)
}
