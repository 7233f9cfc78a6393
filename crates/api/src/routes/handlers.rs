// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! This module provides HTTP request handlers for the Ordinals API server:
//! health checks, the action catalogue, and cancellation-aware action
//! invocation for coordinated graceful shutdown.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    actions::{self, ToolDescriptor, ToolResult},
    extractors::JsonExtractor,
    state::{HealthCheck, ServerState},
};

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the service status, version and environment, the credential and rate-limit state of every upstream provider (Hiro, Ordiscan, Magic Eden), and response cache counters.",
    responses(
        (status = 200, description = "Service status", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthCheck> {
    Json(state.health_check())
}

/// Action catalogue
#[utoipa::path(
    get,
    path = "/tools",
    tag = "tools",
    summary = "List actions",
    description = "Returns every action with its description and the JSON Schema of its arguments.",
    responses(
        (status = 200, description = "Action catalogue", body = Vec<ToolDescriptor>)
    )
)]
pub async fn list_tools_handler() -> Json<Vec<ToolDescriptor>> {
    Json(actions::catalogue())
}

/// Invoke an action
///
/// Validation and upstream failures are reported in the body with
/// `is_error = true`; only undecodable request bodies produce an HTTP error.
/// An invocation still in flight when shutdown begins is abandoned.
#[utoipa::path(
    post,
    path = "/tools/{name}",
    tag = "tools",
    summary = "Invoke an action",
    description = "Runs the named action with a JSON object of arguments. An empty body counts as `{}`.",
    params(
        ("name" = String, Path, description = "Action name, e.g. get_inscription")
    ),
    request_body(content = Object, description = "Action arguments", content_type = "application/json"),
    responses(
        (status = 200, description = "Action result, successful or not", body = ToolResult),
        (status = 400, description = "Request body is not a JSON object", body = String)
    )
)]
pub async fn call_tool_handler(
    State(state): State<ServerState>,
    Path(name): Path<String>,
    JsonExtractor(args): JsonExtractor<Map<String, Value>>,
) -> Json<ToolResult> {
    let result = tokio::select! {
        result = actions::invoke(&state.registry, &name, args) => result,
        () = state.cancellation_token.cancelled() => {
            debug!(action = %name, "action abandoned during shutdown");
            ToolResult::error("server is shutting down")
        }
    };
    Json(result)
}
