// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Middleware module for HTTP request processing
//!
//! Request counting by matched route. Tracing, request IDs, CORS and
//! timeouts are `tower-http` layers installed in [`crate::server`].

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::metrics;

/// Count every request by method, matched route and response status
///
/// Routes are labeled by their template (`/tools/{name}`), keeping the
/// label set bounded. Must be installed with `route_layer` so the matched
/// path is available.
pub async fn http_metrics_middleware(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |path| path.as_str().to_string());

    let response = next.run(req).await;
    let status = response.status().as_u16();

    debug!(%method, %route, status, "request completed");
    metrics::record_http_request(&method, &route, status);
    response
}
