// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` document definition

use api_client::ProviderStatus;
use external_apis::CacheStats;
use shared_types::Upstream;
use utoipa::OpenApi;

use crate::{
    actions::{ActionName, ContentKind, TextContent, ToolDescriptor, ToolResult},
    config::Environment,
    routes::handlers,
    state::{HealthCheck, HealthStatus},
};

/// `OpenAPI` document of the HTTP surface
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Ordinals API",
        description = "Bitcoin Ordinals, BRC-20 and Runes metadata aggregated from Hiro, Ordiscan and Magic Eden behind a catalogue of named actions."
    ),
    paths(
        handlers::health_handler,
        handlers::list_tools_handler,
        handlers::call_tool_handler,
    ),
    components(schemas(
        ActionName,
        CacheStats,
        ContentKind,
        Environment,
        HealthCheck,
        HealthStatus,
        ProviderStatus,
        TextContent,
        ToolDescriptor,
        ToolResult,
        Upstream,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "tools", description = "Action catalogue and invocation")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();

        assert!(paths.contains(&"/health".to_string()));
        assert!(paths.contains(&"/tools".to_string()));
        assert!(paths.contains(&"/tools/{name}".to_string()));
    }

    #[test]
    fn document_carries_result_schema() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.schemas.contains_key("ToolResult"));
        assert!(components.schemas.contains_key("HealthCheck"));
    }
}
