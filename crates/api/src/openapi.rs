// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` documentation module
//!
//! Serves the generated `OpenAPI` specification.

use axum::Json;
use utoipa::OpenApi;

use crate::docs::ApiDoc;

/// `OpenAPI` specification endpoint
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
