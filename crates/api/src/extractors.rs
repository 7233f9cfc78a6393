// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Custom extractors for improved error handling
//!
//! Action arguments arrive as a JSON object body. The extractor here treats
//! an empty body as `{}` (actions without arguments are commonly invoked
//! with no body at all) and turns decoder failures into messages with a
//! hint about what to fix.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;

use crate::error::ServerError;

mod error_hints {
    pub const MISSING_COMMA: &str =
        "check for missing or extra commas between object properties or array elements";
    pub const MISSING_BRACE: &str = "check for missing closing brace '}' for JSON object";
    pub const MISSING_BRACKET: &str = "check for missing closing bracket ']' for JSON array";
    pub const MISSING_QUOTES: &str =
        "check for missing or improperly escaped quotes around string values";
    pub const CONTROL_CHARS: &str = "JSON contains invalid control characters that must be escaped";
    pub const EXPECTED_VALUE: &str =
        "expected a valid JSON value (string, number, boolean, null, object, or array)";
    pub const DEFAULT_SYNTAX: &str = "check JSON formatting and structure";
    pub const TRUNCATED_JSON: &str =
        "unexpected end of JSON input, request appears to be truncated";
}

const MAX_JSON_PAYLOAD_SIZE: usize = 1024 * 1024; // 1MB

const EMPTY_OBJECT: &[u8] = b"{}";

/// JSON extractor with detailed parse errors and empty-body-as-`{}` semantics
#[derive(Debug)]
pub struct JsonExtractor<T>(pub T);

impl<T, S> FromRequest<S> for JsonExtractor<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(content_type) = req.headers().get(CONTENT_TYPE)
            && let Ok(content_type) = content_type.to_str()
            && !content_type.starts_with("application/json")
        {
            return Err(ServerError::JsonError {
                message: format!(
                    "invalid content-type: expected 'application/json', got '{content_type}'"
                ),
            });
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ServerError::JsonError {
                message: format!("failed to read request body: {rejection}"),
            })?;

        if bytes.len() > MAX_JSON_PAYLOAD_SIZE {
            return Err(ServerError::JsonError {
                message: format!(
                    "request body too large: {} bytes (max: {MAX_JSON_PAYLOAD_SIZE} bytes)",
                    bytes.len()
                ),
            });
        }

        parse_body(&bytes).map(JsonExtractor)
    }
}

/// Decode a request body, treating an empty or blank body as `{}`
fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ServerError> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        EMPTY_OBJECT
    } else {
        bytes
    };

    serde_json::from_slice::<T>(bytes).map_err(|err| {
        let message = if err.is_eof() {
            error_hints::TRUNCATED_JSON.to_string()
        } else if err.is_syntax() {
            format!(
                "invalid JSON syntax at line {}, column {}: {}",
                err.line(),
                err.column(),
                json_syntax_hint(&err)
            )
        } else if err.is_data() {
            format!("JSON data validation failed: {}", data_validation_hint(&err))
        } else {
            format!("JSON parsing error: {err}")
        };
        ServerError::JsonError { message }
    })
}

fn json_syntax_hint(err: &serde_json::Error) -> &'static str {
    let err_msg = err.to_string();

    if err_msg.contains("expected ','") || err_msg.contains("trailing comma") {
        error_hints::MISSING_COMMA
    } else if err_msg.contains("expected '}'") {
        error_hints::MISSING_BRACE
    } else if err_msg.contains("expected ']'") {
        error_hints::MISSING_BRACKET
    } else if err_msg.contains("expected '\"'") {
        error_hints::MISSING_QUOTES
    } else if err_msg.contains("control character") {
        error_hints::CONTROL_CHARS
    } else if err_msg.contains("expected value") {
        error_hints::EXPECTED_VALUE
    } else {
        error_hints::DEFAULT_SYNTAX
    }
}

fn data_validation_hint(err: &serde_json::Error) -> String {
    let err_msg = err.to_string();

    if err_msg.contains("invalid type") {
        if err_msg.contains("expected a map") || err_msg.contains("expected object") {
            "action arguments must be a JSON object".to_string()
        } else {
            format!("data type mismatch: {err_msg}")
        }
    } else {
        err_msg
    }
}
