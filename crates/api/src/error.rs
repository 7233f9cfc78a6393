// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! Errors raised by the server itself: configuration, lifecycle and request
//! decoding. Failures of an action (validation or upstream errors) are not
//! represented here; they travel in-band inside the tool result.

use std::net::SocketAddr;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Server-level error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Runtime errors during server operation
    #[error("Runtime error: {message}")]
    Runtime {
        /// Error message
        message: String,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },

    /// Graceful shutdown exceeded its deadline
    #[error("Operation timed out after {timeout_seconds} seconds")]
    Timeout {
        /// Deadline that elapsed
        timeout_seconds: u64,
    },

    /// Signal handling errors
    #[error("Signal handling error: {message}")]
    Signal {
        /// Error message
        message: String,
    },

    /// Request body could not be decoded
    #[error("Invalid JSON request: {message}")]
    JsonError {
        /// Decoder message, with a hint where one applies
        message: String,
    },
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// HTTP status this error maps to
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::Runtime { .. }
            | Self::TaskJoin { .. }
            | Self::Signal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::JsonError { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}

impl From<prometheus::Error> for ServerError {
    fn from(err: prometheus::Error) -> Self {
        Self::Runtime {
            message: format!("metrics encoding failed: {err}"),
        }
    }
}
