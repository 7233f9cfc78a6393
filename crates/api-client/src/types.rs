// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Common payload envelopes shared by providers and actions

use std::{fmt, marker::PhantomData};

use serde::{Deserialize, Serialize, Serializer, de::DeserializeOwned};
use serde_json::Value;
use shared_types::Upstream;
use utoipa::ToSchema;

use crate::{ApiError, ApiResult};

/// Default page size used when the caller does not ask for one
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
/// Largest page size any provider accepts
pub const MAX_PAGE_LIMIT: u32 = 60;

/// Offset pagination envelope returned by Hiro list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Page size the upstream applied
    pub limit: u32,
    /// Offset of the first result
    pub offset: u64,
    /// Total number of matching results
    pub total: u64,
    /// Results on this page
    pub results: Vec<T>,
}

/// Offset and limit of a paginated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Results per page, 1 to 60
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Pagination {
    /// Build a pagination window, applying defaults for missing values
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if `limit` is outside `1..=60`.
    pub fn new(offset: Option<u64>, limit: Option<u32>) -> ApiResult<Self> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(ApiError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}, got {limit}"
            )));
        }
        Ok(Self {
            offset: offset.unwrap_or(0),
            limit,
        })
    }
}

/// Raw inscription content
///
/// `data` holds the body verbatim for textual content types and a
/// `data:<type>;base64,<payload>` URI for everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InscriptionContent {
    /// Content type reported by the upstream
    pub content_type: String,
    /// Text body or base64 data URI
    pub data: String,
}

/// JSON body returned by an upstream, with `T` as its typed view
///
/// The body is kept exactly as the upstream sent it and serializes back
/// unchanged, so fields `T` does not declare still reach the caller. Decoding
/// into `T` happens only when [`Payload::view`] is called.
pub struct Payload<T> {
    upstream: Upstream,
    raw: Value,
    view: PhantomData<fn() -> T>,
}

impl<T> Payload<T> {
    /// Wrap a body received from `upstream`
    pub const fn new(upstream: Upstream, raw: Value) -> Self {
        Self {
            upstream,
            raw,
            view: PhantomData,
        }
    }

    /// Upstream that produced the body
    pub const fn upstream(&self) -> Upstream {
        self.upstream
    }

    /// The body as received
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Take the body as received
    pub fn into_raw(self) -> Value {
        self.raw
    }
}

impl<T: DeserializeOwned> Payload<T> {
    /// Decode the body into its typed view
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidResponse`] if the body does not have the
    /// shape of `T`.
    pub fn view(&self) -> ApiResult<T> {
        T::deserialize(&self.raw).map_err(|e| ApiError::InvalidResponse {
            upstream: self.upstream,
            message: e.to_string(),
        })
    }
}

impl<T> Clone for Payload<T> {
    fn clone(&self) -> Self {
        Self::new(self.upstream, self.raw.clone())
    }
}

impl<T> PartialEq for Payload<T> {
    fn eq(&self, other: &Self) -> bool {
        self.upstream == other.upstream && self.raw == other.raw
    }
}

impl<T> fmt::Debug for Payload<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("upstream", &self.upstream)
            .field("raw", &self.raw)
            .finish()
    }
}

impl<T> Serialize for Payload<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// Result of a call that may have been answered by either of two providers
///
/// Serialized untagged, so consumers see the payload only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Sourced<A, B> {
    /// Answered by the primary provider
    Primary(A),
    /// Answered by the secondary provider
    Secondary(B),
}

impl<A, B> Sourced<A, B> {
    /// Whether the primary provider produced this value
    pub const fn is_primary(&self) -> bool {
        matches!(self, Self::Primary(_))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pagination_defaults() {
        let page = Pagination::new(None, None).unwrap();
        assert_eq!(page, Pagination::default());
        assert_eq!(page.limit, 20);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn pagination_rejects_out_of_range_limits() {
        assert!(Pagination::new(Some(5), Some(60)).is_ok());
        assert!(matches!(
            Pagination::new(None, Some(0)),
            Err(ApiError::Validation { .. })
        ));
        assert!(matches!(
            Pagination::new(None, Some(61)),
            Err(ApiError::Validation { .. })
        ));
    }

    #[test]
    fn sourced_serializes_payload_only() {
        let primary: Sourced<Vec<u32>, String> = Sourced::Primary(vec![1, 2]);
        let secondary: Sourced<Vec<u32>, String> = Sourced::Secondary("x".to_string());

        assert_eq!(serde_json::to_value(&primary).unwrap(), json!([1, 2]));
        assert_eq!(serde_json::to_value(&secondary).unwrap(), json!("x"));
        assert!(primary.is_primary());
        assert!(!secondary.is_primary());
    }

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn payload_serializes_the_body_unchanged() {
        let body = json!({"name": "x", "delegate": null, "metadata": {"k": 1}});
        let payload: Payload<Named> = Payload::new(Upstream::Hiro, body.clone());

        assert_eq!(serde_json::to_value(&payload).unwrap(), body);
        assert_eq!(payload.view().unwrap().name, "x");
        assert_eq!(payload.upstream(), Upstream::Hiro);
    }

    #[test]
    fn payload_view_reports_shape_mismatch() {
        let payload: Payload<Named> = Payload::new(Upstream::Ordiscan, json!({"data": []}));

        assert!(matches!(
            payload.view(),
            Err(ApiError::InvalidResponse {
                upstream: Upstream::Ordiscan,
                ..
            })
        ));
        assert_eq!(payload.into_raw(), json!({"data": []}));
    }

    #[test]
    fn page_parses_hiro_envelope() {
        let page: Page<serde_json::Value> = serde_json::from_value(json!({
            "limit": 20,
            "offset": 0,
            "total": 1,
            "results": [{"id": "abc"}]
        }))
        .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.results.len(), 1);
    }
}
