// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Two-provider fallback orchestration
//!
//! Credential presence decides which providers are attempted:
//!
//! | primary key | secondary key | behavior |
//! |---|---|---|
//! | yes | yes | primary, then secondary if the primary fails |
//! | yes | no  | primary only, its error returned unchanged |
//! | no  | yes | secondary only |
//! | no  | no  | [`ApiError::NoCredential`] without any request |

use api_client::{ApiError, ApiResult, Sourced, UpstreamClient};
use tracing::{debug, warn};

/// Run `primary_call` and/or `secondary_call` according to the credential
/// policy
///
/// The calls are lazy futures; a call that is not attempted is dropped
/// without being polled, so it never touches the cache, the limiter or the
/// network.
///
/// # Errors
///
/// Returns the primary's error when it fails and the secondary has no
/// credential, the secondary's error when it is attempted and fails, and
/// [`ApiError::NoCredential`] when neither provider has a credential.
pub async fn with_fallback<P, S, A, B>(
    primary: &P,
    secondary: &S,
    primary_call: impl Future<Output = ApiResult<A>>,
    secondary_call: impl Future<Output = ApiResult<B>>,
) -> ApiResult<Sourced<A, B>>
where
    P: UpstreamClient + ?Sized,
    S: UpstreamClient + ?Sized,
{
    if primary.has_credential() {
        match primary_call.await {
            Ok(value) => return Ok(Sourced::Primary(value)),
            Err(error) if !secondary.has_credential() => return Err(error),
            Err(error) => {
                warn!(
                    primary = primary.upstream().name(),
                    secondary = secondary.upstream().name(),
                    error = %error,
                    "primary upstream failed, falling back"
                );
            }
        }
    } else {
        debug!(
            primary = primary.upstream().name(),
            "primary upstream has no credential, skipping"
        );
    }

    if secondary.has_credential() {
        return secondary_call.await.map(Sourced::Secondary);
    }

    Err(ApiError::NoCredential {
        primary: primary.upstream(),
        secondary: secondary.upstream(),
    })
}
