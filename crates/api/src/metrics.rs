// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use external_apis::CacheStats;
use prometheus::{
    Encoder, Gauge, HistogramVec, IntCounterVec, TextEncoder, register_gauge,
    register_histogram_vec, register_int_counter_vec,
};

use crate::{
    error::{ServerError, ServerResult},
    state::ServerState,
};

/// Action invocations, labeled by action name and outcome
pub static ACTION_CALLS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "ordinals_api_action_calls_total",
        "Total number of action invocations, labeled by action and outcome",
        &["action", "outcome"]
    )
    .expect("Failed to create ordinals_api_action_calls_total counter vec")
});

/// Histogram for action durations in seconds.
pub static ACTION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "ordinals_api_action_duration_seconds",
        "Action durations in seconds",
        &["action", "outcome"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create action duration histogram")
});

/// Failed actions, labeled by action and error kind
pub static ACTION_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "ordinals_api_action_errors_total",
        "Total number of failed actions, labeled by action and error kind",
        &["action", "kind"]
    )
    .expect("Failed to create action errors counter vec")
});

/// HTTP requests, labeled by method, matched route and status
pub static HTTP_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "ordinals_api_http_requests_total",
        "Total number of HTTP requests",
        &["method", "route", "status"]
    )
    .expect("Failed to create HTTP requests counter vec")
});

/// Cache hit rate gauge
pub static CACHE_HIT_RATE: LazyLock<Gauge> = LazyLock::new(|| {
    register_gauge!(
        "ordinals_api_cache_hit_rate",
        "Cache hit rate as a ratio (0.0 to 1.0)"
    )
    .expect("Failed to create cache hit rate gauge")
});

/// Cache size gauge
pub static CACHE_SIZE: LazyLock<Gauge> = LazyLock::new(|| {
    register_gauge!(
        "ordinals_api_cache_entries_count",
        "Current number of entries in cache"
    )
    .expect("Failed to create cache size gauge")
});

/// Stale cache reads served in place of a rate-limited upstream answer
pub static CACHE_STALE_HITS: LazyLock<Gauge> = LazyLock::new(|| {
    register_gauge!(
        "ordinals_api_cache_stale_hits",
        "Number of stale cache reads served after an upstream 429"
    )
    .expect("Failed to create cache stale hits gauge")
});

/// Record one finished action
///
/// # Arguments
/// * `action` - Action name
/// * `outcome` - `success` or `error`
/// * `duration_secs` - Wall time of the action in seconds
pub fn observe_action(action: &str, outcome: &str, duration_secs: f64) {
    ACTION_CALLS.with_label_values(&[action, outcome]).inc();
    ACTION_DURATION
        .with_label_values(&[action, outcome])
        .observe(duration_secs);
}

/// Count a failed action by error kind
pub fn record_action_error(action: &str, kind: &str) {
    ACTION_ERRORS.with_label_values(&[action, kind]).inc();
}

/// Count one HTTP request
pub fn record_http_request(method: &str, route: &str, status: u16) {
    let status = status.to_string();
    HTTP_REQUESTS
        .with_label_values(&[method, route, status.as_str()])
        .inc();
}

/// Update the cache gauges from a counter snapshot
#[allow(clippy::cast_precision_loss)]
pub fn update_cache_metrics(stats: &CacheStats) {
    CACHE_HIT_RATE.set(stats.hit_rate());
    CACHE_SIZE.set(stats.entries as f64);
    CACHE_STALE_HITS.set(stats.stale_hits as f64);
}

/// Axum handler that exports metrics in Prometheus text format
///
/// Cache gauges are refreshed from the registry on every scrape.
pub async fn metrics_handler(State(state): State<ServerState>) -> ServerResult<Response> {
    update_cache_metrics(&state.registry.cache_stats());

    let encoder = TextEncoder::new();
    let mut buffer = vec![];
    encoder.encode(&prometheus::gather(), &mut buffer)?;

    let body = String::from_utf8(buffer).map_err(|e| ServerError::Runtime {
        message: format!("metrics buffer is not valid UTF-8: {e}"),
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        body,
    )
        .into_response())
}
