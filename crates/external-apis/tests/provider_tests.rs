// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the request pipeline and the provider clients
//!
//! Every upstream is served by a wiremock server so each branch of the
//! pipeline (cache, rate limit, status classification) can be observed
//! from the outside.

use std::time::Duration;

use api_client::{ApiError, Pagination};
use external_apis::{ProviderRegistry, hiro::InscriptionQuery};
use serde_json::json;
use shared_types::{SatRarity, Upstream};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

use fixtures::*;

fn inscription_path() -> String {
    format!("/ordinals/v1/inscriptions/{INSCRIPTION_ID}")
}

/// A fresh cache entry answers without a second request or a second token
#[tokio::test]
async fn repeated_lookup_is_served_from_cache() {
    let mock_server = MockServer::start().await;
    let mut settings = settings_for(&mock_server, Credentials::all());
    // 150 * 0.8 = 120 tokens, refilling 0.002 per ms
    settings.hiro.max_requests_per_minute = Some(150);
    let registry = ProviderRegistry::new(&settings).unwrap();
    let tokens_before = registry.provider_status()[0].available_tokens;

    Mock::given(method("GET"))
        .and(path(inscription_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(hiro_inscription())
                .insert_header("etag", "\"abc\""),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let first = registry.hiro().inscription(INSCRIPTION_ID).await.unwrap();
    let second = registry.hiro().inscription(INSCRIPTION_ID).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.view().unwrap().number, 0);

    let consumed = tokens_before - registry.provider_status()[0].available_tokens;
    assert!((consumed - 1.0).abs() < 0.5, "consumed {consumed} tokens");

    let cached = registry
        .cache()
        .get(&format!("hiro:inscription:{INSCRIPTION_ID}"))
        .unwrap();
    assert_eq!(cached.etag.as_deref(), Some("\"abc\""));

    let stats = registry.cache_stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.stores, 1);
}

/// Hiro receives its key in `x-hiro-api-key`
#[tokio::test]
async fn hiro_sends_api_key_header() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path(inscription_path()))
        .and(header("x-hiro-api-key", HIRO_KEY))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hiro_inscription()))
        .expect(1)
        .mount(&mock_server)
        .await;

    registry.hiro().inscription(INSCRIPTION_ID).await.unwrap();
}

/// Ordiscan and Magic Eden receive bearer tokens
#[tokio::test]
async fn bearer_providers_send_authorization_header() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path("/v1/rune/UNCOMMONGOODS/market"))
        .and(header("authorization", format!("Bearer {ORDISCAN_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "UNCOMMONGOODS",
            "price_usd": 0.0123,
            "market_cap_usd": 90_000.5,
            "volume_24h_usd": 1_200.0
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/ord/btc/tokens"))
        .and(header("authorization", format!("Bearer {MAGIC_EDEN_KEY}").as_str()))
        .and(query_param("collectionSymbol", "nodemonkes"))
        .and(query_param("listed", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": INSCRIPTION_ID,
            "token_id": INSCRIPTION_ID,
            "inscription_id": INSCRIPTION_ID,
            "price": 0.045,
            "seller": ADDRESS,
            "collection_symbol": "nodemonkes",
            "listed_at": "2024-05-01T00:00:00Z"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let market = registry
        .ordiscan()
        .rune_market("UNCOMMONGOODS")
        .await
        .unwrap()
        .view()
        .unwrap();
    assert_eq!(market.price_usd, Some(0.0123));

    let listings = registry
        .magic_eden()
        .collection_listings("nodemonkes", Pagination::default())
        .await
        .unwrap()
        .view()
        .unwrap();
    assert_eq!(listings.len(), 1);
    assert!((listings[0].price - 0.045).abs() < f64::EPSILON);
}

/// A missing key sends no auth header at all
#[tokio::test]
async fn no_credential_sends_no_auth_header() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::none());

    Mock::given(method("GET"))
        .and(path(inscription_path()))
        .and(header("x-hiro-api-key", HIRO_KEY))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(inscription_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(hiro_inscription()))
        .expect(1)
        .mount(&mock_server)
        .await;

    registry.hiro().inscription(INSCRIPTION_ID).await.unwrap();
}

/// A 429 with nothing cached is a rate-limit error
#[tokio::test]
async fn rate_limited_without_cache_fails() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path(inscription_path()))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let err = registry.hiro().inscription(INSCRIPTION_ID).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::RateLimited {
            upstream: Upstream::Hiro
        }
    );
    assert_eq!(err.to_string(), "Hiro API 429: Rate limited");
}

/// A 429 is answered from an expired cache entry
#[tokio::test]
async fn rate_limited_serves_expired_value() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    registry.cache().set(
        &format!("hiro:inscription:{INSCRIPTION_ID}"),
        hiro_inscription(),
        Duration::ZERO,
        None,
    );
    tokio::time::sleep(Duration::from_millis(5)).await;

    Mock::given(method("GET"))
        .and(path(inscription_path()))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    let inscription = registry.hiro().inscription(INSCRIPTION_ID).await.unwrap();
    assert_eq!(inscription.view().unwrap().id, INSCRIPTION_ID);

    let stats = registry.cache_stats();
    assert_eq!(stats.stale_hits, 1);
    assert_eq!(stats.expirations, 1);
}

/// Other error statuses carry the upstream body
#[tokio::test]
async fn error_status_carries_body() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path("/v1/collection/unknown-slug"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Collection not found"))
        .mount(&mock_server)
        .await;

    let err = registry
        .ordiscan()
        .collection("unknown-slug")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Ordiscan API 404: Collection not found");
    assert!(registry.cache().is_empty());
}

/// An empty error body falls back to the status text
#[tokio::test]
async fn empty_error_body_uses_status_text() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path("/v1/collection/puppets"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let err = registry.ordiscan().collection("puppets").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Http {
            upstream: Upstream::Ordiscan,
            status: 503,
            message: "Service Unavailable".to_string(),
        }
    );
}

/// A 2xx body that is not JSON is reported and not cached
#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path(inscription_path()))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let err = registry.hiro().inscription(INSCRIPTION_ID).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::InvalidResponse {
            upstream: Upstream::Hiro,
            ..
        }
    ));
    assert!(registry.cache().is_empty());
}

/// Fields beyond the typed view survive unchanged
#[tokio::test]
async fn undeclared_fields_are_passed_through() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    let mut body = hiro_inscription();
    body["delegate"] = json!(INSCRIPTION_ID);
    body["metadata"] = json!({"name": "Genesis"});
    Mock::given(method("GET"))
        .and(path(inscription_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&mock_server)
        .await;

    let inscription = registry.hiro().inscription(INSCRIPTION_ID).await.unwrap();
    assert_eq!(serde_json::to_value(&inscription).unwrap(), body);
    assert_eq!(inscription.view().unwrap().number, 0);
}

/// A body of an unexpected shape is still returned; only its typed view fails
#[tokio::test]
async fn unexpected_shape_is_returned_as_received() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path(inscription_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&mock_server)
        .await;

    let inscription = registry.hiro().inscription(INSCRIPTION_ID).await.unwrap();
    assert_eq!(inscription.raw(), &json!({"unexpected": true}));
    assert!(matches!(
        inscription.view(),
        Err(ApiError::InvalidResponse {
            upstream: Upstream::Hiro,
            ..
        })
    ));
    assert_eq!(registry.cache().len(), 1);
}

/// Hiro's BRC-20 token lookup wraps the token and its supply
#[tokio::test]
async fn brc20_token_has_token_and_supply() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path("/ordinals/v1/brc-20/tokens/ordi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hiro_brc20_token()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let token = registry.hiro().brc20_token("ordi").await.unwrap();
    assert_eq!(serde_json::to_value(&token).unwrap(), hiro_brc20_token());

    let details = token.view().unwrap();
    assert_eq!(details.token.ticker, "ordi");
    assert_eq!(details.supply.holders, 16_813);
}

/// Slow upstreams time out
#[tokio::test]
async fn slow_upstream_times_out() {
    let mock_server = MockServer::start().await;
    let mut settings = settings_for(&mock_server, Credentials::all());
    settings.hiro.timeout = Duration::from_millis(50);
    let registry = ProviderRegistry::new(&settings).unwrap();

    Mock::given(method("GET"))
        .and(path(inscription_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(hiro_inscription())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let err = registry.hiro().inscription(INSCRIPTION_ID).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Timeout {
            upstream: Upstream::Hiro,
            timeout_ms: 50
        }
    );
}

/// Unreachable upstreams are network errors
#[tokio::test]
async fn unreachable_upstream_is_network_error() {
    let mock_server = MockServer::start().await;
    let settings = settings_for(&mock_server, Credentials::all());
    drop(mock_server);
    let registry = ProviderRegistry::new(&settings).unwrap();

    let err = registry.hiro().inscription(INSCRIPTION_ID).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Network {
            upstream: Upstream::Hiro,
            ..
        }
    ));
}

/// Text content is returned verbatim
#[tokio::test]
async fn textual_content_is_returned_verbatim() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path(format!("{}/content", inscription_path())))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("gm ordinals", "text/plain;charset=utf-8"),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    for _ in 0..2 {
        let content = registry
            .hiro()
            .inscription_content(INSCRIPTION_ID)
            .await
            .unwrap();
        assert_eq!(content.content_type, "text/plain;charset=utf-8");
        assert_eq!(content.data, "gm ordinals");
    }
    assert!(registry.cache().is_empty());
}

/// Binary content becomes a base64 data URI
#[tokio::test]
async fn binary_content_is_base64_data_uri() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path(format!("{}/content", inscription_path())))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"))
        .mount(&mock_server)
        .await;

    let content = registry
        .hiro()
        .inscription_content(INSCRIPTION_ID)
        .await
        .unwrap();
    assert_eq!(content.content_type, "image/png");
    assert_eq!(content.data, "data:image/png;base64,iVBORw==");
}

/// Content errors use the status text, not the body
#[tokio::test]
async fn content_error_uses_status_text() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path(format!("{}/content", inscription_path())))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"error\":\"nope\"}"))
        .mount(&mock_server)
        .await;

    let err = registry
        .hiro()
        .inscription_content(INSCRIPTION_ID)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Hiro API 404: Not Found");
}

/// Search filters reach the upstream as query parameters
#[tokio::test]
async fn search_forwards_filters() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path("/ordinals/v1/inscriptions"))
        .and(query_param("address", ADDRESS))
        .and(query_param("rarity", "rare"))
        .and(query_param("from_block_height", "800000"))
        .and(query_param("offset", "20"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hiro_page(vec![hiro_inscription()])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let query = InscriptionQuery {
        address: Some(ADDRESS.to_string()),
        rarity: Some(SatRarity::Rare),
        from_block: Some(800_000),
        page: Pagination::new(Some(20), Some(10)).unwrap(),
        ..InscriptionQuery::default()
    };
    let page = registry
        .hiro()
        .search_inscriptions(&query)
        .await
        .unwrap()
        .view()
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.results[0].id, INSCRIPTION_ID);
}

/// Rune names with spacers are percent-encoded in the path
#[tokio::test]
async fn spaced_rune_name_is_percent_encoded() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, Credentials::all());

    Mock::given(method("GET"))
        .and(path("/runes/v1/etchings/UNCOMMON%E2%80%A2GOODS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hiro_rune()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let rune = registry
        .hiro()
        .rune("UNCOMMON•GOODS")
        .await
        .unwrap()
        .view()
        .unwrap();
    assert_eq!(rune.spaced_name, "UNCOMMON•GOODS");
    assert!(rune.turbo);
}
