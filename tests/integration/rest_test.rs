//! Integration tests for the REST client against a mock server

use perp_feed::feed::TickerSnapshot;
use perp_feed::rest::{closes, BinanceRestClient, MarketKind, RestError};
use rust_decimal_macros::dec;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> BinanceRestClient {
    BinanceRestClient::new(server.uri(), Duration::from_secs(5)).unwrap()
}

async fn spot_client_for(server: &MockServer) -> BinanceRestClient {
    BinanceRestClient::spot(server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_klines_parse_arrays() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("interval", "1h"))
        .and(query_param("limit", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            [1704067200000i64, "43100.00", "43300.00", "43000.00", "43250.00", "812.5",
             1704070799999i64, "35000000.0", 4521, "400.0", "17000000.0", "0"],
            [1704070800000i64, "43250.00", "43400.00", "43200.00", "43380.00", "640.1",
             1704074399999i64, "27700000.0", 3980, "320.0", "13800000.0", "0"]
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let candles = client.klines("BTCUSDT", "1h", None).await.unwrap();

    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].open, dec!(43100.00));
    assert_eq!(candles[1].trade_count, 3980);
    assert_eq!(closes(&candles), vec![dec!(43250.00), dec!(43380.00)]);
}

#[tokio::test]
async fn test_klines_explicit_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            [1704067200000i64, "1", "1", "1", "1", "1", 1704070799999i64, "1", 1, "1", "1", "0"]
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let candles = client.klines("BTCUSDT", "15m", Some(50)).await.unwrap();
    assert_eq!(candles.len(), 1);
}

#[tokio::test]
async fn test_empty_klines_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.klines("BTCUSDT", "1h", None).await.unwrap_err();
    assert!(matches!(err, RestError::EmptyKlines { .. }));
}

#[tokio::test]
async fn test_ticker_24h() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/ticker/24hr"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "symbol": "BTCUSDT",
            "priceChange": "150.00",
            "priceChangePercent": "0.348",
            "weightedAvgPrice": "43200.00",
            "lastPrice": "43250.00",
            "lastQty": "0.010",
            "openPrice": "43100.00",
            "highPrice": "43800.00",
            "lowPrice": "42900.00",
            "volume": "15234.567",
            "quoteVolume": "658000000.00",
            "openTime": 1703980800000i64,
            "closeTime": 1704067200000i64,
            "firstId": 1,
            "lastId": 125678,
            "count": 125678
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let ticker: TickerSnapshot = client.ticker_24h("BTCUSDT").await.unwrap().into();
    assert_eq!(ticker.last_price, dec!(43250.00));
    assert_eq!(ticker.price_change, dec!(150.00));
    assert_eq!(ticker.high_24h, dec!(43800.00));
    assert_eq!(ticker.trade_count, 125678);
    assert_eq!(ticker.event_time, 1704067200000);
}

#[tokio::test]
async fn test_premium_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/premiumIndex"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "symbol": "BTCUSDT",
            "markPrice": "43251.10",
            "indexPrice": "43249.80",
            "estimatedSettlePrice": "43240.00",
            "lastFundingRate": "-0.00012000",
            "interestRate": "0.00010000",
            "nextFundingTime": 1704096000000i64,
            "time": 1704067200000i64
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let index = client.premium_index("BTCUSDT").await.unwrap();
    assert_eq!(index.mark_price, dec!(43251.10));
    assert_eq!(index.last_funding_rate, dec!(-0.00012));
}

#[tokio::test]
async fn test_open_interest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/openInterest"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "openInterest": "10659.509",
            "symbol": "BTCUSDT",
            "time": 1589437530011i64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let oi = client.open_interest("BTCUSDT").await.unwrap();
    assert_eq!(oi.symbol, "BTCUSDT");
    assert_eq!(oi.open_interest, dec!(10659.509));
    assert_eq!(oi.time, 1589437530011);
}

#[tokio::test]
async fn test_spot_klines_use_api_v3() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("symbol", "ETHUSDT"))
        .and(query_param("interval", "4h"))
        .and(query_param("limit", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            [1704067200000i64, "2280.10", "2295.00", "2270.00", "2290.55", "18250.3",
             1704081599999i64, "41700000.0", 51234, "9100.0", "20800000.0", "0"]
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = spot_client_for(&server).await;
    assert_eq!(client.market(), MarketKind::Spot);
    let candles = client.klines("ETHUSDT", "4h", None).await.unwrap();
    assert_eq!(candles.len(), 1);
    assert_eq!(candles[0].close, dec!(2290.55));
    assert_eq!(candles[0].trade_count, 51234);
}

#[tokio::test]
async fn test_spot_ticker_24h_uses_api_v3() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/24hr"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "symbol": "BTCUSDT",
            "priceChange": "-310.00",
            "priceChangePercent": "-0.712",
            "weightedAvgPrice": "43400.00",
            "prevClosePrice": "43560.00",
            "lastPrice": "43250.00",
            "lastQty": "0.002",
            "bidPrice": "43249.99",
            "bidQty": "1.5",
            "askPrice": "43250.00",
            "askQty": "0.7",
            "openPrice": "43560.00",
            "highPrice": "43900.00",
            "lowPrice": "43010.00",
            "volume": "24011.9",
            "quoteVolume": "1042000000.00",
            "openTime": 1703980800000i64,
            "closeTime": 1704067200000i64,
            "firstId": 3300000000i64,
            "lastId": 3301000000i64,
            "count": 1000001
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = spot_client_for(&server).await;
    let ticker: TickerSnapshot = client.ticker_24h("BTCUSDT").await.unwrap().into();
    assert_eq!(ticker.last_price, dec!(43250.00));
    assert_eq!(ticker.price_change_percent, dec!(-0.712));
    assert_eq!(ticker.low_24h, dec!(43010.00));
    assert_eq!(ticker.trade_count, 1000001);
}

#[tokio::test]
async fn test_spot_client_never_calls_futures_only_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = spot_client_for(&server).await;
    let err = client.open_interest("BTCUSDT").await.unwrap_err();
    assert!(matches!(err, RestError::Unsupported { market: MarketKind::Spot, .. }));
}

#[tokio::test]
async fn test_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(path("/fapi/v1/ticker/24hr"))
        .and(query_param("symbol", "LIMITED"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(path("/fapi/v1/ticker/24hr"))
        .and(query_param("symbol", "DOWN"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(path("/fapi/v1/ticker/24hr"))
        .and(query_param("symbol", "BOGUS"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"code":-1121,"msg":"Invalid symbol."}"#),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    let err = client.ticker_24h("LIMITED").await.unwrap_err();
    assert!(matches!(err, RestError::RateLimited));

    let err = client.ticker_24h("DOWN").await.unwrap_err();
    assert!(matches!(err, RestError::Server { status: 503 }));

    match client.ticker_24h("BOGUS").await.unwrap_err() {
        RestError::Api { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Invalid symbol"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}
