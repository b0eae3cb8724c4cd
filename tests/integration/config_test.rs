//! Integration tests for configuration loading

use perp_feed::config::{Config, Environment};
use perp_feed::feed::{FeedMode, FeedSettings};
use perp_feed::signal::{Side, SignalEngine};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_minimal_file_fills_defaults() {
    let file = write_config(
        r#"
        [feed]
        symbol = "ETHUSDT"

        [telemetry]
        log_level = "debug"
        "#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.feed.symbol, "ETHUSDT");
    assert_eq!(config.feed.environment, Environment::Production);
    assert_eq!(config.feed.max_reconnect_attempts, 10);
    assert_eq!(config.synthetic.tick_interval_secs, 30);
    assert_eq!(config.rest.kline_limit, 500);
    assert_eq!(config.ws_base_url(), "wss://fstream.binance.com");
    assert_eq!(config.rest_base_url(), "https://fapi.binance.com");
    assert!(!config.signal.rules.is_empty());

    assert_eq!(FeedSettings::from_config(&config).mode, FeedMode::Synthetic);
}

#[test]
fn test_env_overrides_enable_live_testnet() {
    let file = write_config(
        r#"
        [feed]
        symbol = "BTCUSDT"

        [credentials]
        api_key = "your_binance_api_key_here"

        [telemetry]
        log_level = "info"
        "#,
    );

    let mut config = Config::load(file.path()).unwrap();
    assert_eq!(FeedSettings::from_config(&config).mode, FeedMode::Synthetic);

    config.apply_overrides(|name| match name {
        "BINANCE_API_KEY" => Some("abc123".to_string()),
        "BINANCE_TESTNET" => Some("true".to_string()),
        _ => None,
    });

    assert_eq!(config.feed.environment, Environment::Testnet);
    assert_eq!(config.rest_base_url(), "https://testnet.binancefuture.com");
    assert_eq!(FeedSettings::from_config(&config).mode, FeedMode::Live);

    config.apply_overrides(|name| (name == "BINANCE_DEMO_MODE").then(|| "1".to_string()));
    assert_eq!(FeedSettings::from_config(&config).mode, FeedMode::Synthetic);
}

#[test]
fn test_rule_table_from_file() {
    let file = write_config(
        r#"
        [feed]
        symbol = "BTCUSDT"

        [telemetry]
        log_level = "info"

        [[signal.rules]]
        name = "funding_squeeze"
        side = "short"
        confidence = 75
        leverage = 6
        conditions = [{ kind = "funding_above", value = "0.0005" }]

        [[signal.rules]]
        name = "fallback"
        side = "long"
        "#,
    );

    let config = Config::load(file.path()).unwrap();
    let engine = SignalEngine::from_config(&config.signal);
    assert_eq!(engine.rules().len(), 2);
    assert_eq!(engine.rules()[0].side, Side::Short);
    assert!(engine.rules()[1].conditions.is_empty());
}

#[test]
fn test_invalid_file_is_an_error() {
    let file = write_config("[feed\nsymbol = ");
    assert!(Config::load(file.path()).is_err());
}
