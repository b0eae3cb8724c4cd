//! Stream names and subscription URLs

/// Kline interval in the default subscription
pub const DEFAULT_KLINE_INTERVAL: &str = "1h";

pub fn ticker_stream(symbol: &str) -> String {
    format!("{}@ticker", symbol.to_lowercase())
}

/// Mark price stream at the 1s update speed
pub fn mark_price_stream(symbol: &str) -> String {
    format!("{}@markPrice@1s", symbol.to_lowercase())
}

pub fn kline_stream(symbol: &str, interval: &str) -> String {
    format!("{}@kline_{}", symbol.to_lowercase(), interval)
}

/// Ticker, mark price and one kline interval
pub fn default_streams(symbol: &str) -> Vec<String> {
    vec![
        ticker_stream(symbol),
        mark_price_stream(symbol),
        kline_stream(symbol, DEFAULT_KLINE_INTERVAL),
    ]
}

/// Use `requested` if non-empty, otherwise the default set
pub fn resolve_streams(symbol: &str, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        default_streams(symbol)
    } else {
        requested.to_vec()
    }
}

/// Single streams use the raw `/ws/<name>` endpoint; several streams use the
/// combined endpoint whose payloads arrive wrapped as `{stream, data}`.
pub fn build_stream_url(base: &str, streams: &[String]) -> String {
    let base = base.trim_end_matches('/');
    match streams {
        [single] => format!("{}/ws/{}", base, single),
        _ => format!("{}/stream?streams={}", base, streams.join("/")),
    }
}
