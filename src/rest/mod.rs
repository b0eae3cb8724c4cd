//! Binance public REST endpoints
//!
//! Historical candles and one-shot ticker, funding and open interest lookups
//! used by the CLI and the analysis helpers. Futures endpoints live under
//! `/fapi/v1`; spot candles and tickers under `/api/v3`.

mod client;
mod types;

pub use crate::config::MarketKind;
pub use client::{
    BinanceRestClient, RestError, DEFAULT_KLINE_LIMIT, PRODUCTION_REST_URL,
    SPOT_PRODUCTION_REST_URL, SPOT_TESTNET_REST_URL, TESTNET_REST_URL,
};
pub use types::{closes, Candle, OpenInterest, PremiumIndex, Ticker24h};
