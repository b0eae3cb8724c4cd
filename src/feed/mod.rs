//! Market data feed
//!
//! Streams ticker, mark price and kline data for a perpetual contract from
//! Binance, or from a synthetic market when no usable credentials are set.

mod client;
mod parse;
mod streams;
mod synthetic;
mod types;

pub use client::{FeedClient, FeedHandle, FeedSettings};
pub use parse::{parse_message, FeedEvent, ParseError};
pub use streams::{
    build_stream_url, default_streams, kline_stream, mark_price_stream, resolve_streams,
    ticker_stream, DEFAULT_KLINE_INTERVAL,
};
pub use synthetic::{SyntheticMarket, SyntheticMarkets, SyntheticSample};
pub use types::{
    ConnectionState, ConnectionStatus, FeedMode, FeedSnapshot, KlineSnapshot, MarkPriceSnapshot,
    TickerSnapshot,
};
