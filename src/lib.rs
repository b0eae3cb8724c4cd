//! perp-feed: market data client for Binance perpetual futures
//!
//! This library provides the core components for:
//! - Streaming ticker, mark price and kline data over WebSocket
//! - Automatic reconnection with exponential backoff and heartbeats
//! - A shared synthetic market when no usable credentials are configured
//! - Public REST lookups for candles, 24h tickers and funding
//! - Indicator helpers and a rule-based signal engine
//! - Structured logging and Prometheus metrics

pub mod analysis;
pub mod cli;
pub mod config;
pub mod feed;
pub mod rest;
pub mod signal;
pub mod telemetry;
pub mod ws;
