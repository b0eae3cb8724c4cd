//! Binance REST payloads. Spot and futures share the kline and 24h ticker
//! shapes.

use crate::feed::{MarkPriceSnapshot, TickerSnapshot};
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// One closed or open candle from `/fapi/v1/klines` or `/api/v3/klines`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: i64,
    pub quote_volume: Decimal,
    pub trade_count: u64,
}

/// Klines arrive as positional arrays
#[derive(Deserialize)]
struct RawCandle(
    i64,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    i64,
    Decimal,
    u64,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
);

impl<'de> Deserialize<'de> for Candle {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawCandle::deserialize(deserializer)?;
        Ok(Candle {
            open_time: raw.0,
            open: raw.1,
            high: raw.2,
            low: raw.3,
            close: raw.4,
            volume: raw.5,
            close_time: raw.6,
            quote_volume: raw.7,
            trade_count: raw.8,
        })
    }
}

/// Closes in order, for the analysis helpers
pub fn closes(candles: &[Candle]) -> Vec<Decimal> {
    candles.iter().map(|c| c.close).collect()
}

/// 24h rolling ticker for one symbol. Extra spot fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    pub price_change: Decimal,
    pub price_change_percent: Decimal,
    pub last_price: Decimal,
    pub open_price: Decimal,
    pub high_price: Decimal,
    pub low_price: Decimal,
    pub volume: Decimal,
    pub quote_volume: Decimal,
    pub count: u64,
    pub close_time: i64,
}

impl From<Ticker24h> for TickerSnapshot {
    fn from(t: Ticker24h) -> Self {
        TickerSnapshot {
            symbol: t.symbol,
            last_price: t.last_price,
            price_change: t.price_change,
            price_change_percent: t.price_change_percent,
            volume: t.volume,
            high_24h: t.high_price,
            low_24h: t.low_price,
            open_price: t.open_price,
            trade_count: t.count,
            event_time: t.close_time,
        }
    }
}

/// `/fapi/v1/premiumIndex` for one symbol
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumIndex {
    pub symbol: String,
    pub mark_price: Decimal,
    pub index_price: Decimal,
    pub last_funding_rate: Decimal,
    pub next_funding_time: i64,
    pub time: i64,
}

impl From<PremiumIndex> for MarkPriceSnapshot {
    fn from(p: PremiumIndex) -> Self {
        MarkPriceSnapshot {
            symbol: p.symbol,
            mark_price: p.mark_price,
            index_price: Some(p.index_price),
            funding_rate: p.last_funding_rate,
            next_funding_time: p.next_funding_time,
            event_time: p.time,
        }
    }
}

/// `/fapi/v1/openInterest` for one symbol
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterest {
    pub symbol: String,
    /// In contracts (base asset units)
    pub open_interest: Decimal,
    pub time: i64,
}
