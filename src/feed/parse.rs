//! Binance stream message parsing
//!
//! Combined streams wrap every payload as `{"stream": ..., "data": ...}` and
//! are dispatched by stream name. Raw single-stream payloads arrive bare and
//! are dispatched by their `e` event type.

use super::types::{KlineSnapshot, MarkPriceSnapshot, TickerSnapshot};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A normalized record from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Replaces the ticker in full
    Ticker(TickerSnapshot),
    /// Merged alongside the ticker
    MarkPrice(MarkPriceSnapshot),
    /// Replaces the kline in full
    Kline(KlineSnapshot),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message has neither a stream envelope nor an event type")]
    UnknownShape,
    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamKind {
    Ticker,
    MarkPrice,
    Kline,
}

impl StreamKind {
    fn from_stream_name(stream: &str) -> Option<Self> {
        if stream.contains("@ticker") {
            Some(StreamKind::Ticker)
        } else if stream.contains("@markPrice") {
            Some(StreamKind::MarkPrice)
        } else if stream.contains("@kline") {
            Some(StreamKind::Kline)
        } else {
            None
        }
    }

    fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            "24hrTicker" => Some(StreamKind::Ticker),
            "markPriceUpdate" => Some(StreamKind::MarkPrice),
            "kline" => Some(StreamKind::Kline),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            StreamKind::Ticker => "ticker",
            StreamKind::MarkPrice => "mark price",
            StreamKind::Kline => "kline",
        }
    }
}

/// 24hr ticker payload
#[derive(Debug, Deserialize)]
struct RawTicker {
    #[serde(rename = "E", default)]
    event_time: i64,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price_change: Decimal,
    #[serde(rename = "P")]
    price_change_percent: Decimal,
    #[serde(rename = "c")]
    last_price: Decimal,
    #[serde(rename = "o")]
    open_price: Decimal,
    #[serde(rename = "h")]
    high_price: Decimal,
    #[serde(rename = "l")]
    low_price: Decimal,
    #[serde(rename = "v")]
    volume: Decimal,
    #[serde(rename = "n")]
    trade_count: u64,
}

/// Mark price payload
#[derive(Debug, Deserialize)]
struct RawMarkPrice {
    #[serde(rename = "E", default)]
    event_time: i64,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    mark_price: Decimal,
    #[serde(rename = "i", default)]
    index_price: Option<Decimal>,
    #[serde(rename = "r")]
    funding_rate: Decimal,
    #[serde(rename = "T")]
    next_funding_time: i64,
}

#[derive(Debug, Deserialize)]
struct RawKlineEvent {
    #[serde(rename = "k")]
    kline: RawKline,
}

#[derive(Debug, Deserialize)]
struct RawKline {
    #[serde(rename = "t")]
    open_time: i64,
    #[serde(rename = "T")]
    close_time: i64,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "i")]
    interval: String,
    #[serde(rename = "o")]
    open: Decimal,
    #[serde(rename = "c")]
    close: Decimal,
    #[serde(rename = "h")]
    high: Decimal,
    #[serde(rename = "l")]
    low: Decimal,
    #[serde(rename = "v")]
    volume: Decimal,
    #[serde(rename = "n")]
    trade_count: u64,
    #[serde(rename = "x", default)]
    is_closed: bool,
}

/// Parse one text frame.
///
/// Returns `Ok(None)` for well-formed messages this feed does not track
/// (other streams, subscription acks).
pub fn parse_message(text: &str) -> Result<Option<FeedEvent>, ParseError> {
    let mut value: Value = serde_json::from_str(text)?;

    if let Some(stream) = value.get("stream").and_then(Value::as_str) {
        let kind = StreamKind::from_stream_name(stream);
        let data = value.get_mut("data").map(Value::take);
        return match (kind, data) {
            (Some(kind), Some(data)) => decode(kind, data).map(Some),
            (None, Some(_)) => Ok(None),
            (_, None) => Err(ParseError::UnknownShape),
        };
    }

    if let Some(event_type) = value.get("e").and_then(Value::as_str) {
        return match StreamKind::from_event_type(event_type) {
            Some(kind) => decode(kind, value).map(Some),
            None => Ok(None),
        };
    }

    // Subscription acks look like {"result": null, "id": 1}
    if value.get("id").is_some() && value.get("result").is_some() {
        return Ok(None);
    }

    Err(ParseError::UnknownShape)
}

fn decode(kind: StreamKind, data: Value) -> Result<FeedEvent, ParseError> {
    let event = match kind {
        StreamKind::Ticker => {
            let raw: RawTicker = payload(kind, data)?;
            FeedEvent::Ticker(TickerSnapshot {
                symbol: raw.symbol,
                last_price: raw.last_price,
                price_change: raw.price_change,
                price_change_percent: raw.price_change_percent,
                volume: raw.volume,
                high_24h: raw.high_price,
                low_24h: raw.low_price,
                open_price: raw.open_price,
                trade_count: raw.trade_count,
                event_time: raw.event_time,
            })
        }
        StreamKind::MarkPrice => {
            let raw: RawMarkPrice = payload(kind, data)?;
            FeedEvent::MarkPrice(MarkPriceSnapshot {
                symbol: raw.symbol,
                mark_price: raw.mark_price,
                index_price: raw.index_price,
                funding_rate: raw.funding_rate,
                next_funding_time: raw.next_funding_time,
                event_time: raw.event_time,
            })
        }
        StreamKind::Kline => {
            let raw: RawKlineEvent = payload(kind, data)?;
            let k = raw.kline;
            FeedEvent::Kline(KlineSnapshot {
                symbol: k.symbol,
                interval: k.interval,
                open_time: k.open_time,
                close_time: k.close_time,
                open: k.open,
                high: k.high,
                low: k.low,
                close: k.close,
                volume: k.volume,
                trade_count: k.trade_count,
                is_closed: k.is_closed,
            })
        }
    };
    Ok(event)
}

fn payload<T: DeserializeOwned>(kind: StreamKind, data: Value) -> Result<T, ParseError> {
    serde_json::from_value(data).map_err(|source| ParseError::Payload {
        kind: kind.label(),
        source,
    })
}
