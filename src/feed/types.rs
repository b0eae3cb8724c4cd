//! Feed snapshot and connection state types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rolling 24h statistics for one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub symbol: String,
    pub last_price: Decimal,
    pub price_change: Decimal,
    /// Percent, so `0.35` means 0.35%
    pub price_change_percent: Decimal,
    pub volume: Decimal,
    pub high_24h: Decimal,
    pub low_24h: Decimal,
    pub open_price: Decimal,
    pub trade_count: u64,
    /// Exchange event time (epoch ms)
    pub event_time: i64,
}

impl TickerSnapshot {
    /// Build a ticker from raw prices, deriving the change fields from
    /// `last_price - open_price`
    #[allow(clippy::too_many_arguments)]
    pub fn from_prices(
        symbol: impl Into<String>,
        last_price: Decimal,
        open_price: Decimal,
        high_24h: Decimal,
        low_24h: Decimal,
        volume: Decimal,
        trade_count: u64,
        event_time: i64,
    ) -> Self {
        let price_change = last_price - open_price;
        let price_change_percent = if open_price.is_zero() {
            Decimal::ZERO
        } else {
            price_change / open_price * Decimal::ONE_HUNDRED
        };

        Self {
            symbol: symbol.into(),
            last_price,
            price_change,
            price_change_percent,
            volume,
            high_24h,
            low_24h,
            open_price,
            trade_count,
            event_time,
        }
    }
}

/// Mark price and funding for a perpetual contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPriceSnapshot {
    pub symbol: String,
    pub mark_price: Decimal,
    pub index_price: Option<Decimal>,
    /// Signed fraction per funding period, `0.0001` = 0.01%
    pub funding_rate: Decimal,
    /// Epoch ms
    pub next_funding_time: i64,
    pub event_time: i64,
}

/// Latest (possibly still open) candle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KlineSnapshot {
    pub symbol: String,
    pub interval: String,
    pub open_time: i64,
    pub close_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub trade_count: u64,
    pub is_closed: bool,
}

/// Where the feed's data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    Live,
    Synthetic,
}

/// Connection lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    /// Reconnect ceiling reached; terminal for this client
    Failed,
}

/// Single source of truth for connection indicators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub mode: FeedMode,
    /// Last error or advisory message
    pub message: Option<String>,
    pub reconnect_attempts: u32,
}

impl ConnectionState {
    pub fn connecting(mode: FeedMode) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            mode,
            message: None,
            reconnect_attempts: 0,
        }
    }

    /// Synthetic data is available immediately, so the feed starts connected
    /// with `notice` explaining where the data comes from
    pub fn synthetic(notice: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Connected,
            mode: FeedMode::Synthetic,
            message: Some(notice.into()),
            reconnect_attempts: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}

/// Everything a subscriber can read about one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub symbol: String,
    pub ticker: Option<TickerSnapshot>,
    pub mark_price: Option<MarkPriceSnapshot>,
    pub kline: Option<KlineSnapshot>,
    /// Open contracts, polled over REST; no stream carries it
    #[serde(default)]
    pub open_interest: Option<Decimal>,
    pub connection: ConnectionState,
    /// Number of records applied since subscribe
    pub updates: u64,
}

impl FeedSnapshot {
    pub fn new(symbol: impl Into<String>, mode: FeedMode) -> Self {
        Self {
            symbol: symbol.into(),
            ticker: None,
            mark_price: None,
            kline: None,
            open_interest: None,
            connection: ConnectionState::connecting(mode),
            updates: 0,
        }
    }

    pub fn last_price(&self) -> Option<Decimal> {
        self.ticker.as_ref().map(|t| t.last_price)
    }

    pub fn price_change(&self) -> Option<Decimal> {
        self.ticker.as_ref().map(|t| t.price_change)
    }

    pub fn price_change_percent(&self) -> Option<Decimal> {
        self.ticker.as_ref().map(|t| t.price_change_percent)
    }

    pub fn volume(&self) -> Option<Decimal> {
        self.ticker.as_ref().map(|t| t.volume)
    }

    pub fn high_24h(&self) -> Option<Decimal> {
        self.ticker.as_ref().map(|t| t.high_24h)
    }

    pub fn low_24h(&self) -> Option<Decimal> {
        self.ticker.as_ref().map(|t| t.low_24h)
    }

    pub fn open_price(&self) -> Option<Decimal> {
        self.ticker.as_ref().map(|t| t.open_price)
    }

    pub fn trade_count(&self) -> Option<u64> {
        self.ticker.as_ref().map(|t| t.trade_count)
    }

    pub fn mark_price(&self) -> Option<Decimal> {
        self.mark_price.as_ref().map(|m| m.mark_price)
    }

    pub fn funding_rate(&self) -> Option<Decimal> {
        self.mark_price.as_ref().map(|m| m.funding_rate)
    }

    pub fn next_funding_time(&self) -> Option<i64> {
        self.mark_price.as_ref().map(|m| m.next_funding_time)
    }

    pub fn open_interest(&self) -> Option<Decimal> {
        self.open_interest
    }

    pub fn current_kline(&self) -> Option<&KlineSnapshot> {
        self.kline.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn connection_error(&self) -> Option<&str> {
        self.connection.message.as_deref()
    }
}
