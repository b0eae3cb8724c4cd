//! Public Binance REST client for futures and spot market data

use super::types::{Candle, OpenInterest, PremiumIndex, Ticker24h};
use crate::config::{Config, MarketKind};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Production REST base URL
pub const PRODUCTION_REST_URL: &str = "https://fapi.binance.com";
/// Testnet REST base URL
pub const TESTNET_REST_URL: &str = "https://testnet.binancefuture.com";
pub const SPOT_PRODUCTION_REST_URL: &str = "https://api.binance.com";
pub const SPOT_TESTNET_REST_URL: &str = "https://testnet.binance.vision";

pub const DEFAULT_KLINE_LIMIT: u16 = 500;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limit exceeded. Please wait before making more requests.")]
    RateLimited,

    #[error("Binance server error ({status}). Please try again later.")]
    Server { status: u16 },

    #[error("Binance API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("No kline data returned for {symbol} {interval}")]
    EmptyKlines { symbol: String, interval: String },

    #[error("{endpoint} is not available on the {market} market")]
    Unsupported {
        endpoint: &'static str,
        market: MarketKind,
    },
}

/// Client for the unauthenticated market data endpoints
#[derive(Debug, Clone)]
pub struct BinanceRestClient {
    base_url: String,
    market: MarketKind,
    kline_limit: u16,
    client: Client,
}

impl BinanceRestClient {
    /// Futures client rooted at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RestError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            market: MarketKind::Futures,
            kline_limit: DEFAULT_KLINE_LIMIT,
            client,
        })
    }

    /// Spot client rooted at `base_url`
    pub fn spot(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RestError> {
        Ok(Self::new(base_url, timeout)?.with_market(MarketKind::Spot))
    }

    /// Client for the configured market and environment
    pub fn from_config(config: &Config) -> Result<Self, RestError> {
        let mut client = Self::new(
            config.rest_base_url(),
            Duration::from_secs(config.rest.timeout_secs),
        )?
        .with_market(config.rest.market);
        client.kline_limit = config.rest.kline_limit;
        Ok(client)
    }

    /// Switch the API family used for every request
    pub fn with_market(mut self, market: MarketKind) -> Self {
        self.market = market;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn market(&self) -> MarketKind {
        self.market
    }

    /// Limit used when `klines` is called without one
    pub fn kline_limit(&self) -> u16 {
        self.kline_limit
    }

    /// Candles oldest first. An empty response is an error.
    pub async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: Option<u16>,
    ) -> Result<Vec<Candle>, RestError> {
        let limit = limit.unwrap_or(self.kline_limit).to_string();
        let candles: Vec<Candle> = self
            .get(
                &self.path("klines"),
                &[("symbol", symbol), ("interval", interval), ("limit", limit.as_str())],
            )
            .await?;

        if candles.is_empty() {
            return Err(RestError::EmptyKlines {
                symbol: symbol.to_string(),
                interval: interval.to_string(),
            });
        }

        Ok(candles)
    }

    pub async fn ticker_24h(&self, symbol: &str) -> Result<Ticker24h, RestError> {
        self.get(&self.path("ticker/24hr"), &[("symbol", symbol)]).await
    }

    /// Mark price and funding. Futures only.
    pub async fn premium_index(&self, symbol: &str) -> Result<PremiumIndex, RestError> {
        self.require_futures("premiumIndex")?;
        self.get(&self.path("premiumIndex"), &[("symbol", symbol)]).await
    }

    /// Open contracts for one symbol. Futures only.
    pub async fn open_interest(&self, symbol: &str) -> Result<OpenInterest, RestError> {
        self.require_futures("openInterest")?;
        self.get(&self.path("openInterest"), &[("symbol", symbol)]).await
    }

    fn path(&self, endpoint: &str) -> String {
        let prefix = match self.market {
            MarketKind::Futures => "/fapi/v1",
            MarketKind::Spot => "/api/v3",
        };
        format!("{}/{}", prefix, endpoint)
    }

    fn require_futures(&self, endpoint: &'static str) -> Result<(), RestError> {
        match self.market {
            MarketKind::Futures => Ok(()),
            MarketKind::Spot => Err(RestError::Unsupported {
                endpoint,
                market: self.market,
            }),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RestError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(url = %url, ?query, "Binance REST request");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(endpoint, status = status.as_u16(), body = %body, "Binance REST error");
            return Err(classify(status, body));
        }

        Ok(response.json().await?)
    }
}

fn classify(status: StatusCode, body: String) -> RestError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        RestError::RateLimited
    } else if status.is_server_error() {
        RestError::Server {
            status: status.as_u16(),
        }
    } else {
        RestError::Api {
            status: status.as_u16(),
            body,
        }
    }
}
