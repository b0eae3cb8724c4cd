//! Candles command implementation

use crate::analysis::{self, DEFAULT_RSI_PERIOD, DEFAULT_VOLATILITY_PERIOD};
use crate::config::Config;
use crate::feed::DEFAULT_KLINE_INTERVAL;
use crate::rest::{closes, BinanceRestClient};
use clap::Args;

const SMA_PERIOD: usize = 20;

#[derive(Args, Debug)]
pub struct CandlesArgs {
    /// Symbol to fetch (defaults to the configured symbol)
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Kline interval, e.g. 1m, 15m, 1h, 1d
    #[arg(short, long, default_value = DEFAULT_KLINE_INTERVAL)]
    pub interval: String,

    /// Number of candles (defaults to the configured limit)
    #[arg(short, long)]
    pub limit: Option<u16>,
}

impl CandlesArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let symbol = self
            .symbol
            .as_deref()
            .unwrap_or(&config.feed.symbol)
            .to_uppercase();
        let client = BinanceRestClient::from_config(config)?;

        let candles = client.klines(&symbol, &self.interval, self.limit).await?;
        let closes = closes(&candles);
        tracing::debug!(symbol = %symbol, count = candles.len(), "Fetched candles");

        if let Some(last) = candles.last() {
            println!(
                "{} {} x{}: O {} H {} L {} C {}",
                symbol,
                self.interval,
                candles.len(),
                last.open,
                last.high,
                last.low,
                last.close
            );
        }
        println!(
            "  RSI({}):        {}",
            DEFAULT_RSI_PERIOD,
            analysis::rsi(&closes, DEFAULT_RSI_PERIOD).round_dp(2)
        );
        println!(
            "  SMA({}):        {}",
            SMA_PERIOD,
            analysis::sma(&closes, SMA_PERIOD).round_dp(2)
        );
        println!(
            "  Volatility({}): {}",
            DEFAULT_VOLATILITY_PERIOD,
            analysis::volatility(&closes, DEFAULT_VOLATILITY_PERIOD).round_dp(2)
        );
        println!("  Trend:          {}", analysis::trend(&closes));

        Ok(())
    }
}
