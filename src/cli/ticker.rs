//! Ticker command implementation

use crate::config::{Config, MarketKind};
use crate::feed::{MarkPriceSnapshot, TickerSnapshot};
use crate::rest::BinanceRestClient;
use chrono::{TimeZone, Utc};
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct TickerArgs {
    /// Symbol to look up (defaults to the configured symbol)
    #[arg(short, long)]
    pub symbol: Option<String>,
}

impl TickerArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let symbol = self
            .symbol
            .as_deref()
            .unwrap_or(&config.feed.symbol)
            .to_uppercase();
        let client = BinanceRestClient::from_config(config)?;

        if client.market() == MarketKind::Spot {
            let ticker: TickerSnapshot = client.ticker_24h(&symbol).await?.into();
            print_ticker(&ticker);
            return Ok(());
        }

        let (ticker, premium, open_interest) = tokio::try_join!(
            client.ticker_24h(&symbol),
            client.premium_index(&symbol),
            client.open_interest(&symbol)
        )?;
        let ticker: TickerSnapshot = ticker.into();
        let mark: MarkPriceSnapshot = premium.into();

        print_ticker(&ticker);
        println!("  Open int: {}", open_interest.open_interest);
        println!("  Mark:     {}", mark.mark_price);
        println!(
            "  Funding:  {}%",
            (mark.funding_rate * Decimal::ONE_HUNDRED).round_dp(4)
        );
        if let Some(next) = Utc.timestamp_millis_opt(mark.next_funding_time).single() {
            println!("  Next funding: {}", next.format("%Y-%m-%d %H:%M UTC"));
        }

        Ok(())
    }
}

fn print_ticker(ticker: &TickerSnapshot) {
    println!("{}", ticker.symbol);
    println!(
        "  Last:     {} ({} / {}%)",
        ticker.last_price, ticker.price_change, ticker.price_change_percent
    );
    println!("  24h high: {}", ticker.high_24h);
    println!("  24h low:  {}", ticker.low_24h);
    println!("  Volume:   {}", ticker.volume);
    println!("  Trades:   {}", ticker.trade_count);
}
