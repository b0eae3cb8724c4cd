//! Watch command implementation

use crate::config::{Config, MarketKind};
use crate::feed::{FeedClient, FeedMode, FeedSettings, FeedSnapshot, SyntheticMarkets};
use crate::rest::BinanceRestClient;
use crate::signal::SignalEngine;
use clap::Args;
use rust_decimal::Decimal;
use std::time::Duration;

const OPEN_INTEREST_POLL: Duration = Duration::from_secs(60);

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Symbol to watch (defaults to the configured symbol)
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Stream name to subscribe to; repeat for several
    #[arg(long = "stream")]
    pub streams: Vec<String>,

    /// Stop after this many seconds
    #[arg(short, long)]
    pub duration_secs: Option<u64>,
}

impl WatchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let symbol = self.symbol.as_deref().unwrap_or(&config.feed.symbol);
        let streams = if self.streams.is_empty() {
            config.feed.streams.clone()
        } else {
            self.streams.clone()
        };

        let settings = FeedSettings::from_config(config);
        let client = FeedClient::new(settings, SyntheticMarkets::from_config(&config.synthetic));
        let engine = SignalEngine::from_config(&config.signal);

        let handle = client.subscribe(symbol, &streams);
        tracing::info!(
            symbol = handle.symbol(),
            mode = ?client.mode(),
            streams = ?handle.streams(),
            "Watching market data"
        );

        let mut updates = handle.updates();
        let deadline = tokio::time::sleep(
            self.duration_secs
                .map(Duration::from_secs)
                .unwrap_or(Duration::MAX),
        );
        tokio::pin!(deadline);
        let mut last_rule: Option<String> = None;

        // Open interest only exists over futures REST
        let rest = match (client.mode(), config.rest.market) {
            (FeedMode::Live, MarketKind::Futures) => Some(BinanceRestClient::from_config(config)?),
            _ => None,
        };
        let mut oi_poll = tokio::time::interval(OPEN_INTEREST_POLL);
        let mut open_interest: Option<Decimal> = None;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted");
                    break;
                }
                _ = &mut deadline => break,
                _ = oi_poll.tick(), if rest.is_some() => {
                    if let Some(rest) = &rest {
                        match rest.open_interest(handle.symbol()).await {
                            Ok(oi) => open_interest = Some(oi.open_interest),
                            Err(e) => tracing::warn!(error = %e, "Open interest lookup failed"),
                        }
                    }
                }
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let mut snapshot = updates.borrow_and_update().clone();
                    snapshot.open_interest = open_interest;
                    println!("{}", render(&snapshot));

                    if let Some(signal) = engine.evaluate(&snapshot) {
                        if last_rule.as_deref() != Some(signal.rule.as_str()) {
                            println!(
                                "  signal {} {} @ {} (stop {}, target {}, {}x, confidence {}%)",
                                signal.side,
                                signal.rule,
                                signal.reference_price.round_dp(2),
                                signal.stop_loss.round_dp(2),
                                signal.take_profit.round_dp(2),
                                signal.leverage,
                                signal.confidence,
                            );
                            last_rule = Some(signal.rule);
                        }
                    }
                }
            }
        }

        handle.shutdown().await;
        Ok(())
    }
}

fn render(snapshot: &FeedSnapshot) -> String {
    let mut line = format!("{} [{:?}]", snapshot.symbol, snapshot.connection.status);

    if let Some(ticker) = &snapshot.ticker {
        line.push_str(&format!(
            " last={} chg={} ({}%) vol={}",
            ticker.last_price.round_dp(2),
            ticker.price_change.round_dp(2),
            ticker.price_change_percent.round_dp(3),
            ticker.volume.round_dp(3),
        ));
    }
    if let Some(mark) = &snapshot.mark_price {
        line.push_str(&format!(
            " mark={} funding={}%",
            mark.mark_price.round_dp(2),
            (mark.funding_rate * rust_decimal::Decimal::ONE_HUNDRED).round_dp(4),
        ));
    }
    if let Some(oi) = snapshot.open_interest() {
        line.push_str(&format!(" oi={}", oi.round_dp(0)));
    }
    if let Some(kline) = &snapshot.kline {
        line.push_str(&format!(" {}:close={}", kline.interval, kline.close.round_dp(2)));
    }
    if let Some(message) = snapshot.connection_error() {
        line.push_str(&format!(" ({})", message));
    }

    line
}
