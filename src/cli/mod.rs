//! CLI interface for perp-feed
//!
//! Provides subcommands for:
//! - `watch`: Stream live (or synthetic) market data and signals
//! - `ticker`: One-shot 24h ticker and funding lookup
//! - `candles`: Fetch klines and print indicators
//! - `config`: Show the resolved configuration

mod candles;
mod ticker;
mod watch;

pub use candles::CandlesArgs;
pub use ticker::TickerArgs;
pub use watch::WatchArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "perp-feed")]
#[command(about = "Binance perpetual futures market data feed")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream market data and evaluate signal rules
    Watch(WatchArgs),
    /// Show the 24h ticker and funding for a symbol
    Ticker(TickerArgs),
    /// Fetch candles and print indicators
    Candles(CandlesArgs),
    /// Show configuration
    Config,
}
