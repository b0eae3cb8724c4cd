use clap::Parser;
use perp_feed::cli::{Cli, Commands};
use perp_feed::config::Config;
use perp_feed::feed::FeedSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            Config::bundled_default()?
        }
    };
    config.apply_env_overrides();

    // Initialize telemetry
    let _telemetry = perp_feed::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Watch(args) => {
            tracing::info!("Starting market data watch");
            args.execute(&config).await?;
        }
        Commands::Ticker(args) => args.execute(&config).await?,
        Commands::Candles(args) => args.execute(&config).await?,
        Commands::Config => {
            let settings = FeedSettings::from_config(&config);
            println!("Current configuration:");
            println!("  Symbol: {}", config.feed.symbol);
            println!("  Environment: {:?}", config.feed.environment);
            println!("  Mode: {:?}", settings.mode);
            println!("  WebSocket: {}", config.ws_base_url());
            println!("  REST: {}", config.rest_base_url());
            println!(
                "  Reconnect: max {} attempts, {}ms .. {}ms backoff",
                config.feed.max_reconnect_attempts,
                config.feed.initial_reconnect_delay_ms,
                config.feed.max_reconnect_delay_ms
            );
            println!("  Synthetic tick: {}s", config.synthetic.tick_interval_secs);
            println!("  Signal rules: {}", config.signal.rules.len());
        }
    }

    Ok(())
}
