//! Configuration types for perp-feed

use crate::signal::SignalRule;
use crate::telemetry::LogFormat;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

/// API key values shipped in sample `.env` files that never authenticate
const PLACEHOLDER_KEYS: &[&str] = &[
    "your_binance_api_key_here",
    "your_testnet_api_key_here",
    "demo_mode",
];

const PLACEHOLDER_SECRETS: &[&str] = &[
    "your_binance_api_secret_here",
    "your_testnet_secret_key_here",
    "demo_mode",
];

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub synthetic: SyntheticConfig,
    #[serde(default)]
    pub rest: RestConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub signal: SignalConfig,
}

/// Target Binance environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Testnet,
}

/// Which Binance REST API the client talks to
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    /// USD-M perpetual futures, `/fapi/v1`
    #[default]
    Futures,
    /// Spot, `/api/v3`
    Spot,
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketKind::Futures => write!(f, "futures"),
            MarketKind::Spot => write!(f, "spot"),
        }
    }
}

/// Streaming feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub symbol: String,

    /// Explicit stream names; empty selects the default set
    #[serde(default)]
    pub streams: Vec<String>,

    #[serde(default)]
    pub environment: Environment,

    #[serde(default = "default_ws_url")]
    pub production_ws_url: String,

    #[serde(default = "default_ws_url")]
    pub testnet_ws_url: String,

    /// Reconnect ceiling (0 = retry forever)
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_initial_reconnect_delay_ms")]
    pub initial_reconnect_delay_ms: u64,

    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Heartbeat ping cadence
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

fn default_ws_url() -> String {
    "wss://fstream.binance.com".to_string()
}
fn default_max_reconnect_attempts() -> u32 {
    10
}
fn default_initial_reconnect_delay_ms() -> u64 {
    1_000
}
fn default_max_reconnect_delay_ms() -> u64 {
    30_000
}
fn default_ping_interval_secs() -> u64 {
    20
}

impl FeedConfig {
    pub fn initial_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.initial_reconnect_delay_ms)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

/// Upstream credentials, only inspected to pick live or synthetic mode
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// Force synthetic data even with real credentials
    #[serde(default)]
    pub demo: bool,
}

impl CredentialsConfig {
    /// Whether these credentials are good enough to open a live feed.
    ///
    /// Testnet only needs a key; production needs both key and secret.
    pub fn is_usable(&self, environment: Environment) -> bool {
        if self.demo {
            return false;
        }

        let key = self.api_key.trim();
        if key.is_empty() || PLACEHOLDER_KEYS.contains(&key) {
            return false;
        }

        if environment == Environment::Testnet {
            return true;
        }

        let secret = self.api_secret.trim();
        !secret.is_empty() && !PLACEHOLDER_SECRETS.contains(&secret)
    }
}

/// Synthetic data generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyntheticConfig {
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Fixed RNG seed for reproducible demo runs
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_tick_interval_secs() -> u64 {
    30
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
            seed: None,
        }
    }
}

impl SyntheticConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }
}

/// Public REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RestConfig {
    #[serde(default)]
    pub market: MarketKind,

    #[serde(default = "default_rest_production_url")]
    pub production_url: String,

    #[serde(default = "default_rest_testnet_url")]
    pub testnet_url: String,

    #[serde(default = "default_spot_production_url")]
    pub spot_production_url: String,

    #[serde(default = "default_spot_testnet_url")]
    pub spot_testnet_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_kline_limit")]
    pub kline_limit: u16,
}

fn default_rest_production_url() -> String {
    "https://fapi.binance.com".to_string()
}
fn default_rest_testnet_url() -> String {
    "https://testnet.binancefuture.com".to_string()
}
fn default_spot_production_url() -> String {
    "https://api.binance.com".to_string()
}
fn default_spot_testnet_url() -> String {
    "https://testnet.binance.vision".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_kline_limit() -> u16 {
    500
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            market: MarketKind::default(),
            production_url: default_rest_production_url(),
            testnet_url: default_rest_testnet_url(),
            spot_production_url: default_spot_production_url(),
            spot_testnet_url: default_spot_testnet_url(),
            timeout_secs: default_timeout_secs(),
            kline_limit: default_kline_limit(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus scrape port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

/// Signal rules table
#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    #[serde(default = "crate::signal::default_rules")]
    pub rules: Vec<SignalRule>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rules: crate::signal::default_rules(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Configuration bundled with the binary, used when no file is found
    pub fn bundled_default() -> anyhow::Result<Self> {
        toml::from_str(include_str!("../config.toml.example"))
            .context("bundled config.toml.example is invalid")
    }

    /// Apply `BINANCE_*` environment variables on top of the file values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("BINANCE_API_KEY") {
            self.credentials.api_key = key;
        }
        if let Some(secret) = lookup("BINANCE_API_SECRET") {
            self.credentials.api_secret = secret;
        }
        if let Some(testnet) = lookup("BINANCE_TESTNET") {
            self.feed.environment = if is_truthy(&testnet) {
                Environment::Testnet
            } else {
                Environment::Production
            };
        }
        if let Some(demo) = lookup("BINANCE_DEMO_MODE") {
            self.credentials.demo = is_truthy(&demo);
        }
    }

    /// WebSocket base URL for the configured environment
    pub fn ws_base_url(&self) -> &str {
        match self.feed.environment {
            Environment::Production => &self.feed.production_ws_url,
            Environment::Testnet => &self.feed.testnet_ws_url,
        }
    }

    /// REST base URL for the configured market and environment
    pub fn rest_base_url(&self) -> &str {
        match (self.rest.market, self.feed.environment) {
            (MarketKind::Futures, Environment::Production) => &self.rest.production_url,
            (MarketKind::Futures, Environment::Testnet) => &self.rest.testnet_url,
            (MarketKind::Spot, Environment::Production) => &self.rest.spot_production_url,
            (MarketKind::Spot, Environment::Testnet) => &self.rest.spot_testnet_url,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
