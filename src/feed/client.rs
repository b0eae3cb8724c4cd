//! Market data feed client
//!
//! One [`FeedHandle`] per subscription. The handle owns a worker task that
//! either follows a live Binance stream or samples the shared synthetic
//! market; either way subscribers only ever read the latest
//! [`FeedSnapshot`] from a `watch` channel.

use super::parse::{parse_message, FeedEvent};
use super::streams::{build_stream_url, resolve_streams};
use super::synthetic::{SyntheticMarkets, SyntheticSample};
use super::types::{ConnectionState, ConnectionStatus, FeedMode, FeedSnapshot};
use crate::config::Config;
use crate::telemetry::{self, CounterMetric, GaugeMetric};
use crate::ws::{Connector, TungsteniteConnector, WsClient, WsConfig, WsEvent};
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const SYNTHETIC_NOTICE: &str =
    "Demo mode: serving synthetic data. Configure real Binance API credentials to connect.";

/// Connection settings resolved once by the caller
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub mode: FeedMode,
    pub ws_base_url: String,
    pub max_reconnect_attempts: u32,
    pub initial_reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
    pub ping_interval: Duration,
}

impl FeedSettings {
    /// Live settings with default reconnect behaviour
    pub fn live(ws_base_url: impl Into<String>) -> Self {
        let defaults = WsConfig::default();
        Self {
            mode: FeedMode::Live,
            ws_base_url: ws_base_url.into(),
            max_reconnect_attempts: defaults.max_reconnect_attempts,
            initial_reconnect_delay: defaults.initial_reconnect_delay,
            max_reconnect_delay: defaults.max_reconnect_delay,
            ping_interval: defaults.ping_interval,
        }
    }

    pub fn synthetic() -> Self {
        Self {
            mode: FeedMode::Synthetic,
            ..Self::live(String::new())
        }
    }

    /// Pick the mode from the credentials and environment in `config`
    pub fn from_config(config: &Config) -> Self {
        let mode = if config.credentials.is_usable(config.feed.environment) {
            FeedMode::Live
        } else {
            FeedMode::Synthetic
        };

        Self {
            mode,
            ws_base_url: config.ws_base_url().to_string(),
            max_reconnect_attempts: config.feed.max_reconnect_attempts,
            initial_reconnect_delay: config.feed.initial_reconnect_delay(),
            max_reconnect_delay: config.feed.max_reconnect_delay(),
            ping_interval: config.feed.ping_interval(),
        }
    }

    fn ws_config(&self, url: String) -> WsConfig {
        WsConfig::new(url)
            .max_reconnects(self.max_reconnect_attempts)
            .initial_delay(self.initial_reconnect_delay)
            .max_delay(self.max_reconnect_delay)
            .ping_interval(self.ping_interval)
    }
}

/// Builds subscriptions; cheap to clone
#[derive(Clone)]
pub struct FeedClient {
    settings: FeedSettings,
    synthetic: SyntheticMarkets,
    connector: Arc<dyn Connector>,
}

impl FeedClient {
    pub fn new(settings: FeedSettings, synthetic: SyntheticMarkets) -> Self {
        Self {
            settings,
            synthetic,
            connector: Arc::new(TungsteniteConnector),
        }
    }

    /// Replace the socket connector used in live mode
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn mode(&self) -> FeedMode {
        self.settings.mode
    }

    /// Start streaming `symbol`. An empty `streams` selects ticker, mark
    /// price and the 1h kline.
    pub fn subscribe(&self, symbol: &str, streams: &[String]) -> FeedHandle {
        let symbol = symbol.to_uppercase();
        let streams = resolve_streams(&symbol, streams);
        let mut initial = FeedSnapshot::new(&symbol, self.settings.mode);
        if self.settings.mode == FeedMode::Synthetic {
            initial.connection = ConnectionState::synthetic(SYNTHETIC_NOTICE);
        }
        let (state_tx, state_rx) = watch::channel(initial);
        let shutdown = CancellationToken::new();

        let worker = match self.settings.mode {
            FeedMode::Synthetic => {
                tracing::info!(symbol = %symbol, "No usable credentials, using synthetic feed");
                let market = self.synthetic.market(&symbol);
                tokio::spawn(run_synthetic(
                    symbol.clone(),
                    market.tick_interval(),
                    move |now| market.sample(now),
                    state_tx,
                    shutdown.clone(),
                ))
            }
            FeedMode::Live => {
                let url = build_stream_url(&self.settings.ws_base_url, &streams);
                tracing::info!(symbol = %symbol, url = %url, "Subscribing to live feed");
                let ws = WsClient::with_connector(
                    self.settings.ws_config(url),
                    Arc::clone(&self.connector),
                );
                tokio::spawn(run_live(symbol.clone(), ws, state_tx, shutdown.clone()))
            }
        };

        FeedHandle {
            symbol,
            streams,
            state: state_rx,
            shutdown,
            worker: Some(worker),
        }
    }

    /// Tear down `previous` completely, then subscribe again
    pub async fn resubscribe(
        &self,
        previous: FeedHandle,
        symbol: &str,
        streams: &[String],
    ) -> FeedHandle {
        previous.shutdown().await;
        self.subscribe(symbol, streams)
    }
}

/// A live subscription. Dropping it unsubscribes.
pub struct FeedHandle {
    symbol: String,
    streams: Vec<String>,
    state: watch::Receiver<FeedSnapshot>,
    shutdown: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Streams actually requested
    pub fn streams(&self) -> &[String] {
        &self.streams
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn updates(&self) -> watch::Receiver<FeedSnapshot> {
        self.state.clone()
    }

    /// Cancel the reconnect timer, heartbeat and socket without waiting
    pub fn unsubscribe(&self) {
        self.shutdown.cancel();
    }

    /// Unsubscribe and wait for the worker to finish
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, symbol = %self.symbol, "Feed worker ended abnormally");
            }
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Follow WebSocket events and fold them into the snapshot
async fn run_live(
    symbol: String,
    ws: WsClient,
    state_tx: watch::Sender<FeedSnapshot>,
    shutdown: CancellationToken,
) {
    let (mut events, connection) = ws.connect(shutdown.clone());
    let mut active_generation = None;

    loop {
        let event = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        state_tx.send_modify(|snapshot| {
            apply_ws_event(&symbol, snapshot, &mut active_generation, event);
        });
    }

    // Release a task blocked on a full channel, then wait for the close frame
    drop(events);
    if let Err(e) = connection.await {
        tracing::warn!(symbol = %symbol, error = %e, "WebSocket task ended abnormally");
    }

    tracing::debug!(symbol = %symbol, "Live feed worker stopped");
}

/// Apply one WebSocket event. Text from any generation other than the
/// active one is dropped.
fn apply_ws_event(
    symbol: &str,
    snapshot: &mut FeedSnapshot,
    active_generation: &mut Option<u64>,
    event: WsEvent,
) {
    let connection = &mut snapshot.connection;

    match event {
        WsEvent::Connecting { attempt, .. } => {
            connection.status = ConnectionStatus::Connecting;
            connection.reconnect_attempts = attempt;
        }
        WsEvent::Connected { generation } => {
            *active_generation = Some(generation);
            connection.status = ConnectionStatus::Connected;
            connection.message = None;
            connection.reconnect_attempts = 0;
            telemetry::set_gauge(GaugeMetric::Connected, symbol, 1.0);
            tracing::info!(symbol, generation, "Feed connected");
        }
        WsEvent::Text { generation, text } => {
            if *active_generation != Some(generation) {
                telemetry::increment(CounterMetric::StaleMessages, symbol);
                tracing::debug!(symbol, generation, "Dropping message from stale connection");
                return;
            }
            match parse_message(&text) {
                Ok(Some(event)) => apply_feed_event(symbol, snapshot, event),
                Ok(None) => {}
                Err(e) => {
                    telemetry::increment(CounterMetric::ParseErrors, symbol);
                    tracing::warn!(symbol, error = %e, "Failed to parse feed message");
                    snapshot.connection.message =
                        Some(format!("Failed to parse real-time data: {}", e));
                }
            }
        }
        WsEvent::Error { error, .. } => {
            connection.status = ConnectionStatus::Disconnected;
            connection.message = Some(error.to_string());
            telemetry::set_gauge(GaugeMetric::Connected, symbol, 0.0);
        }
        WsEvent::Closed { generation, close } => {
            if *active_generation == Some(generation) {
                *active_generation = None;
            }
            connection.status = ConnectionStatus::Disconnected;
            telemetry::set_gauge(GaugeMetric::Connected, symbol, 0.0);
            tracing::info!(
                symbol,
                generation,
                code = close.as_ref().map(|c| c.code),
                "Feed disconnected"
            );
        }
        WsEvent::Reconnecting { attempt, delay } => {
            connection.reconnect_attempts = attempt;
            telemetry::increment(CounterMetric::Reconnects, symbol);
            tracing::info!(
                symbol,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Feed reconnect scheduled"
            );
        }
        WsEvent::Failed { attempts } => {
            connection.status = ConnectionStatus::Failed;
            connection.reconnect_attempts = attempts;
            connection.message = Some(format!(
                "Max reconnection attempts reached ({}). Check network connectivity and credentials.",
                attempts
            ));
            tracing::error!(symbol, attempts, "Feed gave up reconnecting");
        }
    }
}

/// Ticker and kline replace in full; mark price lives in its own slot so a
/// ticker replace never discards funding data
fn apply_feed_event(symbol: &str, snapshot: &mut FeedSnapshot, event: FeedEvent) {
    match event {
        FeedEvent::Ticker(ticker) => {
            if let Some(price) = ticker.last_price.to_f64() {
                telemetry::set_gauge(GaugeMetric::LastPrice, symbol, price);
            }
            snapshot.ticker = Some(ticker);
        }
        FeedEvent::MarkPrice(mark) => {
            if let Some(rate) = mark.funding_rate.to_f64() {
                telemetry::set_gauge(GaugeMetric::FundingRate, symbol, rate);
            }
            snapshot.mark_price = Some(mark);
        }
        FeedEvent::Kline(kline) => {
            snapshot.kline = Some(kline);
        }
    }
    snapshot.updates += 1;
    telemetry::increment(CounterMetric::MessagesApplied, symbol);
}

/// Publish a synthetic sample every tick until cancelled
async fn run_synthetic<F>(
    symbol: String,
    tick_interval: Duration,
    sample: F,
    state_tx: watch::Sender<FeedSnapshot>,
    shutdown: CancellationToken,
) where
    F: Fn(Instant) -> SyntheticSample + Send + 'static,
{
    let publish = |data: SyntheticSample| {
        state_tx.send_modify(|snapshot| {
            apply_feed_event(&symbol, snapshot, FeedEvent::Ticker(data.ticker));
            apply_feed_event(&symbol, snapshot, FeedEvent::MarkPrice(data.mark_price));
            apply_feed_event(&symbol, snapshot, FeedEvent::Kline(data.kline));
        });
        telemetry::increment(CounterMetric::SyntheticTicks, &symbol);
    };

    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            tick = ticker.tick() => publish(sample(tick)),
        }
    }

    tracing::debug!(symbol = %symbol, "Synthetic feed worker stopped");
}
