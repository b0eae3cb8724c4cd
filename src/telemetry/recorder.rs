//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Feed messages applied to the snapshot
    MessagesApplied,
    /// Feed messages that failed to parse
    ParseErrors,
    /// Messages dropped because they belonged to an old connection
    StaleMessages,
    /// Reconnect attempts scheduled
    Reconnects,
    /// Synthetic generator ticks published
    SyntheticTicks,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Last traded price
    LastPrice,
    /// Current funding rate
    FundingRate,
    /// 1 while the feed is connected, 0 otherwise
    Connected,
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::MessagesApplied => "perpfeed_messages_total",
            CounterMetric::ParseErrors => "perpfeed_parse_errors_total",
            CounterMetric::StaleMessages => "perpfeed_stale_messages_total",
            CounterMetric::Reconnects => "perpfeed_reconnects_total",
            CounterMetric::SyntheticTicks => "perpfeed_synthetic_ticks_total",
        }
    }
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::LastPrice => "perpfeed_last_price",
            GaugeMetric::FundingRate => "perpfeed_funding_rate",
            GaugeMetric::Connected => "perpfeed_connected",
        }
    }
}

/// Increment a counter for the given symbol
pub fn increment(metric: CounterMetric, symbol: &str) {
    metrics::counter!(metric.name(), "symbol" => symbol.to_string()).increment(1);
}

/// Set a gauge value for the given symbol
pub fn set_gauge(metric: GaugeMetric, symbol: &str, value: f64) {
    metrics::gauge!(metric.name(), "symbol" => symbol.to_string()).set(value);
}

/// Install the Prometheus recorder and its scrape endpoint
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
