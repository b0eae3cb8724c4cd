//! Synthetic market data for demo mode
//!
//! A slowly drifting random walk with occasional regime changes. One
//! [`SyntheticMarket`] per symbol is shared by every subscriber so they all
//! see the same price series; the state only advances once per tick
//! interval no matter how many subscribers sample it.

use super::types::{KlineSnapshot, MarkPriceSnapshot, TickerSnapshot};
use crate::config::SyntheticConfig;
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Chance per step of reversing the trend and redrawing volatility
const TREND_FLIP_PROBABILITY: f64 = 0.005;
/// Chance per step of pushing the 24h envelope out to the current price
const ENVELOPE_EXTEND_PROBABILITY: f64 = 0.01;
const TREND_BIAS: Decimal = dec!(0.2);
const VOLATILITY_MIN: f64 = 0.00005;
const VOLATILITY_MAX: f64 = 0.0002;
/// Price may overshoot the 24h envelope by at most this fraction
const ENVELOPE_SLACK: Decimal = dec!(0.0005);
const FUNDING_STEP: f64 = 0.0000025;
const FUNDING_LIMIT: Decimal = dec!(0.001);
/// Steps replayed at most when a sampler was idle for many intervals
const MAX_CATCH_UP_STEPS: u64 = 16;
const HOUR_MS: i64 = 3_600_000;

/// One consistent set of records produced by a generator step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticSample {
    pub ticker: TickerSnapshot,
    pub mark_price: MarkPriceSnapshot,
    pub kline: KlineSnapshot,
}

struct MarketState {
    symbol: String,
    price: Decimal,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    volume: Decimal,
    trade_count: u64,
    funding_rate: Decimal,
    /// +1 or -1
    trend: Decimal,
    volatility: Decimal,
    steps: u64,
    rng: StdRng,
    latest: SyntheticSample,
}

impl MarketState {
    fn new(symbol: &str, rng: StdRng) -> Self {
        let symbol = symbol.to_uppercase();
        let mut state = Self {
            latest: placeholder_sample(&symbol),
            symbol,
            price: dec!(43250.00),
            open: dec!(43100.00),
            high: dec!(43800.00),
            low: dec!(42900.00),
            volume: dec!(15234.567),
            trade_count: 125_678,
            funding_rate: dec!(0.0001),
            trend: Decimal::ONE,
            volatility: dec!(0.0001),
            steps: 0,
            rng,
        };
        state.latest = state.build_sample();
        state
    }

    fn step(&mut self) {
        if self.rng.gen_bool(TREND_FLIP_PROBABILITY) {
            self.trend = -self.trend;
            self.volatility = to_decimal(self.rng.gen_range(VOLATILITY_MIN..=VOLATILITY_MAX));
        }

        let noise = to_decimal(self.rng.gen_range(-1.0..=1.0));
        let delta = self.price * self.volatility * (noise + self.trend * TREND_BIAS);

        let floor = self.low * (Decimal::ONE - ENVELOPE_SLACK);
        let ceiling = self.high * (Decimal::ONE + ENVELOPE_SLACK);
        self.price = (self.price + delta).round_dp(2).clamp(floor, ceiling);

        if self.rng.gen_bool(ENVELOPE_EXTEND_PROBABILITY) {
            self.high = self.high.max(self.price);
            self.low = self.low.min(self.price);
        }

        self.volume += to_decimal(self.rng.gen_range(0.0..0.5)).round_dp(3);
        self.trade_count += self.rng.gen_range(0..=1u64);

        let funding_step = to_decimal(self.rng.gen_range(-FUNDING_STEP..=FUNDING_STEP));
        self.funding_rate = (self.funding_rate + funding_step)
            .round_dp(8)
            .clamp(-FUNDING_LIMIT, FUNDING_LIMIT);

        self.steps += 1;
        self.latest = self.build_sample();
    }

    fn build_sample(&mut self) -> SyntheticSample {
        let now_ms = Utc::now().timestamp_millis();

        let ticker = TickerSnapshot::from_prices(
            self.symbol.clone(),
            self.price,
            self.open,
            self.high,
            self.low,
            self.volume,
            self.trade_count,
            now_ms,
        );

        let mark_price = MarkPriceSnapshot {
            symbol: self.symbol.clone(),
            mark_price: (self.price + to_decimal(self.rng.gen_range(-0.5..=0.5))).round_dp(2),
            index_price: Some(self.price),
            funding_rate: self.funding_rate,
            next_funding_time: now_ms + HOUR_MS,
            event_time: now_ms,
        };

        let open = (self.price - to_decimal(self.rng.gen_range(-5.0..=5.0))).round_dp(2);
        let high = (open.max(self.price) + to_decimal(self.rng.gen_range(0.0..5.0))).round_dp(2);
        let low = (open.min(self.price) - to_decimal(self.rng.gen_range(0.0..5.0))).round_dp(2);
        let kline = KlineSnapshot {
            symbol: self.symbol.clone(),
            interval: "1h".to_string(),
            open_time: now_ms - HOUR_MS,
            close_time: now_ms,
            open,
            high,
            low,
            close: self.price,
            volume: to_decimal(self.rng.gen_range(15.0..40.0)).round_dp(3),
            trade_count: self.rng.gen_range(150..400),
            is_closed: false,
        };

        SyntheticSample {
            ticker,
            mark_price,
            kline,
        }
    }
}

fn placeholder_sample(symbol: &str) -> SyntheticSample {
    let zero = Decimal::ZERO;
    SyntheticSample {
        ticker: TickerSnapshot::from_prices(symbol, zero, zero, zero, zero, zero, 0, 0),
        mark_price: MarkPriceSnapshot {
            symbol: symbol.to_string(),
            mark_price: zero,
            index_price: None,
            funding_rate: zero,
            next_funding_time: 0,
            event_time: 0,
        },
        kline: KlineSnapshot {
            symbol: symbol.to_string(),
            interval: "1h".to_string(),
            open_time: 0,
            close_time: 0,
            open: zero,
            high: zero,
            low: zero,
            close: zero,
            volume: zero,
            trade_count: 0,
            is_closed: false,
        },
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Shared handle to one symbol's synthetic price series
#[derive(Clone)]
pub struct SyntheticMarket {
    state: Arc<Mutex<MarketState>>,
    origin: Instant,
    tick_interval: Duration,
}

impl SyntheticMarket {
    /// Create a market seeded from OS entropy
    pub fn new(symbol: &str, tick_interval: Duration) -> Self {
        Self::from_rng(symbol, tick_interval, StdRng::from_entropy())
    }

    /// Create a reproducible market
    pub fn with_seed(symbol: &str, tick_interval: Duration, seed: u64) -> Self {
        Self::from_rng(symbol, tick_interval, StdRng::seed_from_u64(seed))
    }

    fn from_rng(symbol: &str, tick_interval: Duration, rng: StdRng) -> Self {
        Self {
            state: Arc::new(Mutex::new(MarketState::new(symbol, rng))),
            origin: Instant::now(),
            tick_interval,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Latest sample as of `now`, stepping the series for every tick
    /// interval elapsed since the last step.
    ///
    /// Samplers reading within the same interval get identical values.
    pub fn sample(&self, now: Instant) -> SyntheticSample {
        let elapsed = now.saturating_duration_since(self.origin);
        let due = (elapsed.as_nanos() / self.tick_interval.as_nanos().max(1)) as u64;

        let mut state = self.state.lock();
        if due > state.steps {
            let missed = due - state.steps;
            if missed > MAX_CATCH_UP_STEPS {
                state.steps = due - MAX_CATCH_UP_STEPS;
            }
            while state.steps < due {
                state.step();
            }
        }
        state.latest.clone()
    }

    /// Force one step regardless of the tick cadence
    pub fn advance(&self) -> SyntheticSample {
        let mut state = self.state.lock();
        state.step();
        state.latest.clone()
    }

    /// Current 24h (high, low) envelope
    pub fn envelope(&self) -> (Decimal, Decimal) {
        let state = self.state.lock();
        (state.high, state.low)
    }
}

/// Per-symbol registry of shared synthetic markets.
///
/// Clones share the same registry, so every feed client built from one
/// registry sees one series per symbol.
#[derive(Clone)]
pub struct SyntheticMarkets {
    markets: Arc<Mutex<HashMap<String, SyntheticMarket>>>,
    tick_interval: Duration,
    seed: Option<u64>,
}

impl SyntheticMarkets {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            markets: Arc::new(Mutex::new(HashMap::new())),
            tick_interval,
            seed: None,
        }
    }

    /// Registry whose markets are seeded deterministically
    pub fn seeded(tick_interval: Duration, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new(tick_interval)
        }
    }

    pub fn from_config(config: &SyntheticConfig) -> Self {
        match config.seed {
            Some(seed) => Self::seeded(config.tick_interval(), seed),
            None => Self::new(config.tick_interval()),
        }
    }

    /// The market for `symbol`, created on first use
    pub fn market(&self, symbol: &str) -> SyntheticMarket {
        let key = symbol.to_uppercase();
        self.markets
            .lock()
            .entry(key)
            .or_insert_with_key(|key| match self.seed {
                Some(seed) => SyntheticMarket::with_seed(key, self.tick_interval, seed),
                None => SyntheticMarket::new(key, self.tick_interval),
            })
            .clone()
    }
}
