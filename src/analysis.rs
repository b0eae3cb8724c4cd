//! Indicators over candle closes
//!
//! All functions read the most recent values at the end of the slice.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_VOLATILITY_PERIOD: usize = 20;

/// Points in each half of the trend comparison
const TREND_WINDOW: usize = 10;

/// Relative move between the two trend windows that counts as a trend
const TREND_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

const NEUTRAL_RSI: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Relative strength index using simple averages of the last `period`
/// changes. Returns 50 with too little data and 100 when there were no
/// losses.
pub fn rsi(closes: &[Decimal], period: usize) -> Decimal {
    if period == 0 || closes.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let recent = &closes[closes.len() - period - 1..];
    let (gains, losses) = recent
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((Decimal::ZERO, Decimal::ZERO), |(g, l), change| {
            if change > Decimal::ZERO {
                (g + change, l)
            } else {
                (g, l + change.abs())
            }
        });

    if losses.is_zero() {
        return Decimal::ONE_HUNDRED;
    }

    // Equal divisors cancel out of avg_gain / avg_loss
    let rs = gains / losses;
    Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs)
}

/// Simple moving average of the last `period` closes. Falls back to the
/// last close with too little data and to zero for an empty slice.
pub fn sma(closes: &[Decimal], period: usize) -> Decimal {
    match closes.last() {
        None => Decimal::ZERO,
        Some(last) if period == 0 || closes.len() < period => *last,
        Some(_) => {
            let window = &closes[closes.len() - period..];
            window.iter().sum::<Decimal>() / Decimal::from(period)
        }
    }
}

/// Population standard deviation of the last `period` closes, in price
/// units. Zero with too little data.
pub fn volatility(closes: &[Decimal], period: usize) -> Decimal {
    if period == 0 || closes.len() < period {
        return Decimal::ZERO;
    }

    let window: Vec<f64> = closes[closes.len() - period..]
        .iter()
        .filter_map(|c| c.to_f64())
        .collect();
    let n = window.len() as f64;
    if window.is_empty() {
        return Decimal::ZERO;
    }

    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;

    Decimal::from_f64(variance.sqrt()).unwrap_or(Decimal::ZERO)
}

/// Direction of the market over the last twenty closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Sideways,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Trend::Bullish => "bullish",
            Trend::Bearish => "bearish",
            Trend::Sideways => "sideways",
        };
        f.write_str(label)
    }
}

/// Compare the mean of the last ten closes with the ten before them
pub fn trend(closes: &[Decimal]) -> Trend {
    if closes.len() < TREND_WINDOW * 2 {
        return Trend::Sideways;
    }

    let split = closes.len() - TREND_WINDOW;
    let recent = sma(&closes[split..], TREND_WINDOW);
    let older = sma(&closes[split - TREND_WINDOW..split], TREND_WINDOW);
    if older.is_zero() {
        return Trend::Sideways;
    }

    let change = (recent - older) / older;
    if change > TREND_THRESHOLD {
        Trend::Bullish
    } else if change < -TREND_THRESHOLD {
        Trend::Bearish
    } else {
        Trend::Sideways
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn series(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|v| Decimal::from(*v)).collect()
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let closes = series(&[1, 2, 3]);
        assert_eq!(rsi(&closes, DEFAULT_RSI_PERIOD), dec!(50));
    }

    #[test]
    fn test_rsi_no_losses() {
        let closes: Vec<Decimal> = (1..=15).map(Decimal::from).collect();
        assert_eq!(rsi(&closes, DEFAULT_RSI_PERIOD), dec!(100));
    }

    #[test]
    fn test_rsi_balanced_moves() {
        // +2, -2 alternating: equal gains and losses
        let closes = series(&[10, 12, 10, 12, 10]);
        assert_eq!(rsi(&closes, 4), dec!(50));
    }

    #[test]
    fn test_rsi_uses_only_latest_changes() {
        // Early crash is outside the window
        let closes = series(&[100, 10, 11, 12, 13]);
        assert_eq!(rsi(&closes, 3), dec!(100));
    }

    #[test]
    fn test_rsi_weighted() {
        // gains 3, losses 1 -> rs 3 -> 75
        let closes = series(&[10, 13, 12]);
        assert_eq!(rsi(&closes, 2), dec!(75));
    }

    #[test]
    fn test_sma() {
        assert_eq!(sma(&[], 5), Decimal::ZERO);
        assert_eq!(sma(&series(&[4, 8]), 5), dec!(8));
        assert_eq!(sma(&series(&[1, 2, 3, 4]), 2), dec!(3.5));
    }

    #[test]
    fn test_volatility() {
        assert_eq!(volatility(&series(&[1, 2]), DEFAULT_VOLATILITY_PERIOD), Decimal::ZERO);

        let closes = series(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(volatility(&closes, 8), dec!(2));

        let flat = vec![dec!(43250); 20];
        assert_eq!(volatility(&flat, DEFAULT_VOLATILITY_PERIOD), Decimal::ZERO);
    }

    #[test]
    fn test_trend() {
        let mut closes = vec![dec!(100); 10];
        closes.extend(vec![dec!(102); 10]);
        assert_eq!(trend(&closes), Trend::Bullish);

        let mut closes = vec![dec!(100); 10];
        closes.extend(vec![dec!(98); 10]);
        assert_eq!(trend(&closes), Trend::Bearish);

        let mut closes = vec![dec!(100); 10];
        closes.extend(vec![dec!(100.5); 10]);
        assert_eq!(trend(&closes), Trend::Sideways);
    }

    #[test]
    fn test_trend_short_series_is_sideways() {
        let closes: Vec<Decimal> = (1..=19).map(|v| Decimal::from(v * 100)).collect();
        assert_eq!(trend(&closes), Trend::Sideways);
    }
}
