//! Signal rule table
//!
//! Rules are evaluated in order against the latest snapshot; the first rule
//! whose conditions all hold fires. A condition over a field the snapshot
//! does not have yet never holds.

use super::types::Side;
use crate::feed::FeedSnapshot;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One predicate over a snapshot. Percentages are in percent units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Condition {
    /// 24h change strictly above
    ChangePctAbove(Decimal),
    /// 24h change strictly below
    ChangePctBelow(Decimal),
    /// 24h change at or above
    ChangePctAtLeast(Decimal),
    /// Last price within this percent under the 24h high
    NearHighWithinPct(Decimal),
    /// Last price within this percent over the 24h low
    NearLowWithinPct(Decimal),
    /// 24h base volume strictly above
    VolumeAbove(Decimal),
    FundingAbove(Decimal),
    FundingBelow(Decimal),
    /// Absolute funding rate strictly above
    AbsFundingAbove(Decimal),
    OpenInterestAbove(Decimal),
}

impl Condition {
    pub fn holds(&self, snapshot: &FeedSnapshot) -> bool {
        match *self {
            Condition::ChangePctAbove(t) => compare(snapshot.price_change_percent(), |v| v > t),
            Condition::ChangePctBelow(t) => compare(snapshot.price_change_percent(), |v| v < t),
            Condition::ChangePctAtLeast(t) => compare(snapshot.price_change_percent(), |v| v >= t),
            Condition::NearHighWithinPct(pct) => match (snapshot.last_price(), snapshot.high_24h()) {
                (Some(last), Some(high)) => last > high * (Decimal::ONE - pct / Decimal::ONE_HUNDRED),
                _ => false,
            },
            Condition::NearLowWithinPct(pct) => match (snapshot.last_price(), snapshot.low_24h()) {
                (Some(last), Some(low)) => last < low * (Decimal::ONE + pct / Decimal::ONE_HUNDRED),
                _ => false,
            },
            Condition::VolumeAbove(t) => compare(snapshot.volume(), |v| v > t),
            Condition::FundingAbove(t) => compare(snapshot.funding_rate(), |v| v > t),
            Condition::FundingBelow(t) => compare(snapshot.funding_rate(), |v| v < t),
            Condition::AbsFundingAbove(t) => compare(snapshot.funding_rate(), |v| v.abs() > t),
            Condition::OpenInterestAbove(t) => compare(snapshot.open_interest(), |v| v > t),
        }
    }
}

fn compare(value: Option<Decimal>, pred: impl Fn(Decimal) -> bool) -> bool {
    value.is_some_and(pred)
}

fn default_confidence() -> u8 {
    50
}

fn default_leverage() -> u8 {
    1
}

/// A named conjunction of conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRule {
    pub name: String,
    pub side: Side,
    /// Empty matches every snapshot that has a price
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default = "default_confidence")]
    pub confidence: u8,
    #[serde(default = "default_leverage")]
    pub leverage: u8,
}

impl SignalRule {
    pub fn new(name: impl Into<String>, side: Side, conditions: Vec<Condition>) -> Self {
        Self {
            name: name.into(),
            side,
            conditions,
            confidence: default_confidence(),
            leverage: default_leverage(),
        }
    }

    pub fn with_sizing(mut self, confidence: u8, leverage: u8) -> Self {
        self.confidence = confidence;
        self.leverage = leverage;
        self
    }

    pub fn matches(&self, snapshot: &FeedSnapshot) -> bool {
        self.conditions.iter().all(|c| c.holds(snapshot))
    }
}

/// Futures heuristics used when the config has no `[[signal.rules]]`
pub fn default_rules() -> Vec<SignalRule> {
    use Condition::*;

    vec![
        SignalRule::new(
            "capitulation_long",
            Side::Long,
            vec![
                ChangePctBelow(dec!(-3)),
                NearLowWithinPct(dec!(2)),
                VolumeAbove(dec!(30000)),
                OpenInterestAbove(dec!(100000)),
            ],
        )
        .with_sizing(85, 10),
        SignalRule::new(
            "exhaustion_short",
            Side::Short,
            vec![
                ChangePctAbove(dec!(4)),
                NearHighWithinPct(dec!(2)),
                AbsFundingAbove(dec!(0.0001)),
            ],
        )
        .with_sizing(80, 8),
        SignalRule::new(
            "crowded_longs_short",
            Side::Short,
            vec![FundingAbove(dec!(0.0005)), ChangePctAbove(Decimal::ZERO)],
        )
        .with_sizing(75, 6),
        SignalRule::new(
            "crowded_shorts_long",
            Side::Long,
            vec![FundingBelow(dec!(-0.0005)), ChangePctBelow(Decimal::ZERO)],
        )
        .with_sizing(75, 6),
        SignalRule::new(
            "volume_breakout_long",
            Side::Long,
            vec![
                ChangePctAbove(Decimal::ZERO),
                VolumeAbove(dec!(30000)),
                OpenInterestAbove(dec!(100000)),
            ],
        )
        .with_sizing(70, 5),
        SignalRule::new(
            "drift_long",
            Side::Long,
            vec![ChangePctAtLeast(Decimal::ZERO)],
        )
        .with_sizing(60, 3),
        SignalRule::new(
            "drift_short",
            Side::Short,
            vec![ChangePctBelow(Decimal::ZERO)],
        )
        .with_sizing(60, 3),
    ]
}
