//! Signal types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stop distance from the reference price, in percent
pub const STOP_LOSS_PCT: Decimal = dec!(2.0);
/// Take-profit distance as a multiple of the stop distance
pub const REWARD_RATIO: Decimal = dec!(2.5);

/// Position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// A directional call derived from one feed snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Unique signal identifier
    pub id: Uuid,
    /// Name of the rule that fired
    pub rule: String,
    pub side: Side,
    /// Last price when the signal fired
    pub reference_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// 0-100
    pub confidence: u8,
    pub leverage: u8,
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    /// Create a signal with stop and target derived from `reference_price`
    pub fn new(
        rule: impl Into<String>,
        side: Side,
        reference_price: Decimal,
        confidence: u8,
        leverage: u8,
    ) -> Self {
        let stop_distance = reference_price * STOP_LOSS_PCT / Decimal::ONE_HUNDRED;
        let target_distance = stop_distance * REWARD_RATIO;
        let (stop_loss, take_profit) = match side {
            Side::Long => (
                reference_price - stop_distance,
                reference_price + target_distance,
            ),
            Side::Short => (
                reference_price + stop_distance,
                reference_price - target_distance,
            ),
        };

        Self {
            id: Uuid::new_v4(),
            rule: rule.into(),
            side,
            reference_price,
            stop_loss,
            take_profit,
            confidence,
            leverage,
            timestamp: Utc::now(),
        }
    }
}
