//! Rule evaluation

use super::rules::SignalRule;
use super::types::Signal;
use crate::config::SignalConfig;
use crate::feed::FeedSnapshot;

/// Evaluates an ordered rule table against feed snapshots
#[derive(Debug, Clone)]
pub struct SignalEngine {
    rules: Vec<SignalRule>,
}

impl SignalEngine {
    pub fn new(rules: Vec<SignalRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &SignalConfig) -> Self {
        Self::new(config.rules.clone())
    }

    pub fn rules(&self) -> &[SignalRule] {
        &self.rules
    }

    /// First matching rule wins. Nothing fires until the snapshot has a
    /// last price to anchor the signal.
    pub fn evaluate(&self, snapshot: &FeedSnapshot) -> Option<Signal> {
        let price = snapshot.last_price()?;
        let rule = self.rules.iter().find(|rule| rule.matches(snapshot))?;

        tracing::debug!(
            symbol = %snapshot.symbol,
            rule = %rule.name,
            side = %rule.side,
            price = %price,
            "Signal rule matched"
        );

        Some(Signal::new(
            rule.name.clone(),
            rule.side,
            price,
            rule.confidence,
            rule.leverage,
        ))
    }
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::new(super::rules::default_rules())
    }
}
