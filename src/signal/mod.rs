//! Signal generation
//!
//! Turns feed snapshots into directional calls using a configurable
//! rule table.

mod engine;
mod rules;
mod types;

pub use engine::SignalEngine;
pub use rules::{default_rules, Condition, SignalRule};
pub use types::{Side, Signal, REWARD_RATIO, STOP_LOSS_PCT};
