//! Working-tier adjustment with a minimum spacing between changes.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::info;

use crate::config::EngineConfig;
use crate::types::DifficultyTier;

/// A tier move made by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum TierChange {
    Promoted { from: DifficultyTier, to: DifficultyTier },
    Demoted { from: DifficultyTier, to: DifficultyTier },
}

impl TierChange {
    pub fn to(&self) -> DifficultyTier {
        match self {
            Self::Promoted { to, .. } | Self::Demoted { to, .. } => *to,
        }
    }
}

/// Tracks recent accuracy and moves the working tier.
///
/// The tier moves up when the mean correctness of the last `accuracy_window`
/// attempts reaches `promote_accuracy` and down when it falls to
/// `demote_accuracy`. A change needs at least `hysteresis_window` attempts
/// since the previous one, and a full accuracy window gathered after it.
#[derive(Debug, Clone)]
pub struct TierController {
    tier: DifficultyTier,
    recent: VecDeque<f64>,
    accuracy_window: usize,
    hysteresis_window: usize,
    promote_accuracy: f64,
    demote_accuracy: f64,
    attempts_since_change: usize,
}

impl TierController {
    pub fn new(tier: DifficultyTier, config: &EngineConfig) -> Self {
        Self {
            tier,
            recent: VecDeque::with_capacity(config.accuracy_window),
            accuracy_window: config.accuracy_window.max(1),
            hysteresis_window: config.hysteresis_window.max(1),
            promote_accuracy: config.promote_accuracy,
            demote_accuracy: config.demote_accuracy,
            attempts_since_change: 0,
        }
    }

    pub fn tier(&self) -> DifficultyTier {
        self.tier
    }

    pub fn attempts_since_change(&self) -> usize {
        self.attempts_since_change
    }

    /// Mean correctness over the current window, if any attempt is in it.
    pub fn recent_accuracy(&self) -> Option<f64> {
        if self.recent.is_empty() {
            None
        } else {
            Some(self.recent.iter().sum::<f64>() / self.recent.len() as f64)
        }
    }

    /// Record one graded attempt and move the tier if warranted.
    pub fn record(&mut self, correctness: f64) -> Option<TierChange> {
        self.attempts_since_change += 1;
        if self.recent.len() == self.accuracy_window {
            self.recent.pop_front();
        }
        self.recent.push_back(correctness.clamp(0.0, 1.0));

        if self.attempts_since_change < self.hysteresis_window || self.recent.len() < self.accuracy_window {
            return None;
        }

        let accuracy = self.recent_accuracy()?;
        let from = self.tier;
        let change = if accuracy >= self.promote_accuracy {
            from.higher().map(|to| TierChange::Promoted { from, to })
        } else if accuracy <= self.demote_accuracy {
            from.lower().map(|to| TierChange::Demoted { from, to })
        } else {
            None
        };
        let change = change?;

        self.tier = change.to();
        self.attempts_since_change = 0;
        self.recent.clear();
        info!(from = %from, to = %self.tier, accuracy, "working tier changed");
        Some(change)
    }
}
