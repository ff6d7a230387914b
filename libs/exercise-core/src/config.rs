//! Engine configuration supplied at initialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::adaptive::get_model;
use crate::difficulty::{ADVANCED_FLOOR, BASIC_FLOOR, EXPERT_FLOOR, INTERMEDIATE_FLOOR};
use crate::error::ConfigError;

/// How the manager picks the next exercise type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    RoundRobin,
    #[default]
    WeakestSkill,
}

impl SelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::WeakestSkill => "weakest_skill",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "round_robin" => Some(Self::RoundRobin),
            "weakest_skill" => Some(Self::WeakestSkill),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lower score bound of each tier, basic first.
    pub tier_thresholds: [f64; 4],
    pub ema_alpha: f64,
    pub distractor_count: usize,
    /// Minimum attempts between two tier changes.
    pub hysteresis_window: usize,
    /// Number of recent attempts whose mean accuracy drives tier changes.
    pub accuracy_window: usize,
    pub promote_accuracy: f64,
    pub demote_accuracy: f64,
    pub max_generation_attempts: usize,
    pub selection: SelectionStrategy,
    /// Mastery model name, see `adaptive::get_model`.
    pub mastery_model: String,
    pub shuffle_seed: u64,
    /// Minimum per-token similarity for near-miss credit in comprehension answers.
    pub fuzzy_threshold: f64,
    /// Lowercase abbreviations, without the trailing period.
    pub abbreviations: BTreeSet<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tier_thresholds: [BASIC_FLOOR, INTERMEDIATE_FLOOR, ADVANCED_FLOOR, EXPERT_FLOOR],
            ema_alpha: 0.3,
            distractor_count: 3,
            hysteresis_window: 3,
            accuracy_window: 5,
            promote_accuracy: 0.8,
            demote_accuracy: 0.4,
            max_generation_attempts: 6,
            selection: SelectionStrategy::default(),
            mastery_model: "ema".to_string(),
            shuffle_seed: 0x5eed,
            fuzzy_threshold: 0.8,
            abbreviations: default_abbreviations(),
        }
    }
}

pub fn default_abbreviations() -> BTreeSet<String> {
    [
        "sr", "sra", "srta", "dr", "dra", "lic", "ing", "prof", "etc", "ej", "pág", "núm", "aprox",
        "av", "ud", "uds", "vs",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.tier_thresholds;
        let ascending = t.windows(2).all(|w| w[0] < w[1]);
        if t[0] != 0.0 || !ascending || t[3] >= 1.0 {
            return Err(ConfigError::InvalidThresholds(t.to_vec()));
        }

        if !(self.ema_alpha > 0.0 && self.ema_alpha < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "ema_alpha",
                range: "(0, 1)",
                value: self.ema_alpha,
            });
        }

        for (field, value) in [
            ("distractor_count", self.distractor_count),
            ("hysteresis_window", self.hysteresis_window),
            ("accuracy_window", self.accuracy_window),
            ("max_generation_attempts", self.max_generation_attempts),
        ] {
            if value < 1 {
                return Err(ConfigError::OutOfRange {
                    field,
                    range: ">= 1",
                    value: value as f64,
                });
            }
        }

        for (field, value) in [
            ("promote_accuracy", self.promote_accuracy),
            ("demote_accuracy", self.demote_accuracy),
            ("fuzzy_threshold", self.fuzzy_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    range: "[0, 1]",
                    value,
                });
            }
        }

        if self.promote_accuracy <= self.demote_accuracy {
            return Err(ConfigError::InvertedAccuracyBand {
                promote: self.promote_accuracy,
                demote: self.demote_accuracy,
            });
        }

        if get_model(&self.mastery_model, self.ema_alpha).is_none() {
            return Err(ConfigError::UnknownMasteryModel(self.mastery_model.clone()));
        }

        Ok(())
    }

    pub fn is_abbreviation(&self, word: &str) -> bool {
        self.abbreviations.contains(&word.to_lowercase())
    }
}
