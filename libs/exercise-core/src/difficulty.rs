//! Composite difficulty score and tier assignment.

use crate::types::{AnalyzedText, DifficultyProfile, DifficultyTier, FeatureVector, GrammarIssue};

/// Lowest score of each tier.
pub const BASIC_FLOOR: f64 = 0.0;
pub const INTERMEDIATE_FLOOR: f64 = 0.25;
pub const ADVANCED_FLOOR: f64 = 0.5;
pub const EXPERT_FLOOR: f64 = 0.75;

pub const SENTENCE_LENGTH_WEIGHT: f64 = 0.35;
pub const RARITY_WEIGHT: f64 = 0.35;
pub const SYLLABLE_WEIGHT: f64 = 0.20;
pub const ISSUE_WEIGHT: f64 = 0.10;

/// Words per sentence mapped onto 0-1.
const SENTENCE_LENGTH_RANGE: (f64, f64) = (5.0, 30.0);
/// Syllables per word mapped onto 0-1.
const SYLLABLE_RANGE: (f64, f64) = (1.5, 3.0);
/// Issues per word are scaled by this before clamping.
const ISSUE_DENSITY_SCALE: f64 = 10.0;

/// Words per minute a reader of each tier is expected to manage.
fn reading_speed(tier: DifficultyTier) -> f64 {
    match tier {
        DifficultyTier::Basic => 200.0,
        DifficultyTier::Intermediate => 170.0,
        DifficultyTier::Advanced => 140.0,
        DifficultyTier::Expert => 110.0,
    }
}

fn normalize(value: f64, (low, high): (f64, f64)) -> f64 {
    ((value - low) / (high - low)).clamp(0.0, 1.0)
}

/// Scores texts against a set of tier thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyCalculator {
    thresholds: [f64; 4],
}

impl Default for DifficultyCalculator {
    fn default() -> Self {
        Self {
            thresholds: [BASIC_FLOOR, INTERMEDIATE_FLOOR, ADVANCED_FLOOR, EXPERT_FLOOR],
        }
    }
}

impl DifficultyCalculator {
    /// `thresholds` must already be validated (see `EngineConfig::validate`).
    pub fn new(thresholds: [f64; 4]) -> Self {
        Self { thresholds }
    }

    /// Highest tier whose floor is at or below `score`.
    pub fn tier_for(&self, score: f64) -> DifficultyTier {
        DifficultyTier::ALL
            .into_iter()
            .zip(self.thresholds)
            .filter(|(_, floor)| score >= *floor)
            .map(|(tier, _)| tier)
            .last()
            .unwrap_or(DifficultyTier::Basic)
    }

    /// Weighted combination of normalized features. When `issues` is `None`
    /// the remaining weights are rescaled to sum to one.
    pub fn score(&self, text: &AnalyzedText, issues: Option<&[GrammarIssue]>) -> DifficultyProfile {
        let features = text.features();
        if text.is_empty() || features.word_count == 0 {
            return DifficultyProfile {
                features: FeatureVector::default(),
                components: FeatureVector::default(),
                score: 0.0,
                tier: DifficultyTier::Basic,
                estimated_reading_minutes: 0.0,
            };
        }

        let raw = FeatureVector {
            sentence_length: features.avg_sentence_length,
            rarity: features.rare_word_ratio,
            syllable_density: features.syllable_density,
            issue_density: issues.map(|i| i.len() as f64 / features.word_count as f64),
        };
        let components = FeatureVector {
            sentence_length: normalize(raw.sentence_length, SENTENCE_LENGTH_RANGE),
            rarity: raw.rarity.clamp(0.0, 1.0),
            syllable_density: normalize(raw.syllable_density, SYLLABLE_RANGE),
            issue_density: raw
                .issue_density
                .map(|d| (d * ISSUE_DENSITY_SCALE).clamp(0.0, 1.0)),
        };

        let base = SENTENCE_LENGTH_WEIGHT * components.sentence_length
            + RARITY_WEIGHT * components.rarity
            + SYLLABLE_WEIGHT * components.syllable_density;
        let score = match components.issue_density {
            Some(density) => base + ISSUE_WEIGHT * density,
            None => base / (SENTENCE_LENGTH_WEIGHT + RARITY_WEIGHT + SYLLABLE_WEIGHT),
        }
        .clamp(0.0, 1.0);

        let tier = self.tier_for(score);
        DifficultyProfile {
            features: raw,
            components,
            score,
            tier,
            estimated_reading_minutes: features.word_count as f64 / reading_speed(tier),
        }
    }
}

/// Score with the default thresholds.
pub fn score(text: &AnalyzedText, issues: Option<&[GrammarIssue]>) -> DifficultyProfile {
    DifficultyCalculator::default().score(text, issues)
}
