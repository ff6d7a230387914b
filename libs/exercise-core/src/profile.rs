//! Learner profile: per-skill mastery and attempt history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::exercise::{AttemptResult, Skill};
use crate::types::DifficultyTier;

/// Mastery assumed for a skill that has never been practised.
pub const INITIAL_MASTERY: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnerId(pub String);

impl LearnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Running totals for one skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillStats {
    pub attempts: u32,
    pub correct: u32,
    pub correctness_sum: f64,
}

impl SkillStats {
    pub fn mean_correctness(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.correctness_sum / f64::from(self.attempts)
        }
    }
}

/// Summary of every attempt the learner has made.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_attempts: u32,
    pub total_correct: u32,
    pub correctness_sum: f64,
    pub sessions: u32,
    pub per_skill: BTreeMap<Skill, SkillStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl HistorySummary {
    pub fn mean_correctness(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.correctness_sum / f64::from(self.total_attempts)
        }
    }

    pub(crate) fn record(&mut self, attempt: &AttemptResult) {
        let stats = self.per_skill.entry(attempt.skill()).or_default();
        stats.attempts += 1;
        stats.correctness_sum += attempt.correctness;
        self.total_attempts += 1;
        self.correctness_sum += attempt.correctness;
        if attempt.is_correct() {
            stats.correct += 1;
            self.total_correct += 1;
        }
        self.last_attempt_at = Some(attempt.timestamp);
    }
}

/// Persisted learner state. Only the exercises manager mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub learner_id: LearnerId,
    #[serde(default)]
    pub mastery: BTreeMap<Skill, f64>,
    #[serde(default)]
    pub history: HistorySummary,
    #[serde(default)]
    pub target_tier: DifficultyTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LearnerProfile {
    pub fn new(learner_id: LearnerId) -> Self {
        Self {
            learner_id,
            mastery: BTreeMap::new(),
            history: HistorySummary::default(),
            target_tier: DifficultyTier::Basic,
            updated_at: None,
        }
    }

    pub fn mastery_of(&self, skill: Skill) -> f64 {
        self.mastery.get(&skill).copied().unwrap_or(INITIAL_MASTERY)
    }

    /// Lowest-mastery skill; ties go to the earlier skill in `Skill::ALL`.
    pub fn weakest_skill(&self) -> Skill {
        let mut weakest = Skill::ALL[0];
        for skill in Skill::ALL.into_iter().skip(1) {
            if self.mastery_of(skill) < self.mastery_of(weakest) {
                weakest = skill;
            }
        }
        weakest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_skills_start_at_initial_mastery() {
        let profile = LearnerProfile::new(LearnerId::new("ana"));
        assert_eq!(profile.mastery_of(Skill::Syntax), INITIAL_MASTERY);
        assert_eq!(profile.weakest_skill(), Skill::Vocabulary);
    }

    #[test]
    fn weakest_skill_follows_mastery() {
        let mut profile = LearnerProfile::new(LearnerId::new("ana"));
        for skill in Skill::ALL {
            profile.mastery.insert(skill, 0.9);
        }
        profile.mastery.insert(Skill::Proofreading, 0.2);
        assert_eq!(profile.weakest_skill(), Skill::Proofreading);
    }

    #[test]
    fn profile_json_tolerates_missing_fields() {
        let profile: LearnerProfile = serde_json::from_str(r#"{"learner_id":"ana"}"#).unwrap();
        assert_eq!(profile.target_tier, DifficultyTier::Basic);
        assert!(profile.mastery.is_empty());
    }
}
