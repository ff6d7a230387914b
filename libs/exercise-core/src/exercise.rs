//! Exercise specs, learner responses and attempt records.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::matching::DiffSegment;
use crate::types::{DifficultyTier, IssueCategory, WordCategory};

/// Exercise type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    ClassifyWord,
    Comprehension,
    FindError,
    OrderSentence,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        Self::ClassifyWord,
        Self::Comprehension,
        Self::FindError,
        Self::OrderSentence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifyWord => "classify_word",
            Self::Comprehension => "comprehension",
            Self::FindError => "find_error",
            Self::OrderSentence => "order_sentence",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s.trim())
    }

    /// Skill whose mastery this exercise trains.
    pub fn skill(self) -> Skill {
        match self {
            Self::ClassifyWord => Skill::Vocabulary,
            Self::Comprehension => Skill::Reading,
            Self::FindError => Skill::Proofreading,
            Self::OrderSentence => Skill::Syntax,
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Skill tag tracked in the learner's mastery map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Vocabulary,
    Reading,
    Proofreading,
    Syntax,
}

impl Skill {
    pub const ALL: [Skill; 4] = [
        Self::Vocabulary,
        Self::Reading,
        Self::Proofreading,
        Self::Syntax,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vocabulary => "vocabulary",
            Self::Reading => "reading",
            Self::Proofreading => "proofreading",
            Self::Syntax => "syntax",
        }
    }

    /// Exercise kind that trains this skill.
    pub fn exercise_kind(self) -> ExerciseKind {
        match self {
            Self::Vocabulary => ExerciseKind::ClassifyWord,
            Self::Reading => ExerciseKind::Comprehension,
            Self::Proofreading => ExerciseKind::FindError,
            Self::Syntax => ExerciseKind::OrderSentence,
        }
    }
}

/// Stable exercise identifier, derived from the exercise content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseId(pub Uuid);

impl ExerciseId {
    /// Name-based id: equal content always yields the same id.
    pub fn derive(parts: &[&str]) -> Self {
        let name = parts.join("\u{1f}");
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Correct answer of an exercise. Every value is copied out of the source
/// text, so the key outlives the analysis that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerKey {
    Category {
        category: WordCategory,
    },
    Span {
        text: String,
        /// Other phrasings accepted as fully correct.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        accepted: Vec<String>,
    },
    Defect {
        fragment: String,
        correction: String,
        category: IssueCategory,
    },
    Order {
        units: Vec<String>,
    },
}

impl AnswerKey {
    /// The value that appears among choice options.
    pub fn display_value(&self) -> String {
        match self {
            Self::Category { category } => category.label().to_string(),
            Self::Span { text, .. } => text.clone(),
            Self::Defect { fragment, .. } => fragment.clone(),
            Self::Order { units } => units.join(" "),
        }
    }
}

/// A concrete exercise item. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSpec {
    pub id: ExerciseId,
    pub kind: ExerciseKind,
    pub tier: DifficultyTier,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub answer: AnswerKey,
    pub distractors: Vec<String>,
    /// Shuffled units for order-sentence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

impl ExerciseSpec {
    pub fn skill(&self) -> Skill {
        self.kind.skill()
    }

    /// Payload for the presentation layer, without the answer key.
    ///
    /// Choice options mix the correct value into the distractors in an order
    /// derived from the exercise id, so nothing marks which one is right.
    pub fn present(&self) -> PresentedExercise {
        let options = if self.distractors.is_empty() {
            Vec::new()
        } else {
            let mut options = self.distractors.clone();
            options.push(self.answer.display_value());
            let mut rng = ChaCha8Rng::seed_from_u64(self.id.0.as_u128() as u64);
            options.shuffle(&mut rng);
            options
        };

        PresentedExercise {
            id: self.id,
            kind: self.kind,
            tier: self.tier,
            prompt: self.prompt.clone(),
            context: self.context.clone(),
            options,
            items: self.items.clone(),
        }
    }
}

/// What the presentation layer is allowed to see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentedExercise {
    pub id: ExerciseId,
    pub kind: ExerciseKind,
    pub tier: DifficultyTier,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

/// Learner response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Category {
        category: WordCategory,
    },
    Text {
        text: String,
    },
    Defect {
        fragment: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correction: Option<String>,
    },
    Order {
        units: Vec<String>,
    },
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Self::Category { .. } => "category",
            Self::Text { .. } => "text",
            Self::Defect { .. } => "defect",
            Self::Order { .. } => "order",
        }
    }
}

/// Response keyed by the exercise it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub exercise_id: ExerciseId,
    pub response: Response,
}

/// Verdict class of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Partial,
    Incorrect,
    /// Response had the wrong shape for the exercise.
    Malformed,
}

/// Result of checking one criterion of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionFeedback {
    pub criterion: String,
    pub passed: bool,
    pub note: String,
}

impl CriterionFeedback {
    pub fn new(criterion: &str, passed: bool, note: impl Into<String>) -> Self {
        Self {
            criterion: criterion.to_string(),
            passed,
            note: note.into(),
        }
    }
}

/// Append-only record of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub exercise_id: ExerciseId,
    pub kind: ExerciseKind,
    pub tier: DifficultyTier,
    pub response: Response,
    /// Score in 0-1.
    pub correctness: f64,
    pub outcome: Outcome,
    pub feedback: Vec<CriterionFeedback>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diff: Vec<DiffSegment>,
    pub timestamp: DateTime<Utc>,
}

impl AttemptResult {
    pub fn is_correct(&self) -> bool {
        self.outcome == Outcome::Correct
    }

    pub fn skill(&self) -> Skill {
        self.kind.skill()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_distractors() -> ExerciseSpec {
        ExerciseSpec {
            id: ExerciseId::derive(&["classify_word", "niño"]),
            kind: ExerciseKind::ClassifyWord,
            tier: DifficultyTier::Basic,
            prompt: "¿Qué clase de palabra es «niño»?".to_string(),
            context: None,
            answer: AnswerKey::Category {
                category: WordCategory::Noun,
            },
            distractors: vec!["verbo".into(), "adjetivo".into(), "adverbio".into()],
            items: vec![],
        }
    }

    #[test]
    fn derived_ids_are_stable() {
        assert_eq!(ExerciseId::derive(&["a", "b"]), ExerciseId::derive(&["a", "b"]));
        assert_ne!(ExerciseId::derive(&["a", "b"]), ExerciseId::derive(&["ab"]));
    }

    #[test]
    fn presented_exercise_hides_the_key_but_offers_it() {
        let spec = spec_with_distractors();
        let presented = spec.present();
        assert_eq!(presented.options.len(), 4);
        assert!(presented.options.contains(&"sustantivo".to_string()));

        let json = serde_json::to_value(&presented).unwrap();
        assert!(json.get("answer").is_none());
        assert!(json.get("distractors").is_none());
    }

    #[test]
    fn option_order_is_deterministic() {
        let spec = spec_with_distractors();
        assert_eq!(spec.present().options, spec.present().options);
    }

    #[test]
    fn skills_map_back_to_kinds() {
        for kind in ExerciseKind::ALL {
            assert_eq!(kind.skill().exercise_kind(), kind);
        }
    }
}
