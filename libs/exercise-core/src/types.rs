//! Core types for text analysis, grammar issues and difficulty profiles.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::features;

/// Byte range into an analyzed source text.
///
/// Offsets always fall on `char` boundaries of the text they were taken from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the two ranges share at least one byte.
    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Smallest span covering both.
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Coarse lexical category assigned by the taggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordCategory {
    Noun,
    Verb,
    Adjective,
    Adverb,
    FunctionWord,
    Punctuation,
    Unknown,
}

impl WordCategory {
    /// Categories a learner can be asked to classify, in presentation order.
    pub const TAXONOMY: [WordCategory; 5] = [
        Self::Noun,
        Self::Verb,
        Self::Adjective,
        Self::Adverb,
        Self::FunctionWord,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noun => "noun",
            Self::Verb => "verb",
            Self::Adjective => "adjective",
            Self::Adverb => "adverb",
            Self::FunctionWord => "function_word",
            Self::Punctuation => "punctuation",
            Self::Unknown => "unknown",
        }
    }

    /// Label shown to learners in the language of instruction.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Noun => "sustantivo",
            Self::Verb => "verbo",
            Self::Adjective => "adjetivo",
            Self::Adverb => "adverbio",
            Self::FunctionWord => "palabra funcional",
            Self::Punctuation => "signo de puntuación",
            Self::Unknown => "desconocida",
        }
    }

    /// Parse either the identifier or the learner-facing label.
    pub fn from_label(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase();
        [
            Self::Noun,
            Self::Verb,
            Self::Adjective,
            Self::Adverb,
            Self::FunctionWord,
            Self::Punctuation,
            Self::Unknown,
        ]
        .into_iter()
        .find(|c| c.as_str() == wanted || c.label() == wanted)
    }
}

impl fmt::Display for WordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single token of the source text. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub normalized: String,
    pub category: WordCategory,
    pub span: Span,
}

impl Token {
    pub fn is_word(&self) -> bool {
        self.category != WordCategory::Punctuation
    }

    /// Sentence-closing punctuation, including runs such as `...` or `!!`.
    pub fn is_terminal(&self) -> bool {
        !self.is_word() && self.text.chars().all(|c| matches!(c, '.' | '!' | '?' | '…'))
    }
}

/// Ordered run of tokens closed by terminal punctuation or a paragraph break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub tokens: Vec<Token>,
    pub span: Span,
    /// Zero-based paragraph the sentence belongs to.
    pub paragraph: usize,
}

impl Sentence {
    pub fn words(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.is_word())
    }

    pub fn word_count(&self) -> usize {
        self.words().count()
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}

/// Aggregate features, always computed from the sentences they describe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFeatures {
    pub token_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub unique_word_ratio: f64,
    pub avg_word_length: f64,
    pub avg_sentence_length: f64,
    /// Estimated syllables per word.
    pub syllable_density: f64,
    /// Share of content words outside the common vocabulary.
    pub rare_word_ratio: f64,
    /// Share of words with more than two syllables.
    pub complex_word_ratio: f64,
    /// Flesch-style reading ease clamped to 0-100.
    pub reading_ease: f64,
}

/// Tokenized, tagged text plus its aggregate features.
///
/// Only the analyzer builds these, so the features can never drift from the
/// token stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedText {
    source: String,
    sentences: Vec<Sentence>,
    features: TextFeatures,
}

impl AnalyzedText {
    pub(crate) fn new(source: String, sentences: Vec<Sentence>) -> Self {
        let features = features::compute(&sentences);
        Self {
            source,
            sentences,
            features,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn features(&self) -> &TextFeatures {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn sentence_text(&self, index: usize) -> Option<&str> {
        self.sentences.get(index).map(|s| s.text(&self.source))
    }

    pub fn fragment(&self, span: Span) -> &str {
        &self.source[span.start..span.end]
    }

    /// All tokens in document order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sentences.iter().flat_map(|s| s.tokens.iter())
    }
}

/// Kind of grammar issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Agreement,
    Spelling,
    Punctuation,
    WordOrder,
    Other,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agreement => "agreement",
            Self::Spelling => "spelling",
            Self::Punctuation => "punctuation",
            Self::WordOrder => "word_order",
            Self::Other => "other",
        }
    }

    /// Lowest tier at which issues of this kind are fair game for find-error.
    pub fn min_tier(&self) -> DifficultyTier {
        match self {
            Self::Punctuation | Self::Spelling => DifficultyTier::Basic,
            Self::Other => DifficultyTier::Intermediate,
            Self::Agreement => DifficultyTier::Advanced,
            Self::WordOrder => DifficultyTier::Expert,
        }
    }
}

/// How much an issue hurts the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Important,
    Minor,
}

/// Located annotation emitted by a grammar rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarIssue {
    pub rule_id: String,
    pub category: IssueCategory,
    pub severity: Severity,
    pub span: Span,
    pub sentence_index: usize,
    /// Copy of the flagged source text.
    pub fragment: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Ordered difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    Basic,
    Intermediate,
    Advanced,
    Expert,
}

impl Default for DifficultyTier {
    fn default() -> Self {
        Self::Basic
    }
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 4] = [
        Self::Basic,
        Self::Intermediate,
        Self::Advanced,
        Self::Expert,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Basic => 0,
            Self::Intermediate => 1,
            Self::Advanced => 2,
            Self::Expert => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn higher(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn lower(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            "expert" => Some(Self::Expert),
            _ => None,
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Features feeding the difficulty score, either raw or normalized to 0-1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub sentence_length: f64,
    pub rarity: f64,
    pub syllable_density: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_density: Option<f64>,
}

/// Derived difficulty of a text. Recomputed wholesale, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub features: FeatureVector,
    pub components: FeatureVector,
    pub score: f64,
    pub tier: DifficultyTier,
    pub estimated_reading_minutes: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_steps_stop_at_the_ends() {
        assert_eq!(DifficultyTier::Basic.lower(), None);
        assert_eq!(DifficultyTier::Basic.higher(), Some(DifficultyTier::Intermediate));
        assert_eq!(DifficultyTier::Expert.higher(), None);
        assert_eq!(DifficultyTier::Expert.lower(), Some(DifficultyTier::Advanced));
    }

    #[test]
    fn category_labels_parse_both_ways() {
        assert_eq!(WordCategory::from_label("Sustantivo"), Some(WordCategory::Noun));
        assert_eq!(WordCategory::from_label("function_word"), Some(WordCategory::FunctionWord));
        assert_eq!(WordCategory::from_label("pronombre"), None);
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(0, 4);
        assert!(a.overlaps(Span::new(3, 6)));
        assert!(!a.overlaps(Span::new(4, 6)));
        assert_eq!(a.cover(Span::new(6, 9)), Span::new(0, 9));
    }

    #[test]
    fn tier_round_trips_through_str() {
        for tier in DifficultyTier::ALL {
            assert_eq!(DifficultyTier::from_str(tier.as_str()), Some(tier));
        }
    }
}
