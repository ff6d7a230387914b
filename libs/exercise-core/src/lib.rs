//! Core of the adaptive Spanish exercise trainer.
//!
//! Provides:
//! - Text analysis (tokenizer, sentence splitter, word-category tagging)
//! - Rule-based grammar checking with per-rule isolation
//! - Difficulty scoring and tier mapping
//! - Exercise generation (classify-word, comprehension, find-error, order-sentence)
//! - Response validation with partial credit for free-text answers
//! - The exercises manager: session state machine, mastery and tier adaptation
//! - Content-store and profile-store boundaries with in-memory implementations

pub mod adaptive;
pub mod analysis;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod exercise;
pub mod generation;
pub mod grammar;
pub mod matching;
pub mod parser;
pub mod profile;
pub mod session;
pub mod store;
pub mod types;
pub mod validation;

pub use adaptive::{get_model, MasteryModel, TierChange, TierController};
pub use analysis::{analyze, Analyzer, Tagger, TaggerChain};
pub use config::{EngineConfig, SelectionStrategy};
pub use difficulty::{score, DifficultyCalculator};
pub use error::{
    ConfigError, ContentError, ErrorKind, ErrorReport, GenerationError, ParseError, RuleError, SessionError,
    StoreError,
};
pub use exercise::{
    AnswerKey, AttemptResult, CriterionFeedback, ExerciseId, ExerciseKind, ExerciseSpec, Outcome,
    PresentedExercise, Response, Skill, Submission,
};
pub use generation::{generate, ExerciseGenerator};
pub use grammar::{apply_suggestions, check, GrammarChecker, GrammarRule, IssueSummary, TokenWindow};
pub use matching::{normalize_text, word_diff, DiffKind, DiffSegment};
pub use parser::parse_pack;
pub use profile::{LearnerId, LearnerProfile};
pub use session::{
    drive, CancelFlag, DriveEnd, DrivePlan, DriveReport, ExercisesManager, Presentation, SessionState,
    SessionSummary,
};
pub use store::{
    ContentCriteria, ContentStore, InMemoryContentStore, InMemoryProfileStore, ProfileStore, SessionToken,
    SourceText,
};
pub use types::{
    AnalyzedText, DifficultyProfile, DifficultyTier, GrammarIssue, IssueCategory, Severity, Span, Token,
    WordCategory,
};
pub use validation::{validate, ExerciseValidator};
