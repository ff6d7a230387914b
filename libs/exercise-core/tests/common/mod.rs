//! Common test utilities for exercise-core integration tests.
//!
//! Provides:
//! - `TestContext` wiring an exercises manager to in-memory stores
//! - `ScriptedPresenter` for driving sessions without a terminal
//! - `FailingProfileStore` for write-failure paths
//! - `correct_response` to answer from an answer key

#![allow(dead_code)]

pub mod fixtures;

use std::sync::atomic::{AtomicBool, Ordering};

use exercise_core::{
    AnswerKey, AttemptResult, EngineConfig, ErrorReport, ExerciseKind, ExerciseSpec, ExercisesManager,
    InMemoryContentStore, InMemoryProfileStore, LearnerId, LearnerProfile, Presentation, PresentedExercise,
    ProfileStore, Response, SessionToken, StoreError, WordCategory,
};

pub type Manager<'a> = ExercisesManager<InMemoryContentStore, &'a InMemoryProfileStore>;

/// Shared profile store plus a reading pack.
pub struct TestContext {
    pub profiles: InMemoryProfileStore,
    pub content: InMemoryContentStore,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_pack(&fixtures::sample_pack())
    }

    pub fn with_pack(pack: &str) -> Self {
        Self {
            profiles: InMemoryProfileStore::new(),
            content: InMemoryContentStore::from_pack(pack).expect("fixture pack parses"),
        }
    }

    /// A manager over this context's stores. Several managers may share the
    /// profile store, like two devices of one learner.
    pub fn manager(&self, config: EngineConfig) -> Manager<'_> {
        ExercisesManager::new(config, self.content.clone(), &self.profiles).expect("valid config")
    }

    pub fn saved(&self, learner: &str) -> Option<LearnerProfile> {
        self.profiles.get(&LearnerId::new(learner))
    }
}

/// The response that earns full credit for `spec`.
pub fn correct_response(spec: &ExerciseSpec) -> Response {
    match &spec.answer {
        AnswerKey::Category { category } => Response::Category {
            category: *category,
        },
        AnswerKey::Span { text, .. } => Response::text(text.clone()),
        AnswerKey::Defect {
            fragment,
            correction,
            ..
        } => Response::Defect {
            fragment: fragment.clone(),
            correction: Some(correction.clone()),
        },
        AnswerKey::Order { units } => Response::Order {
            units: units.clone(),
        },
    }
}

/// A well-formed response that is never right.
pub fn wrong_response(exercise: &PresentedExercise) -> Response {
    match exercise.kind {
        ExerciseKind::ClassifyWord => Response::Category {
            category: WordCategory::Punctuation,
        },
        ExerciseKind::Comprehension => Response::text("zzz"),
        ExerciseKind::FindError => Response::Defect {
            fragment: "zzz".into(),
            correction: None,
        },
        // The shuffled units are never the answer.
        ExerciseKind::OrderSentence => Response::Order {
            units: exercise.items.clone(),
        },
    }
}

/// One scripted learner action.
#[derive(Debug, Clone)]
pub enum Step {
    Wrong,
    Malformed,
    Quit,
}

/// Presentation layer that plays back a script and records what it saw.
#[derive(Debug, Default)]
pub struct ScriptedPresenter {
    script: Vec<Step>,
    pub shown: Vec<PresentedExercise>,
    pub results: Vec<AttemptResult>,
    pub errors: Vec<ErrorReport>,
}

impl ScriptedPresenter {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script: script.into_iter().rev().collect(),
            ..Default::default()
        }
    }
}

impl Presentation for ScriptedPresenter {
    fn present(&mut self, exercise: &PresentedExercise) -> Option<Response> {
        self.shown.push(exercise.clone());
        match self.script.pop().unwrap_or(Step::Quit) {
            Step::Wrong => Some(wrong_response(exercise)),
            Step::Malformed => Some(match exercise.kind {
                ExerciseKind::OrderSentence => Response::text("?"),
                _ => Response::Order { units: vec![] },
            }),
            Step::Quit => None,
        }
    }

    fn show_result(&mut self, result: &AttemptResult) {
        self.results.push(result.clone());
    }

    fn show_error(&mut self, error: &ErrorReport) {
        self.errors.push(error.clone());
    }
}

/// Profile store whose writes fail once `fail_writes` is set.
#[derive(Debug, Default)]
pub struct FailingProfileStore {
    pub inner: InMemoryProfileStore,
    pub fail_writes: AtomicBool,
}

impl FailingProfileStore {
    pub fn failing() -> Self {
        Self {
            inner: InMemoryProfileStore::new(),
            fail_writes: AtomicBool::new(true),
        }
    }
}

impl ProfileStore for FailingProfileStore {
    fn load_profile(&self, learner_id: &LearnerId) -> Result<LearnerProfile, StoreError> {
        self.inner.load_profile(learner_id)
    }

    fn open_session(&self, learner_id: &LearnerId) -> Result<SessionToken, StoreError> {
        self.inner.open_session(learner_id)
    }

    fn save_profile(&self, profile: &LearnerProfile, token: &SessionToken) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write("disk full".into()));
        }
        self.inner.save_profile(profile, token)
    }

    fn close_session(&self, learner_id: &LearnerId, token: &SessionToken) -> Result<(), StoreError> {
        self.inner.close_session(learner_id, token)
    }
}
