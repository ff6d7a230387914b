//! Exercises manager: the session state machine.
//!
//! A session moves `Idle → Active → Complete`. While active it serves one
//! exercise at a time, grades the response, folds the result into the
//! learner's mastery and adjusts the working tier. The profile is owned by
//! the manager for the whole session and written back once at the end; a
//! failed write aborts the session.

mod cancel;
mod driver;

pub use cancel::CancelFlag;
pub use driver::{drive, DriveEnd, DrivePlan, DriveReport, Presentation};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::adaptive::{get_model, MasteryModel, TierChange, TierController};
use crate::config::{EngineConfig, SelectionStrategy};
use crate::difficulty::DifficultyCalculator;
use crate::error::{ConfigError, ContentError, SessionError};
use crate::exercise::{
    AttemptResult, ExerciseId, ExerciseKind, ExerciseSpec, Outcome, PresentedExercise, Skill, Submission,
};
use crate::generation::ExerciseGenerator;
use crate::profile::{LearnerId, LearnerProfile};
use crate::store::{ContentCriteria, ContentStore, ProfileStore, SessionToken};
use crate::types::DifficultyTier;
use crate::validation::ExerciseValidator;

/// Variants tried on one text for one kind before the text is set aside.
const VARIANTS_PER_TEXT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Active,
    Complete,
    /// The profile could not be saved; the session's updates are lost.
    Aborted,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Complete => "complete",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a finished session amounted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub learner_id: LearnerId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Graded attempts; malformed responses are counted separately.
    pub attempts: usize,
    pub correct: usize,
    pub malformed: usize,
    pub mean_correctness: f64,
    pub start_tier: DifficultyTier,
    pub final_tier: DifficultyTier,
    pub tier_changes: Vec<TierChange>,
    pub mastery: BTreeMap<Skill, f64>,
}

struct ActiveSession {
    token: SessionToken,
    profile: LearnerProfile,
    controller: TierController,
    start_tier: DifficultyTier,
    started_at: DateTime<Utc>,
    outstanding: Option<ExerciseSpec>,
    served: HashSet<ExerciseId>,
    variants: HashMap<(String, ExerciseKind), u32>,
    attempts: Vec<AttemptResult>,
    tier_changes: Vec<TierChange>,
    rotation: usize,
}

impl ActiveSession {
    fn summary(&self, ended_at: DateTime<Utc>) -> SessionSummary {
        let graded: Vec<&AttemptResult> = self
            .attempts
            .iter()
            .filter(|a| a.outcome != Outcome::Malformed)
            .collect();
        let mean_correctness = if graded.is_empty() {
            0.0
        } else {
            graded.iter().map(|a| a.correctness).sum::<f64>() / graded.len() as f64
        };

        SessionSummary {
            learner_id: self.profile.learner_id.clone(),
            started_at: self.started_at,
            ended_at,
            attempts: graded.len(),
            correct: graded.iter().filter(|a| a.is_correct()).count(),
            malformed: self.attempts.len() - graded.len(),
            mean_correctness,
            start_tier: self.start_tier,
            final_tier: self.controller.tier(),
            tier_changes: self.tier_changes.clone(),
            mastery: self.profile.mastery.clone(),
        }
    }
}

fn invalid_state(operation: &'static str, state: SessionState) -> SessionError {
    SessionError::InvalidState {
        operation,
        state: state.as_str(),
    }
}

/// Drives one learner session at a time over a content store and a profile
/// store.
pub struct ExercisesManager<C, P> {
    config: EngineConfig,
    content: C,
    profiles: P,
    generator: ExerciseGenerator,
    calculator: DifficultyCalculator,
    validator: ExerciseValidator,
    model: Box<dyn MasteryModel>,
    topic: Option<String>,
    state: SessionState,
    session: Option<ActiveSession>,
}

impl<C: ContentStore, P: ProfileStore> ExercisesManager<C, P> {
    pub fn new(config: EngineConfig, content: C, profiles: P) -> Result<Self, ConfigError> {
        config.validate()?;
        let model = get_model(&config.mastery_model, config.ema_alpha)
            .ok_or_else(|| ConfigError::UnknownMasteryModel(config.mastery_model.clone()))?;

        Ok(Self {
            generator: ExerciseGenerator::new(&config),
            calculator: DifficultyCalculator::new(config.tier_thresholds),
            validator: ExerciseValidator::new(&config),
            model,
            config,
            content,
            profiles,
            topic: None,
            state: SessionState::Idle,
            session: None,
        })
    }

    /// Prefer texts on `topic`; other texts are used once it runs dry.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn profiles(&self) -> &P {
        &self.profiles
    }

    /// Profile of the active session, including this session's updates.
    pub fn profile(&self) -> Option<&LearnerProfile> {
        self.session.as_ref().map(|s| &s.profile)
    }

    pub fn working_tier(&self) -> Option<DifficultyTier> {
        self.session.as_ref().map(|s| s.controller.tier())
    }

    /// The exercise awaiting a response, answer key included.
    pub fn pending_exercise(&self) -> Option<&ExerciseSpec> {
        self.session.as_ref().and_then(|s| s.outstanding.as_ref())
    }

    /// Every attempt of the active session, malformed ones included.
    pub fn attempts(&self) -> &[AttemptResult] {
        self.session.as_ref().map_or(&[], |s| s.attempts.as_slice())
    }

    /// Claim the learner and load their profile. Allowed whenever no session
    /// is active.
    pub fn start_session(&mut self, learner_id: LearnerId) -> Result<&LearnerProfile, SessionError> {
        if self.state == SessionState::Active {
            return Err(invalid_state("start a session", self.state));
        }

        let token = self.profiles.open_session(&learner_id)?;
        let profile = match self.profiles.load_profile(&learner_id) {
            Ok(profile) => profile,
            Err(e) => {
                if let Err(close) = self.profiles.close_session(&learner_id, &token) {
                    warn!(learner = %learner_id, error = %close, "failed to release learner");
                }
                return Err(e.into());
            }
        };

        let tier = profile.target_tier;
        info!(learner = %learner_id, tier = %tier, "session started");
        self.state = SessionState::Active;
        let session = self.session.insert(ActiveSession {
            token,
            controller: TierController::new(tier, &self.config),
            profile,
            start_tier: tier,
            started_at: Utc::now(),
            outstanding: None,
            served: HashSet::new(),
            variants: HashMap::new(),
            attempts: Vec::new(),
            tier_changes: Vec::new(),
            rotation: 0,
        });
        Ok(&session.profile)
    }

    pub fn request_next(&mut self) -> Result<PresentedExercise, SessionError> {
        self.request_next_with(&CancelFlag::new())
    }

    /// Serve the next exercise. Failed generations move on to another text,
    /// then relax the content criteria, then drop one tier, for at most
    /// `max_generation_attempts` tries. `cancel` is checked before each try.
    /// Texts without a tier label are skipped while they measure above the
    /// working tier, until the tier hint has been relaxed away.
    pub fn request_next_with(&mut self, cancel: &CancelFlag) -> Result<PresentedExercise, SessionError> {
        let state = self.state;
        let Some(session) = self.session.as_mut().filter(|_| state == SessionState::Active) else {
            return Err(invalid_state("request an exercise", state));
        };
        if let Some(stale) = session.outstanding.take() {
            debug!(id = %stale.id, "discarding unanswered exercise");
        }

        let kind = match self.config.selection {
            SelectionStrategy::RoundRobin => {
                let kind = ExerciseKind::ALL[session.rotation % ExerciseKind::ALL.len()];
                session.rotation += 1;
                kind
            }
            SelectionStrategy::WeakestSkill => session.profile.weakest_skill().exercise_kind(),
        };

        let mut tier = session.controller.tier();
        let mut criteria = ContentCriteria::for_tier(tier).with_topic(self.topic.clone());
        let mut last = String::from("no attempt made");
        let mut above_tier: BTreeSet<String> = BTreeSet::new();
        let attempts = self.config.max_generation_attempts;

        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                info!(attempt, "generation cancelled");
                return Err(SessionError::Cancelled);
            }

            let mut query = criteria.clone();
            if query.tier_hint.is_some() {
                query.exclude.extend(above_tier.iter().cloned());
            }
            let source = match self.content.fetch_text(&query) {
                Ok(source) => source,
                Err(e) => {
                    if let ContentError::Unavailable(_) = e {
                        warn!(attempt, error = %e, "content store unavailable, widening the query");
                    }
                    last = e.to_string();
                    if let Some(relaxed) = criteria.relax() {
                        debug!(attempt, criteria = %relaxed, "no text matched, relaxing criteria");
                        criteria = relaxed;
                    } else if let Some(lower) = tier.lower() {
                        info!(attempt, from = %tier, to = %lower, "content exhausted, lowering tier");
                        tier = lower;
                        criteria = ContentCriteria::for_tier(tier).with_topic(self.topic.clone());
                    } else {
                        break;
                    }
                    continue;
                }
            };

            let text = self.generator.analyzer().analyze(&source.body);
            if criteria.tier_hint.is_some() && source.tier.is_none() {
                // Unlabelled texts are placed by their measured difficulty.
                let issues = self.generator.checker().check(&text);
                let measured = self.calculator.score(&text, Some(&issues)).tier;
                if measured > tier {
                    debug!(attempt, text = %source.id, measured = %measured, "text above working tier");
                    last = format!("text {} is {} but the working tier is {}", source.id, measured, tier);
                    above_tier.insert(source.id);
                    continue;
                }
            }
            let key = (source.id.clone(), kind);
            let variant = session.variants.get(&key).copied().unwrap_or(0);

            match self.generator.generate_variant(&text, tier, kind, variant) {
                Ok(spec) if session.served.contains(&spec.id) => {
                    debug!(attempt, text = %source.id, variant, "exercise already served");
                    last = format!("text {} has no unseen {} exercise", source.id, kind);
                    session.variants.insert(key, variant + 1);
                    if variant + 1 >= VARIANTS_PER_TEXT {
                        criteria.exclude.insert(source.id);
                    }
                }
                Ok(spec) => {
                    session.variants.insert(key, variant + 1);
                    session.served.insert(spec.id);
                    info!(id = %spec.id, kind = %kind, tier = %tier, text = %source.id, attempt, "exercise ready");
                    let presented = spec.present();
                    session.outstanding = Some(spec);
                    return Ok(presented);
                }
                Err(e) => {
                    debug!(attempt, text = %source.id, error = %e, "generation failed, trying another text");
                    last = e.to_string();
                    criteria.exclude.insert(source.id);
                }
            }
        }

        warn!(kind = %kind, attempts, reason = %last, "no exercise available");
        Err(SessionError::NoExerciseAvailable { attempts, last })
    }

    /// Grade a response to the outstanding exercise. A malformed response is
    /// returned as a result but changes nothing, and the exercise stays open.
    pub fn submit(&mut self, submission: Submission) -> Result<AttemptResult, SessionError> {
        let state = self.state;
        let Some(session) = self.session.as_mut().filter(|_| state == SessionState::Active) else {
            return Err(invalid_state("submit a response", state));
        };
        let result = match session.outstanding.as_ref() {
            Some(spec) if spec.id == submission.exercise_id => {
                self.validator.validate(spec, &submission.response)
            }
            _ => return Err(SessionError::UnknownExercise(submission.exercise_id)),
        };

        if result.outcome == Outcome::Malformed {
            debug!(id = %result.exercise_id, "malformed response, exercise stays open");
            session.attempts.push(result.clone());
            return Ok(result);
        }
        session.outstanding = None;

        let skill = result.skill();
        let profile = &mut session.profile;
        let prior_attempts = profile.history.per_skill.get(&skill).map_or(0, |s| s.attempts);
        let current = profile
            .mastery
            .get(&skill)
            .copied()
            .unwrap_or_else(|| self.model.initial());
        let mastery = self.model.update(current, result.correctness, prior_attempts);
        profile.mastery.insert(skill, mastery);
        profile.history.record(&result);
        profile.updated_at = Some(result.timestamp);

        if let Some(change) = session.controller.record(result.correctness) {
            session.profile.target_tier = change.to();
            session.tier_changes.push(change);
        }
        debug!(
            skill = skill.as_str(),
            correctness = result.correctness,
            mastery,
            "attempt recorded"
        );

        session.attempts.push(result.clone());
        Ok(result)
    }

    /// Write the profile back and release the learner.
    pub fn end_session(&mut self) -> Result<SessionSummary, SessionError> {
        if self.state != SessionState::Active {
            return Err(invalid_state("end the session", self.state));
        }
        let Some(mut session) = self.session.take() else {
            return Err(invalid_state("end the session", self.state));
        };

        let ended_at = Utc::now();
        session.profile.history.sessions += 1;
        session.profile.updated_at = Some(ended_at);
        let learner_id = session.profile.learner_id.clone();

        if let Err(e) = self.profiles.save_profile(&session.profile, &session.token) {
            error!(learner = %learner_id, error = %e, "profile write failed, session aborted");
            if let Err(close) = self.profiles.close_session(&learner_id, &session.token) {
                warn!(learner = %learner_id, error = %close, "failed to release learner");
            }
            self.state = SessionState::Aborted;
            return Err(SessionError::ProfileWriteFailure(e));
        }
        if let Err(close) = self.profiles.close_session(&learner_id, &session.token) {
            warn!(learner = %learner_id, error = %close, "failed to release learner");
        }

        self.state = SessionState::Complete;
        let summary = session.summary(ended_at);
        info!(
            learner = %learner_id,
            attempts = summary.attempts,
            mean = summary.mean_correctness,
            tier = %summary.final_tier,
            "session complete"
        );
        Ok(summary)
    }
}
