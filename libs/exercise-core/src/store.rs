//! Boundaries to the content store and the profile store, with in-memory
//! implementations.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ContentError, ParseError, StoreError};
use crate::parser::parse_pack;
use crate::profile::{LearnerId, LearnerProfile};
use crate::types::DifficultyTier;

/// A raw text offered by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceText {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Tier the text was written for, if the pack says so.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<DifficultyTier>,
    pub body: String,
}

impl SourceText {
    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }
}

/// What the manager asks the content store for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentCriteria {
    pub topic: Option<String>,
    pub tier_hint: Option<DifficultyTier>,
    pub max_words: Option<usize>,
    /// Text ids that must not be returned.
    pub exclude: BTreeSet<String>,
}

/// Longest text, in words, first offered at each tier.
fn length_hint(tier: DifficultyTier) -> Option<usize> {
    match tier {
        DifficultyTier::Basic => Some(80),
        DifficultyTier::Intermediate => Some(150),
        DifficultyTier::Advanced => Some(300),
        DifficultyTier::Expert => None,
    }
}

impl ContentCriteria {
    /// Criteria for a learner working at `tier`: texts labelled for that
    /// tier, no longer than its length hint.
    pub fn for_tier(tier: DifficultyTier) -> Self {
        Self {
            tier_hint: Some(tier),
            max_words: length_hint(tier),
            ..Default::default()
        }
    }

    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic;
        self
    }

    /// Same criteria with one constraint dropped: topic first, then length,
    /// then the tier hint. `None` once nothing is left to drop.
    pub fn relax(&self) -> Option<Self> {
        let mut relaxed = self.clone();
        if relaxed.topic.take().is_some() {
            return Some(relaxed);
        }
        if relaxed.max_words.take().is_some() {
            return Some(relaxed);
        }
        if relaxed.tier_hint.take().is_some() {
            return Some(relaxed);
        }
        None
    }

    pub fn matches(&self, text: &SourceText) -> bool {
        if self.exclude.contains(&text.id) {
            return false;
        }
        if let Some(topic) = &self.topic {
            let same = text.topic.as_ref().is_some_and(|t| t.eq_ignore_ascii_case(topic));
            if !same {
                return false;
            }
        }
        if let (Some(hint), Some(tier)) = (self.tier_hint, text.tier) {
            if hint != tier {
                return false;
            }
        }
        self.max_words.map_or(true, |max| text.word_count() <= max)
    }
}

impl fmt::Display for ContentCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "topic={} tier={} max_words={} excluded={}",
            self.topic.as_deref().unwrap_or("*"),
            self.tier_hint.map_or("*", |t| t.as_str()),
            self.max_words.map_or_else(|| "*".to_string(), |m| m.to_string()),
            self.exclude.len()
        )
    }
}

/// Supplies candidate source texts.
pub trait ContentStore {
    fn fetch_text(&self, criteria: &ContentCriteria) -> Result<SourceText, ContentError>;
}

/// Proof that the holder is the single writer of a learner's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Persists learner profiles with one writer per learner.
pub trait ProfileStore {
    /// Load a profile; unknown learners get a fresh one.
    fn load_profile(&self, learner_id: &LearnerId) -> Result<LearnerProfile, StoreError>;

    /// Claim the learner. Fails with `SessionConflict` while another token is open.
    fn open_session(&self, learner_id: &LearnerId) -> Result<SessionToken, StoreError>;

    /// Write `profile`. Fails with `StaleToken` unless `token` is the open one.
    fn save_profile(&self, profile: &LearnerProfile, token: &SessionToken) -> Result<(), StoreError>;

    /// Release the learner. Releasing with a stale token is an error.
    fn close_session(&self, learner_id: &LearnerId, token: &SessionToken) -> Result<(), StoreError>;
}

impl<T: ContentStore + ?Sized> ContentStore for &T {
    fn fetch_text(&self, criteria: &ContentCriteria) -> Result<SourceText, ContentError> {
        (**self).fetch_text(criteria)
    }
}

impl<T: ProfileStore + ?Sized> ProfileStore for &T {
    fn load_profile(&self, learner_id: &LearnerId) -> Result<LearnerProfile, StoreError> {
        (**self).load_profile(learner_id)
    }

    fn open_session(&self, learner_id: &LearnerId) -> Result<SessionToken, StoreError> {
        (**self).open_session(learner_id)
    }

    fn save_profile(&self, profile: &LearnerProfile, token: &SessionToken) -> Result<(), StoreError> {
        (**self).save_profile(profile, token)
    }

    fn close_session(&self, learner_id: &LearnerId, token: &SessionToken) -> Result<(), StoreError> {
        (**self).close_session(learner_id, token)
    }
}

/// Content store over a fixed list of texts, searched in order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentStore {
    texts: Vec<SourceText>,
}

impl InMemoryContentStore {
    pub fn new(texts: Vec<SourceText>) -> Self {
        Self { texts }
    }

    pub fn from_pack(content: &str) -> Result<Self, ParseError> {
        Ok(Self::new(parse_pack(content)?))
    }

    pub fn texts(&self) -> &[SourceText] {
        &self.texts
    }
}

impl ContentStore for InMemoryContentStore {
    fn fetch_text(&self, criteria: &ContentCriteria) -> Result<SourceText, ContentError> {
        let found = self.texts.iter().find(|text| criteria.matches(text)).cloned();
        match found {
            Some(text) => {
                debug!(id = %text.id, %criteria, "fetched text");
                Ok(text)
            }
            None => Err(ContentError::NotFound(criteria.to_string())),
        }
    }
}

/// Profile store kept in memory; sessions are tracked per learner.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<LearnerId, LearnerProfile>>,
    sessions: Mutex<HashMap<LearnerId, SessionToken>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: LearnerProfile) {
        let mut profiles = self.profiles.lock().expect("profile store lock");
        profiles.insert(profile.learner_id.clone(), profile);
    }

    /// Last saved profile, without claiming the learner.
    pub fn get(&self, learner_id: &LearnerId) -> Option<LearnerProfile> {
        let profiles = self.profiles.lock().expect("profile store lock");
        profiles.get(learner_id).cloned()
    }

    pub fn is_open(&self, learner_id: &LearnerId) -> bool {
        let sessions = self.sessions.lock().expect("session table lock");
        sessions.contains_key(learner_id)
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn load_profile(&self, learner_id: &LearnerId) -> Result<LearnerProfile, StoreError> {
        let profiles = self.profiles.lock().expect("profile store lock");
        Ok(profiles
            .get(learner_id)
            .cloned()
            .unwrap_or_else(|| LearnerProfile::new(learner_id.clone())))
    }

    fn open_session(&self, learner_id: &LearnerId) -> Result<SessionToken, StoreError> {
        let mut sessions = self.sessions.lock().expect("session table lock");
        if sessions.contains_key(learner_id) {
            return Err(StoreError::SessionConflict(learner_id.clone()));
        }
        let token = SessionToken::new();
        sessions.insert(learner_id.clone(), token);
        Ok(token)
    }

    fn save_profile(&self, profile: &LearnerProfile, token: &SessionToken) -> Result<(), StoreError> {
        let sessions = self.sessions.lock().expect("session table lock");
        if sessions.get(&profile.learner_id) != Some(token) {
            return Err(StoreError::StaleToken(profile.learner_id.clone()));
        }
        let mut profiles = self.profiles.lock().expect("profile store lock");
        profiles.insert(profile.learner_id.clone(), profile.clone());
        Ok(())
    }

    fn close_session(&self, learner_id: &LearnerId, token: &SessionToken) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().expect("session table lock");
        if sessions.get(learner_id) != Some(token) {
            return Err(StoreError::StaleToken(learner_id.clone()));
        }
        sessions.remove(learner_id);
        Ok(())
    }
}
