//! File-backed profile store.
//!
//! Each learner has `<id>.json` holding the profile and, while a session is
//! open, `<id>.lock` holding the session token. The lock file is created
//! with `create_new`, so only one process can claim a learner.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use exercise_core::{LearnerId, LearnerProfile, ProfileStore, SessionToken, StoreError};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    root: PathBuf,
}

/// File-name-safe form of a learner id. ASCII letters, digits, `-` and `_`
/// are kept; every other byte is percent-escaped, so distinct ids never
/// share a file.
fn file_stem(learner_id: &LearnerId) -> String {
    let mut stem = String::with_capacity(learner_id.as_str().len());
    for byte in learner_id.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    stem
}

impl JsonProfileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_path(&self, learner_id: &LearnerId) -> PathBuf {
        self.root.join(format!("{}.json", file_stem(learner_id)))
    }

    fn lock_path(&self, learner_id: &LearnerId) -> PathBuf {
        self.root.join(format!("{}.lock", file_stem(learner_id)))
    }

    fn check_token(&self, learner_id: &LearnerId, token: &SessionToken) -> Result<(), StoreError> {
        let held = match fs::read_to_string(self.lock_path(learner_id)) {
            Ok(held) => held,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::StaleToken(learner_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        match Uuid::parse_str(held.trim()) {
            Ok(uuid) if uuid == token.0 => Ok(()),
            _ => Err(StoreError::StaleToken(learner_id.clone())),
        }
    }
}

/// Remove a lock file whose token could not be written, so the learner is
/// not locked out by an empty lock.
fn release_on_error<T>(lock: &Path, result: std::io::Result<T>) -> Result<T, StoreError> {
    result.map_err(|e| {
        if let Err(remove) = fs::remove_file(lock) {
            warn!(lock = %lock.display(), error = %remove, "failed to remove unwritten lock");
        }
        StoreError::Io(e)
    })
}

impl ProfileStore for JsonProfileStore {
    fn load_profile(&self, learner_id: &LearnerId) -> Result<LearnerProfile, StoreError> {
        let path = self.profile_path(learner_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(learner = %learner_id, "no saved profile, starting fresh");
                return Ok(LearnerProfile::new(learner_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let profile: LearnerProfile =
            serde_json::from_str(&content).map_err(|e| StoreError::Read(format!("{}: {}", path.display(), e)))?;
        if profile.learner_id != *learner_id {
            return Err(StoreError::Read(format!(
                "{} holds the profile of {}, not {}",
                path.display(),
                profile.learner_id,
                learner_id
            )));
        }
        Ok(profile)
    }

    fn open_session(&self, learner_id: &LearnerId) -> Result<SessionToken, StoreError> {
        let path = self.lock_path(learner_id);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::SessionConflict(learner_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let token = SessionToken::new();
        let written = file.write_all(token.to_string().as_bytes());
        drop(file);
        release_on_error(&path, written)?;
        debug!(learner = %learner_id, lock = %path.display(), "learner claimed");
        Ok(token)
    }

    fn save_profile(&self, profile: &LearnerProfile, token: &SessionToken) -> Result<(), StoreError> {
        self.check_token(&profile.learner_id, token)?;

        let json = serde_json::to_string_pretty(profile).map_err(|e| StoreError::Write(e.to_string()))?;
        let path = self.profile_path(&profile.learner_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(learner = %profile.learner_id, path = %path.display(), "profile saved");
        Ok(())
    }

    fn close_session(&self, learner_id: &LearnerId, token: &SessionToken) -> Result<(), StoreError> {
        self.check_token(learner_id, token)?;
        fs::remove_file(self.lock_path(learner_id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exercise_core::DifficultyTier;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonProfileStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonProfileStore::open(dir.path().join("profiles")).unwrap();
        (dir, store)
    }

    #[test]
    fn profiles_survive_a_round_trip_through_disk() {
        let (_dir, store) = store();
        let ana = LearnerId::new("ana");
        let token = store.open_session(&ana).unwrap();

        let mut profile = store.load_profile(&ana).unwrap();
        profile.target_tier = DifficultyTier::Advanced;
        store.save_profile(&profile, &token).unwrap();
        store.close_session(&ana, &token).unwrap();

        assert_eq!(store.load_profile(&ana).unwrap(), profile);
        assert!(!store.lock_path(&ana).exists());
    }

    #[test]
    fn lock_file_enforces_one_writer() {
        let (_dir, store) = store();
        let ana = LearnerId::new("ana");
        let token = store.open_session(&ana).unwrap();

        let other = JsonProfileStore::open(store.root()).unwrap();
        assert!(matches!(other.open_session(&ana), Err(StoreError::SessionConflict(_))));

        let profile = store.load_profile(&ana).unwrap();
        assert!(matches!(
            other.save_profile(&profile, &SessionToken::new()),
            Err(StoreError::StaleToken(_))
        ));
        store.close_session(&ana, &token).unwrap();
        assert!(matches!(store.save_profile(&profile, &token), Err(StoreError::StaleToken(_))));
    }

    #[test]
    fn corrupt_profiles_are_read_errors() {
        let (_dir, store) = store();
        let ana = LearnerId::new("ana");
        fs::write(store.profile_path(&ana), "{not json").unwrap();
        assert!(matches!(store.load_profile(&ana), Err(StoreError::Read(_))));
    }

    #[test]
    fn learner_ids_become_distinct_file_names() {
        assert_eq!(file_stem(&LearnerId::new("ana_maría-2")), "ana_mar%C3%ADa-2");
        assert_eq!(file_stem(&LearnerId::new("../ana maría")), "%2E%2E%2Fana%20mar%C3%ADa");
        assert_ne!(file_stem(&LearnerId::new("ana maría")), file_stem(&LearnerId::new("ana_maría")));
        assert_ne!(file_stem(&LearnerId::new("a%20b")), file_stem(&LearnerId::new("a b")));
    }

    #[test]
    fn similar_ids_do_not_share_profiles_or_locks() {
        let (_dir, store) = store();
        let spaced = LearnerId::new("ana maría");
        let underscored = LearnerId::new("ana_maría");

        let token = store.open_session(&spaced).unwrap();
        let mut profile = store.load_profile(&spaced).unwrap();
        profile.target_tier = DifficultyTier::Advanced;
        store.save_profile(&profile, &token).unwrap();

        let other = store.open_session(&underscored).unwrap();
        let fresh = store.load_profile(&underscored).unwrap();
        assert_eq!(fresh.learner_id, underscored);
        assert_eq!(fresh.target_tier, DifficultyTier::Basic);

        store.close_session(&underscored, &other).unwrap();
        store.close_session(&spaced, &token).unwrap();
    }

    #[test]
    fn failed_lock_write_releases_the_learner() {
        let (_dir, store) = store();
        let ana = LearnerId::new("ana");
        let lock = store.lock_path(&ana);
        fs::write(&lock, "").unwrap();

        let failed: std::io::Result<()> = Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert!(matches!(release_on_error(&lock, failed), Err(StoreError::Io(_))));
        assert!(!lock.exists());

        let token = store.open_session(&ana).unwrap();
        store.close_session(&ana, &token).unwrap();
    }

    #[test]
    fn profile_of_another_learner_is_rejected() {
        let (_dir, store) = store();
        let ana = LearnerId::new("ana");
        let json = serde_json::to_string(&LearnerProfile::new(LearnerId::new("bea"))).unwrap();
        fs::write(store.profile_path(&ana), json).unwrap();
        assert!(matches!(store.load_profile(&ana), Err(StoreError::Read(_))));
    }
}
