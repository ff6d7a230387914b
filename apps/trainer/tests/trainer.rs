//! End-to-end runs of the trainer over scripted terminal input.

use std::io::Cursor;

use exercise_core::{
    drive, CancelFlag, DriveEnd, DrivePlan, EngineConfig, ErrorKind, ExercisesManager, LearnerId, ProfileStore,
    SessionError,
};
use exercise_trainer::profiles::JsonProfileStore;
use exercise_trainer::settings::DEMO_PACK;
use exercise_trainer::terminal::TerminalPresenter;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn manager(dir: &TempDir) -> ExercisesManager<exercise_core::InMemoryContentStore, JsonProfileStore> {
    let content = exercise_core::InMemoryContentStore::from_pack(DEMO_PACK).unwrap();
    let profiles = JsonProfileStore::open(dir.path()).unwrap();
    ExercisesManager::new(EngineConfig::default(), content, profiles).unwrap()
}

/// Test that a full run persists the profile and releases the learner
#[test]
fn test_session_persists_profile_to_disk() {
    let dir = TempDir::new().unwrap();
    let mut manager = manager(&dir);
    let mut presenter = TerminalPresenter::new(Cursor::new("1\n".repeat(20).into_bytes()), Vec::new());
    let ana = LearnerId::new("ana");

    let report = drive(&mut manager, &mut presenter, &DrivePlan::new(ana.clone(), 3), &CancelFlag::new()).unwrap();

    assert_eq!(report.end, DriveEnd::PlanComplete);
    assert!(report.summary.attempts + report.summary.malformed >= 3);
    assert!(dir.path().join("ana.json").exists());
    assert!(!dir.path().join("ana.lock").exists());

    let store = JsonProfileStore::open(dir.path()).unwrap();
    let profile = store.load_profile(&ana).unwrap();
    assert_eq!(profile.history.sessions, 1);
    assert_eq!(profile.history.total_attempts as usize, report.summary.attempts);

    let output = String::from_utf8(presenter.into_output()).unwrap();
    assert!(output.contains("[basic · "));
}

/// Test that quitting at the first prompt still ends the session cleanly
#[test]
fn test_quit_saves_an_empty_session() {
    let dir = TempDir::new().unwrap();
    let mut manager = manager(&dir);
    let mut presenter = TerminalPresenter::new(Cursor::new(b"salir\n".to_vec()), Vec::new());

    let report = drive(
        &mut manager,
        &mut presenter,
        &DrivePlan::new(LearnerId::new("ana"), 5),
        &CancelFlag::new(),
    )
    .unwrap();

    assert_eq!(report.end, DriveEnd::Quit);
    assert_eq!(report.summary.attempts, 0);
    assert!(dir.path().join("ana.json").exists());
}

/// Test that a lock left by another process blocks the session
#[test]
fn test_existing_lock_is_a_session_conflict() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("ana.lock"), "held elsewhere").unwrap();
    let mut manager = manager(&dir);
    let mut presenter = TerminalPresenter::new(Cursor::new(Vec::new()), Vec::new());

    let err = drive(
        &mut manager,
        &mut presenter,
        &DrivePlan::new(LearnerId::new("ana"), 1),
        &CancelFlag::new(),
    )
    .unwrap_err();

    assert!(matches!(err, SessionError::Store(_)));
    assert_eq!(err.kind(), ErrorKind::SessionConflict);
    assert!(!dir.path().join("ana.json").exists());
}
