//! Synchronous request → present → submit loop over a presentation layer.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{CancelFlag, ExercisesManager, SessionSummary};
use crate::error::{ErrorReport, SessionError};
use crate::exercise::{AttemptResult, Outcome, PresentedExercise, Response, Submission};
use crate::profile::LearnerId;
use crate::store::{ContentStore, ProfileStore};

/// Renders exercises and collects responses. Never sees an answer key.
pub trait Presentation {
    /// Show `exercise` and wait for a response. `None` means the learner quit.
    fn present(&mut self, exercise: &PresentedExercise) -> Option<Response>;

    fn show_result(&mut self, result: &AttemptResult);

    fn show_error(&mut self, error: &ErrorReport);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrivePlan {
    pub learner_id: LearnerId,
    /// Exercises to serve before the session ends.
    pub exercises: usize,
    /// Times one exercise is shown again after a malformed response.
    pub malformed_retries: usize,
}

impl DrivePlan {
    pub fn new(learner_id: LearnerId, exercises: usize) -> Self {
        Self {
            learner_id,
            exercises,
            malformed_retries: 2,
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveEnd {
    PlanComplete,
    Quit,
    Cancelled,
    /// No exercise could be generated.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveReport {
    pub end: DriveEnd,
    pub summary: SessionSummary,
}

/// Run a whole session: start, serve up to `plan.exercises` exercises, end.
/// The profile is saved however the loop stops, including when a submission
/// fails; a failed start, a failed submission or a failed save is returned.
pub fn drive<C, P, U>(
    manager: &mut ExercisesManager<C, P>,
    presenter: &mut U,
    plan: &DrivePlan,
    cancel: &CancelFlag,
) -> Result<DriveReport, SessionError>
where
    C: ContentStore,
    P: ProfileStore,
    U: Presentation + ?Sized,
{
    manager.start_session(plan.learner_id.clone())?;
    let served = serve(manager, presenter, plan, cancel);
    finish(manager, presenter, served)
}

fn serve<C, P, U>(
    manager: &mut ExercisesManager<C, P>,
    presenter: &mut U,
    plan: &DrivePlan,
    cancel: &CancelFlag,
) -> Result<DriveEnd, SessionError>
where
    C: ContentStore,
    P: ProfileStore,
    U: Presentation + ?Sized,
{
    for _ in 0..plan.exercises {
        if cancel.is_cancelled() {
            return Ok(DriveEnd::Cancelled);
        }

        let exercise = match manager.request_next_with(cancel) {
            Ok(exercise) => exercise,
            Err(SessionError::Cancelled) => return Ok(DriveEnd::Cancelled),
            Err(e) => {
                warn!(error = %e, "stopping early");
                presenter.show_error(&e.report());
                return Ok(DriveEnd::Exhausted);
            }
        };

        for _ in 0..=plan.malformed_retries {
            let Some(response) = presenter.present(&exercise) else {
                return Ok(DriveEnd::Quit);
            };
            let result = manager.submit(Submission {
                exercise_id: exercise.id,
                response,
            })?;
            presenter.show_result(&result);
            if result.outcome != Outcome::Malformed {
                break;
            }
        }
    }
    Ok(DriveEnd::PlanComplete)
}

/// End the session whatever `served` holds. A loop error wins over a failed
/// save, which is then only logged.
fn finish<C, P, U>(
    manager: &mut ExercisesManager<C, P>,
    presenter: &mut U,
    served: Result<DriveEnd, SessionError>,
) -> Result<DriveReport, SessionError>
where
    C: ContentStore,
    P: ProfileStore,
    U: Presentation + ?Sized,
{
    let ended = manager.end_session();
    let end = match served {
        Ok(end) => end,
        Err(e) => {
            if let Err(save) = &ended {
                warn!(error = %save, "session not saved after loop failure");
            }
            warn!(error = %e, "session loop failed");
            presenter.show_error(&e.report());
            return Err(e);
        }
    };

    info!(end = ?end, "session loop finished");
    let summary = ended.map_err(|e| {
        presenter.show_error(&e.report());
        e
    })?;
    Ok(DriveReport { end, summary })
}
