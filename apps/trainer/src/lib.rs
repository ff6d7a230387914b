pub mod profiles;
pub mod settings;
pub mod terminal;

use exercise_core::{drive, CancelFlag, DriveEnd, DrivePlan, ExercisesManager};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::profiles::JsonProfileStore;
use crate::settings::TrainerSettings;
use crate::terminal::TerminalPresenter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with exercises on stdout.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = TrainerSettings::from_env()?;
    let config = settings.engine_config()?;
    let content = settings.content_store()?;
    tracing::info!(texts = content.texts().len(), "reading pack loaded");

    let profiles = JsonProfileStore::open(settings.profiles_dir())?;
    tracing::info!(dir = %profiles.root().display(), "profile store ready");

    let mut manager = ExercisesManager::new(config, content, profiles)?;
    if let Some(topic) = &settings.topic {
        manager = manager.with_topic(topic.clone());
    }

    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing session");
            on_signal.cancel();
        }
    });

    let plan = DrivePlan::new(settings.learner.clone(), settings.exercises);
    let report = tokio::task::spawn_blocking(move || {
        let mut presenter = TerminalPresenter::stdio();
        let report = drive(&mut manager, &mut presenter, &plan, &cancel)?;
        presenter.show_summary(&report.summary);
        Ok::<_, anyhow::Error>(report)
    })
    .await??;

    if report.end == DriveEnd::Exhausted {
        tracing::warn!("ran out of texts before the plan was complete");
    }
    Ok(())
}
