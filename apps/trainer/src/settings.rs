//! Trainer settings read from the environment.

use std::path::{Path, PathBuf};

use exercise_core::{ConfigError, EngineConfig, InMemoryContentStore, LearnerId, ParseError};
use thiserror::Error;

/// Reading pack used when `TRAINER_CONTENT` is unset.
pub const DEMO_PACK: &str = include_str!("../content/demo.md");

const DEFAULT_EXERCISES: usize = 10;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("TRAINER_LEARNER must be set")]
    MissingLearner,

    #[error("TRAINER_EXERCISES must be a positive number, got {0:?}")]
    InvalidExercises(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    ConfigSyntax {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid reading pack: {0}")]
    Content(#[from] ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerSettings {
    pub learner: LearnerId,
    pub exercises: usize,
    pub topic: Option<String>,
    /// JSON file with an `EngineConfig`; defaults apply to missing fields.
    pub config_path: Option<PathBuf>,
    /// Reading pack; the bundled demo pack when unset.
    pub content_path: Option<PathBuf>,
    /// Directory holding learner profiles.
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("exercise-trainer")
}

impl TrainerSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build settings from any variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let learner = non_empty("TRAINER_LEARNER").ok_or(SettingsError::MissingLearner)?;

        let exercises = match non_empty("TRAINER_EXERCISES") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(SettingsError::InvalidExercises(raw)),
            },
            None => DEFAULT_EXERCISES,
        };

        Ok(Self {
            learner: LearnerId::new(learner),
            exercises,
            topic: non_empty("TRAINER_TOPIC"),
            config_path: non_empty("TRAINER_CONFIG").map(PathBuf::from),
            content_path: non_empty("TRAINER_CONTENT").map(PathBuf::from),
            data_dir: non_empty("TRAINER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
        })
    }

    /// Engine config from the config file, validated.
    pub fn engine_config(&self) -> Result<EngineConfig, SettingsError> {
        let config = match &self.config_path {
            Some(path) => {
                let raw = read(path)?;
                serde_json::from_str::<EngineConfig>(&raw).map_err(|source| SettingsError::ConfigSyntax {
                    path: path.clone(),
                    source,
                })?
            }
            None => EngineConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn content_store(&self) -> Result<InMemoryContentStore, SettingsError> {
        let pack = match &self.content_path {
            Some(path) => read(path)?,
            None => DEMO_PACK.to_string(),
        };
        Ok(InMemoryContentStore::from_pack(&pack)?)
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.data_dir.join("profiles")
    }
}

fn read(path: &Path) -> Result<String, SettingsError> {
    std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}
