//! Learner adaptation: mastery models and the working-tier controller.

pub mod ema;
pub mod hysteresis;

pub use hysteresis::{TierChange, TierController};

/// Rule for folding one attempt's correctness into a skill's mastery.
pub trait MasteryModel: Send + Sync {
    /// Model identifier, as used in `EngineConfig::mastery_model`.
    fn name(&self) -> &'static str;

    /// Mastery of a skill that has never been practised.
    fn initial(&self) -> f64;

    /// New mastery after an attempt scored `correctness`. `attempts` is the
    /// number of earlier attempts on the skill.
    fn update(&self, current: f64, correctness: f64, attempts: u32) -> f64;
}

/// Get mastery model by name.
pub fn get_model(name: &str, alpha: f64) -> Option<Box<dyn MasteryModel>> {
    match name {
        "ema" => Some(Box::new(ema::Ema::new(alpha))),
        "mean" => Some(Box::new(ema::RunningMean)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_are_found_by_name() {
        assert_eq!(get_model("ema", 0.3).map(|m| m.name()), Some("ema"));
        assert_eq!(get_model("mean", 0.3).map(|m| m.name()), Some("mean"));
        assert!(get_model("sm2", 0.3).is_none());
    }
}
