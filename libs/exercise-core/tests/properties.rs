//! Property tests for the engine's invariants.

mod common;

use proptest::prelude::*;
use std::collections::HashSet;

use common::fixtures::SENTENCE_POOL;
use exercise_core::adaptive::ema::Ema;
use exercise_core::{
    analyze, normalize_text, score, DifficultyTier, EngineConfig, ExerciseGenerator, ExerciseKind,
    GenerationError, MasteryModel, TierController,
};

fn tier() -> impl Strategy<Value = DifficultyTier> {
    prop::sample::select(DifficultyTier::ALL.to_vec())
}

fn choice_kind() -> impl Strategy<Value = ExerciseKind> {
    prop::sample::select(vec![
        ExerciseKind::ClassifyWord,
        ExerciseKind::Comprehension,
        ExerciseKind::FindError,
    ])
}

proptest! {
    #[test]
    fn analysis_is_idempotent(text in "[a-zA-ZáéíóúñÁÉÍÓÚÑ¡¿!?.,;:'\" \n0-9-]{0,120}") {
        prop_assert_eq!(analyze(&text), analyze(&text));
    }

    #[test]
    fn wordless_text_scores_zero(text in "[ \n\t.,;:!?¡¿]{0,30}") {
        let analyzed = analyze(&text);
        prop_assert!(analyzed.sentences().is_empty());
        let profile = score(&analyzed, None);
        prop_assert_eq!(profile.score, 0.0);
        prop_assert_eq!(profile.tier, DifficultyTier::Basic);
    }

    #[test]
    fn distractors_exclude_the_answer_and_each_other(
        sentences in prop::sample::subsequence(SENTENCE_POOL.to_vec(), 1..=4),
        tier in tier(),
        kind in choice_kind(),
        count in 1usize..=4,
    ) {
        let text = analyze(&sentences.join(" "));
        let generator = ExerciseGenerator::new(&EngineConfig {
            distractor_count: count,
            ..Default::default()
        });

        match generator.generate(&text, tier, kind) {
            Ok(spec) => {
                prop_assert_eq!(spec.distractors.len(), count);
                let answer = normalize_text(&spec.answer.display_value());
                let mut seen = HashSet::new();
                for distractor in &spec.distractors {
                    let key = normalize_text(distractor);
                    prop_assert_ne!(&key, &answer);
                    prop_assert!(seen.insert(key), "duplicate distractor {}", distractor);
                }
            }
            Err(GenerationError::InsufficientDistractors { needed, available }) => {
                prop_assert_eq!(needed, count);
                prop_assert!(available < count);
            }
            Err(GenerationError::InsufficientMaterial { .. }) => {}
        }
    }

    #[test]
    fn ema_mastery_stays_in_bounds(
        alpha in 0.001f64..0.999,
        scores in prop::collection::vec(0.0f64..=1.0, 0..50),
    ) {
        let model = Ema::new(alpha);
        let mut mastery = model.initial();
        for (i, correctness) in scores.into_iter().enumerate() {
            mastery = model.update(mastery, correctness, i as u32);
            prop_assert!((0.0..=1.0).contains(&mastery));
        }
    }

    #[test]
    fn tier_changes_are_spaced(
        hysteresis_window in 1usize..6,
        accuracy_window in 1usize..6,
        scores in prop::collection::vec(prop::sample::select(vec![0.0, 0.5, 1.0]), 0..60),
    ) {
        let config = EngineConfig {
            hysteresis_window,
            accuracy_window,
            ..Default::default()
        };
        let mut controller = TierController::new(DifficultyTier::Intermediate, &config);
        let mut last_change: Option<usize> = None;
        for (i, correctness) in scores.into_iter().enumerate() {
            if controller.record(correctness).is_some() {
                if let Some(previous) = last_change {
                    prop_assert!(i - previous >= hysteresis_window);
                }
                last_change = Some(i);
            }
        }
    }
}
