//! Analyze → check → score → generate → validate, end to end.

mod common;

use pretty_assertions::assert_eq;

use common::fixtures::APPLES;
use common::correct_response;
use exercise_core::{
    analyze, apply_suggestions, check, generate, score, validate, AnswerKey, DifficultyTier, ExerciseKind,
    IssueCategory, Outcome, Response,
};

/// Test the apple scenario from raw text to a fully correct attempt.
#[test]
fn test_apples_scenario() {
    let text = analyze(APPLES);
    assert_eq!(text.sentences().len(), 2);

    let issues = check(&text);
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");

    let profile = score(&text, Some(&issues));
    assert_eq!(profile.tier, DifficultyTier::Basic);

    let spec = generate(&text, DifficultyTier::Basic, ExerciseKind::Comprehension).unwrap();
    assert_eq!(spec.answer.display_value(), "manzanas rojas");
    assert!(APPLES.contains(&spec.answer.display_value()));

    let result = validate(&spec, &Response::text("manzanas rojas"));
    assert_eq!(result.correctness, 1.0);
    assert_eq!(result.outcome, Outcome::Correct);
}

/// Test find-error on a clean text at the advanced tier uses a synthesized error.
#[test]
fn test_find_error_on_clean_text_at_advanced() {
    let text = analyze(APPLES);
    let spec = generate(&text, DifficultyTier::Advanced, ExerciseKind::FindError).unwrap();

    let AnswerKey::Defect { fragment, category, .. } = &spec.answer else {
        panic!("expected a defect key, got {:?}", spec.answer);
    };
    assert_eq!(*category, IssueCategory::Agreement);

    // The corrupted context really carries the error the key names.
    let context = spec.context.clone().unwrap();
    let found = check(&analyze(&context));
    assert!(found.iter().any(|i| &i.fragment == fragment));

    assert!(validate(&spec, &correct_response(&spec)).is_correct());
}

/// Test every kind at every tier produces an exercise its own key answers.
#[test]
fn test_every_exercise_accepts_its_key() {
    let text = analyze(APPLES);
    for tier in DifficultyTier::ALL {
        for kind in ExerciseKind::ALL {
            let spec = generate(&text, tier, kind).unwrap();
            let result = validate(&spec, &correct_response(&spec));
            assert_eq!(result.correctness, 1.0, "{kind} at {tier}");
        }
    }
}

/// Test presenting the shuffled order back is marked incorrect.
#[test]
fn test_shuffled_order_is_incorrect() {
    let text = analyze(APPLES);
    let spec = generate(&text, DifficultyTier::Basic, ExerciseKind::OrderSentence).unwrap();
    let presented = spec.present();

    let result = validate(
        &spec,
        &Response::Order {
            units: presented.items.clone(),
        },
    );
    assert_eq!(result.outcome, Outcome::Incorrect);
    assert_eq!(result.correctness, 0.0);
}

/// Test choice exercises offer the answer among the distractors.
#[test]
fn test_options_contain_the_answer_once() {
    let text = analyze(APPLES);
    for kind in [ExerciseKind::ClassifyWord, ExerciseKind::Comprehension, ExerciseKind::FindError] {
        let spec = generate(&text, DifficultyTier::Intermediate, kind).unwrap();
        let presented = spec.present();
        assert_eq!(presented.options.len(), spec.distractors.len() + 1);
        let answer = spec.answer.display_value();
        assert_eq!(presented.options.iter().filter(|o| **o == answer).count(), 1, "{kind}");
    }
}

/// Test auto-correction removes the agreement error.
#[test]
fn test_apply_suggestions_fixes_agreement() {
    let flawed = "la niños come manzanas";
    let issues = check(&analyze(flawed));
    assert!(issues.iter().any(|i| i.category == IssueCategory::Agreement));

    let corrected = apply_suggestions(flawed, &issues);
    let remaining = check(&analyze(&corrected));
    assert!(remaining.iter().all(|i| i.category != IssueCategory::Agreement));
}
