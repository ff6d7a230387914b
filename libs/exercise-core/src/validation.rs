//! Grading learner responses against answer keys.

use chrono::{DateTime, Utc};

use crate::analysis::lexicon;
use crate::config::EngineConfig;
use crate::exercise::{
    AnswerKey, AttemptResult, CriterionFeedback, ExerciseSpec, Outcome, Response,
};
use crate::matching::{normalize_text, token_overlap, word_diff, DiffSegment, DEFAULT_FUZZY_THRESHOLD};
use crate::types::WordCategory;

/// Score, verdict and per-criterion notes before they become an attempt.
struct Grade {
    correctness: f64,
    outcome: Outcome,
    feedback: Vec<CriterionFeedback>,
    diff: Vec<DiffSegment>,
}

impl Grade {
    fn exact(passed: bool, feedback: Vec<CriterionFeedback>) -> Self {
        Self {
            correctness: if passed { 1.0 } else { 0.0 },
            outcome: if passed { Outcome::Correct } else { Outcome::Incorrect },
            feedback,
            diff: Vec::new(),
        }
    }

    fn malformed(expected: &str, response: &Response) -> Self {
        Self {
            correctness: 0.0,
            outcome: Outcome::Malformed,
            feedback: vec![CriterionFeedback::new(
                "shape",
                false,
                format!("se esperaba una respuesta de tipo {expected}, no {}", response.shape()),
            )],
            diff: Vec::new(),
        }
    }
}

/// Lowercase with collapsed whitespace; punctuation and accents kept.
fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Fragment comparison that still works for punctuation-only fragments.
fn same_fragment(a: &str, b: &str) -> bool {
    let (na, nb) = (normalize_text(a), normalize_text(b));
    if na.is_empty() || nb.is_empty() {
        collapse(a) == collapse(b)
    } else {
        na == nb
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExerciseValidator {
    fuzzy_threshold: f64,
}

impl Default for ExerciseValidator {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

impl ExerciseValidator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            fuzzy_threshold: config.fuzzy_threshold,
        }
    }

    pub fn validate(&self, spec: &ExerciseSpec, response: &Response) -> AttemptResult {
        self.validate_at(spec, response, Utc::now())
    }

    /// Grade `response`. A response of the wrong shape is reported as a
    /// malformed attempt, never as an error.
    pub fn validate_at(&self, spec: &ExerciseSpec, response: &Response, now: DateTime<Utc>) -> AttemptResult {
        let grade = match &spec.answer {
            AnswerKey::Category { category } => grade_category(*category, response),
            AnswerKey::Span { text, accepted } => self.grade_span(text, accepted, response),
            AnswerKey::Defect {
                fragment,
                correction,
                ..
            } => grade_defect(fragment, correction, response),
            AnswerKey::Order { units } => grade_order(units, response),
        };

        AttemptResult {
            exercise_id: spec.id,
            kind: spec.kind,
            tier: spec.tier,
            response: response.clone(),
            correctness: grade.correctness.clamp(0.0, 1.0),
            outcome: grade.outcome,
            feedback: grade.feedback,
            diff: grade.diff,
            timestamp: now,
        }
    }

    fn grade_span(&self, key: &str, accepted: &[String], response: &Response) -> Grade {
        let Response::Text { text } = response else {
            return Grade::malformed("text", response);
        };

        let given = normalize_text(text);
        let answers: Vec<String> = std::iter::once(key)
            .chain(accepted.iter().map(String::as_str))
            .map(normalize_text)
            .collect();
        let note = if answers.contains(&given) {
            Some("respuesta exacta")
        } else if answers.iter().any(|answer| lexicon::are_synonyms(answer, &given)) {
            Some("sinónimo aceptado")
        } else {
            None
        };
        if let Some(note) = note {
            return Grade {
                correctness: 1.0,
                outcome: Outcome::Correct,
                feedback: vec![CriterionFeedback::new("match", true, note)],
                diff: Vec::new(),
            };
        }

        let overlap = std::iter::once(key)
            .chain(accepted.iter().map(String::as_str))
            .map(|answer| token_overlap(text, answer, self.fuzzy_threshold))
            .fold(0.0, f64::max);
        let outcome = if overlap > 0.0 {
            Outcome::Partial
        } else {
            Outcome::Incorrect
        };
        Grade {
            correctness: overlap,
            outcome,
            feedback: vec![
                CriterionFeedback::new("match", false, format!("la respuesta esperada era «{key}»")),
                CriterionFeedback::new(
                    "overlap",
                    overlap > 0.0,
                    format!("{:.0}% de coincidencia", overlap * 100.0),
                ),
            ],
            diff: word_diff(text, key),
        }
    }
}

fn grade_category(key: WordCategory, response: &Response) -> Grade {
    let given = match response {
        Response::Category { category } => *category,
        Response::Text { text } => match WordCategory::from_label(text) {
            Some(category) => category,
            None => return Grade::malformed("category", response),
        },
        _ => return Grade::malformed("category", response),
    };

    let passed = given == key;
    let note = if passed {
        format!("es un {}", key.label())
    } else {
        format!("no es un {}, es un {}", given.label(), key.label())
    };
    Grade::exact(passed, vec![CriterionFeedback::new("category", passed, note)])
}

fn grade_defect(fragment: &str, correction: &str, response: &Response) -> Grade {
    let (given, fix) = match response {
        Response::Defect {
            fragment,
            correction,
        } => (fragment.as_str(), correction.as_deref()),
        Response::Text { text } => (text.as_str(), None),
        _ => return Grade::malformed("defect", response),
    };

    let located = same_fragment(given, fragment);
    let mut feedback = vec![CriterionFeedback::new(
        "location",
        located,
        if located {
            "encontraste el error".to_string()
        } else {
            format!("el error estaba en «{fragment}»")
        },
    )];

    let corrected = match fix {
        Some(fix) => {
            let ok = collapse(fix) == collapse(correction);
            feedback.push(CriterionFeedback::new(
                "correction",
                ok,
                if ok {
                    "corrección correcta".to_string()
                } else {
                    format!("la corrección era «{correction}»")
                },
            ));
            ok
        }
        None => true,
    };

    Grade::exact(located && corrected, feedback)
}

fn grade_order(units: &[String], response: &Response) -> Grade {
    let Response::Order { units: given } = response else {
        return Grade::malformed("order", response);
    };
    if given.len() != units.len() {
        return Grade {
            feedback: vec![CriterionFeedback::new(
                "shape",
                false,
                format!("se esperaban {} elementos, no {}", units.len(), given.len()),
            )],
            ..Grade::malformed("order", response)
        };
    }

    let first_miss = given
        .iter()
        .zip(units)
        .position(|(g, u)| normalize_text(g) != normalize_text(u));
    let passed = first_miss.is_none();
    let note = match first_miss {
        None => "orden correcto".to_string(),
        Some(i) => format!("la posición {} debía ser «{}»", i + 1, units[i]),
    };
    Grade::exact(passed, vec![CriterionFeedback::new("order", passed, note)])
}

/// Validate with the default fuzzy threshold.
pub fn validate(spec: &ExerciseSpec, response: &Response) -> AttemptResult {
    ExerciseValidator::default().validate(spec, response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::{ExerciseId, ExerciseKind};
    use crate::types::{DifficultyTier, IssueCategory};
    use pretty_assertions::assert_eq;

    fn spec(kind: ExerciseKind, answer: AnswerKey) -> ExerciseSpec {
        ExerciseSpec {
            id: ExerciseId::derive(&["test", kind.as_str()]),
            kind,
            tier: DifficultyTier::Basic,
            prompt: String::new(),
            context: None,
            answer,
            distractors: vec![],
            items: vec![],
        }
    }

    fn span_spec() -> ExerciseSpec {
        spec(
            ExerciseKind::Comprehension,
            AnswerKey::Span {
                text: "manzanas rojas".into(),
                accepted: vec![],
            },
        )
    }

    #[test]
    fn comprehension_exact_match_ignores_case_and_punctuation() {
        let result = validate(&span_spec(), &Response::text("  Manzanas ROJAS. "));
        assert_eq!(result.correctness, 1.0);
        assert_eq!(result.outcome, Outcome::Correct);
    }

    #[test]
    fn comprehension_partial_credit() {
        let result = validate(&span_spec(), &Response::text("manzanas"));
        assert_eq!(result.outcome, Outcome::Partial);
        assert!(result.correctness > 0.0 && result.correctness < 1.0);
        assert!(!result.diff.is_empty());
    }

    #[test]
    fn comprehension_accepts_synonyms() {
        let answer = |text: &str| {
            spec(
                ExerciseKind::Comprehension,
                AnswerKey::Span {
                    text: text.into(),
                    accepted: vec![],
                },
            )
        };
        let result = validate(&answer("grande"), &Response::text("Enorme"));
        assert_eq!(result.outcome, Outcome::Correct);
        assert_eq!(result.feedback[0].note, "sinónimo aceptado");
        assert_eq!(validate(&answer("sí"), &Response::text("verdadero")).outcome, Outcome::Correct);
        assert_eq!(validate(&answer("pequeño"), &Response::text("diminuto")).outcome, Outcome::Correct);
        assert_eq!(validate(&answer("grande"), &Response::text("lento")).outcome, Outcome::Incorrect);
    }

    #[test]
    fn wrong_shape_is_malformed_not_an_error() {
        let result = validate(
            &span_spec(),
            &Response::Order {
                units: vec!["a".into()],
            },
        );
        assert_eq!(result.outcome, Outcome::Malformed);
        assert_eq!(result.correctness, 0.0);
        assert_eq!(result.feedback[0].criterion, "shape");
    }

    #[test]
    fn classify_accepts_labels() {
        let spec = spec(
            ExerciseKind::ClassifyWord,
            AnswerKey::Category {
                category: WordCategory::Noun,
            },
        );
        assert!(validate(&spec, &Response::text("sustantivo")).is_correct());
        assert!(!validate(&spec, &Response::Category { category: WordCategory::Verb }).is_correct());
        assert_eq!(validate(&spec, &Response::text("???")).outcome, Outcome::Malformed);
    }

    #[test]
    fn find_error_grades_location_and_optional_correction() {
        let spec = spec(
            ExerciseKind::FindError,
            AnswerKey::Defect {
                fragment: "manzanas".into(),
                correction: "manzanas.".into(),
                category: IssueCategory::Punctuation,
            },
        );
        let located = Response::Defect {
            fragment: "manzanas".into(),
            correction: None,
        };
        assert!(validate(&spec, &located).is_correct());

        let bad_fix = Response::Defect {
            fragment: "manzanas".into(),
            correction: Some("manzanas".into()),
        };
        let result = validate(&spec, &bad_fix);
        assert_eq!(result.outcome, Outcome::Incorrect);
        assert!(result.feedback[0].passed);
        assert!(!result.feedback[1].passed);

        assert!(!validate(&spec, &Response::text("niño")).is_correct());
    }

    #[test]
    fn order_requires_the_exact_sequence() {
        let spec = spec(
            ExerciseKind::OrderSentence,
            AnswerKey::Order {
                units: vec!["El".into(), "niño".into(), "come".into()],
            },
        );
        let shuffled = Response::Order {
            units: vec!["come".into(), "El".into(), "niño".into()],
        };
        assert_eq!(validate(&spec, &shuffled).outcome, Outcome::Incorrect);

        let right = Response::Order {
            units: vec!["el".into(), "niño".into(), "come".into()],
        };
        assert!(validate(&spec, &right).is_correct());

        let short = Response::Order {
            units: vec!["El".into()],
        };
        assert_eq!(validate(&spec, &short).outcome, Outcome::Malformed);
    }
}
