//! Find-error exercises from natural issues or checked corruptions.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::{distractors, Draft, GenContext};
use crate::analysis::lexicon::{self, Number};
use crate::error::GenerationError;
use crate::exercise::{AnswerKey, ExerciseKind};
use crate::types::{AnalyzedText, DifficultyTier, GrammarIssue, Sentence, Span, Token, WordCategory};

const PROMPT: &str = "Encuentra el error en la oración.";

/// A controlled way of breaking a correct sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Corruption {
    AgreementSwap,
    RepeatedWord,
    DroppedTerminal,
}

impl Corruption {
    /// Highest tier first.
    const ALL: [Corruption; 3] = [Self::AgreementSwap, Self::RepeatedWord, Self::DroppedTerminal];

    fn min_tier(self) -> DifficultyTier {
        match self {
            Self::AgreementSwap => DifficultyTier::Advanced,
            Self::RepeatedWord => DifficultyTier::Intermediate,
            Self::DroppedTerminal => DifficultyTier::Basic,
        }
    }

    /// Rule that must flag the corrupted sentence.
    fn rule_id(self) -> &'static str {
        match self {
            Self::AgreementSwap => "determiner-agreement",
            Self::RepeatedWord => "repeated-word",
            Self::DroppedTerminal => "missing-terminal",
        }
    }

    /// Corrupted copy of `sentence`'s text, or `None` if it does not apply.
    fn apply(self, source: &str, sentence: &Sentence) -> Option<String> {
        let base = sentence.span.start;
        let text = sentence.text(source);
        let local = |span: Span| (span.start - base, span.end - base);

        match self {
            Self::AgreementSwap => {
                let (det_token, det) = sentence.tokens.windows(2).find_map(|pair| {
                    let det = lexicon::determiner(&pair[0].normalized)?;
                    let (_, number) = lexicon::noun_features(&pair[1].normalized);
                    (pair[1].category == WordCategory::Noun && number.is_some()).then_some((&pair[0], det))
                })?;
                let flipped = match det.number {
                    Number::Singular => Number::Plural,
                    Number::Plural => Number::Singular,
                };
                let replacement = lexicon::determiner_for(det.paradigm, det.gender, flipped);
                let (start, end) = local(det_token.span);
                Some(format!("{}{}{}", &text[..start], keep_case(&det_token.text, replacement), &text[end..]))
            }
            Self::RepeatedWord => {
                let word = sentence
                    .words()
                    .find(|t| matches!(t.category, WordCategory::Verb | WordCategory::Noun))?;
                let (_, end) = local(word.span);
                Some(format!("{} {}{}", &text[..end], word.normalized, &text[end..]))
            }
            Self::DroppedTerminal => {
                let last = sentence.tokens.last()?;
                if !last.is_terminal() {
                    return None;
                }
                let (start, _) = local(last.span);
                Some(text[..start].trim_end().to_string())
            }
        }
    }
}

fn keep_case(model: &str, word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if model.chars().next().is_some_and(char::is_uppercase) => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => word.to_string(),
    }
}

/// Single words of `sentence` that do not touch any issue.
fn word_candidates(sentence: &Sentence, issues: &[GrammarIssue]) -> Vec<String> {
    sentence
        .words()
        .filter(|t: &&Token| !issues.iter().any(|i| i.span.overlaps(t.span)))
        .map(|t| t.text.clone())
        .collect()
}

fn draft(
    ctx: &mut GenContext<'_>,
    context: String,
    issue: &GrammarIssue,
    candidates: Vec<String>,
) -> Result<Draft, GenerationError> {
    let correction = issue.suggestion.clone().unwrap_or_default();
    let mut candidates = candidates;
    candidates.shuffle(&mut ctx.rng);
    let distractors = distractors::pick(candidates, &[issue.fragment.as_str()], ctx.distractor_count)?;
    Ok(Draft {
        prompt: PROMPT.to_string(),
        context: Some(context),
        answer: AnswerKey::Defect {
            fragment: issue.fragment.clone(),
            correction,
            category: issue.category,
        },
        distractors,
        items: Vec::new(),
    })
}

pub(super) fn generate(ctx: &mut GenContext<'_>) -> Result<Draft, GenerationError> {
    let text: &AnalyzedText = ctx.text;
    let issues = ctx.checker.check(text);

    let natural: Vec<&GrammarIssue> = issues
        .iter()
        .filter(|i| i.category.min_tier() <= ctx.tier && i.suggestion.is_some())
        .collect();
    if !natural.is_empty() {
        let pick = (ctx.rng.gen_range(0..natural.len()) + ctx.variant as usize) % natural.len();
        let issue = natural[pick];
        let sentence = &text.sentences()[issue.sentence_index];
        let sentence_issues: Vec<GrammarIssue> = issues
            .iter()
            .filter(|i| i.sentence_index == issue.sentence_index)
            .cloned()
            .collect();
        let candidates = word_candidates(sentence, &sentence_issues);
        let context = sentence.text(text.source()).to_string();
        match draft(ctx, context, issue, candidates) {
            Ok(draft) => return Ok(draft),
            Err(e) => debug!("natural issue unusable, trying corruptions: {}", e),
        }
    }

    let mut order: Vec<usize> = (0..text.sentences().len()).collect();
    order.shuffle(&mut ctx.rng);
    let shift = ctx.variant as usize % order.len().max(1);
    order.rotate_left(shift);

    let tier = ctx.tier;
    let mut last_error = None;
    for corruption in Corruption::ALL.into_iter().filter(|c| c.min_tier() <= tier) {
        for &index in &order {
            let sentence = &text.sentences()[index];
            let Some(corrupted) = corruption.apply(text.source(), sentence) else {
                continue;
            };

            // Keep the corruption only if the checker flags it.
            let analyzed = ctx.analyzer.analyze(&corrupted);
            let found = ctx.checker.check(&analyzed);
            let Some(issue) = found.iter().find(|i| i.rule_id == corruption.rule_id() && i.suggestion.is_some())
            else {
                debug!(?corruption, sentence = index, "corruption not detected, skipping");
                continue;
            };
            let Some(corrupted_sentence) = analyzed.sentences().first() else {
                continue;
            };

            let candidates = word_candidates(corrupted_sentence, &found);
            match draft(ctx, corrupted.clone(), issue, candidates) {
                Ok(draft) => return Ok(draft),
                Err(e) => last_error = Some(e),
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        GenerationError::material(
            ExerciseKind::FindError,
            ctx.tier,
            "no usable issue and no detectable corruption",
        )
    }))
}

#[cfg(test)]
mod tests {
    use crate::analysis::analyze;
    use crate::exercise::{AnswerKey, ExerciseKind};
    use crate::generation::generate;
    use crate::types::{DifficultyTier, IssueCategory};
    use pretty_assertions::assert_eq;

    const CLEAN: &str = "El niño come manzanas. El niño come manzanas rojas.";

    fn defect(spec: &crate::exercise::ExerciseSpec) -> (String, String, IssueCategory) {
        match &spec.answer {
            AnswerKey::Defect {
                fragment,
                correction,
                category,
            } => (fragment.clone(), correction.clone(), *category),
            other => panic!("unexpected key {other:?}"),
        }
    }

    #[test]
    fn advanced_tier_synthesizes_agreement_errors() {
        let spec = generate(&analyze(CLEAN), DifficultyTier::Advanced, ExerciseKind::FindError).unwrap();
        let (fragment, correction, category) = defect(&spec);
        assert_eq!(category, IssueCategory::Agreement);
        assert_eq!(fragment, "Los");
        assert_eq!(correction, "El");
        assert!(spec.context.unwrap().starts_with("Los niño come"));
        assert_eq!(spec.distractors.len(), 3);
    }

    #[test]
    fn basic_tier_drops_punctuation() {
        let spec = generate(&analyze(CLEAN), DifficultyTier::Basic, ExerciseKind::FindError).unwrap();
        let (fragment, correction, category) = defect(&spec);
        assert_eq!(category, IssueCategory::Punctuation);
        assert_eq!(correction, format!("{fragment}."));
    }

    #[test]
    fn natural_issues_are_preferred() {
        let text = analyze("Ayer haiga llovido mucho en el pueblo.");
        let spec = generate(&text, DifficultyTier::Basic, ExerciseKind::FindError).unwrap();
        let (fragment, correction, category) = defect(&spec);
        assert_eq!((fragment.as_str(), correction.as_str()), ("haiga", "haya"));
        assert_eq!(category, IssueCategory::Spelling);
        assert!(!spec.distractors.contains(&"haiga".to_string()));
    }

    #[test]
    fn natural_issues_above_the_tier_are_ignored() {
        // The agreement slip is only fair game from the advanced tier.
        let text = analyze("La problema es grande. El perro come pan.");
        let spec = generate(&text, DifficultyTier::Basic, ExerciseKind::FindError).unwrap();
        assert_ne!(defect(&spec).2, IssueCategory::Agreement);
    }
}
