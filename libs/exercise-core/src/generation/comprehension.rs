use rand::seq::SliceRandom;

use super::{distractors, Draft, GenContext};
use crate::analysis::lexicon;
use crate::error::GenerationError;
use crate::exercise::{AnswerKey, ExerciseKind};
use crate::types::{AnalyzedText, Sentence, Span, Token, WordCategory};

/// Subject, verb and object located in one sentence.
struct Clause<'a> {
    subject: &'a [Token],
    verb: &'a Token,
    object: &'a [Token],
}

impl Clause<'_> {
    fn object_words(&self) -> usize {
        self.object.len()
    }
}

fn covering(tokens: &[Token]) -> Option<Span> {
    Some(tokens.first()?.span.cover(tokens.last()?.span))
}

fn is_nominal(token: &Token) -> bool {
    matches!(token.category, WordCategory::Noun | WordCategory::Unknown)
        && token.text.chars().all(char::is_alphabetic)
}

fn is_phrase_word(token: &Token) -> bool {
    is_nominal(token)
        || token.category == WordCategory::Adjective
        || lexicon::determiner(&token.normalized).is_some()
}

/// First verb preceded by a noun phrase and followed by one.
fn find_clause(sentence: &Sentence) -> Option<Clause<'_>> {
    let tokens = &sentence.tokens;
    let v = tokens.iter().position(|t| t.category == WordCategory::Verb)?;

    let subject_start = tokens[..v]
        .iter()
        .rposition(|t| !is_phrase_word(t))
        .map_or(0, |i| i + 1);
    let subject = &tokens[subject_start..v];
    if !subject.iter().any(is_nominal) {
        return None;
    }

    let object_end = tokens[v + 1..]
        .iter()
        .position(|t| !is_phrase_word(t))
        .map_or(tokens.len(), |i| v + 1 + i);
    let object = &tokens[v + 1..object_end];
    if !object.iter().any(is_nominal) {
        return None;
    }

    Some(Clause {
        subject,
        verb: &tokens[v],
        object,
    })
}

/// Subject phrase as it reads mid-sentence.
fn subject_phrase(text: &AnalyzedText, subject: &[Token]) -> Option<String> {
    let span = covering(subject)?;
    let phrase = text.fragment(span);
    let first = subject.first()?;
    if first.category == WordCategory::FunctionWord {
        Some(format!("{}{}", first.normalized, &phrase[first.text.len()..]))
    } else {
        Some(phrase.to_string())
    }
}

/// Noun phrases and single content words usable as wrong answers.
fn candidate_spans(text: &AnalyzedText) -> Vec<String> {
    let mut spans = Vec::new();
    for sentence in text.sentences() {
        if let Some(clause) = find_clause(sentence) {
            for phrase in [clause.subject, clause.object] {
                if let Some(span) = covering(phrase) {
                    spans.push(text.fragment(span).to_string());
                }
            }
        }
        for token in sentence.words() {
            if is_nominal(token) || token.category == WordCategory::Adjective {
                spans.push(token.text.clone());
            }
        }
    }
    spans
}

pub(super) fn generate(ctx: &mut GenContext<'_>) -> Result<Draft, GenerationError> {
    let text = ctx.text;
    let mut clauses: Vec<Clause<'_>> = text.sentences().iter().filter_map(find_clause).collect();
    if clauses.is_empty() {
        return Err(GenerationError::material(
            ExerciseKind::Comprehension,
            ctx.tier,
            "no sentence with a subject, verb and object",
        ));
    }
    // Longest object first; ties keep document order.
    clauses.sort_by(|a, b| b.object_words().cmp(&a.object_words()));
    let clause = &clauses[ctx.variant as usize % clauses.len()];

    let subject = subject_phrase(text, clause.subject).unwrap_or_default();
    let object_span = covering(clause.object).unwrap_or_default();
    let answer = text.fragment(object_span).to_string();

    // "las manzanas rojas" also accepts "manzanas rojas".
    let mut accepted = Vec::new();
    if let [first, rest @ ..] = clause.object {
        if lexicon::determiner(&first.normalized).is_some() {
            if let Some(span) = covering(rest) {
                accepted.push(text.fragment(span).to_string());
            }
        }
    }

    let mut pool = candidate_spans(text);
    pool.shuffle(&mut ctx.rng);
    let mut excluded: Vec<&str> = vec![answer.as_str()];
    excluded.extend(accepted.iter().map(String::as_str));
    let distractors = distractors::pick(pool, &excluded, ctx.distractor_count)?;

    Ok(Draft {
        prompt: format!("¿Qué {} {}?", clause.verb.normalized, subject),
        context: Some(text.source().trim().to_string()),
        answer: AnswerKey::Span { text: answer, accepted },
        distractors,
        items: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use crate::analysis::analyze;
    use crate::exercise::{AnswerKey, ExerciseKind};
    use crate::generation::{generate, ExerciseGenerator};
    use crate::types::DifficultyTier;
    use pretty_assertions::assert_eq;

    #[test]
    fn asks_about_the_longest_object() {
        let text = analyze("El niño come manzanas. El niño come manzanas rojas.");
        let spec = generate(&text, DifficultyTier::Basic, ExerciseKind::Comprehension).unwrap();
        assert_eq!(spec.prompt, "¿Qué come el niño?");
        assert_eq!(
            spec.answer,
            AnswerKey::Span {
                text: "manzanas rojas".into(),
                accepted: vec![]
            }
        );
        assert_eq!(spec.distractors.len(), 3);
    }

    #[test]
    fn variants_walk_through_clauses() {
        let text = analyze("El niño come manzanas. El niño come manzanas rojas.");
        let generator = ExerciseGenerator::default();
        let second = generator
            .generate_variant(&text, DifficultyTier::Basic, ExerciseKind::Comprehension, 1)
            .unwrap();
        assert_eq!(second.answer.display_value(), "manzanas");
    }

    #[test]
    fn leading_determiners_are_optional() {
        let text = analyze("La niña lee un libro nuevo. El perro bebe agua fría.");
        let spec = generate(&text, DifficultyTier::Basic, ExerciseKind::Comprehension).unwrap();
        assert_eq!(
            spec.answer,
            AnswerKey::Span {
                text: "un libro nuevo".into(),
                accepted: vec!["libro nuevo".into()]
            }
        );
        assert_eq!(spec.prompt, "¿Qué lee la niña?");
    }
}
