use rand::Rng;
use std::collections::HashSet;

use super::{distractors, Draft, GenContext};
use crate::error::GenerationError;
use crate::exercise::{AnswerKey, ExerciseKind};
use crate::types::{DifficultyTier, Token, WordCategory};

/// Categories a learner is asked about at each tier.
pub(crate) fn target_categories(tier: DifficultyTier) -> &'static [WordCategory] {
    use WordCategory::*;
    match tier {
        DifficultyTier::Basic => &[Noun, Verb],
        DifficultyTier::Intermediate => &[Noun, Verb, Adjective],
        DifficultyTier::Advanced => &[Noun, Verb, Adjective, Adverb],
        DifficultyTier::Expert => &[Noun, Verb, Adjective, Adverb, FunctionWord],
    }
}

pub(super) fn generate(ctx: &mut GenContext<'_>) -> Result<Draft, GenerationError> {
    let targets = target_categories(ctx.tier);

    let mut seen = HashSet::new();
    let candidates: Vec<(usize, &Token)> = ctx
        .text
        .sentences()
        .iter()
        .enumerate()
        .flat_map(|(i, s)| s.tokens.iter().map(move |t| (i, t)))
        .filter(|(_, t)| targets.contains(&t.category))
        .filter(|(_, t)| t.text.chars().count() > 1 && t.text.chars().all(char::is_alphabetic))
        .filter(|(_, t)| seen.insert(t.normalized.clone()))
        .collect();

    if candidates.is_empty() {
        return Err(GenerationError::material(
            ExerciseKind::ClassifyWord,
            ctx.tier,
            "no word of a classifiable category",
        ));
    }

    let pick = (ctx.rng.gen_range(0..candidates.len()) + ctx.variant as usize) % candidates.len();
    let (sentence_index, token) = candidates[pick];
    let answer = token.category;

    // Categories that occur in the text come first.
    let present: HashSet<WordCategory> = ctx.text.tokens().map(|t| t.category).collect();
    let (mut pool, rest): (Vec<WordCategory>, Vec<WordCategory>) = WordCategory::TAXONOMY
        .into_iter()
        .filter(|c| *c != answer)
        .partition(|c| present.contains(c));
    pool.extend(rest);

    let distractors = distractors::pick(
        pool.into_iter().map(|c| c.label().to_string()),
        &[answer.label()],
        ctx.distractor_count,
    )?;

    Ok(Draft {
        prompt: format!("¿Qué clase de palabra es «{}»?", token.text),
        context: ctx.text.sentence_text(sentence_index).map(str::to_string),
        answer: AnswerKey::Category { category: answer },
        distractors,
        items: Vec::new(),
    })
}
