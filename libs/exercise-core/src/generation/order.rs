use rand::seq::SliceRandom;
use rand::Rng;

use super::{Draft, GenContext};
use crate::error::GenerationError;
use crate::exercise::{AnswerKey, ExerciseKind};
use crate::matching::normalize_text;
use crate::types::{AnalyzedText, DifficultyTier, Sentence, Token, WordCategory};

const MIN_UNITS: usize = 3;
const RESHUFFLES: usize = 8;

fn starts_chunk(token: &Token, previous: Option<&Token>) -> bool {
    let opener = matches!(token.category, WordCategory::Verb | WordCategory::FunctionWord);
    let after_function_word = previous.is_some_and(|p| p.category == WordCategory::FunctionWord);
    opener && !after_function_word
}

/// Phrase chunks: a new chunk opens before a verb or a function word (unless
/// the previous word already opened one) and at every comma or semicolon.
fn chunks(text: &AnalyzedText, sentence: &Sentence) -> Vec<String> {
    let mut groups: Vec<Vec<&Token>> = Vec::new();
    let mut previous: Option<&Token> = None;
    for token in &sentence.tokens {
        if !token.is_word() {
            if matches!(token.text.as_str(), "," | ";") {
                previous = None;
                groups.push(Vec::new());
            }
            continue;
        }
        if groups.is_empty() || (starts_chunk(token, previous) && !groups.last().is_some_and(Vec::is_empty)) {
            groups.push(Vec::new());
        }
        if let Some(group) = groups.last_mut() {
            group.push(token);
        }
        previous = Some(token);
    }

    groups
        .into_iter()
        .filter_map(|group| {
            let first = group.first()?;
            let last = group.last()?;
            Some(text.fragment(first.span.cover(last.span)).to_string())
        })
        .collect()
}

/// Units a learner reorders: words at lower tiers, phrase chunks at higher
/// tiers when the sentence has at least three.
pub fn order_units(text: &AnalyzedText, sentence: &Sentence, tier: DifficultyTier) -> Vec<String> {
    if tier >= DifficultyTier::Advanced {
        let chunked = chunks(text, sentence);
        if chunked.len() >= MIN_UNITS {
            return chunked;
        }
    }
    sentence.words().map(|t| t.text.clone()).collect()
}

fn same_order(a: &[String], b: &[String]) -> bool {
    a.iter().map(|u| normalize_text(u)).eq(b.iter().map(|u| normalize_text(u)))
}

pub(super) fn generate(ctx: &mut GenContext<'_>) -> Result<Draft, GenerationError> {
    let text = ctx.text;
    let candidates: Vec<Vec<String>> = text
        .sentences()
        .iter()
        .map(|s| order_units(text, s, ctx.tier))
        .filter(|units| units.len() >= MIN_UNITS)
        .filter(|units| units.iter().any(|u| normalize_text(u) != normalize_text(&units[0])))
        .collect();
    if candidates.is_empty() {
        return Err(GenerationError::material(
            ExerciseKind::OrderSentence,
            ctx.tier,
            "no sentence with three distinct reorderable units",
        ));
    }

    let pick = (ctx.rng.gen_range(0..candidates.len()) + ctx.variant as usize) % candidates.len();
    let units = candidates[pick].clone();

    let mut shuffled = units.clone();
    for _ in 0..RESHUFFLES {
        shuffled.shuffle(&mut ctx.rng);
        if !same_order(&shuffled, &units) {
            break;
        }
    }
    if same_order(&shuffled, &units) {
        // Units are not all equal, so a rotation always differs.
        shuffled.rotate_left(1);
    }

    Ok(Draft {
        prompt: "Ordena las palabras para formar la oración.".to_string(),
        context: None,
        answer: AnswerKey::Order { units },
        distractors: Vec::new(),
        items: shuffled,
    })
}
