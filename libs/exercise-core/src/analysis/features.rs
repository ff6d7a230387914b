//! Aggregate text features.

use std::collections::HashSet;

use crate::analysis::lexicon;
use crate::types::{Sentence, TextFeatures, WordCategory};

const VOWELS: &str = "aeiouáéíóúü";

/// Syllable estimate: number of vowel groups, at least one.
pub fn count_syllables(word: &str) -> usize {
    let mut groups = 0;
    let mut in_vowel = false;
    for c in word.chars().flat_map(char::to_lowercase) {
        let is_vowel = VOWELS.contains(c);
        if is_vowel && !in_vowel {
            groups += 1;
        }
        in_vowel = is_vowel;
    }
    groups.max(1)
}

/// Flesch reading ease with the standard coefficients, clamped to 0-100.
pub fn reading_ease(avg_sentence_length: f64, syllables_per_word: f64) -> f64 {
    (206.835 - 1.015 * avg_sentence_length - 84.6 * syllables_per_word).clamp(0.0, 100.0)
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

pub(crate) fn compute(sentences: &[Sentence]) -> TextFeatures {
    let token_count = sentences.iter().map(|s| s.tokens.len()).sum();
    let words: Vec<_> = sentences.iter().flat_map(|s| s.words()).collect();
    if words.is_empty() {
        return TextFeatures {
            token_count,
            ..Default::default()
        };
    }

    let word_count = words.len();
    let unique: HashSet<&str> = words.iter().map(|t| t.normalized.as_str()).collect();
    let letters: usize = words.iter().map(|t| t.text.chars().count()).sum();
    let syllables: Vec<usize> = words.iter().map(|t| count_syllables(&t.text)).collect();
    let total_syllables: usize = syllables.iter().sum();
    let complex = syllables.iter().filter(|&&n| n > 2).count();

    let content: Vec<_> = words
        .iter()
        .filter(|t| t.category != WordCategory::FunctionWord)
        .filter(|t| t.text.chars().all(char::is_alphabetic))
        .collect();
    let rare = content
        .iter()
        .filter(|t| !lexicon::is_common(&t.normalized))
        .count();

    let mut paragraphs: Vec<usize> = sentences.iter().map(|s| s.paragraph).collect();
    paragraphs.dedup();

    let avg_sentence_length = ratio(word_count, sentences.len());
    let syllable_density = ratio(total_syllables, word_count);

    TextFeatures {
        token_count,
        word_count,
        sentence_count: sentences.len(),
        paragraph_count: paragraphs.len(),
        unique_word_ratio: ratio(unique.len(), word_count),
        avg_word_length: ratio(letters, word_count),
        avg_sentence_length,
        syllable_density,
        rare_word_ratio: ratio(rare, content.len()),
        complex_word_ratio: ratio(complex, word_count),
        reading_ease: reading_ease(avg_sentence_length, syllable_density),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syllables_follow_vowel_groups() {
        assert_eq!(count_syllables("manzanas"), 3);
        assert_eq!(count_syllables("niño"), 2);
        assert_eq!(count_syllables("el"), 1);
        assert_eq!(count_syllables("ciudad"), 2);
        assert_eq!(count_syllables("x"), 1);
    }

    #[test]
    fn reading_ease_is_clamped() {
        assert_eq!(reading_ease(80.0, 4.0), 0.0);
        assert_eq!(reading_ease(1.0, 0.5), 100.0);
    }

    #[test]
    fn empty_input_has_zero_features() {
        assert_eq!(compute(&[]), TextFeatures::default());
    }
}
