//! Answer matching: normalization, edit distance, token overlap and word diffs.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Similarity at which a near-miss token still earns partial credit.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// Strip diacritics, including the tilde of `ñ`.
pub fn remove_accents(s: &str) -> String {
    s.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

/// Lowercase, accent-folded, punctuation-free text with single spaces.
pub fn normalize_text(s: &str) -> String {
    let folded: String = remove_accents(&s.to_lowercase())
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Levenshtein distance over chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// 1 minus the edit distance over the longer length, in chars.
pub fn normalized_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / longest as f64
}

/// F1 of the normalized token sets, where a response token that is not an
/// exact match but reaches `fuzzy_threshold` similarity counts by that
/// similarity. Each token is matched at most once.
pub fn token_overlap(response: &str, expected: &str, fuzzy_threshold: f64) -> f64 {
    let response = normalize_text(response);
    let expected = normalize_text(expected);
    let response: Vec<&str> = response.split_whitespace().collect();
    let expected: Vec<&str> = expected.split_whitespace().collect();
    if response.is_empty() && expected.is_empty() {
        return 1.0;
    }
    if response.is_empty() || expected.is_empty() {
        return 0.0;
    }

    let mut used = vec![false; response.len()];
    let mut matched = 0.0;
    for word in &expected {
        let best = response
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .map(|(i, candidate)| (i, normalized_similarity(word, candidate)))
            .filter(|(_, similarity)| *similarity >= fuzzy_threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((i, similarity)) = best {
            used[i] = true;
            matched += similarity;
        }
    }

    let precision = matched / response.len() as f64;
    let recall = matched / expected.len() as f64;
    if precision + recall == 0.0 {
        0.0
    } else {
        (2.0 * precision * recall / (precision + recall)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Present in both.
    Same,
    /// Expected but not given.
    Missing,
    /// Given but not expected.
    Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffSegment {
    pub text: String,
    pub kind: DiffKind,
}

impl DiffSegment {
    fn new(text: &str, kind: DiffKind) -> Self {
        Self {
            text: text.to_string(),
            kind,
        }
    }
}

/// Word diff of a response against the expected answer, aligned on the
/// longest common subsequence of normalized words.
pub fn word_diff(response: &str, expected: &str) -> Vec<DiffSegment> {
    let given: Vec<&str> = response.split_whitespace().collect();
    let wanted: Vec<&str> = expected.split_whitespace().collect();
    let given_keys: Vec<String> = given.iter().map(|w| normalize_text(w)).collect();
    let wanted_keys: Vec<String> = wanted.iter().map(|w| normalize_text(w)).collect();

    // lcs[i][j]: common length of given[i..] and wanted[j..]
    let mut lcs = vec![vec![0usize; wanted.len() + 1]; given.len() + 1];
    for i in (0..given.len()).rev() {
        for j in (0..wanted.len()).rev() {
            lcs[i][j] = if given_keys[i] == wanted_keys[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut segments = Vec::with_capacity(given.len().max(wanted.len()));
    let (mut i, mut j) = (0, 0);
    while i < given.len() && j < wanted.len() {
        if given_keys[i] == wanted_keys[j] {
            segments.push(DiffSegment::new(wanted[j], DiffKind::Same));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            segments.push(DiffSegment::new(given[i], DiffKind::Extra));
            i += 1;
        } else {
            segments.push(DiffSegment::new(wanted[j], DiffKind::Missing));
            j += 1;
        }
    }
    segments.extend(given[i..].iter().map(|w| DiffSegment::new(w, DiffKind::Extra)));
    segments.extend(wanted[j..].iter().map(|w| DiffSegment::new(w, DiffKind::Missing)));
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("casa", ""), 4);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("niño", "nino"), 1);
    }

    #[test]
    fn test_similarity_counts_chars_not_bytes() {
        assert_eq!(normalized_similarity("", ""), 1.0);
        assert_eq!(normalized_similarity("año", "ano"), 1.0 - 1.0 / 3.0);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  ¡Manzanas   ROJAS!  "), "manzanas rojas");
        assert_eq!(normalize_text("El niño, comió."), "el nino comio");
    }

    #[test]
    fn test_token_overlap() {
        assert_eq!(token_overlap("manzanas rojas", "Manzanas rojas.", 0.8), 1.0);
        assert_eq!(token_overlap("manzanas", "manzanas rojas", 0.8), 2.0 / 3.0);
        assert_eq!(token_overlap("peras", "manzanas rojas", 0.8), 0.0);
        let near = token_overlap("manzanas rojsa", "manzanas rojas", 0.5);
        assert!(near > 0.5 && near < 1.0);
    }

    #[test]
    fn test_word_diff() {
        let diff = word_diff("el niño come peras", "el niño come manzanas rojas");
        let kinds: Vec<DiffKind> = diff.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiffKind::Same,
                DiffKind::Same,
                DiffKind::Same,
                DiffKind::Extra,
                DiffKind::Missing,
                DiffKind::Missing,
            ]
        );
        assert_eq!(diff[4].text, "manzanas");
    }
}
