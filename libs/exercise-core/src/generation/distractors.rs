use std::collections::HashSet;

use crate::error::GenerationError;
use crate::matching::normalize_text;

/// Take `count` candidates in order, skipping normalized duplicates and
/// anything equal to one of `answers`.
pub(crate) fn pick(
    candidates: impl IntoIterator<Item = String>,
    answers: &[&str],
    count: usize,
) -> Result<Vec<String>, GenerationError> {
    let mut seen: HashSet<String> = answers.iter().map(|a| normalize_text(a)).collect();
    let mut picked = Vec::with_capacity(count);
    let mut available = 0;

    for candidate in candidates {
        let key = normalize_text(&candidate);
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        available += 1;
        if picked.len() < count {
            picked.push(candidate);
        }
    }

    if picked.len() < count {
        return Err(GenerationError::InsufficientDistractors {
            needed: count,
            available,
        });
    }
    Ok(picked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn skips_duplicates_and_the_answer() {
        let picked = pick(strings(&["Niño", "niño", "manzanas", "perro", "gato"]), &["Manzanas"], 3).unwrap();
        assert_eq!(picked, strings(&["Niño", "perro", "gato"]));
    }

    #[test]
    fn reports_shortfall() {
        let err = pick(strings(&["uno", "UNO", "dos"]), &["dos"], 3).unwrap_err();
        assert_eq!(
            err,
            GenerationError::InsufficientDistractors {
                needed: 3,
                available: 1
            }
        );
    }
}
