//! Offset-preserving tokenizer and sentence splitter.

use std::collections::BTreeSet;

use crate::types::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawKind {
    Word,
    Number,
    Punct,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawToken {
    pub text: String,
    pub span: Span,
    pub kind: RawKind,
}

impl RawToken {
    fn is_terminal(&self) -> bool {
        self.kind == RawKind::Punct && self.text.chars().all(|c| matches!(c, '.' | '!' | '?' | '…'))
    }

    /// Punctuation that may trail a sentence's terminal mark.
    fn is_closing(&self) -> bool {
        self.kind == RawKind::Punct
            && (self.is_terminal() || matches!(self.text.as_str(), ")" | "»" | "\"" | "”" | "’" | "'"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawSentence {
    pub tokens: Vec<RawToken>,
    pub paragraph: usize,
}

fn joins_word(c: char) -> bool {
    matches!(c, '\'' | '’' | '-')
}

/// Split `text` into tokens. Spans are byte offsets into `text`.
pub(crate) fn tokenize(text: &str) -> Vec<RawToken> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let end_of = |i: usize| chars.get(i).map_or(text.len(), |&(b, _)| b);
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (start, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let kind = if c.is_ascii_digit() {
            RawKind::Number
        } else if c.is_alphanumeric() {
            RawKind::Word
        } else {
            RawKind::Punct
        };

        let mut j = i + 1;
        match kind {
            RawKind::Word => {
                while j < chars.len() {
                    let c = chars[j].1;
                    let next_alpha = chars.get(j + 1).is_some_and(|&(_, n)| n.is_alphanumeric());
                    if c.is_alphanumeric() || (joins_word(c) && next_alpha) {
                        j += 1;
                    } else {
                        break;
                    }
                }
            }
            RawKind::Number => {
                while j < chars.len() {
                    let c = chars[j].1;
                    let next_digit = chars.get(j + 1).is_some_and(|&(_, n)| n.is_ascii_digit());
                    if c.is_ascii_digit() || (matches!(c, '.' | ',') && next_digit) {
                        j += 1;
                    } else {
                        break;
                    }
                }
            }
            RawKind::Punct => {
                // Runs of periods stay together so an ellipsis is one token.
                if c == '.' {
                    while j < chars.len() && chars[j].1 == '.' {
                        j += 1;
                    }
                }
            }
        }

        let end = end_of(j);
        tokens.push(RawToken {
            text: text[start..end].to_string(),
            span: Span::new(start, end),
            kind,
        });
        i = j;
    }

    tokens
}

/// Whether the whitespace between two tokens holds a blank line.
fn has_blank_line(gap: &str) -> bool {
    gap.matches('\n').count() >= 2
}

/// Group tokens into sentences.
///
/// A sentence ends at terminal punctuation (unless it follows a known
/// abbreviation) or at a blank line. Closing marks directly after the
/// terminal stay with the sentence they close. Sentences without a single
/// word or number are dropped.
pub(crate) fn split_sentences(
    text: &str,
    tokens: Vec<RawToken>,
    abbreviations: &BTreeSet<String>,
) -> Vec<RawSentence> {
    let mut sentences = Vec::new();
    let mut current: Vec<RawToken> = Vec::new();
    let mut paragraph = 0;
    let mut paragraph_used = false;
    let mut closed = false;
    let mut prev_end: Option<usize> = None;

    let mut flush = |current: &mut Vec<RawToken>, paragraph: usize, used: &mut bool| {
        if current.iter().any(|t| t.kind != RawKind::Punct) {
            sentences.push(RawSentence {
                tokens: std::mem::take(current),
                paragraph,
            });
            *used = true;
        } else {
            current.clear();
        }
    };

    for token in tokens {
        if let Some(end) = prev_end {
            if has_blank_line(&text[end..token.span.start]) {
                flush(&mut current, paragraph, &mut paragraph_used);
                if paragraph_used {
                    paragraph += 1;
                    paragraph_used = false;
                }
                closed = false;
            }
        }
        prev_end = Some(token.span.end);

        if closed && !token.is_closing() {
            flush(&mut current, paragraph, &mut paragraph_used);
            closed = false;
        }

        let ends_sentence = token.is_terminal() && !follows_abbreviation(&current, &token, abbreviations);
        current.push(token);
        if ends_sentence {
            closed = true;
        }
    }
    flush(&mut current, paragraph, &mut paragraph_used);

    sentences
}

fn follows_abbreviation(current: &[RawToken], token: &RawToken, abbreviations: &BTreeSet<String>) -> bool {
    if token.text != "." {
        return false;
    }
    match current.last() {
        Some(prev) if prev.kind == RawKind::Word && prev.span.end == token.span.start => {
            abbreviations.contains(&prev.text.to_lowercase())
        }
        _ => false,
    }
}
