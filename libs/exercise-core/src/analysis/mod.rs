//! Text analysis: tokenization, sentence splitting, tagging and features.

pub mod features;
pub mod lexicon;
pub mod tagger;
mod tokenizer;

use std::collections::BTreeSet;

use crate::config::{default_abbreviations, EngineConfig};
use crate::types::{AnalyzedText, Sentence, Span, Token, WordCategory};

pub use features::count_syllables;
pub use tagger::{LexiconTagger, SuffixTagger, Tagger, TaggerChain};

use tokenizer::RawKind;

/// Stateless text analyzer.
#[derive(Debug)]
pub struct Analyzer {
    abbreviations: BTreeSet<String>,
    tagger: TaggerChain,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            abbreviations: default_abbreviations(),
            tagger: TaggerChain::default(),
        }
    }
}

impl Analyzer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            abbreviations: config.abbreviations.clone(),
            tagger: TaggerChain::default(),
        }
    }

    pub fn with_tagger(mut self, tagger: TaggerChain) -> Self {
        self.tagger = tagger;
        self
    }

    /// Tokenize, split and tag `text`. Empty or punctuation-only input
    /// yields a text with no sentences.
    pub fn analyze(&self, text: &str) -> AnalyzedText {
        let raw = tokenizer::split_sentences(text, tokenizer::tokenize(text), &self.abbreviations);

        let sentences = raw
            .into_iter()
            .map(|sentence| {
                let tokens: Vec<Token> = sentence
                    .tokens
                    .into_iter()
                    .map(|t| {
                        let normalized = t.text.to_lowercase();
                        let category = match t.kind {
                            RawKind::Punct => WordCategory::Punctuation,
                            RawKind::Number => WordCategory::Unknown,
                            RawKind::Word => self.tagger.tag(&normalized),
                        };
                        Token {
                            text: t.text,
                            normalized,
                            category,
                            span: t.span,
                        }
                    })
                    .collect();
                let span = match (tokens.first(), tokens.last()) {
                    (Some(first), Some(last)) => first.span.cover(last.span),
                    _ => Span::default(),
                };
                Sentence {
                    tokens,
                    span,
                    paragraph: sentence.paragraph,
                }
            })
            .collect();

        AnalyzedText::new(text.to_string(), sentences)
    }
}

/// Analyze with the default abbreviations and taggers.
pub fn analyze(text: &str) -> AnalyzedText {
    Analyzer::default().analyze(text)
}
