//! Coarse category taggers.

use crate::analysis::lexicon;
use crate::types::WordCategory;

/// A source of category tags.
pub trait Tagger: Send + Sync {
    /// Tagger identifier.
    fn name(&self) -> &'static str;

    /// Category for a normalized word, or `None` to defer to the next tagger.
    fn tag(&self, word: &str) -> Option<WordCategory>;
}

/// Closed-class words and exception lists.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconTagger;

impl Tagger for LexiconTagger {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn tag(&self, word: &str) -> Option<WordCategory> {
        lexicon::lookup(word)
    }
}

/// Derivational suffix rules for open-class words.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuffixTagger;

const SUFFIX_RULES: &[(&str, WordCategory)] = &[
    ("mente", WordCategory::Adverb),
    ("ciones", WordCategory::Noun),
    ("siones", WordCategory::Noun),
    ("ción", WordCategory::Noun),
    ("sión", WordCategory::Noun),
    ("dades", WordCategory::Noun),
    ("dad", WordCategory::Noun),
    ("tad", WordCategory::Noun),
    ("eza", WordCategory::Noun),
    ("ismo", WordCategory::Noun),
    ("miento", WordCategory::Noun),
    ("aje", WordCategory::Noun),
    ("ando", WordCategory::Verb),
    ("iendo", WordCategory::Verb),
    ("oso", WordCategory::Adjective),
    ("osa", WordCategory::Adjective),
    ("ble", WordCategory::Adjective),
    ("ivo", WordCategory::Adjective),
    ("iva", WordCategory::Adjective),
    ("al", WordCategory::Adjective),
    ("ar", WordCategory::Verb),
    ("er", WordCategory::Verb),
    ("ir", WordCategory::Verb),
];

impl Tagger for SuffixTagger {
    fn name(&self) -> &'static str {
        "suffix"
    }

    fn tag(&self, word: &str) -> Option<WordCategory> {
        if word.chars().count() < 4 {
            return None;
        }
        for form in [word, word.strip_suffix('s').unwrap_or(word)] {
            if let Some((_, category)) = SUFFIX_RULES.iter().find(|(s, _)| form.ends_with(s)) {
                return Some(*category);
            }
        }
        None
    }
}

/// Ordered taggers; the first one with an opinion wins.
pub struct TaggerChain {
    taggers: Vec<Box<dyn Tagger>>,
}

impl TaggerChain {
    pub fn empty() -> Self {
        Self {
            taggers: Vec::new(),
        }
    }

    /// Append a tagger with lower priority than the existing ones.
    pub fn with(mut self, tagger: impl Tagger + 'static) -> Self {
        self.taggers.push(Box::new(tagger));
        self
    }

    /// Insert a tagger ahead of the existing ones.
    pub fn prepend(mut self, tagger: impl Tagger + 'static) -> Self {
        self.taggers.insert(0, Box::new(tagger));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.taggers.iter().map(|t| t.name()).collect()
    }

    pub fn tag(&self, word: &str) -> WordCategory {
        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return WordCategory::Unknown;
        }
        self.taggers
            .iter()
            .find_map(|t| t.tag(word))
            .unwrap_or(WordCategory::Unknown)
    }
}

impl Default for TaggerChain {
    fn default() -> Self {
        Self::empty().with(LexiconTagger).with(SuffixTagger)
    }
}

impl std::fmt::Debug for TaggerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaggerChain")
            .field("taggers", &self.names())
            .finish()
    }
}
