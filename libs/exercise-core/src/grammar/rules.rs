//! Default grammar rules.

use crate::analysis::lexicon::{self, Paradigm};
use crate::error::RuleError;
use crate::grammar::{GrammarRule, TokenWindow, WindowScope};
use crate::types::{GrammarIssue, IssueCategory, Severity, Span, Token, WordCategory};

/// Default rules in registration order.
pub fn default_rules() -> Vec<Box<dyn GrammarRule>> {
    vec![
        Box::new(RepeatedWord),
        Box::new(DeterminerAgreement),
        Box::new(CommonMisspelling),
        Box::new(MissingAccent),
        Box::new(CliticOrder),
        Box::new(MultipleSpaces),
        Box::new(SpaceBeforePunctuation),
        Box::new(DuplicatePunctuation),
        Box::new(OpeningMark),
        Box::new(MissingTerminal),
        Box::new(Capitalization),
    ]
}

/// Copy the capitalisation of `model`'s first letter onto `word`.
fn match_case(model: &str, word: &str) -> String {
    if model.chars().next().is_some_and(char::is_uppercase) {
        capitalize(word)
    } else {
        word.to_string()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_alphabetic_word(token: &Token) -> bool {
    token.is_word() && token.text.chars().all(char::is_alphabetic)
}

/// Source text between two neighbouring tokens.
fn gap(left: &Token, right: &Token) -> Span {
    Span::new(left.span.end, right.span.start.max(left.span.end))
}

/// The same word twice in a row: `el el perro`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RepeatedWord;

impl GrammarRule for RepeatedWord {
    fn id(&self) -> &'static str {
        "repeated-word"
    }

    fn scope(&self) -> WindowScope {
        WindowScope::Tokens(2)
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError> {
        let (Some(first), Some(second)) = (window.get(0), window.get(1)) else {
            return Ok(None);
        };
        if !is_alphabetic_word(first) || first.normalized != second.normalized {
            return Ok(None);
        }
        Ok(Some(window.issue(
            self.id(),
            IssueCategory::Other,
            Severity::Important,
            first.span.cover(second.span),
            format!("la palabra «{}» está repetida", first.text),
            Some(first.text.clone()),
        )))
    }
}

/// Determiner and noun must agree in gender and number.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterminerAgreement;

impl GrammarRule for DeterminerAgreement {
    fn id(&self) -> &'static str {
        "determiner-agreement"
    }

    fn scope(&self) -> WindowScope {
        WindowScope::Tokens(2)
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError> {
        let (Some(det_token), Some(noun)) = (window.get(0), window.get(1)) else {
            return Ok(None);
        };
        if noun.category != WordCategory::Noun {
            return Ok(None);
        }
        let Some(det) = lexicon::determiner(&det_token.normalized) else {
            return Ok(None);
        };

        let (gender, number) = lexicon::noun_features(&noun.normalized);
        let number = number.unwrap_or(det.number);
        let mut gender = gender.unwrap_or(det.gender);
        // el agua, un águila
        if number == lexicon::Number::Singular
            && matches!(det.paradigm, Paradigm::Definite | Paradigm::Indefinite)
            && lexicon::takes_masculine_article(&noun.normalized)
        {
            gender = lexicon::Gender::Masculine;
        }

        if gender == det.gender && number == det.number {
            return Ok(None);
        }

        let expected = lexicon::determiner_for(det.paradigm, gender, number);
        Ok(Some(window.issue(
            self.id(),
            IssueCategory::Agreement,
            Severity::Critical,
            det_token.span,
            format!("«{}» no concuerda con «{}»", det_token.text, noun.text),
            Some(match_case(&det_token.text, expected)),
        )))
    }
}

/// Words from the misspelling list.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonMisspelling;

impl GrammarRule for CommonMisspelling {
    fn id(&self) -> &'static str {
        "common-misspelling"
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError> {
        let Some(token) = window.get(0) else {
            return Ok(None);
        };
        if !token.is_word() {
            return Ok(None);
        }
        Ok(lexicon::misspelling(&token.normalized).map(|right| {
            window.issue(
                self.id(),
                IssueCategory::Spelling,
                Severity::Important,
                token.span,
                format!("«{}» se escribe «{}»", token.text, right),
                Some(match_case(&token.text, right)),
            )
        }))
    }
}

/// Diacritic accents the context makes clear: `más`, `tú` before a verb or
/// at the end of a clause, `él` before a name, `sí` before a comma.
#[derive(Debug, Default, Clone, Copy)]
pub struct MissingAccent;

impl GrammarRule for MissingAccent {
    fn id(&self) -> &'static str {
        "missing-accent"
    }

    fn scope(&self) -> WindowScope {
        WindowScope::Tokens(2)
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError> {
        let Some(token) = window.get(0).filter(|t| t.is_word()) else {
            return Ok(None);
        };
        let Some(right) = lexicon::accented(&token.normalized) else {
            return Ok(None);
        };
        let next = window.get(1);
        let needs_accent = match token.normalized.as_str() {
            "mas" => true,
            // `tu casa` is the possessive
            "tu" => next.map_or(true, |n| !n.is_word() || n.category == WordCategory::Verb),
            // sentence-initial `El` is the article
            "el" => {
                token.text == "el"
                    && next.is_some_and(|n| n.is_word() && n.text.chars().next().is_some_and(char::is_uppercase))
            }
            "si" => next.is_some_and(|n| n.text == ","),
            _ => false,
        };
        if !needs_accent {
            return Ok(None);
        }
        Ok(Some(window.issue(
            self.id(),
            IssueCategory::Spelling,
            Severity::Important,
            token.span,
            format!("«{}» lleva tilde: «{}»", token.text, right),
            Some(match_case(&token.text, right)),
        )))
    }
}

/// `se` goes before the other clitic: `se me cayó`, not `me se cayó`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliticOrder;

impl GrammarRule for CliticOrder {
    fn id(&self) -> &'static str {
        "clitic-order"
    }

    fn scope(&self) -> WindowScope {
        WindowScope::Tokens(2)
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError> {
        let (Some(first), Some(second)) = (window.get(0), window.get(1)) else {
            return Ok(None);
        };
        if !matches!(first.normalized.as_str(), "me" | "te" | "nos" | "os") || second.normalized != "se" {
            return Ok(None);
        }
        Ok(Some(window.issue(
            self.id(),
            IssueCategory::WordOrder,
            Severity::Important,
            first.span.cover(second.span),
            format!("el orden correcto es «se {}»", first.normalized),
            Some(format!("{} {}", match_case(&first.text, "se"), first.normalized)),
        )))
    }
}

/// Two or more spaces between words.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultipleSpaces;

impl GrammarRule for MultipleSpaces {
    fn id(&self) -> &'static str {
        "multiple-spaces"
    }

    fn scope(&self) -> WindowScope {
        WindowScope::Tokens(2)
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError> {
        let (Some(left), Some(right)) = (window.get(0), window.get(1)) else {
            return Ok(None);
        };
        let span = gap(left, right);
        let between = &window.source[span.start..span.end];
        // line breaks inside a paragraph are layout
        if between.chars().count() < 2 || between.contains('\n') {
            return Ok(None);
        }
        Ok(Some(window.issue(
            self.id(),
            IssueCategory::Other,
            Severity::Minor,
            span,
            "hay varios espacios seguidos",
            Some(" ".to_string()),
        )))
    }
}

/// No space before `.`, `,`, `;`, `:`, `!` or `?`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpaceBeforePunctuation;

impl GrammarRule for SpaceBeforePunctuation {
    fn id(&self) -> &'static str {
        "space-before-punctuation"
    }

    fn scope(&self) -> WindowScope {
        WindowScope::Tokens(2)
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError> {
        let (Some(left), Some(mark)) = (window.get(0), window.get(1)) else {
            return Ok(None);
        };
        let closing = !mark.is_word() && mark.text.starts_with(['.', ',', ';', ':', '!', '?']);
        let span = gap(left, mark);
        if !closing || span.is_empty() || window.source[span.start..span.end].contains('\n') {
            return Ok(None);
        }
        Ok(Some(window.issue(
            self.id(),
            IssueCategory::Punctuation,
            Severity::Important,
            Span::new(span.start, mark.span.end),
            format!("sobra el espacio antes de «{}»", mark.text),
            Some(mark.text.clone()),
        )))
    }
}

/// `,,` or `!!`, and period runs that are not an ellipsis.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuplicatePunctuation;

impl GrammarRule for DuplicatePunctuation {
    fn id(&self) -> &'static str {
        "duplicate-punctuation"
    }

    fn scope(&self) -> WindowScope {
        WindowScope::Tokens(2)
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError> {
        let Some(first) = window.get(0) else {
            return Ok(None);
        };
        if first.is_word() {
            return Ok(None);
        }

        let dots = first.text.chars().filter(|&c| c == '.').count();
        if dots == first.text.chars().count() && (dots == 2 || dots > 3) {
            let fix = if dots == 2 { "." } else { "..." };
            return Ok(Some(window.issue(
                self.id(),
                IssueCategory::Punctuation,
                Severity::Minor,
                first.span,
                format!("«{}» no es un signo válido", first.text),
                Some(fix.to_string()),
            )));
        }

        match window.get(1) {
            Some(second)
                if !second.is_word()
                    && second.text == first.text
                    && second.span.start == first.span.end
                    && matches!(first.text.as_str(), "," | ";" | ":" | "!" | "?" | "¡" | "¿") =>
            {
                Ok(Some(window.issue(
                    self.id(),
                    IssueCategory::Punctuation,
                    Severity::Minor,
                    first.span.cover(second.span),
                    format!("signo «{}» duplicado", first.text),
                    Some(first.text.clone()),
                )))
            }
            _ => Ok(None),
        }
    }
}

/// Questions and exclamations need their opening mark.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpeningMark;

impl GrammarRule for OpeningMark {
    fn id(&self) -> &'static str {
        "opening-mark"
    }

    fn scope(&self) -> WindowScope {
        WindowScope::Sentence
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError> {
        let has = |mark: &str| window.tokens.iter().any(|t| t.text.contains(mark));
        let missing = if has("?") && !has("¿") {
            "¿"
        } else if has("!") && !has("¡") {
            "¡"
        } else {
            return Ok(None);
        };

        let Some(first) = window.tokens.iter().find(|t| t.is_word()) else {
            return Ok(None);
        };
        Ok(Some(window.issue(
            self.id(),
            IssueCategory::Punctuation,
            Severity::Minor,
            first.span,
            format!("falta el signo de apertura «{missing}»"),
            Some(format!("{missing}{}", first.text)),
        )))
    }
}

/// Sentence does not end in `.`, `!`, `?` or `…`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MissingTerminal;

impl GrammarRule for MissingTerminal {
    fn id(&self) -> &'static str {
        "missing-terminal"
    }

    fn scope(&self) -> WindowScope {
        WindowScope::Sentence
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError> {
        let last = window
            .tokens
            .iter()
            .rev()
            .find(|t| t.is_word() || !matches!(t.text.as_str(), ")" | "»" | "\"" | "”" | "’" | "'"));
        let Some(last) = last else {
            return Ok(None);
        };
        if last.is_terminal() {
            return Ok(None);
        }
        Ok(Some(window.issue(
            self.id(),
            IssueCategory::Punctuation,
            Severity::Minor,
            last.span,
            "falta el punto final",
            Some(format!("{}.", last.text)),
        )))
    }
}

/// Sentences start with a capital letter.
#[derive(Debug, Default, Clone, Copy)]
pub struct Capitalization;

impl GrammarRule for Capitalization {
    fn id(&self) -> &'static str {
        "capitalization"
    }

    fn scope(&self) -> WindowScope {
        WindowScope::Sentence
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError> {
        let Some(first) = window.tokens.iter().find(|t| t.is_word()) else {
            return Ok(None);
        };
        if !first.text.chars().next().is_some_and(char::is_lowercase) {
            return Ok(None);
        }
        Ok(Some(window.issue(
            self.id(),
            IssueCategory::Other,
            Severity::Minor,
            first.span,
            "la oración debe empezar con mayúscula",
            Some(capitalize(&first.text)),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::grammar::GrammarChecker;

    fn issues_of(rule: impl GrammarRule + 'static, text: &str) -> Vec<GrammarIssue> {
        GrammarChecker::empty().with_rule(rule).check(&analyze(text))
    }

    #[test]
    fn repeated_word_ignores_case() {
        let issues = issues_of(RepeatedWord, "El el perro ladra.");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].fragment, "El el");
        assert_eq!(issues[0].suggestion.as_deref(), Some("El"));
    }

    #[test]
    fn agreement_checks_number_and_gender() {
        let issues = issues_of(DeterminerAgreement, "Los niño come. La problema es grande.");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].suggestion.as_deref(), Some("El"));
        assert_eq!(issues[1].suggestion.as_deref(), Some("El"));
        assert_eq!(issues[1].category, IssueCategory::Agreement);
    }

    #[test]
    fn agreement_accepts_exceptions() {
        assert!(issues_of(DeterminerAgreement, "El agua está fría. La mano duele. Las crisis pasan.").is_empty());
        assert_eq!(issues_of(DeterminerAgreement, "La agua está fría.").len(), 1);
    }

    #[test]
    fn misspellings_keep_capitalisation() {
        let issues = issues_of(CommonMisspelling, "Haiga paz.");
        assert_eq!(issues[0].suggestion.as_deref(), Some("Haya"));
    }

    #[test]
    fn clitic_order() {
        let issues = issues_of(CliticOrder, "Me se cayó el vaso.");
        assert_eq!(issues[0].suggestion.as_deref(), Some("Se me"));
    }

    #[test]
    fn ellipsis_is_not_duplicate_punctuation() {
        assert!(issues_of(DuplicatePunctuation, "Bueno... vale.").is_empty());
        assert_eq!(issues_of(DuplicatePunctuation, "Hola.. vale,, adiós.").len(), 2);
    }

    #[test]
    fn diacritic_accents_follow_context() {
        let issues = issues_of(MissingAccent, "Quiero mas pan.");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].fragment, "mas");
        assert_eq!(issues[0].suggestion.as_deref(), Some("más"));

        assert_eq!(issues_of(MissingAccent, "¿Vienes tu?")[0].suggestion.as_deref(), Some("tú"));
        assert_eq!(issues_of(MissingAccent, "Tu eres mi amigo.")[0].suggestion.as_deref(), Some("Tú"));
        assert!(issues_of(MissingAccent, "Tu casa es grande.").is_empty());

        assert_eq!(issues_of(MissingAccent, "Se lo dije a el Pedro.").len(), 1);
        assert!(issues_of(MissingAccent, "El niño come.").is_empty());

        assert_eq!(issues_of(MissingAccent, "Dijo que si, claro.")[0].suggestion.as_deref(), Some("sí"));
        assert!(issues_of(MissingAccent, "Si llueve, me quedo.").is_empty());
    }

    #[test]
    fn spacing_between_tokens() {
        let issues = issues_of(MultipleSpaces, "Quiero  ir al cine.");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].span, Span::new(6, 8));
        assert_eq!(issues[0].suggestion.as_deref(), Some(" "));
        assert!(issues_of(MultipleSpaces, "Quiero ir\nal cine.").is_empty());

        let issues = issues_of(SpaceBeforePunctuation, "Hola , mundo .");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].fragment, " ,");
        assert_eq!(issues[0].suggestion.as_deref(), Some(","));
        assert_eq!(issues[0].category, IssueCategory::Punctuation);
        assert!(issues_of(SpaceBeforePunctuation, "Hola, mundo.").is_empty());
    }

    #[test]
    fn opening_marks_are_required() {
        let issues = issues_of(OpeningMark, "Qué hora es?");
        assert_eq!(issues[0].suggestion.as_deref(), Some("¿Qué"));
        assert!(issues_of(OpeningMark, "¿Qué hora es?").is_empty());
    }

    #[test]
    fn missing_terminal_and_capital() {
        assert_eq!(issues_of(MissingTerminal, "el perro ladra").len(), 1);
        assert!(issues_of(MissingTerminal, "Dijo «hola.»").is_empty());
        assert_eq!(issues_of(Capitalization, "el perro ladra.").len(), 1);
        assert!(issues_of(Capitalization, "¿Dónde estás?").is_empty());
    }
}
