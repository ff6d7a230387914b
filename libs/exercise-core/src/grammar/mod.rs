//! Rule-based grammar checking.
//!
//! Every rule is a stateless predicate over a window of tokens inside one
//! sentence. Rules cannot see each other's output, and a rule that fails on a
//! window is skipped for that window only.

pub mod rules;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::error::RuleError;
use crate::types::{
    AnalyzedText, GrammarIssue, IssueCategory, Sentence, Severity, Span, Token,
};

/// What a rule gets to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowScope {
    /// Sliding windows of up to `n` tokens, one per token position.
    /// Windows at the end of a sentence are shorter.
    Tokens(usize),
    /// The whole sentence, once.
    Sentence,
}

/// A slice of one sentence handed to a rule.
#[derive(Debug, Clone, Copy)]
pub struct TokenWindow<'a> {
    pub source: &'a str,
    pub sentence: &'a Sentence,
    pub sentence_index: usize,
    /// Index of `tokens[0]` within the sentence.
    pub offset: usize,
    pub tokens: &'a [Token],
}

impl<'a> TokenWindow<'a> {
    pub fn get(&self, i: usize) -> Option<&'a Token> {
        self.tokens.get(i)
    }

    /// Build an issue located in this window's sentence.
    pub fn issue(
        &self,
        rule_id: &str,
        category: IssueCategory,
        severity: Severity,
        span: Span,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) -> GrammarIssue {
        GrammarIssue {
            rule_id: rule_id.to_string(),
            category,
            severity,
            span,
            sentence_index: self.sentence_index,
            fragment: self.source[span.start..span.end].to_string(),
            message: message.into(),
            suggestion,
        }
    }
}

/// A single grammar rule.
pub trait GrammarRule: Send + Sync {
    /// Stable rule identifier.
    fn id(&self) -> &'static str;

    fn scope(&self) -> WindowScope {
        WindowScope::Tokens(1)
    }

    fn inspect(&self, window: &TokenWindow<'_>) -> Result<Option<GrammarIssue>, RuleError>;
}

/// Ordered rule registry.
pub struct GrammarChecker {
    rules: Vec<Box<dyn GrammarRule>>,
}

impl Default for GrammarChecker {
    fn default() -> Self {
        Self {
            rules: rules::default_rules(),
        }
    }
}

impl std::fmt::Debug for GrammarChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarChecker")
            .field("rules", &self.rule_ids())
            .finish()
    }
}

impl GrammarChecker {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register a rule after the existing ones.
    pub fn with_rule(mut self, rule: impl GrammarRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// All issues in document order; ties keep rule registration order.
    pub fn check(&self, text: &AnalyzedText) -> Vec<GrammarIssue> {
        let mut found: Vec<(usize, GrammarIssue)> = Vec::new();

        for (sentence_index, sentence) in text.sentences().iter().enumerate() {
            for (rule_index, rule) in self.rules.iter().enumerate() {
                for window in windows(text.source(), sentence, sentence_index, rule.scope()) {
                    if let Some(issue) = run_rule(rule.as_ref(), &window) {
                        found.push((rule_index, issue));
                    }
                }
            }
        }

        found.sort_by_key(|(rule_index, issue)| (issue.span.start, *rule_index));
        debug!(issues = found.len(), "grammar check finished");
        found.into_iter().map(|(_, issue)| issue).collect()
    }
}

fn windows<'a>(
    source: &'a str,
    sentence: &'a Sentence,
    sentence_index: usize,
    scope: WindowScope,
) -> Vec<TokenWindow<'a>> {
    let tokens = &sentence.tokens;
    let window = |offset: usize, len: usize| TokenWindow {
        source,
        sentence,
        sentence_index,
        offset,
        tokens: &tokens[offset..(offset + len).min(tokens.len())],
    };
    match scope {
        WindowScope::Sentence => vec![window(0, tokens.len())],
        WindowScope::Tokens(n) => (0..tokens.len()).map(|i| window(i, n.max(1))).collect(),
    }
}

fn run_rule(rule: &dyn GrammarRule, window: &TokenWindow<'_>) -> Option<GrammarIssue> {
    match catch_unwind(AssertUnwindSafe(|| rule.inspect(window))) {
        Ok(Ok(issue)) => issue,
        Ok(Err(e)) => {
            warn!(rule = rule.id(), sentence = window.sentence_index, "rule failed: {}", e);
            None
        }
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            warn!(rule = rule.id(), sentence = window.sentence_index, "rule panicked: {}", panic_msg);
            None
        }
    }
}

/// Check with the default rule set.
pub fn check(text: &AnalyzedText) -> Vec<GrammarIssue> {
    GrammarChecker::default().check(text)
}

/// Apply the suggestion of every issue that has one, skipping issues that
/// overlap an edit already made. Edits go from the end of the text backwards
/// so earlier spans stay valid.
pub fn apply_suggestions(source: &str, issues: &[GrammarIssue]) -> String {
    let mut edits: Vec<&GrammarIssue> = issues.iter().filter(|i| i.suggestion.is_some()).collect();
    edits.sort_by(|a, b| b.span.start.cmp(&a.span.start).then(b.span.end.cmp(&a.span.end)));

    let mut corrected = source.to_string();
    let mut boundary = source.len();
    for issue in edits {
        if issue.span.end > boundary || issue.span.end > source.len() {
            continue;
        }
        if let Some(replacement) = &issue.suggestion {
            corrected.replace_range(issue.span.start..issue.span.end, replacement);
            boundary = issue.span.start;
        }
    }
    corrected
}

/// Issue counts by category and severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub total: usize,
    pub by_category: BTreeMap<IssueCategory, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
}

impl IssueSummary {
    pub fn from_issues(issues: &[GrammarIssue]) -> Self {
        let mut summary = Self {
            total: issues.len(),
            ..Default::default()
        };
        for issue in issues {
            *summary.by_category.entry(issue.category).or_default() += 1;
            *summary.by_severity.entry(issue.severity).or_default() += 1;
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}
