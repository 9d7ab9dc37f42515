//! Template language translation
//!
//! A [`Translator`] turns an element's raw `variable` text into an
//! [`ElementString`] for one card. [`MacroTranslator`] is the built-in macro
//! language backend.

mod context;
mod logic;
mod patterns;
mod resolver;
mod scan;

pub use context::{CardInfo, TranslationContext};

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fmt;

/// Upper bound on substitutions per stage and on full translation passes
pub const MAX_TRANSLATION_LOOPS: usize = 100;

/// Longest text one repeat, pad or counter pattern may produce
pub const MAX_PATTERN_OUTPUT: usize = 10_000;

const EMPTY_MARKER: &str = "#empty";
const NO_DRAW_MARKER: &str = "#nodraw";

/// Result of translating one element for one card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementString {
    pub text: String,
    /// False when the text asked for the element to be skipped
    pub draw: bool,
    /// Staged `$[field:value]` overrides, keyed by lower-cased field name
    pub overrides: BTreeMap<String, String>,
}

impl ElementString {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            draw: true,
            overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    UnresolvedName,
    MalformedArguments,
    DisallowedField,
    LoopGuard,
    DivisionByZero,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueKind::UnresolvedName => "unresolved name",
            IssueKind::MalformedArguments => "malformed arguments",
            IssueKind::DisallowedField => "disallowed field",
            IssueKind::LoopGuard => "loop guard",
            IssueKind::DivisionByZero => "division by zero",
        };
        f.write_str(name)
    }
}

/// A recoverable problem met while translating
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub element: String,
    pub deck_index: usize,
    pub message: String,
}

/// Template translation backend
pub trait Translator {
    /// Translate `raw` for the element and card in `ctx`
    fn resolve(&mut self, raw: &str, ctx: &TranslationContext<'_>) -> ElementString;

    /// Drain the issues recorded since the last call
    fn take_issues(&mut self) -> Vec<Issue>;
}

/// Built-in macro language translator
pub struct MacroTranslator {
    pub(crate) rng: StdRng,
    pub(crate) issues: Vec<Issue>,
    pub(crate) guard_reported: bool,
}

impl MacroTranslator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic `#random` results
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            issues: Vec::new(),
            guard_reported: false,
        }
    }

    pub(crate) fn issue(&mut self, kind: IssueKind, ctx: &TranslationContext<'_>, message: String) {
        log::warn!("{} (card {}): {kind}: {message}", ctx.element.name, ctx.card.deck_index);
        self.issues.push(Issue {
            kind,
            element: ctx.element.name.clone(),
            deck_index: ctx.card.deck_index,
            message,
        });
    }

    pub(crate) fn loop_guard(&mut self, ctx: &TranslationContext<'_>, stage: &str) {
        if self.guard_reported {
            return;
        }
        self.guard_reported = true;
        self.issue(
            IssueKind::LoopGuard,
            ctx,
            format!("{stage} substitution stopped after {MAX_TRANSLATION_LOOPS} rounds"),
        );
    }
}

impl Default for MacroTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for MacroTranslator {
    fn resolve(&mut self, raw: &str, ctx: &TranslationContext<'_>) -> ElementString {
        self.guard_reported = false;
        let mut text = raw.to_string();
        let mut overrides = BTreeMap::new();
        let mut settled = false;

        for _ in 0..MAX_TRANSLATION_LOOPS {
            let before = text.clone();
            text = self.expand_references(text, ctx);
            text = self.expand_counters(text, ctx);
            text = self.expand_field_reads(text, ctx, &overrides);
            text = self.expand_randoms(text, ctx);
            text = self.expand_math(text, ctx);
            text = self.expand_repeats(text, ctx);
            text = self.expand_padding(text, ctx);
            text = self.expand_logic(text, ctx);
            text = self.extract_overrides(text, ctx, &mut overrides);
            if text == before {
                settled = true;
                break;
            }
        }
        if !settled {
            self.loop_guard(ctx, "translation");
        }

        let text = strip_empty(&text);
        let draw = !text.contains(NO_DRAW_MARKER);
        ElementString {
            text,
            draw,
            overrides,
        }
    }

    fn take_issues(&mut self) -> Vec<Issue> {
        std::mem::take(&mut self.issues)
    }
}

pub(crate) fn strip_empty(text: &str) -> String {
    text.replace(EMPTY_MARKER, "")
}


#[cfg(test)]
mod tests {
    use super::fixture::Fixture;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_is_unchanged() {
        let fixture = Fixture::new();
        let resolved = fixture.resolve("Card #1: 50% [rare] & more");
        assert_eq!(resolved, ElementString::new("Card #1: 50% [rare] & more"));
    }

    #[test]
    fn test_nodraw_clears_draw_flag() {
        let fixture = Fixture::new();
        let resolved = fixture.resolve("x #nodraw");
        assert!(!resolved.draw);
        assert_eq!(resolved.text, "x #nodraw");
    }

    #[test]
    fn test_empty_marker_is_removed() {
        let fixture = Fixture::new().define("blank", "#empty");
        assert_eq!(fixture.resolve("a@[blank]b#empty").text, "ab");
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let fixture = Fixture::new().define("title", "@[name] (@[cost])");
        let mut translator = MacroTranslator::with_seed(1);
        let ctx = fixture.ctx(0);
        let first = translator.resolve("@[title]$[x:3]", &ctx);
        let second = translator.resolve("@[title]$[x:3]", &ctx);
        assert_eq!(first, second);
        assert_eq!(first.text, "Goblin (2)");
    }

    #[test]
    fn test_issues_are_drained() {
        let fixture = Fixture::new();
        let mut translator = MacroTranslator::with_seed(1);
        translator.resolve("@[missing]", &fixture.ctx(0));
        let issues = translator.take_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::UnresolvedName);
        assert_eq!(issues[0].element, "title");
        assert!(translator.take_issues().is_empty());
    }
}
