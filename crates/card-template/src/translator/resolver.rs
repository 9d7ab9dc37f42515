//! `@[name]`, `%[value,start,len]` and `![variable]` references

use super::scan::latest_bracket;
use super::{strip_empty, IssueKind, MacroTranslator, TranslationContext, MAX_TRANSLATION_LOOPS};
use card_text::parse_integer;

const REFERENCE_OPENERS: &[&str] = &["@[", "%[", "!["];

/// Substitutions left for one reference stage, shared with nested defines
pub(crate) struct Budget {
    remaining: usize,
}

impl Budget {
    pub fn new() -> Self {
        Self {
            remaining: MAX_TRANSLATION_LOOPS,
        }
    }

    fn take(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

impl MacroTranslator {
    pub(crate) fn expand_references(&mut self, text: String, ctx: &TranslationContext<'_>) -> String {
        let mut budget = Budget::new();
        self.expand_with_budget(text, ctx, &mut budget)
    }

    fn expand_with_budget(
        &mut self,
        mut text: String,
        ctx: &TranslationContext<'_>,
        budget: &mut Budget,
    ) -> String {
        while let Some((family, span)) = latest_bracket(&text, REFERENCE_OPENERS) {
            if !budget.take() {
                self.loop_guard(ctx, "reference");
                break;
            }
            let body = span.body(&text).to_string();
            let replacement = match family {
                0 => self.resolve_name(&body, ctx, budget),
                1 => self.substring(&body, ctx),
                _ => self.card_variable(&body, ctx),
            };
            text.replace_range(span.start..span.end, &replacement);
        }
        text
    }

    /// Defines first (with `{n}` parameters), then row columns
    fn resolve_name(&mut self, body: &str, ctx: &TranslationContext<'_>, budget: &mut Budget) -> String {
        let mut parts = body.split(',');
        let name = parts.next().unwrap_or_default().trim().to_lowercase();
        let params: Vec<&str> = parts.collect();

        if let Some(value) = ctx.define(&name) {
            let expanded = self.expand_with_budget(value.to_string(), ctx, budget);
            let mut text = expanded;
            for (i, param) in params.iter().enumerate() {
                text = text.replace(&format!("{{{}}}", i + 1), param);
            }
            return strip_empty(&text);
        }
        if let Some(value) = ctx.column(&name) {
            return value.to_string();
        }

        self.issue(
            IssueKind::UnresolvedName,
            ctx,
            format!("no define or column named '{name}'"),
        );
        format!("[BAD NAME: {name}]")
    }

    /// `value,start,len` by characters; the value may contain commas
    fn substring(&mut self, body: &str, ctx: &TranslationContext<'_>) -> String {
        let mut parts = body.rsplitn(3, ',');
        let (Some(len), Some(start), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return self.invalid_substring(body, ctx, "expected value,start,length");
        };
        let (Ok(start), Ok(len)) = (parse_integer(start.trim()), parse_integer(len.trim())) else {
            return self.invalid_substring(body, ctx, "start and length must be integers");
        };

        let count = value.chars().count() as i64;
        if start < 0 || len < 0 || start > count {
            return self.invalid_substring(body, ctx, "range outside the value");
        }
        let len = len.min(count - start);
        value
            .chars()
            .skip(start as usize)
            .take(len as usize)
            .collect()
    }

    fn invalid_substring(&mut self, body: &str, ctx: &TranslationContext<'_>, reason: &str) -> String {
        self.issue(
            IssueKind::MalformedArguments,
            ctx,
            format!("substring {body:?}: {reason}"),
        );
        format!("[INVALID SUBSTRING: {body}]")
    }

    fn card_variable(&mut self, body: &str, ctx: &TranslationContext<'_>) -> String {
        match ctx.card_variable(body) {
            Some(value) => value,
            None => {
                let name = body.trim().to_lowercase();
                self.issue(
                    IssueKind::UnresolvedName,
                    ctx,
                    format!("unknown card variable '{name}'"),
                );
                format!("[BAD NAME: {name}]")
            }
        }
    }
}
