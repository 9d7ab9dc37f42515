//! Counter, field, random, math, repeat, pad and override patterns

use super::scan::{format_aware_end, hash_end, latest_bracket, latest_hash, Span};
use super::{
    IssueKind, MacroTranslator, TranslationContext, MAX_PATTERN_OUTPUT, MAX_TRANSLATION_LOOPS,
};
use crate::fields::{field_kind, is_disallowed, read_field};
use card_text::{format_number, format_plain, parse_decimal, parse_integer, zero_pad};
use rand::Rng;
use std::collections::BTreeMap;

fn parse_counter(body: &str) -> Option<(i64, i64, usize)> {
    let parts: Vec<&str> = body.split(';').map(str::trim).collect();
    let [start, step, pad] = parts.as_slice() else {
        return None;
    };
    let pad = usize::try_from(parse_integer(pad).ok()?).ok()?;
    Some((parse_integer(start).ok()?, parse_integer(step).ok()?, pad))
}

/// `start + index * step`, or `None` on overflow
fn counter_value(start: i64, step: i64, index: usize) -> Option<i64> {
    i64::try_from(index)
        .ok()?
        .checked_mul(step)?
        .checked_add(start)
}

fn parse_range(body: &str) -> Option<(i64, i64)> {
    let (min, max) = body.split_once(';')?;
    Some((parse_integer(min.trim()).ok()?, parse_integer(max.trim()).ok()?))
}

impl MacroTranslator {
    /// Replace matches one at a time until none remain or the guard trips
    fn apply_stage<F>(
        &mut self,
        mut text: String,
        ctx: &TranslationContext<'_>,
        stage: &str,
        mut step: F,
    ) -> String
    where
        F: FnMut(&mut Self, &str) -> Option<(Span, String)>,
    {
        let mut rounds = 0;
        while let Some((span, replacement)) = step(self, &text) {
            if rounds == MAX_TRANSLATION_LOOPS {
                self.loop_guard(ctx, stage);
                break;
            }
            text.replace_range(span.start..span.end, &replacement);
            rounds += 1;
        }
        text
    }

    /// `##start;step;pad#` by deck position, `#sc;start;step;pad#` by copy
    pub(crate) fn expand_counters(&mut self, text: String, ctx: &TranslationContext<'_>) -> String {
        let deck_index = ctx.card.deck_index;
        let copy_index = ctx.card.copy_index;
        let text = self.apply_stage(text, ctx, "counter", |this, t| {
            let span = latest_hash(t, "##", hash_end, |b| parse_counter(b).is_some())?;
            Some((span, this.counter(span.body(t), deck_index, ctx)))
        });
        self.apply_stage(text, ctx, "sub-counter", |this, t| {
            let span = latest_hash(t, "#sc;", hash_end, |b| parse_counter(b).is_some())?;
            Some((span, this.counter(span.body(t), copy_index, ctx)))
        })
    }

    fn counter(&mut self, body: &str, index: usize, ctx: &TranslationContext<'_>) -> String {
        let Some((start, step, pad)) = parse_counter(body) else {
            return self.invalid_pattern("COUNTER", body, ctx);
        };
        match counter_value(start, step, index) {
            Some(value) if pad <= MAX_PATTERN_OUTPUT => zero_pad(value, pad),
            _ => self.invalid_pattern("COUNTER", body, ctx),
        }
    }

    /// `&[field]`, seeing overrides staged by earlier passes
    pub(crate) fn expand_field_reads(
        &mut self,
        text: String,
        ctx: &TranslationContext<'_>,
        overrides: &BTreeMap<String, String>,
    ) -> String {
        self.apply_stage(text, ctx, "field", |this, t| {
            let (_, span) = latest_bracket(t, &["&["])?;
            let name = span.body(t).trim().to_lowercase();
            let value = if is_disallowed(&name) {
                this.issue(
                    IssueKind::DisallowedField,
                    ctx,
                    format!("field '{name}' cannot be read"),
                );
                String::new()
            } else if let Some(value) = overrides.get(&name) {
                value.clone()
            } else if let Some(value) = read_field(ctx.element, &name) {
                value
            } else {
                this.issue(
                    IssueKind::UnresolvedName,
                    ctx,
                    format!("no element field named '{name}'"),
                );
                format!("[BAD NAME: {name}]")
            };
            Some((span, value))
        })
    }

    /// `#random;min;max#`, both bounds inclusive
    pub(crate) fn expand_randoms(&mut self, text: String, ctx: &TranslationContext<'_>) -> String {
        self.apply_stage(text, ctx, "random", |this, t| {
            let span = latest_hash(t, "#random;", hash_end, |b| parse_range(b).is_some())?;
            let (a, b) = parse_range(span.body(t))?;
            let (min, max) = if a <= b { (a, b) } else { (b, a) };
            let value: i64 = this.rng.gen_range(min..=max);
            Some((span, value.to_string()))
        })
    }

    /// `#math;a;op;b[;format]#`
    pub(crate) fn expand_math(&mut self, text: String, ctx: &TranslationContext<'_>) -> String {
        self.apply_stage(text, ctx, "math", |this, t| {
            let span = latest_hash(t, "#math;", format_aware_end, |_| true)?;
            let value = this.evaluate_math(span.body(t), ctx);
            Some((span, value))
        })
    }

    fn evaluate_math(&mut self, body: &str, ctx: &TranslationContext<'_>) -> String {
        let mut parts = body.splitn(4, ';');
        let (Some(lhs), Some(op), Some(rhs)) = (parts.next(), parts.next(), parts.next()) else {
            return self.invalid_math(body, ctx);
        };
        let format = parts.next().map(str::trim).filter(|f| !f.is_empty());
        let (Ok(a), Ok(b)) = (parse_decimal(lhs.trim()), parse_decimal(rhs.trim())) else {
            return self.invalid_math(body, ctx);
        };

        let result = match op.trim() {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            "/" | "%" if b == 0.0 => {
                self.issue(
                    IssueKind::DivisionByZero,
                    ctx,
                    format!("math {body:?} divides by zero"),
                );
                return String::new();
            }
            "/" => a / b,
            "%" => a % b,
            _ => return self.invalid_math(body, ctx),
        };

        match format {
            Some(pattern) => format_number(pattern, result),
            None => format_plain(result),
        }
    }

    fn invalid_math(&mut self, body: &str, ctx: &TranslationContext<'_>) -> String {
        self.issue(
            IssueKind::MalformedArguments,
            ctx,
            format!("cannot evaluate math {body:?}"),
        );
        format!("[INVALID MATH: {body}]")
    }

    /// `#repeat;n;text#`
    pub(crate) fn expand_repeats(&mut self, text: String, ctx: &TranslationContext<'_>) -> String {
        self.apply_stage(text, ctx, "repeat", |this, t| {
            let span = latest_hash(t, "#repeat;", hash_end, |_| true)?;
            let body = span.body(t);
            let repeated = body
                .split_once(';')
                .and_then(|(count, content)| {
                    let n = usize::try_from(parse_integer(count.trim()).ok()?).ok()?;
                    let length = n.checked_mul(content.len().max(1))?;
                    (length <= MAX_PATTERN_OUTPUT).then(|| content.repeat(n))
                })
                .unwrap_or_else(|| this.invalid_pattern("REPEAT", body, ctx));
            Some((span, repeated))
        })
    }

    /// `#padl;width;char;text#` and `#padr;width;char;text#`
    pub(crate) fn expand_padding(&mut self, text: String, ctx: &TranslationContext<'_>) -> String {
        let text = self.apply_stage(text, ctx, "padl", |this, t| {
            let span = latest_hash(t, "#padl;", hash_end, |_| true)?;
            Some((span, this.pad(span.body(t), true, ctx)))
        });
        self.apply_stage(text, ctx, "padr", |this, t| {
            let span = latest_hash(t, "#padr;", hash_end, |_| true)?;
            Some((span, this.pad(span.body(t), false, ctx)))
        })
    }

    fn pad(&mut self, body: &str, left: bool, ctx: &TranslationContext<'_>) -> String {
        let mut parts = body.splitn(3, ';');
        let (Some(width), Some(fill), Some(content)) = (parts.next(), parts.next(), parts.next())
        else {
            return self.invalid_pattern("PAD", body, ctx);
        };
        let Some(width) = parse_integer(width.trim())
            .ok()
            .and_then(|w| usize::try_from(w).ok())
            .filter(|w| *w <= MAX_PATTERN_OUTPUT)
        else {
            return self.invalid_pattern("PAD", body, ctx);
        };

        let fill = fill.chars().next().unwrap_or(' ');
        let missing = width.saturating_sub(content.chars().count());
        let padding: String = std::iter::repeat(fill).take(missing).collect();
        if left {
            format!("{padding}{content}")
        } else {
            format!("{content}{padding}")
        }
    }

    fn invalid_pattern(&mut self, name: &str, body: &str, ctx: &TranslationContext<'_>) -> String {
        self.issue(
            IssueKind::MalformedArguments,
            ctx,
            format!("malformed {} {body:?}", name.to_lowercase()),
        );
        format!("[INVALID {name}: {body}]")
    }

    /// Pull `$[field:value]` directives out of the text into `overrides`
    pub(crate) fn extract_overrides(
        &mut self,
        text: String,
        ctx: &TranslationContext<'_>,
        overrides: &mut BTreeMap<String, String>,
    ) -> String {
        self.apply_stage(text, ctx, "override", |this, t| {
            let (_, span) = latest_bracket(t, &["$["])?;
            let body = span.body(t);
            match body.split_once(':') {
                Some((field, value)) => {
                    let field = field.trim().to_lowercase();
                    if value.is_empty() {
                        log::debug!("{}: empty override for '{field}' discarded", ctx.element.name);
                    } else if is_disallowed(&field) {
                        this.issue(
                            IssueKind::DisallowedField,
                            ctx,
                            format!("field '{field}' cannot be overridden"),
                        );
                    } else if field_kind(&field).is_none() {
                        this.issue(
                            IssueKind::UnresolvedName,
                            ctx,
                            format!("no element field named '{field}'"),
                        );
                    } else {
                        overrides.insert(field, value.to_string());
                    }
                }
                None => this.issue(
                    IssueKind::MalformedArguments,
                    ctx,
                    format!("override {body:?} needs field:value"),
                ),
            }
            Some((span, String::new()))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::translator::fixture::Fixture;
    use crate::translator::{IssueKind, MacroTranslator, Translator, MAX_PATTERN_OUTPUT};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counter_uses_deck_index() {
        let fixture = Fixture::new();
        let resolved = MacroTranslator::with_seed(1).resolve("##500;10;8#", &fixture.ctx(1));
        assert_eq!(resolved.text, "00000510");
        assert_eq!(fixture.resolve("No. ##1;1;3#").text, "No. 001");
    }

    #[test]
    fn test_sub_counter_uses_copy_index() {
        let fixture = Fixture::new();
        let mut ctx = fixture.ctx(4);
        ctx.card.copy_index = 2;
        let resolved = MacroTranslator::with_seed(1).resolve("#sc;1;1;2#", &ctx);
        assert_eq!(resolved.text, "03");
    }

    #[test]
    fn test_malformed_counter_is_left_alone() {
        let fixture = Fixture::new();
        assert_eq!(fixture.resolve("##a;b;c#").text, "##a;b;c#");
    }

    #[test]
    fn test_counter_overflow_is_reported() {
        let fixture = Fixture::new();
        let mut translator = MacroTranslator::with_seed(1);
        let resolved = translator.resolve("##9223372036854775807;1;1#", &fixture.ctx(1));
        assert_eq!(
            resolved.text,
            "[INVALID COUNTER: 9223372036854775807;1;1]"
        );
        assert_eq!(translator.take_issues()[0].kind, IssueKind::MalformedArguments);

        let resolved = translator.resolve("##9223372036854775807;1;1#", &fixture.ctx(0));
        assert_eq!(resolved.text, "9223372036854775807");
    }

    #[test]
    fn test_oversized_counter_pad_is_rejected() {
        let fixture = Fixture::new();
        let mut translator = MacroTranslator::with_seed(1);
        let resolved = translator.resolve("##1;1;99999999#", &fixture.ctx(0));
        assert_eq!(resolved.text, "[INVALID COUNTER: 1;1;99999999]");
        assert_eq!(translator.take_issues().len(), 1);
    }

    #[test]
    fn test_random_within_bounds() {
        let fixture = Fixture::new();
        let mut translator = MacroTranslator::with_seed(42);
        for _ in 0..50 {
            let resolved = translator.resolve("#random;3;5#", &fixture.ctx(0));
            let n: i64 = resolved.text.parse().unwrap();
            assert!((3..=5).contains(&n));
        }
        let a = MacroTranslator::with_seed(9).resolve("#random;1;1000#", &fixture.ctx(0));
        let b = MacroTranslator::with_seed(9).resolve("#random;1;1000#", &fixture.ctx(0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_math() {
        let fixture = Fixture::new();
        assert_eq!(fixture.resolve("#math;@[cost];+;3#").text, "5");
        assert_eq!(fixture.resolve("#math;2,5;*;2#").text, "5");
        assert_eq!(fixture.resolve("#math;1;/;4#").text, "0.25");
        assert_eq!(fixture.resolve("#math;7;%;4#").text, "3");
        assert_eq!(fixture.resolve("#math;1000;*;1.5;#,##0.00#").text, "1,500.00");
        assert_eq!(fixture.resolve("#math;1;/;3;0.00#").text, "0.33");
    }

    #[test]
    fn test_math_followed_by_punctuation() {
        let fixture = Fixture::new();
        assert_eq!(
            fixture.resolve("costs #math;2;*;3#, then #math;1;+;1#.").text,
            "costs 6, then 2."
        );
        assert_eq!(fixture.resolve("#math;2;*;3#0").text, "60");
        assert_eq!(fixture.resolve("#math;1;+;1##math;2;+;2#").text, "24");
    }

    #[test]
    fn test_math_errors() {
        let fixture = Fixture::new();
        let mut translator = MacroTranslator::with_seed(1);
        let resolved = translator.resolve("[#math;1;/;0#]", &fixture.ctx(0));
        assert_eq!(resolved.text, "[]");
        assert_eq!(translator.take_issues()[0].kind, IssueKind::DivisionByZero);

        assert_eq!(
            fixture.resolve("#math;x;+;1#").text,
            "[INVALID MATH: x;+;1]"
        );
        assert_eq!(
            fixture.resolve("#math;1;^;1#").text,
            "[INVALID MATH: 1;^;1]"
        );
    }

    #[test]
    fn test_repeat_and_pad() {
        let fixture = Fixture::new();
        assert_eq!(fixture.resolve("#repeat;3;*#").text, "***");
        assert_eq!(fixture.resolve("#repeat;0;*#").text, "");
        assert_eq!(fixture.resolve("#padl;5;0;42#").text, "00042");
        assert_eq!(fixture.resolve("#padr;4;.;ab#").text, "ab..");
        assert_eq!(fixture.resolve("#padl;2;0;12345#").text, "12345");
        assert_eq!(
            fixture.resolve("#repeat;x;*#").text,
            "[INVALID REPEAT: x;*]"
        );
    }

    #[test]
    fn test_oversized_repeat_and_pad_are_rejected() {
        let fixture = Fixture::new();
        let mut translator = MacroTranslator::with_seed(1);
        let resolved = translator.resolve("#repeat;99999999999999;ab#", &fixture.ctx(0));
        assert_eq!(resolved.text, "[INVALID REPEAT: 99999999999999;ab]");
        let resolved = translator.resolve("#padl;99999999999;0;7#", &fixture.ctx(0));
        assert_eq!(resolved.text, "[INVALID PAD: 99999999999;0;7]");
        let resolved = translator.resolve("#padr;99999999999;0;7#", &fixture.ctx(0));
        assert_eq!(resolved.text, "[INVALID PAD: 99999999999;0;7]");

        let issues = translator.take_issues();
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.kind == IssueKind::MalformedArguments));

        let at_cap = format!("#repeat;{MAX_PATTERN_OUTPUT};x#");
        assert_eq!(fixture.resolve(&at_cap).text.len(), MAX_PATTERN_OUTPUT);
    }

    #[test]
    fn test_field_reads() {
        let fixture = Fixture::new();
        assert_eq!(fixture.resolve("&[x],&[Width]").text, "5,50");
        assert_eq!(fixture.resolve("&[name]").text, "");
        assert_eq!(fixture.resolve("&[nope]").text, "[BAD NAME: nope]");
    }

    #[test]
    fn test_overrides_are_extracted() {
        let fixture = Fixture::new();
        let resolved = fixture.resolve("Title$[x:25]$[y:]");
        assert_eq!(resolved.text, "Title");
        assert_eq!(resolved.overrides.get("x").map(String::as_str), Some("25"));
        assert!(!resolved.overrides.contains_key("y"));

        let element = fixture.element.with_overrides(&resolved);
        assert_eq!(element.x, 25);
        assert_eq!(element.y, fixture.element.y);
    }

    #[test]
    fn test_disallowed_override_is_rejected() {
        let fixture = Fixture::new();
        let mut translator = MacroTranslator::with_seed(1);
        let resolved = translator.resolve("$[name:evil]$[Variable:x]ok", &fixture.ctx(0));
        assert_eq!(resolved.text, "ok");
        assert!(resolved.overrides.is_empty());
        let issues = translator.take_issues();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::DisallowedField));
    }

    #[test]
    fn test_override_from_reference() {
        let fixture = Fixture::new();
        let resolved = fixture.resolve("$[width:#math;@[cost];*;10#]");
        assert_eq!(resolved.overrides.get("width").map(String::as_str), Some("20"));
        assert_eq!(resolved.text, "");
    }
}
