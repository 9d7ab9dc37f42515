//! `#(if ...)#` and `#(switch ...)#` blocks

use super::scan::{earliest_block, find_top_level, split_top_level};
use super::{IssueKind, MacroTranslator, TranslationContext, MAX_TRANSLATION_LOOPS};
use card_text::parse_decimal;

/// Default value that re-emits the switch key
const SWITCH_KEY: &str = "#switchkey";
const DEFAULT_CASE: &str = "#default";

/// Operators in match order; two-character forms come first
const OPERATORS: [&str; 6] = ["==", "!=", ">=", "<=", ">", "<"];

/// `[a;b;c]` is a set of three items, anything else a set of one
fn as_set(operand: &str) -> Vec<&str> {
    let operand = operand.trim();
    match operand
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(items) => items.split(';').map(str::trim).collect(),
        None => vec![operand],
    }
}

/// Equality is set intersection
fn sets_intersect(lhs: &str, rhs: &str) -> bool {
    let rhs = as_set(rhs);
    as_set(lhs).iter().any(|item| rhs.contains(item))
}

fn strip_keyword<'t>(body: &'t str, keyword: &str) -> Option<&'t str> {
    let head = body.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &body[keyword.len()..];
    match rest.chars().next() {
        Some(c) if c == ';' || c.is_whitespace() => Some(rest),
        _ => None,
    }
}

impl MacroTranslator {
    /// Evaluate logic blocks outermost first; inner blocks are rescanned
    pub(crate) fn expand_logic(&mut self, mut text: String, ctx: &TranslationContext<'_>) -> String {
        let mut rounds = 0;
        while let Some(span) = earliest_block(&text) {
            if rounds == MAX_TRANSLATION_LOOPS {
                self.loop_guard(ctx, "logic");
                break;
            }
            let body = span.body(&text).trim().to_string();
            let replacement = if let Some(rest) = strip_keyword(&body, "if") {
                self.evaluate_if(rest.trim(), ctx)
            } else if let Some(rest) = strip_keyword(&body, "switch") {
                switch_value(rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace()))
            } else {
                self.issue(
                    IssueKind::MalformedArguments,
                    ctx,
                    format!("logic block {body:?} is neither if nor switch"),
                );
                format!("[INVALID LOGIC: {body}]")
            };
            text.replace_range(span.start..span.end, &replacement);
            rounds += 1;
        }
        text
    }

    fn evaluate_if(&mut self, body: &str, ctx: &TranslationContext<'_>) -> String {
        let Some(then_at) = find_top_level(body, " then ") else {
            self.issue(
                IssueKind::MalformedArguments,
                ctx,
                format!("if {body:?} has no then"),
            );
            return format!("[INVALID LOGIC: if {body}]");
        };
        let condition = &body[..then_at];
        let branches = &body[then_at + " then ".len()..];
        let (when_true, when_false) = match find_top_level(branches, " else ") {
            Some(at) => (&branches[..at], &branches[at + " else ".len()..]),
            None => (branches, ""),
        };

        if self.condition_holds(condition, ctx) {
            when_true.trim().to_string()
        } else {
            when_false.trim().to_string()
        }
    }

    fn condition_holds(&mut self, condition: &str, ctx: &TranslationContext<'_>) -> bool {
        let Some((op, at)) = OPERATORS
            .iter()
            .find_map(|op| find_top_level(condition, op).map(|at| (*op, at)))
        else {
            self.issue(
                IssueKind::MalformedArguments,
                ctx,
                format!("condition {condition:?} has no comparison operator"),
            );
            return false;
        };
        let lhs = condition[..at].trim();
        let rhs = condition[at + op.len()..].trim();

        match op {
            "==" => sets_intersect(lhs, rhs),
            "!=" => !sets_intersect(lhs, rhs),
            _ => {
                let (Ok(a), Ok(b)) = (parse_decimal(lhs), parse_decimal(rhs)) else {
                    self.issue(
                        IssueKind::MalformedArguments,
                        ctx,
                        format!("cannot compare {lhs:?} {op} {rhs:?} as numbers"),
                    );
                    return false;
                };
                match op {
                    ">=" => a >= b,
                    "<=" => a <= b,
                    ">" => a > b,
                    _ => a < b,
                }
            }
        }
    }
}

/// Literal case match first, then set intersection, then `#default`
fn switch_value(body: &str) -> String {
    let parts: Vec<&str> = split_top_level(body, b';')
        .into_iter()
        .map(str::trim)
        .collect();
    let Some((key, cases)) = parts.split_first() else {
        return String::new();
    };
    let pairs: Vec<(&str, &str)> = cases
        .chunks(2)
        .map(|pair| (pair[0], pair.get(1).copied().unwrap_or_default()))
        .collect();

    let matched = pairs
        .iter()
        .filter(|(case, _)| !case.eq_ignore_ascii_case(DEFAULT_CASE))
        .find(|(case, _)| case == key)
        .or_else(|| {
            pairs.iter().find(|(case, _)| {
                !case.eq_ignore_ascii_case(DEFAULT_CASE) && sets_intersect(key, case)
            })
        });
    if let Some((_, value)) = matched {
        return value.to_string();
    }

    match pairs
        .iter()
        .find(|(case, _)| case.eq_ignore_ascii_case(DEFAULT_CASE))
    {
        Some((_, value)) if value.eq_ignore_ascii_case(SWITCH_KEY) => key.to_string(),
        Some((_, value)) => value.to_string(),
        None => String::new(),
    }
}
