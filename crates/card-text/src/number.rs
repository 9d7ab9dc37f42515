//! Decimal parsing and numeric formatting

use crate::{Result, TextError};

/// Parse a decimal number, accepting either `.` or `,` as the fractional separator
///
/// Surrounding whitespace is ignored. Infinite and NaN spellings are rejected.
///
/// # Examples
/// ```
/// use card_text::parse_decimal;
/// assert_eq!(parse_decimal("1.25").unwrap(), 1.25);
/// assert_eq!(parse_decimal(" 1,25 ").unwrap(), 1.25);
/// assert!(parse_decimal("1,000.5").is_err());
/// ```
pub fn parse_decimal(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    let normalized = trimmed.replace(',', ".");

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TextError::InvalidNumber(trimmed.to_string()))
}

/// Parse an integer; decimal spellings with no fractional part (`"3.0"`) are accepted
pub fn parse_integer(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(v);
    }

    match parse_decimal(trimmed) {
        Ok(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(v as i64),
        _ => Err(TextError::InvalidInteger(trimmed.to_string())),
    }
}

/// Left-pad an integer with `'0'` up to `width` characters
///
/// A negative sign counts toward the width.
pub fn zero_pad(value: i64, width: usize) -> String {
    if value < 0 {
        let digits = value.unsigned_abs().to_string();
        format!("-{:0>w$}", digits, w = width.saturating_sub(1))
    } else {
        format!("{value:0>width$}")
    }
}

/// Format a number without a pattern
///
/// Whole numbers print without a fractional part; everything else is rounded
/// to 10 places with trailing zeros removed.
pub fn format_plain(n: f64) -> String {
    if !n.is_finite() {
        return non_finite(n);
    }

    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }

    let text = format!("{n:.10}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Render a number with a format pattern
///
/// Pattern characters:
/// - `0` required digit
/// - `#` optional digit
/// - `,` digit grouping (group size is the digit count after the last `,`)
/// - `.` decimal point
///
/// Text before the first digit placeholder and after the last one is copied
/// through, so `"$#,##0.00"` and `"0%"` behave as expected. An empty pattern
/// falls back to [`format_plain`].
///
/// # Examples
/// ```
/// use card_text::format_number;
/// assert_eq!(format_number("0.00", 2.0), "2.00");
/// assert_eq!(format_number("0.##", 2.5), "2.5");
/// assert_eq!(format_number("000", 7.0), "007");
/// ```
pub fn format_number(pattern: &str, n: f64) -> String {
    if !n.is_finite() {
        return non_finite(n);
    }

    let Some(spec) = NumberPattern::parse(pattern) else {
        return format_plain(n);
    };

    let fixed = format!("{:.*}", spec.max_fraction, n.abs());
    let (int_digits, frac_digits) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (fixed.clone(), String::new()),
    };

    // Drop optional fractional digits that are zero
    let mut frac = frac_digits;
    while frac.len() > spec.min_fraction && frac.ends_with('0') {
        frac.pop();
    }

    let mut int_part = if int_digits == "0" && spec.min_integer == 0 {
        String::new()
    } else {
        int_digits
    };
    if int_part.len() < spec.min_integer {
        int_part = format!("{:0>w$}", int_part, w = spec.min_integer);
    }
    if let Some(size) = spec.group {
        int_part = group_digits(&int_part, size);
    }

    let is_zero = !int_part.chars().chain(frac.chars()).any(|c| c.is_ascii_digit() && c != '0');
    let sign = if n < 0.0 && !is_zero { "-" } else { "" };

    let mut out = String::new();
    out.push_str(spec.prefix);
    out.push_str(sign);
    out.push_str(&int_part);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out.push_str(spec.suffix);
    out
}

fn non_finite(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n > 0.0 {
        "Infinity".to_string()
    } else {
        "-Infinity".to_string()
    }
}

/// Parsed numeric format pattern
#[derive(Debug, PartialEq)]
struct NumberPattern<'a> {
    prefix: &'a str,
    suffix: &'a str,
    min_integer: usize,
    min_fraction: usize,
    max_fraction: usize,
    group: Option<usize>,
}

impl<'a> NumberPattern<'a> {
    fn parse(pattern: &'a str) -> Option<Self> {
        let start = pattern.find(['0', '#'])?;
        let end = pattern.rfind(['0', '#', ',', '.'])? + 1;
        let body = &pattern[start..end];

        let (int_body, frac_body) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };

        let min_integer = int_body.chars().filter(|c| *c == '0').count();
        let group = int_body.rfind(',').and_then(|pos| {
            let size = int_body[pos + 1..]
                .chars()
                .filter(|c| matches!(c, '0' | '#'))
                .count();
            (size > 0).then_some(size)
        });
        let min_fraction = frac_body.chars().filter(|c| *c == '0').count();
        let max_fraction = frac_body
            .chars()
            .filter(|c| matches!(c, '0' | '#'))
            .count();

        Some(Self {
            prefix: &pattern[..start],
            suffix: &pattern[end..],
            min_integer,
            min_fraction,
            max_fraction,
            group,
        })
    }
}

/// Insert `,` every `size` digits from the right
fn group_digits(digits: &str, size: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / size);

    for (i, c) in chars.iter().enumerate() {
        let remaining = chars.len() - i;
        if i > 0 && remaining % size == 0 {
            out.push(',');
        }
        out.push(*c);
    }

    out
}
