//! Delimiter scanning for the pattern stages
//!
//! Bracket and hash patterns are found by their latest-starting opener so
//! nested references resolve inside-out; logic blocks are found by their
//! earliest opener so conditionals resolve outside-in.

/// A matched pattern: `start..end` is the whole match, `body_start..body_end`
/// the text between the delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub end: usize,
    pub body_start: usize,
    pub body_end: usize,
}

impl Span {
    pub fn body<'t>(&self, text: &'t str) -> &'t str {
        &text[self.body_start..self.body_end]
    }
}

fn matching_bracket(text: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, b) in text.as_bytes()[from..].iter().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Latest opener among `opens` that has a closing `]`
///
/// Returns the index of the opener family and its span.
pub(crate) fn latest_bracket(text: &str, opens: &[&str]) -> Option<(usize, Span)> {
    let mut limit = text.len();
    loop {
        let (family, start) = opens
            .iter()
            .enumerate()
            .filter_map(|(i, open)| text[..limit].rfind(open).map(|s| (i, s)))
            .max_by_key(|(_, s)| *s)?;
        let body_start = start + opens[family].len();
        if let Some(close) = matching_bracket(text, body_start) {
            return Some((
                family,
                Span {
                    start,
                    end: close + 1,
                    body_start,
                    body_end: close,
                },
            ));
        }
        limit = start;
    }
}

/// Position of the first `#` at or after `from`
pub(crate) fn hash_end(text: &str, from: usize) -> Option<usize> {
    text[from..].find('#').map(|i| from + i)
}

/// End of `a;op;b[;format]#`
///
/// Before the third `;` the first `#` closes the pattern. Inside the format
/// field a `#` followed by a number-format character belongs to the format,
/// so `#,##0.00` can live inside the pattern.
pub(crate) fn format_aware_end(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut separators = 0;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match b {
            b';' => separators += 1,
            b'#' if separators < 3 => return Some(i),
            b'#' if !matches!(bytes.get(i + 1), Some(b'#' | b'0' | b',' | b'.')) => {
                return Some(i)
            }
            _ => {}
        }
    }
    None
}

/// Latest `open ... #` pattern whose body `accept` takes
pub(crate) fn latest_hash(
    text: &str,
    open: &str,
    end: fn(&str, usize) -> Option<usize>,
    accept: impl Fn(&str) -> bool,
) -> Option<Span> {
    let mut limit = text.len();
    while let Some(start) = text[..limit].rfind(open) {
        let body_start = start + open.len();
        if let Some(close) = end(text, body_start) {
            let span = Span {
                start,
                end: close + 1,
                body_start,
                body_end: close,
            };
            if accept(span.body(text)) {
                return Some(span);
            }
        }
        limit = start;
    }
    None
}

/// Earliest `#( ... )#` block, matched by depth
pub(crate) fn earliest_block(text: &str) -> Option<Span> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(offset) = text[from..].find("#(") {
        let start = from + offset;
        let body_start = start + 2;
        let mut depth = 1usize;
        let mut i = body_start;
        while i < bytes.len() {
            if bytes[i..].starts_with(b"#(") {
                depth += 1;
                i += 2;
            } else if bytes[i..].starts_with(b")#") {
                depth -= 1;
                if depth == 0 {
                    return Some(Span {
                        start,
                        end: i + 2,
                        body_start,
                        body_end: i,
                    });
                }
                i += 2;
            } else {
                i += 1;
            }
        }
        from = body_start;
    }
    None
}

/// Nesting depth change of `#(`/`)#` blocks and `[`/`]` sets at `i`
fn depth_step(bytes: &[u8], i: usize) -> (isize, usize) {
    if bytes[i..].starts_with(b"#(") {
        (1, 2)
    } else if bytes[i..].starts_with(b")#") {
        (-1, 2)
    } else {
        match bytes[i] {
            b'[' => (1, 1),
            b']' => (-1, 1),
            _ => (0, 1),
        }
    }
}

/// Split on `sep` outside nested blocks and sets
pub(crate) fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0isize;
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        if depth == 0 && bytes[i] == sep {
            parts.push(&text[last..i]);
            last = i + 1;
            i += 1;
            continue;
        }
        let (delta, step) = depth_step(bytes, i);
        depth += delta;
        i += step;
    }
    parts.push(&text[last..]);
    parts
}

/// Byte offset of an ASCII `keyword` outside nested blocks, ignoring case
pub(crate) fn find_top_level(text: &str, keyword: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let keyword = keyword.as_bytes();
    let mut depth = 0isize;
    let mut i = 0;
    while i < bytes.len() {
        if depth == 0
            && bytes.len() - i >= keyword.len()
            && bytes[i..i + keyword.len()].eq_ignore_ascii_case(keyword)
        {
            return Some(i);
        }
        let (delta, step) = depth_step(bytes, i);
        depth += delta;
        i += step;
    }
    None
}
