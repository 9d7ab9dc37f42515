//! Segmentation of literal text into words, spaces and line breaks

/// One piece of literal text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A run of non-whitespace characters
    Word(String),
    /// A single breakable space
    Space,
    /// A hard line break
    Newline,
}

/// Split text into words, spaces and newlines
///
/// Every space and tab yields its own [`Segment::Space`] so consecutive
/// spaces keep their width. `\r\n`, `\n` and a lone `\r` each produce one
/// [`Segment::Newline`].
///
/// # Examples
/// ```
/// use card_text::{segment_text, Segment};
/// let parts = segment_text("a b\nc");
/// assert_eq!(parts, vec![
///     Segment::Word("a".into()),
///     Segment::Space,
///     Segment::Word("b".into()),
///     Segment::Newline,
///     Segment::Word("c".into()),
/// ]);
/// ```
pub fn segment_text(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut word = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let boundary = match c {
            ' ' | '\t' => Some(Segment::Space),
            '\n' => Some(Segment::Newline),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                Some(Segment::Newline)
            }
            _ => None,
        };

        match boundary {
            Some(segment) => {
                if !word.is_empty() {
                    segments.push(Segment::Word(std::mem::take(&mut word)));
                }
                segments.push(segment);
            }
            None => word.push(c),
        }
    }

    if !word.is_empty() {
        segments.push(Segment::Word(word));
    }

    segments
}
