//! Citation markers: tokenizer, renumbering, and rendering.
//!
//! The pipeline is split in three pure steps so each can be tested alone:
//!
//! 1. [`tokenize`] turns generated text into [`Segment`]s: literal text and
//!    `[n]` markers.
//! 2. [`renumber`] maps marker `n` to retrieval position `n` (1-based), assigns
//!    contiguous indices by first appearance and collects the [`Citation`]s.
//!    Markers pointing at the same link share an index; markers with no
//!    backing source stay literal.
//! 3. [`render`] writes the rewritten answer.

use std::collections::HashMap;

use serde::Serialize;

/// Longest digit run accepted inside a marker; keeps the number within `u32`.
const MAX_MARKER_DIGITS: usize = 9;

/// A piece of generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any marker.
    Text(&'a str),
    /// A `[n]` marker; `raw` is the exact source text including brackets.
    Marker { raw: &'a str, number: u32 },
}

/// Link metadata for one retrieved passage, in retrieval order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub title: String,
    /// Decoded URL including the optional `#page=N` fragment.
    pub href: String,
}

/// A reference returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    /// 1-based, contiguous, in order of first appearance in the answer.
    pub index: u32,
    pub title: String,
    pub url: String,
}

/// Segment after renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendered<'a> {
    Text(&'a str),
    /// Marker mapped to a reference, carrying the new index.
    Cited(u32),
    /// Marker with no backing source, kept verbatim.
    Literal(&'a str),
}

impl Rendered<'_> {
    fn is_marker(&self) -> bool {
        !matches!(self, Rendered::Text(_))
    }
}

/// Splits `text` into literal runs and `[digits]` markers.
///
/// Anything that is not exactly `[`, 1 to 9 ASCII digits, `]` is literal text,
/// so `[ 1]`, `[1a]`, `[]` and unterminated brackets pass through untouched.
pub fn tokenize(text: &str) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'[' {
            let digits = bytes[i + 1..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            let close = i + 1 + digits;
            if (1..=MAX_MARKER_DIGITS).contains(&digits) && bytes.get(close) == Some(&b']') {
                if text_start < i {
                    out.push(Segment::Text(&text[text_start..i]));
                }
                let raw = &text[i..=close];
                let number = raw[1..raw.len() - 1].parse::<u32>().unwrap_or(0);
                out.push(Segment::Marker { raw, number });
                i = close + 1;
                text_start = i;
                continue;
            }
        }
        i += 1;
    }

    if text_start < text.len() {
        out.push(Segment::Text(&text[text_start..]));
    }
    out
}

/// Renumbers markers against `sources` (index 0 = marker `[1]`).
///
/// Returns the rewritten segments and the references in index order.
pub fn renumber<'a>(
    segments: &[Segment<'a>],
    sources: &[SourceRef],
) -> (Vec<Rendered<'a>>, Vec<Citation>) {
    let mut by_href: HashMap<&str, u32> = HashMap::new();
    let mut references: Vec<Citation> = Vec::new();
    let mut rendered = Vec::with_capacity(segments.len());

    for seg in segments {
        match *seg {
            Segment::Text(t) => rendered.push(Rendered::Text(t)),
            Segment::Marker { raw, number } => {
                let source = (number as usize)
                    .checked_sub(1)
                    .and_then(|pos| sources.get(pos));
                match source {
                    Some(src) => {
                        let index = *by_href.entry(src.href.as_str()).or_insert_with(|| {
                            let next = references.len() as u32 + 1;
                            references.push(Citation {
                                index: next,
                                title: src.title.clone(),
                                url: src.href.clone(),
                            });
                            next
                        });
                        rendered.push(Rendered::Cited(index));
                    }
                    None => rendered.push(Rendered::Literal(raw)),
                }
            }
        }
    }

    (rendered, references)
}

/// Writes the answer. Directly adjacent markers (`[1][2]`) are separated as
/// `[1], [2]`.
pub fn render(segments: &[Rendered<'_>]) -> String {
    let mut out = String::new();
    let mut prev_marker = false;
    for seg in segments {
        if prev_marker && seg.is_marker() {
            out.push_str(", ");
        }
        match seg {
            Rendered::Text(t) => out.push_str(t),
            Rendered::Cited(n) => {
                out.push('[');
                out.push_str(&n.to_string());
                out.push(']');
            }
            Rendered::Literal(raw) => out.push_str(raw),
        }
        prev_marker = seg.is_marker();
    }
    out
}

/// Appends a markdown reference-link footer (`[n]: url`) for every reference.
pub fn append_reference_links(answer: &str, references: &[Citation]) -> String {
    if references.is_empty() {
        return answer.to_string();
    }
    let mut out = answer.trim_end().to_string();
    out.push_str("\n\n");
    for c in references {
        out.push_str(&format!("[{}]: {}\n", c.index, c.url));
    }
    out
}
