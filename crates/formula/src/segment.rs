//! Segment buffer: the editing-time form of one formula.
//!
//! A [`Buffer`] is an ordered sequence of [`Segment`]s, each either literal
//! text or a reference to a field. It round-trips to the canonical expression
//! string, where a reference is written as `{fieldId}`:
//!
//! ```rust
//! use pricing_logic_formula::Buffer;
//!
//! let source = "{f_loan_amount} * 0.01 + ROUND({f_rate}, 2)";
//! let buffer = Buffer::parse(source);
//! assert_eq!(buffer.references().collect::<Vec<_>>(), vec!["f_loan_amount", "f_rate"]);
//! assert_eq!(buffer.serialize(), source);
//! ```
//!
//! # Normal form
//!
//! Buffers are always normalized: text and reference segments alternate,
//! starting and ending with text. Adjacent text is merged and an empty text
//! slot is kept on each side of every reference, so the caret can always be
//! homed in a text segment. Text segments therefore sit at even indices and
//! references at odd ones.
//!
//! Caret offsets inside a text segment count `char`s, not bytes.

use crate::catalog::FieldCatalog;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One atomic piece of an expression buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Text {
        value: String,
    },
    Reference {
        #[serde(rename = "fieldId")]
        field_id: String,
    },
}

impl Segment {
    pub fn text(value: impl Into<String>) -> Self {
        Segment::Text {
            value: value.into(),
        }
    }

    pub fn reference(field_id: impl Into<String>) -> Self {
        Segment::Reference {
            field_id: field_id.into(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Segment::Text { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text { value } => Some(value),
            Segment::Reference { .. } => None,
        }
    }

    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Segment::Reference { field_id } => Some(field_id),
            Segment::Text { .. } => None,
        }
    }

    /// Length of this segment in the canonical string, in chars.
    fn serialized_chars(&self) -> usize {
        match self {
            Segment::Text { value } => value.chars().count(),
            Segment::Reference { field_id } => field_id.chars().count() + 2,
        }
    }
}

/// Caret position: a text segment index and a char offset inside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caret {
    pub segment: usize,
    pub offset: usize,
}

impl Caret {
    pub fn new(segment: usize, offset: usize) -> Self {
        Self { segment, offset }
    }
}

/// Normalize a segment sequence.
///
/// Merges adjacent text and inserts empty text around references so that the
/// result alternates text/reference and starts and ends with text. The
/// result is never empty and `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(segments: impl IntoIterator<Item = Segment>) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut pending = String::new();
    for segment in segments {
        match segment {
            Segment::Text { value } => pending.push_str(&value),
            reference @ Segment::Reference { .. } => {
                out.push(Segment::text(std::mem::take(&mut pending)));
                out.push(reference);
            }
        }
    }
    out.push(Segment::text(pending));
    out
}

/// An editable formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Buffer {
    segments: Vec<Segment>,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::from_segments(Vec::new())
    }
}

impl Buffer {
    /// Build a buffer from arbitrary segments, normalizing them.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            segments: normalize(segments),
        }
    }

    /// Parse a canonical expression string. Never fails.
    ///
    /// Every `{...}` span with non-empty content free of braces becomes a
    /// reference; everything else is text.
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = text;
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            match after.find(['{', '}']) {
                Some(close) if close > 0 && after[close..].starts_with('}') => {
                    segments.push(Segment::text(&rest[..open]));
                    segments.push(Segment::reference(&after[..close]));
                    rest = &after[close + 1..];
                }
                _ => {
                    segments.push(Segment::text(&rest[..=open]));
                    rest = after;
                }
            }
        }
        segments.push(Segment::text(rest));
        Self::from_segments(segments)
    }

    /// Serialize to the canonical expression string.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text { value } => out.push_str(value),
                Segment::Reference { field_id } => {
                    out.push('{');
                    out.push_str(field_id);
                    out.push('}');
                }
            }
        }
        out
    }

    /// Human-readable form with `@Label` in place of `{fieldId}`.
    ///
    /// Fields missing from the catalog render as `@<raw id>`.
    pub fn render_with_labels(&self, catalog: &FieldCatalog) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text { value } => out.push_str(value),
                Segment::Reference { field_id } => {
                    out.push('@');
                    out.push_str(catalog.label_or_id(field_id));
                }
            }
        }
        out
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when the serialized form is the empty string.
    pub fn is_empty(&self) -> bool {
        self.segments.len() == 1 && self.text(0).is_some_and(str::is_empty)
    }

    /// Field ids referenced by this buffer, in order.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::as_reference)
    }

    /// Text of segment `index`, if it is a text segment.
    pub fn text(&self, index: usize) -> Option<&str> {
        self.segments.get(index).and_then(Segment::as_text)
    }

    /// Char length of text segment `index` (0 for anything else).
    pub fn text_len(&self, index: usize) -> usize {
        self.text(index).map_or(0, |t| t.chars().count())
    }

    /// Index of the last text segment.
    pub fn last_text_index(&self) -> usize {
        self.segments.len() - 1
    }

    /// Caret at the very end of the buffer.
    pub fn end_caret(&self) -> Caret {
        let segment = self.last_text_index();
        Caret::new(segment, self.text_len(segment))
    }

    /// Clamp a caret onto a valid text segment and offset.
    ///
    /// A caret addressing a reference lands at the start of the text that
    /// follows it; one past the end lands at the end of the buffer.
    pub fn clamp_caret(&self, caret: Caret) -> Caret {
        if caret.segment >= self.segments.len() {
            return self.end_caret();
        }
        if caret.segment % 2 == 1 {
            return Caret::new(caret.segment + 1, 0);
        }
        Caret::new(caret.segment, caret.offset.min(self.text_len(caret.segment)))
    }

    /// Char offset of `caret` within the serialized string.
    pub fn absolute_offset(&self, caret: Caret) -> usize {
        let caret = self.clamp_caret(caret);
        let before: usize = self.segments[..caret.segment]
            .iter()
            .map(Segment::serialized_chars)
            .sum();
        before + caret.offset
    }

    fn replace_text(&mut self, index: usize, value: String) {
        if let Some(Segment::Text { value: slot }) = self.segments.get_mut(index) {
            *slot = value;
        }
    }

    /// Insert `text` at the caret and return the caret after it.
    ///
    /// Braces are typed literally; they only become references after the
    /// canonical string is parsed again.
    pub fn insert_text(&mut self, caret: Caret, text: &str) -> Caret {
        let caret = self.clamp_caret(caret);
        let current = self.text(caret.segment).unwrap_or_default();
        let at = char_to_byte(current, caret.offset);
        let mut value = String::with_capacity(current.len() + text.len());
        value.push_str(&current[..at]);
        value.push_str(text);
        value.push_str(&current[at..]);
        self.replace_text(caret.segment, value);
        Caret::new(caret.segment, caret.offset + text.chars().count())
    }

    /// Delete the chars in `start..end` of text segment `segment`.
    pub fn delete_text(&mut self, segment: usize, start: usize, end: usize) {
        let Some(current) = self.text(segment) else {
            return;
        };
        let from = char_to_byte(current, start.min(end));
        let to = char_to_byte(current, end.max(start));
        let value = format!("{}{}", &current[..from], &current[to..]);
        self.replace_text(segment, value);
    }

    /// Split the text at `caret` and insert a reference to `field_id` there.
    ///
    /// Returns the caret at offset 0 of the text segment following the new
    /// reference.
    pub fn insert_reference(&mut self, caret: Caret, field_id: &str) -> Caret {
        let caret = self.clamp_caret(caret);
        let current = self.text(caret.segment).unwrap_or_default();
        let at = char_to_byte(current, caret.offset);
        let before = Segment::text(&current[..at]);
        let after = Segment::text(&current[at..]);

        let mut segments = Vec::with_capacity(self.segments.len() + 2);
        segments.extend_from_slice(&self.segments[..caret.segment]);
        segments.push(before);
        segments.push(Segment::reference(field_id));
        segments.push(after);
        segments.extend_from_slice(&self.segments[caret.segment + 1..]);
        self.segments = normalize(segments);

        Caret::new(caret.segment + 2, 0)
    }

    /// Remove the reference at `index`, merging the text around it.
    ///
    /// Returns the caret at the join point, or `None` (buffer untouched) if
    /// `index` does not address a reference.
    pub fn remove_reference(&mut self, index: usize) -> Option<Caret> {
        self.segments.get(index)?.as_reference()?;
        let join = Caret::new(index - 1, self.text_len(index - 1));
        self.segments.remove(index);
        self.segments = normalize(std::mem::take(&mut self.segments));
        Some(join)
    }

    /// Replace the alphabetic run that ends at `caret` with `replacement`.
    ///
    /// Used for function insertion: with a replacement like `ROUND()` the
    /// returned caret sits just inside the parentheses. Without a trailing
    /// run the replacement is inserted at the caret.
    pub fn replace_trailing_word(&mut self, caret: Caret, replacement: &str) -> Caret {
        let caret = self.clamp_caret(caret);
        let current = self.text(caret.segment).unwrap_or_default();
        let end = char_to_byte(current, caret.offset);
        let run = trailing_alpha_run(&current[..end]);
        let start = end - run.len();
        let start_chars = caret.offset - run.chars().count();

        let value = format!("{}{}{}", &current[..start], replacement, &current[end..]);
        self.replace_text(caret.segment, value);

        let mut offset = start_chars + replacement.chars().count();
        if replacement.ends_with("()") {
            offset -= 1;
        }
        Caret::new(caret.segment, offset)
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl<'de> Deserialize<'de> for Buffer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let segments = Vec::<Segment>::deserialize(deserializer)?;
        Ok(Self::from_segments(segments))
    }
}

/// Field ids referenced by a canonical expression string, in order.
pub fn referenced_fields(expression: &str) -> Vec<String> {
    Buffer::parse(expression)
        .references()
        .map(str::to_string)
        .collect()
}

/// `@Label` rendering of a canonical expression string.
pub fn render_with_labels(expression: &str, catalog: &FieldCatalog) -> String {
    Buffer::parse(expression).render_with_labels(catalog)
}

/// The trailing run of ASCII letters in `text`.
pub(crate) fn trailing_alpha_run(text: &str) -> &str {
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .last()
        .map_or(text.len(), |(i, _)| i);
    &text[start..]
}

/// Convert a char index to a byte offset, clamping to the end.
pub(crate) fn char_to_byte(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// UTF-16 code units before byte offset `byte`, the unit JavaScript strings index by.
pub fn byte_to_utf16(s: &str, byte: usize) -> usize {
    s.char_indices()
        .take_while(|(i, _)| *i < byte)
        .map(|(_, c)| c.len_utf16())
        .sum()
}

/// Char offset of the position `units` UTF-16 code units into `s`.
///
/// A position inside a surrogate pair rounds up to the end of that char.
pub fn utf16_to_char(s: &str, units: usize) -> usize {
    let mut seen = 0;
    for (index, c) in s.chars().enumerate() {
        if seen >= units {
            return index;
        }
        seen += c.len_utf16();
    }
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Field, FieldType};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_empty_string() {
        let buffer = Buffer::parse("");
        assert_eq!(buffer.segments(), &[Segment::text("")]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_parse_mixed() {
        let buffer = Buffer::parse("{a} + {b}");
        assert_eq!(
            buffer.segments(),
            &[
                Segment::text(""),
                Segment::reference("a"),
                Segment::text(" + "),
                Segment::reference("b"),
                Segment::text(""),
            ]
        );
    }

    #[test]
    fn test_parse_keeps_malformed_braces_as_text() {
        for source in ["{", "}", "{}", "{{a}", "a}{b", "{a{b}}", "{ unterminated"] {
            assert_eq!(Buffer::parse(source).serialize(), source);
        }
        assert_eq!(Buffer::parse("{{a}").references().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(Buffer::parse("{}").references().count(), 0);
    }

    #[test]
    fn test_roundtrip_law() {
        for source in [
            "",
            "1 + 1",
            "{f_loan_amount} * 0.01 + ROUND({f_rate}, 2)",
            "{a}{b}",
            "  {x}  ",
            "é{ü}ß",
        ] {
            let once = Buffer::parse(source).serialize();
            assert_eq!(once, source);
            assert_eq!(Buffer::parse(&once), Buffer::parse(source));
        }
    }

    #[test]
    fn test_normalize_idempotent() {
        let raw = vec![
            Segment::reference("a"),
            Segment::reference("b"),
            Segment::text("x"),
            Segment::text("y"),
            Segment::reference("c"),
        ];
        let once = normalize(raw);
        assert_eq!(normalize(once.clone()), once);
        assert_eq!(
            once,
            vec![
                Segment::text(""),
                Segment::reference("a"),
                Segment::text(""),
                Segment::reference("b"),
                Segment::text("xy"),
                Segment::reference("c"),
                Segment::text(""),
            ]
        );
    }

    #[test]
    fn test_normalize_empty_yields_text_slot() {
        assert_eq!(normalize(Vec::new()), vec![Segment::text("")]);
    }

    #[test]
    fn test_insert_reference_splits_text() {
        let mut buffer = Buffer::parse("1 + 2");
        let caret = buffer.insert_reference(Caret::new(0, 4), "f");
        assert_eq!(buffer.serialize(), "1 + {f}2");
        assert_eq!(caret, Caret::new(2, 0));
        assert_eq!(buffer.text(caret.segment), Some("2"));
    }

    #[test]
    fn test_insert_reference_clamps_bad_caret() {
        let mut buffer = Buffer::parse("ab");
        let caret = buffer.insert_reference(Caret::new(9, 9), "f");
        assert_eq!(buffer.serialize(), "ab{f}");
        assert_eq!(caret, Caret::new(2, 0));
    }

    #[test]
    fn test_remove_reference_merges_text() {
        let mut buffer = Buffer::parse("1 + {f} * 2");
        let caret = buffer.remove_reference(1);
        assert_eq!(buffer.serialize(), "1 +  * 2");
        assert_eq!(buffer.len(), 1);
        assert_eq!(caret, Some(Caret::new(0, 4)));
    }

    #[test]
    fn test_remove_reference_rejects_non_reference() {
        let mut buffer = Buffer::parse("{f}");
        assert_eq!(buffer.remove_reference(0), None);
        assert_eq!(buffer.remove_reference(7), None);
        assert_eq!(buffer.serialize(), "{f}");
    }

    #[test]
    fn test_replace_trailing_word_places_caret_in_parens() {
        let mut buffer = Buffer::parse("1 + rou");
        let caret = buffer.replace_trailing_word(Caret::new(0, 7), "ROUND()");
        assert_eq!(buffer.serialize(), "1 + ROUND()");
        assert_eq!(caret, Caret::new(0, 10));
    }

    #[test]
    fn test_replace_trailing_word_keeps_text_after_caret() {
        let mut buffer = Buffer::parse("ma + 1");
        let caret = buffer.replace_trailing_word(Caret::new(0, 2), "MAX()");
        assert_eq!(buffer.serialize(), "MAX() + 1");
        assert_eq!(caret, Caret::new(0, 4));
    }

    #[test]
    fn test_absolute_offset_counts_references() {
        let buffer = Buffer::parse("{ab} + x");
        assert_eq!(buffer.absolute_offset(Caret::new(2, 3)), 7);
        assert_eq!(buffer.absolute_offset(Caret::new(0, 0)), 0);
    }

    #[test]
    fn test_insert_text_multibyte() {
        let mut buffer = Buffer::parse("é");
        let caret = buffer.insert_text(Caret::new(0, 1), "ü");
        assert_eq!(buffer.serialize(), "éü");
        assert_eq!(caret, Caret::new(0, 2));
    }

    #[test]
    fn test_render_with_labels() {
        let catalog =
            FieldCatalog::new(vec![Field::new("f_rate", "Rate", FieldType::Percentage)]).unwrap();
        assert_eq!(
            render_with_labels("ROUND({f_rate}, 2) + {gone}", &catalog),
            "ROUND(@Rate, 2) + @gone"
        );
    }

    #[test]
    fn test_deserialize_normalizes() {
        let buffer: Buffer = serde_json::from_str(
            r#"[{"kind": "reference", "fieldId": "a"}, {"kind": "text", "value": "x"}, {"kind": "text", "value": "y"}]"#,
        )
        .unwrap();
        assert_eq!(buffer.serialize(), "{a}xy");
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_trailing_alpha_run() {
        assert_eq!(trailing_alpha_run("1 + rou"), "rou");
        assert_eq!(trailing_alpha_run("SUM(1, "), "");
        assert_eq!(trailing_alpha_run("x2"), "");
    }

    #[test]
    fn test_utf16_offsets() {
        let s = "é𝑥 + {f}";
        // é is 2 bytes / 1 unit, 𝑥 is 4 bytes / 2 units
        assert_eq!(byte_to_utf16(s, 0), 0);
        assert_eq!(byte_to_utf16(s, 2), 1);
        assert_eq!(byte_to_utf16(s, 6), 3);
        assert_eq!(byte_to_utf16(s, s.len()), 9);

        assert_eq!(utf16_to_char(s, 1), 1);
        assert_eq!(utf16_to_char(s, 3), 2);
        assert_eq!(utf16_to_char(s, 2), 2);
        assert_eq!(utf16_to_char(s, 99), 8);
    }
}
