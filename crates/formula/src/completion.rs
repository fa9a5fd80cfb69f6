//! Context-sensitive autocomplete.
//!
//! On every edit or caret move the host asks for the [`Overlay`] to show.
//! Exactly one overlay is active at a time, resolved in priority order:
//!
//! 1. **Mention menu**: the caret follows `@` plus zero or more word
//!    characters. Candidates are fields whose id or label contains the query.
//! 2. **Function menu**: the caret follows a run of letters that prefixes at
//!    least one registry function.
//! 3. **Signature hint**: the caret sits inside the argument list of a
//!    registry function that declares parameters.
//!
//! Mention and function detection look only at the text segment holding the
//! caret. The signature hint looks at the whole canonical string, so a call
//! may span references.

use crate::catalog::{Field, FieldCatalog};
use crate::functions::{FunctionDescriptor, FunctionRegistry};
use crate::segment::{char_to_byte, trailing_alpha_run, Buffer, Caret, Segment};
use serde::Serialize;
use std::ops::Range;

/// The single editor overlay to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    None,
    MentionMenu {
        query: String,
        candidates: Vec<Field>,
    },
    FunctionMenu {
        query: String,
        candidates: Vec<FunctionDescriptor>,
    },
    SignatureHint(SignatureHint),
}

impl Overlay {
    pub fn is_none(&self) -> bool {
        matches!(self, Overlay::None)
    }

    fn kind(&self) -> &'static str {
        match self {
            Overlay::None => "none",
            Overlay::MentionMenu { .. } => "mention_menu",
            Overlay::FunctionMenu { .. } => "function_menu",
            Overlay::SignatureHint(_) => "signature_hint",
        }
    }
}

/// Signature of the call enclosing the caret, with one parameter emphasised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureHint {
    pub name: String,
    pub params: Vec<String>,
    /// Index into `params`; always in range.
    pub active: usize,
    pub description: String,
}

impl SignatureHint {
    fn new(function: &FunctionDescriptor, raw_index: usize) -> Self {
        let last = function.params.len().saturating_sub(1);
        Self {
            name: function.name.clone(),
            params: function.params.clone(),
            active: raw_index.min(last),
            description: function.description.clone(),
        }
    }

    /// Plain label, e.g. `ROUND(number, decimals)`.
    pub fn label(&self) -> String {
        format!("{}({})", self.name, self.params.join(", "))
    }

    pub fn active_param(&self) -> &str {
        &self.params[self.active]
    }

    /// Byte range of the active parameter inside [`label`](Self::label).
    pub fn active_range(&self) -> Range<usize> {
        let mut start = self.name.len() + 1;
        for param in &self.params[..self.active] {
            start += param.len() + 2;
        }
        start..start + self.params[self.active].len()
    }

    /// Label with the active parameter passed through `emphasize`.
    pub fn render_with(&self, emphasize: impl Fn(&str) -> String) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| if i == self.active { emphasize(p) } else { p.clone() })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// An active `@` mention: the byte index of the `@` and the query after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mention<'a> {
    pub at: usize,
    pub query: &'a str,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Find the mention being typed, given the text before the caret.
///
/// Active when everything between the last `@` and the caret is word
/// characters; any operator, space or parenthesis ends it.
pub fn active_mention(before_caret: &str) -> Option<Mention<'_>> {
    let at = before_caret.rfind('@')?;
    let query = &before_caret[at + 1..];
    query.chars().all(is_word_char).then_some(Mention { at, query })
}

/// The function-name prefix being typed, given the text before the caret.
///
/// Suppressed while a mention is active so `@Rate` is never read as the
/// start of a function name.
pub fn function_prefix(before_caret: &str) -> Option<&str> {
    if active_mention(before_caret).is_some() {
        return None;
    }
    let run = trailing_alpha_run(before_caret);
    (!run.is_empty()).then_some(run)
}

/// Canonical string as chars with every reference span replaced by `0`s.
///
/// Keeps char offsets identical to the serialized form while making sure ids
/// can never contribute parentheses or commas.
fn masked_chars(buffer: &Buffer) -> Vec<char> {
    let mut out = Vec::new();
    for segment in buffer.segments() {
        match segment {
            Segment::Text { value } => out.extend(value.chars()),
            Segment::Reference { field_id } => {
                out.extend(std::iter::repeat('0').take(field_id.chars().count() + 2))
            }
        }
    }
    out
}

/// Signature hint for the call enclosing char offset `caret` of `chars`.
fn detect_in_chars(
    chars: &[char],
    caret: usize,
    registry: &FunctionRegistry,
) -> Option<SignatureHint> {
    let caret = caret.min(chars.len());

    // nearest unmatched '(' before the caret
    let mut depth = 0usize;
    let mut open = None;
    for i in (0..caret).rev() {
        match chars[i] {
            ')' => depth += 1,
            '(' if depth == 0 => {
                open = Some(i);
                break;
            }
            '(' => depth -= 1,
            _ => {}
        }
    }
    let open = open?;

    let name_start = chars[..open]
        .iter()
        .rposition(|c| !is_word_char(*c))
        .map_or(0, |i| i + 1);
    if name_start == open {
        return None;
    }
    let name: String = chars[name_start..open].iter().collect();
    let function = registry.get(&name)?;
    if !function.takes_arguments() {
        return None;
    }

    let mut depth = 0usize;
    let mut commas = 0;
    for c in &chars[open + 1..caret] {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => commas += 1,
            _ => {}
        }
    }

    Some(SignatureHint::new(function, commas))
}

/// Signature hint for the call enclosing `caret` in `buffer`.
pub fn detect_active_function(
    buffer: &Buffer,
    caret: Caret,
    registry: &FunctionRegistry,
) -> Option<SignatureHint> {
    let chars = masked_chars(buffer);
    detect_in_chars(&chars, buffer.absolute_offset(caret), registry)
}

/// Signature hint for a canonical expression with the caret at char offset `caret`.
pub fn detect_active_function_in(
    expression: &str,
    caret: usize,
    registry: &FunctionRegistry,
) -> Option<SignatureHint> {
    let chars = masked_chars(&Buffer::parse(expression));
    detect_in_chars(&chars, caret, registry)
}

/// Map a char offset in a canonical string to a caret in its parsed buffer.
///
/// An offset inside a reference lands just after it.
pub fn caret_for_offset(expression: &str, offset: usize) -> Caret {
    let buffer = Buffer::parse(expression);
    let mut remaining = offset;
    for (index, segment) in buffer.segments().iter().enumerate() {
        match segment {
            Segment::Text { value } => {
                let len = value.chars().count();
                if remaining <= len {
                    return Caret::new(index, remaining);
                }
                remaining -= len;
            }
            Segment::Reference { field_id } => {
                let len = field_id.chars().count() + 2;
                if remaining < len {
                    return Caret::new(index + 1, 0);
                }
                remaining -= len;
            }
        }
    }
    buffer.end_caret()
}

fn mention_menu(before: &str, catalog: &FieldCatalog) -> Option<Overlay> {
    let mention = active_mention(before)?;
    Some(Overlay::MentionMenu {
        query: mention.query.to_string(),
        candidates: catalog.search(mention.query).cloned().collect(),
    })
}

fn function_menu(before: &str, registry: &FunctionRegistry) -> Option<Overlay> {
    let prefix = function_prefix(before)?;
    let found = registry.with_prefix(prefix);
    if found.is_empty() {
        return None;
    }
    Some(Overlay::FunctionMenu {
        query: prefix.to_string(),
        candidates: found.into_iter().cloned().collect(),
    })
}

/// Resolve the overlay for `caret` in `buffer`.
pub fn resolve_overlay(
    buffer: &Buffer,
    caret: Caret,
    catalog: &FieldCatalog,
    registry: &FunctionRegistry,
) -> Overlay {
    let caret = buffer.clamp_caret(caret);
    let text = buffer.text(caret.segment).unwrap_or_default();
    let before = &text[..char_to_byte(text, caret.offset)];

    let overlay = mention_menu(before, catalog)
        .or_else(|| function_menu(before, registry))
        .or_else(|| detect_active_function(buffer, caret, registry).map(Overlay::SignatureHint))
        .unwrap_or(Overlay::None);

    log::trace!(
        "overlay at {:?} in {:?}: {}",
        caret,
        buffer.serialize(),
        overlay.kind()
    );
    overlay
}
