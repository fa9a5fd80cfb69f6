//! Caret-aware editing session over a [`Buffer`].
//!
//! The editor owns one buffer and one caret. The caret always rests in a text
//! segment; references are atomic, so arrow keys step over them and deletion
//! removes them whole.

use crate::catalog::FieldCatalog;
use crate::completion::{active_mention, resolve_overlay, Overlay};
use crate::functions::FunctionRegistry;
use crate::segment::{char_to_byte, Buffer, Caret};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressionEditor {
    buffer: Buffer,
    caret: Caret,
}

impl ExpressionEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a stored expression with the caret at the end.
    pub fn from_expression(expression: &str) -> Self {
        Self::from_buffer(Buffer::parse(expression))
    }

    pub fn from_buffer(buffer: Buffer) -> Self {
        let caret = buffer.end_caret();
        Self { buffer, caret }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn caret(&self) -> Caret {
        self.caret
    }

    /// The canonical expression string.
    pub fn expression(&self) -> String {
        self.buffer.serialize()
    }

    /// Caret position as a char offset into [`expression`](Self::expression).
    pub fn absolute_offset(&self) -> usize {
        self.buffer.absolute_offset(self.caret)
    }

    pub fn set_caret(&mut self, caret: Caret) {
        self.caret = self.buffer.clamp_caret(caret);
    }

    pub fn insert_text(&mut self, text: &str) {
        self.caret = self.buffer.insert_text(self.caret, text);
    }

    pub fn move_left(&mut self) {
        let Caret { segment, offset } = self.caret;
        if offset > 0 {
            self.caret = Caret::new(segment, offset - 1);
        } else if segment >= 2 {
            self.caret = Caret::new(segment - 2, self.buffer.text_len(segment - 2));
        }
    }

    pub fn move_right(&mut self) {
        let Caret { segment, offset } = self.caret;
        if offset < self.buffer.text_len(segment) {
            self.caret = Caret::new(segment, offset + 1);
        } else if segment + 2 < self.buffer.len() {
            self.caret = Caret::new(segment + 2, 0);
        }
    }

    pub fn move_to_start(&mut self) {
        self.caret = Caret::default();
    }

    pub fn move_to_end(&mut self) {
        self.caret = self.buffer.end_caret();
    }

    /// Delete backwards from the caret.
    ///
    /// At offset 0 the reference before the caret is removed. An empty
    /// leading text falls back to the reference after it.
    pub fn backspace(&mut self) {
        let Caret { segment, offset } = self.caret;
        if offset > 0 {
            self.buffer.delete_text(segment, offset - 1, offset);
            self.caret = Caret::new(segment, offset - 1);
            return;
        }

        let target = if segment > 0 {
            Some(segment - 1)
        } else if self.buffer.text_len(segment) == 0 {
            Some(segment + 1)
        } else {
            None
        };
        if let Some(caret) = target.and_then(|index| self.buffer.remove_reference(index)) {
            self.caret = caret;
        }
    }

    /// Delete forwards from the caret, removing a reference whole.
    pub fn delete_forward(&mut self) {
        let Caret { segment, offset } = self.caret;
        if offset < self.buffer.text_len(segment) {
            self.buffer.delete_text(segment, offset, offset + 1);
        } else if let Some(caret) = self.buffer.remove_reference(segment + 1) {
            self.caret = caret;
        }
    }

    /// The overlay to show for the current caret.
    pub fn overlay(&self, catalog: &FieldCatalog, registry: &FunctionRegistry) -> Overlay {
        resolve_overlay(&self.buffer, self.caret, catalog, registry)
    }

    /// Replace the `@query` being typed with a reference to `field_id`.
    ///
    /// Without an active mention the reference is inserted at the caret.
    pub fn accept_mention(&mut self, field_id: &str) {
        let Caret { segment, offset } = self.caret;
        let text = self.buffer.text(segment).unwrap_or_default();
        let before = &text[..char_to_byte(text, offset)];

        let start = match active_mention(before) {
            Some(mention) => before[..mention.at].chars().count(),
            None => offset,
        };
        self.buffer.delete_text(segment, start, offset);
        self.caret = self
            .buffer
            .insert_reference(Caret::new(segment, start), field_id);
    }

    /// Replace the partially typed name with `NAME()`, caret inside the parentheses.
    pub fn accept_function(&mut self, name: &str) {
        let insertion = format!("{}()", name.to_ascii_uppercase());
        self.caret = self.buffer.replace_trailing_word(self.caret, &insertion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backspace_over_sole_reference() {
        let buffer = Buffer::from_segments(vec![
            Segment::text(""),
            Segment::reference("F"),
            Segment::text(""),
        ]);
        let mut editor = ExpressionEditor::from_buffer(buffer);
        assert_eq!(editor.caret(), Caret::new(2, 0));

        editor.backspace();
        assert_eq!(editor.buffer().segments(), &[Segment::text("")]);
        assert_eq!(editor.caret(), Caret::new(0, 0));

        // nothing left to delete
        editor.backspace();
        assert_eq!(editor.expression(), "");
    }

    #[test]
    fn test_backspace_keeps_surrounding_text() {
        let mut editor = ExpressionEditor::from_expression("1 + {f} * 2");
        editor.set_caret(Caret::new(2, 0));
        editor.backspace();
        assert_eq!(editor.expression(), "1 +  * 2");
        assert_eq!(editor.caret(), Caret::new(0, 4));
    }

    #[test]
    fn test_backspace_on_empty_leading_text_removes_following_reference() {
        let mut editor = ExpressionEditor::from_expression("{f} + 1");
        editor.move_to_start();
        editor.backspace();
        assert_eq!(editor.expression(), " + 1");
        assert_eq!(editor.caret(), Caret::new(0, 0));
    }

    #[test]
    fn test_backspace_at_start_of_text_is_noop() {
        let mut editor = ExpressionEditor::from_expression("12");
        editor.move_to_start();
        editor.backspace();
        assert_eq!(editor.expression(), "12");
    }

    #[test]
    fn test_backspace_char() {
        let mut editor = ExpressionEditor::from_expression("1 + é");
        editor.backspace();
        assert_eq!(editor.expression(), "1 + ");
        assert_eq!(editor.caret(), Caret::new(0, 4));
    }

    #[test]
    fn test_arrows_skip_references() {
        let mut editor = ExpressionEditor::from_expression("ab{f}cd");
        editor.set_caret(Caret::new(2, 0));
        editor.move_left();
        assert_eq!(editor.caret(), Caret::new(0, 2));
        editor.move_right();
        assert_eq!(editor.caret(), Caret::new(2, 0));
        editor.move_right();
        assert_eq!(editor.caret(), Caret::new(2, 1));
    }

    #[test]
    fn test_arrows_stop_at_bounds() {
        let mut editor = ExpressionEditor::from_expression("{f}");
        editor.move_right();
        assert_eq!(editor.caret(), Caret::new(2, 0));
        editor.move_left();
        editor.move_left();
        assert_eq!(editor.caret(), Caret::new(0, 0));
    }

    #[test]
    fn test_delete_forward() {
        let mut editor = ExpressionEditor::from_expression("a{f}b");
        editor.set_caret(Caret::new(0, 1));
        editor.delete_forward();
        assert_eq!(editor.expression(), "ab");
        assert_eq!(editor.caret(), Caret::new(0, 1));
        editor.delete_forward();
        assert_eq!(editor.expression(), "a");
        editor.delete_forward();
        assert_eq!(editor.expression(), "a");
    }

    #[test]
    fn test_set_caret_clamps() {
        let mut editor = ExpressionEditor::from_expression("{f}x");
        editor.set_caret(Caret::new(1, 0));
        assert_eq!(editor.caret(), Caret::new(2, 0));
        editor.set_caret(Caret::new(0, 99));
        assert_eq!(editor.caret(), Caret::new(0, 0));
        editor.set_caret(Caret::new(42, 0));
        assert_eq!(editor.caret(), Caret::new(2, 1));
    }

    #[test]
    fn test_accept_mention_replaces_query() {
        let mut editor = ExpressionEditor::from_expression("1 + @Lo * 2");
        editor.set_caret(Caret::new(0, 7));
        editor.accept_mention("f_loan_amount");
        assert_eq!(editor.expression(), "1 + {f_loan_amount} * 2");
        assert_eq!(editor.caret(), Caret::new(2, 0));
    }

    #[test]
    fn test_accept_mention_without_query_inserts_at_caret() {
        let mut editor = ExpressionEditor::from_expression("1 + ");
        editor.accept_mention("f_rate");
        assert_eq!(editor.expression(), "1 + {f_rate}");
        assert_eq!(editor.absolute_offset(), 12);
    }

    #[test]
    fn test_accept_function() {
        let mut editor = ExpressionEditor::from_expression("{f} + rou");
        editor.accept_function("round");
        assert_eq!(editor.expression(), "{f} + ROUND()");
        assert_eq!(editor.absolute_offset(), 12);
    }
}
