//! Error types and error reporting for formulas.
//!
//! This module provides the validator's error type and pretty error reporting
//! using the [ariadne](https://crates.io/crates/ariadne) crate.
//!
//! # Error Types
//!
//! - [`FormulaError`] - Syntax errors produced by [`validate`](crate::validate)
//! - [`CatalogError`] - Failures loading a host-supplied function table or field catalog
//!
//! # Pretty Printing
//!
//! Use [`ErrorReporter`] for user-friendly output:
//!
//! ```rust
//! use pricing_logic_formula::{validate, ErrorReporter, FunctionRegistry};
//!
//! let source = "ROUND({f_rate})";
//! let registry = FunctionRegistry::builtin();
//! let err = validate(source, &registry).unwrap_err();
//!
//! let reporter = ErrorReporter::new("rate", source);
//! let text = reporter.render(&err).unwrap();
//! assert!(text.contains("ROUND() requires 2 arguments, got 1"));
//! ```

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use std::ops::Range;
use thiserror::Error;

/// A syntax error in a canonical expression string.
///
/// The `Display` text of every variant is the exact message shown next to the
/// expression input. Spans are byte ranges into the canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("Unexpected closing parenthesis")]
    UnexpectedClosingParen { span: Range<usize> },

    #[error("Unclosed parenthesis")]
    UnclosedParen { span: Range<usize> },

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String, span: Range<usize> },

    #[error("{name}() requires {required} {}, got {got}", argument_noun(.required))]
    TooFewArguments {
        name: String,
        required: usize,
        got: usize,
        span: Range<usize>,
    },

    #[error("Unexpected text: \"{word}\" — use functions, @inputs, numbers, and operators only")]
    UnexpectedText { word: String, span: Range<usize> },

    #[error("Unresolved @ mention — select an input from the dropdown")]
    UnresolvedMention { span: Range<usize> },

    #[error("Expression ends with an operator")]
    TrailingOperator { span: Range<usize> },
}

fn argument_noun(n: &usize) -> &'static str {
    if *n == 1 {
        "argument"
    } else {
        "arguments"
    }
}

impl FormulaError {
    /// Byte range of the offending token.
    pub fn span(&self) -> Range<usize> {
        match self {
            FormulaError::UnexpectedClosingParen { span }
            | FormulaError::UnclosedParen { span }
            | FormulaError::UnknownFunction { span, .. }
            | FormulaError::TooFewArguments { span, .. }
            | FormulaError::UnexpectedText { span, .. }
            | FormulaError::UnresolvedMention { span }
            | FormulaError::TrailingOperator { span } => span.clone(),
        }
    }

    /// Short stable code for hosts that localise messages.
    pub fn code(&self) -> &'static str {
        match self {
            FormulaError::UnexpectedClosingParen { .. } => "unexpected_closing_paren",
            FormulaError::UnclosedParen { .. } => "unclosed_paren",
            FormulaError::UnknownFunction { .. } => "unknown_function",
            FormulaError::TooFewArguments { .. } => "too_few_arguments",
            FormulaError::UnexpectedText { .. } => "unexpected_text",
            FormulaError::UnresolvedMention { .. } => "unresolved_mention",
            FormulaError::TrailingOperator { .. } => "trailing_operator",
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            FormulaError::UnknownFunction { .. } => {
                Some("type a letter to see the available functions")
            }
            FormulaError::UnexpectedText { .. } => Some("reference inputs with @"),
            _ => None,
        }
    }
}

/// Errors loading host-supplied catalog data.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Function name '{name}' must be an uppercase identifier")]
    InvalidFunctionName { name: String },

    #[error("Function '{name}' is defined more than once")]
    DuplicateFunction { name: String },

    #[error("Function '{name}' uses the variadic marker \"...\" before its last parameter")]
    MisplacedVariadicMarker { name: String },

    #[error("Field '{id}' is defined more than once")]
    DuplicateField { id: String },
}

/// Error reporter that uses ariadne for pretty error output.
pub struct ErrorReporter<'src> {
    source_name: String,
    source: &'src str,
}

impl<'src> ErrorReporter<'src> {
    /// Create a new error reporter for one expression.
    pub fn new(source_name: impl Into<String>, source: &'src str) -> Self {
        Self {
            source_name: source_name.into(),
            source,
        }
    }

    fn build(&self, error: &FormulaError, color: bool) -> Report<'_, (&String, Range<usize>)> {
        let span = clamp_span(error.span(), self.source.len());

        let mut report = Report::build(ReportKind::Error, &self.source_name, span.start)
            .with_config(
                Config::default()
                    .with_color(color)
                    .with_index_type(IndexType::Byte),
            )
            .with_code(error.code())
            .with_message(error.to_string())
            .with_label(
                Label::new((&self.source_name, span))
                    .with_color(Color::Red)
                    .with_message("here"),
            );

        if let Some(hint) = error.hint() {
            report = report.with_help(hint);
        }

        report.finish()
    }

    /// Report a formula error to stderr.
    pub fn report(&self, error: &FormulaError) -> std::io::Result<()> {
        self.build(error, true)
            .eprint((&self.source_name, Source::from(self.source)))
    }

    /// Render a formula error into a colourless string.
    pub fn render(&self, error: &FormulaError) -> std::io::Result<String> {
        let mut buf = Vec::new();
        self.build(error, false)
            .write((&self.source_name, Source::from(self.source)), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn clamp_span(span: Range<usize>, len: usize) -> Range<usize> {
    let start = span.start.min(len);
    let end = span.end.clamp(start, len);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message_pluralises() {
        let two = FormulaError::TooFewArguments {
            name: "ROUND".into(),
            required: 2,
            got: 1,
            span: 0..8,
        };
        assert_eq!(two.to_string(), "ROUND() requires 2 arguments, got 1");

        let one = FormulaError::TooFewArguments {
            name: "ABS".into(),
            required: 1,
            got: 0,
            span: 0..5,
        };
        assert_eq!(one.to_string(), "ABS() requires 1 argument, got 0");
    }

    #[test]
    fn test_unexpected_text_message() {
        let err = FormulaError::UnexpectedText {
            word: "abc".into(),
            span: 0..3,
        };
        assert_eq!(
            err.to_string(),
            "Unexpected text: \"abc\" — use functions, @inputs, numbers, and operators only"
        );
    }

    #[test]
    fn test_render_contains_message() {
        let source = "1 +";
        let err = FormulaError::TrailingOperator { span: 2..3 };
        let text = ErrorReporter::new("expr", source).render(&err).unwrap();
        assert!(text.contains("Expression ends with an operator"));
    }

    #[test]
    fn test_render_multibyte_source_keeps_snippet() {
        let source = "{é€ü} + ééé + FOO(1)";
        let err = crate::validate_builtin(source).unwrap_err();
        assert_eq!(err.span(), 21..24);

        let text = ErrorReporter::new("expr", source).render(&err).unwrap();
        assert!(text.contains("Unknown function: FOO"));
        assert!(text.contains(source), "snippet missing from:\n{}", text);
        assert!(text.contains("here"), "label missing from:\n{}", text);
    }

    #[test]
    fn test_clamp_span_out_of_range() {
        assert_eq!(clamp_span(10..20, 4), 4..4);
        assert_eq!(clamp_span(1..20, 4), 1..4);
    }
}
