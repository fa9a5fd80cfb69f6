//! Tokenizing validator for canonical expression strings.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. Field references are opaque operands (the lexer yields one token per `{id}`)
//! 2. Empty or whitespace-only input is valid
//! 3. Parentheses balance
//! 4. Every `name(` call names a registry function
//! 5. Every call supplies at least as many arguments as the function declares
//! 6. Innermost `name(...)` calls collapse into a single operand, repeatedly,
//!    and no ASCII letter run may survive
//! 7. No `@` survives that collapse
//! 8. The expression does not end with `+ - * / ,`
//!
//! Extra arguments are tolerated, which is what lets variadic functions work
//! without a dedicated flag.

use crate::error::FormulaError;
use crate::functions::FunctionRegistry;
use crate::lexer::{is_call, tokenize, Token};
use crate::segment::byte_to_utf16;
use serde::{Deserialize, Serialize};
use std::ops::Range;

type Tokens<'a> = [(Token<'a>, Range<usize>)];

/// Validate a canonical expression string against `registry`.
pub fn validate(expression: &str, registry: &FunctionRegistry) -> Result<(), FormulaError> {
    if expression.trim().is_empty() {
        return Ok(());
    }

    let tokens = tokenize(expression);
    let result = check_parentheses(&tokens)
        .and_then(|_| check_function_names(&tokens, registry))
        .and_then(|_| check_arity(&tokens, registry))
        .and_then(|_| {
            let residual = collapse_calls(&tokens);
            check_stray_text(&residual).and_then(|_| check_mentions(&residual))
        })
        .and_then(|_| check_trailing_operator(&tokens));

    if let Err(ref err) = result {
        log::debug!("rejected formula {:?}: {}", expression, err);
    }
    result
}

/// Validate against the built-in function table.
pub fn validate_builtin(expression: &str) -> Result<(), FormulaError> {
    validate(expression, &FunctionRegistry::builtin())
}

fn check_parentheses(tokens: &Tokens<'_>) -> Result<(), FormulaError> {
    let mut open: Vec<Range<usize>> = Vec::new();
    for (tok, span) in tokens {
        match tok {
            Token::LParen => open.push(span.clone()),
            Token::RParen => {
                if open.pop().is_none() {
                    return Err(FormulaError::UnexpectedClosingParen { span: span.clone() });
                }
            }
            _ => {}
        }
    }
    match open.pop() {
        Some(span) => Err(FormulaError::UnclosedParen { span }),
        None => Ok(()),
    }
}

fn check_function_names(
    tokens: &Tokens<'_>,
    registry: &FunctionRegistry,
) -> Result<(), FormulaError> {
    for (i, (tok, span)) in tokens.iter().enumerate() {
        if let Token::Ident(name) = tok {
            if is_call(tokens, i) && !registry.contains(name) {
                return Err(FormulaError::UnknownFunction {
                    name: name.to_ascii_uppercase(),
                    span: span.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Index of the `)` matching the `(` at `open`, if any.
fn matching_paren(tokens: &Tokens<'_>, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, (tok, _)) in tokens.iter().enumerate().skip(open) {
        match tok {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Top-level argument count of the call whose parentheses are `open..=close`.
fn count_arguments(tokens: &Tokens<'_>, open: usize, close: usize) -> usize {
    if close == open + 1 {
        return 0;
    }
    let mut depth = 0usize;
    let mut commas = 0;
    for (tok, _) in &tokens[open + 1..close] {
        match tok {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 => commas += 1,
            _ => {}
        }
    }
    commas + 1
}

fn check_arity(tokens: &Tokens<'_>, registry: &FunctionRegistry) -> Result<(), FormulaError> {
    for (i, (tok, span)) in tokens.iter().enumerate() {
        let Token::Ident(name) = tok else { continue };
        if !is_call(tokens, i) {
            continue;
        }
        let Some(function) = registry.get(name) else {
            continue;
        };
        let Some(close) = matching_paren(tokens, i + 1) else {
            continue;
        };

        let got = count_arguments(tokens, i + 1, close);
        if got < function.arity() {
            return Err(FormulaError::TooFewArguments {
                name: function.name.clone(),
                required: function.arity(),
                got,
                span: span.start..tokens[close].1.end,
            });
        }
    }
    Ok(())
}

/// Position of an innermost call: a `name(` whose parentheses hold no others.
fn innermost_call(tokens: &Tokens<'_>) -> Option<(usize, usize)> {
    (0..tokens.len())
        .filter(|&i| is_call(tokens, i))
        .find_map(|i| {
            let close = i + 2 + tokens[i + 2..]
                .iter()
                .position(|(tok, _)| matches!(tok, Token::LParen | Token::RParen))?;
            (tokens[close].0 == Token::RParen).then_some((i, close))
        })
}

/// Replace innermost calls, arguments included, with a `0` operand until none remain.
///
/// A call with a parenthesised group among its arguments is never innermost,
/// so its name survives as text.
fn collapse_calls<'a>(tokens: &Tokens<'a>) -> Vec<(Token<'a>, Range<usize>)> {
    let mut residual = tokens.to_vec();
    while let Some((name, close)) = innermost_call(&residual) {
        let span = residual[name].1.start..residual[close].1.end;
        residual.splice(name..=close, [(Token::Number("0"), span)]);
    }
    residual
}

fn check_stray_text(residual: &Tokens<'_>) -> Result<(), FormulaError> {
    for (tok, span) in residual {
        let Token::Ident(word) = tok else { continue };
        let Some(start) = word.find(|c: char| c.is_ascii_alphabetic()) else {
            continue;
        };
        let len = word[start..]
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(word.len() - start);
        let at = span.start + start;
        return Err(FormulaError::UnexpectedText {
            word: word[start..start + len].to_string(),
            span: at..at + len,
        });
    }
    Ok(())
}

fn check_mentions(residual: &Tokens<'_>) -> Result<(), FormulaError> {
    match residual.iter().find(|(tok, _)| *tok == Token::At) {
        Some((_, span)) => Err(FormulaError::UnresolvedMention { span: span.clone() }),
        None => Ok(()),
    }
}

fn check_trailing_operator(tokens: &Tokens<'_>) -> Result<(), FormulaError> {
    match tokens.last() {
        Some((tok, span)) if tok.is_dangling_operator() => {
            Err(FormulaError::TrailingOperator { span: span.clone() })
        }
        _ => Ok(()),
    }
}

/// Serializable verdict for hosts that attach messages to input fields.
///
/// `start` and `end` are byte offsets into the expression unless converted
/// with [`Diagnostic::to_utf16`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub start: usize,
    pub end: usize,
}

impl From<&FormulaError> for Diagnostic {
    fn from(err: &FormulaError) -> Self {
        let span = err.span();
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            start: span.start,
            end: span.end,
        }
    }
}

impl Diagnostic {
    /// Re-express the range in UTF-16 code units of `expression`.
    pub fn to_utf16(mut self, expression: &str) -> Self {
        self.start = byte_to_utf16(expression, self.start);
        self.end = byte_to_utf16(expression, self.end);
        self
    }
}

/// Validate and convert a failure into a [`Diagnostic`].
pub fn diagnose(expression: &str, registry: &FunctionRegistry) -> Option<Diagnostic> {
    validate(expression, registry)
        .err()
        .map(|err| Diagnostic::from(&err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message(expression: &str) -> Option<String> {
        validate_builtin(expression).err().map(|e| e.to_string())
    }

    #[test]
    fn test_empty_is_valid() {
        assert_eq!(message(""), None);
        assert_eq!(message("   \t"), None);
    }

    #[test]
    fn test_arity_boundary() {
        assert_eq!(
            message("ROUND(5)").as_deref(),
            Some("ROUND() requires 2 arguments, got 1")
        );
        assert_eq!(message("ROUND(5, 2)"), None);
        assert_eq!(message("MAX(1,2,3,4)"), None);
    }

    #[test]
    fn test_empty_call_has_zero_arguments() {
        assert_eq!(
            message("ABS()").as_deref(),
            Some("ABS() requires 1 argument, got 0")
        );
        assert_eq!(message("TODAY()"), None);
    }

    #[test]
    fn test_nested_commas_do_not_count() {
        assert_eq!(
            message("ROUND(MAX(1, 2))").as_deref(),
            Some("ROUND() requires 2 arguments, got 1")
        );
        assert_eq!(message("ROUND(MAX(1, 2), 3)"), None);
    }

    #[test]
    fn test_parenthesis_balance() {
        assert_eq!(message("(1 + 2").as_deref(), Some("Unclosed parenthesis"));
        assert_eq!(
            message("1 + 2)").as_deref(),
            Some("Unexpected closing parenthesis")
        );
        assert_eq!(message("(1+2)"), None);
        assert_eq!(
            message(")(").as_deref(),
            Some("Unexpected closing parenthesis")
        );
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(message("FOO(1)").as_deref(), Some("Unknown function: FOO"));
        assert_eq!(message("foo(1)").as_deref(), Some("Unknown function: FOO"));
        assert_eq!(message("round(1.5, 0)"), None);
    }

    #[test]
    fn test_paren_check_precedes_function_check() {
        assert_eq!(message("FOO(1").as_deref(), Some("Unclosed parenthesis"));
    }

    #[test]
    fn test_reference_substitution_neutrality() {
        assert_eq!(
            validate_builtin("{f1} + {f2}"),
            validate_builtin("0 + 0")
        );
        assert_eq!(message("{f1} + {f2}"), None);
        assert_eq!(message("{f_loan_amount} * 0.01 + ROUND({f_rate}, 2)"), None);
    }

    #[test]
    fn test_dangling_operator() {
        assert_eq!(
            message("1 +").as_deref(),
            Some("Expression ends with an operator")
        );
        assert_eq!(
            message("MAX(1, 2),").as_deref(),
            Some("Expression ends with an operator")
        );
        assert_eq!(message("1 + 1"), None);
    }

    #[test]
    fn test_stray_text() {
        assert_eq!(
            message("1 + abc").as_deref(),
            Some("Unexpected text: \"abc\" — use functions, @inputs, numbers, and operators only")
        );
        // a space between name and paren breaks the call
        assert_eq!(
            message("ROUND (1, 2)").map(|m| m.starts_with("Unexpected text: \"ROUND\"")),
            Some(true)
        );
    }

    #[test]
    fn test_call_arguments_are_collapsed() {
        assert_eq!(message("ROUND(abc, 2)"), None);
        assert_eq!(message("MAX(@, 1)"), None);
        assert_eq!(message("ROUND(MAX(x, 1), 2) + 1"), None);
        assert_eq!(
            message("MAX(1, 2) + abc").map(|m| m.starts_with("Unexpected text: \"abc\"")),
            Some(true)
        );
    }

    #[test]
    fn test_call_with_grouped_argument_leaves_name() {
        assert_eq!(
            message("ROUND((1+2), 2)").map(|m| m.starts_with("Unexpected text: \"ROUND\"")),
            Some(true)
        );
        assert_eq!(
            message("ROUND(MAX(1, 2), (3))").map(|m| m.starts_with("Unexpected text: \"ROUND\"")),
            Some(true)
        );
    }

    #[test]
    fn test_stray_text_reports_letter_run() {
        let err = validate_builtin("1 + abc_1").unwrap_err();
        assert!(err.to_string().starts_with("Unexpected text: \"abc\""));
        assert_eq!(err.span(), 4..7);

        let err = validate_builtin("2 * _rate").unwrap_err();
        assert!(err.to_string().starts_with("Unexpected text: \"rate\""));
        assert_eq!(err.span(), 5..9);
    }

    #[test]
    fn test_words_without_ascii_letters_pass() {
        assert_eq!(message("1 + é"), None);
        assert_eq!(message("_"), None);
    }

    #[test]
    fn test_typed_mention_is_stray_text_first() {
        assert_eq!(
            message("@Loan * 2").map(|m| m.starts_with("Unexpected text: \"Loan\"")),
            Some(true)
        );
    }

    #[test]
    fn test_bare_mention() {
        assert_eq!(
            message("{f1} + @").as_deref(),
            Some("Unresolved @ mention — select an input from the dropdown")
        );
        assert_eq!(
            message("@12").as_deref(),
            Some("Unresolved @ mention — select an input from the dropdown")
        );
    }

    #[test]
    fn test_unterminated_reference_is_text() {
        assert_eq!(
            message("{f_rate + 1").map(|m| m.starts_with("Unexpected text: \"f\"")),
            Some(true)
        );
    }

    #[test]
    fn test_determinism() {
        for source in ["ROUND(5)", "(1", "1 + 1", "FOO()", "@"] {
            assert_eq!(validate_builtin(source), validate_builtin(source));
        }
    }

    #[test]
    fn test_error_spans() {
        let err = validate_builtin("1 + FOO(2)").unwrap_err();
        assert_eq!(err.span(), 4..7);

        let err = validate_builtin("ROUND(5) + 1").unwrap_err();
        assert_eq!(err.span(), 0..8);
    }

    #[test]
    fn test_custom_registry() {
        let registry = FunctionRegistry::from_json(
            r#"[{"name": "RATE", "displaySignature": "RATE(term)", "description": "", "params": ["term"]}]"#,
        )
        .unwrap();
        assert!(validate("RATE(12)", &registry).is_ok());
        assert!(validate("ROUND(1, 2)", &registry).is_err());
    }

    #[test]
    fn test_diagnose() {
        let diag = diagnose("1 +", &FunctionRegistry::builtin()).unwrap();
        assert_eq!(diag.code, "trailing_operator");
        assert_eq!((diag.start, diag.end), (2, 3));
        assert!(diagnose("1 + 1", &FunctionRegistry::builtin()).is_none());
    }

    #[test]
    fn test_diagnostic_in_utf16_units() {
        let source = "{é} + FOO(1)";
        let diag = diagnose(source, &FunctionRegistry::builtin()).unwrap();
        assert_eq!((diag.start, diag.end), (7, 10));

        let diag = diag.to_utf16(source);
        assert_eq!((diag.start, diag.end), (6, 9));
    }
}
