//! Lexer for canonical expression strings.
//!
//! This module tokenizes formulas such as
//! `{f_loan_amount} * 0.01 + ROUND({f_rate}, 2)`, handling:
//!
//! - Field references (`{fieldId}`), lexed as a single opaque operand
//! - Numbers (`42`, `0.01`)
//! - Identifiers (function names and stray words)
//! - Arithmetic and comparison operators
//! - Parentheses, commas and the `@` mention marker
//!
//! The lexer is total: any character it does not recognise becomes
//! [`Token::Other`], so every input yields a token stream. Whitespace is
//! skipped.
//!
//! # Example
//!
//! ```rust
//! use pricing_logic_formula::lexer::{tokenize, Token};
//!
//! let tokens: Vec<_> = tokenize("ROUND({f_rate}, 2)").into_iter().map(|(t, _)| t).collect();
//! assert_eq!(tokens[0], Token::Ident("ROUND"));
//! assert_eq!(tokens[2], Token::Reference("f_rate"));
//! ```
//!
//! # Token Types
//!
//! | Category | Examples |
//! |----------|----------|
//! | Operands | `{f_rate}`, `12.5`, `ROUND` |
//! | Arithmetic | `+`, `-`, `*`, `/`, `^`, `%` |
//! | Comparison | `=`, `==`, `!=`, `<>`, `<`, `>`, `<=`, `>=` |
//! | Punctuation | `(`, `)`, `,`, `@` |

use chumsky::prelude::*;
use std::ops::Range;

/// A token in a canonical expression string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'src> {
    // Operands
    Number(&'src str),
    Ident(&'src str),
    Reference(&'src str), // {fieldId}, content without braces

    // Arithmetic
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Caret,   // ^
    Percent, // %

    // Comparison
    Eq, // = or ==
    Ne, // != or <>
    Lt, // <
    Gt, // >
    Le, // <=
    Ge, // >=

    // Punctuation
    LParen, // (
    RParen, // )
    Comma,  // ,
    At,     // @

    // Anything else
    Other(char),
}

impl Token<'_> {
    /// Tokens an expression may not end with.
    pub fn is_dangling_operator(&self) -> bool {
        matches!(
            self,
            Token::Plus | Token::Minus | Token::Star | Token::Slash | Token::Comma
        )
    }
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(s) => write!(f, "{}", s),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Reference(id) => write!(f, "{{{}}}", id),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::Percent => write!(f, "%"),
            Token::Eq => write!(f, "="),
            Token::Ne => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Le => write!(f, "<="),
            Token::Ge => write!(f, ">="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::At => write!(f, "@"),
            Token::Other(c) => write!(f, "{}", c),
        }
    }
}

/// Span type for tokens.
pub type Span = SimpleSpan<usize>;

/// A token with its span.
pub type Spanned<T> = (T, Span);

/// Create the lexer parser.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<Spanned<Token<'src>>>, extra::Err<Rich<'src, char, Span>>> {
    // {fieldId}; an unterminated or empty brace falls through to `other`
    let reference = just('{')
        .ignore_then(none_of("{}").repeated().at_least(1).to_slice())
        .then_ignore(just('}'))
        .map(Token::Reference);

    let number = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(Token::Number);

    let ident = text::ident().map(Token::Ident);

    // Multi-character operators (must come before single char versions)
    let multi_char_ops = choice((
        just("==").to(Token::Eq),
        just("!=").to(Token::Ne),
        just("<>").to(Token::Ne),
        just("<=").to(Token::Le),
        just(">=").to(Token::Ge),
    ));

    let single_char_ops = choice((
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('^').to(Token::Caret),
        just('%').to(Token::Percent),
        just('=').to(Token::Eq),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
        just('@').to(Token::At),
    ));

    let other = any().map(Token::Other);

    let token = choice((reference, number, ident, multi_char_ops, single_char_ops, other));

    text::whitespace().ignore_then(
        token
            .map_with(|tok, e| (tok, e.span()))
            .then_ignore(text::whitespace())
            .repeated()
            .collect(),
    )
}

/// Tokenize an expression into tokens with byte ranges.
///
/// Never fails: the lexer has a catch-all token, so a rejected parse can only
/// mean an internal bug, which is logged and yields the tokens recovered so far.
pub fn tokenize(source: &str) -> Vec<(Token<'_>, Range<usize>)> {
    let (tokens, errors) = lexer().parse(source).into_output_errors();
    if !errors.is_empty() {
        log::warn!("lexer recovered from {} error(s) in {:?}", errors.len(), source);
    }
    tokens
        .unwrap_or_default()
        .into_iter()
        .map(|(tok, span)| (tok, span.start..span.end))
        .collect()
}

/// Whether the token at `index` is an identifier immediately followed by `(`.
///
/// Whitespace between the name and the parenthesis breaks the call.
pub fn is_call(tokens: &[(Token<'_>, Range<usize>)], index: usize) -> bool {
    match (tokens.get(index), tokens.get(index + 1)) {
        (Some((Token::Ident(_), name)), Some((Token::LParen, paren))) => name.end == paren.start,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token<'_>> {
        tokenize(input).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("{f_loan} * 0.01"),
            vec![Token::Reference("f_loan"), Token::Star, Token::Number("0.01")]
        );
    }

    #[test]
    fn test_function_call() {
        assert_eq!(
            kinds("ROUND({f_rate}, 2)"),
            vec![
                Token::Ident("ROUND"),
                Token::LParen,
                Token::Reference("f_rate"),
                Token::Comma,
                Token::Number("2"),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != <> < > <= >= = + - * / ^ %"),
            vec![
                Token::Eq,
                Token::Ne,
                Token::Ne,
                Token::Lt,
                Token::Gt,
                Token::Le,
                Token::Ge,
                Token::Eq,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Caret,
                Token::Percent,
            ]
        );
    }

    #[test]
    fn test_unterminated_brace_is_not_a_reference() {
        assert_eq!(
            kinds("{abc"),
            vec![Token::Other('{'), Token::Ident("abc")]
        );
        assert_eq!(kinds("{}"), vec![Token::Other('{'), Token::Other('}')]);
    }

    #[test]
    fn test_mention_marker() {
        assert_eq!(kinds("@Loan"), vec![Token::At, Token::Ident("Loan")]);
    }

    #[test]
    fn test_whitespace_only_and_empty() {
        assert!(kinds("").is_empty());
        assert!(kinds("  \t\n ").is_empty());
    }

    #[test]
    fn test_unknown_characters_are_kept() {
        assert_eq!(kinds("1 # 2"), vec![Token::Number("1"), Token::Other('#'), Token::Number("2")]);
        assert_eq!(kinds("€"), vec![Token::Other('€')]);
    }

    #[test]
    fn test_spans_are_byte_ranges() {
        let tokens = tokenize("  MAX(1)");
        assert_eq!(tokens[0].1, 2..5);
        assert_eq!(tokens[1].1, 5..6);
    }

    #[test]
    fn test_is_call_requires_adjacent_paren() {
        let tokens = tokenize("MAX(1) MAX (1)");
        assert!(is_call(&tokens, 0));
        assert!(!is_call(&tokens, 4));
        assert!(!is_call(&tokens, 2));
    }

    #[test]
    fn test_display_reproduces_source_text() {
        let shown: Vec<String> = kinds("ROUND({f_rate}, 2) <> 1")
            .iter()
            .map(Token::to_string)
            .collect();
        assert_eq!(shown, ["ROUND", "(", "{f_rate}", ",", "2", ")", "!=", "1"]);
    }
}
