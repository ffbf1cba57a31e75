//! Lexer for custom-variable formulas
//!
//! The lexer converts a formula string into a stream of tokens, handling:
//! - Numeric literals (int, float, scientific notation)
//! - Column, method and function identifiers
//! - Arithmetic operators and delimiters
//! - Source location tracking

#![allow(clippy::cast_possible_truncation)] // Formulas are short; u32 offsets are plenty

mod span;
mod token;

pub use span::Span;
pub use token::TokenKind;

use logos::Logos;
use thiserror::Error;

/// A token with its kind, span, and source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the formula
    pub span: Span,
    /// The source text of the token
    pub lexeme: String,
}

impl Token {
    /// Create a new token
    #[must_use]
    pub fn new(kind: TokenKind, span: Span, lexeme: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            lexeme: lexeme.into(),
        }
    }
}

/// Lexer error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(String),
}

/// A lexer error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedError {
    pub error: LexError,
    pub span: Span,
}

impl SpannedError {
    #[must_use]
    pub fn new(error: LexError, span: Span) -> Self {
        Self { error, span }
    }
}

impl std::fmt::Display for SpannedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.error, self.span)
    }
}

impl std::error::Error for SpannedError {}

/// The formula lexer
pub struct Lexer;

impl Lexer {
    /// Tokenize the entire formula, returning all tokens and any errors
    ///
    /// The token stream always ends with a single `Eof` token. Invalid
    /// characters produce an `Error` token and a matching `SpannedError`.
    #[must_use]
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<SpannedError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        let mut logos_lexer = TokenKind::lexer(source);

        while let Some(result) = logos_lexer.next() {
            let span = Span::from_range(logos_lexer.span());
            let lexeme = logos_lexer.slice();
            match result {
                Ok(kind) => tokens.push(Token::new(kind, span, lexeme)),
                Err(()) => {
                    errors.push(SpannedError::new(
                        LexError::UnexpectedChar(lexeme.to_string()),
                        span,
                    ));
                    tokens.push(Token::new(TokenKind::Error, span, lexeme));
                }
            }
        }

        let end = source.len() as u32;
        tokens.push(Token::new(TokenKind::Eof, Span::new(end, end), ""));
        (tokens, errors)
    }
}
