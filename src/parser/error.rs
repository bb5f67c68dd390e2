//! Parser error types

use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Syntax errors, each carrying the byte offset of the offending input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A character the tokenizer does not recognize
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar {
        /// The offending character
        ch: char,
        /// Byte offset in the source
        position: usize,
    },

    /// A string literal without a closing quote
    #[error("unterminated string literal starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote
        position: usize,
    },

    /// A block comment without a closing `*/`
    #[error("unclosed comment starting at position {position}")]
    UnclosedComment {
        /// Byte offset of the opening `/*`
        position: usize,
    },

    /// A numeric literal that could not be read
    #[error("malformed number '{literal}' at position {position}")]
    MalformedNumber {
        /// The literal as written
        literal: String,
        /// Byte offset in the source
        position: usize,
    },

    /// The parser found a token it cannot accept here
    #[error("unexpected token {found} at position {position}, expected {expected}")]
    UnexpectedToken {
        /// Description of the token found
        found: String,
        /// Description of the expected token class
        expected: &'static str,
        /// Byte offset in the source
        position: usize,
    },

    /// Input ended while the parser expected more
    #[error("unexpected end of input at position {position}, expected {expected}")]
    UnexpectedEnd {
        /// Description of the expected token class
        expected: &'static str,
        /// Byte offset of the end of input
        position: usize,
    },
}

impl ParseError {
    /// Byte offset the error refers to
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedChar { position, .. }
            | ParseError::UnterminatedString { position }
            | ParseError::UnclosedComment { position }
            | ParseError::MalformedNumber { position, .. }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEnd { position, .. } => *position,
        }
    }

    /// Create an unexpected-token error
    pub fn unexpected_token(
        found: impl Into<String>,
        expected: &'static str,
        position: usize,
    ) -> Self {
        ParseError::UnexpectedToken {
            found: found.into(),
            expected,
            position,
        }
    }
}
