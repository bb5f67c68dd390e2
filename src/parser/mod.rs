//! Filter expression parser
//!
//! A hand-written tokenizer and precedence-climbing parser turning filter
//! source text into an [`Expr`](crate::ast::Expr). The parser is pure: it
//! performs no I/O and its output depends only on the source text, so ASTs
//! are cacheable by content hash.

pub mod error;
pub mod pratt;
pub mod span;
pub mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use pratt::{parse_filter, FilterParser};
pub use span::Spanned;
pub use tokenizer::{tokenize, Token};

/// Parse a filter source string into an AST
pub fn parse(input: &str) -> ParseResult<crate::ast::Expr> {
    parse_filter(input)
}
