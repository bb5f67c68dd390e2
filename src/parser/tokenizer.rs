//! Tokenizer for filter expressions
//!
//! Hand-written scanner producing position-tagged tokens. Keywords are
//! matched case-insensitively; identifiers keep their written form (the
//! variable container lowercases on lookup).

use super::error::{ParseError, ParseResult};
use super::span::Spanned;
use std::fmt;

/// A lexical token of the filter language
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer literal (decimal, `0x`, `0b` or `0o`)
    Integer(i64),
    /// Float literal
    Float(f64),
    /// String literal, single- or double-quoted
    StringLit(String),
    /// Identifier (variable or function name)
    Identifier(String),

    /// `true` literal
    True,
    /// `false` literal
    False,
    /// `null` literal
    Null,
    /// `if` keyword
    If,
    /// `then` keyword
    Then,
    /// `else` keyword
    Else,
    /// `end` keyword
    End,
    /// Substring membership operator (`in`)
    In,
    /// Shell-wildcard match operator (`like`, alias `matches`)
    Like,
    /// Substring containment operator (`contains`)
    Contains,
    /// Regular-expression match operator (`rlike`, alias `regex`)
    Rlike,
    /// Case-insensitive regular-expression match operator (`irlike`)
    Irlike,

    /// Addition operator (`+`)
    Plus,
    /// Subtraction operator (`-`)
    Minus,
    /// Multiplication operator (`*`)
    Star,
    /// Division operator (`/`)
    Slash,
    /// Modulo operator (`%`)
    Percent,
    /// Exponentiation operator (`**`)
    Pow,
    /// Assignment operator (`:=`)
    Assign,
    /// Loose equality (`==`; single `=` is accepted as an alias)
    Eq,
    /// Strict equality (`===`)
    StrictEq,
    /// Loose inequality (`!=`)
    Ne,
    /// Strict inequality (`!==`)
    StrictNe,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Le,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    Ge,
    /// Logical AND (`&`)
    Amp,
    /// Logical OR (`|`)
    Pipe,
    /// Logical XOR (`^`)
    Caret,
    /// Boolean negation (`!`)
    Bang,
    /// Ternary condition marker (`?`)
    Question,
    /// Ternary branch separator (`:`)
    Colon,
    /// Statement separator (`;`)
    Semicolon,
    /// Argument/element separator (`,`)
    Comma,
    /// Left parenthesis
    LeftParen,
    /// Right parenthesis
    RightParen,
    /// Left square bracket
    LeftBracket,
    /// Right square bracket
    RightBracket,
}

impl Token {
    /// Keyword lookup; `matches` and `regex` are aliases
    pub fn from_keyword(word: &str) -> Option<Token> {
        match word.to_ascii_lowercase().as_str() {
            "true" => Some(Token::True),
            "false" => Some(Token::False),
            "null" => Some(Token::Null),
            "if" => Some(Token::If),
            "then" => Some(Token::Then),
            "else" => Some(Token::Else),
            "end" => Some(Token::End),
            "in" => Some(Token::In),
            "like" | "matches" => Some(Token::Like),
            "contains" => Some(Token::Contains),
            "rlike" | "regex" => Some(Token::Rlike),
            "irlike" => Some(Token::Irlike),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(i) => write!(f, "'{i}'"),
            Token::Float(x) => write!(f, "'{x}'"),
            Token::StringLit(s) => write!(f, "string '{s}'"),
            Token::Identifier(name) => write!(f, "identifier '{name}'"),
            Token::True => f.write_str("'true'"),
            Token::False => f.write_str("'false'"),
            Token::Null => f.write_str("'null'"),
            Token::If => f.write_str("'if'"),
            Token::Then => f.write_str("'then'"),
            Token::Else => f.write_str("'else'"),
            Token::End => f.write_str("'end'"),
            Token::In => f.write_str("'in'"),
            Token::Like => f.write_str("'like'"),
            Token::Contains => f.write_str("'contains'"),
            Token::Rlike => f.write_str("'rlike'"),
            Token::Irlike => f.write_str("'irlike'"),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::Percent => f.write_str("'%'"),
            Token::Pow => f.write_str("'**'"),
            Token::Assign => f.write_str("':='"),
            Token::Eq => f.write_str("'=='"),
            Token::StrictEq => f.write_str("'==='"),
            Token::Ne => f.write_str("'!='"),
            Token::StrictNe => f.write_str("'!=='"),
            Token::Lt => f.write_str("'<'"),
            Token::Le => f.write_str("'<='"),
            Token::Gt => f.write_str("'>'"),
            Token::Ge => f.write_str("'>='"),
            Token::Amp => f.write_str("'&'"),
            Token::Pipe => f.write_str("'|'"),
            Token::Caret => f.write_str("'^'"),
            Token::Bang => f.write_str("'!'"),
            Token::Question => f.write_str("'?'"),
            Token::Colon => f.write_str("':'"),
            Token::Semicolon => f.write_str("';'"),
            Token::Comma => f.write_str("','"),
            Token::LeftParen => f.write_str("'('"),
            Token::RightParen => f.write_str("')'"),
            Token::LeftBracket => f.write_str("'['"),
            Token::RightBracket => f.write_str("']'"),
        }
    }
}

/// Tokenize filter source into position-tagged tokens
pub fn tokenize(input: &str) -> ParseResult<Vec<Spanned<Token>>> {
    Scanner::new(input).run()
}

struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn run(mut self) -> ParseResult<Vec<Spanned<Token>>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let start = self.pos;
            let Some(&b) = self.bytes.get(self.pos) else {
                break;
            };
            let token = match b {
                b'0'..=b'9' => self.scan_number()?,
                b'\'' | b'"' => self.scan_string(b as char)?,
                b if b.is_ascii_alphabetic() || b == b'_' => self.scan_word(),
                _ => self.scan_operator()?,
            };
            tokens.push(Spanned::new(token, start, self.pos));
        }
        Ok(tokens)
    }

    /// Skip whitespace and `/* ... */` comments
    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            while self
                .bytes
                .get(self.pos)
                .is_some_and(|b| b.is_ascii_whitespace())
            {
                self.pos += 1;
            }
            if self.starts_with("/*") {
                let start = self.pos;
                match self.input[self.pos..].find("*/") {
                    Some(offset) => self.pos += offset + 2,
                    None => return Err(ParseError::UnclosedComment { position: start }),
                }
                continue;
            }
            return Ok(());
        }
    }

    fn scan_number(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        // Radix prefixes
        if self.bytes[self.pos] == b'0' {
            let radix = match self.bytes.get(self.pos + 1) {
                Some(b'x') | Some(b'X') => Some(16),
                Some(b'b') | Some(b'B') => Some(2),
                Some(b'o') | Some(b'O') => Some(8),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                let digits_start = self.pos;
                while self
                    .bytes
                    .get(self.pos)
                    .is_some_and(|b| (*b as char).is_digit(radix))
                {
                    self.pos += 1;
                }
                let literal = &self.input[digits_start..self.pos];
                return i64::from_str_radix(literal, radix)
                    .map(Token::Integer)
                    .map_err(|_| ParseError::MalformedNumber {
                        literal: self.input[start..self.pos].to_string(),
                        position: start,
                    });
            }
        }

        let mut is_float = false;
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        if self.bytes.get(self.pos) == Some(&b'.')
            && self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit)
        {
            is_float = true;
            self.pos += 1;
            while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
                self.pos += 1;
            }
        }
        if matches!(self.bytes.get(self.pos), Some(b'e') | Some(b'E')) {
            let mut exp_end = self.pos + 1;
            if matches!(self.bytes.get(exp_end), Some(b'-') | Some(b'+')) {
                exp_end += 1;
            }
            if self.bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
                is_float = true;
                self.pos = exp_end;
                while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
                    self.pos += 1;
                }
            }
        }

        let literal = &self.input[start..self.pos];
        if is_float {
            literal
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| ParseError::MalformedNumber {
                    literal: literal.to_string(),
                    position: start,
                })
        } else {
            literal
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| ParseError::MalformedNumber {
                    literal: literal.to_string(),
                    position: start,
                })
        }
    }

    fn scan_string(&mut self, quote: char) -> ParseResult<Token> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.input[self.pos..].char_indices().peekable();
        while let Some((offset, c)) = chars.next() {
            if c == quote {
                self.pos += offset + c.len_utf8();
                return Ok(Token::StringLit(out));
            }
            if c == '\\' {
                match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, '\\')) => out.push('\\'),
                    Some((_, 'x')) => {
                        // \xHH escape; anything else keeps the literal chars
                        let hex: String = chars
                            .clone()
                            .take(2)
                            .map(|(_, h)| h)
                            .filter(|h| h.is_ascii_hexdigit())
                            .collect();
                        if hex.len() == 2 {
                            chars.next();
                            chars.next();
                            let code = u8::from_str_radix(&hex, 16).unwrap_or(b'?');
                            out.push(code as char);
                        } else {
                            out.push('\\');
                            out.push('x');
                        }
                    }
                    Some((_, escaped)) if escaped == quote => out.push(quote),
                    Some((_, other)) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => break,
                }
                continue;
            }
            out.push(c);
        }
        Err(ParseError::UnterminatedString { position: start })
    }

    fn scan_word(&mut self) -> Token {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            self.pos += 1;
        }
        let word = &self.input[start..self.pos];
        Token::from_keyword(word).unwrap_or_else(|| Token::Identifier(word.to_string()))
    }

    fn scan_operator(&mut self) -> ParseResult<Token> {
        // Longest match first
        const TABLE: &[(&str, Token)] = &[
            (":=", Token::Assign),
            ("===", Token::StrictEq),
            ("==", Token::Eq),
            ("!==", Token::StrictNe),
            ("!=", Token::Ne),
            ("<=", Token::Le),
            (">=", Token::Ge),
            ("**", Token::Pow),
            ("=", Token::Eq),
            ("!", Token::Bang),
            ("<", Token::Lt),
            (">", Token::Gt),
            ("+", Token::Plus),
            ("-", Token::Minus),
            ("*", Token::Star),
            ("/", Token::Slash),
            ("%", Token::Percent),
            ("&", Token::Amp),
            ("|", Token::Pipe),
            ("^", Token::Caret),
            ("?", Token::Question),
            (":", Token::Colon),
            (";", Token::Semicolon),
            (",", Token::Comma),
            ("(", Token::LeftParen),
            (")", Token::RightParen),
            ("[", Token::LeftBracket),
            ("]", Token::RightBracket),
        ];
        for (symbol, token) in TABLE {
            if self.starts_with(symbol) {
                self.pos += symbol.len();
                return Ok(token.clone());
            }
        }
        let ch = self.input[self.pos..]
            .chars()
            .next()
            .unwrap_or('\u{fffd}');
        Err(ParseError::UnexpectedChar {
            ch,
            position: self.pos,
        })
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.pos..].starts_with(prefix)
    }
}
