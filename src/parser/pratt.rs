//! Precedence-climbing parser for filter expressions
//!
//! The grammar's binding strength, loosest to tightest, mirrors the legacy
//! engine's descent order: statement sequence, assignment, conditionals,
//! `|`/`^`, `&`, equality, relational, additive, multiplicative, power
//! (right-associative), boolean negation, keyword operators, arithmetic
//! unary, indexing, atoms.

use super::error::{ParseError, ParseResult};
use super::span::Spanned;
use super::tokenizer::{tokenize, Token};
use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::model::Value;

/// Operator precedence levels (higher binds tighter)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    /// Logical OR and XOR (`|`, `^`)
    Or = 1,
    /// Logical AND (`&`)
    And = 2,
    /// Equality operators (`==`, `!=`, `===`, `!==`, `=`)
    Equality = 3,
    /// Relational operators (`<`, `>`, `<=`, `>=`)
    Relational = 4,
    /// Additive operators (`+`, `-`)
    Additive = 5,
    /// Multiplicative operators (`*`, `/`, `%`)
    Multiplicative = 6,
    /// Exponentiation (`**`, right associative)
    Power = 7,
    /// Boolean negation (`!`, prefix)
    BoolInvert = 8,
    /// Keyword operators (`in`, `like`, `contains`, `rlike`, `irlike`)
    Keyword = 9,
    /// Arithmetic unary (`-`, `+`, prefix)
    Unary = 10,
    /// Indexing (`[`)
    Postfix = 11,
}

impl Precedence {
    const fn as_u8(self) -> u8 {
        self as u8
    }

    const fn is_right_associative(self) -> bool {
        matches!(self, Precedence::Power)
    }
}

/// Binding strength of an infix/postfix token, `None` for non-operators
fn get_precedence(token: &Token) -> Option<Precedence> {
    match token {
        Token::Pipe | Token::Caret => Some(Precedence::Or),
        Token::Amp => Some(Precedence::And),
        Token::Eq | Token::Ne | Token::StrictEq | Token::StrictNe => Some(Precedence::Equality),
        Token::Lt | Token::Le | Token::Gt | Token::Ge => Some(Precedence::Relational),
        Token::Plus | Token::Minus => Some(Precedence::Additive),
        Token::Star | Token::Slash | Token::Percent => Some(Precedence::Multiplicative),
        Token::Pow => Some(Precedence::Power),
        Token::In | Token::Like | Token::Contains | Token::Rlike | Token::Irlike => {
            Some(Precedence::Keyword)
        }
        Token::LeftBracket => Some(Precedence::Postfix),
        _ => None,
    }
}

fn token_to_binary_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Pipe => Some(BinaryOp::Or),
        Token::Caret => Some(BinaryOp::Xor),
        Token::Amp => Some(BinaryOp::And),
        Token::Eq => Some(BinaryOp::Eq),
        Token::Ne => Some(BinaryOp::Ne),
        Token::StrictEq => Some(BinaryOp::StrictEq),
        Token::StrictNe => Some(BinaryOp::StrictNe),
        Token::Lt => Some(BinaryOp::Lt),
        Token::Le => Some(BinaryOp::Le),
        Token::Gt => Some(BinaryOp::Gt),
        Token::Ge => Some(BinaryOp::Ge),
        Token::Plus => Some(BinaryOp::Add),
        Token::Minus => Some(BinaryOp::Sub),
        Token::Star => Some(BinaryOp::Mul),
        Token::Slash => Some(BinaryOp::Div),
        Token::Percent => Some(BinaryOp::Mod),
        Token::Pow => Some(BinaryOp::Pow),
        Token::In => Some(BinaryOp::In),
        Token::Like => Some(BinaryOp::Like),
        Token::Contains => Some(BinaryOp::Contains),
        Token::Rlike => Some(BinaryOp::Rlike),
        Token::Irlike => Some(BinaryOp::Irlike),
        _ => None,
    }
}

/// Parse a complete filter source string
pub fn parse_filter(input: &str) -> ParseResult<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = FilterParser::new(tokens, input.len());
    let expr = parser.parse_sequence()?;
    match parser.peek() {
        None => Ok(expr),
        Some(spanned) => Err(ParseError::unexpected_token(
            spanned.value.to_string(),
            "end of input",
            spanned.start,
        )),
    }
}

/// Token-stream parser; use [`parse_filter`] for the common case
pub struct FilterParser {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    input_len: usize,
}

impl FilterParser {
    /// Create a parser over a token stream
    pub fn new(tokens: Vec<Spanned<Token>>, input_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            input_len,
        }
    }

    fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|t| &t.value)
    }

    fn peek_token_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.value)
    }

    fn current_position(&self) -> usize {
        self.peek().map_or(self.input_len, |t| t.start)
    }

    fn advance(&mut self) -> Option<Spanned<Token>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek_token() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> ParseResult<()> {
        match self.peek() {
            Some(found) if found.value == *token => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(ParseError::unexpected_token(
                found.value.to_string(),
                expected,
                found.start,
            )),
            None => Err(ParseError::UnexpectedEnd {
                expected,
                position: self.input_len,
            }),
        }
    }

    /// `;`-separated statement sequence; a trailing separator is allowed
    fn parse_sequence(&mut self) -> ParseResult<Expr> {
        let position = self.current_position();
        let mut statements = vec![self.parse_statement()?];
        while self.eat(&Token::Semicolon) {
            if self.peek_token().is_none() || self.peek_token() == Some(&Token::RightParen) {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        if statements.len() == 1 {
            Ok(statements.pop().ok_or(ParseError::UnexpectedEnd {
                expected: "statement",
                position,
            })?)
        } else {
            Ok(Expr::new(ExprKind::Sequence(statements), position))
        }
    }

    /// A statement: assignment or conditional expression
    fn parse_statement(&mut self) -> ParseResult<Expr> {
        if let Some(Token::Identifier(name)) = self.peek_token() {
            let name = name.clone();
            let position = self.current_position();
            // name := value
            if self.peek_token_at(1) == Some(&Token::Assign) {
                self.pos += 2;
                let value = self.parse_statement()?;
                return Ok(Expr::new(
                    ExprKind::Assign {
                        name,
                        value: Box::new(value),
                    },
                    position,
                ));
            }
            // name[] := value
            if self.peek_token_at(1) == Some(&Token::LeftBracket)
                && self.peek_token_at(2) == Some(&Token::RightBracket)
                && self.peek_token_at(3) == Some(&Token::Assign)
            {
                self.pos += 4;
                let value = self.parse_statement()?;
                return Ok(Expr::new(
                    ExprKind::IndexAssign {
                        name,
                        index: None,
                        value: Box::new(value),
                    },
                    position,
                ));
            }
        }

        let expr = self.parse_conditional()?;

        // name[index] := value parses as an index expression first
        if self.peek_token() == Some(&Token::Assign) {
            let assign_pos = self.current_position();
            if let ExprKind::Index { array, index } = expr.kind {
                if let ExprKind::Variable(name) = array.kind {
                    self.pos += 1;
                    let value = self.parse_statement()?;
                    return Ok(Expr::new(
                        ExprKind::IndexAssign {
                            name,
                            index: Some(index),
                            value: Box::new(value),
                        },
                        expr.position,
                    ));
                }
            }
            return Err(ParseError::unexpected_token(
                "':='",
                "an assignable variable on the left of ':='",
                assign_pos,
            ));
        }

        Ok(expr)
    }

    /// `if c then a [else b] end`, or a binary expression with an optional
    /// ternary tail
    fn parse_conditional(&mut self) -> ParseResult<Expr> {
        if self.peek_token() == Some(&Token::If) {
            let position = self.current_position();
            self.pos += 1;
            let condition = self.parse_conditional()?;
            self.expect(&Token::Then, "'then'")?;
            let if_true = self.parse_conditional()?;
            let if_false = if self.eat(&Token::Else) {
                Some(Box::new(self.parse_conditional()?))
            } else {
                None
            };
            self.expect(&Token::End, "'end'")?;
            return Ok(Expr::new(
                ExprKind::Conditional {
                    condition: Box::new(condition),
                    if_true: Box::new(if_true),
                    if_false,
                },
                position,
            ));
        }

        let expr = self.parse_binary(Precedence::Or.as_u8())?;
        if self.eat(&Token::Question) {
            let if_true = self.parse_conditional()?;
            self.expect(&Token::Colon, "':'")?;
            let if_false = self.parse_conditional()?;
            let position = expr.position;
            return Ok(Expr::new(
                ExprKind::Conditional {
                    condition: Box::new(expr),
                    if_true: Box::new(if_true),
                    if_false: Some(Box::new(if_false)),
                },
                position,
            ));
        }
        Ok(expr)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let mut lhs = self.parse_prefix()?;
        loop {
            let Some(token) = self.peek_token() else {
                return Ok(lhs);
            };
            let Some(precedence) = get_precedence(token) else {
                return Ok(lhs);
            };
            if precedence.as_u8() < min_precedence {
                return Ok(lhs);
            }

            if *token == Token::LeftBracket {
                let position = self.current_position();
                self.pos += 1;
                let index = self.parse_conditional()?;
                self.expect(&Token::RightBracket, "']'")?;
                lhs = Expr::new(
                    ExprKind::Index {
                        array: Box::new(lhs),
                        index: Box::new(index),
                    },
                    position,
                );
                continue;
            }

            let op_token = self.advance().ok_or(ParseError::UnexpectedEnd {
                expected: "operator",
                position: self.input_len,
            })?;
            let op = token_to_binary_op(&op_token.value).ok_or_else(|| {
                ParseError::unexpected_token(
                    op_token.value.to_string(),
                    "a binary operator",
                    op_token.start,
                )
            })?;
            let next_min = if precedence.is_right_associative() {
                precedence.as_u8()
            } else {
                precedence.as_u8() + 1
            };
            let rhs = self.parse_binary(next_min)?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                op_token.start,
            );
        }
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        let position = self.current_position();
        let Some(token) = self.peek_token().cloned() else {
            return Err(ParseError::UnexpectedEnd {
                expected: "an expression",
                position,
            });
        };
        match token {
            Token::Bang => {
                self.pos += 1;
                let operand = self.parse_binary(Precedence::BoolInvert.as_u8())?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(operand),
                    },
                    position,
                ))
            }
            Token::Minus => {
                self.pos += 1;
                let operand = self.parse_binary(Precedence::Unary.as_u8())?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Minus,
                        operand: Box::new(operand),
                    },
                    position,
                ))
            }
            Token::Plus => {
                self.pos += 1;
                let operand = self.parse_binary(Precedence::Unary.as_u8())?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Plus,
                        operand: Box::new(operand),
                    },
                    position,
                ))
            }
            Token::Integer(i) => {
                self.pos += 1;
                Ok(Expr::new(ExprKind::Literal(Value::Int(i)), position))
            }
            Token::Float(f) => {
                self.pos += 1;
                Ok(Expr::new(ExprKind::Literal(Value::Float(f)), position))
            }
            Token::StringLit(s) => {
                self.pos += 1;
                Ok(Expr::new(ExprKind::Literal(Value::Str(s)), position))
            }
            Token::True => {
                self.pos += 1;
                Ok(Expr::new(ExprKind::Literal(Value::Bool(true)), position))
            }
            Token::False => {
                self.pos += 1;
                Ok(Expr::new(ExprKind::Literal(Value::Bool(false)), position))
            }
            Token::Null => {
                self.pos += 1;
                Ok(Expr::new(ExprKind::Literal(Value::Null), position))
            }
            Token::Identifier(name) => {
                self.pos += 1;
                if self.eat(&Token::LeftParen) {
                    let args = self.parse_call_args()?;
                    Ok(Expr::new(ExprKind::FunctionCall { name, args }, position))
                } else {
                    Ok(Expr::new(ExprKind::Variable(name), position))
                }
            }
            Token::LeftParen => {
                self.pos += 1;
                let inner = self.parse_sequence()?;
                self.expect(&Token::RightParen, "')'")?;
                Ok(inner)
            }
            Token::LeftBracket => {
                self.pos += 1;
                let mut elements = Vec::new();
                if !self.eat(&Token::RightBracket) {
                    loop {
                        elements.push(self.parse_conditional()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                    self.expect(&Token::RightBracket, "']'")?;
                }
                Ok(Expr::new(ExprKind::ArrayLiteral(elements), position))
            }
            other => Err(ParseError::unexpected_token(
                other.to_string(),
                "an expression",
                position,
            )),
        }
    }

    fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(&Token::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_conditional()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RightParen, "')'")?;
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Expr {
        parse_filter(input).unwrap()
    }

    fn binary(expr: &Expr) -> (BinaryOp, &Expr, &Expr) {
        match &expr.kind {
            ExprKind::Binary { op, lhs, rhs } => (*op, lhs, rhs),
            other => panic!("expected binary node, got {other:?}"),
        }
    }

    #[test]
    fn additive_binds_tighter_than_comparison() {
        let expr = parse("1 + 2 == 3");
        let (op, lhs, _) = binary(&expr);
        assert_eq!(op, BinaryOp::Eq);
        assert_eq!(binary(lhs).0, BinaryOp::Add);
    }

    #[test]
    fn comparison_binds_tighter_than_bool_ops() {
        let expr = parse("a == b | c == d");
        let (op, lhs, rhs) = binary(&expr);
        assert_eq!(op, BinaryOp::Or);
        assert_eq!(binary(lhs).0, BinaryOp::Eq);
        assert_eq!(binary(rhs).0, BinaryOp::Eq);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("a | b & c");
        let (op, _, rhs) = binary(&expr);
        assert_eq!(op, BinaryOp::Or);
        assert_eq!(binary(rhs).0, BinaryOp::And);
    }

    #[test]
    fn keyword_ops_bind_tighter_than_additive() {
        let expr = parse("'x' in 'xy' + 'z'");
        let (op, lhs, _) = binary(&expr);
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(binary(lhs).0, BinaryOp::In);
    }

    #[test]
    fn negation_covers_keyword_ops() {
        let expr = parse("!'x' in 'y'");
        match &expr.kind {
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => assert_eq!(binary(operand).0, BinaryOp::In),
            other => panic!("expected negation, got {other:?}"),
        }
    }

    #[test]
    fn power_is_right_associative() {
        let expr = parse("2 ** 3 ** 2");
        let (op, _, rhs) = binary(&expr);
        assert_eq!(op, BinaryOp::Pow);
        assert_eq!(binary(rhs).0, BinaryOp::Pow);
    }

    #[test]
    fn single_equals_is_loose_equality() {
        let expr = parse("a = b");
        assert_eq!(binary(&expr).0, BinaryOp::Eq);
    }

    #[test]
    fn ternary_and_if_forms() {
        let expr = parse("a ? 1 : 2");
        assert!(matches!(
            expr.kind,
            ExprKind::Conditional {
                if_false: Some(_),
                ..
            }
        ));
        let expr = parse("if a then 1 else 2 end");
        assert!(matches!(expr.kind, ExprKind::Conditional { .. }));
        let expr = parse("if a then 1 end");
        assert!(matches!(
            expr.kind,
            ExprKind::Conditional { if_false: None, .. }
        ));
    }

    #[test]
    fn assignment_forms() {
        assert!(matches!(parse("x := 1").kind, ExprKind::Assign { .. }));
        assert!(matches!(
            parse("x[] := 1").kind,
            ExprKind::IndexAssign { index: None, .. }
        ));
        assert!(matches!(
            parse("x[0] := 1").kind,
            ExprKind::IndexAssign { index: Some(_), .. }
        ));
    }

    #[test]
    fn sequences_evaluate_to_statement_lists() {
        let expr = parse("x := 1; x + 1");
        match expr.kind {
            ExprKind::Sequence(statements) => assert_eq!(statements.len(), 2),
            other => panic!("expected sequence, got {other:?}"),
        }
        // Trailing separator is tolerated
        assert!(matches!(parse("1;").kind, ExprKind::Literal(_)));
    }

    #[test]
    fn calls_arrays_and_indexing() {
        let expr = parse("length(new_wikitext)");
        assert!(matches!(expr.kind, ExprKind::FunctionCall { ref name, ref args } if name == "length" && args.len() == 1));
        let expr = parse("[1, 'a'][0]");
        assert!(matches!(expr.kind, ExprKind::Index { .. }));
        assert!(matches!(parse("[]").kind, ExprKind::ArrayLiteral(ref v) if v.is_empty()));
    }

    #[test]
    fn parenthesized_sequences() {
        let expr = parse("(x := 1; x) + 1");
        assert_eq!(binary(&expr).0, BinaryOp::Add);
    }

    #[test]
    fn syntax_errors_carry_positions() {
        match parse_filter("1 + * 2") {
            Err(ParseError::UnexpectedToken { position, .. }) => assert_eq!(position, 4),
            other => panic!("expected unexpected-token error, got {other:?}"),
        }
        assert!(matches!(
            parse_filter("(1"),
            Err(ParseError::UnexpectedToken { .. }) | Err(ParseError::UnexpectedEnd { .. })
        ));
        match parse_filter("1 2") {
            Err(ParseError::UnexpectedToken {
                expected,
                position,
                ..
            }) => {
                assert_eq!(expected, "end of input");
                assert_eq!(position, 2);
            }
            other => panic!("expected trailing-token error, got {other:?}"),
        }
    }

    #[test]
    fn assignment_to_non_variable_is_rejected() {
        assert!(matches!(
            parse_filter("1 := 2"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_filter("f(x) := 2"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }
}
