//! Abstract syntax tree for filter expressions
//!
//! Produced by the parser, consumed by the evaluator, and cached by content
//! hash so unedited filters skip re-parsing. Nodes carry the byte offset of
//! the token that introduced them for positioned diagnostics.

use crate::model::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators, ordered roughly by binding strength in the grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Logical OR (`|`)
    Or,
    /// Logical XOR (`^`)
    Xor,
    /// Logical AND (`&`)
    And,
    /// Loose equality (`==` or `=`)
    Eq,
    /// Loose inequality (`!=`)
    Ne,
    /// Strict equality (`===`)
    StrictEq,
    /// Strict inequality (`!==`)
    StrictNe,
    /// Less than (`<`)
    Lt,
    /// Greater than (`>`)
    Gt,
    /// Less than or equal (`<=`)
    Le,
    /// Greater than or equal (`>=`)
    Ge,
    /// Addition or concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Sub,
    /// Multiplication (`*`)
    Mul,
    /// Division (`/`)
    Div,
    /// Modulo (`%`)
    Mod,
    /// Exponentiation (`**`)
    Pow,
    /// Substring membership (`in`)
    In,
    /// Shell-wildcard match (`like`, alias `matches`)
    Like,
    /// Substring containment (`contains`)
    Contains,
    /// Regular-expression match (`rlike`, alias `regex`)
    Rlike,
    /// Case-insensitive regular-expression match (`irlike`)
    Irlike,
}

impl BinaryOp {
    /// Source form of the operator, for diagnostics
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::And => "&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::In => "in",
            BinaryOp::Like => "like",
            BinaryOp::Contains => "contains",
            BinaryOp::Rlike => "rlike",
            BinaryOp::Irlike => "irlike",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Boolean negation (`!`)
    Not,
    /// Arithmetic negation (`-`)
    Minus,
    /// Arithmetic identity (`+`)
    Plus,
}

/// An expression node with its source position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// Node payload
    pub kind: ExprKind,
    /// Byte offset of the introducing token in the filter source
    pub position: usize,
}

impl Expr {
    /// Create a node at the given source position
    pub fn new(kind: ExprKind, position: usize) -> Self {
        Self { kind, position }
    }
}

/// Expression node payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// A literal value
    Literal(Value),
    /// A variable reference
    Variable(String),
    /// Local binding: `name := value`
    Assign {
        /// Variable name bound in the evaluation's local scope
        name: String,
        /// Bound expression
        value: Box<Expr>,
    },
    /// Element assignment: `name[index] := value`, or append when `index`
    /// is `None` (`name[] := value`)
    IndexAssign {
        /// Target variable name
        name: String,
        /// Element index; `None` appends
        index: Option<Box<Expr>>,
        /// Assigned expression
        value: Box<Expr>,
    },
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// Conditional: ternary `c ? a : b` or `if c then a [else b] end`;
    /// a missing else-branch yields `null`
    Conditional {
        /// Condition
        condition: Box<Expr>,
        /// Branch taken when the condition is truthy
        if_true: Box<Expr>,
        /// Branch taken otherwise
        if_false: Option<Box<Expr>>,
    },
    /// Built-in function call
    FunctionCall {
        /// Function name
        name: String,
        /// Argument expressions
        args: Vec<Expr>,
    },
    /// Array literal `[a, b, c]`
    ArrayLiteral(Vec<Expr>),
    /// Array indexing `array[index]`
    Index {
        /// Indexed expression
        array: Box<Expr>,
        /// Index expression
        index: Box<Expr>,
    },
    /// Statement sequence separated by `;`; evaluates to the last statement
    Sequence(Vec<Expr>),
}
