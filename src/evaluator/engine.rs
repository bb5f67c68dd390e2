//! The tree-walking expression evaluator

use super::context::EvaluationContext;
use super::error::{EvaluationError, EvaluationResult};
use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::model::{MulOp, Value, ValueError};
use crate::registry::FunctionRegistry;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;

/// Evaluates parsed filter expressions against an evaluation context
///
/// The evaluator is stateless apart from its function registry and can be
/// shared across events; all per-event state lives in the
/// [`EvaluationContext`].
#[derive(Clone)]
pub struct FilterEvaluator {
    functions: Arc<FunctionRegistry>,
}

impl Default for FilterEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterEvaluator {
    /// Create an evaluator with the standard built-in function registry
    pub fn new() -> Self {
        Self {
            functions: Arc::new(FunctionRegistry::standard()),
        }
    }

    /// Create an evaluator with a custom function registry
    pub fn with_registry(functions: Arc<FunctionRegistry>) -> Self {
        Self { functions }
    }

    /// Evaluate an expression to a value
    pub fn evaluate(&self, expr: &Expr, ctx: &mut EvaluationContext<'_>) -> EvaluationResult<Value> {
        self.eval(expr, ctx)
    }

    /// Evaluate a filter to its boolean outcome
    ///
    /// An `Undefined` result means the filter referenced facts that do not
    /// apply to this event; it counts as not matched.
    pub fn evaluate_match(
        &self,
        expr: &Expr,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvaluationResult<bool> {
        Ok(self.eval(expr, ctx)?.truthy())
    }

    fn eval(&self, expr: &Expr, ctx: &mut EvaluationContext<'_>) -> EvaluationResult<Value> {
        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Variable(name) => ctx.get_var(name),
            ExprKind::Sequence(statements) => {
                let mut last = Value::Null;
                for statement in statements {
                    last = self.eval(statement, ctx)?;
                }
                Ok(last)
            }
            ExprKind::Assign { name, value } => {
                let value = self.eval(value, ctx)?;
                ctx.set_local(name, value.clone());
                Ok(value)
            }
            ExprKind::IndexAssign { name, index, value } => {
                self.eval_index_assign(expr.position, name, index.as_deref(), value, ctx)
            }
            ExprKind::Unary { op, operand } => {
                ctx.tick()?;
                let operand = self.eval(operand, ctx)?;
                match op {
                    UnaryOp::Not => Ok(operand.bool_invert()),
                    UnaryOp::Minus => Ok(operand.unary_minus()?),
                    UnaryOp::Plus => Ok(operand),
                }
            }
            ExprKind::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                ctx.tick()?;
                // The untaken branch is never evaluated, so it cannot force
                // lazy variables
                if self.eval(condition, ctx)?.truthy() {
                    self.eval(if_true, ctx)
                } else {
                    match if_false {
                        Some(branch) => self.eval(branch, ctx),
                        None => Ok(Value::Null),
                    }
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                ctx.tick()?;
                self.eval_binary(expr.position, *op, lhs, rhs, ctx)
            }
            ExprKind::ArrayLiteral(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element, ctx)?);
                }
                Ok(Value::Array(values))
            }
            ExprKind::Index { array, index } => {
                ctx.tick()?;
                let array_value = self.eval(array, ctx)?;
                let index_value = self.eval(index, ctx)?;
                if array_value.is_undefined() || index_value.is_undefined() {
                    return Ok(Value::Undefined);
                }
                let Value::Array(items) = array_value else {
                    return Err(EvaluationError::user(
                        "notarray",
                        expr.position,
                        "indexing a non-array value",
                    ));
                };
                let idx = index_value.as_int()?;
                items
                    .get(usize::try_from(idx).unwrap_or(usize::MAX))
                    .cloned()
                    .ok_or_else(|| {
                        EvaluationError::user(
                            "outofbounds",
                            expr.position,
                            format!("index {idx} out of bounds for array of size {}", items.len()),
                        )
                    })
            }
            ExprKind::FunctionCall { name, args } => {
                ctx.tick()?;
                self.eval_call(expr.position, name, args, ctx)
            }
        }
    }

    fn eval_binary(
        &self,
        position: usize,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvaluationResult<Value> {
        // Short-circuit paths first: the untaken operand must not be
        // evaluated at all
        match op {
            BinaryOp::And => {
                let left = self.eval(lhs, ctx)?;
                if !left.truthy() {
                    return Ok(Value::Bool(false));
                }
                let right = self.eval(rhs, ctx)?;
                return Ok(left.bool_and(&right));
            }
            BinaryOp::Or => {
                let left = self.eval(lhs, ctx)?;
                if left.truthy() {
                    return Ok(Value::Bool(true));
                }
                let right = self.eval(rhs, ctx)?;
                return Ok(left.bool_or(&right));
            }
            // XOR depends on both operands and cannot short-circuit
            BinaryOp::Xor => {
                let left = self.eval(lhs, ctx)?;
                let right = self.eval(rhs, ctx)?;
                return Ok(left.bool_xor(&right));
            }
            _ => {}
        }

        let left = self.eval(lhs, ctx)?;
        let right = self.eval(rhs, ctx)?;

        match op {
            BinaryOp::Add => Ok(left.sum(&right)?),
            BinaryOp::Sub => Ok(left.sub(&right)?),
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let mul_op = match op {
                    BinaryOp::Mul => MulOp::Mul,
                    BinaryOp::Div => MulOp::Div,
                    _ => MulOp::Mod,
                };
                left.mul_rel(&right, mul_op).map_err(|e| match e {
                    ValueError::DivideByZero => {
                        EvaluationError::user("dividebyzero", position, "division by zero")
                    }
                    other => other.into(),
                })
            }
            BinaryOp::Pow => Ok(left.pow(&right)?),
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::StrictEq | BinaryOp::StrictNe => {
                if left.is_undefined() || right.is_undefined() {
                    return Ok(Value::Undefined);
                }
                let strict = matches!(op, BinaryOp::StrictEq | BinaryOp::StrictNe);
                let equal = left.equals(&right, strict)?;
                let invert = matches!(op, BinaryOp::Ne | BinaryOp::StrictNe);
                Ok(Value::Bool(equal != invert))
            }
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
                if left.is_undefined() || right.is_undefined() {
                    return Ok(Value::Undefined);
                }
                let ordering = left.compare_str(&right)?;
                let result = match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Gt => ordering.is_gt(),
                    BinaryOp::Le => ordering.is_le(),
                    _ => ordering.is_ge(),
                };
                Ok(Value::Bool(result))
            }
            BinaryOp::In | BinaryOp::Contains => {
                if left.is_undefined() || right.is_undefined() {
                    return Ok(Value::Undefined);
                }
                let (needle, haystack) = if op == BinaryOp::In {
                    (left.as_str()?, right.as_str()?)
                } else {
                    (right.as_str()?, left.as_str()?)
                };
                if needle.is_empty() || haystack.is_empty() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(haystack.contains(&needle)))
            }
            BinaryOp::Like => {
                if left.is_undefined() || right.is_undefined() {
                    return Ok(Value::Undefined);
                }
                let pattern = wildcard_to_regex(&right.as_str()?);
                let regex = compile_regex(&pattern, position)?;
                Ok(Value::Bool(regex.is_match(&left.as_str()?)))
            }
            BinaryOp::Rlike | BinaryOp::Irlike => {
                if left.is_undefined() || right.is_undefined() {
                    return Ok(Value::Undefined);
                }
                let mut pattern = right.as_str()?;
                if op == BinaryOp::Irlike {
                    pattern = format!("(?i){pattern}");
                }
                let regex = compile_regex(&pattern, position)?;
                Ok(Value::Bool(regex.is_match(&left.as_str()?)))
            }
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
                unreachable!("boolean operators are handled above")
            }
        }
    }

    fn eval_index_assign(
        &self,
        position: usize,
        name: &str,
        index: Option<&Expr>,
        value: &Expr,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvaluationResult<Value> {
        let assigned = self.eval(value, ctx)?;
        let current = ctx.get_var(name)?;
        let Value::Array(mut items) = current else {
            return Err(EvaluationError::user(
                "notarray",
                position,
                format!("variable '{name}' is not an array"),
            ));
        };
        match index {
            None => items.push(assigned.clone()),
            Some(index_expr) => {
                let index_value = self.eval(index_expr, ctx)?;
                if index_value.is_undefined() {
                    return Err(EvaluationError::user(
                        "outofbounds",
                        position,
                        "array index is undefined",
                    ));
                }
                let idx = index_value.as_int()?;
                let size = items.len();
                let slot = usize::try_from(idx)
                    .ok()
                    .and_then(|i| items.get_mut(i))
                    .ok_or_else(|| {
                        EvaluationError::user(
                            "outofbounds",
                            position,
                            format!("index {idx} out of bounds for array of size {size}"),
                        )
                    })?;
                *slot = assigned.clone();
            }
        }
        ctx.set_local(name, Value::Array(items));
        Ok(assigned)
    }

    fn eval_call(
        &self,
        position: usize,
        name: &str,
        args: &[Expr],
        ctx: &mut EvaluationContext<'_>,
    ) -> EvaluationResult<Value> {
        let Some(function) = self.functions.get(name) else {
            return Err(EvaluationError::user(
                "unknownfunction",
                position,
                format!("unknown function '{name}'"),
            ));
        };
        let signature = function.signature();
        if args.len() < signature.min_args {
            return Err(EvaluationError::user(
                "notenoughargs",
                position,
                format!(
                    "function '{name}' expects at least {} arguments, got {}",
                    signature.min_args,
                    args.len()
                ),
            ));
        }
        if let Some(max) = signature.max_args {
            if args.len() > max {
                return Err(EvaluationError::user(
                    "toomanyargs",
                    position,
                    format!(
                        "function '{name}' expects at most {max} arguments, got {}",
                        args.len()
                    ),
                ));
            }
        }

        let mut values: SmallVec<[Value; 4]> = SmallVec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, ctx)?);
        }
        if function.propagates_undefined() && values.iter().any(Value::is_undefined) {
            return Ok(Value::Undefined);
        }
        function
            .evaluate(&values, ctx)
            .map_err(|e| EvaluationError::user(e.message_id(), position, e.to_string()))
    }
}

/// Translate a shell-style wildcard pattern into an anchored regex
///
/// `*` matches any run, `?` a single character, `[...]` a class with `[!`
/// as negation; everything else is literal.
fn wildcard_to_regex(pattern: &str) -> String {
    let translated = regex::escape(pattern)
        .replace(r"\[!", "[^")
        .replace(r"\[", "[")
        .replace(r"\]", "]")
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    format!("^(?s:{translated})$")
}

/// Compile a user-supplied pattern, mapping failures to a positioned
/// user-visible error
fn compile_regex(pattern: &str, position: usize) -> EvaluationResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| EvaluationError::user("regexfailure", position, format!("invalid regular expression: {e}")))
}
