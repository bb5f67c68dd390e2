//! Core value type and coercion semantics for filter expressions

use super::types::ValueType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for value operations
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors raised by value operations
///
/// `CastUndefined` and `UndefinedComparison` are programming-contract
/// violations: callers must resolve `Undefined` operands before casting or
/// comparing. `DivideByZero` is a user-authored mistake; the evaluator
/// attaches the source position before surfacing it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// Attempted to cast `Undefined` to another type
    #[error("refusing to cast undefined to {target}")]
    CastUndefined {
        /// Requested casting target
        target: ValueType,
    },

    /// Attempted a cast to an impossible target
    #[error("cannot cast {from} to {to}")]
    InvalidCast {
        /// Source type
        from: ValueType,
        /// Target type
        to: ValueType,
    },

    /// An `Undefined` operand reached `equals`
    #[error("equality comparison received an undefined operand")]
    UndefinedComparison,

    /// Division or modulo by zero
    #[error("division by zero")]
    DivideByZero,
}

/// Multiplicative operator selector for [`Value::mul_rel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulOp {
    /// Multiplication (`*`)
    Mul,
    /// Division (`/`)
    Div,
    /// Modulo (`%`)
    Mod,
}

/// A dynamically-typed runtime value
///
/// `Undefined` marks a value that could not be computed because one of its
/// inputs was itself undefined. It carries no payload and propagates through
/// arithmetic, comparison and boolean operations; it only collapses to a
/// concrete boolean when a condition is evaluated for control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// Double-precision float
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Boolean
    Bool(bool),
    /// Null
    Null,
    /// Heterogeneous ordered sequence; nesting is permitted
    Array(Vec<Value>),
    /// Placeholder for a value that could not be computed
    Undefined,
}

impl Value {
    /// The runtime type tag of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::String,
            Value::Bool(_) => ValueType::Bool,
            Value::Null => ValueType::Null,
            Value::Array(_) => ValueType::Array,
            Value::Undefined => ValueType::Undefined,
        }
    }

    /// Whether this value is `Undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Build a value from a JSON document (used when importing fact dumps)
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            // Objects have no filter-language counterpart; flatten to values
            serde_json::Value::Object(map) => {
                Value::Array(map.values().map(Value::from_json).collect())
            }
        }
    }

    /// Export to a JSON value in native types; `Null` and `Undefined` both
    /// export as JSON null
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Str(s) => serde_json::Value::from(s.as_str()),
            Value::Bool(b) => serde_json::Value::from(*b),
            Value::Null | Value::Undefined => serde_json::Value::Null,
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }

    /// Cast this value to the given target type
    ///
    /// Casting `Undefined` to anything fails fast: callers must check for
    /// `Undefined` first. Casting anything to `Null` yields `Null`. Casting
    /// an array to a scalar uses its length (or the newline-joined string
    /// form); casting a non-array to `Array` wraps it.
    pub fn cast(&self, target: ValueType) -> ValueResult<Value> {
        if self.value_type() == target {
            return Ok(self.clone());
        }
        if self.is_undefined() {
            return Err(ValueError::CastUndefined { target });
        }
        if target == ValueType::Null {
            return Ok(Value::Null);
        }

        if let Value::Array(items) = self {
            return match target {
                ValueType::Bool => Ok(Value::Bool(!items.is_empty())),
                ValueType::Float => Ok(Value::Float(items.len() as f64)),
                ValueType::Int => Ok(Value::Int(items.len() as i64)),
                ValueType::String => {
                    let mut s = String::new();
                    for item in items {
                        s.push_str(&item.as_str()?);
                        s.push('\n');
                    }
                    Ok(Value::Str(s))
                }
                _ => Err(ValueError::InvalidCast {
                    from: ValueType::Array,
                    to: target,
                }),
            };
        }

        match target {
            ValueType::Bool => Ok(Value::Bool(self.raw_bool())),
            ValueType::Float => Ok(Value::Float(self.raw_float())),
            ValueType::Int => Ok(Value::Int(self.raw_int())),
            ValueType::String => Ok(Value::Str(self.raw_string())),
            ValueType::Array => Ok(Value::Array(vec![self.clone()])),
            ValueType::Null | ValueType::Undefined => Err(ValueError::InvalidCast {
                from: self.value_type(),
                to: target,
            }),
        }
    }

    /// Truthiness used for control flow: `Undefined` counts as `false`
    ///
    /// This is the one place where `Undefined` resolves to a concrete
    /// boolean without being a contract violation.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Array(items) => !items.is_empty(),
            other => other.raw_bool(),
        }
    }

    /// Cast to `bool` and extract
    pub fn as_bool(&self) -> ValueResult<bool> {
        match self.cast(ValueType::Bool)? {
            Value::Bool(b) => Ok(b),
            _ => unreachable!("cast to bool produced a non-bool"),
        }
    }

    /// Cast to `string` and extract
    pub fn as_str(&self) -> ValueResult<String> {
        match self.cast(ValueType::String)? {
            Value::Str(s) => Ok(s),
            _ => unreachable!("cast to string produced a non-string"),
        }
    }

    /// Cast to `int` and extract
    pub fn as_int(&self) -> ValueResult<i64> {
        match self.cast(ValueType::Int)? {
            Value::Int(i) => Ok(i),
            _ => unreachable!("cast to int produced a non-int"),
        }
    }

    /// Cast to `float` and extract
    pub fn as_float(&self) -> ValueResult<f64> {
        match self.cast(ValueType::Float)? {
            Value::Float(f) => Ok(f),
            _ => unreachable!("cast to float produced a non-float"),
        }
    }

    /// Cast to `array` and extract
    pub fn as_array(&self) -> ValueResult<Vec<Value>> {
        match self.cast(ValueType::Array)? {
            Value::Array(items) => Ok(items),
            _ => unreachable!("cast to array produced a non-array"),
        }
    }

    /// Equality with the engine's coercion rules
    ///
    /// Non-strict equality compares string representations; strict equality
    /// additionally requires identical runtime types. Arrays compare
    /// element-wise under the same strictness. An empty array equals `false`
    /// or `null` non-strictly; any other array/non-array pair is unequal.
    /// An `Undefined` operand is a contract violation: the caller must have
    /// resolved the result to `Undefined` before getting here.
    pub fn equals(&self, other: &Value, strict: bool) -> ValueResult<bool> {
        match (self, other) {
            (Value::Undefined, _) | (_, Value::Undefined) => {
                Err(ValueError::UndefinedComparison)
            }
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.equals(y, strict)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Array(items), scalar) | (scalar, Value::Array(items)) => {
                if strict {
                    return Ok(false);
                }
                if items.is_empty() {
                    return Ok(matches!(scalar, Value::Bool(false) | Value::Null));
                }
                Ok(false)
            }
            (a, b) => {
                let type_check = !strict || a.value_type() == b.value_type();
                Ok(type_check && a.as_str()? == b.as_str()?)
            }
        }
    }

    /// Ordering of the two operands' string casts
    ///
    /// Relational operators are string-lexicographic by design, to match
    /// legacy behavior. The caller handles `Undefined` operands.
    pub fn compare_str(&self, other: &Value) -> ValueResult<std::cmp::Ordering> {
        Ok(self.as_str()?.cmp(&other.as_str()?))
    }

    /// Addition, string concatenation, or array concatenation
    pub fn sum(&self, other: &Value) -> ValueResult<Value> {
        match (self, other) {
            (Value::Undefined, _) | (_, Value::Undefined) => Ok(Value::Undefined),
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::Str(format!("{}{}", self.as_str()?, other.as_str()?)))
            }
            (Value::Array(a), Value::Array(b)) => {
                let mut merged = a.clone();
                merged.extend(b.iter().cloned());
                Ok(Value::Array(merged))
            }
            _ => self.numeric_binary(other, i64::checked_add, |a, b| a + b),
        }
    }

    /// Subtraction
    pub fn sub(&self, other: &Value) -> ValueResult<Value> {
        if self.is_undefined() || other.is_undefined() {
            return Ok(Value::Undefined);
        }
        self.numeric_binary(other, i64::checked_sub, |a, b| a - b)
    }

    /// Multiplication, division or modulo
    ///
    /// Division and modulo by a numeric zero raise [`ValueError::DivideByZero`];
    /// the evaluator attaches the source position.
    pub fn mul_rel(&self, other: &Value, op: MulOp) -> ValueResult<Value> {
        if self.is_undefined() || other.is_undefined() {
            return Ok(Value::Undefined);
        }
        if op != MulOp::Mul && other.as_float()? == 0.0 {
            return Err(ValueError::DivideByZero);
        }
        match op {
            MulOp::Mul => self.numeric_binary(other, i64::checked_mul, |a, b| a * b),
            MulOp::Div => {
                // Integer division stays integral only when it is exact;
                // i64::MIN / -1 has no i64 quotient and falls back to Float
                if let (Value::Int(a), Value::Int(b)) = (self, other) {
                    if a.checked_rem(*b) == Some(0) {
                        if let Some(quotient) = a.checked_div(*b) {
                            return Ok(Value::Int(quotient));
                        }
                    }
                }
                Ok(Value::Float(self.as_float()? / other.as_float()?))
            }
            MulOp::Mod => {
                let a = self.as_float()? as i64;
                let b = other.as_float()? as i64;
                if b == 0 {
                    return Err(ValueError::DivideByZero);
                }
                // i64::MIN % -1 overflows the native remainder but is zero
                Ok(Value::Int(a.checked_rem(b).unwrap_or(0)))
            }
        }
    }

    /// Exponentiation; integer-only with a non-negative exponent stays `Int`
    pub fn pow(&self, exponent: &Value) -> ValueResult<Value> {
        if self.is_undefined() || exponent.is_undefined() {
            return Ok(Value::Undefined);
        }
        if let (Value::Int(base), Value::Int(exp)) = (self, exponent) {
            if (0..=u32::MAX as i64).contains(exp) {
                if let Some(res) = base.checked_pow(*exp as u32) {
                    return Ok(Value::Int(res));
                }
            }
        }
        Ok(Value::Float(self.as_float()?.powf(exponent.as_float()?)))
    }

    /// Arithmetic negation
    pub fn unary_minus(&self) -> ValueResult<Value> {
        match self {
            Value::Undefined => Ok(Value::Undefined),
            Value::Int(i) => match i.checked_neg() {
                Some(n) => Ok(Value::Int(n)),
                None => Ok(Value::Float(-(*i as f64))),
            },
            other => Ok(Value::Float(-other.as_float()?)),
        }
    }

    /// Boolean negation; `Undefined` propagates
    pub fn bool_invert(&self) -> Value {
        match self {
            Value::Undefined => Value::Undefined,
            other => Value::Bool(!other.truthy()),
        }
    }

    /// Non-short-circuiting boolean AND; `Undefined` counts as `false`
    pub fn bool_and(&self, other: &Value) -> Value {
        Value::Bool(self.truthy() && other.truthy())
    }

    /// Non-short-circuiting boolean OR; `Undefined` counts as `false`
    pub fn bool_or(&self, other: &Value) -> Value {
        Value::Bool(self.truthy() || other.truthy())
    }

    /// Boolean XOR; `Undefined` counts as `false`
    pub fn bool_xor(&self, other: &Value) -> Value {
        Value::Bool(self.truthy() != other.truthy())
    }

    /// Integer arithmetic keeps `Int` while both operands are `Int` and the
    /// checked operation does not overflow; otherwise the result is `Float`.
    fn numeric_binary(
        &self,
        other: &Value,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> ValueResult<Value> {
        if let (Value::Int(a), Value::Int(b)) = (self, other) {
            if let Some(res) = int_op(*a, *b) {
                return Ok(Value::Int(res));
            }
        }
        Ok(Value::Float(float_op(self.as_float()?, other.as_float()?)))
    }

    /// Scalar truthiness; arrays and `Undefined` are handled by the callers
    fn raw_bool(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            // "0" is falsy, matching the legacy engine's string coercion
            Value::Str(s) => !s.is_empty() && s != "0",
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Array(items) => !items.is_empty(),
            Value::Undefined => false,
        }
    }

    fn raw_int(&self) -> i64 {
        match self {
            Value::Int(i) => *i,
            Value::Float(f) => *f as i64,
            Value::Str(s) => parse_int_prefix(s),
            Value::Bool(b) => *b as i64,
            Value::Null => 0,
            Value::Array(items) => items.len() as i64,
            Value::Undefined => 0,
        }
    }

    fn raw_float(&self) -> f64 {
        match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Str(s) => parse_float_prefix(s),
            Value::Bool(b) => *b as i64 as f64,
            Value::Null => 0.0,
            Value::Array(items) => items.len() as f64,
            Value::Undefined => 0.0,
        }
    }

    fn raw_string(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => s.clone(),
            // Legacy string coercion: true is "1", false is ""
            Value::Bool(b) => {
                if *b {
                    "1".to_string()
                } else {
                    String::new()
                }
            }
            Value::Null => String::new(),
            Value::Array(_) | Value::Undefined => String::new(),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

/// Integral floats print without a decimal part, so `1.0` and `"1"` compare
/// equal non-strictly.
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

/// Permissive integer parse: an optional sign followed by the longest run of
/// digits; anything else yields 0.
fn parse_int_prefix(s: &str) -> i64 {
    let t = s.trim_start();
    let (sign, rest) = match t.as_bytes().first() {
        Some(b'-') => (-1i64, &t[1..]),
        Some(b'+') => (1, &t[1..]),
        _ => (1, t),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

/// Permissive float parse: longest numeric prefix including fraction and
/// exponent; anything else yields 0.0.
fn parse_float_prefix(s: &str) -> f64 {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || end > int_start {
            end = frac_end;
        }
    }
    if end == int_start {
        return 0.0;
    }
    // Exponent only counts when at least one digit follows it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'-' | b'+') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    t[..end].parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cast_to_own_type_is_identity() {
        let values = [
            Value::Int(42),
            Value::Float(2.5),
            Value::Str("x".into()),
            Value::Bool(true),
            Value::Null,
            Value::Array(vec![Value::Int(1)]),
        ];
        for v in values {
            assert_eq!(v.cast(v.value_type()).unwrap(), v);
        }
    }

    #[test]
    fn string_cast_is_idempotent() {
        let values = [
            Value::Int(7),
            Value::Float(1.0),
            Value::Bool(false),
            Value::Null,
            Value::Array(vec![Value::Int(1), Value::Str("a".into())]),
        ];
        for v in values {
            let once = v.cast(ValueType::String).unwrap();
            let twice = once.cast(ValueType::String).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn cast_undefined_fails_fast() {
        assert!(matches!(
            Value::Undefined.cast(ValueType::Bool),
            Err(ValueError::CastUndefined { .. })
        ));
    }

    #[test]
    fn null_casts_to_falsy_representatives() {
        assert_eq!(Value::Null.cast(ValueType::Bool).unwrap(), Value::Bool(false));
        assert_eq!(Value::Null.cast(ValueType::Int).unwrap(), Value::Int(0));
        assert_eq!(Value::Null.cast(ValueType::Float).unwrap(), Value::Float(0.0));
        assert_eq!(
            Value::Null.cast(ValueType::String).unwrap(),
            Value::Str(String::new())
        );
    }

    #[test]
    fn array_casts() {
        let arr = Value::Array(vec![Value::Int(1), Value::Str("b".into())]);
        assert_eq!(arr.cast(ValueType::Bool).unwrap(), Value::Bool(true));
        assert_eq!(arr.cast(ValueType::Int).unwrap(), Value::Int(2));
        assert_eq!(arr.cast(ValueType::Float).unwrap(), Value::Float(2.0));
        assert_eq!(
            arr.cast(ValueType::String).unwrap(),
            Value::Str("1\nb\n".into())
        );
        assert_eq!(
            Value::Array(vec![]).cast(ValueType::Bool).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            Value::Int(3).cast(ValueType::Array).unwrap(),
            Value::Array(vec![Value::Int(3)])
        );
    }

    #[test]
    fn undefined_propagates_through_arithmetic() {
        let v = Value::Int(5);
        assert_eq!(Value::Undefined.sum(&v).unwrap(), Value::Undefined);
        assert_eq!(v.sum(&Value::Undefined).unwrap(), Value::Undefined);
        assert_eq!(v.sub(&Value::Undefined).unwrap(), Value::Undefined);
        assert_eq!(
            v.mul_rel(&Value::Undefined, MulOp::Div).unwrap(),
            Value::Undefined
        );
        assert_eq!(v.pow(&Value::Undefined).unwrap(), Value::Undefined);
        assert_eq!(Value::Undefined.unary_minus().unwrap(), Value::Undefined);
        assert_eq!(Value::Undefined.bool_invert(), Value::Undefined);
    }

    #[test]
    fn loose_equality_compares_string_forms() {
        assert!(Value::Int(1).equals(&Value::Str("1".into()), false).unwrap());
        assert!(Value::Float(1.0).equals(&Value::Str("1".into()), false).unwrap());
        assert!(!Value::Int(1).equals(&Value::Str("1".into()), true).unwrap());
        assert!(Value::Int(1).equals(&Value::Int(1), true).unwrap());
    }

    #[test]
    fn equality_is_symmetric() {
        let samples = [
            Value::Int(1),
            Value::Str("1".into()),
            Value::Bool(false),
            Value::Null,
            Value::Array(vec![]),
            Value::Array(vec![Value::Int(1)]),
        ];
        for a in &samples {
            for b in &samples {
                for strict in [false, true] {
                    assert_eq!(
                        a.equals(b, strict).unwrap(),
                        b.equals(a, strict).unwrap(),
                        "asymmetry for {a:?} and {b:?} (strict={strict})"
                    );
                }
            }
        }
    }

    #[test]
    fn empty_array_equals_false_and_null_loosely() {
        let empty = Value::Array(vec![]);
        assert!(empty.equals(&Value::Bool(false), false).unwrap());
        assert!(empty.equals(&Value::Null, false).unwrap());
        assert!(!empty.equals(&Value::Bool(false), true).unwrap());
        assert!(!empty.equals(&Value::Int(0), false).unwrap());
        let nonempty = Value::Array(vec![Value::Int(0)]);
        assert!(!nonempty.equals(&Value::Bool(false), false).unwrap());
    }

    #[test]
    fn nested_arrays_compare_elementwise() {
        let a = Value::Array(vec![Value::Array(vec![Value::Int(1)]), Value::Str("x".into())]);
        let b = Value::Array(vec![Value::Array(vec![Value::Int(1)]), Value::Str("x".into())]);
        let c = Value::Array(vec![Value::Array(vec![Value::Int(2)]), Value::Str("x".into())]);
        assert!(a.equals(&b, true).unwrap());
        assert!(!a.equals(&c, false).unwrap());
    }

    #[test]
    fn equals_rejects_undefined_operands() {
        assert!(matches!(
            Value::Undefined.equals(&Value::Int(1), false),
            Err(ValueError::UndefinedComparison)
        ));
    }

    #[test]
    fn sum_concatenates_strings_and_arrays() {
        assert_eq!(
            Value::Str("ab".into()).sum(&Value::Int(3)).unwrap(),
            Value::Str("ab3".into())
        );
        assert_eq!(
            Value::Array(vec![Value::Int(1)])
                .sum(&Value::Array(vec![Value::Int(2)]))
                .unwrap(),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn integer_closure_and_float_promotion() {
        assert_eq!(Value::Int(2).sum(&Value::Int(3)).unwrap(), Value::Int(5));
        assert_eq!(
            Value::Int(2).sum(&Value::Float(3.0)).unwrap(),
            Value::Float(5.0)
        );
        // Overflow promotes to float instead of wrapping
        let big = Value::Int(i64::MAX);
        assert_eq!(
            big.sum(&Value::Int(1)).unwrap().value_type(),
            ValueType::Float
        );
        assert_eq!(
            Value::Int(7).mul_rel(&Value::Int(2), MulOp::Div).unwrap(),
            Value::Float(3.5)
        );
        assert_eq!(
            Value::Int(6).mul_rel(&Value::Int(3), MulOp::Div).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            Value::Int(7).mul_rel(&Value::Int(3), MulOp::Mod).unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn min_int_divided_by_minus_one_does_not_panic() {
        let min = Value::Int(i64::MIN);
        assert_eq!(
            min.mul_rel(&Value::Int(-1), MulOp::Div).unwrap(),
            Value::Float(-(i64::MIN as f64))
        );
        assert_eq!(
            min.mul_rel(&Value::Int(-1), MulOp::Mod).unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(matches!(
            Value::Int(1).mul_rel(&Value::Int(0), MulOp::Div),
            Err(ValueError::DivideByZero)
        ));
        assert!(matches!(
            Value::Int(1).mul_rel(&Value::Float(0.0), MulOp::Mod),
            Err(ValueError::DivideByZero)
        ));
        // Multiplication by zero is fine
        assert_eq!(
            Value::Int(5).mul_rel(&Value::Int(0), MulOp::Mul).unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn pow_keeps_int_when_possible() {
        assert_eq!(Value::Int(2).pow(&Value::Int(10)).unwrap(), Value::Int(1024));
        assert_eq!(
            Value::Int(2).pow(&Value::Int(-1)).unwrap(),
            Value::Float(0.5)
        );
        assert_eq!(
            Value::Int(2).pow(&Value::Int(70)).unwrap().value_type(),
            ValueType::Float
        );
    }

    #[test]
    fn comparison_is_lexicographic_on_string_casts() {
        // "10" < "9" lexicographically
        assert_eq!(
            Value::Int(10).compare_str(&Value::Int(9)).unwrap(),
            std::cmp::Ordering::Less
        );
        assert_eq!(
            Value::Str("abc".into())
                .compare_str(&Value::Str("abd".into()))
                .unwrap(),
            std::cmp::Ordering::Less
        );
    }

    #[test]
    fn bool_ops_treat_undefined_as_false() {
        assert_eq!(
            Value::Undefined.bool_or(&Value::Bool(true)),
            Value::Bool(true)
        );
        assert_eq!(
            Value::Undefined.bool_and(&Value::Bool(true)),
            Value::Bool(false)
        );
        assert_eq!(
            Value::Undefined.bool_xor(&Value::Bool(true)),
            Value::Bool(true)
        );
    }

    #[test]
    fn permissive_numeric_parsing() {
        assert_eq!(Value::Str("12abc".into()).as_int().unwrap(), 12);
        assert_eq!(Value::Str("-7".into()).as_int().unwrap(), -7);
        assert_eq!(Value::Str("abc".into()).as_int().unwrap(), 0);
        assert_eq!(Value::Str("1.5e2x".into()).as_float().unwrap(), 150.0);
        assert_eq!(Value::Str(".5".into()).as_float().unwrap(), 0.5);
        assert_eq!(Value::Str("1e".into()).as_float().unwrap(), 1.0);
    }

    #[test]
    fn string_zero_is_falsy() {
        assert!(!Value::Str("0".into()).as_bool().unwrap());
        assert!(Value::Str("0.0".into()).as_bool().unwrap());
        assert!(!Value::Str(String::new()).as_bool().unwrap());
    }

    #[test]
    fn integral_floats_print_without_fraction() {
        assert_eq!(Value::Float(2.0).as_str().unwrap(), "2");
        assert_eq!(Value::Float(2.5).as_str().unwrap(), "2.5");
    }
}
