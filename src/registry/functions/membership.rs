//! Variadic membership tests

use crate::evaluator::EvaluationContext;
use crate::model::Value;
use crate::registry::function::{
    BuiltinFunction, FunctionError, FunctionRegistry, FunctionSignature,
};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::variadic("contains_any", 2),
        contains_any,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::variadic("contains_all", 2),
        contains_all,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::variadic("equals_to_any", 2),
        equals_to_any,
    )));
}

/// Whether the haystack contains at least one of the needles
fn contains_any(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let haystack = args[0].as_str()?;
    for needle in &args[1..] {
        let needle = needle.as_str()?;
        if !needle.is_empty() && haystack.contains(&needle) {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

/// Whether the haystack contains every needle; an empty needle is never
/// contained
fn contains_all(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let haystack = args[0].as_str()?;
    for needle in &args[1..] {
        let needle = needle.as_str()?;
        if needle.is_empty() || !haystack.contains(&needle) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// Whether the subject is strictly equal to any of the candidates
fn equals_to_any(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let subject = &args[0];
    for candidate in &args[1..] {
        if subject.equals(candidate, true)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

#[cfg(test)]
mod tests {
    use super::super::testing::call_ok;
    use crate::model::Value;
    use pretty_assertions::assert_eq;

    fn s(text: &str) -> Value {
        Value::Str(text.into())
    }

    #[test]
    fn contains_any_matches_one_needle() {
        assert_eq!(
            call_ok("contains_any", &[s("hello world"), s("xyz"), s("wor")]),
            Value::Bool(true)
        );
        assert_eq!(
            call_ok("contains_any", &[s("hello"), s("xyz"), s("")]),
            Value::Bool(false)
        );
    }

    #[test]
    fn contains_all_needs_every_needle() {
        assert_eq!(
            call_ok("contains_all", &[s("hello world"), s("hell"), s("wor")]),
            Value::Bool(true)
        );
        assert_eq!(
            call_ok("contains_all", &[s("hello world"), s("hell"), s("xyz")]),
            Value::Bool(false)
        );
    }

    #[test]
    fn equals_to_any_is_strict() {
        assert_eq!(
            call_ok("equals_to_any", &[Value::Int(1), s("1"), Value::Int(2)]),
            Value::Bool(false)
        );
        assert_eq!(
            call_ok("equals_to_any", &[Value::Int(1), s("1"), Value::Int(1)]),
            Value::Bool(true)
        );
    }
}
