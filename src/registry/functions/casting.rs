//! Explicit type-casting functions

use crate::evaluator::EvaluationContext;
use crate::model::{Value, ValueType};
use crate::registry::function::{
    BuiltinFunction, FunctionError, FunctionRegistry, FunctionSignature,
};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("string", 1),
        |args, ctx| cast_to(args, ctx, ValueType::String),
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("int", 1),
        |args, ctx| cast_to(args, ctx, ValueType::Int),
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("float", 1),
        |args, ctx| cast_to(args, ctx, ValueType::Float),
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("bool", 1),
        |args, ctx| cast_to(args, ctx, ValueType::Bool),
    )));
}

fn cast_to(
    args: &[Value],
    _ctx: &mut EvaluationContext<'_>,
    target: ValueType,
) -> Result<Value, FunctionError> {
    Ok(args[0].cast(target)?)
}

#[cfg(test)]
mod tests {
    use super::super::testing::call_ok;
    use crate::model::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn string_casts() {
        assert_eq!(call_ok("string", &[Value::Int(42)]), Value::Str("42".into()));
        assert_eq!(call_ok("string", &[Value::Bool(true)]), Value::Str("1".into()));
        assert_eq!(call_ok("string", &[Value::Float(2.0)]), Value::Str("2".into()));
    }

    #[test]
    fn numeric_casts_parse_prefixes() {
        assert_eq!(call_ok("int", &[Value::Str("12abc".into())]), Value::Int(12));
        assert_eq!(call_ok("int", &[Value::Str("abc".into())]), Value::Int(0));
        assert_eq!(
            call_ok("float", &[Value::Str("2.5x".into())]),
            Value::Float(2.5)
        );
    }

    #[test]
    fn bool_casts() {
        assert_eq!(call_ok("bool", &[Value::Str("0".into())]), Value::Bool(false));
        assert_eq!(call_ok("bool", &[Value::Str("".into())]), Value::Bool(false));
        assert_eq!(call_ok("bool", &[Value::Str("x".into())]), Value::Bool(true));
        assert_eq!(call_ok("bool", &[Value::Array(vec![])]), Value::Bool(false));
    }
}
