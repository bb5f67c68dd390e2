//! Text normalization functions used by anti-spam filters

use crate::evaluator::EvaluationContext;
use crate::model::Value;
use crate::registry::function::{
    BuiltinFunction, FunctionError, FunctionRegistry, FunctionSignature,
};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("rmdoubles", 1),
        rmdoubles,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("rmspecials", 1),
        rmspecials,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("rmwhitespace", 1),
        rmwhitespace,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("specialratio", 1),
        specialratio,
    )));
}

/// Collapse runs of the same character to a single occurrence
fn rmdoubles(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let source = args[0].as_str()?;
    let mut out = String::with_capacity(source.len());
    let mut previous = None;
    for c in source.chars() {
        if previous != Some(c) {
            out.push(c);
        }
        previous = Some(c);
    }
    Ok(Value::Str(out))
}

/// Strip everything but letters and digits
fn rmspecials(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let source = args[0].as_str()?;
    Ok(Value::Str(
        source.chars().filter(|c| c.is_alphanumeric()).collect(),
    ))
}

/// Strip all whitespace
fn rmwhitespace(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let source = args[0].as_str()?;
    Ok(Value::Str(
        source.chars().filter(|c| !c.is_whitespace()).collect(),
    ))
}

/// Fraction of characters that are neither letters nor digits; 0.0 for the
/// empty string
fn specialratio(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let source = args[0].as_str()?;
    let total = source.chars().count();
    if total == 0 {
        return Ok(Value::Float(0.0));
    }
    let specials = source.chars().filter(|c| !c.is_alphanumeric()).count();
    Ok(Value::Float(specials as f64 / total as f64))
}
