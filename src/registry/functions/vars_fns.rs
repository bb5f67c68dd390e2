//! Functions that write filter-local bindings

use crate::evaluator::EvaluationContext;
use crate::model::Value;
use crate::registry::function::{
    BuiltinFunction, FunctionError, FunctionRegistry, FunctionSignature,
};

pub(super) fn register(registry: &mut FunctionRegistry) {
    // Not pure: storing an Undefined is a valid, if pointless, binding
    registry.register(Box::new(BuiltinFunction::raw(
        FunctionSignature::fixed("set", 2),
        set_var,
    )));
    registry.register(Box::new(BuiltinFunction::raw(
        FunctionSignature::fixed("set_var", 2),
        set_var,
    )));
}

/// Functional form of `name := value`; returns the assigned value
fn set_var(args: &[Value], ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    if args[0].is_undefined() {
        return Ok(Value::Undefined);
    }
    let name = args[0].as_str()?;
    ctx.set_local(&name, args[1].clone());
    Ok(args[1].clone())
}
