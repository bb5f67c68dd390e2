//! The standard built-in functions, grouped by concern

mod casting;
mod ip;
mod membership;
mod regex_fns;
mod string;
mod transform;
mod vars_fns;

use super::function::FunctionRegistry;

/// Register every standard built-in into the given registry
pub(super) fn register_all(registry: &mut FunctionRegistry) {
    casting::register(registry);
    string::register(registry);
    regex_fns::register(registry);
    ip::register(registry);
    membership::register(registry);
    transform::register(registry);
    vars_fns::register(registry);
}
