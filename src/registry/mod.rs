//! Built-in function registry
//!
//! A fixed table of the functions callable from filter text. The evaluator
//! checks arity against each function's signature before dispatch and turns
//! [`FunctionError`]s into positioned user-visible errors.

pub mod function;
mod functions;

pub use function::{FilterFunction, FunctionError, FunctionRegistry, FunctionSignature};
