//! Runtime value model for filter expressions
//!
//! Values are dynamically typed: every operation accepts any combination of
//! runtime types and applies the engine's coercion rules. `Undefined` is a
//! first-class variant that propagates through operations instead of raising.

pub mod types;
pub mod value;

pub use types::ValueType;
pub use value::{MulOp, Value, ValueError, ValueResult};
