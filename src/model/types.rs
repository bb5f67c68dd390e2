//! Runtime type tags for filter values

use serde::{Deserialize, Serialize};
use std::fmt;

/// The runtime type of a [`Value`](crate::model::Value)
///
/// Used as a casting target and in diagnostics. `Undefined` is a valid tag
/// but never a valid casting target or source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// 64-bit signed integer
    Int,
    /// Double-precision float
    Float,
    /// UTF-8 string
    String,
    /// Boolean
    Bool,
    /// Null
    Null,
    /// Heterogeneous ordered sequence
    Array,
    /// Placeholder for a value that could not be computed
    Undefined,
}

impl ValueType {
    /// Lowercase name used in error messages and variable dumps
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Bool => "bool",
            ValueType::Null => "null",
            ValueType::Array => "array",
            ValueType::Undefined => "undefined",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
