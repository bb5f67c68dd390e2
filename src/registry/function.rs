//! Function trait, registry and error types

use crate::evaluator::EvaluationContext;
use crate::model::{Value, ValueError};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors raised inside a built-in function
///
/// The evaluator wraps these into positioned user-visible errors, so every
/// variant maps to a stable message id.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FunctionError {
    /// A user-supplied pattern did not compile
    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidRegex {
        /// The pattern as written in the filter
        pattern: String,
        /// The compiler's diagnostic
        message: String,
    },

    /// A user-supplied IP range was not a CIDR block, dash range or address
    #[error("invalid IP range '{range}'")]
    InvalidIpRange {
        /// The range as written in the filter
        range: String,
    },

    /// An argument could not be coerced to the type the function needs
    #[error(transparent)]
    Value(#[from] ValueError),
}

impl FunctionError {
    /// Stable message key for reporting to the filter's author
    pub fn message_id(&self) -> &'static str {
        match self {
            FunctionError::InvalidRegex { .. } => "regexfailure",
            FunctionError::InvalidIpRange { .. } => "invalidiprange",
            FunctionError::Value(_) => "unexpectedtype",
        }
    }
}

/// Name and arity range of a built-in function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// The name filters call the function by
    pub name: &'static str,
    /// Minimum number of arguments
    pub min_args: usize,
    /// Maximum number of arguments; `None` means variadic
    pub max_args: Option<usize>,
}

impl FunctionSignature {
    /// A function taking exactly `arity` arguments
    pub const fn fixed(name: &'static str, arity: usize) -> Self {
        Self {
            name,
            min_args: arity,
            max_args: Some(arity),
        }
    }

    /// A function taking between `min` and `max` arguments
    pub const fn ranged(name: &'static str, min: usize, max: usize) -> Self {
        Self {
            name,
            min_args: min,
            max_args: Some(max),
        }
    }

    /// A function taking at least `min` arguments with no upper bound
    pub const fn variadic(name: &'static str, min: usize) -> Self {
        Self {
            name,
            min_args: min,
            max_args: None,
        }
    }
}

/// A built-in function callable from filter text
///
/// Arguments arrive already evaluated; the context is passed through so
/// functions like `set_var` can write filter-local bindings.
pub trait FilterFunction: Send + Sync {
    /// Name and arity range, checked by the evaluator before dispatch
    fn signature(&self) -> &FunctionSignature;

    /// Whether an `Undefined` argument makes the result `Undefined` without
    /// running the body; true for every pure function
    fn propagates_undefined(&self) -> bool {
        true
    }

    /// Apply the function to already-evaluated arguments
    fn evaluate(
        &self,
        args: &[Value],
        ctx: &mut EvaluationContext<'_>,
    ) -> Result<Value, FunctionError>;
}

/// Adapter wrapping a plain function pointer as a [`FilterFunction`]
///
/// Every standard built-in is one of these; only functions needing state
/// beyond their arguments would implement the trait directly.
pub(crate) struct BuiltinFunction {
    signature: FunctionSignature,
    propagates_undefined: bool,
    body: fn(&[Value], &mut EvaluationContext<'_>) -> Result<Value, FunctionError>,
}

impl BuiltinFunction {
    pub(crate) const fn pure(
        signature: FunctionSignature,
        body: fn(&[Value], &mut EvaluationContext<'_>) -> Result<Value, FunctionError>,
    ) -> Self {
        Self {
            signature,
            propagates_undefined: true,
            body,
        }
    }

    pub(crate) const fn raw(
        signature: FunctionSignature,
        body: fn(&[Value], &mut EvaluationContext<'_>) -> Result<Value, FunctionError>,
    ) -> Self {
        Self {
            signature,
            propagates_undefined: false,
            body,
        }
    }
}

impl FilterFunction for BuiltinFunction {
    fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    fn propagates_undefined(&self) -> bool {
        self.propagates_undefined
    }

    fn evaluate(
        &self,
        args: &[Value],
        ctx: &mut EvaluationContext<'_>,
    ) -> Result<Value, FunctionError> {
        (self.body)(args, ctx)
    }
}

/// Lookup table of built-in functions, keyed by call name
///
/// The registry is fixed at construction and shared read-only by every
/// evaluation, so it carries no interior mutability.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<&'static str, Box<dyn FilterFunction>>,
}

impl FunctionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of all standard built-ins
    pub fn standard() -> Self {
        let mut registry = Self::new();
        super::functions::register_all(&mut registry);
        registry
    }

    /// Add a function under its signature name, replacing any previous one
    pub fn register(&mut self, function: Box<dyn FilterFunction>) {
        self.functions.insert(function.signature().name, function);
    }

    /// Look up a function by call name
    pub fn get(&self, name: &str) -> Option<&dyn FilterFunction> {
        self.functions.get(name).map(Box::as_ref)
    }

    /// Whether the name is a registered function
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}
