//! Runtime error types for the reference runtime.

use thiserror::Error;

/// A failed conversion.  These correspond to the assertions and exceptions
/// raised by the generated Python code.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A shape assertion in a support function failed.
    #[error("assertion failed: expected {expected}, found {found}")]
    Shape { expected: String, found: String },

    /// `E(value)` with a value that is not a case of `E`.
    #[error("{value:?} is not a valid {enumeration}")]
    UnknownCase { enumeration: String, value: String },

    /// A string could not be parsed into the requested kind.
    #[error("cannot parse {input:?} as {kind}")]
    Parse { kind: &'static str, input: String },

    /// Every branch of a union try failed.
    #[error("no union member matched ({tried} tried)")]
    UnionExhausted { tried: usize },

    /// The graph asks for a conversion the runtime has no primitive for.
    #[error("unsupported conversion: {0}")]
    Unsupported(String),

    /// A decoded object cannot be represented as JSON.
    #[error("value is not JSON-representable: {0}")]
    NotJson(String),

    /// No top-level with this name exists in the graph.
    #[error("unknown top-level `{0}`")]
    UnknownTopLevel(String),
}

impl EvalError {
    pub(crate) fn shape(expected: impl Into<String>, found: impl Into<String>) -> Self {
        EvalError::Shape {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Result alias for runtime operations.
pub type EvalResult<T> = Result<T, EvalError>;
