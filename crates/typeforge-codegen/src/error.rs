//! Codegen error types.

use thiserror::Error;

/// Errors raised while generating source.  All of them are generation-time
/// failures: the type graph asked for something this backend cannot express.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// A type or transformer kind with no rendering in this backend.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// An internal consistency check failed.
    #[error("internal codegen error: {0}")]
    Internal(String),

    /// A named entity was rendered before it was given a name.
    #[error("unresolved name: {0}")]
    UnresolvedName(String),
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
