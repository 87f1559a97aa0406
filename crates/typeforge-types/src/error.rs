use thiserror::Error;

use crate::TypeRef;

/// Errors raised while building, loading or validating a [`TypeGraph`](crate::TypeGraph).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A type reference points outside the graph.
    #[error("type {reference} referenced from {context} does not exist")]
    DanglingRef { reference: TypeRef, context: String },

    /// A union without members cannot be decoded.
    #[error("union {0} has no members")]
    EmptyUnion(TypeRef),

    /// Unions must be flattened by the producer.
    #[error("union {outer} directly contains union {inner}")]
    NestedUnion { outer: TypeRef, inner: TypeRef },

    /// A type reaches itself through arrays, maps or unions alone, so its
    /// converters would recurse forever.
    #[error("type {0} contains itself without an intervening class")]
    UnguardedCycle(TypeRef),

    /// The graph declares nothing to generate.
    #[error("type graph has no top-level types")]
    NoTopLevels,

    /// Two top-levels share a label.
    #[error("duplicate top-level name `{0}`")]
    DuplicateTopLevel(String),

    /// A class-only operation was applied to another kind of type.
    #[error("type {0} is not a class")]
    NotAClass(TypeRef),

    /// The serialized graph could not be read.
    #[error("invalid type graph JSON: {0}")]
    Json(String),
}

/// Result alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
