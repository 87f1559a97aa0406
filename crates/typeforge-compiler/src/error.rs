//! Pipeline errors.

use thiserror::Error;
use typeforge_codegen::CodegenError;
use typeforge_types::GraphError;

/// Any failure between loading inputs and producing source.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The type graph is malformed.
    #[error("type graph: {0}")]
    Graph(#[from] GraphError),

    /// The generator configuration could not be read.
    #[error("configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The backend cannot express something in the graph.
    #[error("code generation: {0}")]
    Codegen(#[from] CodegenError),
}

/// Result alias for pipeline operations.
pub type CompileResult<T> = Result<T, CompileError>;
