//! Typeforge compiler: orchestrates the full generation pipeline.
//!
//! ```text
//! graph JSON ─> TypeGraph (validate) ─> NameTable ─> Python renderer ─> source + SHA-256
//! ```
//!
//! The output is a pure function of the graph and the configuration, so the
//! fingerprint identifies a generation run.

pub mod config;
pub mod error;

pub use config::GeneratorConfig;
pub use error::{CompileError, CompileResult};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;
use typeforge_codegen::render_with_names;
use typeforge_types::TypeGraph;

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// The converter pair generated for one top-level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopLevelFunctions {
    /// The top-level's label in the graph.
    pub name: String,
    pub from_dict: String,
    pub to_dict: String,
}

/// Result of a successful generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileOutput {
    /// The generated Python module.
    pub source: String,
    /// Lower-case hex SHA-256 of `source`.
    pub sha256: String,
    /// Entry points, in graph order.  Empty in just-types mode.
    pub top_levels: Vec<TopLevelFunctions>,
}

/// Generate Python for `graph`.
#[tracing::instrument(level = "info", skip_all, fields(types = graph.len(), version = config.python.python_version.as_str()))]
pub fn compile(graph: &TypeGraph, config: &GeneratorConfig) -> CompileResult<CompileOutput> {
    let (source, names) = render_with_names(graph, &config.python)?;

    let mut top_levels = Vec::new();
    if !config.python.just_types {
        for (index, top) in graph.top_levels().iter().enumerate() {
            let fns = names.top_level(index)?;
            top_levels.push(TopLevelFunctions {
                name: top.name.clone(),
                from_dict: fns.from_dict.to_string(),
                to_dict: fns.to_dict.to_string(),
            });
        }
    }

    let sha256 = sha256_hex(source.as_bytes());
    info!(bytes = source.len(), sha256 = %sha256, "generated");
    Ok(CompileOutput {
        source,
        sha256,
        top_levels,
    })
}

/// Load a serialized graph and optional configuration, then [`compile`].
pub fn compile_json(graph_json: &str, config_json: Option<&str>) -> CompileResult<CompileOutput> {
    let graph = TypeGraph::from_json(graph_json)?;
    let config = match config_json {
        Some(json) => GeneratorConfig::from_json(json)?,
        None => GeneratorConfig::default(),
    };
    compile(&graph, &config)
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        hex.push_str(&format!("{b:02x}"));
    }
    hex
}
