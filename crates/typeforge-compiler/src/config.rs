//! Generator configuration.

use serde::{Deserialize, Serialize};
use typeforge_codegen::PythonOptions;

use crate::error::CompileResult;

/// Everything a generation run is configured with.  Every key is optional.
///
/// ```json
/// { "python": { "python-version": "3.6", "just-types": false } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GeneratorConfig {
    pub python: PythonOptions,
}

impl GeneratorConfig {
    pub fn from_json(json: &str) -> CompileResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
