//! Python backend options.

use serde::{Deserialize, Serialize};
use typeforge_naming::Grammar;

/// Target Python version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PythonVersion {
    #[serde(rename = "2.7")]
    Py27,
    #[serde(rename = "3.5")]
    Py35,
    #[serde(rename = "3.6")]
    Py36,
    #[serde(rename = "3.7")]
    #[default]
    Py37,
}

/// Language features a [`PythonVersion`] makes available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PythonFeatures {
    /// Annotated signatures and class fields (`x: int`).
    pub type_hints: bool,
    /// `@dataclass` classes.
    pub dataclasses: bool,
    /// Identifier grammar.
    pub grammar: Grammar,
    /// Classes derive from `object` explicitly.
    pub object_base: bool,
    /// Non-ASCII string literals need a `u` prefix.
    pub unicode_prefix: bool,
    /// Decoded JSON strings may be `unicode` and integers `long`.
    pub legacy_builtins: bool,
}

impl PythonVersion {
    pub fn features(self) -> PythonFeatures {
        let py2 = self == PythonVersion::Py27;
        PythonFeatures {
            type_hints: self >= PythonVersion::Py36,
            dataclasses: self >= PythonVersion::Py37,
            grammar: if py2 { Grammar::Ascii } else { Grammar::Unicode },
            object_base: py2,
            unicode_prefix: py2,
            legacy_builtins: py2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PythonVersion::Py27 => "2.7",
            PythonVersion::Py35 => "3.5",
            PythonVersion::Py36 => "3.6",
            PythonVersion::Py37 => "3.7",
        }
    }
}

/// Options for the Python renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PythonOptions {
    pub python_version: PythonVersion,
    /// Emit only type declarations, without conversion code.
    pub just_types: bool,
    /// Snake-case property names instead of keeping the JSON keys.
    pub nice_property_names: bool,
}

impl Default for PythonOptions {
    fn default() -> Self {
        Self {
            python_version: PythonVersion::default(),
            just_types: false,
            nice_property_names: true,
        }
    }
}

impl PythonOptions {
    pub fn features(&self) -> PythonFeatures {
        self.python_version.features()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_features() {
        let py27 = PythonVersion::Py27.features();
        assert!(!py27.type_hints && py27.object_base && py27.legacy_builtins);
        assert_eq!(py27.grammar, Grammar::Ascii);

        let py36 = PythonVersion::Py36.features();
        assert!(py36.type_hints && !py36.dataclasses && !py36.legacy_builtins);
        assert_eq!(py36.grammar, Grammar::Unicode);

        assert!(PythonVersion::Py37.features().dataclasses);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: PythonOptions = serde_json::from_str(r#"{"python-version": "3.6"}"#).unwrap();
        assert_eq!(opts.python_version, PythonVersion::Py36);
        assert!(opts.nice_property_names);
        assert!(!opts.just_types);

        let opts: PythonOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, PythonOptions::default());
    }
}
