//! Runtime support functions for generated Python.
//!
//! The transformer compiler records which converters it references in a
//! [`Requirements`] context; only those are emitted, in canonical order.

use std::collections::BTreeSet;

use tracing::debug;

use crate::emit::{Emitter, ImportSet, Section};
use crate::options::{PythonFeatures, PythonVersion};

/// A support function the generated code may call.
///
/// Variant order is emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Converter {
    FromNone,
    FromBool,
    FromInt,
    FromFloat,
    ToFloat,
    FromStr,
    FromDatetime,
    FromList,
    FromDict,
    FromUnion,
    IsType,
    ToEnum,
    ToClass,
}

impl Converter {
    pub const ALL: [Converter; 13] = [
        Converter::FromNone,
        Converter::FromBool,
        Converter::FromInt,
        Converter::FromFloat,
        Converter::ToFloat,
        Converter::FromStr,
        Converter::FromDatetime,
        Converter::FromList,
        Converter::FromDict,
        Converter::FromUnion,
        Converter::IsType,
        Converter::ToEnum,
        Converter::ToClass,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Converter::FromNone => "from_none",
            Converter::FromBool => "from_bool",
            Converter::FromInt => "from_int",
            Converter::FromFloat => "from_float",
            Converter::ToFloat => "to_float",
            Converter::FromStr => "from_str",
            Converter::FromDatetime => "from_datetime",
            Converter::FromList => "from_list",
            Converter::FromDict => "from_dict",
            Converter::FromUnion => "from_union",
            Converter::IsType => "is_type",
            Converter::ToEnum => "to_enum",
            Converter::ToClass => "to_class",
        }
    }

    /// Whether the hinted signature refers to the type variable `T`.
    fn uses_t(self) -> bool {
        matches!(
            self,
            Converter::FromList | Converter::FromDict | Converter::IsType | Converter::ToClass
        )
    }

    /// Signature and body for the target's feature set.
    fn source(self, features: PythonFeatures) -> (&'static str, &'static [&'static str]) {
        let legacy = features.legacy_builtins;
        match (self, features.type_hints) {
            (Converter::FromNone, true) => ("def from_none(x: Any) -> Any:", &["assert x is None", "return x"]),
            (Converter::FromNone, false) => ("def from_none(x):", &["assert x is None", "return x"]),
            (Converter::FromBool, true) => ("def from_bool(x: Any) -> bool:", &["assert isinstance(x, bool)", "return x"]),
            (Converter::FromBool, false) => ("def from_bool(x):", &["assert isinstance(x, bool)", "return x"]),
            (Converter::FromInt, true) => (
                "def from_int(x: Any) -> int:",
                &["assert isinstance(x, int) and not isinstance(x, bool)", "return x"],
            ),
            (Converter::FromInt, false) if legacy => (
                "def from_int(x):",
                &["assert isinstance(x, (int, long)) and not isinstance(x, bool)", "return x"],
            ),
            (Converter::FromInt, false) => (
                "def from_int(x):",
                &["assert isinstance(x, int) and not isinstance(x, bool)", "return x"],
            ),
            (Converter::FromFloat, true) => (
                "def from_float(x: Any) -> float:",
                &["assert isinstance(x, (float, int)) and not isinstance(x, bool)", "return float(x)"],
            ),
            (Converter::FromFloat, false) if legacy => (
                "def from_float(x):",
                &["assert isinstance(x, (float, int, long)) and not isinstance(x, bool)", "return float(x)"],
            ),
            (Converter::FromFloat, false) => (
                "def from_float(x):",
                &["assert isinstance(x, (float, int)) and not isinstance(x, bool)", "return float(x)"],
            ),
            (Converter::ToFloat, true) => ("def to_float(x: Any) -> float:", &["assert isinstance(x, float)", "return x"]),
            (Converter::ToFloat, false) => ("def to_float(x):", &["assert isinstance(x, float)", "return x"]),
            (Converter::FromStr, true) => ("def from_str(x: Any) -> str:", &["assert isinstance(x, str)", "return x"]),
            (Converter::FromStr, false) if legacy => ("def from_str(x):", &["assert isinstance(x, (str, unicode))", "return x"]),
            (Converter::FromStr, false) => ("def from_str(x):", &["assert isinstance(x, str)", "return x"]),
            (Converter::FromDatetime, true) => ("def from_datetime(x: Any) -> datetime:", &["return dateutil.parser.parse(x)"]),
            (Converter::FromDatetime, false) => ("def from_datetime(x):", &["return dateutil.parser.parse(x)"]),
            (Converter::FromList, true) => (
                "def from_list(f: Callable[[Any], T], x: Any) -> List[T]:",
                &["assert isinstance(x, list)", "return [f(y) for y in x]"],
            ),
            (Converter::FromList, false) => (
                "def from_list(f, x):",
                &["assert isinstance(x, list)", "return [f(y) for y in x]"],
            ),
            (Converter::FromDict, true) => (
                "def from_dict(f: Callable[[Any], T], x: Any) -> Dict[str, T]:",
                &["assert isinstance(x, dict)", "return { k: f(v) for (k, v) in x.items() }"],
            ),
            (Converter::FromDict, false) => (
                "def from_dict(f, x):",
                &["assert isinstance(x, dict)", "return { k: f(v) for (k, v) in x.items() }"],
            ),
            (Converter::FromUnion, _) => (
                "def from_union(fs, x):",
                &[
                    "for f in fs:",
                    "    try:",
                    "        return f(x)",
                    "    except:",
                    "        pass",
                    "assert False",
                ],
            ),
            (Converter::IsType, true) => ("def is_type(t: Type[T], x: Any) -> T:", &["assert isinstance(x, t)", "return x"]),
            (Converter::IsType, false) => ("def is_type(t, x):", &["assert isinstance(x, t)", "return x"]),
            (Converter::ToEnum, true) => ("def to_enum(c: Type[EnumT], x: Any) -> EnumT:", &["assert isinstance(x, c)", "return x.value"]),
            (Converter::ToEnum, false) => ("def to_enum(c, x):", &["assert isinstance(x, c)", "return x.value"]),
            (Converter::ToClass, true) => (
                "def to_class(c: Type[T], x: Any) -> dict:",
                &["assert isinstance(x, c)", "return cast(Any, x).to_dict()"],
            ),
            (Converter::ToClass, false) => ("def to_class(c, x):", &["assert isinstance(x, c)", "return x.to_dict()"]),
        }
    }

    /// Imports the emitted definition needs.
    fn register_imports(self, hints: bool, imports: &mut ImportSet) {
        if self == Converter::FromDatetime {
            imports.module("dateutil.parser");
            if hints {
                imports.from("datetime", "datetime");
            }
        }
        if !hints {
            return;
        }
        let typing: &[&str] = match self {
            Converter::FromList => &["Any", "Callable", "List", "TypeVar"],
            Converter::FromDict => &["Any", "Callable", "Dict", "TypeVar"],
            Converter::FromUnion => &[],
            Converter::IsType => &["Any", "Type", "TypeVar"],
            Converter::ToEnum => &["Any", "Type", "TypeVar"],
            Converter::ToClass => &["Any", "Type", "TypeVar", "cast"],
            _ => &["Any"],
        };
        for name in typing {
            imports.from("typing", name);
        }
        if self == Converter::ToEnum {
            imports.from("enum", "Enum");
        }
    }
}

/// What the generated file needs: support functions and imports.
#[derive(Debug, Clone)]
pub struct Requirements {
    converters: BTreeSet<Converter>,
    pub imports: ImportSet,
    features: PythonFeatures,
}

impl Default for Requirements {
    fn default() -> Self {
        Self::new()
    }
}

impl Requirements {
    /// Requirements for the default Python version.
    pub fn new() -> Self {
        Self::with_features(PythonVersion::default().features())
    }

    pub fn with_features(features: PythonFeatures) -> Self {
        Self {
            converters: BTreeSet::new(),
            imports: ImportSet::default(),
            features,
        }
    }

    pub fn features(&self) -> PythonFeatures {
        self.features
    }

    pub fn use_converter(&mut self, converter: Converter) {
        if self.converters.insert(converter) {
            debug!(converter = converter.name(), "converter required");
        }
    }

    pub fn uses(&self, converter: Converter) -> bool {
        self.converters.contains(&converter)
    }

    pub fn converters(&self) -> impl Iterator<Item = Converter> + '_ {
        self.converters.iter().copied()
    }

    pub fn import_from(&mut self, module: &str, name: &str) {
        self.imports.from(module, name);
    }

    /// Emit type variables and the used support functions.
    pub fn emit_support(&mut self, out: &mut Emitter) {
        let hints = self.features.type_hints;
        let used: Vec<Converter> = self.converters().collect();
        for c in &used {
            c.register_imports(hints, &mut self.imports);
        }

        if hints {
            out.set_section(Section::Prelude);
            if used.iter().any(|c| c.uses_t()) {
                out.line("T = TypeVar(\"T\")");
            }
            if used.contains(&Converter::ToEnum) {
                out.line("EnumT = TypeVar(\"EnumT\", bound=Enum)");
            }
        }

        out.set_section(Section::Support);
        for c in used {
            let (signature, body) = c.source(self.features);
            out.line(signature);
            out.indented(|out| {
                for line in body {
                    out.line(*line);
                }
            });
            out.blank(2);
        }
    }
}
