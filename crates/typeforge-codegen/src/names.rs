//! Identifier assignment for every named entity in a graph.
//!
//! Order is fixed: named types in graph order, then the top-level converter
//! functions, then each class's properties, then each enum's cases.  Every
//! run over the same graph therefore produces the same names.

use std::collections::HashMap;

use tracing::debug;
use typeforge_naming::{Identifier, Namespace, Role, Styler};
use typeforge_types::{TypeGraph, TypeRef};

use crate::error::{CodegenError, CodegenResult};
use crate::options::PythonOptions;
use crate::support::Converter;

/// Python 2 and 3 keywords, plus the constants that became keywords.
pub const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "exec", "finally", "for", "from",
    "global", "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "print",
    "raise", "return", "try", "while", "with", "yield",
];

/// Builtins and imported names the generated module relies on.
const GLOBALS: &[&str] = &[
    "Any", "Callable", "Dict", "Enum", "EnumT", "List", "Optional", "T", "Type", "TypeVar",
    "Union", "bool", "cast", "dataclass", "datetime", "dateutil", "dict", "float", "int",
    "isinstance", "json", "list", "long", "object", "str", "type", "unicode",
];

/// Names a property must not shadow inside `from_dict` / `to_dict`.
const PROPERTY_RESERVED: &[&str] = &["from_dict", "obj", "result", "self", "to_dict"];

/// Names for a top-level converter pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelNames {
    pub from_dict: Identifier,
    pub to_dict: Identifier,
}

/// All identifiers for one generation run.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    types: HashMap<TypeRef, Identifier>,
    properties: HashMap<(TypeRef, usize), Identifier>,
    cases: HashMap<(TypeRef, usize), Identifier>,
    top_levels: Vec<TopLevelNames>,
}

impl NameTable {
    #[tracing::instrument(level = "debug", skip_all, fields(types = graph.len()))]
    pub fn assign(graph: &TypeGraph, options: &PythonOptions) -> Self {
        let styler = Styler::new(options.features().grammar);
        let converters = Converter::ALL.iter().map(|c| c.name());
        let mut global = Namespace::with_forbidden(
            "global",
            KEYWORDS.iter().chain(GLOBALS).copied().chain(converters.clone()),
        );

        let mut table = NameTable::default();

        for t in graph.named_types() {
            if let Some(label) = graph.kind(t).label() {
                let name = global.assign(&styler, label, Role::Type);
                table.types.insert(t, name);
            }
        }

        for top in graph.top_levels() {
            let from_dict = global.assign(&styler, &format!("{}_from_dict", top.name), Role::Function);
            let to_dict = global.assign(&styler, &format!("{}_to_dict", top.name), Role::Function);
            table.top_levels.push(TopLevelNames { from_dict, to_dict });
        }

        let property_role = Role::Property {
            nice: options.nice_property_names,
        };
        let global_names: Vec<String> = global.bound().map(str::to_string).collect();
        for t in graph.classes() {
            let Some(class) = graph.class(t) else { continue };
            let mut scope = Namespace::with_forbidden(
                class.name.as_str(),
                KEYWORDS
                    .iter()
                    .chain(GLOBALS)
                    .chain(PROPERTY_RESERVED)
                    .copied()
                    .chain(converters.clone())
                    .chain(global_names.iter().map(String::as_str)),
            );
            for (i, property) in class.properties.iter().enumerate() {
                let name = scope.assign(&styler, &property.name, property_role);
                table.properties.insert((t, i), name);
            }
        }

        for t in graph.enums() {
            let Some(e) = graph.enum_type(t) else { continue };
            let mut scope = Namespace::with_forbidden(e.name.as_str(), KEYWORDS.iter().copied());
            for (i, case) in e.cases.iter().enumerate() {
                let name = scope.assign(&styler, case, Role::EnumCase);
                table.cases.insert((t, i), name);
            }
        }

        debug!(
            types = table.types.len(),
            properties = table.properties.len(),
            cases = table.cases.len(),
            "names assigned"
        );
        table
    }

    pub fn type_name(&self, t: TypeRef) -> CodegenResult<&str> {
        self.types
            .get(&t)
            .map(Identifier::as_str)
            .ok_or_else(|| CodegenError::UnresolvedName(format!("type {t}")))
    }

    pub fn property(&self, class: TypeRef, index: usize) -> CodegenResult<&str> {
        self.properties
            .get(&(class, index))
            .map(Identifier::as_str)
            .ok_or_else(|| CodegenError::UnresolvedName(format!("property {index} of {class}")))
    }

    pub fn case(&self, enumeration: TypeRef, index: usize) -> CodegenResult<&str> {
        self.cases
            .get(&(enumeration, index))
            .map(Identifier::as_str)
            .ok_or_else(|| CodegenError::UnresolvedName(format!("case {index} of {enumeration}")))
    }

    pub fn top_level(&self, index: usize) -> CodegenResult<&TopLevelNames> {
        self.top_levels
            .get(index)
            .ok_or_else(|| CodegenError::UnresolvedName(format!("top-level {index}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use typeforge_types::GraphBuilder;

    fn sample() -> (TypeGraph, TypeRef, TypeRef) {
        let mut b = GraphBuilder::new();
        let s = b.string();
        let kind = b.enumeration("kind", &["red apple", "Red-Apple", "class"]);
        let class = b.class(
            "class",
            &[("from", s), ("kind", kind), ("self", s), ("firstName", s), ("first_name", s)],
        );
        b.top_level("class", class);
        (b.build().unwrap(), class, kind)
    }

    #[test]
    fn types_and_functions_share_the_global_namespace() {
        let (graph, class, kind) = sample();
        let names = NameTable::assign(&graph, &PythonOptions::default());
        assert_eq!(names.type_name(kind).unwrap(), "Kind");
        assert_eq!(names.type_name(class).unwrap(), "Class");
        let top = names.top_level(0).unwrap();
        assert_eq!(top.from_dict.as_str(), "class_from_dict");
        assert_eq!(top.to_dict.as_str(), "class_to_dict");
    }

    #[test]
    fn properties_avoid_keywords_and_locals() {
        let (graph, class, _) = sample();
        let names = NameTable::assign(&graph, &PythonOptions::default());
        let props: Vec<&str> = (0..5).map(|i| names.property(class, i).unwrap()).collect();
        assert_eq!(props, ["from_", "kind", "self_", "first_name", "first_name_2"]);
    }

    #[test]
    fn raw_property_names() {
        let (graph, class, _) = sample();
        let options = PythonOptions {
            nice_property_names: false,
            ..PythonOptions::default()
        };
        let names = NameTable::assign(&graph, &options);
        assert_eq!(names.property(class, 3).unwrap(), "firstName");
        assert_eq!(names.property(class, 4).unwrap(), "first_name");
    }

    #[test]
    fn enum_cases_get_their_own_namespace() {
        let (graph, _, kind) = sample();
        let names = NameTable::assign(&graph, &PythonOptions::default());
        assert_eq!(names.case(kind, 0).unwrap(), "RED_APPLE");
        assert_eq!(names.case(kind, 1).unwrap(), "RED_APPLE_2");
        assert_eq!(names.case(kind, 2).unwrap(), "CLASS");
    }

    #[test]
    fn unknown_entities_are_errors() {
        let (graph, class, _) = sample();
        let names = NameTable::assign(&graph, &PythonOptions::default());
        assert!(matches!(names.property(class, 9), Err(CodegenError::UnresolvedName(_))));
        assert!(names.top_level(3).is_err());
    }
}
