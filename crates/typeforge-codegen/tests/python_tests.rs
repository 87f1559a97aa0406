//! Integration tests for the Python renderer.
//!
//! Tests validate:
//! - Full module layout for Python 3.7 (dataclasses)
//! - Python 3.6 annotated classes and Python 2.7 plain classes
//! - Python 2.7 converters accept `unicode` strings and `long` integers
//! - Just-types mode
//! - Forward references, docstrings, keyword escaping
//! - Deterministic output

use pretty_assertions::assert_eq;
use typeforge_codegen::{render, render_with_names, PythonOptions, PythonVersion};
use typeforge_types::{GraphBuilder, TypeGraph};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// A person with an enum, an optional int, a list and a date-time.
fn person_graph() -> TypeGraph {
    let mut b = GraphBuilder::new();
    let s = b.string();
    let i = b.integer();
    let color = b.enumeration("color", &["red", "light blue"]);
    let age = b.nullable(i);
    let dt = b.date_time();
    let tags = b.array(s);
    let person = b.class(
        "person",
        &[
            ("name", s),
            ("age", age),
            ("favorite-color", color),
            ("tags", tags),
            ("born", dt),
        ],
    );
    b.describe(person, None, "A person.");
    b.top_level("Person", person);
    b.build().unwrap()
}

/// A recursive tree node.
fn node_graph() -> TypeGraph {
    let mut b = GraphBuilder::new();
    let node = b.declare_class("Node");
    let children = b.array(node);
    let next = b.nullable(node);
    let f = b.double();
    b.add_property(node, "value", f).unwrap();
    b.add_property(node, "children", children).unwrap();
    b.add_property(node, "next", next).unwrap();
    b.top_level("Tree", node);
    b.build().unwrap()
}

fn options(version: PythonVersion) -> PythonOptions {
    PythonOptions {
        python_version: version,
        ..PythonOptions::default()
    }
}

fn render_with(graph: &TypeGraph, options: &PythonOptions) -> String {
    render(graph, options).unwrap_or_else(|e| panic!("render failed: {e}"))
}

// ══════════════════════════════════════════════════════════════════════════════
// Python 3.7
// ══════════════════════════════════════════════════════════════════════════════

const PERSON_PY37: &str = r#"# This code parses date/times, so please
#
#     pip install python-dateutil
#
# To use this code, make sure you
#
#     import json
#
# and then, to convert JSON from a string, do
#
#     result = person_from_dict(json.loads(json_string))


from dataclasses import dataclass
from datetime import datetime
from enum import Enum
from typing import Any, Callable, List, Optional, Type, TypeVar, cast
import dateutil.parser


T = TypeVar("T")
EnumT = TypeVar("EnumT", bound=Enum)


def from_none(x: Any) -> Any:
    assert x is None
    return x


def from_int(x: Any) -> int:
    assert isinstance(x, int) and not isinstance(x, bool)
    return x


def from_str(x: Any) -> str:
    assert isinstance(x, str)
    return x


def from_datetime(x: Any) -> datetime:
    return dateutil.parser.parse(x)


def from_list(f: Callable[[Any], T], x: Any) -> List[T]:
    assert isinstance(x, list)
    return [f(y) for y in x]


def from_union(fs, x):
    for f in fs:
        try:
            return f(x)
        except:
            pass
    assert False


def to_enum(c: Type[EnumT], x: Any) -> EnumT:
    assert isinstance(x, c)
    return x.value


def to_class(c: Type[T], x: Any) -> dict:
    assert isinstance(x, c)
    return cast(Any, x).to_dict()


class Color(Enum):
    RED = "red"
    LIGHT_BLUE = "light blue"


@dataclass
class Person:
    """A person."""
    name: str
    favorite_color: Color
    tags: List[str]
    born: datetime
    age: Optional[int] = None

    @staticmethod
    def from_dict(obj: Any) -> 'Person':
        assert isinstance(obj, dict)
        name = from_str(obj.get("name"))
        favorite_color = Color(obj.get("favorite-color"))
        tags = from_list(from_str, obj.get("tags"))
        born = from_datetime(obj.get("born"))
        age = from_union([from_none, from_int], obj.get("age"))
        return Person(name, favorite_color, tags, born, age)

    def to_dict(self) -> dict:
        result: dict = {}
        result["name"] = from_str(self.name)
        result["favorite-color"] = to_enum(Color, self.favorite_color)
        result["tags"] = from_list(from_str, self.tags)
        result["born"] = self.born.isoformat()
        if self.age is not None:
            result["age"] = from_union([from_none, from_int], self.age)
        return result


def person_from_dict(s: Any) -> Person:
    return Person.from_dict(s)


def person_to_dict(x: Person) -> Any:
    return to_class(Person, x)
"#;

#[test]
fn person_module_py37() {
    let source = render_with(&person_graph(), &PythonOptions::default());
    assert_eq!(source, PERSON_PY37);
}

#[test]
fn output_is_deterministic() {
    let graph = person_graph();
    let opts = PythonOptions::default();
    let first = render_with(&graph, &opts);
    for _ in 0..20 {
        assert_eq!(render_with(&graph, &opts), first);
    }
}

#[test]
fn recursive_class_uses_forward_references() {
    let source = render_with(&node_graph(), &PythonOptions::default());
    assert!(source.contains("    value: float\n    children: List['Node']\n    next: Optional['Node'] = None\n"));
    assert!(source.contains("children = from_list(Node.from_dict, obj.get(\"children\"))"));
    assert!(source.contains("next = from_union([from_none, Node.from_dict], obj.get(\"next\"))"));
    assert!(source.contains(
        "result[\"next\"] = from_union([from_none, lambda x: to_class(Node, x)], self.next)"
    ));
    assert!(source.contains("result[\"value\"] = to_float(self.value)"));
    assert!(source.contains("def tree_from_dict(s: Any) -> Node:"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Other versions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn person_class_py36_has_annotations_and_init() {
    let source = render_with(&person_graph(), &options(PythonVersion::Py36));
    let expected_class = r#"class Person:
    """A person."""
    name: str
    age: Optional[int]
    favorite_color: Color
    tags: List[str]
    born: datetime

    def __init__(self, name: str, age: Optional[int], favorite_color: Color, tags: List[str], born: datetime) -> None:
        self.name = name
        self.age = age
        self.favorite_color = favorite_color
        self.tags = tags
        self.born = born
"#;
    assert!(source.contains(expected_class), "{source}");
    assert!(!source.contains("@dataclass"));
    assert!(!source.contains("from dataclasses"));
    assert!(source.contains("return Person(name, age, favorite_color, tags, born)"));
}

#[test]
fn rendered_names_match_the_module() {
    let graph = person_graph();
    let (source, names) = render_with_names(&graph, &PythonOptions::default()).unwrap();
    assert_eq!(source, render_with(&graph, &PythonOptions::default()));
    let fns = names.top_level(0).unwrap();
    assert!(source.contains(&format!("def {}(s: Any) -> Person:", fns.from_dict)));
    assert!(source.contains(&format!("def {}(x: Person) -> Any:", fns.to_dict)));
}

#[test]
fn person_module_py27_has_no_hints() {
    let source = render_with(&person_graph(), &options(PythonVersion::Py27));
    assert!(source.contains("class Person(object):\n    \"\"\"A person.\"\"\"\n\n    def __init__(self, name, age, favorite_color, tags, born):\n"));
    assert!(source.contains("    @staticmethod\n    def from_dict(obj):\n"));
    assert!(source.contains("    def to_dict(self):\n        result = {}\n"));
    assert!(source.contains("def person_from_dict(s):\n    return Person.from_dict(s)"));
    assert!(source.contains("def to_class(c, x):\n    assert isinstance(x, c)\n    return x.to_dict()"));
    assert!(source.contains("def from_str(x):\n    assert isinstance(x, (str, unicode))\n    return x"));
    assert!(source.contains("def from_int(x):\n    assert isinstance(x, (int, long)) and not isinstance(x, bool)\n"));
    assert!(!source.contains("typing"));
    assert!(!source.contains("TypeVar"));
    assert!(source.contains("from enum import Enum\nimport dateutil.parser\n"));
}

#[test]
fn py27_uses_ascii_identifiers_and_unicode_literals() {
    let mut b = GraphBuilder::new();
    let s = b.string();
    let class = b.class("Café", &[("naïve", s)]);
    b.top_level("Café", class);
    let graph = b.build().unwrap();

    let source = render_with(&graph, &options(PythonVersion::Py27));
    assert!(source.is_ascii());
    assert!(source.contains("class Caf(object):"));
    assert!(source.contains("na_ve = from_str(obj.get(u\"na\\u00efve\"))"));

    let source = render_with(&graph, &PythonOptions::default());
    assert!(source.contains("class Café:"));
    assert!(source.contains("naïve = from_str(obj.get(\"na\\u00efve\"))"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Options and naming
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn just_types_emits_declarations_only() {
    let opts = PythonOptions {
        just_types: true,
        ..PythonOptions::default()
    };
    let source = render_with(&person_graph(), &opts);
    assert!(!source.contains("def "));
    assert!(!source.contains("# To use this code"));
    assert!(!source.contains("TypeVar"));
    assert!(source.starts_with("from dataclasses import dataclass\n"));
    assert!(source.contains("@dataclass\nclass Person:\n    \"\"\"A person.\"\"\"\n    name: str\n"));
}

#[test]
fn raw_property_names_keep_json_keys() {
    let opts = PythonOptions {
        nice_property_names: false,
        ..PythonOptions::default()
    };
    let source = render_with(&person_graph(), &opts);
    assert!(source.contains("    favorite_color: Color\n"));

    let mut b = GraphBuilder::new();
    let s = b.string();
    let class = b.class("Row", &[("firstName", s), ("class", s)]);
    b.top_level("Row", class);
    let source = render_with(&b.build().unwrap(), &opts);
    assert!(source.contains("    firstName: str\n    class_: str\n"));
    assert!(source.contains("result[\"class\"] = from_str(self.class_)"));
}

#[test]
fn empty_class_and_enum_get_pass() {
    let mut b = GraphBuilder::new();
    let e = b.enumeration("Nothing", &[]);
    let c = b.class("Empty", &[("e", e)]);
    let empty = b.class("Bare", &[]);
    b.top_level("Empty", c);
    b.top_level("Bare", empty);
    let opts = PythonOptions {
        just_types: true,
        ..PythonOptions::default()
    };
    let source = render_with(&b.build().unwrap(), &opts);
    assert!(source.contains("class Nothing(Enum):\n    pass\n"));
    assert!(source.ends_with("@dataclass\nclass Bare:\n    pass\n"));
}

#[test]
fn header_lists_every_top_level() {
    let mut b = GraphBuilder::new();
    let i = b.integer();
    let list = b.array(i);
    b.top_level("counts", list);
    b.top_level("total", i);
    let source = render_with(&b.build().unwrap(), &PythonOptions::default());
    assert!(source.starts_with("# To use this code"));
    assert!(source.contains(
        "#     result = counts_from_dict(json.loads(json_string))\n#     result = total_from_dict(json.loads(json_string))\n"
    ));
    assert!(source.contains("def counts_from_dict(s: Any) -> List[int]:\n    return from_list(from_int, s)"));
    assert!(source.contains("def total_to_dict(x: int) -> Any:\n    return from_int(x)"));
}

#[test]
fn integer_strings_decode_through_their_transformation() {
    let mut b = GraphBuilder::new();
    let id = b.integer_string();
    let class = b.class("Item", &[("id", id)]);
    b.top_level("Item", class);
    let source = render_with(&b.build().unwrap(), &PythonOptions::default());
    assert!(source.contains("    id: int\n"));
    assert!(source.contains("id = int(from_str(obj.get(\"id\")))"));
    assert!(source.contains("result[\"id\"] = from_str(str(self.id))"));
}
