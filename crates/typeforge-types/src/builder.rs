//! Incremental construction of a [`TypeGraph`].
//!
//! Primitive types are interned so every `integer` in a graph is the same
//! [`TypeRef`].  Classes may be declared before their properties are known,
//! which is how recursive types are built.

use std::collections::HashMap;

use crate::error::{GraphError, GraphResult};
use crate::graph::{
    ClassProperty, ClassType, EnumType, TopLevel, TransformedStringKind, TypeGraph, TypeKind,
    TypeNode, TypeRef, UnionType,
};
use crate::transformer::{Transformation, Transformer};

/// Builder for [`TypeGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    types: Vec<TypeNode>,
    interned: HashMap<&'static str, TypeRef>,
    top_levels: Vec<TopLevel>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: TypeKind) -> TypeRef {
        let t = TypeRef(self.types.len() as u32);
        self.types.push(TypeNode {
            kind,
            transformation: None,
        });
        t
    }

    fn interned(&mut self, kind: TypeKind) -> TypeRef {
        let key = kind.name();
        if let Some(t) = self.interned.get(key) {
            return *t;
        }
        let t = self.push(kind);
        self.interned.insert(key, t);
        t
    }

    // ── Primitives ───────────────────────────────────────────────────────

    pub fn any(&mut self) -> TypeRef {
        self.interned(TypeKind::Any)
    }

    pub fn null(&mut self) -> TypeRef {
        self.interned(TypeKind::Null)
    }

    pub fn boolean(&mut self) -> TypeRef {
        self.interned(TypeKind::Bool)
    }

    pub fn integer(&mut self) -> TypeRef {
        self.interned(TypeKind::Integer)
    }

    pub fn double(&mut self) -> TypeRef {
        self.interned(TypeKind::Double)
    }

    pub fn string(&mut self) -> TypeRef {
        self.interned(TypeKind::String)
    }

    pub fn date_time(&mut self) -> TypeRef {
        self.interned(TypeKind::TransformedString {
            format: TransformedStringKind::DateTime,
        })
    }

    /// A string carrying an integer, with its canonical transformation:
    /// decode as string, parse to integer; reverse: stringify, encode as string.
    pub fn integer_string(&mut self) -> TypeRef {
        if let Some(t) = self.interned.get("integer-string") {
            return *t;
        }
        let string = self.string();
        let integer = self.integer();
        let t = self.interned(TypeKind::TransformedString {
            format: TransformedStringKind::IntegerString,
        });
        self.types[t.index()].transformation = Some(Transformation {
            target: integer,
            transformer: Transformer::decode(string, Some(Transformer::parse_string(string, None))),
            reverse: Transformer::stringify(integer, Some(Transformer::encode(string))),
        });
        t
    }

    // ── Composites ───────────────────────────────────────────────────────

    pub fn array(&mut self, items: TypeRef) -> TypeRef {
        self.push(TypeKind::Array { items })
    }

    pub fn map(&mut self, values: TypeRef) -> TypeRef {
        self.push(TypeKind::Map { values })
    }

    /// Declare a class without properties; fill it with [`Self::add_property`].
    pub fn declare_class(&mut self, name: impl Into<String>) -> TypeRef {
        self.push(TypeKind::Class(ClassType {
            name: name.into(),
            properties: Vec::new(),
            description: None,
        }))
    }

    pub fn class(&mut self, name: impl Into<String>, properties: &[(&str, TypeRef)]) -> TypeRef {
        let t = self.declare_class(name);
        if let TypeKind::Class(class) = &mut self.types[t.index()].kind {
            class.properties = properties
                .iter()
                .map(|(name, ty)| ClassProperty {
                    name: (*name).to_string(),
                    ty: *ty,
                    description: None,
                })
                .collect();
        }
        t
    }

    pub fn add_property(
        &mut self,
        class: TypeRef,
        name: impl Into<String>,
        ty: TypeRef,
    ) -> GraphResult<()> {
        match self.types.get_mut(class.index()).map(|n| &mut n.kind) {
            Some(TypeKind::Class(c)) => {
                c.properties.push(ClassProperty {
                    name: name.into(),
                    ty,
                    description: None,
                });
                Ok(())
            }
            _ => Err(GraphError::NotAClass(class)),
        }
    }

    pub fn enumeration(&mut self, name: impl Into<String>, cases: &[&str]) -> TypeRef {
        self.push(TypeKind::Enum(EnumType {
            name: name.into(),
            cases: cases.iter().map(|c| (*c).to_string()).collect(),
            description: None,
        }))
    }

    pub fn union(&mut self, members: &[TypeRef]) -> TypeRef {
        self.push(TypeKind::Union(UnionType {
            members: members.to_vec(),
        }))
    }

    /// `t | null`.
    pub fn nullable(&mut self, t: TypeRef) -> TypeRef {
        let null = self.null();
        self.union(&[null, t])
    }

    // ── Annotations ──────────────────────────────────────────────────────

    /// Attach a description to a class or enum, or to one of a class's properties.
    pub fn describe(&mut self, t: TypeRef, property: Option<&str>, text: impl Into<String>) {
        let text = Some(text.into());
        match (&mut self.types[t.index()].kind, property) {
            (TypeKind::Class(c), None) => c.description = text,
            (TypeKind::Enum(e), None) => e.description = text,
            (TypeKind::Class(c), Some(name)) => {
                if let Some(p) = c.properties.iter_mut().find(|p| p.name == name) {
                    p.description = text;
                }
            }
            _ => {}
        }
    }

    pub fn set_transformation(&mut self, t: TypeRef, transformation: Transformation) {
        self.types[t.index()].transformation = Some(transformation);
    }

    pub fn top_level(&mut self, name: impl Into<String>, ty: TypeRef) {
        self.top_levels.push(TopLevel {
            name: name.into(),
            ty,
        });
    }

    /// Validate and finish the graph.
    pub fn build(self) -> GraphResult<TypeGraph> {
        TypeGraph::new(self.types, self.top_levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransformerKind;

    #[test]
    fn primitives_are_interned() {
        let mut b = GraphBuilder::new();
        let a = b.integer();
        let c = b.integer();
        assert_eq!(a, c);
        assert_ne!(b.string(), a);
    }

    #[test]
    fn recursive_class() {
        let mut b = GraphBuilder::new();
        let node = b.declare_class("Node");
        let children = b.array(node);
        b.add_property(node, "children", children).unwrap();
        b.top_level("Node", node);
        let graph = b.build().unwrap();
        let class = graph.class(node).unwrap();
        assert_eq!(class.properties[0].ty, children);
    }

    #[test]
    fn add_property_to_non_class_fails() {
        let mut b = GraphBuilder::new();
        let s = b.string();
        assert_eq!(b.add_property(s, "x", s), Err(GraphError::NotAClass(s)));
    }

    #[test]
    fn integer_string_carries_transformation() {
        let mut b = GraphBuilder::new();
        let t = b.integer_string();
        assert_eq!(b.integer_string(), t);
        b.top_level("Id", t);
        let graph = b.build().unwrap();
        let xf = graph.transformation(t).unwrap();
        assert_eq!(graph.kind(xf.target), &TypeKind::Integer);
        assert!(matches!(xf.transformer.kind, TransformerKind::Decode { .. }));
        assert!(matches!(xf.reverse.kind, TransformerKind::Stringify { .. }));
    }

    #[test]
    fn graph_json_round_trip() {
        let mut b = GraphBuilder::new();
        let s = b.string();
        let opt = b.nullable(s);
        let kind = b.enumeration("Kind", &["a", "b"]);
        let class = b.class("Thing", &[("name", s), ("nick", opt), ("kind", kind)]);
        b.describe(class, Some("nick"), "A nickname");
        b.top_level("Thing", class);
        let graph = b.build().unwrap();

        let json = graph.to_json().unwrap();
        let back = TypeGraph::from_json(&json).unwrap();
        pretty_assertions::assert_eq!(back, graph);
    }
}
