//! The abstract type graph.
//!
//! Types live in an arena and refer to each other through [`TypeRef`]
//! indices, which lets classes be recursive without reference cycles.
//! Iteration order everywhere is declaration order: code generation must be
//! reproducible, so nothing here is ever iterated out of a hash map.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{GraphError, GraphResult};
use crate::transformer::{Transformation, Transformer};

// ══════════════════════════════════════════════════════════════════════════════
// References
// ══════════════════════════════════════════════════════════════════════════════

/// Index of a type inside a [`TypeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(pub u32);

impl TypeRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Kinds
// ══════════════════════════════════════════════════════════════════════════════

/// Strings that decode to something richer than `str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformedStringKind {
    /// ISO 8601 date-time.
    DateTime,
    /// A string holding a decimal integer, e.g. `"42"`.
    IntegerString,
}

/// The structural kind of a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TypeKind {
    Any,
    Null,
    Bool,
    Integer,
    Double,
    String,
    Array { items: TypeRef },
    Map { values: TypeRef },
    Class(ClassType),
    Enum(EnumType),
    Union(UnionType),
    TransformedString { format: TransformedStringKind },
}

impl TypeKind {
    /// Short human-readable kind name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Any => "any",
            TypeKind::Null => "null",
            TypeKind::Bool => "bool",
            TypeKind::Integer => "integer",
            TypeKind::Double => "double",
            TypeKind::String => "string",
            TypeKind::Array { .. } => "array",
            TypeKind::Map { .. } => "map",
            TypeKind::Class(_) => "class",
            TypeKind::Enum(_) => "enum",
            TypeKind::Union(_) => "union",
            TypeKind::TransformedString {
                format: TransformedStringKind::DateTime,
            } => "date-time",
            TypeKind::TransformedString {
                format: TransformedStringKind::IntegerString,
            } => "integer-string",
        }
    }

    /// Position of this kind in the canonical union member order.
    fn union_rank(&self) -> u8 {
        match self {
            TypeKind::Null => 0,
            TypeKind::Bool => 1,
            TypeKind::Integer => 2,
            TypeKind::Double => 3,
            TypeKind::String => 4,
            TypeKind::TransformedString {
                format: TransformedStringKind::DateTime,
            } => 5,
            TypeKind::TransformedString {
                format: TransformedStringKind::IntegerString,
            } => 6,
            TypeKind::Enum(_) => 7,
            TypeKind::Class(_) => 8,
            TypeKind::Array { .. } => 9,
            TypeKind::Map { .. } => 10,
            TypeKind::Any => 11,
            TypeKind::Union(_) => 12,
        }
    }

    /// The name label for classes and enums.
    pub fn label(&self) -> Option<&str> {
        match self {
            TypeKind::Class(c) => Some(&c.name),
            TypeKind::Enum(e) => Some(&e.name),
            _ => None,
        }
    }
}

/// A record type with named properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassType {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<ClassProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One property of a class, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProperty {
    /// The JSON key, verbatim.
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A closed set of string values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub cases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A value that may be any one of several member types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionType {
    pub members: Vec<TypeRef>,
}

/// A type plus its optional decode/encode transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    #[serde(flatten)]
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Transformation>,
}

/// A named entry point of the generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopLevel {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

// ══════════════════════════════════════════════════════════════════════════════
// TypeGraph
// ══════════════════════════════════════════════════════════════════════════════

/// The complete type graph for one generation run.
///
/// Deserializing goes through [`TypeGraph::new`], so a graph obtained from
/// serde is always validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGraph")]
pub struct TypeGraph {
    pub(crate) types: Vec<TypeNode>,
    pub(crate) top_levels: Vec<TopLevel>,
}

#[derive(Deserialize)]
struct RawGraph {
    types: Vec<TypeNode>,
    top_levels: Vec<TopLevel>,
}

impl TryFrom<RawGraph> for TypeGraph {
    type Error = GraphError;

    fn try_from(raw: RawGraph) -> GraphResult<Self> {
        Self::new(raw.types, raw.top_levels)
    }
}

impl TypeGraph {
    /// Assemble a graph from raw parts, validating and normalizing it.
    pub fn new(types: Vec<TypeNode>, top_levels: Vec<TopLevel>) -> GraphResult<Self> {
        let mut graph = Self { types, top_levels };
        graph.validate()?;
        graph.normalize();
        Ok(graph)
    }

    /// Load a graph serialized by the upstream inference engine.
    pub fn from_json(json: &str) -> GraphResult<Self> {
        let raw: RawGraph =
            serde_json::from_str(json).map_err(|e| GraphError::Json(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Serialize the graph back to pretty-printed JSON.
    pub fn to_json(&self) -> GraphResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::Json(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All type references in declaration order.
    pub fn refs(&self) -> impl Iterator<Item = TypeRef> + '_ {
        (0..self.types.len()).map(|i| TypeRef(i as u32))
    }

    /// The kind of `t`.  `t` must belong to this graph.
    pub fn kind(&self, t: TypeRef) -> &TypeKind {
        &self.types[t.index()].kind
    }

    pub fn transformation(&self, t: TypeRef) -> Option<&Transformation> {
        self.types[t.index()].transformation.as_ref()
    }

    pub fn class(&self, t: TypeRef) -> Option<&ClassType> {
        match self.kind(t) {
            TypeKind::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn enum_type(&self, t: TypeRef) -> Option<&EnumType> {
        match self.kind(t) {
            TypeKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn union_members(&self, t: TypeRef) -> Option<&[TypeRef]> {
        match self.kind(t) {
            TypeKind::Union(u) => Some(&u.members),
            _ => None,
        }
    }

    /// Whether `t` admits `null`: the null type itself or a union with a null member.
    pub fn is_nullable(&self, t: TypeRef) -> bool {
        match self.kind(t) {
            TypeKind::Null => true,
            TypeKind::Union(u) => u
                .members
                .iter()
                .any(|m| matches!(self.kind(*m), TypeKind::Null)),
            _ => false,
        }
    }

    /// Union members other than `null`, or `[t]` for non-union types.
    pub fn non_null_members(&self, t: TypeRef) -> Vec<TypeRef> {
        match self.kind(t) {
            TypeKind::Union(u) => u
                .members
                .iter()
                .copied()
                .filter(|m| !matches!(self.kind(*m), TypeKind::Null))
                .collect(),
            _ => vec![t],
        }
    }

    /// Classes and enums in declaration order.
    pub fn named_types(&self) -> impl Iterator<Item = TypeRef> + '_ {
        self.refs()
            .filter(|t| matches!(self.kind(*t), TypeKind::Class(_) | TypeKind::Enum(_)))
    }

    pub fn enums(&self) -> impl Iterator<Item = TypeRef> + '_ {
        self.refs().filter(|t| matches!(self.kind(*t), TypeKind::Enum(_)))
    }

    pub fn classes(&self) -> impl Iterator<Item = TypeRef> + '_ {
        self.refs().filter(|t| matches!(self.kind(*t), TypeKind::Class(_)))
    }

    pub fn top_levels(&self) -> &[TopLevel] {
        &self.top_levels
    }

    // ── Validation ───────────────────────────────────────────────────────

    /// Check referential integrity and structural rules.
    pub fn validate(&self) -> GraphResult<()> {
        if self.top_levels.is_empty() {
            return Err(GraphError::NoTopLevels);
        }
        let mut seen = HashSet::new();
        for top in &self.top_levels {
            if !seen.insert(top.name.as_str()) {
                return Err(GraphError::DuplicateTopLevel(top.name.clone()));
            }
            self.check_ref(top.ty, || format!("top-level `{}`", top.name))?;
        }

        for (i, node) in self.types.iter().enumerate() {
            let owner = TypeRef(i as u32);
            match &node.kind {
                TypeKind::Array { items: child } | TypeKind::Map { values: child } => {
                    self.check_ref(*child, || format!("{} {owner}", node.kind.name()))?;
                }
                TypeKind::Class(class) => {
                    for prop in &class.properties {
                        self.check_ref(prop.ty, || {
                            format!("property `{}` of class `{}`", prop.name, class.name)
                        })?;
                    }
                }
                TypeKind::Union(union) => {
                    if union.members.is_empty() {
                        return Err(GraphError::EmptyUnion(owner));
                    }
                    for member in &union.members {
                        self.check_ref(*member, || format!("union {owner}"))?;
                        if matches!(self.kind(*member), TypeKind::Union(_)) {
                            return Err(GraphError::NestedUnion {
                                outer: owner,
                                inner: *member,
                            });
                        }
                    }
                }
                _ => {}
            }

            if let Some(xf) = &node.transformation {
                let context = || format!("transformation of {owner}");
                self.check_ref(xf.target, context)?;
                self.check_transformer(&xf.transformer, owner)?;
                self.check_transformer(&xf.reverse, owner)?;
            }
        }
        self.check_cycles()
    }

    fn check_ref(&self, t: TypeRef, context: impl FnOnce() -> String) -> GraphResult<()> {
        if t.index() < self.types.len() {
            Ok(())
        } else {
            Err(GraphError::DanglingRef {
                reference: t,
                context: context(),
            })
        }
    }

    fn check_transformer(&self, xfer: &Transformer, owner: TypeRef) -> GraphResult<()> {
        let mut result = Ok(());
        xfer.visit_refs(&mut |t| {
            if result.is_ok() {
                result = self.check_ref(t, || format!("transformer of {owner}"));
            }
        });
        result
    }

    /// Types the converters of `t` recurse into without passing through a
    /// class: container elements, union members and anything its own
    /// transformation refers to.
    fn unguarded_edges(&self, t: TypeRef) -> Vec<TypeRef> {
        let node = &self.types[t.index()];
        let mut edges = match &node.kind {
            TypeKind::Array { items } => vec![*items],
            TypeKind::Map { values } => vec![*values],
            TypeKind::Union(union) => union.members.clone(),
            _ => Vec::new(),
        };
        if let Some(xf) = &node.transformation {
            let mut referenced = vec![xf.target];
            let mut collect = |r: TypeRef| referenced.push(r);
            xf.transformer.visit_refs(&mut collect);
            xf.reverse.visit_refs(&mut collect);
            // Naming its own type only reaches the structural edges above.
            edges.extend(referenced.into_iter().filter(|r| *r != t));
        }
        edges.retain(|r| !matches!(self.kind(*r), TypeKind::Class(_)));
        edges
    }

    /// Reject cycles that do not pass through a class.  Depth-first with an
    /// explicit stack, so deep graphs cannot overflow it.
    fn check_cycles(&self) -> GraphResult<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        let mut marks = vec![Mark::New; self.types.len()];
        for root in self.refs() {
            if marks[root.index()] != Mark::New || matches!(self.kind(root), TypeKind::Class(_)) {
                continue;
            }
            marks[root.index()] = Mark::Active;
            let mut stack = vec![(root, self.unguarded_edges(root), 0usize)];
            while let Some(frame) = stack.last_mut() {
                match frame.1.get(frame.2).copied() {
                    Some(child) => {
                        frame.2 += 1;
                        match marks[child.index()] {
                            Mark::Active => return Err(GraphError::UnguardedCycle(child)),
                            Mark::Done => {}
                            Mark::New => {
                                marks[child.index()] = Mark::Active;
                                stack.push((child, self.unguarded_edges(child), 0));
                            }
                        }
                    }
                    None => {
                        marks[frame.0.index()] = Mark::Done;
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }

    /// Put union members into canonical order (stable by kind rank).
    fn normalize(&mut self) {
        let ranks: Vec<u8> = self.types.iter().map(|n| n.kind.union_rank()).collect();
        for node in &mut self.types {
            if let TypeKind::Union(union) = &mut node.kind {
                union.members.sort_by_key(|m| ranks[m.index()]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: TypeKind) -> TypeNode {
        TypeNode {
            kind,
            transformation: None,
        }
    }

    fn top(ty: u32) -> Vec<TopLevel> {
        vec![TopLevel {
            name: "Root".into(),
            ty: TypeRef(ty),
        }]
    }

    #[test]
    fn union_members_are_sorted_by_kind() {
        let types = vec![
            node(TypeKind::String),
            node(TypeKind::Null),
            node(TypeKind::Integer),
            node(TypeKind::Union(UnionType {
                members: vec![TypeRef(0), TypeRef(2), TypeRef(1)],
            })),
        ];
        let graph = TypeGraph::new(types, top(3)).unwrap();
        assert_eq!(
            graph.union_members(TypeRef(3)).unwrap(),
            &[TypeRef(1), TypeRef(2), TypeRef(0)]
        );
        assert!(graph.is_nullable(TypeRef(3)));
        assert_eq!(graph.non_null_members(TypeRef(3)), vec![TypeRef(2), TypeRef(0)]);
    }

    #[test]
    fn dangling_reference_is_rejected() {
        let types = vec![node(TypeKind::Array { items: TypeRef(7) })];
        let err = TypeGraph::new(types, top(0)).unwrap_err();
        assert!(matches!(err, GraphError::DanglingRef { reference: TypeRef(7), .. }));
    }

    #[test]
    fn nested_union_is_rejected() {
        let types = vec![
            node(TypeKind::Null),
            node(TypeKind::Union(UnionType {
                members: vec![TypeRef(0)],
            })),
            node(TypeKind::Union(UnionType {
                members: vec![TypeRef(1)],
            })),
        ];
        let err = TypeGraph::new(types, top(2)).unwrap_err();
        assert_eq!(
            err,
            GraphError::NestedUnion {
                outer: TypeRef(2),
                inner: TypeRef(1)
            }
        );
    }

    #[test]
    fn self_containing_array_is_rejected() {
        let types = vec![node(TypeKind::Array { items: TypeRef(0) })];
        let err = TypeGraph::new(types, top(0)).unwrap_err();
        assert_eq!(err, GraphError::UnguardedCycle(TypeRef(0)));
    }

    #[test]
    fn union_through_map_is_rejected() {
        let types = vec![
            node(TypeKind::Null),
            node(TypeKind::Union(UnionType {
                members: vec![TypeRef(0), TypeRef(2)],
            })),
            node(TypeKind::Map { values: TypeRef(1) }),
        ];
        let err = TypeGraph::new(types, top(1)).unwrap_err();
        assert!(matches!(err, GraphError::UnguardedCycle(_)), "{err}");
    }

    #[test]
    fn cycle_through_class_is_accepted() {
        let types = vec![
            node(TypeKind::Class(ClassType {
                name: "Node".into(),
                properties: vec![ClassProperty {
                    name: "children".into(),
                    ty: TypeRef(1),
                    description: None,
                }],
                description: None,
            })),
            node(TypeKind::Array { items: TypeRef(0) }),
        ];
        assert!(TypeGraph::new(types, top(0)).is_ok());
    }

    #[test]
    fn deserializing_validates() {
        let json = r#"{"types": [{"kind": "array", "items": 5}], "top_levels": [{"name": "Root", "type": 0}]}"#;
        assert!(serde_json::from_str::<TypeGraph>(json).is_err());
        let json = r#"{"types": [{"kind": "array", "items": 0}], "top_levels": [{"name": "Root", "type": 0}]}"#;
        assert!(serde_json::from_str::<TypeGraph>(json).is_err());
        assert!(matches!(
            TypeGraph::from_json(json),
            Err(GraphError::UnguardedCycle(TypeRef(0)))
        ));
    }

    #[test]
    fn deserialized_graph_is_normalized() {
        let json = r#"{"types": [{"kind": "string"}, {"kind": "null"}, {"kind": "union", "members": [0, 1]}],
                       "top_levels": [{"name": "Root", "type": 2}]}"#;
        let graph: TypeGraph = serde_json::from_str(json).unwrap();
        assert_eq!(graph.union_members(TypeRef(2)).unwrap(), &[TypeRef(1), TypeRef(0)]);
        assert_eq!(TypeGraph::from_json(&graph.to_json().unwrap()).unwrap(), graph);
    }

    #[test]
    fn empty_top_levels_are_rejected() {
        let err = TypeGraph::new(vec![node(TypeKind::Any)], vec![]).unwrap_err();
        assert_eq!(err, GraphError::NoTopLevels);
    }

    #[test]
    fn kind_names() {
        assert_eq!(TypeKind::Double.name(), "double");
        assert_eq!(
            TypeKind::TransformedString {
                format: TransformedStringKind::IntegerString
            }
            .name(),
            "integer-string"
        );
    }
}
