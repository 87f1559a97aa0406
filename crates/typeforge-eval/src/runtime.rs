//! Interpreter for the decode/encode contract.
//!
//! [`Runtime`] walks the same transformer trees and primitive conversions
//! the Python backend compiles, but executes them directly.  Each primitive
//! behaves like its generated support function: shape mismatches fail
//! instead of coercing, and unions try their branches in order.

use std::collections::BTreeMap;

use tracing::trace;
use typeforge_types::{
    Container, TransformedStringKind, Transformer, TransformerKind, TypeGraph, TypeKind, TypeRef,
};

use crate::error::{EvalError, EvalResult};
use crate::value::{Timestamp, Value};

/// Which way a transformer tree runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Decode,
    Encode,
}

// ══════════════════════════════════════════════════════════════════════════════
// Union try
// ══════════════════════════════════════════════════════════════════════════════

/// Apply each branch to `value` in order and return the first success.
///
/// Branches after the first success are never called.  Fails only when
/// every branch fails.
pub fn from_union<I, F>(branches: I, value: &Value) -> EvalResult<Value>
where
    I: IntoIterator<Item = F>,
    F: FnOnce(&Value) -> EvalResult<Value>,
{
    let mut tried = 0;
    for branch in branches {
        tried += 1;
        match branch(value) {
            Ok(v) => return Ok(v),
            Err(e) => trace!(branch = tried, error = %e, "union branch failed"),
        }
    }
    Err(EvalError::UnionExhausted { tried })
}

// ══════════════════════════════════════════════════════════════════════════════
// Runtime
// ══════════════════════════════════════════════════════════════════════════════

pub struct Runtime<'g> {
    graph: &'g TypeGraph,
}

impl<'g> Runtime<'g> {
    pub fn new(graph: &'g TypeGraph) -> Self {
        Self { graph }
    }

    // ── Top-levels ───────────────────────────────────────────────────────

    fn top_level_type(&self, name: &str) -> EvalResult<TypeRef> {
        self.graph
            .top_levels()
            .iter()
            .find(|top| top.name == name)
            .map(|top| top.ty)
            .ok_or_else(|| EvalError::UnknownTopLevel(name.to_string()))
    }

    /// `<name>_from_dict(json.loads(...))`
    #[tracing::instrument(level = "debug", skip(self, json))]
    pub fn decode_top_level(&self, name: &str, json: &serde_json::Value) -> EvalResult<Value> {
        let t = self.top_level_type(name)?;
        self.decode(Value::from_json(json), t)
    }

    /// `json.dumps(<name>_to_dict(value))`
    #[tracing::instrument(level = "debug", skip(self, value))]
    pub fn encode_top_level(&self, name: &str, value: &Value) -> EvalResult<serde_json::Value> {
        let t = self.top_level_type(name)?;
        self.encode(value.clone(), t)?.to_json()
    }

    // ── Entry points ─────────────────────────────────────────────────────

    /// Decode a generic JSON value as `t`.
    pub fn decode(&self, value: Value, t: TypeRef) -> EvalResult<Value> {
        match self.graph.transformation(t) {
            Some(xf) => self.transform(value, &xf.transformer, xf.target, Direction::Decode),
            None => self.decode_primitive(value, t),
        }
    }

    /// Encode a value of `t` back to its generic JSON shape.
    pub fn encode(&self, value: Value, t: TypeRef) -> EvalResult<Value> {
        match self.graph.transformation(t) {
            Some(xf) => self.transform(value, &xf.reverse, t, Direction::Encode),
            None => self.encode_primitive(value, t),
        }
    }

    /// Run one transformer node, and its consumers, on `value`.
    pub fn transform(
        &self,
        value: Value,
        xfer: &Transformer,
        target: TypeRef,
        direction: Direction,
    ) -> EvalResult<Value> {
        let graph = self.graph;
        match &xfer.kind {
            TransformerKind::Choice { branches } => from_union(
                branches
                    .iter()
                    .map(|b| move |v: &Value| self.transform(v.clone(), b, target, direction)),
                &value,
            ),
            TransformerKind::Decode { consumer } => {
                let decoded = self.decode_primitive(value, xfer.source)?;
                self.consume(consumer.as_deref(), decoded, target, direction)
            }
            TransformerKind::Encode => self.encode_primitive(value, xfer.source),
            TransformerKind::Elements {
                container,
                element,
                consumer,
            } => {
                let item_target = match (graph.kind(target), container) {
                    (TypeKind::Array { items }, Container::List) => *items,
                    (TypeKind::Map { values }, Container::Dict) => *values,
                    _ => target,
                };
                let each = |v: Value| self.transform(v, element, item_target, direction);
                let mapped = match container {
                    Container::List => map_list(value, each)?,
                    Container::Dict => map_dict(value, each)?,
                };
                self.consume(consumer.as_deref(), mapped, target, direction)
            }
            TransformerKind::UnionMemberMatch { member, consumer } => {
                self.is_type(&value, *member, direction)?;
                self.consume(consumer.as_deref(), value, target, direction)
            }
            TransformerKind::UnionInstantiation => Ok(value),
            TransformerKind::ParseString { consumer } => {
                let immediate = consumer.as_ref().map_or(target, |c| c.source);
                let Value::Str(s) = &value else {
                    return Err(EvalError::shape("str", value.type_name()));
                };
                let parsed = match graph.kind(immediate) {
                    TypeKind::Integer => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                        EvalError::Parse {
                            kind: "int",
                            input: s.clone(),
                        }
                    })?,
                    TypeKind::Enum(_) => self.enum_member(immediate, &value)?,
                    TypeKind::TransformedString {
                        format: TransformedStringKind::DateTime,
                    } => Value::DateTime(Timestamp::parse(s)?),
                    other => {
                        return Err(EvalError::Unsupported(format!(
                            "parsing a string into {}",
                            other.name()
                        )))
                    }
                };
                self.consume(consumer.as_deref(), parsed, target, direction)
            }
            TransformerKind::Stringify { consumer } => {
                let rendered = match (graph.kind(xfer.source), &value) {
                    (TypeKind::Integer, Value::Int(i)) => Value::Str(i.to_string()),
                    (TypeKind::Enum(_), _) => self.enum_value(xfer.source, &value)?,
                    (
                        TypeKind::TransformedString {
                            format: TransformedStringKind::DateTime,
                        },
                        _,
                    ) => isoformat(&value)?,
                    (TypeKind::Integer, other) => {
                        return Err(EvalError::shape("int", other.type_name()))
                    }
                    (other, _) => {
                        return Err(EvalError::Unsupported(format!("stringifying {}", other.name())))
                    }
                };
                self.consume(consumer.as_deref(), rendered, target, direction)
            }
        }
    }

    fn consume(
        &self,
        consumer: Option<&Transformer>,
        value: Value,
        target: TypeRef,
        direction: Direction,
    ) -> EvalResult<Value> {
        match consumer {
            Some(next) => self.transform(value, next, target, direction),
            None => Ok(value),
        }
    }

    // ── Primitive conversions ────────────────────────────────────────────

    fn decode_primitive(&self, value: Value, t: TypeRef) -> EvalResult<Value> {
        let graph = self.graph;
        match (graph.kind(t), value) {
            (TypeKind::Any, v) => Ok(v),
            (TypeKind::Null, Value::None) => Ok(Value::None),
            (TypeKind::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (TypeKind::Integer, Value::Int(i)) => Ok(Value::Int(i)),
            (TypeKind::Double, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (TypeKind::Double, Value::Float(x)) => Ok(Value::Float(x)),
            (TypeKind::String, Value::Str(s)) => Ok(Value::Str(s)),
            (TypeKind::Array { items }, v) => map_list(v, |item| self.decode(item, *items)),
            (TypeKind::Map { values }, v) => map_dict(v, |item| self.decode(item, *values)),
            (TypeKind::Class(class), Value::Dict(mut obj)) => {
                let mut fields = BTreeMap::new();
                for p in &class.properties {
                    let raw = obj.remove(&p.name).unwrap_or(Value::None);
                    fields.insert(p.name.clone(), self.decode(raw, p.ty)?);
                }
                Ok(Value::Object {
                    class: class.name.clone(),
                    fields,
                })
            }
            (TypeKind::Enum(_), v) => self.enum_member(t, &v),
            (TypeKind::Union(u), v) => from_union(
                u.members.iter().map(|m| move |x: &Value| self.decode(x.clone(), *m)),
                &v,
            ),
            (
                TypeKind::TransformedString {
                    format: TransformedStringKind::DateTime,
                },
                Value::Str(s),
            ) => Ok(Value::DateTime(Timestamp::parse(&s)?)),
            (
                TypeKind::TransformedString {
                    format: TransformedStringKind::IntegerString,
                },
                _,
            ) => Err(EvalError::Unsupported(format!(
                "integer-string {t} has no transformation"
            ))),
            (kind, v) => Err(EvalError::shape(json_shape(kind), v.type_name())),
        }
    }

    fn encode_primitive(&self, value: Value, t: TypeRef) -> EvalResult<Value> {
        let graph = self.graph;
        match (graph.kind(t), value) {
            (TypeKind::Any, v) => Ok(v),
            (TypeKind::Null, Value::None) => Ok(Value::None),
            (TypeKind::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (TypeKind::Integer, Value::Int(i)) => Ok(Value::Int(i)),
            (TypeKind::Double, Value::Float(x)) => Ok(Value::Float(x)),
            (TypeKind::String, Value::Str(s)) => Ok(Value::Str(s)),
            (TypeKind::Array { items }, v) => map_list(v, |item| self.encode(item, *items)),
            (TypeKind::Map { values }, v) => map_dict(v, |item| self.encode(item, *values)),
            (TypeKind::Class(class), Value::Object { class: name, mut fields }) if name == class.name => {
                let mut result = BTreeMap::new();
                for p in &class.properties {
                    let value = fields.remove(&p.name).unwrap_or(Value::None);
                    if value.is_none() && graph.is_nullable(p.ty) {
                        continue;
                    }
                    result.insert(p.name.clone(), self.encode(value, p.ty)?);
                }
                Ok(Value::Dict(result))
            }
            (TypeKind::Enum(_), v) => self.enum_value(t, &v),
            (TypeKind::Union(u), v) => from_union(
                u.members.iter().map(|m| move |x: &Value| self.encode(x.clone(), *m)),
                &v,
            ),
            (
                TypeKind::TransformedString {
                    format: TransformedStringKind::DateTime,
                },
                v,
            ) => isoformat(&v),
            (
                TypeKind::TransformedString {
                    format: TransformedStringKind::IntegerString,
                },
                _,
            ) => Err(EvalError::Unsupported(format!(
                "integer-string {t} has no transformation"
            ))),
            (TypeKind::Class(class), v) => Err(EvalError::shape(class.name.clone(), v.type_name())),
            (kind, v) => Err(EvalError::shape(kind.name(), v.type_name())),
        }
    }

    // ── Named types ──────────────────────────────────────────────────────

    /// `E(value)`: look an enum member up by its value.
    fn enum_member(&self, t: TypeRef, value: &Value) -> EvalResult<Value> {
        let e = self
            .graph
            .enum_type(t)
            .ok_or_else(|| EvalError::Unsupported(format!("{t} is not an enum")))?;
        match value {
            Value::Str(s) if e.cases.contains(s) => Ok(Value::Enum {
                enumeration: e.name.clone(),
                case: s.clone(),
            }),
            other => Err(EvalError::UnknownCase {
                enumeration: e.name.clone(),
                value: other.to_string(),
            }),
        }
    }

    /// `to_enum(E, value)`
    fn enum_value(&self, t: TypeRef, value: &Value) -> EvalResult<Value> {
        let e = self
            .graph
            .enum_type(t)
            .ok_or_else(|| EvalError::Unsupported(format!("{t} is not an enum")))?;
        match value {
            Value::Enum { enumeration, case } if *enumeration == e.name => Ok(Value::Str(case.clone())),
            other => Err(EvalError::shape(e.name.clone(), other.type_name())),
        }
    }

    /// `is_type(T, value)` with the type object the compiler picks for `member`.
    fn is_type(&self, value: &Value, member: TypeRef, direction: Direction) -> EvalResult<()> {
        let graph = self.graph;
        let kind = graph.kind(member);
        let ok = match (kind, direction, value) {
            (TypeKind::Null, _, Value::None) => true,
            (TypeKind::Bool, _, Value::Bool(_)) => true,
            // isinstance(True, int) holds in Python.
            (TypeKind::Integer, _, Value::Int(_) | Value::Bool(_)) => true,
            (TypeKind::Double, _, Value::Float(_)) => true,
            (TypeKind::String, _, Value::Str(_)) => true,
            (TypeKind::Array { .. }, _, Value::List(_)) => true,
            (TypeKind::Map { .. }, _, Value::Dict(_)) => true,
            (TypeKind::Class(_), Direction::Decode, Value::Dict(_)) => true,
            (TypeKind::Enum(_) | TypeKind::TransformedString { .. }, Direction::Decode, Value::Str(_)) => true,
            (TypeKind::Class(c), Direction::Encode, Value::Object { class, .. }) => *class == c.name,
            (TypeKind::Enum(e), Direction::Encode, Value::Enum { enumeration, .. }) => *enumeration == e.name,
            (
                TypeKind::TransformedString {
                    format: TransformedStringKind::DateTime,
                },
                Direction::Encode,
                Value::DateTime(_),
            ) => true,
            (
                TypeKind::TransformedString {
                    format: TransformedStringKind::IntegerString,
                },
                Direction::Encode,
                Value::Int(_) | Value::Bool(_),
            ) => true,
            (TypeKind::Any | TypeKind::Union(_), _, _) => {
                return Err(EvalError::Unsupported(format!(
                    "no runtime type object for {}",
                    kind.name()
                )))
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(EvalError::shape(kind.name(), value.type_name()))
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// `from_list(f, value)`
fn map_list(value: Value, f: impl Fn(Value) -> EvalResult<Value>) -> EvalResult<Value> {
    match value {
        Value::List(items) => Ok(Value::List(items.into_iter().map(f).collect::<EvalResult<_>>()?)),
        other => Err(EvalError::shape("list", other.type_name())),
    }
}

/// `from_dict(f, value)`
fn map_dict(value: Value, f: impl Fn(Value) -> EvalResult<Value>) -> EvalResult<Value> {
    match value {
        Value::Dict(map) => Ok(Value::Dict(
            map.into_iter()
                .map(|(k, v)| Ok((k, f(v)?)))
                .collect::<EvalResult<_>>()?,
        )),
        other => Err(EvalError::shape("dict", other.type_name())),
    }
}

/// `value.isoformat()`
fn isoformat(value: &Value) -> EvalResult<Value> {
    match value {
        Value::DateTime(ts) => Ok(Value::Str(ts.isoformat())),
        other => Err(EvalError::shape("datetime", other.type_name())),
    }
}

/// The JSON shape a decoder for `kind` asserts.
fn json_shape(kind: &TypeKind) -> &'static str {
    match kind {
        TypeKind::Null => "None",
        TypeKind::Bool => "bool",
        TypeKind::Integer => "int",
        TypeKind::Double => "float",
        TypeKind::String | TypeKind::Enum(_) | TypeKind::TransformedString { .. } => "str",
        TypeKind::Array { .. } => "list",
        TypeKind::Class(_) | TypeKind::Map { .. } => "dict",
        TypeKind::Any | TypeKind::Union(_) => "any",
    }
}
