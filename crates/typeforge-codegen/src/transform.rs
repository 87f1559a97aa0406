//! Transformer compiler.
//!
//! Compiles the declarative transformer trees attached to types, and the
//! primitive conversion for every other kind, into [`ValueOrLambda`]s.
//! Starting from a value (`obj.get("x")`) yields an inline expression;
//! starting from [`ValueOrLambda::Identity`] yields a reusable function,
//! which is how list elements, dict values and union branches are built.
//!
//! Every converter referenced is recorded in the [`Requirements`] context.

use typeforge_types::{
    Container, TransformedStringKind, Transformer, TransformerKind, TypeGraph, TypeKind, TypeRef,
};

use crate::error::{CodegenError, CodegenResult};
use crate::names::NameTable;
use crate::support::{Converter, Requirements};
use crate::value::{Function, ValueOrLambda};

/// Which way a transformer tree runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Generic JSON value → target type.
    Decode,
    /// Target type → generic JSON value.
    Encode,
}

pub struct TransformerCompiler<'a> {
    graph: &'a TypeGraph,
    names: &'a NameTable,
    requirements: &'a mut Requirements,
}

impl<'a> TransformerCompiler<'a> {
    pub fn new(graph: &'a TypeGraph, names: &'a NameTable, requirements: &'a mut Requirements) -> Self {
        Self {
            graph,
            names,
            requirements,
        }
    }

    fn converter(&mut self, converter: Converter) -> Function {
        self.requirements.use_converter(converter);
        Function::named(converter.name())
    }

    /// `lambda x: converter(leading..., x)`
    fn partial(&mut self, converter: Converter, leading: Vec<String>) -> Function {
        self.requirements.use_converter(converter);
        Function::partial(converter.name(), leading)
    }

    fn type_name(&self, t: TypeRef) -> CodegenResult<&'a str> {
        self.names.type_name(t)
    }

    // ── Entry points ─────────────────────────────────────────────────────

    /// Decode `input` (a generic JSON value) as `t`.
    pub fn deserializer(&mut self, input: ValueOrLambda, t: TypeRef) -> CodegenResult<ValueOrLambda> {
        let graph = self.graph;
        match graph.transformation(t) {
            Some(xf) => self.compile(input, &xf.transformer, xf.target, Direction::Decode),
            None => self.decode_primitive(input, t),
        }
    }

    /// Encode `input` (a value of `t`) to a generic JSON value.
    pub fn serializer(&mut self, input: ValueOrLambda, t: TypeRef) -> CodegenResult<ValueOrLambda> {
        let graph = self.graph;
        match graph.transformation(t) {
            Some(xf) => self.compile(input, &xf.reverse, t, Direction::Encode),
            None => self.encode_primitive(input, t),
        }
    }

    /// Compile one transformer node (and its consumers) applied to `input`.
    #[tracing::instrument(level = "trace", skip(self, input, xfer), fields(op = xfer.op_name()))]
    pub fn compile(
        &mut self,
        input: ValueOrLambda,
        xfer: &Transformer,
        target: TypeRef,
        direction: Direction,
    ) -> CodegenResult<ValueOrLambda> {
        match &xfer.kind {
            TransformerKind::Choice { branches } => {
                let mut lambdas = Vec::with_capacity(branches.len());
                for branch in branches {
                    let f = self.compile(ValueOrLambda::Identity, branch, target, direction)?;
                    lambdas.push(f.into_lambda().render());
                }
                let step = self.partial(Converter::FromUnion, vec![format!("[{}]", lambdas.join(", "))]);
                Ok(input.then(step))
            }
            TransformerKind::Decode { consumer } => {
                let decoded = self.decode_primitive(input, xfer.source)?;
                self.consume(consumer.as_deref(), decoded, target, direction)
            }
            TransformerKind::Encode => self.encode_primitive(input, xfer.source),
            TransformerKind::Elements {
                container,
                element,
                consumer,
            } => {
                let item_target = self.element_target(target, *container);
                let f = self.compile(ValueOrLambda::Identity, element, item_target, direction)?;
                let converter = match container {
                    Container::List => Converter::FromList,
                    Container::Dict => Converter::FromDict,
                };
                let step = self.partial(converter, vec![f.into_lambda().render()]);
                self.consume(consumer.as_deref(), input.then(step), target, direction)
            }
            TransformerKind::UnionMemberMatch { member, consumer } => {
                let type_object = self.type_object(*member, direction)?;
                let step = self.partial(Converter::IsType, vec![type_object]);
                self.consume(consumer.as_deref(), input.then(step), target, direction)
            }
            TransformerKind::UnionInstantiation => Ok(input),
            TransformerKind::ParseString { consumer } => {
                let immediate = consumer.as_ref().map_or(target, |c| c.source);
                let graph = self.graph;
                let step = match graph.kind(immediate) {
                    TypeKind::Integer => Function::named("int"),
                    TypeKind::Enum(_) => Function::named(self.type_name(immediate)?),
                    TypeKind::TransformedString {
                        format: TransformedStringKind::DateTime,
                    } => self.converter(Converter::FromDatetime),
                    other => {
                        return Err(CodegenError::Unsupported(format!(
                            "parsing a string into {}",
                            other.name()
                        )))
                    }
                };
                self.consume(consumer.as_deref(), input.then(step), target, direction)
            }
            TransformerKind::Stringify { consumer } => {
                let graph = self.graph;
                let step = match graph.kind(xfer.source) {
                    TypeKind::Integer => Function::named("str"),
                    TypeKind::Enum(_) => {
                        let name = self.type_name(xfer.source)?;
                        self.partial(Converter::ToEnum, vec![name.to_string()])
                    }
                    TypeKind::TransformedString {
                        format: TransformedStringKind::DateTime,
                    } => Function::method("isoformat"),
                    other => {
                        return Err(CodegenError::Unsupported(format!(
                            "stringifying {}",
                            other.name()
                        )))
                    }
                };
                self.consume(consumer.as_deref(), input.then(step), target, direction)
            }
        }
    }

    fn consume(
        &mut self,
        consumer: Option<&Transformer>,
        value: ValueOrLambda,
        target: TypeRef,
        direction: Direction,
    ) -> CodegenResult<ValueOrLambda> {
        match consumer {
            Some(next) => self.compile(value, next, target, direction),
            None => Ok(value),
        }
    }

    /// The per-element target inside a list or dict target.
    fn element_target(&self, target: TypeRef, container: Container) -> TypeRef {
        match (self.graph.kind(target), container) {
            (TypeKind::Array { items }, Container::List) => *items,
            (TypeKind::Map { values }, Container::Dict) => *values,
            _ => target,
        }
    }

    /// A function applying `direction`'s conversion to one value of `t`.
    fn element_function(&mut self, t: TypeRef, direction: Direction) -> CodegenResult<String> {
        let f = match direction {
            Direction::Decode => self.deserializer(ValueOrLambda::Identity, t)?,
            Direction::Encode => self.serializer(ValueOrLambda::Identity, t)?,
        };
        Ok(f.into_lambda().render())
    }

    fn union_branches(&mut self, t: TypeRef, direction: Direction) -> CodegenResult<Vec<String>> {
        let graph = self.graph;
        let members = graph
            .union_members(t)
            .ok_or_else(|| CodegenError::Internal(format!("{t} is not a union")))?;
        members
            .iter()
            .map(|m| self.element_function(*m, direction))
            .collect()
    }

    // ── Primitive conversions ────────────────────────────────────────────

    fn decode_primitive(&mut self, input: ValueOrLambda, t: TypeRef) -> CodegenResult<ValueOrLambda> {
        let graph = self.graph;
        let step = match graph.kind(t) {
            TypeKind::Any => return Ok(input),
            TypeKind::Null => self.converter(Converter::FromNone),
            TypeKind::Bool => self.converter(Converter::FromBool),
            TypeKind::Integer => self.converter(Converter::FromInt),
            TypeKind::Double => self.converter(Converter::FromFloat),
            TypeKind::String => self.converter(Converter::FromStr),
            TypeKind::Array { items } => {
                let f = self.element_function(*items, Direction::Decode)?;
                self.partial(Converter::FromList, vec![f])
            }
            TypeKind::Map { values } => {
                let f = self.element_function(*values, Direction::Decode)?;
                self.partial(Converter::FromDict, vec![f])
            }
            TypeKind::Class(_) => Function::named(format!("{}.from_dict", self.type_name(t)?)),
            TypeKind::Enum(_) => Function::named(self.type_name(t)?),
            TypeKind::Union(_) => {
                let branches = self.union_branches(t, Direction::Decode)?;
                self.partial(Converter::FromUnion, vec![format!("[{}]", branches.join(", "))])
            }
            TypeKind::TransformedString {
                format: TransformedStringKind::DateTime,
            } => self.converter(Converter::FromDatetime),
            TypeKind::TransformedString {
                format: TransformedStringKind::IntegerString,
            } => {
                return Err(CodegenError::Unsupported(format!(
                    "integer-string {t} has no transformation"
                )))
            }
        };
        Ok(input.then(step))
    }

    fn encode_primitive(&mut self, input: ValueOrLambda, t: TypeRef) -> CodegenResult<ValueOrLambda> {
        let graph = self.graph;
        let step = match graph.kind(t) {
            TypeKind::Any => return Ok(input),
            TypeKind::Null => self.converter(Converter::FromNone),
            TypeKind::Bool => self.converter(Converter::FromBool),
            TypeKind::Integer => self.converter(Converter::FromInt),
            TypeKind::Double => self.converter(Converter::ToFloat),
            TypeKind::String => self.converter(Converter::FromStr),
            TypeKind::Array { items } => {
                let f = self.element_function(*items, Direction::Encode)?;
                self.partial(Converter::FromList, vec![f])
            }
            TypeKind::Map { values } => {
                let f = self.element_function(*values, Direction::Encode)?;
                self.partial(Converter::FromDict, vec![f])
            }
            TypeKind::Class(_) => {
                let name = self.type_name(t)?;
                self.partial(Converter::ToClass, vec![name.to_string()])
            }
            TypeKind::Enum(_) => {
                let name = self.type_name(t)?;
                self.partial(Converter::ToEnum, vec![name.to_string()])
            }
            TypeKind::Union(_) => {
                let branches = self.union_branches(t, Direction::Encode)?;
                self.partial(Converter::FromUnion, vec![format!("[{}]", branches.join(", "))])
            }
            TypeKind::TransformedString {
                format: TransformedStringKind::DateTime,
            } => Function::method("isoformat"),
            TypeKind::TransformedString {
                format: TransformedStringKind::IntegerString,
            } => {
                return Err(CodegenError::Unsupported(format!(
                    "integer-string {t} has no transformation"
                )))
            }
        };
        Ok(input.then(step))
    }

    /// The Python type object `isinstance` checks a value of `t` against.
    ///
    /// Decoding sees raw JSON values, so named types and transformed strings
    /// check their JSON shape; encoding sees the decoded objects.
    pub fn type_object(&mut self, t: TypeRef, direction: Direction) -> CodegenResult<String> {
        let graph = self.graph;
        let (int_object, str_object) = if self.requirements.features().legacy_builtins {
            ("(int, long)", "(str, unicode)")
        } else {
            ("int", "str")
        };
        let object = match (graph.kind(t), direction) {
            (TypeKind::Null, _) => "type(None)",
            (TypeKind::Bool, _) => "bool",
            (TypeKind::Integer, _) => int_object,
            (TypeKind::Double, _) => "float",
            (TypeKind::String, _) => str_object,
            (TypeKind::Array { .. }, _) => "list",
            (TypeKind::Map { .. }, _) => "dict",
            (TypeKind::Class(_), Direction::Decode) => "dict",
            (TypeKind::Enum(_) | TypeKind::TransformedString { .. }, Direction::Decode) => str_object,
            (TypeKind::Class(_) | TypeKind::Enum(_), Direction::Encode) => self.type_name(t)?,
            (
                TypeKind::TransformedString {
                    format: TransformedStringKind::DateTime,
                },
                Direction::Encode,
            ) => {
                self.requirements.import_from("datetime", "datetime");
                "datetime"
            }
            (
                TypeKind::TransformedString {
                    format: TransformedStringKind::IntegerString,
                },
                Direction::Encode,
            ) => int_object,
            (other @ (TypeKind::Any | TypeKind::Union(_)), _) => {
                return Err(CodegenError::Unsupported(format!(
                    "no runtime type object for {}",
                    other.name()
                )))
            }
        };
        Ok(object.to_string())
    }
}
