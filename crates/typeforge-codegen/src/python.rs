//! Python source renderer.
//!
//! Emits enums, classes and top-level converters for a [`TypeGraph`].
//! Layout (file order):
//!
//! ```text
//! # usage header
//! imports
//! T = TypeVar("T")        (only with type hints)
//! support functions       (only the ones referenced)
//! enums
//! classes
//! top-level converters
//! ```

use std::collections::HashSet;

use tracing::debug;
use typeforge_types::{ClassType, EnumType, TransformedStringKind, TypeGraph, TypeKind, TypeRef};

use crate::emit::{Emitter, Section};
use crate::error::{CodegenError, CodegenResult};
use crate::names::NameTable;
use crate::options::{PythonFeatures, PythonOptions};
use crate::string::{docstring_lines, string_literal};
use crate::support::{Converter, Requirements};
use crate::transform::TransformerCompiler;
use crate::value::ValueOrLambda;

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Render `graph` as a Python module.
#[tracing::instrument(level = "debug", skip_all, fields(version = options.python_version.as_str()))]
pub fn render(graph: &TypeGraph, options: &PythonOptions) -> CodegenResult<String> {
    render_with_names(graph, options).map(|(source, _)| source)
}

/// Render `graph` and return the module together with the identifiers it uses.
pub fn render_with_names(
    graph: &TypeGraph,
    options: &PythonOptions,
) -> CodegenResult<(String, NameTable)> {
    let names = NameTable::assign(graph, options);
    let source = PythonRenderer::new(graph, options, &names).render()?;
    Ok((source, names))
}

// ══════════════════════════════════════════════════════════════════════════════
// Renderer
// ══════════════════════════════════════════════════════════════════════════════

/// One property as rendered.
struct Field<'g> {
    name: &'g str,
    key: &'g str,
    ty: TypeRef,
    optional: bool,
    description: Option<&'g str>,
}

struct PythonRenderer<'a> {
    graph: &'a TypeGraph,
    options: &'a PythonOptions,
    features: PythonFeatures,
    names: &'a NameTable,
    requirements: Requirements,
    out: Emitter,
    /// Classes whose definition has been emitted; others need quoted hints.
    declared: HashSet<TypeRef>,
}

impl<'a> PythonRenderer<'a> {
    fn new(graph: &'a TypeGraph, options: &'a PythonOptions, names: &'a NameTable) -> Self {
        Self {
            graph,
            options,
            features: options.features(),
            names,
            requirements: Requirements::with_features(options.features()),
            out: Emitter::new(),
            declared: HashSet::new(),
        }
    }

    fn render(mut self) -> CodegenResult<String> {
        let graph = self.graph;

        for t in graph.enums() {
            self.emit_enum(t)?;
        }
        for t in graph.classes() {
            self.emit_class(t)?;
            self.declared.insert(t);
        }

        if !self.options.just_types {
            for index in 0..graph.top_levels().len() {
                self.emit_top_level(index)?;
            }
            self.requirements.emit_support(&mut self.out);
            self.emit_header()?;
        }

        debug!(
            converters = self.requirements.converters().count(),
            "module rendered"
        );
        let source = self.out.finish(&self.requirements.imports);
        if self.features.unicode_prefix && !source.is_ascii() {
            return Ok(format!("# -*- coding: utf-8 -*-\n{source}"));
        }
        Ok(source)
    }

    fn compiler(&mut self) -> TransformerCompiler<'_> {
        TransformerCompiler::new(self.graph, self.names, &mut self.requirements)
    }

    fn literal(&self, s: &str) -> String {
        string_literal(s, self.features.unicode_prefix)
    }

    fn docstring(&mut self, text: Option<&str>) {
        if let Some(text) = text {
            for line in docstring_lines(text) {
                self.out.line(line);
            }
        }
    }

    // ── Type hints ───────────────────────────────────────────────────────

    /// The annotation for `t`; undeclared classes are quoted when `forward`.
    fn hint(&mut self, t: TypeRef, forward: bool) -> CodegenResult<String> {
        let names = self.names;
        let graph = self.graph;
        if let Some(xf) = graph.transformation(t) {
            if xf.target != t {
                return self.hint(xf.target, forward);
            }
        }
        let hint = match graph.kind(t) {
            TypeKind::Any => {
                self.requirements.import_from("typing", "Any");
                "Any".to_string()
            }
            TypeKind::Null => "None".to_string(),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Integer => "int".to_string(),
            TypeKind::Double => "float".to_string(),
            TypeKind::String => "str".to_string(),
            TypeKind::Array { items } => {
                self.requirements.import_from("typing", "List");
                format!("List[{}]", self.hint(*items, forward)?)
            }
            TypeKind::Map { values } => {
                self.requirements.import_from("typing", "Dict");
                format!("Dict[str, {}]", self.hint(*values, forward)?)
            }
            TypeKind::Class(_) => {
                let name = names.type_name(t)?;
                if forward && !self.declared.contains(&t) {
                    format!("'{name}'")
                } else {
                    name.to_string()
                }
            }
            TypeKind::Enum(_) => names.type_name(t)?.to_string(),
            TypeKind::Union(_) => {
                let members = graph.non_null_members(t);
                let inner = match members.as_slice() {
                    [] => return Ok("None".to_string()),
                    [only] => self.hint(*only, forward)?,
                    _ => {
                        self.requirements.import_from("typing", "Union");
                        let hints = members
                            .iter()
                            .map(|m| self.hint(*m, forward))
                            .collect::<CodegenResult<Vec<_>>>()?;
                        format!("Union[{}]", hints.join(", "))
                    }
                };
                if graph.is_nullable(t) {
                    self.requirements.import_from("typing", "Optional");
                    format!("Optional[{inner}]")
                } else {
                    inner
                }
            }
            TypeKind::TransformedString {
                format: TransformedStringKind::DateTime,
            } => {
                self.requirements.import_from("datetime", "datetime");
                "datetime".to_string()
            }
            TypeKind::TransformedString {
                format: TransformedStringKind::IntegerString,
            } => "int".to_string(),
        };
        Ok(hint)
    }

    // ── Enums ────────────────────────────────────────────────────────────

    fn emit_enum(&mut self, t: TypeRef) -> CodegenResult<()> {
        let names = self.names;
        let graph = self.graph;
        let e: &EnumType = graph
            .enum_type(t)
            .ok_or_else(|| CodegenError::Internal(format!("{t} is not an enum")))?;
        let name = names.type_name(t)?;
        self.requirements.import_from("enum", "Enum");

        self.out.set_section(Section::Enums);
        self.out.line(format!("class {name}(Enum):"));
        self.out.indent();
        self.docstring(e.description.as_deref());
        for (i, case) in e.cases.iter().enumerate() {
            let case_name = names.case(t, i)?;
            let raw = self.literal(case);
            self.out.line(format!("{case_name} = {raw}"));
        }
        if e.cases.is_empty() && e.description.is_none() {
            self.out.line("pass");
        }
        self.out.dedent();
        self.out.blank(2);
        Ok(())
    }

    // ── Classes ──────────────────────────────────────────────────────────

    fn fields(&self, t: TypeRef, class: &'a ClassType) -> CodegenResult<Vec<Field<'a>>> {
        let names = self.names;
        let mut fields = class
            .properties
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Ok(Field {
                    name: names.property(t, i)?,
                    key: p.name.as_str(),
                    ty: p.ty,
                    optional: self.graph.is_nullable(p.ty),
                    description: p.description.as_deref(),
                })
            })
            .collect::<CodegenResult<Vec<_>>>()?;
        if self.features.dataclasses {
            // Defaulted fields must follow the others.
            fields.sort_by_key(|f| f.optional);
        }
        Ok(fields)
    }

    fn emit_class(&mut self, t: TypeRef) -> CodegenResult<()> {
        let names = self.names;
        let graph = self.graph;
        let class = graph
            .class(t)
            .ok_or_else(|| CodegenError::Internal(format!("{t} is not a class")))?;
        let name = names.type_name(t)?;
        let fields = self.fields(t, class)?;
        let hints = self.features.type_hints;

        let mut field_hints = Vec::with_capacity(fields.len());
        for f in &fields {
            field_hints.push(if hints { self.hint(f.ty, true)? } else { String::new() });
        }

        self.out.set_section(Section::Classes);
        if self.features.dataclasses {
            self.requirements.import_from("dataclasses", "dataclass");
            self.out.line("@dataclass");
        }
        let base = if self.features.object_base { "(object)" } else { "" };
        self.out.line(format!("class {name}{base}:"));
        self.out.indent();

        let mut has_body = class.description.is_some();
        self.docstring(class.description.as_deref());

        if hints {
            for (f, hint) in fields.iter().zip(&field_hints) {
                let default = if self.features.dataclasses && f.optional { " = None" } else { "" };
                self.out.line(format!("{}: {hint}{default}", f.name));
                self.docstring(f.description);
                has_body = true;
            }
        }

        if !self.features.dataclasses {
            if has_body {
                self.out.blank(1);
            }
            self.emit_init(&fields, &field_hints);
            has_body = true;
        }

        if !self.options.just_types {
            if has_body {
                self.out.blank(1);
            }
            self.emit_from_dict(t, name, &fields)?;
            self.out.blank(1);
            self.emit_to_dict(&fields)?;
            has_body = true;
        }

        if !has_body {
            self.out.line("pass");
        }
        self.out.dedent();
        self.out.blank(2);
        Ok(())
    }

    fn emit_init(&mut self, fields: &[Field<'_>], field_hints: &[String]) {
        let hints = self.features.type_hints;
        let params: Vec<String> = fields
            .iter()
            .zip(field_hints)
            .map(|(f, hint)| {
                if hints {
                    format!("{}: {hint}", f.name)
                } else {
                    f.name.to_string()
                }
            })
            .collect();
        let params = std::iter::once("self".to_string())
            .chain(params)
            .collect::<Vec<_>>()
            .join(", ");
        let ret = if hints { " -> None" } else { "" };

        self.out.line(format!("def __init__({params}){ret}:"));
        self.out.indent();
        for f in fields {
            if !hints {
                if let Some(description) = f.description {
                    for line in description.lines() {
                        self.out.line(format!("# {line}"));
                    }
                }
            }
            self.out.line(format!("self.{0} = {0}", f.name));
        }
        if fields.is_empty() {
            self.out.line("pass");
        }
        self.out.dedent();
    }

    fn emit_from_dict(&mut self, t: TypeRef, name: &str, fields: &[Field<'_>]) -> CodegenResult<()> {
        let hints = self.features.type_hints;
        let mut locals = Vec::with_capacity(fields.len());
        for f in fields {
            let key = self.literal(f.key);
            let value = self
                .compiler()
                .deserializer(ValueOrLambda::value(format!("obj.get({key})")), f.ty)?
                .into_value()?;
            locals.push((f.name, value));
        }

        self.out.line("@staticmethod");
        if hints {
            self.requirements.import_from("typing", "Any");
            let ret = self.hint(t, true)?;
            self.out.line(format!("def from_dict(obj: Any) -> {ret}:"));
        } else {
            self.out.line("def from_dict(obj):");
        }
        self.out.indent();
        self.out.line("assert isinstance(obj, dict)");
        for (local, value) in &locals {
            self.out.line(format!("{local} = {value}"));
        }
        let args: Vec<&str> = locals.iter().map(|(local, _)| *local).collect();
        self.out.line(format!("return {name}({})", args.join(", ")));
        self.out.dedent();
        Ok(())
    }

    fn emit_to_dict(&mut self, fields: &[Field<'_>]) -> CodegenResult<()> {
        let hints = self.features.type_hints;
        let mut assignments = Vec::with_capacity(fields.len());
        for f in fields {
            let key = self.literal(f.key);
            let value = self
                .compiler()
                .serializer(ValueOrLambda::value(format!("self.{}", f.name)), f.ty)?
                .into_value()?;
            assignments.push((f, format!("result[{key}] = {value}")));
        }

        if hints {
            self.out.line("def to_dict(self) -> dict:");
        } else {
            self.out.line("def to_dict(self):");
        }
        self.out.indent();
        self.out.line(if hints { "result: dict = {}" } else { "result = {}" });
        for (f, assignment) in assignments {
            if f.optional {
                self.out.line(format!("if self.{} is not None:", f.name));
                self.out.indented(|out| out.line(assignment));
            } else {
                self.out.line(assignment);
            }
        }
        self.out.line("return result");
        self.out.dedent();
        Ok(())
    }

    // ── Top-level converters ─────────────────────────────────────────────

    fn emit_top_level(&mut self, index: usize) -> CodegenResult<()> {
        let names = self.names;
        let graph = self.graph;
        let top = &graph.top_levels()[index];
        let fn_names = names.top_level(index)?;
        let hints = self.features.type_hints;

        let decode = self
            .compiler()
            .deserializer(ValueOrLambda::value("s"), top.ty)?
            .into_value()?;
        let encode = self
            .compiler()
            .serializer(ValueOrLambda::value("x"), top.ty)?
            .into_value()?;

        let (from_sig, to_sig) = if hints {
            self.requirements.import_from("typing", "Any");
            let hint = self.hint(top.ty, false)?;
            (
                format!("def {}(s: Any) -> {hint}:", fn_names.from_dict),
                format!("def {}(x: {hint}) -> Any:", fn_names.to_dict),
            )
        } else {
            (
                format!("def {}(s):", fn_names.from_dict),
                format!("def {}(x):", fn_names.to_dict),
            )
        };

        self.out.set_section(Section::TopLevel);
        self.out.line(from_sig);
        self.out.indented(|out| out.line(format!("return {decode}")));
        self.out.blank(2);
        self.out.line(to_sig);
        self.out.indented(|out| out.line(format!("return {encode}")));
        self.out.blank(2);
        Ok(())
    }

    // ── Header ───────────────────────────────────────────────────────────

    fn emit_header(&mut self) -> CodegenResult<()> {
        let names = self.names;
        self.out.set_section(Section::Header);
        if self.requirements.uses(Converter::FromDatetime) {
            self.out.line("# This code parses date/times, so please");
            self.out.line("#");
            self.out.line("#     pip install python-dateutil");
            self.out.line("#");
        }
        self.out.line("# To use this code, make sure you");
        self.out.line("#");
        self.out.line("#     import json");
        self.out.line("#");
        self.out.line("# and then, to convert JSON from a string, do");
        self.out.line("#");
        for index in 0..self.graph.top_levels().len() {
            let fn_names = names.top_level(index)?;
            self.out.line(format!(
                "#     result = {}(json.loads(json_string))",
                fn_names.from_dict
            ));
        }
        Ok(())
    }
}
