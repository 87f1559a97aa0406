//! Shared types for the typeforge code generator.
//!
//! This crate defines the abstract type graph produced by type inference
//! (classes, enums, unions, transformed strings) together with the
//! declarative transformer trees that describe how a generic decoded JSON
//! value becomes a richer type and back.  Every backend consumes it through
//! the query surface on [`TypeGraph`].

mod builder;
mod error;
mod graph;
mod transformer;

pub use builder::GraphBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{
    ClassProperty, ClassType, EnumType, TopLevel, TransformedStringKind, TypeGraph, TypeKind,
    TypeNode, TypeRef, UnionType,
};
pub use transformer::{Container, Transformation, Transformer, TransformerKind};
