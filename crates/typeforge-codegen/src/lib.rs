//! Typeforge Python backend.
//!
//! # Architecture
//!
//! ```text
//! TypeGraph ─> NameTable ─> PythonRenderer ─> Emitter ─> source
//!                              │
//!                              └─> TransformerCompiler ─> ValueOrLambda
//!                                        │
//!                                        └─> Requirements (converters, imports)
//! ```
//!
//! Names are assigned for every entity before anything is emitted.  The
//! renderer then walks enums, classes and top-levels, asking the
//! [`TransformerCompiler`] for each property's decode and encode
//! expression.  Support functions and imports are emitted last, from what
//! the compiler recorded, and [`Emitter::finish`] puts everything in file
//! order.

pub mod emit;
pub mod error;
pub mod names;
pub mod options;
pub mod python;
pub mod string;
pub mod support;
pub mod transform;
pub mod value;

pub use emit::{Emitter, ImportSet, Section};
pub use error::{CodegenError, CodegenResult};
pub use names::NameTable;
pub use options::{PythonFeatures, PythonOptions, PythonVersion};
pub use python::{render, render_with_names};
pub use support::{Converter, Requirements};
pub use transform::{Direction, TransformerCompiler};
pub use value::{Function, Template, ValueOrLambda};
