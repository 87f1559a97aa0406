//! Name legalizer and styler.
//!
//! Turns arbitrary human-supplied labels (JSON keys, schema titles, enum
//! values) into legal, style-conforming, collision-free identifiers:
//!
//! ```text
//! label ─> words ─> legal words ─> styled identifier ─> unique in namespace
//!          (words)   (grammar)      (style)              (namespace)
//! ```
//!
//! Assignment is deterministic: the same labels assigned in the same order
//! always yield the same identifiers.

mod grammar;
mod namespace;
mod style;
mod words;

pub use grammar::Grammar;
pub use namespace::{Identifier, Namespace, Role, Styler};
pub use style::{combine_words, sanitize, CaseStyle};
pub use words::{split_into_words, Word};
