//! Typeforge reference runtime.
//!
//! Executes the decode/encode contract of generated code directly against
//! JSON values, without a Python interpreter.  Each conversion behaves like
//! the support function the Python backend would emit for it, so the
//! runtime serves as the oracle for round-trip and union try-order
//! behaviour.

pub mod error;
pub mod runtime;
pub mod value;

pub use error::{EvalError, EvalResult};
pub use runtime::{from_union, Direction, Runtime};
pub use value::{Timestamp, Value};
