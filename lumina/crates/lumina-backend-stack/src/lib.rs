//! Stack-machine text back end (spec §4.9): lowers the optimized IR to a
//! textual S-expression stack-machine program.

pub mod emit;
pub mod error;
pub mod types;

pub use emit::{emit_program, EmitOptions};
pub use error::{Result, StackBackendError};
pub use types::NumKind;
