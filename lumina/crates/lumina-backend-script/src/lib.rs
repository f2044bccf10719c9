//! Scripting-target back end (spec §4.8): lowers the optimized IR to a
//! plain-text program in a dynamically-typed scripting language, alongside
//! a column-accurate VLQ source map.

pub mod emit;
pub mod error;
pub mod runtime;
pub mod sourcemap;

pub use emit::{emit_program, EmitOptions, EmitOutput, ModuleFormat};
pub use error::{Result, ScriptBackendError};
pub use sourcemap::{Mapping, RawSourceMap};
