//! Lowering from the monomorphized surface AST to [`crate::mir`]'s tree IR.

pub mod hir_to_mir;

pub use hir_to_mir::lower_program;
