//! lumina-util - Core Utilities and Foundation Types
//!
//! This crate provides fundamental utilities shared across the Lumina compiler
//! pipeline: typed index vectors, an interned `Symbol` type, source spans and
//! source maps, the diagnostic/handler infrastructure, and the `DefId`
//! allocator used by semantic analysis.
//!
//! None of the state here is process-global except the string interner
//! (`symbol::STRING_TABLE`), which pools strings rather than holding
//! per-compilation state; everything else (`DefIdGenerator`, `SourceMap`,
//! `Handler`) is instantiated fresh per compiler run.

pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level, SourceSnippet};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::Symbol;

pub use rustc_hash::{FxHashMap, FxHashSet};
