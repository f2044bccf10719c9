//! lumina-sem - semantic analysis for the Lumina compiler core.
//!
//! This crate owns everything between a parsed [`lumina_ast::Program`] and a
//! fully-typed program ready for monomorphization: Hindley-Milner inference
//! with row-polymorphic records and a barrier occurs check ([`infer`],
//! [`unify`], [`types`]), lexical scoping for name resolution ([`scope`]),
//! match exhaustiveness and `is`-narrowing ([`exhaustiveness`]), and the
//! structural "second opinion" checks HM never runs - trait conformance,
//! const-generic well-formedness, casts, string interpolation, indexing, and
//! macro resolution ([`analyzer`]).
//!
//! [`infer::infer_program`] and [`analyzer::analyze_program`] are independent
//! passes over the same AST; a caller runs both and merges their handlers'
//! diagnostics before deciding whether to proceed to `lumina-mono`.

pub mod analyzer;
pub mod exhaustiveness;
pub mod infer;
pub mod scope;
pub mod types;
pub mod unify;

pub use analyzer::{analyze_program, AnalyzeResult};
pub use exhaustiveness::is_exhaustive;
pub use infer::{infer_program, CallSig, InferOptions, InferResult};
pub use scope::{LabelId, Rib, RibId, RibKind, ScopeTree};
pub use types::{normalize_primitive_name, InferId, PrimKind, Scheme, Substitution, Type};
pub use unify::{default_wrapper_set, free_vars, generalize, instantiate, prune, unify, UnifyError, UnifyErrorKind, WrapperSet};
