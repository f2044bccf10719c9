//! lumina-mono - monomorphization for the Lumina compiler core.
//!
//! Input is a typed [`lumina_ast::Program`] plus the [`lumina_sem::InferResult`]
//! that typed it; output is a new program in which every generic function,
//! struct, and enum has been replaced by one cloned, substituted declaration
//! per distinct type/const-argument tuple recorded at a call or
//! instantiation site ([`specialize::monomorphize_program`]).
//!
//! Function specializations are driven by the inferencer's recorded
//! call-site type arguments ([`lumina_sem::types::Type`]); struct/enum
//! specializations are driven by a direct surface-AST scan ([`collect`])
//! since the inferencer's `Type` has no representation for const-generic
//! values. Both paths converge on the same [`subst::Subst`] substitution and
//! [`mangle`]'s name mangling.

pub mod collect;
pub mod const_eval;
pub mod mangle;
pub mod specialize;
pub mod subst;

pub use collect::{collect_generic_adt_sites, GenericAdtSite};
pub use const_eval::{eval_const_expr, ConstEvalError, ConstEvalErrorKind};
pub use mangle::{mangled_name, mangled_name_from_ast, normalize_type_name};
pub use specialize::{monomorphize_program, MonoResult};
pub use subst::{bind_generics, bind_generics_from_ast_args, rewrite_block, rewrite_expr, rewrite_field, sem_type_to_ast, Subst};
