//! The type representation shared by the unifier, the HM inferencer, and the
//! semantic analyzer.
//!
//! `Type` is an immutable tree; "a variable has been resolved to T" is never
//! represented by mutating a `Type` node, only by growing a [`Substitution`]
//! (see [`crate::unify`]). Recursive types are never built as cyclic data -
//! the only way a definition can refer to itself is through a nominal
//! wrapper ADT, gated by the unifier's barrier occurs check.

use indexmap::IndexMap;
use lumina_util::{Idx, IndexVec, Span, Symbol};

/// A type inference variable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InferId(pub u32);

impl Idx for InferId {
    fn from_usize(idx: usize) -> Self {
        InferId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The fixed set of normalized primitive names.
///
/// Source-level aliases (`int`, `usize`, `float`, ...) are folded onto these
/// before any unification happens, per [`normalize_primitive_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimKind {
    I32,
    U32,
    F64,
    Bool,
    Char,
    Str,
    Unit,
}

impl PrimKind {
    pub fn normalized_name(self) -> &'static str {
        match self {
            PrimKind::I32 => "i32",
            PrimKind::U32 => "u32",
            PrimKind::F64 => "f64",
            PrimKind::Bool => "bool",
            PrimKind::Char => "char",
            PrimKind::Str => "string",
            PrimKind::Unit => "unit",
        }
    }
}

/// Maps a source-level primitive spelling onto its normalized [`PrimKind`].
///
/// `int` and `float` are the surface-level defaults; `usize` is folded onto
/// the same 32-bit unsigned representation as `u32`. Two differently-spelled
/// primitives that normalize to the same `PrimKind` are the same type for
/// every purpose in this crate (see DESIGN.md for the open question this
/// resolves: whether `int` and `i32` share a monomorphization).
pub fn normalize_primitive_name(name: &str) -> Option<PrimKind> {
    Some(match name {
        "int" | "i32" => PrimKind::I32,
        "usize" | "u32" => PrimKind::U32,
        "float" | "f64" => PrimKind::F64,
        "bool" => PrimKind::Bool,
        "char" => PrimKind::Char,
        "string" | "str" => PrimKind::Str,
        "unit" | "()" => PrimKind::Unit,
        _ => return None,
    })
}

/// A type, in the tagged-sum shape the inferencer and unifier operate on.
///
/// This is deliberately flatter than a surface [`lumina_ast::Type`]: by the
/// time a `Type` exists here, every alias has been normalized and every `_`
/// hole has either become a fresh [`InferId`] or is still waiting to be
/// reported (see [`Type::Hole`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// A normalized primitive, e.g. `i32`, `bool`.
    Primitive(PrimKind),
    /// `fn(args) -> return`.
    Function(Vec<Type>, Box<Type>),
    /// An unresolved inference variable.
    Variable(InferId),
    /// A named algebraic type applied to concrete or variable arguments.
    Adt(Symbol, Vec<Type>),
    /// An open or closed record: known fields plus an optional tail that
    /// absorbs whatever fields the other side of a unification has that
    /// this side doesn't name.
    Row(IndexMap<Symbol, Type>, Option<Box<Type>>),
    /// A `_` annotation that has not yet been turned into a fresh variable,
    /// or one that was and is still unresolved when a scheme is finalized.
    /// Carries the annotation's source location for the `LUM-010` diagnostic.
    Hole(Span),
    /// `Promise<inner>`, the type `async fn` bodies are wrapped in.
    Promise(Box<Type>),
}

impl Type {
    pub fn unit() -> Type {
        Type::Primitive(PrimKind::Unit)
    }

    pub fn bool() -> Type {
        Type::Primitive(PrimKind::Bool)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Primitive(PrimKind::Bool))
    }

    pub fn primitive_named(name: &str) -> Option<Type> {
        normalize_primitive_name(name).map(Type::Primitive)
    }
}

/// A type scheme: a body type plus the set of variable ids within it that
/// are quantified (universally generalized) rather than fixed by the
/// enclosing context. [`crate::unify::instantiate`] replaces the quantified
/// ids with fresh variables on each use.
#[derive(Debug, Clone)]
pub struct Scheme {
    pub vars: Vec<InferId>,
    pub body: Type,
}

impl Scheme {
    /// A scheme with no quantified variables - every occurrence of `ty` at
    /// every use site shares the same (possibly still-unresolved) type.
    pub fn monomorphic(ty: Type) -> Scheme {
        Scheme { vars: Vec::new(), body: ty }
    }
}

/// The substitution built up by one inference run.
///
/// Per spec §5/§9 this is per-run state, not a process-global map: a fresh
/// `Substitution` is created for each `infer_program` call. The unifier only
/// ever grows it; it never mutates or removes an existing binding.
#[derive(Default)]
pub struct Substitution {
    bindings: IndexVec<InferId, Option<Type>>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh_var(&mut self) -> Type {
        let id = self.bindings.push(None);
        Type::Variable(id)
    }

    pub fn bind(&mut self, id: InferId, ty: Type) {
        self.bindings[id] = Some(ty);
    }

    pub fn lookup(&self, id: InferId) -> Option<&Type> {
        self.bindings.get(id).and_then(|slot| slot.as_ref())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_int_and_i32_to_the_same_primitive() {
        assert_eq!(normalize_primitive_name("int"), normalize_primitive_name("i32"));
    }

    #[test]
    fn normalizes_usize_to_u32() {
        assert_eq!(normalize_primitive_name("usize"), Some(PrimKind::U32));
    }

    #[test]
    fn rejects_unknown_primitive_names() {
        assert_eq!(normalize_primitive_name("Widget"), None);
    }

    #[test]
    fn substitution_fresh_vars_are_distinct() {
        let mut subst = Substitution::new();
        let a = subst.fresh_var();
        let b = subst.fresh_var();
        assert_ne!(a, b);
    }

    #[test]
    fn substitution_lookup_before_bind_is_none() {
        let mut subst = Substitution::new();
        let id = match subst.fresh_var() {
            Type::Variable(id) => id,
            _ => unreachable!(),
        };
        assert!(subst.lookup(id).is_none());
        subst.bind(id, Type::unit());
        assert_eq!(subst.lookup(id), Some(&Type::unit()));
    }

    #[test]
    fn monomorphic_scheme_has_no_quantified_vars() {
        let scheme = Scheme::monomorphic(Type::bool());
        assert!(scheme.vars.is_empty());
    }
}
