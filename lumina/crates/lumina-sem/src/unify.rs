//! The type unifier.
//!
//! Implements `fresh_var`, `prune`, `unify`, `free_vars`, `generalize`, and
//! `instantiate`. The unifier never mutates a `Type` node; it only grows the
//! caller's [`Substitution`]. On failure it returns a [`UnifyError`] and
//! leaves the substitution exactly as it was at the point of failure - the
//! HM driver (see [`crate::infer`]) is responsible for not binding the
//! offending variable and continuing with the next construct.

use crate::types::{InferId, PrimKind, Scheme, Substitution, Type};
use indexmap::IndexMap;
use lumina_util::Symbol;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnifyErrorKind {
    /// Two concrete types that are simply not the same type.
    Mismatch,
    /// Two function or ADT types applied to a different number of arguments.
    Arity,
    /// A variable occurs in the type it would be bound to, and no wrapper
    /// ADT boundary was crossed on the way there.
    Recursive,
    /// A row's field has no counterpart on the other side, and that side's
    /// row is closed (no tail to absorb it into).
    RowFieldMissing,
}

#[derive(Debug, Clone)]
pub struct UnifyError {
    pub kind: UnifyErrorKind,
    pub left: Type,
    pub right: Type,
}

/// The ADT names whose parameters act as indirections: unifying a variable
/// against `Wrapper<...T...>` is permitted even when `T` occurs inside,
/// because a real value of `Wrapper<T>` doesn't need `T` to already exist.
/// Configured once per compilation (minimally `Option`, `Result`) and read
/// only afterward.
pub type WrapperSet = FxHashSet<Symbol>;

pub fn default_wrapper_set() -> WrapperSet {
    let mut set = FxHashSet::default();
    set.insert(Symbol::intern("Option"));
    set.insert(Symbol::intern("Result"));
    set
}

/// Follow a variable to whatever it is currently bound to, with path
/// compression: every variable visited along the way is rebound directly to
/// the final result so future prunes are O(1).
pub fn prune(ty: &Type, subst: &mut Substitution) -> Type {
    if let Type::Variable(id) = ty {
        if let Some(bound) = subst.lookup(*id).cloned() {
            let resolved = prune(&bound, subst);
            subst.bind(*id, resolved.clone());
            return resolved;
        }
    }
    ty.clone()
}

/// Unify two types under `wrappers`, growing `subst` on success.
///
/// Rules are applied in this order: prune both sides; equal variables are
/// trivially unified; a variable on either side is bound after the barrier
/// occurs check; rows unify field-by-field; primitives unify after
/// normalization (callers are expected to have already normalized primitive
/// names via [`crate::types::normalize_primitive_name`]); functions unify
/// arg-wise then on return type; promises unify on their inner type; ADTs
/// unify when names and arities match, param-wise; anything else is a
/// mismatch.
pub fn unify(
    t1: &Type,
    t2: &Type,
    subst: &mut Substitution,
    wrappers: &WrapperSet,
) -> Result<(), UnifyError> {
    let p1 = prune(t1, subst);
    let p2 = prune(t2, subst);

    match (&p1, &p2) {
        (Type::Variable(a), Type::Variable(b)) if a == b => Ok(()),

        (Type::Variable(id), other) | (other, Type::Variable(id)) => {
            if occurs_check(*id, other, subst, wrappers, false) {
                return Err(UnifyError { kind: UnifyErrorKind::Recursive, left: p1, right: p2 });
            }
            subst.bind(*id, other.clone());
            Ok(())
        }

        (Type::Row(f1, tail1), Type::Row(f2, tail2)) => {
            unify_rows(f1, tail1.as_deref(), f2, tail2.as_deref(), subst, wrappers)
        }

        (Type::Primitive(a), Type::Primitive(b)) => {
            if a == b {
                Ok(())
            } else {
                Err(UnifyError { kind: UnifyErrorKind::Mismatch, left: p1, right: p2 })
            }
        }

        (Type::Function(args1, ret1), Type::Function(args2, ret2)) => {
            if args1.len() != args2.len() {
                return Err(UnifyError { kind: UnifyErrorKind::Arity, left: p1, right: p2 });
            }
            for (a1, a2) in args1.iter().zip(args2.iter()) {
                unify(a1, a2, subst, wrappers)?;
            }
            unify(ret1, ret2, subst, wrappers)
        }

        (Type::Promise(a), Type::Promise(b)) => unify(a, b, subst, wrappers),

        (Type::Adt(n1, params1), Type::Adt(n2, params2)) => {
            if n1 != n2 {
                return Err(UnifyError { kind: UnifyErrorKind::Mismatch, left: p1, right: p2 });
            }
            if params1.len() != params2.len() {
                return Err(UnifyError { kind: UnifyErrorKind::Arity, left: p1, right: p2 });
            }
            for (a, b) in params1.iter().zip(params2.iter()) {
                unify(a, b, subst, wrappers)?;
            }
            Ok(())
        }

        // A hole reaching the unifier unresolved behaves like a variable
        // that unconditionally accepts the other side; the driver is
        // responsible for reporting LUM-010 if it's still a Hole when the
        // enclosing scheme is finalized.
        (Type::Hole(_), _) | (_, Type::Hole(_)) => Ok(()),

        _ => Err(UnifyError { kind: UnifyErrorKind::Mismatch, left: p1, right: p2 }),
    }
}

fn unify_rows(
    fields1: &IndexMap<Symbol, Type>,
    tail1: Option<&Type>,
    fields2: &IndexMap<Symbol, Type>,
    tail2: Option<&Type>,
    subst: &mut Substitution,
    wrappers: &WrapperSet,
) -> Result<(), UnifyError> {
    let mut only_in_1 = IndexMap::new();
    for (name, ty) in fields1 {
        match fields2.get(name) {
            Some(other_ty) => unify(ty, other_ty, subst, wrappers)?,
            None => {
                only_in_1.insert(*name, ty.clone());
            },
        }
    }
    let mut only_in_2 = IndexMap::new();
    for (name, ty) in fields2 {
        if !fields1.contains_key(name) {
            only_in_2.insert(*name, ty.clone());
        }
    }

    absorb_extra_fields(only_in_1, tail2, subst, wrappers)?;
    absorb_extra_fields(only_in_2, tail1, subst, wrappers)?;
    match (tail1, tail2) {
        (Some(t1), Some(t2)) => unify(t1, t2, subst, wrappers),
        _ => Ok(()),
    }
}

/// The fields one side of a row unification has that the other side
/// doesn't name must unify into the other side's tail - or fail if that
/// side's row is closed (`tail` is `None`).
fn absorb_extra_fields(
    extra: IndexMap<Symbol, Type>,
    other_tail: Option<&Type>,
    subst: &mut Substitution,
    wrappers: &WrapperSet,
) -> Result<(), UnifyError> {
    if extra.is_empty() {
        return Ok(());
    }
    match other_tail {
        Some(tail) => {
            let extra_row = Type::Row(extra, None);
            unify(&extra_row, tail, subst, wrappers)
        },
        None => {
            let (name, ty) = extra.into_iter().next().unwrap();
            let mut extra_as_row = IndexMap::new();
            extra_as_row.insert(name, ty);
            Err(UnifyError {
                kind: UnifyErrorKind::RowFieldMissing,
                left: Type::Row(extra_as_row, None),
                right: Type::Row(IndexMap::new(), None),
            })
        },
    }
}

/// The barrier occurs check: standard occurs check, except that once the
/// walk has descended through a parameter of a wrapper-set ADT, further
/// occurrences of `var` are not errors. `passed_barrier` tracks whether that
/// has already happened on this path.
fn occurs_check(
    var: InferId,
    ty: &Type,
    subst: &Substitution,
    wrappers: &WrapperSet,
    passed_barrier: bool,
) -> bool {
    if passed_barrier {
        return false;
    }
    match ty {
        Type::Variable(id) => {
            if *id == var {
                return true;
            }
            match subst.lookup(*id) {
                Some(bound) => occurs_check(var, bound, subst, wrappers, false),
                None => false,
            }
        },
        Type::Function(args, ret) => {
            args.iter().any(|a| occurs_check(var, a, subst, wrappers, false))
                || occurs_check(var, ret, subst, wrappers, false)
        },
        Type::Adt(name, params) => {
            let crosses_barrier = wrappers.contains(name);
            params.iter().any(|p| occurs_check(var, p, subst, wrappers, crosses_barrier))
        },
        Type::Row(fields, tail) => {
            fields.values().any(|f| occurs_check(var, f, subst, wrappers, false))
                || tail.as_deref().map_or(false, |t| occurs_check(var, t, subst, wrappers, false))
        },
        Type::Promise(inner) => occurs_check(var, inner, subst, wrappers, false),
        Type::Primitive(_) | Type::Hole(_) => false,
    }
}

/// The free variables of `ty` under the current substitution.
pub fn free_vars(ty: &Type, subst: &mut Substitution) -> FxHashSet<InferId> {
    let pruned = prune(ty, subst);
    let mut out = FxHashSet::default();
    collect_free_vars(&pruned, subst, &mut out);
    out
}

fn collect_free_vars(ty: &Type, subst: &mut Substitution, out: &mut FxHashSet<InferId>) {
    match ty {
        Type::Variable(id) => {
            out.insert(*id);
        },
        Type::Function(args, ret) => {
            for a in args {
                let pruned = prune(a, subst);
                collect_free_vars(&pruned, subst, out);
            }
            let pruned = prune(ret, subst);
            collect_free_vars(&pruned, subst, out);
        },
        Type::Adt(_, params) => {
            for p in params {
                let pruned = prune(p, subst);
                collect_free_vars(&pruned, subst, out);
            }
        },
        Type::Row(fields, tail) => {
            for f in fields.values() {
                let pruned = prune(f, subst);
                collect_free_vars(&pruned, subst, out);
            }
            if let Some(t) = tail {
                let pruned = prune(t, subst);
                collect_free_vars(&pruned, subst, out);
            }
        },
        Type::Promise(inner) => {
            let pruned = prune(inner, subst);
            collect_free_vars(&pruned, subst, out);
        },
        Type::Primitive(_) | Type::Hole(_) => {},
    }
}

/// Quantify every free variable of `ty` that isn't already bound in the
/// enclosing environment (`bound`) - typically the free variables of every
/// binding already in scope.
pub fn generalize(ty: &Type, subst: &mut Substitution, bound: &FxHashSet<InferId>) -> Scheme {
    let free = free_vars(ty, subst);
    let quantified: Vec<InferId> = free.into_iter().filter(|v| !bound.contains(v)).collect();
    Scheme { vars: quantified, body: prune(ty, subst) }
}

/// Replace every quantified variable in `scheme` with a fresh one.
pub fn instantiate(scheme: &Scheme, subst: &mut Substitution) -> Type {
    if scheme.vars.is_empty() {
        return scheme.body.clone();
    }
    let mut mapping = rustc_hash::FxHashMap::default();
    for &v in &scheme.vars {
        mapping.insert(v, subst.fresh_var());
    }
    substitute_vars(&scheme.body, &mapping)
}

fn substitute_vars(ty: &Type, mapping: &rustc_hash::FxHashMap<InferId, Type>) -> Type {
    match ty {
        Type::Variable(id) => mapping.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Function(args, ret) => Type::Function(
            args.iter().map(|a| substitute_vars(a, mapping)).collect(),
            Box::new(substitute_vars(ret, mapping)),
        ),
        Type::Adt(name, params) => {
            Type::Adt(*name, params.iter().map(|p| substitute_vars(p, mapping)).collect())
        },
        Type::Row(fields, tail) => Type::Row(
            fields.iter().map(|(k, v)| (*k, substitute_vars(v, mapping))).collect(),
            tail.as_ref().map(|t| Box::new(substitute_vars(t, mapping))),
        ),
        Type::Promise(inner) => Type::Promise(Box::new(substitute_vars(inner, mapping))),
        Type::Primitive(_) | Type::Hole(_) => ty.clone(),
    }
}
