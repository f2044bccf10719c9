//! Match exhaustiveness checking and `is`-narrowing (spec §4.3).
//!
//! Exhaustiveness here is deliberately coarse compared to a full
//! decision-tree checker: a match over an enum is exhaustive iff every
//! variant name appears in some (unguarded) arm, or a wildcard/binding
//! pattern appears anywhere. That's enough to decide `LUM-003` without
//! needing full pattern-space coverage analysis, which is out of scope.

use lumina_ast::{MatchArm, Pattern, PatternKind};
use lumina_util::Symbol;
use rustc_hash::FxHashSet;

/// Checks whether `arms` exhaustively covers an enum with the given variant
/// names. Guarded arms (`guard: Some(_)`) never count toward exhaustiveness,
/// since the guard may reject the match at runtime.
pub fn is_exhaustive(arms: &[MatchArm], variants: &[Symbol]) -> bool {
    let mut covered: FxHashSet<Symbol> = FxHashSet::default();
    for arm in arms {
        if arm.guard.is_some() {
            continue;
        }
        if pattern_is_catch_all(&arm.pattern) {
            return true;
        }
        if let Some(name) = pattern_variant_name(&arm.pattern) {
            covered.insert(name);
        }
    }
    variants.iter().all(|v| covered.contains(v))
}

fn pattern_is_catch_all(pattern: &Pattern) -> bool {
    matches!(pattern.kind, PatternKind::Wildcard | PatternKind::Ident(_, _))
}

/// The variant a pattern matches against, if it names one directly (as
/// opposed to a wildcard, literal, or nested structural pattern over
/// something other than an enum variant path).
fn pattern_variant_name(pattern: &Pattern) -> Option<Symbol> {
    match &pattern.kind {
        PatternKind::Path(path) => path.segments.last().map(|seg| seg.ident),
        PatternKind::TupleStruct(path, _) => path.segments.last().map(|seg| seg.ident),
        PatternKind::Struct(path, _) => path.segments.last().map(|seg| seg.ident),
        _ => None,
    }
}
