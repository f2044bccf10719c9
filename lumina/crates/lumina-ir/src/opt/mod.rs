//! Optimizer: the seven passes of spec §4.7, run to a per-function fixed
//! point, followed by one whole-program reachability pass.
//!
//! Every pass is a structural tree rewrite — no basic blocks, no dataflow
//! lattice — since [`crate::mir::Ir`] keeps the shape of the source program.
//! Passes that need whole-function context (constant propagation, dead
//! -store elimination) make one read-only pass over the tree to build a
//! name table, then one rewrite pass; neither pass crosses a function
//! boundary; reachability (pass 7) is the only pass allowed to.

use lumina_util::{FxHashMap, FxHashSet, Symbol};
use tracing::debug;

use crate::mir::{BinOp, Function, Ir, Program, UnOp};

/// Runs all seven passes to a fixed point on every function, then drops
/// functions unreachable from `main`/an exported declaration.
pub fn optimize_program(program: &mut Program) {
    for function in &mut program.functions {
        optimize_function(function);
    }
    eliminate_dead_functions(program);
}

const MAX_ITERATIONS: usize = 32;

fn optimize_function(function: &mut Function) {
    let mut iterations = 0;
    loop {
        let mut changed = false;
        changed |= constant_fold_and_simplify(&mut function.body);
        changed |= constant_propagate(&mut function.body);
        changed |= fold_branches(&mut function.body);
        changed |= eliminate_dead_stores(&mut function.body);
        changed |= eliminate_unreachable(&mut function.body);

        iterations += 1;
        if !changed || iterations >= MAX_ITERATIONS {
            debug!(function = %function.name.as_str(), iterations, "optimizer reached fixed point");
            break;
        }
    }
}

// ---------------------------------------------------------------------
// Pass 1 + 2: constant folding and algebraic identities
//
// Both passes rewrite a single `Ir` node bottom-up in place, so they share
// one recursive walk: fold children first, then try to fold/simplify the
// node itself against its now-folded children.
// ---------------------------------------------------------------------

fn constant_fold_and_simplify(body: &mut Vec<Ir>) -> bool {
    let mut changed = false;
    for ir in body.iter_mut() {
        changed |= fold_node(ir);
    }
    changed
}

fn fold_node(ir: &mut Ir) -> bool {
    let mut changed = false;
    for child in ir.children_mut() {
        changed |= fold_node(child);
    }
    for block in ir.blocks_mut() {
        changed |= constant_fold_and_simplify(block);
    }

    if let Some(folded) = try_fold_or_simplify(ir) {
        *ir = folded;
        changed = true;
    }
    changed
}

fn try_fold_or_simplify(ir: &Ir) -> Option<Ir> {
    match ir {
        Ir::Binary { op, left, right, span } => fold_binary(*op, left, right, *span).or_else(|| simplify_binary(*op, left, right, *span)),
        Ir::Unary { op, operand, span } => fold_unary(*op, operand, *span),
        _ => None,
    }
}

fn fold_binary(op: BinOp, left: &Ir, right: &Ir, span: lumina_util::Span) -> Option<Ir> {
    use BinOp::*;
    if let (Ir::Int { value: l, .. }, Ir::Int { value: r, .. }) = (left, right) {
        let (l, r) = (*l, *r);
        return match op {
            Add => Some(Ir::Int { value: l + r, span }),
            Sub => Some(Ir::Int { value: l - r, span }),
            Mul => Some(Ir::Int { value: l * r, span }),
            // Division/mod by a zero constant is left for runtime semantics,
            // not folded here.
            Div if r != 0 => Some(Ir::Int { value: l / r, span }),
            Mod if r != 0 => Some(Ir::Int { value: l % r, span }),
            Eq => Some(Ir::Bool { value: l == r, span }),
            Ne => Some(Ir::Bool { value: l != r, span }),
            Lt => Some(Ir::Bool { value: l < r, span }),
            Le => Some(Ir::Bool { value: l <= r, span }),
            Gt => Some(Ir::Bool { value: l > r, span }),
            Ge => Some(Ir::Bool { value: l >= r, span }),
            BitAnd => Some(Ir::Int { value: l & r, span }),
            BitOr => Some(Ir::Int { value: l | r, span }),
            BitXor => Some(Ir::Int { value: l ^ r, span }),
            Shl => Some(Ir::Int { value: l << r, span }),
            Shr => Some(Ir::Int { value: l >> r, span }),
            _ => None,
        };
    }
    if let (Ir::Number { value: l, .. }, Ir::Number { value: r, .. }) = (left, right) {
        let (l, r) = (*l, *r);
        return match op {
            Add => Some(Ir::Number { value: l + r, span }),
            Sub => Some(Ir::Number { value: l - r, span }),
            Mul => Some(Ir::Number { value: l * r, span }),
            Div if r != 0.0 => Some(Ir::Number { value: l / r, span }),
            Eq => Some(Ir::Bool { value: l == r, span }),
            Ne => Some(Ir::Bool { value: l != r, span }),
            Lt => Some(Ir::Bool { value: l < r, span }),
            Le => Some(Ir::Bool { value: l <= r, span }),
            Gt => Some(Ir::Bool { value: l > r, span }),
            Ge => Some(Ir::Bool { value: l >= r, span }),
            _ => None,
        };
    }
    if let (Ir::Bool { value: l, .. }, Ir::Bool { value: r, .. }) = (left, right) {
        let (l, r) = (*l, *r);
        return match op {
            And => Some(Ir::Bool { value: l && r, span }),
            Or => Some(Ir::Bool { value: l || r, span }),
            Eq => Some(Ir::Bool { value: l == r, span }),
            Ne => Some(Ir::Bool { value: l != r, span }),
            _ => None,
        };
    }
    if let (Ir::Str { value: l, .. }, Ir::Str { value: r, .. }) = (left, right) {
        if matches!(op, Add) {
            return Some(Ir::Str { value: Symbol::intern(&format!("{}{}", l.as_str(), r.as_str())), span });
        }
    }
    None
}

fn fold_unary(op: UnOp, operand: &Ir, span: lumina_util::Span) -> Option<Ir> {
    match (op, operand) {
        (UnOp::Neg, Ir::Int { value, .. }) => Some(Ir::Int { value: -value, span }),
        (UnOp::Neg, Ir::Number { value, .. }) => Some(Ir::Number { value: -value, span }),
        (UnOp::Not, Ir::Bool { value, .. }) => Some(Ir::Bool { value: !value, span }),
        (UnOp::BitNot, Ir::Int { value, .. }) => Some(Ir::Int { value: !value, span }),
        _ => None,
    }
}

/// A node is pure for the algebraic-identity rule (spec §4.7 pass 2) iff
/// removing it can't be observed: literals and identifier reads qualify,
/// calls never do.
fn is_pure_for_identity(ir: &Ir) -> bool {
    matches!(ir, Ir::Int { .. } | Ir::Number { .. } | Ir::Str { .. } | Ir::Bool { .. } | Ir::Unit { .. } | Ir::Ident { .. })
}

fn is_int_const(ir: &Ir, v: i64) -> bool {
    matches!(ir, Ir::Int { value, .. } if *value == v) || matches!(ir, Ir::Number { value, .. } if *value == v as f64)
}

fn is_bool_const(ir: &Ir, v: bool) -> bool {
    matches!(ir, Ir::Bool { value, .. } if *value == v)
}

fn simplify_binary(op: BinOp, left: &Ir, right: &Ir, span: lumina_util::Span) -> Option<Ir> {
    use BinOp::*;
    match op {
        Add if is_int_const(right, 0) => Some(left.clone_at(span)),
        Add if is_int_const(left, 0) => Some(right.clone_at(span)),
        Sub if is_int_const(right, 0) => Some(left.clone_at(span)),
        Mul if is_int_const(right, 1) => Some(left.clone_at(span)),
        Mul if is_int_const(left, 1) => Some(right.clone_at(span)),
        Div if is_int_const(right, 1) => Some(left.clone_at(span)),
        Mul if is_int_const(right, 0) || is_int_const(left, 0) => Some(Ir::Int { value: 0, span }),
        And if is_bool_const(right, true) => Some(left.clone_at(span)),
        And if is_bool_const(left, true) && is_pure_for_identity(right) => Some(right.clone_at(span)),
        And if is_bool_const(right, false) && is_pure_for_identity(left) => Some(Ir::Bool { value: false, span }),
        Or if is_bool_const(right, false) => Some(left.clone_at(span)),
        Or if is_bool_const(left, false) && is_pure_for_identity(right) => Some(right.clone_at(span)),
        Or if is_bool_const(right, true) && is_pure_for_identity(left) => Some(Ir::Bool { value: true, span }),
        _ => None,
    }
}

trait ReSpan {
    fn clone_at(&self, span: lumina_util::Span) -> Ir;
}

impl ReSpan for Ir {
    fn clone_at(&self, span: lumina_util::Span) -> Ir {
        let mut cloned = self.clone();
        cloned.set_span(span);
        cloned
    }
}

// ---------------------------------------------------------------------
// Pass 3: constant propagation
// ---------------------------------------------------------------------

fn constant_propagate(body: &mut Vec<Ir>) -> bool {
    let mut reassigned = FxHashSet::default();
    collect_reassigned_names(body, &mut reassigned);

    let mut constants: FxHashMap<Symbol, Ir> = FxHashMap::default();
    collect_constant_lets(body, &reassigned, &mut constants);
    if constants.is_empty() {
        return false;
    }

    let mut changed = false;
    substitute_constants(body, &constants, &mut changed);
    changed
}

fn collect_reassigned_names(body: &[Ir], out: &mut FxHashSet<Symbol>) {
    for ir in body {
        if let Ir::Assign { name, .. } = ir {
            out.insert(*name);
        }
        for block in ir.blocks() {
            collect_reassigned_names(block, out);
        }
    }
}

fn collect_constant_lets(body: &[Ir], reassigned: &FxHashSet<Symbol>, out: &mut FxHashMap<Symbol, Ir>) {
    for ir in body {
        if let Ir::Let { name, value, .. } = ir {
            if !reassigned.contains(name) && matches!(**value, Ir::Int { .. } | Ir::Number { .. } | Ir::Str { .. } | Ir::Bool { .. }) {
                out.insert(*name, (**value).clone());
            }
        }
        for block in ir.blocks() {
            collect_constant_lets(block, reassigned, out);
        }
    }
}

fn substitute_constants(body: &mut Vec<Ir>, constants: &FxHashMap<Symbol, Ir>, changed: &mut bool) {
    for ir in body.iter_mut() {
        substitute_in_node(ir, constants, changed);
    }
}

fn substitute_in_node(ir: &mut Ir, constants: &FxHashMap<Symbol, Ir>, changed: &mut bool) {
    if let Ir::Ident { name, span } = ir {
        if let Some(c) = constants.get(name) {
            let mut replacement = c.clone();
            replacement.set_span(*span);
            *ir = replacement;
            *changed = true;
            return;
        }
    }
    for child in ir.children_mut() {
        substitute_in_node(child, constants, changed);
    }
    for block in ir.blocks_mut() {
        substitute_constants(block, constants, changed);
    }
}

// ---------------------------------------------------------------------
// Pass 4: branch folding
// ---------------------------------------------------------------------

fn fold_branches(body: &mut Vec<Ir>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < body.len() {
        if let Ir::If { cond, then_branch, else_branch, .. } = &mut body[i] {
            changed |= fold_branches(then_branch);
            changed |= fold_branches(else_branch);
            if let Ir::Bool { value, .. } = **cond {
                let taken = if value { std::mem::take(then_branch) } else { std::mem::take(else_branch) };
                body.splice(i..i + 1, taken);
                changed = true;
                continue;
            }
        } else {
            for block in body[i].blocks_mut() {
                changed |= fold_branches(block);
            }
        }
        i += 1;
    }
    changed
}

// ---------------------------------------------------------------------
// Pass 5: dead-store elimination
// ---------------------------------------------------------------------

fn eliminate_dead_stores(body: &mut Vec<Ir>) -> bool {
    let mut reads = FxHashSet::default();
    collect_reads(body, &mut reads);
    remove_dead_lets(body, &reads)
}

fn collect_reads(body: &[Ir], out: &mut FxHashSet<Symbol>) {
    for ir in body {
        collect_reads_in_node(ir, out);
    }
}

fn collect_reads_in_node(ir: &Ir, out: &mut FxHashSet<Symbol>) {
    if let Ir::Ident { name, .. } = ir {
        out.insert(*name);
    }
    for child in ir.children() {
        collect_reads_in_node(child, out);
    }
    for block in ir.blocks() {
        collect_reads(block, out);
    }
}

fn remove_dead_lets(body: &mut Vec<Ir>, reads: &FxHashSet<Symbol>) -> bool {
    let mut changed = false;
    body.retain_mut(|ir| {
        if let Ir::Let { name, value, .. } = ir {
            if !reads.contains(name) && value.is_pure() {
                changed = true;
                return false;
            }
        }
        true
    });
    for ir in body.iter_mut() {
        for block in ir.blocks_mut() {
            changed |= remove_dead_lets(block, reads);
        }
    }
    changed
}

// ---------------------------------------------------------------------
// Pass 6: unreachable-code elimination
// ---------------------------------------------------------------------

fn eliminate_unreachable(body: &mut Vec<Ir>) -> bool {
    let mut changed = false;
    if let Some(idx) = body.iter().position(|ir| matches!(ir, Ir::Return { .. })) {
        if idx + 1 < body.len() {
            body.truncate(idx + 1);
            changed = true;
        }
    }
    for ir in body.iter_mut() {
        for block in ir.blocks_mut() {
            changed |= eliminate_unreachable(block);
        }
    }
    changed
}

// ---------------------------------------------------------------------
// Pass 7: reachability-based function DCE (whole-program, runs once after
// every function has reached its own fixed point — branch folding has
// already dropped call sites inside dead branches by then, so a call
// reference found now is a genuine edge).
// ---------------------------------------------------------------------

fn eliminate_dead_functions(program: &mut Program) {
    let mut reachable: FxHashSet<Symbol> = FxHashSet::default();
    let mut worklist: Vec<Symbol> = program
        .functions
        .iter()
        .filter(|f| f.exported || f.name.as_str() == "main")
        .map(|f| f.name)
        .collect();

    let by_name: FxHashMap<Symbol, usize> = program.functions.iter().enumerate().map(|(i, f)| (f.name, i)).collect();

    while let Some(name) = worklist.pop() {
        if !reachable.insert(name) {
            continue;
        }
        if let Some(&idx) = by_name.get(&name) {
            let mut callees = FxHashSet::default();
            collect_calls(&program.functions[idx].body, &mut callees);
            for callee in callees {
                if !reachable.contains(&callee) {
                    worklist.push(callee);
                }
            }
        }
    }

    let before = program.functions.len();
    program.functions.retain(|f| reachable.contains(&f.name));
    let dropped = before - program.functions.len();
    if dropped > 0 {
        debug!(dropped, "optimizer dropped unreachable functions");
    }
}

fn collect_calls(body: &[Ir], out: &mut FxHashSet<Symbol>) {
    for ir in body {
        collect_calls_in_node(ir, out);
    }
}

fn collect_calls_in_node(ir: &Ir, out: &mut FxHashSet<Symbol>) {
    if let Ir::Call { callee, .. } = ir {
        out.insert(*callee);
    }
    if let Ir::Closure { function, .. } = ir {
        out.insert(*function);
    }
    for child in ir.children() {
        collect_calls_in_node(child, out);
    }
    for block in ir.blocks() {
        collect_calls(block, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_util::Span;

    fn span() -> Span {
        Span::DUMMY
    }

    #[test]
    fn constant_folding_evaluates_int_arithmetic() {
        let mut body = vec![Ir::Binary {
            op: BinOp::Add,
            left: Box::new(Ir::Int { value: 2, span: span() }),
            right: Box::new(Ir::Int { value: 3, span: span() }),
            span: span(),
        }];
        constant_fold_and_simplify(&mut body);
        assert!(matches!(body[0], Ir::Int { value: 5, .. }));
    }

    #[test]
    fn adding_zero_simplifies_to_the_other_operand() {
        let mut body = vec![Ir::Binary {
            op: BinOp::Add,
            left: Box::new(Ir::Ident { name: Symbol::intern("x"), span: span() }),
            right: Box::new(Ir::Int { value: 0, span: span() }),
            span: span(),
        }];
        constant_fold_and_simplify(&mut body);
        assert!(matches!(&body[0], Ir::Ident { name, .. } if name.as_str() == "x"));
    }

    #[test]
    fn branch_folding_flattens_a_true_literal_condition() {
        let mut body = vec![Ir::If {
            cond: Box::new(Ir::Bool { value: true, span: span() }),
            then_branch: vec![Ir::Int { value: 1, span: span() }],
            else_branch: vec![Ir::Int { value: 2, span: span() }],
            span: span(),
        }];
        fold_branches(&mut body);
        assert_eq!(body.len(), 1);
        assert!(matches!(body[0], Ir::Int { value: 1, .. }));
    }

    #[test]
    fn dead_store_is_removed_when_never_read() {
        let mut body = vec![
            Ir::Let { name: Symbol::intern("unused"), value: Box::new(Ir::Int { value: 1, span: span() }), span: span() },
            Ir::Int { value: 0, span: span() },
        ];
        eliminate_dead_stores(&mut body);
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn dead_store_with_a_call_rhs_is_kept_for_its_side_effect() {
        let mut body = vec![Ir::Let {
            name: Symbol::intern("unused"),
            value: Box::new(Ir::Call { callee: Symbol::intern("log"), args: Vec::new(), span: span() }),
            span: span(),
        }];
        eliminate_dead_stores(&mut body);
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn code_after_return_in_the_same_block_is_dropped() {
        let mut body =
            vec![Ir::Return { value: None, span: span() }, Ir::Int { value: 1, span: span() }];
        eliminate_unreachable(&mut body);
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn unreachable_function_is_dropped_from_the_program() {
        let main = Function {
            name: Symbol::intern("main"),
            params: Vec::new(),
            body: vec![Ir::Call { callee: Symbol::intern("used"), args: Vec::new(), span: span() }],
            exported: false,
            span: span(),
        };
        let used = Function { name: Symbol::intern("used"), params: Vec::new(), body: Vec::new(), exported: false, span: span() };
        let orphan = Function { name: Symbol::intern("orphan"), params: Vec::new(), body: Vec::new(), exported: false, span: span() };
        let mut program = Program { functions: vec![main, used, orphan] };
        eliminate_dead_functions(&mut program);
        let names: FxHashSet<&str> = program.functions.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains("main"));
        assert!(names.contains("used"));
        assert!(!names.contains("orphan"));
    }
}
