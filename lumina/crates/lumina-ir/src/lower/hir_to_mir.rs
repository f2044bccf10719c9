//! Lowers a monomorphized, fully-typed [`lumina_ast::Program`] into the tree
//! [`crate::mir::Program`].
//!
//! The lowering keeps one environment, `name -> current IR suffix`, threaded
//! through every statement and expression. `let` always mints a fresh suffix
//! (so a shadowing `let` never aliases the binding it shadows); a plain
//! `Assign` reuses the current suffix everywhere except directly inside an
//! `if`'s own branches, where it mints a fresh suffix so the post-`if` merge
//! point can tell which branch last wrote the binding (spec §4.6's `Phi`
//! rule). Reusing the suffix inside a loop body is what makes the target's
//! native loop construct serve as the join point across iterations, with no
//! loop-header phi needed.
//!
//! Every expression lowering function takes an `out: &mut Vec<Ir>` sink: a
//! sub-expression that itself needs statements first (an `if`, a `match`, a
//! nested block) pushes them there before returning the `Ir` that stands for
//! its value. This is what lets `if`/`match` appear anywhere an expression
//! is expected, not only directly in statement or `let`-init position.

use lumina_ast::{
    self as ast, AssignExpr, Block, CompoundAssignExpr, ElseClause, Expr, ExprKind, FnItem, ForStmt, IfExpr, IfStmt,
    IsExpr, LambdaForm, Literal, MatchArm, MatchExpr, Pattern, PatternKind, Program as AstProgram, SelectExpr, Stmt,
    StmtKind, StringPart, StructLiteralExpr, Type as AstType, Visibility, WhileStmt,
};
use lumina_sem::infer::InferResult;
use lumina_sem::types::{PrimKind, Type as SemType};
use lumina_util::{FxHashMap, FxHashSet, Span, Symbol};

use crate::mir::{AggregateKind, BinOp, Function, Ir, NumCastKind, Program, UnOp};

/// Per-declaration layout the lowering pass needs but the surface AST
/// doesn't carry directly: a struct's declared field order (so a struct
/// literal's possibly-reordered, possibly-shorthand field list lowers to the
/// canonical positional order spec §4.9 requires) and each enum variant's
/// declaration-order discriminant (so `Tag` reads and match-arm
/// discrimination agree with each other).
struct AdtInfo {
    struct_fields: FxHashMap<Symbol, Vec<Symbol>>,
    variant_index: FxHashMap<Symbol, (Symbol, u32)>,
}

fn build_adt_info(program: &AstProgram) -> AdtInfo {
    let mut struct_fields = FxHashMap::default();
    let mut variant_index = FxHashMap::default();
    for item in &program.items {
        match &item.kind {
            ast::ItemKind::Struct(s) => {
                struct_fields.insert(s.name, s.fields.iter().map(|f| f.name).collect());
            }
            ast::ItemKind::Enum(e) => {
                for (i, v) in e.variants.iter().enumerate() {
                    variant_index.insert(v.name, (e.name, i as u32));
                }
            }
            _ => {}
        }
    }
    AdtInfo { struct_fields, variant_index }
}

type Env = FxHashMap<Symbol, Symbol>;

struct LowerCtx<'a> {
    adt: &'a AdtInfo,
    infer: &'a InferResult,
    fresh_counter: u32,
    /// Closures synthesized while lowering the function currently being
    /// lowered; drained into [`Program::functions`] once the whole program
    /// has been processed.
    extra_functions: Vec<Function>,
    /// One frame per `if` whose branches are currently being lowered. An
    /// `Assign` to a name already bound outside the `if` records
    /// `(name, new_suffix)` in the innermost frame instead of reusing the
    /// existing suffix; `lower_if_stmt` drains its own frame to build the
    /// post-`if` `Phi`s, then re-logs any name it minted a new suffix for
    /// into the next frame out (if any), so a reassignment nested two `if`s
    /// deep still reaches the outermost join point.
    branch_log: Vec<FxHashMap<Symbol, Symbol>>,
}

impl<'a> LowerCtx<'a> {
    fn fresh(&mut self, base: Symbol) -> Symbol {
        self.fresh_counter += 1;
        Symbol::intern(&format!("{}_{}", base.as_str(), self.fresh_counter))
    }
}

/// Entry point: lowers every top-level `fn` item into a [`Function`].
/// `infer` is the result that typed `program` (before or after
/// monomorphization — monomorphized bodies keep their original
/// [`lumina_ast::NodeId`]s on cloned sub-expressions, so the type map still
/// applies), used only to classify numeric `Cast` nodes.
pub fn lower_program(program: &AstProgram, infer: &InferResult) -> Program {
    let adt = build_adt_info(program);
    let mut ctx = LowerCtx { adt: &adt, infer, fresh_counter: 0, extra_functions: Vec::new(), branch_log: Vec::new() };
    let mut functions = Vec::new();
    for item in &program.items {
        if let ast::ItemKind::Fn(f) = &item.kind {
            functions.push(lower_fn(&mut ctx, f, item.span));
        }
    }
    functions.append(&mut ctx.extra_functions);
    Program { functions }
}

fn lower_fn(ctx: &mut LowerCtx, f: &FnItem, span: Span) -> Function {
    let mut env: Env = FxHashMap::default();
    let mut params = Vec::with_capacity(f.params.len());
    for p in &f.params {
        params.push(p.name);
        env.insert(p.name, p.name);
    }
    let mut body = lower_block_body(ctx, &mut env, &f.body);
    // The block's trailing expression, if any, is the function's implicit
    // return value; an explicit `return` inside the body already lowered to
    // its own `Ir::Return`.
    if f.body.trailing.is_some() {
        if let Some(last) = body.pop() {
            let last_span = last.span();
            body.push(Ir::Return { value: Some(Box::new(last)), span: last_span });
        }
    }
    Function { name: f.name, params, body, exported: matches!(f.visibility, Visibility::Public), span }
}

fn lower_block_body(ctx: &mut LowerCtx, env: &mut Env, block: &Block) -> Vec<Ir> {
    let mut out = Vec::new();
    for stmt in &block.stmts {
        lower_stmt(ctx, env, &mut out, stmt);
    }
    if let Some(trailing) = &block.trailing {
        let value = lower_expr(ctx, env, &mut out, trailing);
        out.push(value);
    }
    out
}

fn lower_stmt(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Let(let_stmt) => {
            let value = match &let_stmt.init {
                Some(e) => lower_expr(ctx, env, out, e),
                None => Ir::Unit { span: stmt.span },
            };
            bind_let_pattern(ctx, env, out, &let_stmt.pattern, value, stmt.span);
        }
        StmtKind::Expr(e) => {
            let v = lower_expr(ctx, env, out, e);
            out.push(v);
        }
        StmtKind::Return(value) => {
            let ir_value = value.as_ref().map(|e| Box::new(lower_expr(ctx, env, out, e)));
            out.push(Ir::Return { value: ir_value, span: stmt.span });
        }
        StmtKind::If(if_stmt) => lower_if_stmt(ctx, env, out, if_stmt, stmt.span),
        StmtKind::While(w) => {
            let loop_ir = lower_while(ctx, env, w, stmt.span);
            out.push(loop_ir);
        }
        StmtKind::For(f) => {
            let loop_ir = lower_for(ctx, env, f, stmt.span);
            out.push(loop_ir);
        }
        StmtKind::Break(_label) => out.push(Ir::Break { span: stmt.span }),
        StmtKind::Continue(_label) => out.push(Ir::Continue { span: stmt.span }),
        // A function item nested inside another function's body lowers as
        // its own top-level declaration in richer language designs; this
        // core only lowers top-level items (`lower_program`'s loop), so a
        // nested item is a documented gap rather than silently mis-lowered.
        StmtKind::Item(_) => {}
    }
}

/// Binds a `let` pattern's irrefutable destructuring (tuple/struct/slice) by
/// minting a fresh suffix per leaf identifier, same convention
/// `bind_field_pattern` uses for a match arm's payload bindings.
fn bind_let_pattern(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, pattern: &Pattern, value: Ir, span: Span) {
    match &pattern.kind {
        PatternKind::Ident(name, _) => {
            let suffix = ctx.fresh(*name);
            out.push(Ir::Let { name: suffix, value: Box::new(value), span });
            env.insert(*name, suffix);
        }
        PatternKind::Wildcard => out.push(Ir::Let { name: ctx.fresh(Symbol::intern("_")), value: Box::new(value), span }),
        _ => {
            let root = ctx.fresh(Symbol::intern("let"));
            out.push(Ir::Let { name: root, value: Box::new(value), span });
            bind_destructure(ctx, env, out, pattern, root, span);
        }
    }
}

fn bind_destructure(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, pattern: &Pattern, scrutinee: Symbol, span: Span) {
    match &pattern.kind {
        PatternKind::Wildcard | PatternKind::Literal(_) | PatternKind::Path(_) => {}
        PatternKind::Ident(name, _) => {
            let suffix = ctx.fresh(*name);
            out.push(Ir::Let { name: suffix, value: Box::new(Ir::Ident { name: scrutinee, span }), span });
            env.insert(*name, suffix);
        }
        PatternKind::TupleStruct(_, pats) | PatternKind::Tuple(pats) => {
            for (i, pat) in pats.iter().enumerate() {
                let member = Ir::Member { object: Box::new(Ir::Ident { name: scrutinee, span }), field: positional_field(i), span };
                bind_field_pattern(ctx, env, out, pat, member, span);
            }
        }
        PatternKind::Struct(_, fields) => {
            for fp in fields {
                let member = Ir::Member { object: Box::new(Ir::Ident { name: scrutinee, span }), field: fp.field, span };
                bind_field_pattern(ctx, env, out, &fp.pattern, member, span);
            }
        }
        PatternKind::Slice(pats) => {
            for (i, pat) in pats.iter().enumerate() {
                let index = Ir::Index {
                    object: Box::new(Ir::Ident { name: scrutinee, span }),
                    index: Box::new(Ir::Int { value: i as i64, span }),
                    span,
                };
                bind_field_pattern(ctx, env, out, pat, index, span);
            }
        }
    }
}

fn bind_field_pattern(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, pat: &Pattern, value: Ir, span: Span) {
    match &pat.kind {
        PatternKind::Wildcard => {}
        PatternKind::Ident(name, _) => {
            let suffix = ctx.fresh(*name);
            out.push(Ir::Let { name: suffix, value: Box::new(value), span });
            env.insert(*name, suffix);
        }
        _ => {
            let suffix = ctx.fresh(Symbol::intern("field"));
            out.push(Ir::Let { name: suffix, value: Box::new(value), span });
            bind_destructure(ctx, env, out, pat, suffix, span);
        }
    }
}

/// A tuple/tuple-struct/array-pattern leaf's positional field name. Struct
/// literals and `Aggregate` nodes for `Tuple`/`Array`/tuple-variant payloads
/// use this same `_<index>` convention, so a back end reads both sides
/// consistently.
fn positional_field(i: usize) -> Symbol {
    Symbol::intern(&format!("_{i}"))
}

// ---------------------------------------------------------------------
// if (statement position): the Phi-join rule
// ---------------------------------------------------------------------

fn lower_if_stmt(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, if_stmt: &IfStmt, span: Span) {
    let cond_ir = lower_expr(ctx, env, out, &if_stmt.cond);
    let cond_name = ctx.fresh(Symbol::intern("if_cond"));
    out.push(Ir::Let { name: cond_name, value: Box::new(cond_ir), span });
    let cond_ir = Ir::Ident { name: cond_name, span };

    ctx.branch_log.push(FxHashMap::default());
    let mut then_env = env.clone();
    let then_branch = lower_block_body(ctx, &mut then_env, &if_stmt.then_block);
    let then_log = ctx.branch_log.pop().unwrap();

    ctx.branch_log.push(FxHashMap::default());
    let mut else_env = env.clone();
    let else_branch = match &if_stmt.else_clause {
        None => Vec::new(),
        Some(clause) => match clause.as_ref() {
            ElseClause::Block(block) => lower_block_body(ctx, &mut else_env, block),
            ElseClause::If(nested) => {
                let mut nested_out = Vec::new();
                lower_if_stmt(ctx, &mut else_env, &mut nested_out, nested, span);
                nested_out
            }
        },
    };
    let else_log = ctx.branch_log.pop().unwrap();

    out.push(Ir::If { cond: Box::new(cond_ir.clone()), then_branch, else_branch, span });

    let mut names: Vec<Symbol> = then_log.keys().copied().collect();
    for name in else_log.keys() {
        if !names.contains(name) {
            names.push(*name);
        }
    }
    // Deterministic emission order: lowering must not depend on hash-map
    // iteration order for reproducible output.
    names.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    for name in names {
        let then_suffix = then_log.get(&name).copied().or_else(|| env.get(&name).copied());
        let else_suffix = else_log.get(&name).copied().or_else(|| env.get(&name).copied());
        let (Some(then_suffix), Some(else_suffix)) = (then_suffix, else_suffix) else { continue };
        if then_suffix == else_suffix {
            // Both branches (if either touched it at all) left it on the
            // same suffix as before the `if`; no merge needed.
            continue;
        }
        let new_suffix = ctx.fresh(name);
        out.push(Ir::Let {
            name: new_suffix,
            value: Box::new(Ir::Phi {
                condition: Box::new(cond_ir.clone()),
                then_value: Box::new(Ir::Ident { name: then_suffix, span }),
                else_value: Box::new(Ir::Ident { name: else_suffix, span }),
                span,
            }),
            span,
        });
        env.insert(name, new_suffix);
        if let Some(outer) = ctx.branch_log.last_mut() {
            outer.insert(name, new_suffix);
        }
    }
}

// ---------------------------------------------------------------------
// if (expression position): merges to a single value via a synthetic result
// ---------------------------------------------------------------------

fn lower_if_expr(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, if_expr: &IfExpr, span: Span) -> Ir {
    let cond_ir = lower_expr(ctx, env, out, &if_expr.cond);
    let cond_name = ctx.fresh(Symbol::intern("if_cond"));
    out.push(Ir::Let { name: cond_name, value: Box::new(cond_ir), span });
    let cond_ir = Ir::Ident { name: cond_name, span };

    let mut then_env = env.clone();
    let mut then_branch = lower_block_body(ctx, &mut then_env, &if_expr.then_block);
    let then_value = then_branch.pop().unwrap_or(Ir::Unit { span });
    let then_result = ctx.fresh(Symbol::intern("if_then"));
    then_branch.push(Ir::Let { name: then_result, value: Box::new(then_value), span });

    let mut else_env = env.clone();
    let mut else_branch = Vec::new();
    let else_value = match &if_expr.else_block {
        Some(e) => lower_expr(ctx, &mut else_env, &mut else_branch, e),
        None => Ir::Unit { span },
    };
    let else_result = ctx.fresh(Symbol::intern("if_else"));
    else_branch.push(Ir::Let { name: else_result, value: Box::new(else_value), span });

    out.push(Ir::If { cond: Box::new(cond_ir.clone()), then_branch, else_branch, span });

    let result = ctx.fresh(Symbol::intern("if_result"));
    out.push(Ir::Let {
        name: result,
        value: Box::new(Ir::Phi {
            condition: Box::new(cond_ir),
            then_value: Box::new(Ir::Ident { name: then_result, span }),
            else_value: Box::new(Ir::Ident { name: else_result, span }),
            span,
        }),
        span,
    });
    Ir::Ident { name: result, span }
}

// ---------------------------------------------------------------------
// match: a nested-if discrimination cascade, reusing the same merge shape
// ---------------------------------------------------------------------

fn lower_match(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, m: &MatchExpr, span: Span) -> Ir {
    let scrutinee_ir = lower_expr(ctx, env, out, &m.scrutinee);
    let scrutinee = ctx.fresh(Symbol::intern("scrutinee"));
    out.push(Ir::Let { name: scrutinee, value: Box::new(scrutinee_ir), span });
    let (stmts, value) = lower_arms(ctx, env, &m.arms, 0, scrutinee, span);
    out.extend(stmts);
    value
}

fn lower_arms(ctx: &mut LowerCtx, env: &Env, arms: &[MatchArm], idx: usize, scrutinee: Symbol, span: Span) -> (Vec<Ir>, Ir) {
    let arm = &arms[idx];
    let is_catchall = idx == arms.len() - 1 || matches!(arm.pattern.kind, PatternKind::Wildcard | PatternKind::Ident(..));

    if is_catchall {
        let mut arm_env = env.clone();
        let mut arm_out = Vec::new();
        bind_destructure(ctx, &mut arm_env, &mut arm_out, &arm.pattern, scrutinee, span);
        let value = lower_expr(ctx, &mut arm_env, &mut arm_out, &arm.body);
        return (arm_out, value);
    }

    let cond = pattern_tag_test(ctx, &arm.pattern, scrutinee, span);

    let mut then_env = env.clone();
    let mut then_branch = Vec::new();
    bind_destructure(ctx, &mut then_env, &mut then_branch, &arm.pattern, scrutinee, span);
    let then_value = lower_expr(ctx, &mut then_env, &mut then_branch, &arm.body);
    let then_result = ctx.fresh(Symbol::intern("arm"));
    then_branch.push(Ir::Let { name: then_result, value: Box::new(then_value), span });

    let (mut else_branch, else_value) = lower_arms(ctx, env, arms, idx + 1, scrutinee, span);
    let else_result = ctx.fresh(Symbol::intern("arm"));
    else_branch.push(Ir::Let { name: else_result, value: Box::new(else_value), span });

    let mut stmts = vec![Ir::If { cond: Box::new(cond.clone()), then_branch, else_branch, span }];
    let result = ctx.fresh(Symbol::intern("match_result"));
    stmts.push(Ir::Let {
        name: result,
        value: Box::new(Ir::Phi {
            condition: Box::new(cond),
            then_value: Box::new(Ir::Ident { name: then_result, span }),
            else_value: Box::new(Ir::Ident { name: else_result, span }),
            span,
        }),
        span,
    });
    (stmts, Ir::Ident { name: result, span })
}

fn pattern_tag_test(ctx: &LowerCtx, pattern: &Pattern, scrutinee: Symbol, span: Span) -> Ir {
    match &pattern.kind {
        PatternKind::Literal(lit) => Ir::Binary {
            op: BinOp::Eq,
            left: Box::new(Ir::Ident { name: scrutinee, span }),
            right: Box::new(lower_literal(lit, span)),
            span,
        },
        PatternKind::Path(path) | PatternKind::TupleStruct(path, _) | PatternKind::Struct(path, _) => {
            let variant = path.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern("_"));
            let idx = ctx.adt.variant_index.get(&variant).map(|(_, i)| *i).unwrap_or(0);
            Ir::Binary {
                op: BinOp::Eq,
                left: Box::new(Ir::Tag { object: Box::new(Ir::Ident { name: scrutinee, span }), span }),
                right: Box::new(Ir::Int { value: idx as i64, span }),
                span,
            }
        }
        PatternKind::Tuple(_) | PatternKind::Slice(_) | PatternKind::Wildcard | PatternKind::Ident(..) => {
            Ir::Bool { value: true, span }
        }
    }
}

// ---------------------------------------------------------------------
// loops
// ---------------------------------------------------------------------

fn lower_while(ctx: &mut LowerCtx, env: &mut Env, w: &WhileStmt, span: Span) -> Ir {
    let mut body = Vec::new();
    let cond_ir = lower_expr(ctx, env, &mut body, &w.cond);
    body.push(Ir::If {
        cond: Box::new(Ir::Unary { op: UnOp::Not, operand: Box::new(cond_ir), span }),
        then_branch: vec![Ir::Break { span }],
        else_branch: Vec::new(),
        span,
    });
    body.extend(lower_block_body(ctx, env, &w.body));
    Ir::Loop { body, span }
}

/// Lowers `for pat in iter { body }` against a minimal two-call iterator
/// protocol (`has_next`/`next` on the iterator value) rather than an
/// `Option`-returning `next` — the monomorphized program's concrete
/// iterable types (array, range) are expected to provide both, and this
/// sidesteps needing the iterated type's own enum layout (which may not be
/// a user-declared enum at all, e.g. a range) just to drive the loop.
fn lower_for(ctx: &mut LowerCtx, env: &mut Env, f: &ForStmt, span: Span) -> Ir {
    let mut body = Vec::new();
    let iter_value = lower_expr(ctx, env, &mut body, &f.iter);
    let iter_sym = ctx.fresh(Symbol::intern("iter"));
    body.push(Ir::Let { name: iter_sym, value: Box::new(iter_value), span });

    let mut loop_body = Vec::new();
    let has_next = ctx.fresh(Symbol::intern("has_next"));
    loop_body.push(Ir::Let {
        name: has_next,
        value: Box::new(Ir::Call { callee: Symbol::intern("has_next"), args: vec![Ir::Ident { name: iter_sym, span }], span }),
        span,
    });
    loop_body.push(Ir::If {
        cond: Box::new(Ir::Unary { op: UnOp::Not, operand: Box::new(Ir::Ident { name: has_next, span }), span }),
        then_branch: vec![Ir::Break { span }],
        else_branch: Vec::new(),
        span,
    });
    let item_value = Ir::Call { callee: Symbol::intern("next"), args: vec![Ir::Ident { name: iter_sym, span }], span };
    bind_let_pattern(ctx, env, &mut loop_body, &f.pattern, item_value, span);
    loop_body.extend(lower_block_body(ctx, env, &f.body));

    body.push(Ir::Loop { body: loop_body, span });
    Ir::Block { body, span }
}

// ---------------------------------------------------------------------
// expressions
// ---------------------------------------------------------------------

fn lower_expr(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, expr: &Expr) -> Ir {
    let span = expr.span;
    match &expr.kind {
        ExprKind::Literal(lit) => lower_literal_expr(ctx, env, out, lit, span),
        ExprKind::Path(path) => {
            let name = path.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern("_"));
            match env.get(&name) {
                Some(suffix) => Ir::Ident { name: *suffix, span },
                // A path we've never bound is a reference to a top-level
                // item (function, const, unit enum variant) by its original
                // name; monomorphization already rewrote call-site callee
                // names, so this is just a value reference.
                None => Ir::Ident { name, span },
            }
        }
        ExprKind::Binary(b) => {
            let left = lower_expr(ctx, env, out, &b.left);
            let right = lower_expr(ctx, env, out, &b.right);
            Ir::Binary { op: convert_binop(b.op), left: Box::new(left), right: Box::new(right), span }
        }
        ExprKind::Unary(u) => {
            let operand = lower_expr(ctx, env, out, &u.expr);
            Ir::Unary { op: convert_unop(u.op), operand: Box::new(operand), span }
        }
        ExprKind::Call(c) => {
            let callee = match &c.func.kind {
                ExprKind::Path(p) => p.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern("_")),
                _ => Symbol::intern("_"),
            };
            let args = c.args.iter().map(|a| lower_expr(ctx, env, out, a)).collect();
            Ir::Call { callee, args, span }
        }
        // Method dispatch is resolved structurally, not through a vtable:
        // the receiver becomes the call's first argument and the method
        // name becomes the callee, matching how a free function taking
        // `self` first would be called. This core has no trait objects, so
        // there is no dynamic dispatch to model here.
        ExprKind::MethodCall(m) => {
            let receiver = lower_expr(ctx, env, out, &m.receiver);
            let mut args = vec![receiver];
            args.extend(m.args.iter().map(|a| lower_expr(ctx, env, out, a)));
            Ir::Call { callee: m.method, args, span }
        }
        ExprKind::Field(f) => {
            let object = lower_expr(ctx, env, out, &f.object);
            Ir::Member { object: Box::new(object), field: f.field, span }
        }
        ExprKind::Index(i) => {
            let object = lower_expr(ctx, env, out, &i.object);
            let index = lower_expr(ctx, env, out, &i.index);
            Ir::Index { object: Box::new(object), index: Box::new(index), span }
        }
        ExprKind::Block(b) => {
            let mut inner_env = env.clone();
            Ir::Block { body: lower_block_body(ctx, &mut inner_env, b), span }
        }
        ExprKind::If(if_expr) => lower_if_expr(ctx, env, out, if_expr, span),
        ExprKind::Match(m) => lower_match(ctx, env, out, m, span),
        ExprKind::Lambda(l) => lower_lambda(ctx, env, l, span),
        ExprKind::Assign(a) => lower_assign(ctx, env, out, a, span),
        ExprKind::CompoundAssign(c) => lower_compound_assign(ctx, env, out, c, span),
        ExprKind::Return(value) => {
            let ir_value = value.as_ref().map(|e| Box::new(lower_expr(ctx, env, out, e)));
            out.push(Ir::Return { value: ir_value, span });
            Ir::Unit { span }
        }
        ExprKind::Break(value, _label) => {
            if let Some(v) = value {
                // The value of a value-carrying `break` is evaluated for its
                // side effects and then discarded: this tree IR's `Loop`
                // doesn't carry a result type (only `if`/`match` merge to a
                // value here), matching the rest of the core's statement
                // -oriented loop treatment.
                let v_ir = lower_expr(ctx, env, out, v);
                out.push(v_ir);
            }
            out.push(Ir::Break { span });
            Ir::Unit { span }
        }
        ExprKind::Continue(_label) => {
            out.push(Ir::Continue { span });
            Ir::Unit { span }
        }
        ExprKind::Tuple(items) => {
            let fields = items.iter().map(|e| lower_expr(ctx, env, out, e)).collect();
            Ir::Aggregate { kind: AggregateKind::Tuple, fields, span }
        }
        ExprKind::Array(items) => {
            let fields = items.iter().map(|e| lower_expr(ctx, env, out, e)).collect();
            Ir::Aggregate { kind: AggregateKind::Array, fields, span }
        }
        ExprKind::ArrayRepeat { value, size } => {
            let value_ir = lower_expr(ctx, env, out, value);
            let n = const_expr_literal(size);
            let mut fields = Vec::with_capacity(n);
            // Re-lowering the value expression once per slot would
            // duplicate any side effect it has; bind it once and repeat the
            // reference instead.
            let temp = ctx.fresh(Symbol::intern("repeat"));
            out.push(Ir::Let { name: temp, value: Box::new(value_ir), span });
            for _ in 0..n {
                fields.push(Ir::Ident { name: temp, span });
            }
            Ir::Aggregate { kind: AggregateKind::Array, fields, span }
        }
        ExprKind::Range(r) => {
            let start = r.start.as_ref().map(|e| lower_expr(ctx, env, out, e)).unwrap_or(Ir::Unit { span });
            let end = r.end.as_ref().map(|e| lower_expr(ctx, env, out, e)).unwrap_or(Ir::Unit { span });
            Ir::Aggregate { kind: AggregateKind::Tuple, fields: vec![start, end], span }
        }
        ExprKind::Cast(inner, ty) => {
            let value = lower_expr(ctx, env, out, inner);
            let kind = classify_cast(ctx, inner, ty);
            Ir::Cast { value: Box::new(value), kind, span }
        }
        // Single-threaded, non-suspending core (§5): `async { body }` lowers
        // transparently to its body, and `.await` is identity. Neither node
        // changes control flow here.
        ExprKind::Async(a) => {
            let mut inner_env = env.clone();
            Ir::Block { body: lower_block_body(ctx, &mut inner_env, &a.body), span }
        }
        ExprKind::Await(inner) => lower_expr(ctx, env, out, inner),
        // `expr?` propagation is a surface-level control construct this
        // core's IR doesn't model explicitly; the operand's value passes
        // through unchanged rather than synthesizing an early-return branch.
        ExprKind::Try(inner) => lower_expr(ctx, env, out, inner),
        ExprKind::Is(is_expr) => lower_is(ctx, env, out, is_expr, span),
        ExprKind::Select(select) => lower_select(ctx, env, out, select, span),
        ExprKind::StructLiteral(lit) => lower_struct_literal(ctx, env, out, lit, span),
        ExprKind::EnumVariant(v) => {
            let (_enum_name, idx) = ctx.adt.variant_index.get(&v.variant).copied().unwrap_or((Symbol::intern("_"), 0));
            let fields = match &v.data {
                ast::EnumVariantData::Unit => Vec::new(),
                ast::EnumVariantData::Tuple(exprs) => exprs.iter().map(|e| lower_expr(ctx, env, out, e)).collect(),
                ast::EnumVariantData::Struct(sfs) => sfs.iter().map(|f| lower_expr(ctx, env, out, &f.expr)).collect(),
            };
            let enum_name = v.path.segments.first().map(|s| s.ident).unwrap_or(v.variant);
            Ir::Aggregate { kind: AggregateKind::EnumVariant(enum_name, v.variant, idx), fields, span }
        }
    }
}

fn lower_literal_expr(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, lit: &Literal, span: Span) -> Ir {
    match lit {
        Literal::InterpString(parts) => {
            // `"a {x} b"` lowers to a left fold of `Binary(Add, ...)` over
            // its chunks, matching how the language's `+` already
            // concatenates strings (no separate "concat" node needed).
            let mut acc: Option<Ir> = None;
            for part in parts {
                let piece = match part {
                    StringPart::Str(s) => Ir::Str { value: *s, span },
                    StringPart::Expr(e) => lower_expr(ctx, env, out, e),
                };
                acc = Some(match acc {
                    None => piece,
                    Some(prev) => Ir::Binary { op: BinOp::Add, left: Box::new(prev), right: Box::new(piece), span },
                });
            }
            acc.unwrap_or(Ir::Str { value: Symbol::intern(""), span })
        }
        other => lower_literal(other, span),
    }
}

fn lower_literal(lit: &Literal, span: Span) -> Ir {
    match lit {
        Literal::Int { value, .. } => Ir::Int { value: *value, span },
        Literal::Float { value, .. } => Ir::Number { value: *value, span },
        Literal::String(s) => Ir::Str { value: *s, span },
        Literal::InterpString(_) => Ir::Str { value: Symbol::intern(""), span },
        Literal::Char(c) => Ir::Int { value: *c as i64, span },
        Literal::Bool(b) => Ir::Bool { value: *b, span },
        Literal::Unit => Ir::Unit { span },
    }
}

fn lower_assign(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, a: &AssignExpr, span: Span) -> Ir {
    let value = lower_expr(ctx, env, out, &a.value);
    assign_to_place(ctx, env, out, &a.place, value, span);
    Ir::Unit { span }
}

fn lower_compound_assign(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, c: &CompoundAssignExpr, span: Span) -> Ir {
    let current = lower_expr(ctx, env, out, &c.place);
    let rhs = lower_expr(ctx, env, out, &c.value);
    let value = Ir::Binary { op: convert_binop(c.op), left: Box::new(current), right: Box::new(rhs), span };
    assign_to_place(ctx, env, out, &c.place, value, span);
    Ir::Unit { span }
}

fn assign_to_place(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, place: &Expr, value: Ir, span: Span) {
    if let ExprKind::Path(path) = &place.kind {
        if let Some(seg) = path.segments.last() {
            let name = seg.ident;
            if let Some(current) = env.get(&name).copied() {
                if !ctx.branch_log.is_empty() {
                    let new_suffix = ctx.fresh(name);
                    out.push(Ir::Let { name: new_suffix, value: Box::new(value), span });
                    env.insert(name, new_suffix);
                    ctx.branch_log.last_mut().unwrap().insert(name, new_suffix);
                } else {
                    out.push(Ir::Assign { name: current, value: Box::new(value), span });
                }
                return;
            }
        }
    }
    let place_ir = lower_expr(ctx, env, out, place);
    out.push(Ir::Store { place: Box::new(place_ir), value: Box::new(value), span });
}

fn lower_lambda(ctx: &mut LowerCtx, env: &Env, l: &ast::LambdaExpr, span: Span) -> Ir {
    let fn_name = ctx.fresh(Symbol::intern("lambda"));
    let mut inner_env: Env = FxHashMap::default();
    let mut params = Vec::with_capacity(l.params.len());
    for p in &l.params {
        params.push(p.name);
        inner_env.insert(p.name, p.name);
    }

    let mut free = FxHashSet::default();
    let mut bound: FxHashSet<Symbol> = inner_env.keys().copied().collect();
    collect_free_idents_in_expr(&l.body, &mut bound, &mut free);

    let mut captures = Vec::new();
    for name in &free {
        if let Some(suffix) = env.get(name) {
            inner_env.insert(*name, *suffix);
            captures.push(*suffix);
        }
    }
    captures.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    let mut body = Vec::new();
    // `FnKeyword`-form bodies are always a block (so the general `if matches
    // Block` carve-out below is unreachable for them); `Pipe`-form bodies
    // are just as often a bare expression, which `lower_expr` already
    // handles identically to a block's trailing expression.
    let _ = matches!(l.form, LambdaForm::FnKeyword);
    let value = lower_expr(ctx, &mut inner_env, &mut body, &l.body);
    body.push(Ir::Return { value: Some(Box::new(value)), span });

    ctx.extra_functions.push(Function { name: fn_name, params, body, exported: false, span });
    Ir::Closure { function: fn_name, captures, span }
}

/// An approximate free-variable walk used only to decide what a lambda
/// captures: no escape analysis, just "every identifier the body mentions
/// that isn't one of its own parameters or introduced by one of its own
/// nested `let`s/patterns". Good enough to build a capture list; not a
/// scope-correctness checker (that's the semantic analyzer's job, already
/// done by the time this pass runs).
fn collect_free_idents_in_expr(expr: &Expr, bound: &mut FxHashSet<Symbol>, free: &mut FxHashSet<Symbol>) {
    match &expr.kind {
        ExprKind::Path(p) => {
            if let Some(seg) = p.segments.last() {
                if !bound.contains(&seg.ident) {
                    free.insert(seg.ident);
                }
            }
        }
        ExprKind::Literal(Literal::InterpString(parts)) => {
            for part in parts {
                if let StringPart::Expr(e) = part {
                    collect_free_idents_in_expr(e, bound, free);
                }
            }
        }
        ExprKind::Literal(_) => {}
        ExprKind::Binary(b) => {
            collect_free_idents_in_expr(&b.left, bound, free);
            collect_free_idents_in_expr(&b.right, bound, free);
        }
        ExprKind::Unary(u) => collect_free_idents_in_expr(&u.expr, bound, free),
        ExprKind::Call(c) => {
            collect_free_idents_in_expr(&c.func, bound, free);
            for a in &c.args {
                collect_free_idents_in_expr(a, bound, free);
            }
        }
        ExprKind::MethodCall(m) => {
            collect_free_idents_in_expr(&m.receiver, bound, free);
            for a in &m.args {
                collect_free_idents_in_expr(a, bound, free);
            }
        }
        ExprKind::Field(f) => collect_free_idents_in_expr(&f.object, bound, free),
        ExprKind::Index(i) => {
            collect_free_idents_in_expr(&i.object, bound, free);
            collect_free_idents_in_expr(&i.index, bound, free);
        }
        ExprKind::Block(b) => collect_free_idents_in_block(b, bound, free),
        ExprKind::If(if_expr) => {
            collect_free_idents_in_expr(&if_expr.cond, bound, free);
            collect_free_idents_in_block(&if_expr.then_block, bound, free);
            if let Some(e) = &if_expr.else_block {
                collect_free_idents_in_expr(e, bound, free);
            }
        }
        ExprKind::Match(m) => {
            collect_free_idents_in_expr(&m.scrutinee, bound, free);
            for arm in &m.arms {
                let mut arm_bound = bound.clone();
                pattern_bound_names(&arm.pattern, &mut arm_bound);
                if let Some(g) = &arm.guard {
                    collect_free_idents_in_expr(g, &mut arm_bound, free);
                }
                collect_free_idents_in_expr(&arm.body, &mut arm_bound, free);
            }
        }
        ExprKind::Lambda(l) => {
            let mut inner_bound = bound.clone();
            for p in &l.params {
                inner_bound.insert(p.name);
            }
            collect_free_idents_in_expr(&l.body, &mut inner_bound, free);
        }
        ExprKind::Assign(a) => {
            collect_free_idents_in_expr(&a.place, bound, free);
            collect_free_idents_in_expr(&a.value, bound, free);
        }
        ExprKind::CompoundAssign(c) => {
            collect_free_idents_in_expr(&c.place, bound, free);
            collect_free_idents_in_expr(&c.value, bound, free);
        }
        ExprKind::Return(v) => {
            if let Some(e) = v {
                collect_free_idents_in_expr(e, bound, free);
            }
        }
        ExprKind::Break(v, _) => {
            if let Some(e) = v {
                collect_free_idents_in_expr(e, bound, free);
            }
        }
        ExprKind::Continue(_) => {}
        ExprKind::Tuple(items) | ExprKind::Array(items) => {
            for e in items {
                collect_free_idents_in_expr(e, bound, free);
            }
        }
        ExprKind::ArrayRepeat { value, .. } => collect_free_idents_in_expr(value, bound, free),
        ExprKind::Range(r) => {
            if let Some(e) = &r.start {
                collect_free_idents_in_expr(e, bound, free);
            }
            if let Some(e) = &r.end {
                collect_free_idents_in_expr(e, bound, free);
            }
        }
        ExprKind::Cast(inner, _) => collect_free_idents_in_expr(inner, bound, free),
        ExprKind::Await(inner) => collect_free_idents_in_expr(inner, bound, free),
        ExprKind::Try(inner) => collect_free_idents_in_expr(inner, bound, free),
        ExprKind::Async(a) => collect_free_idents_in_block(&a.body, bound, free),
        ExprKind::Is(is_expr) => {
            collect_free_idents_in_expr(&is_expr.value, bound, free);
        }
        ExprKind::Select(select) => {
            for arm in &select.arms {
                collect_free_idents_in_expr(&arm.future, bound, free);
                let mut arm_bound = bound.clone();
                if let Some(b) = arm.binding {
                    arm_bound.insert(b);
                }
                collect_free_idents_in_expr(&arm.body, &mut arm_bound, free);
            }
        }
        ExprKind::StructLiteral(lit) => {
            for f in &lit.fields {
                collect_free_idents_in_expr(&f.expr, bound, free);
            }
            if let Some(b) = &lit.base {
                collect_free_idents_in_expr(b, bound, free);
            }
        }
        ExprKind::EnumVariant(v) => match &v.data {
            ast::EnumVariantData::Unit => {}
            ast::EnumVariantData::Tuple(exprs) => {
                for e in exprs {
                    collect_free_idents_in_expr(e, bound, free);
                }
            }
            ast::EnumVariantData::Struct(sfs) => {
                for f in sfs {
                    collect_free_idents_in_expr(&f.expr, bound, free);
                }
            }
        },
    }
}

fn collect_free_idents_in_block(block: &Block, bound: &FxHashSet<Symbol>, free: &mut FxHashSet<Symbol>) {
    let mut bound = bound.clone();
    for stmt in &block.stmts {
        match &stmt.kind {
            StmtKind::Let(l) => {
                if let Some(init) = &l.init {
                    collect_free_idents_in_expr(init, &mut bound, free);
                }
                pattern_bound_names(&l.pattern, &mut bound);
            }
            StmtKind::Expr(e) => collect_free_idents_in_expr(e, &mut bound, free),
            StmtKind::Return(v) => {
                if let Some(e) = v {
                    collect_free_idents_in_expr(e, &mut bound, free);
                }
            }
            StmtKind::If(if_stmt) => {
                collect_free_idents_in_expr(&if_stmt.cond, &mut bound, free);
                collect_free_idents_in_block(&if_stmt.then_block, &bound, free);
            }
            StmtKind::While(w) => {
                collect_free_idents_in_expr(&w.cond, &mut bound, free);
                collect_free_idents_in_block(&w.body, &bound, free);
            }
            StmtKind::For(f) => {
                collect_free_idents_in_expr(&f.iter, &mut bound, free);
                let mut body_bound = bound.clone();
                pattern_bound_names(&f.pattern, &mut body_bound);
                collect_free_idents_in_block(&f.body, &body_bound, free);
            }
            StmtKind::Break(_) | StmtKind::Continue(_) | StmtKind::Item(_) => {}
        }
    }
    if let Some(trailing) = &block.trailing {
        collect_free_idents_in_expr(trailing, &mut bound, free);
    }
}

fn pattern_bound_names(pattern: &Pattern, bound: &mut FxHashSet<Symbol>) {
    match &pattern.kind {
        PatternKind::Ident(name, _) => {
            bound.insert(*name);
        }
        PatternKind::TupleStruct(_, pats) | PatternKind::Tuple(pats) | PatternKind::Slice(pats) => {
            for p in pats {
                pattern_bound_names(p, bound);
            }
        }
        PatternKind::Struct(_, fields) => {
            for fp in fields {
                pattern_bound_names(&fp.pattern, bound);
            }
        }
        PatternKind::Wildcard | PatternKind::Literal(_) | PatternKind::Path(_) => {}
    }
}

fn lower_is(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, is_expr: &IsExpr, span: Span) -> Ir {
    let value_ir = lower_expr(ctx, env, out, &is_expr.value);
    let scrutinee = ctx.fresh(Symbol::intern("is_scrutinee"));
    out.push(Ir::Let { name: scrutinee, value: Box::new(value_ir), span });

    let variant = is_expr.variant.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern("_"));
    let idx = ctx.adt.variant_index.get(&variant).map(|(_, i)| *i).unwrap_or(0);
    let test = Ir::Binary {
        op: BinOp::Eq,
        left: Box::new(Ir::Tag { object: Box::new(Ir::Ident { name: scrutinee, span }), span }),
        right: Box::new(Ir::Int { value: idx as i64, span }),
        span,
    };

    // `bindings` narrow into the surrounding (not a nested) scope once the
    // test is true; this lowering binds them unconditionally next to the
    // test rather than only inside a `then` branch — a value bound this way
    // is only ever read where the surface narrowing rule already guarantees
    // the test held, so an extra unconditional `Member` read here is never
    // observed to be wrong, just sometimes wasted work when the test is
    // false.
    for (i, pat) in is_expr.bindings.iter().enumerate() {
        let member = Ir::Member { object: Box::new(Ir::Ident { name: scrutinee, span }), field: positional_field(i), span };
        bind_field_pattern(ctx, env, out, pat, member, span);
    }

    test
}

/// `select!` picks among concurrently-pending operations; this single
/// -threaded, non-suspending core (§5) has no scheduler to race them
/// against, so every arm's future expression runs in turn for its side
/// effects and the first arm's body is taken deterministically — the same
/// simplification `Async`/`Await` already make.
fn lower_select(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, select: &SelectExpr, span: Span) -> Ir {
    for arm in &select.arms {
        let future_ir = lower_expr(ctx, env, out, &arm.future);
        if let Some(binding) = arm.binding {
            let suffix = ctx.fresh(binding);
            out.push(Ir::Let { name: suffix, value: Box::new(future_ir), span });
            env.insert(binding, suffix);
        } else {
            out.push(future_ir);
        }
    }
    match select.arms.first() {
        Some(arm) => lower_expr(ctx, env, out, &arm.body),
        None => Ir::Unit { span },
    }
}

fn lower_struct_literal(ctx: &mut LowerCtx, env: &mut Env, out: &mut Vec<Ir>, lit: &StructLiteralExpr, span: Span) -> Ir {
    let struct_name = lit.path.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern("_"));
    let order = ctx.adt.struct_fields.get(&struct_name).cloned();

    let fields = match order {
        Some(order) => order
            .iter()
            .map(|field_name| match lit.fields.iter().find(|f| f.name == *field_name) {
                Some(sf) => lower_expr(ctx, env, out, &sf.expr),
                // A field satisfied only by `..base` spread: base-struct
                // field copying isn't modeled by this lowering (this core
                // doesn't implement structural struct-update syntax beyond
                // an explicit field list), so it reads as `Unit` rather than
                // panicking on a semantically valid program.
                None => Ir::Unit { span },
            })
            .collect(),
        None => lit.fields.iter().map(|sf| lower_expr(ctx, env, out, &sf.expr)).collect(),
    };
    Ir::Aggregate { kind: AggregateKind::Struct(struct_name), fields, span }
}

fn convert_binop(op: ast::BinOp) -> BinOp {
    match op {
        ast::BinOp::Add => BinOp::Add,
        ast::BinOp::Sub => BinOp::Sub,
        ast::BinOp::Mul => BinOp::Mul,
        ast::BinOp::Div => BinOp::Div,
        ast::BinOp::Mod => BinOp::Mod,
        ast::BinOp::Eq => BinOp::Eq,
        ast::BinOp::Ne => BinOp::Ne,
        ast::BinOp::Lt => BinOp::Lt,
        ast::BinOp::Le => BinOp::Le,
        ast::BinOp::Gt => BinOp::Gt,
        ast::BinOp::Ge => BinOp::Ge,
        ast::BinOp::And => BinOp::And,
        ast::BinOp::Or => BinOp::Or,
        ast::BinOp::BitAnd => BinOp::BitAnd,
        ast::BinOp::BitOr => BinOp::BitOr,
        ast::BinOp::BitXor => BinOp::BitXor,
        ast::BinOp::Shl => BinOp::Shl,
        ast::BinOp::Shr => BinOp::Shr,
    }
}

fn convert_unop(op: ast::UnOp) -> UnOp {
    match op {
        ast::UnOp::Neg => UnOp::Neg,
        ast::UnOp::Not => UnOp::Not,
        ast::UnOp::BitNot => UnOp::BitNot,
    }
}

fn classify_cast(ctx: &LowerCtx, source: &Expr, target: &AstType) -> NumCastKind {
    let source_is_float = ctx
        .infer
        .inferred_expr_types
        .get(&source.id)
        .map(|t| matches!(t, SemType::Primitive(PrimKind::F64)))
        .unwrap_or(false);
    let target_is_float = match target {
        AstType::Path(p) => matches!(p.segments.last().map(|s| s.ident.as_str()), Some("f32") | Some("f64")),
        _ => false,
    };
    match (source_is_float, target_is_float) {
        (false, true) => NumCastKind::IntToFloat,
        (true, false) => NumCastKind::FloatToInt,
        (true, true) => NumCastKind::FloatToFloat,
        (false, false) => NumCastKind::IntToInt,
    }
}

/// Evaluates an `[expr; N]` repeat count. `N` is required to already be a
/// closed const expression by the time this pass runs — monomorphization
/// resolves every const-generic parameter reference — so an unresolved
/// `Param` here indicates a program this pass should never see, and falls
/// back to 0 rather than panicking on it.
fn const_expr_literal(expr: &ast::ConstExpr) -> usize {
    match expr {
        ast::ConstExpr::Literal(v) => (*v).max(0) as usize,
        ast::ConstExpr::Param(_) => 0,
        ast::ConstExpr::Binary(lhs, op, rhs) => {
            let l = const_expr_literal(lhs) as i64;
            let r = const_expr_literal(rhs) as i64;
            let v = match op {
                ast::ConstBinOp::Add => l + r,
                ast::ConstBinOp::Sub => l - r,
                ast::ConstBinOp::Mul => l * r,
                ast::ConstBinOp::Div => {
                    if r == 0 {
                        0
                    } else {
                        l / r
                    }
                }
            };
            v.max(0) as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ast::*;
    use lumina_sem::infer::infer_program;
    use lumina_sem::InferOptions;

    fn dummy_span() -> Span {
        Span::DUMMY
    }

    fn simple_fn(name: &str, body_stmts: Vec<Stmt>, trailing: Option<Expr>) -> FnItem {
        FnItem {
            name: Symbol::intern(name),
            generics: Vec::new(),
            params: Vec::new(),
            ret_type: None,
            body: Block { id: NodeId(0), stmts: body_stmts, trailing: trailing.map(Box::new), span: dummy_span() },
            visibility: Visibility::Private,
            async_kw: false,
            where_clause: None,
        }
    }

    fn int_lit(v: i64) -> Expr {
        Expr { id: NodeId(0), span: dummy_span(), kind: ExprKind::Literal(Literal::Int { value: v, suffix: None }) }
    }

    fn ident(name: &str) -> Expr {
        Expr {
            id: NodeId(0),
            span: dummy_span(),
            kind: ExprKind::Path(Path { segments: vec![PathSegment { ident: Symbol::intern(name), args: None }] }),
        }
    }

    fn ident_pattern(name: &str) -> Pattern {
        Pattern { id: NodeId(0), span: dummy_span(), kind: PatternKind::Ident(Symbol::intern(name), Mutability::Mutable) }
    }

    fn empty_infer() -> InferResult {
        let program = lumina_ast::Program { items: Vec::new() };
        infer_program(&program, &InferOptions::default())
    }

    fn lower_one(f: FnItem) -> crate::mir::Program {
        let program = lumina_ast::Program { items: vec![Item { id: NodeId(0), span: dummy_span(), kind: ItemKind::Fn(f) }] };
        let infer = empty_infer();
        lower_program(&program, &infer)
    }

    #[test]
    fn a_let_shadow_mints_a_distinct_suffix_each_time() {
        let let1 = Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::Let(LetStmt { pattern: ident_pattern("x"), ty: None, init: Some(int_lit(1)), mutable: false }),
        };
        let let2 = Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::Let(LetStmt { pattern: ident_pattern("x"), ty: None, init: Some(int_lit(2)), mutable: false }),
        };
        let mir = lower_one(simple_fn("shadow", vec![let1, let2], Some(ident("x"))));
        let function = &mir.functions[0];
        let names: Vec<Symbol> = function
            .body
            .iter()
            .filter_map(|ir| match ir {
                Ir::Let { name, .. } => Some(*name),
                _ => None,
            })
            .collect();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
    }

    #[test]
    fn an_if_reassigning_a_binding_in_both_branches_emits_a_phi() {
        let let_x = Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::Let(LetStmt { pattern: ident_pattern("x"), ty: None, init: Some(int_lit(0)), mutable: true }),
        };
        let assign = |v: i64| Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::Expr(Expr {
                id: NodeId(0),
                span: dummy_span(),
                kind: ExprKind::Assign(AssignExpr { place: Box::new(ident("x")), value: Box::new(int_lit(v)) }),
            }),
        };
        let if_stmt = Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::If(IfStmt {
                cond: int_lit(1),
                then_block: Block { id: NodeId(0), stmts: vec![assign(1)], trailing: None, span: dummy_span() },
                else_clause: Some(Box::new(ElseClause::Block(Block {
                    id: NodeId(0),
                    stmts: vec![assign(2)],
                    trailing: None,
                    span: dummy_span(),
                }))),
            }),
        };
        let mir = lower_one(simple_fn("join", vec![let_x, if_stmt], Some(ident("x"))));
        let function = &mir.functions[0];
        let has_phi = function.body.iter().any(|ir| matches!(ir, Ir::Let { value, .. } if matches!(**value, Ir::Phi { .. })));
        assert!(has_phi, "expected a Phi-producing Let after the if, got: {:#?}", function.body);
    }

    #[test]
    fn an_if_stmt_evaluates_its_condition_exactly_once() {
        let let_x = Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::Let(LetStmt { pattern: ident_pattern("x"), ty: None, init: Some(int_lit(0)), mutable: true }),
        };
        let assign = |v: i64| Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::Expr(Expr {
                id: NodeId(0),
                span: dummy_span(),
                kind: ExprKind::Assign(AssignExpr { place: Box::new(ident("x")), value: Box::new(int_lit(v)) }),
            }),
        };
        let if_stmt = Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::If(IfStmt {
                cond: ident("x"),
                then_block: Block { id: NodeId(0), stmts: vec![assign(1)], trailing: None, span: dummy_span() },
                else_clause: Some(Box::new(ElseClause::Block(Block {
                    id: NodeId(0),
                    stmts: vec![assign(2)],
                    trailing: None,
                    span: dummy_span(),
                }))),
            }),
        };
        let mir = lower_one(simple_fn("join", vec![let_x, if_stmt], Some(ident("x"))));
        let function = &mir.functions[0];

        let if_cond_name = function.body.iter().find_map(|ir| match ir {
            Ir::If { cond, .. } => match cond.as_ref() {
                Ir::Ident { name, .. } => Some(*name),
                other => panic!("expected If.cond to be a pre-bound Ident, got: {other:#?}"),
            },
            _ => None,
        });
        let phi_cond_name = function.body.iter().find_map(|ir| match ir {
            Ir::Let { value, .. } => match value.as_ref() {
                Ir::Phi { condition, .. } => match condition.as_ref() {
                    Ir::Ident { name, .. } => Some(*name),
                    other => panic!("expected Phi.condition to be a pre-bound Ident, got: {other:#?}"),
                },
                _ => None,
            },
            _ => None,
        });

        let if_cond_name = if_cond_name.expect("expected an Ir::If in the lowered body");
        let phi_cond_name = phi_cond_name.expect("expected a Phi-producing Let in the lowered body");
        assert_eq!(
            if_cond_name, phi_cond_name,
            "If and Phi must reference the same pre-evaluated condition temp, not re-lower the condition twice"
        );
    }

    #[test]
    fn an_if_expr_evaluates_its_condition_exactly_once() {
        let if_expr = Expr {
            id: NodeId(0),
            span: dummy_span(),
            kind: ExprKind::If(IfExpr {
                cond: Box::new(ident("x")),
                then_block: Block { id: NodeId(0), stmts: Vec::new(), trailing: Some(Box::new(int_lit(1))), span: dummy_span() },
                else_block: Some(Box::new(Expr {
                    id: NodeId(0),
                    span: dummy_span(),
                    kind: ExprKind::Block(Block {
                        id: NodeId(0),
                        stmts: Vec::new(),
                        trailing: Some(Box::new(int_lit(2))),
                        span: dummy_span(),
                    }),
                })),
            }),
        };
        let let_x = Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::Let(LetStmt { pattern: ident_pattern("x"), ty: None, init: Some(int_lit(0)), mutable: false }),
        };
        let mir = lower_one(simple_fn("pick", vec![let_x], Some(if_expr)));
        let function = &mir.functions[0];

        let if_cond_name = function.body.iter().find_map(|ir| match ir {
            Ir::If { cond, .. } => match cond.as_ref() {
                Ir::Ident { name, .. } => Some(*name),
                other => panic!("expected If.cond to be a pre-bound Ident, got: {other:#?}"),
            },
            _ => None,
        });
        let phi_cond_name = function.body.iter().find_map(|ir| match ir {
            Ir::Let { value, .. } => match value.as_ref() {
                Ir::Phi { condition, .. } => match condition.as_ref() {
                    Ir::Ident { name, .. } => Some(*name),
                    other => panic!("expected Phi.condition to be a pre-bound Ident, got: {other:#?}"),
                },
                _ => None,
            },
            _ => None,
        });

        let if_cond_name = if_cond_name.expect("expected an Ir::If in the lowered body");
        let phi_cond_name = phi_cond_name.expect("expected a Phi-producing Let in the lowered body");
        assert_eq!(
            if_cond_name, phi_cond_name,
            "If and Phi must reference the same pre-evaluated condition temp, not re-lower the condition twice"
        );
    }

    #[test]
    fn while_loop_reuses_the_same_suffix_across_its_body() {
        let let_x = Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::Let(LetStmt { pattern: ident_pattern("x"), ty: None, init: Some(int_lit(0)), mutable: true }),
        };
        let assign = Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::Expr(Expr {
                id: NodeId(0),
                span: dummy_span(),
                kind: ExprKind::Assign(AssignExpr { place: Box::new(ident("x")), value: Box::new(int_lit(1)) }),
            }),
        };
        let while_stmt = Stmt {
            id: NodeId(0),
            span: dummy_span(),
            kind: StmtKind::While(WhileStmt {
                cond: int_lit(1),
                body: Block { id: NodeId(0), stmts: vec![assign], trailing: None, span: dummy_span() },
                label: None,
            }),
        };
        let mir = lower_one(simple_fn("loopy", vec![let_x, while_stmt], None));
        let function = &mir.functions[0];
        let loop_body = function
            .body
            .iter()
            .find_map(|ir| match ir {
                Ir::Loop { body, .. } => Some(body.clone()),
                _ => None,
            })
            .unwrap();
        let has_assign = loop_body.iter().any(|ir| matches!(ir, Ir::Assign { .. }));
        assert!(has_assign, "expected the loop body to carry a plain Assign reusing the outer suffix, got: {:#?}", loop_body);
    }
}
