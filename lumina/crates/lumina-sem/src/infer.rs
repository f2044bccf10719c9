//! The Hindley-Milner inferencer driver.
//!
//! `infer_program` walks a [`lumina_ast::Program`] in two passes: first it
//! collects every top-level declaration into a global environment (function
//! schemes, ADT constructor types), then it infers each function body under
//! an environment closing over its parameters. All stubs in a mutually
//! recursive group are visible to every member during the second pass - we
//! don't attempt real SCC ordering since the first pass already makes every
//! top-level name resolvable regardless of declaration order.

use crate::exhaustiveness::is_exhaustive;
use crate::types::{normalize_primitive_name, InferId, PrimKind, Scheme, Substitution, Type};
use crate::unify::{self, default_wrapper_set, UnifyError, UnifyErrorKind, WrapperSet};
use lumina_ast::{
    BinOp, Block, CallExpr, ElseClause, EnumItem, Expr, ExprKind, FnItem, IfExpr, IfStmt, Item,
    ItemKind, Literal, MatchExpr, NodeId, Param, Pattern, PatternKind, Program, StructItem, Stmt,
    StmtKind, StructLiteralExpr, VariantData, WhileStmt,
};
use lumina_util::diagnostic::{DiagnosticBuilder, DiagnosticCode, Handler};
use lumina_util::{FxHashMap, FxHashSet, Span, Symbol};
use std::rc::Rc;

/// A call-site's instantiated signature, recorded for monomorphization.
#[derive(Debug, Clone)]
pub struct CallSig {
    pub callee: Symbol,
    pub arg_types: Vec<Type>,
    pub ret_type: Type,
}

/// Everything `infer_program` produces.
pub struct InferResult {
    pub handler: Handler,
    pub substitution: Substitution,
    pub inferred_expr_types: FxHashMap<NodeId, Type>,
    pub inferred_call_sigs: FxHashMap<NodeId, CallSig>,
    pub inferred_fn_by_name: FxHashMap<Symbol, Type>,
    pub recorded_call_args_for_monomorphization: Vec<(NodeId, Symbol, Vec<Type>)>,
}

/// Options controlling inference behavior.
pub struct InferOptions {
    pub wrappers: WrapperSet,
    pub row_polymorphism: bool,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self { wrappers: default_wrapper_set(), row_polymorphism: true }
    }
}

#[derive(Clone)]
struct StructInfo {
    fields: Vec<(Symbol, Type)>,
    generics: Vec<Symbol>,
}

#[derive(Clone)]
struct EnumInfo {
    variants: Vec<Symbol>,
    payloads: FxHashMap<Symbol, VariantData>,
    generics: Vec<Symbol>,
}

/// Lexical environment: a chain of scopes mapping a name to its scheme.
#[derive(Clone)]
struct Env {
    parent: Option<Rc<Env>>,
    bindings: FxHashMap<Symbol, Scheme>,
}

impl Env {
    fn root() -> Self {
        Env { parent: None, bindings: FxHashMap::default() }
    }

    fn child(parent: Rc<Env>) -> Self {
        Env { parent: Some(parent), bindings: FxHashMap::default() }
    }

    fn insert(&mut self, name: Symbol, scheme: Scheme) {
        self.bindings.insert(name, scheme);
    }

    fn lookup(&self, name: Symbol) -> Option<&Scheme> {
        match self.bindings.get(&name) {
            Some(scheme) => Some(scheme),
            None => self.parent.as_ref().and_then(|p| p.lookup(name)),
        }
    }
}

struct Inferencer {
    subst: Substitution,
    handler: Handler,
    wrappers: WrapperSet,
    row_polymorphism: bool,
    structs: FxHashMap<Symbol, StructInfo>,
    enums: FxHashMap<Symbol, EnumInfo>,
    variant_to_enum: FxHashMap<Symbol, Symbol>,
    expr_types: FxHashMap<NodeId, Type>,
    call_sigs: FxHashMap<NodeId, CallSig>,
    fn_by_name: FxHashMap<Symbol, Type>,
    recorded_calls: Vec<(NodeId, Symbol, Vec<Type>)>,
    /// `Some(return_type)` while inferring an async fn body, so `await` can
    /// check it's legal and `try` can find the shared error type.
    current_fn_return: Option<Type>,
    current_fn_is_async: bool,
}

/// Entry point: run HM inference over `program`, returning every map and
/// diagnostic the rest of the pipeline needs.
pub fn infer_program(program: &Program, options: &InferOptions) -> InferResult {
    let mut inf = Inferencer {
        subst: Substitution::new(),
        handler: Handler::new(),
        wrappers: options.wrappers.clone(),
        row_polymorphism: options.row_polymorphism,
        structs: FxHashMap::default(),
        enums: FxHashMap::default(),
        variant_to_enum: FxHashMap::default(),
        expr_types: FxHashMap::default(),
        call_sigs: FxHashMap::default(),
        fn_by_name: FxHashMap::default(),
        recorded_calls: Vec::new(),
        current_fn_return: None,
        current_fn_is_async: false,
    };

    let mut global = Env::root();
    inf.collect_items(&program.items, &mut global);

    let global = Rc::new(global);
    for item in &program.items {
        if let ItemKind::Fn(fn_item) = &item.kind {
            inf.infer_fn_body(fn_item, Rc::clone(&global));
        }
    }

    InferResult {
        handler: inf.handler,
        substitution: inf.subst,
        inferred_expr_types: inf.expr_types,
        inferred_call_sigs: inf.call_sigs,
        inferred_fn_by_name: inf.fn_by_name,
        recorded_call_args_for_monomorphization: inf.recorded_calls,
    }
}

impl Inferencer {
    fn error(&mut self, code: DiagnosticCode, message: impl Into<String>, span: Span) {
        DiagnosticBuilder::error(message).code(code).span(span).emit(&self.handler);
    }

    fn warning(&mut self, code: DiagnosticCode, message: impl Into<String>, span: Span) {
        DiagnosticBuilder::warning(message).code(code).span(span).emit(&self.handler);
    }

    fn emit_unify_error(&mut self, err: &UnifyError, span: Span) {
        let code = match err.kind {
            UnifyErrorKind::Arity => DiagnosticCode::LUM_002,
            UnifyErrorKind::Recursive => DiagnosticCode::RECURSIVE_TYPE_ERROR,
            UnifyErrorKind::Mismatch | UnifyErrorKind::RowFieldMissing => DiagnosticCode::LUM_001,
        };
        let message = format!(
            "type mismatch: expected `{}`, found `{}`",
            describe_type(&err.left),
            describe_type(&err.right)
        );
        self.error(code, message, span);
    }

    fn unify_or_report(&mut self, expected: &Type, found: &Type, span: Span) {
        let wrappers = self.wrappers.clone();
        if let Err(err) = unify::unify(expected, found, &mut self.subst, &wrappers) {
            self.emit_unify_error(&err, span);
        }
    }

    // ---- Pass 1: collect top-level declarations ----------------------------

    fn collect_items(&mut self, items: &[Item], env: &mut Env) {
        for item in items {
            match &item.kind {
                ItemKind::Struct(s) => self.collect_struct(s, item.span),
                ItemKind::Enum(e) => self.collect_enum(e, item.span),
                _ => {},
            }
        }
        for item in items {
            if let ItemKind::Fn(f) = &item.kind {
                self.collect_fn_stub(f, env);
            }
        }
    }

    fn collect_struct(&mut self, s: &StructItem, span: Span) {
        let generics: Vec<Symbol> = s.generics.iter().filter(|g| !g.is_const()).map(|g| g.name).collect();
        let fields = s
            .fields
            .iter()
            .map(|f| (f.name, self.ast_type_to_sem(&f.ty, &generics)))
            .collect::<Vec<_>>();

        // A struct whose own name appears, unwrapped, among its field types
        // is only legal when routed through a wrapper-set ADT; check it here
        // with the barrier occurs check rather than waiting for a use site.
        for (_, ty) in &fields {
            if type_names_adt(ty, s.name) && !self.wrapper_routed(ty, s.name) {
                self.error(
                    DiagnosticCode::RECURSIVE_TYPE_ERROR,
                    format!("recursive struct `{}` is not routed through a wrapper type", s.name.as_str()),
                    span,
                );
            }
        }

        self.structs.insert(s.name, StructInfo { fields, generics });
    }

    fn collect_enum(&mut self, e: &EnumItem, _span: Span) {
        let generics: Vec<Symbol> = e.generics.iter().filter(|g| !g.is_const()).map(|g| g.name).collect();
        let mut variants = Vec::new();
        let mut payloads = FxHashMap::default();
        for v in &e.variants {
            variants.push(v.name);
            payloads.insert(v.name, v.data.clone());
            self.variant_to_enum.insert(v.name, e.name);
        }
        self.enums.insert(e.name, EnumInfo { variants, payloads, generics });
    }

    fn collect_fn_stub(&mut self, f: &FnItem, env: &mut Env) {
        let generics: Vec<Symbol> = f.generics.iter().filter(|g| !g.is_const()).map(|g| g.name).collect();
        let param_types: Vec<Type> =
            f.params.iter().map(|p| self.param_type(p, &generics)).collect();
        let mut ret = match &f.ret_type {
            Some(t) => self.ast_type_to_sem(t, &generics),
            None => Type::unit(),
        };
        if f.async_kw {
            ret = Type::Promise(Box::new(ret));
        }
        let fn_ty = Type::Function(param_types, Box::new(ret.clone()));
        let bound: FxHashSet<InferId> = FxHashSet::default();
        let scheme = unify::generalize(&fn_ty, &mut self.subst, &bound);
        env.insert(f.name, scheme);
        self.fn_by_name.insert(f.name, ret);
    }

    fn param_type(&mut self, p: &Param, generics: &[Symbol]) -> Type {
        match &p.ty {
            Some(t) => self.ast_type_to_sem(t, generics),
            None => self.subst.fresh_var(),
        }
    }

    /// Lower a surface `lumina_ast::Type` to the inferencer's internal
    /// [`Type`]. `_` (`Inferred`) becomes a fresh hole-flagged variable;
    /// generic parameter names in scope resolve to the same variable across
    /// the declaration (so `fn id<T>(x: T) -> T` shares one var).
    fn ast_type_to_sem(&mut self, ty: &lumina_ast::Type, generics: &[Symbol]) -> Type {
        use lumina_ast::Type as AstType;
        match ty {
            AstType::Unit => Type::unit(),
            AstType::Never => Type::unit(),
            AstType::Inferred => self.subst.fresh_var(),
            AstType::Path(path) => {
                let Some(seg) = path.segments.last() else { return self.subst.fresh_var() };
                let name = seg.ident;
                if generics.contains(&name) {
                    return self.subst.fresh_var();
                }
                if let Some(prim) = normalize_primitive_name(name.as_str()) {
                    return Type::Primitive(prim);
                }
                let args = seg
                    .args
                    .as_ref()
                    .map(|args| args.iter().map(|a| self.ast_type_to_sem(a, generics)).collect())
                    .unwrap_or_default();
                Type::Adt(name, args)
            },
            AstType::Generic(base, args) => {
                let base_ty = self.ast_type_to_sem(base, generics);
                let arg_tys: Vec<Type> = args.iter().map(|a| self.ast_type_to_sem(a, generics)).collect();
                match base_ty {
                    Type::Adt(name, _) => Type::Adt(name, arg_tys),
                    other => other,
                }
            },
            AstType::Reference(inner, _) => self.ast_type_to_sem(inner, generics),
            AstType::Slice(inner) => {
                Type::Adt(Symbol::intern("Slice"), vec![self.ast_type_to_sem(inner, generics)])
            },
            AstType::Array(inner, _size) => {
                Type::Adt(Symbol::intern("Array"), vec![self.ast_type_to_sem(inner, generics)])
            },
            AstType::Tuple(elems) => {
                let mangled = elems.iter().map(|e| self.ast_type_to_sem(e, generics)).collect();
                Type::Adt(Symbol::intern("Tuple"), mangled)
            },
            AstType::Fn(args, ret) => Type::Function(
                args.iter().map(|a| self.ast_type_to_sem(a, generics)).collect(),
                Box::new(self.ast_type_to_sem(ret, generics)),
            ),
        }
    }

    fn fresh_id(&mut self) -> InferId {
        match self.subst.fresh_var() {
            Type::Variable(id) => id,
            _ => unreachable!(),
        }
    }

    fn wrapper_routed(&self, ty: &Type, needle: Symbol) -> bool {
        match ty {
            Type::Adt(name, params) => {
                if self.wrappers.contains(name) {
                    return true;
                }
                params.iter().any(|p| self.wrapper_routed(p, needle))
            },
            _ => false,
        }
    }

    // ---- Pass 2: infer each function body -----------------------------------

    fn infer_fn_body(&mut self, f: &FnItem, global: Rc<Env>) {
        let generics: Vec<Symbol> = f.generics.iter().filter(|g| !g.is_const()).map(|g| g.name).collect();
        let mut env = Env::child(global);
        let param_types: Vec<Type> = f.params.iter().map(|p| self.param_type(p, &generics)).collect();
        for (p, ty) in f.params.iter().zip(param_types.iter()) {
            env.insert(p.name, Scheme::monomorphic(ty.clone()));
        }

        let declared_ret = match &f.ret_type {
            Some(t) => self.ast_type_to_sem(t, &generics),
            None => self.subst.fresh_var(),
        };

        let prev_async = self.current_fn_is_async;
        let prev_ret = self.current_fn_return.take();
        self.current_fn_is_async = f.async_kw;
        self.current_fn_return = Some(declared_ret.clone());

        let body_ty = self.infer_block(&f.body, &mut env);
        self.unify_or_report(&declared_ret, &body_ty, f.body.span);

        self.current_fn_is_async = prev_async;
        self.current_fn_return = prev_ret;
    }

    fn infer_block(&mut self, block: &Block, env: &mut Env) -> Type {
        let mut scope = Env::child(Rc::new(env.clone()));
        for stmt in &block.stmts {
            self.infer_stmt(stmt, &mut scope);
        }
        match &block.trailing {
            Some(expr) => self.infer_expr(expr, &mut scope),
            None => Type::unit(),
        }
    }

    fn infer_stmt(&mut self, stmt: &Stmt, env: &mut Env) {
        match &stmt.kind {
            StmtKind::Let(let_stmt) => {
                let init_ty = match &let_stmt.init {
                    Some(e) => self.infer_expr(e, env),
                    None => self.subst.fresh_var(),
                };
                if let Some(annotated) = &let_stmt.ty {
                    let generics: Vec<Symbol> = Vec::new();
                    let ann_ty = self.ast_type_to_sem(annotated, &generics);
                    self.unify_or_report(&ann_ty, &init_ty, stmt.span);
                }
                self.bind_pattern(&let_stmt.pattern, &init_ty, env);
            },
            StmtKind::Expr(e) => {
                self.infer_expr(e, env);
            },
            StmtKind::Return(e) => {
                let ty = match e {
                    Some(expr) => self.infer_expr(expr, env),
                    None => Type::unit(),
                };
                if let Some(ret) = self.current_fn_return.clone() {
                    self.unify_or_report(&ret, &ty, stmt.span);
                }
            },
            StmtKind::If(if_stmt) => self.infer_if_stmt(if_stmt, env, stmt.span),
            StmtKind::While(while_stmt) => self.infer_while_stmt(while_stmt, env),
            StmtKind::For(for_stmt) => {
                let iter_ty = self.infer_expr(&for_stmt.iter, env);
                let elem_ty = self.subst.fresh_var();
                let iterable = Type::Adt(Symbol::intern("Iterator"), vec![elem_ty.clone()]);
                let wrappers = self.wrappers.clone();
                let _ = unify::unify(&iterable, &iter_ty, &mut self.subst, &wrappers);
                let mut body_scope = Env::child(Rc::new(env.clone()));
                self.bind_pattern(&for_stmt.pattern, &elem_ty, &mut body_scope);
                self.infer_block(&for_stmt.body, &mut body_scope);
            },
            StmtKind::Break(_) | StmtKind::Continue(_) => {},
            StmtKind::Item(item) => {
                if let ItemKind::Fn(f) = &item.kind {
                    self.collect_fn_stub(f, env);
                    self.infer_fn_body(f, Rc::new(env.clone()));
                }
            },
        }
    }

    fn infer_if_stmt(&mut self, if_stmt: &IfStmt, env: &mut Env, span: Span) {
        let (narrowed_then, narrowed_else) = self.narrowing_for(&if_stmt.cond, env);
        let cond_ty = self.infer_expr(&if_stmt.cond, env);
        self.unify_or_report(&Type::bool(), &cond_ty, span);

        let mut then_scope = Env::child(Rc::new(env.clone()));
        if let Some((name, ty)) = narrowed_then {
            then_scope.insert(name, Scheme::monomorphic(ty));
        }
        self.infer_block(&if_stmt.then_block, &mut then_scope);

        if let Some(else_clause) = &if_stmt.else_clause {
            let mut else_scope = Env::child(Rc::new(env.clone()));
            if let Some((name, ty)) = narrowed_else {
                else_scope.insert(name, Scheme::monomorphic(ty));
            }
            match else_clause.as_ref() {
                ElseClause::Block(block) => {
                    self.infer_block(block, &mut else_scope);
                },
                ElseClause::If(nested) => self.infer_if_stmt(nested, &mut else_scope, span),
            }
        }
    }

    fn infer_while_stmt(&mut self, while_stmt: &WhileStmt, env: &mut Env) {
        let cond_ty = self.infer_expr(&while_stmt.cond, env);
        self.unify_or_report(&Type::bool(), &cond_ty, while_stmt.cond.span);
        let mut scope = Env::child(Rc::new(env.clone()));
        self.infer_block(&while_stmt.body, &mut scope);
    }

    /// `is`-narrowing: when `cond` is `value is Variant(...)` over a two
    /// variant enum, the then-branch sees `value`'s identifier narrowed to
    /// the tested variant and the else-branch sees the other variant. For
    /// anything else (or enums with other than two variants), no narrowing.
    fn narrowing_for(&self, cond: &Expr, _env: &Env) -> (Option<(Symbol, Type)>, Option<(Symbol, Type)>) {
        let ExprKind::Is(is_expr) = &cond.kind else { return (None, None) };
        let ExprKind::Path(path) = &is_expr.value.kind else { return (None, None) };
        let Some(seg) = path.segments.last() else { return (None, None) };
        let name = seg.ident;
        let Some(variant_name) = is_expr.variant.segments.last().map(|s| s.ident) else {
            return (None, None);
        };
        let Some(enum_name) = self.variant_to_enum.get(&variant_name).copied() else {
            return (None, None);
        };
        let Some(info) = self.enums.get(&enum_name) else { return (None, None) };
        let narrowed_ty = Type::Adt(enum_name, Vec::new());
        let then = (name, narrowed_ty.clone());
        let else_ = if info.variants.len() == 2 {
            let other = info.variants.iter().find(|v| **v != variant_name).copied();
            other.map(|_| (name, Type::Adt(enum_name, Vec::new())))
        } else {
            None
        };
        (Some(then), else_)
    }

    fn bind_pattern(&mut self, pattern: &Pattern, ty: &Type, env: &mut Env) {
        match &pattern.kind {
            PatternKind::Wildcard => {},
            PatternKind::Ident(name, _) => env.insert(*name, Scheme::monomorphic(ty.clone())),
            PatternKind::Tuple(pats) => {
                for (i, p) in pats.iter().enumerate() {
                    let elem_ty = self.subst.fresh_var();
                    let _ = i;
                    self.bind_pattern(p, &elem_ty, env);
                }
            },
            _ => {},
        }
    }

    fn infer_expr(&mut self, expr: &Expr, env: &mut Env) -> Type {
        let ty = self.infer_expr_kind(expr, env);
        self.expr_types.insert(expr.id, ty.clone());
        ty
    }

    fn infer_expr_kind(&mut self, expr: &Expr, env: &mut Env) -> Type {
        match &expr.kind {
            ExprKind::Literal(lit) => self.infer_literal(lit, env),
            ExprKind::Path(path) => self.infer_path(path, env, expr.span),
            ExprKind::Binary(bin) => self.infer_binary(bin, env, expr.span),
            ExprKind::Unary(un) => self.infer_expr(&un.expr, env),
            ExprKind::Call(call) => self.infer_call(call, env, expr.id, expr.span),
            ExprKind::MethodCall(mc) => {
                let _ = self.infer_expr(&mc.receiver, env);
                for a in &mc.args {
                    self.infer_expr(a, env);
                }
                self.subst.fresh_var()
            },
            ExprKind::Field(field) => self.infer_field(field, env, expr.span),
            ExprKind::Index(index) => {
                let _obj_ty = self.infer_expr(&index.object, env);
                let idx_ty = self.infer_expr(&index.index, env);
                let _ = unify::unify(
                    &Type::Primitive(PrimKind::U32),
                    &idx_ty,
                    &mut self.subst,
                    &self.wrappers.clone(),
                );
                self.subst.fresh_var()
            },
            ExprKind::Block(block) => self.infer_block(block, env),
            ExprKind::If(if_expr) => self.infer_if_expr(if_expr, env, expr.span),
            ExprKind::Match(match_expr) => self.infer_match(match_expr, env, expr.span),
            ExprKind::Lambda(lambda) => self.infer_lambda(lambda, env),
            ExprKind::Assign(assign) => {
                let place_ty = self.infer_expr(&assign.place, env);
                let value_ty = self.infer_expr(&assign.value, env);
                self.unify_or_report(&place_ty, &value_ty, expr.span);
                Type::unit()
            },
            ExprKind::CompoundAssign(ca) => {
                let place_ty = self.infer_expr(&ca.place, env);
                let value_ty = self.infer_expr(&ca.value, env);
                self.unify_or_report(&place_ty, &value_ty, expr.span);
                Type::unit()
            },
            ExprKind::Return(e) => {
                let ty = match e {
                    Some(expr) => self.infer_expr(expr, env),
                    None => Type::unit(),
                };
                if let Some(ret) = self.current_fn_return.clone() {
                    self.unify_or_report(&ret, &ty, expr.span);
                }
                self.subst.fresh_var()
            },
            ExprKind::Break(e, _) => {
                if let Some(e) = e {
                    self.infer_expr(e, env);
                }
                self.subst.fresh_var()
            },
            ExprKind::Continue(_) => self.subst.fresh_var(),
            ExprKind::Tuple(elems) => {
                let tys: Vec<Type> = elems.iter().map(|e| self.infer_expr(e, env)).collect();
                Type::Adt(Symbol::intern("Tuple"), tys)
            },
            ExprKind::Array(elems) => {
                let elem_ty = self.subst.fresh_var();
                for e in elems {
                    let ty = self.infer_expr(e, env);
                    self.unify_or_report(&elem_ty, &ty, e.span);
                }
                Type::Adt(Symbol::intern("Array"), vec![elem_ty])
            },
            ExprKind::ArrayRepeat { value, .. } => {
                let elem_ty = self.infer_expr(value, env);
                Type::Adt(Symbol::intern("Array"), vec![elem_ty])
            },
            ExprKind::Range(range) => {
                if let Some(start) = &range.start {
                    let t = self.infer_expr(start, env);
                    self.unify_or_report(&Type::Primitive(PrimKind::I32), &t, start.span);
                }
                if let Some(end) = &range.end {
                    let t = self.infer_expr(end, env);
                    self.unify_or_report(&Type::Primitive(PrimKind::I32), &t, end.span);
                }
                Type::Adt(Symbol::intern("Range"), vec![Type::Primitive(PrimKind::I32)])
            },
            ExprKind::Cast(inner, ty) => {
                self.infer_expr(inner, env);
                let generics: Vec<Symbol> = Vec::new();
                self.ast_type_to_sem(ty, &generics)
            },
            ExprKind::Async(async_expr) => {
                let prev_async = self.current_fn_is_async;
                self.current_fn_is_async = true;
                let mut scope = Env::child(Rc::new(env.clone()));
                let body_ty = self.infer_block(&async_expr.body, &mut scope);
                self.current_fn_is_async = prev_async;
                Type::Promise(Box::new(body_ty))
            },
            ExprKind::Await(inner) => {
                if !self.current_fn_is_async {
                    self.error(
                        DiagnosticCode::AWAIT_OUTSIDE_ASYNC,
                        "`await` used outside an `async` function",
                        expr.span,
                    );
                }
                let inner_ty = self.infer_expr(inner, env);
                let result_ty = self.subst.fresh_var();
                let expected = Type::Promise(Box::new(result_ty.clone()));
                self.unify_or_report(&expected, &inner_ty, expr.span);
                result_ty
            },
            ExprKind::Try(inner) => self.infer_try(inner, env, expr.span),
            ExprKind::Is(is_expr) => {
                self.infer_expr(&is_expr.value, env);
                Type::bool()
            },
            ExprKind::Select(select) => {
                let mut result = self.subst.fresh_var();
                for arm in &select.arms {
                    self.infer_expr(&arm.future, env);
                    let body_ty = self.infer_expr(&arm.body, env);
                    self.unify_or_report(&result, &body_ty, expr.span);
                    result = body_ty;
                }
                result
            },
            ExprKind::StructLiteral(lit) => self.infer_struct_literal(lit, env, expr.span),
            ExprKind::EnumVariant(variant) => self.infer_enum_variant(variant, env, expr.span),
        }
    }

    fn infer_literal(&mut self, lit: &Literal, env: &mut Env) -> Type {
        match lit {
            Literal::Int { suffix, .. } => match suffix.and_then(|s| normalize_primitive_name(s.as_str())) {
                Some(prim) => Type::Primitive(prim),
                None => Type::Primitive(PrimKind::I32),
            },
            Literal::Float { suffix, .. } => match suffix.and_then(|s| normalize_primitive_name(s.as_str())) {
                Some(prim) => Type::Primitive(prim),
                None => Type::Primitive(PrimKind::F64),
            },
            Literal::String(_) => Type::Primitive(PrimKind::Str),
            Literal::InterpString(parts) => {
                for part in parts {
                    if let lumina_ast::StringPart::Expr(e) = part {
                        let ty = self.infer_expr(e, env);
                        if matches!(ty, Type::Primitive(PrimKind::Unit)) {
                            self.error(
                                DiagnosticCode::STRING_INTERP_VOID,
                                "interpolated expression has void type",
                                e.span,
                            );
                        }
                    }
                }
                Type::Primitive(PrimKind::Str)
            },
            Literal::Char(_) => Type::Primitive(PrimKind::Char),
            Literal::Bool(_) => Type::bool(),
            Literal::Unit => Type::unit(),
        }
    }

    fn infer_path(&mut self, path: &lumina_ast::Path, env: &mut Env, span: Span) -> Type {
        let Some(seg) = path.segments.last() else { return self.subst.fresh_var() };
        match env.lookup(seg.ident) {
            Some(scheme) => unify::instantiate(&scheme.clone(), &mut self.subst),
            None => {
                self.error(
                    DiagnosticCode::LUM_001,
                    format!("unresolved name `{}`", seg.ident.as_str()),
                    span,
                );
                self.subst.fresh_var()
            },
        }
    }

    fn infer_binary(&mut self, bin: &lumina_ast::BinaryExpr, env: &mut Env, span: Span) -> Type {
        let lhs = self.infer_expr(&bin.left, env);
        let rhs = self.infer_expr(&bin.right, env);
        match bin.op {
            BinOp::And | BinOp::Or => {
                self.unify_or_report(&Type::bool(), &lhs, span);
                self.unify_or_report(&Type::bool(), &rhs, span);
                Type::bool()
            },
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                self.unify_or_report(&lhs, &rhs, span);
                Type::bool()
            },
            _ => {
                self.unify_or_report(&lhs, &rhs, span);
                lhs
            },
        }
    }

    fn infer_call(&mut self, call: &CallExpr, env: &mut Env, node_id: NodeId, span: Span) -> Type {
        let arg_types: Vec<Type> = call.args.iter().map(|a| self.infer_expr(a, env)).collect();

        if call.qualifier.is_some() {
            // Qualified calls (enum constructors, namespaced members) are
            // resolved structurally elsewhere and never rewritten by
            // monomorphization; infer a fresh result rather than guessing.
            return self.subst.fresh_var();
        }

        let callee_name = match &call.func.kind {
            ExprKind::Path(path) => path.segments.last().map(|s| s.ident),
            _ => None,
        };

        let func_ty = self.infer_expr(&call.func, env);
        let ret_ty = self.subst.fresh_var();
        let expected = Type::Function(arg_types.clone(), Box::new(ret_ty.clone()));
        self.unify_or_report(&func_ty, &expected, span);

        if let Some(name) = callee_name {
            let pruned_args: Vec<Type> = arg_types.iter().map(|t| unify::prune(t, &mut self.subst)).collect();
            let pruned_ret = unify::prune(&ret_ty, &mut self.subst);
            self.call_sigs.insert(
                node_id,
                CallSig { callee: name, arg_types: pruned_args.clone(), ret_type: pruned_ret },
            );
            self.recorded_calls.push((node_id, name, pruned_args));
        }

        ret_ty
    }

    fn infer_field(&mut self, field: &lumina_ast::FieldExpr, env: &mut Env, span: Span) -> Type {
        let obj_ty = self.infer_expr(&field.object, env);
        if self.row_polymorphism {
            let field_ty = self.subst.fresh_var();
            let tail = self.subst.fresh_var();
            let mut fields = indexmap::IndexMap::new();
            fields.insert(field.field, field_ty.clone());
            let row = Type::Row(fields, Some(Box::new(tail)));
            self.unify_or_report(&row, &obj_ty, span);
            field_ty
        } else {
            let pruned = unify::prune(&obj_ty, &mut self.subst);
            match pruned {
                Type::Adt(name, _) => match self.structs.get(&name) {
                    Some(info) => info
                        .fields
                        .iter()
                        .find(|(n, _)| *n == field.field)
                        .map(|(_, t)| t.clone())
                        .unwrap_or_else(|| {
                            self.error(
                                DiagnosticCode::LUM_001,
                                format!("no field `{}` on `{}`", field.field.as_str(), name.as_str()),
                                span,
                            );
                            self.subst.fresh_var()
                        }),
                    None => self.subst.fresh_var(),
                },
                _ => {
                    self.error(DiagnosticCode::LUM_001, "field access on a non-struct type", span);
                    self.subst.fresh_var()
                },
            }
        }
    }

    fn infer_if_expr(&mut self, if_expr: &IfExpr, env: &mut Env, span: Span) -> Type {
        let cond_ty = self.infer_expr(&if_expr.cond, env);
        self.unify_or_report(&Type::bool(), &cond_ty, span);
        let mut then_scope = Env::child(Rc::new(env.clone()));
        let then_ty = self.infer_block(&if_expr.then_block, &mut then_scope);
        match &if_expr.else_block {
            Some(else_expr) => {
                let else_ty = self.infer_expr(else_expr, env);
                self.unify_or_report(&then_ty, &else_ty, span);
                then_ty
            },
            None => {
                self.unify_or_report(&Type::unit(), &then_ty, span);
                Type::unit()
            },
        }
    }

    fn infer_match(&mut self, match_expr: &MatchExpr, env: &mut Env, span: Span) -> Type {
        let scrutinee_ty = self.infer_expr(&match_expr.scrutinee, env);
        let result_ty = self.subst.fresh_var();

        for (i, arm) in match_expr.arms.iter().enumerate() {
            let mut arm_scope = Env::child(Rc::new(env.clone()));
            self.infer_pattern_against(&arm.pattern, &scrutinee_ty, &mut arm_scope);
            if let Some(guard) = &arm.guard {
                let guard_ty = self.infer_expr(guard, &mut arm_scope);
                self.unify_or_report(&Type::bool(), &guard_ty, span);
            }
            let body_ty = self.infer_expr(&arm.body, &mut arm_scope);
            if i == 0 {
                self.unify_or_report(&result_ty, &body_ty, span);
            } else {
                self.unify_or_report(&result_ty, &body_ty, span);
            }
        }

        let pruned_scrutinee = unify::prune(&scrutinee_ty, &mut self.subst);
        if let Type::Adt(name, _) = pruned_scrutinee {
            if let Some(info) = self.enums.get(&name) {
                if !is_exhaustive(&match_expr.arms, &info.variants) {
                    self.error(
                        DiagnosticCode::LUM_003,
                        format!("match over `{}` is not exhaustive", name.as_str()),
                        span,
                    );
                }
            }
        }

        result_ty
    }

    fn infer_pattern_against(&mut self, pattern: &Pattern, scrutinee: &Type, env: &mut Env) {
        match &pattern.kind {
            PatternKind::Wildcard => {},
            PatternKind::Ident(name, _) => env.insert(*name, Scheme::monomorphic(scrutinee.clone())),
            PatternKind::Literal(lit) => {
                let lit_ty = self.infer_literal(lit, env);
                self.unify_or_report(scrutinee, &lit_ty, pattern.span);
            },
            PatternKind::Path(path) => {
                if let Some(seg) = path.segments.last() {
                    if let Some(enum_name) = self.variant_to_enum.get(&seg.ident).copied() {
                        let adt = Type::Adt(enum_name, Vec::new());
                        self.unify_or_report(scrutinee, &adt, pattern.span);
                    }
                }
            },
            PatternKind::TupleStruct(path, pats) => {
                if let Some(seg) = path.segments.last() {
                    if let Some(enum_name) = self.variant_to_enum.get(&seg.ident).copied() {
                        let adt = Type::Adt(enum_name, Vec::new());
                        self.unify_or_report(scrutinee, &adt, pattern.span);
                    }
                }
                for p in pats {
                    let fresh = self.subst.fresh_var();
                    self.bind_pattern(p, &fresh, env);
                }
            },
            PatternKind::Struct(path, fields) => {
                if let Some(seg) = path.segments.last() {
                    let adt = Type::Adt(seg.ident, Vec::new());
                    self.unify_or_report(scrutinee, &adt, pattern.span);
                }
                for fp in fields {
                    let fresh = self.subst.fresh_var();
                    self.bind_pattern(&fp.pattern, &fresh, env);
                }
            },
            PatternKind::Tuple(pats) => {
                for p in pats {
                    let fresh = self.subst.fresh_var();
                    self.bind_pattern(p, &fresh, env);
                }
            },
            PatternKind::Slice(pats) => {
                for p in pats {
                    let fresh = self.subst.fresh_var();
                    self.bind_pattern(p, &fresh, env);
                }
            },
        }
    }

    fn infer_lambda(&mut self, lambda: &lumina_ast::LambdaExpr, env: &mut Env) -> Type {
        let mut scope = Env::child(Rc::new(env.clone()));
        let generics: Vec<Symbol> = Vec::new();
        let param_types: Vec<Type> = lambda
            .params
            .iter()
            .map(|p| self.param_type(p, &generics))
            .collect();
        for (p, ty) in lambda.params.iter().zip(param_types.iter()) {
            scope.insert(p.name, Scheme::monomorphic(ty.clone()));
        }
        let body_ty = self.infer_expr(&lambda.body, &mut scope);
        let ret_ty = match &lambda.ret_type {
            Some(t) => {
                let ann = self.ast_type_to_sem(t, &generics);
                self.unify_or_report(&ann, &body_ty, lambda.body.span);
                ann
            },
            None => body_ty,
        };
        Type::Function(param_types, Box::new(ret_ty))
    }

    /// `expr?` - the operand must be `Result(T, E)`, and the enclosing
    /// function's return type must unify with `Result(_, E)` so both share
    /// the same error branch; yields `T`.
    fn infer_try(&mut self, inner: &Expr, env: &mut Env, span: Span) -> Type {
        let inner_ty = self.infer_expr(inner, env);
        let pruned = unify::prune(&inner_ty, &mut self.subst);
        let result_name = Symbol::intern("Result");
        match &pruned {
            Type::Adt(name, params) if *name == result_name && params.len() == 2 => {
                let ok_ty = params[0].clone();
                let err_ty = params[1].clone();
                if let Some(ret) = self.current_fn_return.clone() {
                    let pruned_ret = unify::prune(&ret, &mut self.subst);
                    match pruned_ret {
                        Type::Adt(name, params) if name == result_name && params.len() == 2 => {
                            self.unify_or_report(&params[1], &err_ty, span);
                        },
                        Type::Variable(_) => {
                            let expected = Type::Adt(result_name, vec![self.subst.fresh_var(), err_ty]);
                            self.unify_or_report(&expected, &pruned_ret, span);
                        },
                        _ => {
                            self.error(DiagnosticCode::TRY_RETURN_MISMATCH, "`?` used in a function whose return type is not `Result`", span);
                        },
                    }
                }
                ok_ty
            },
            _ => {
                self.error(DiagnosticCode::TRY_NOT_RESULT, "`?` operand is not a `Result`", span);
                self.subst.fresh_var()
            },
        }
    }

    fn infer_struct_literal(&mut self, lit: &StructLiteralExpr, env: &mut Env, span: Span) -> Type {
        let Some(seg) = lit.path.segments.last() else { return self.subst.fresh_var() };
        let name = seg.ident;
        let field_tys: Vec<(Symbol, Type)> =
            lit.fields.iter().map(|f| (f.name, self.infer_expr(&f.expr, env))).collect();

        if let Some(info) = self.structs.get(&name).cloned() {
            for (field_name, given_ty) in &field_tys {
                if let Some((_, declared)) = info.fields.iter().find(|(n, _)| n == field_name) {
                    self.unify_or_report(declared, given_ty, span);
                }
            }
            Type::Adt(name, Vec::new())
        } else {
            Type::Adt(name, field_tys.into_iter().map(|(_, t)| t).collect())
        }
    }

    fn infer_enum_variant(&mut self, variant: &lumina_ast::EnumVariantExpr, env: &mut Env, span: Span) -> Type {
        use lumina_ast::EnumVariantData;
        match &variant.data {
            EnumVariantData::Unit => {},
            EnumVariantData::Tuple(exprs) => {
                for e in exprs {
                    self.infer_expr(e, env);
                }
            },
            EnumVariantData::Struct(fields) => {
                for f in fields {
                    self.infer_expr(&f.expr, env);
                }
            },
        }
        let enum_name = self
            .variant_to_enum
            .get(&variant.variant)
            .copied()
            .or_else(|| variant.path.segments.first().map(|s| s.ident));
        match enum_name {
            Some(name) => Type::Adt(name, Vec::new()),
            None => {
                self.error(DiagnosticCode::LUM_001, "unresolved enum variant", span);
                self.subst.fresh_var()
            },
        }
    }
}

fn type_names_adt(ty: &Type, needle: Symbol) -> bool {
    match ty {
        Type::Adt(name, params) => {
            *name == needle || params.iter().any(|p| type_names_adt(p, needle))
        },
        Type::Function(args, ret) => {
            args.iter().any(|a| type_names_adt(a, needle)) || type_names_adt(ret, needle)
        },
        Type::Row(fields, tail) => {
            fields.values().any(|f| type_names_adt(f, needle))
                || tail.as_deref().map_or(false, |t| type_names_adt(t, needle))
        },
        Type::Promise(inner) => type_names_adt(inner, needle),
        Type::Primitive(_) | Type::Variable(_) | Type::Hole(_) => false,
    }
}

fn describe_type(ty: &Type) -> String {
    match ty {
        Type::Primitive(p) => p.normalized_name().to_string(),
        Type::Variable(id) => format!("T{}", id.0),
        Type::Adt(name, params) => {
            if params.is_empty() {
                name.as_str().to_string()
            } else {
                let args: Vec<String> = params.iter().map(describe_type).collect();
                format!("{}<{}>", name.as_str(), args.join(", "))
            }
        },
        Type::Function(args, ret) => {
            let args: Vec<String> = args.iter().map(describe_type).collect();
            format!("fn({}) -> {}", args.join(", "), describe_type(ret))
        },
        Type::Row(fields, tail) => {
            let mut parts: Vec<String> =
                fields.iter().map(|(k, v)| format!("{}: {}", k.as_str(), describe_type(v))).collect();
            if tail.is_some() {
                parts.push("..".to_string());
            }
            format!("{{{}}}", parts.join(", "))
        },
        Type::Promise(inner) => format!("Promise<{}>", describe_type(inner)),
        Type::Hole(_) => "_".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ast::{FnItem, GenericParam, Item, ItemKind, Literal, Program, Visibility};
    use lumina_util::Span;

    fn dummy_span() -> Span {
        Span::DUMMY
    }

    fn return_literal_fn(name: &str, lit: Literal, ret_type: Option<lumina_ast::Type>) -> Item {
        let body = Block {
            id: NodeId(0),
            stmts: Vec::new(),
            trailing: Some(Box::new(Expr { id: NodeId(0), span: dummy_span(), kind: ExprKind::Literal(lit) })),
            span: dummy_span(),
        };
        Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Fn(FnItem {
                name: Symbol::intern(name),
                generics: Vec::<GenericParam>::new(),
                params: Vec::new(),
                ret_type,
                body,
                visibility: Visibility::Public,
                async_kw: false,
                where_clause: None,
            }),
        }
    }

    #[test]
    fn infers_int_literal_return_as_i32_by_default() {
        let program = Program { items: vec![return_literal_fn("main", Literal::Int { value: 1, suffix: None }, None)] };
        let options = InferOptions::default();
        let result = infer_program(&program, &options);
        assert!(!result.handler.has_errors());
        assert_eq!(result.inferred_fn_by_name.get(&Symbol::intern("main")), Some(&Type::Primitive(PrimKind::I32)));
    }

    #[test]
    fn mismatched_return_annotation_reports_lum_001() {
        let ret_type = lumina_ast::Type::Path(lumina_ast::Path {
            segments: vec![lumina_ast::PathSegment { ident: Symbol::intern("bool"), args: None }],
        });
        let program = Program {
            items: vec![return_literal_fn("main", Literal::Int { value: 1, suffix: None }, Some(ret_type))],
        };
        let options = InferOptions::default();
        let result = infer_program(&program, &options);
        assert!(result.handler.has_errors());
    }

    #[test]
    fn await_outside_async_is_reported() {
        let body = Block {
            id: NodeId(0),
            stmts: vec![Stmt {
                id: NodeId(0),
                span: dummy_span(),
                kind: StmtKind::Expr(Expr {
                    id: NodeId(0),
                    span: dummy_span(),
                    kind: ExprKind::Await(Box::new(Expr {
                        id: NodeId(0),
                        span: dummy_span(),
                        kind: ExprKind::Literal(Literal::Int { value: 1, suffix: None }),
                    })),
                }),
            }],
            trailing: None,
            span: dummy_span(),
        };
        let item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Fn(FnItem {
                name: Symbol::intern("main"),
                generics: Vec::<GenericParam>::new(),
                params: Vec::new(),
                ret_type: None,
                body,
                visibility: Visibility::Public,
                async_kw: false,
                where_clause: None,
            }),
        };
        let program = Program { items: vec![item] };
        let options = InferOptions::default();
        let result = infer_program(&program, &options);
        assert!(result.handler.has_errors());
        let diags = result.handler.diagnostics();
        assert!(diags.iter().any(|d| d.code == Some(DiagnosticCode::AWAIT_OUTSIDE_ASYNC)));
    }

    #[test]
    fn recursive_struct_without_wrapper_is_rejected() {
        let struct_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Struct(StructItem {
                name: Symbol::intern("Node"),
                generics: Vec::new(),
                fields: vec![lumina_ast::Field {
                    name: Symbol::intern("next"),
                    ty: lumina_ast::Type::Path(lumina_ast::Path {
                        segments: vec![lumina_ast::PathSegment { ident: Symbol::intern("Node"), args: None }],
                    }),
                    visibility: Visibility::Public,
                }],
                visibility: Visibility::Public,
                where_clause: None,
            }),
        };
        let program = Program {
            items: vec![struct_item, return_literal_fn("main", Literal::Int { value: 0, suffix: None }, None)],
        };
        let options = InferOptions::default();
        let result = infer_program(&program, &options);
        assert!(result.handler.has_errors());
        let diags = result.handler.diagnostics();
        assert!(diags.iter().any(|d| d.code == Some(DiagnosticCode::RECURSIVE_TYPE_ERROR)));
    }
}
