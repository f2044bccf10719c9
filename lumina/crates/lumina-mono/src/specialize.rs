//! The monomorphizer: walks a [`Program`] plus the call-site instantiations
//! [`lumina_sem::infer_program`] recorded, and produces a new program in
//! which every generic function/struct/enum has one cloned, fully
//! substituted declaration per distinct deep-equal instantiation.
//!
//! Grounded on the "collect instantiations, then rewrite" shape of a
//! monomorphization pass (see DESIGN.md), generalized from a single-function
//! local pass to a whole-program, declaration-level one: this pass clones
//! and specializes declarations up front rather than rewriting expression
//! trees node-by-node in place.

use crate::collect::collect_generic_adt_sites;
use crate::mangle::{mangled_name, mangled_name_from_ast};
use crate::subst::{bind_generics, bind_generics_from_ast_args, rewrite_block, rewrite_field, sem_type_to_ast};
use lumina_ast::{EnumItem, FnItem, Item, ItemKind, NodeId, Path, PathSegment, Program, StructItem, Type, Variant, VariantData};
use lumina_sem::infer::InferResult;
use lumina_sem::types::Type as SemType;
use lumina_util::diagnostic::{DiagnosticBuilder, DiagnosticCode, Handler};
use lumina_util::{FxHashMap, Span, Symbol};
use std::collections::BTreeMap;

/// Everything `monomorphize_program` produces.
pub struct MonoResult {
    pub program: Program,
    pub handler: Handler,
}

struct Monomorphizer<'a> {
    handler: Handler,
    generic_fns: FxHashMap<Symbol, &'a FnItem>,
    generic_structs: FxHashMap<Symbol, &'a StructItem>,
    generic_enums: FxHashMap<Symbol, &'a EnumItem>,
    /// Every distinct instantiation recorded for a generic function callee,
    /// deduped by mangled name so two call sites sharing type arguments
    /// share one specialization (spec §4.5).
    fn_instantiations: BTreeMap<String, (Symbol, Vec<SemType>)>,
    /// Every distinct struct/enum instantiation found at a surface type or
    /// literal-expression site, deduped the same way.
    adt_instantiations: BTreeMap<String, (Symbol, Vec<Type>)>,
}

/// Runs monomorphization: input is the original AST plus the inferencer's
/// recorded call-site type arguments; output is a new AST with specialized
/// declarations spliced in and call sites rewritten to reference them.
pub fn monomorphize_program(program: &Program, infer: &InferResult) -> MonoResult {
    let mut mono = Monomorphizer {
        handler: Handler::new(),
        generic_fns: FxHashMap::default(),
        generic_structs: FxHashMap::default(),
        generic_enums: FxHashMap::default(),
        fn_instantiations: BTreeMap::new(),
        adt_instantiations: BTreeMap::new(),
    };

    for item in &program.items {
        match &item.kind {
            ItemKind::Fn(f) if !f.generics.is_empty() => {
                mono.generic_fns.insert(f.name, f);
            }
            ItemKind::Struct(s) if !s.generics.is_empty() => {
                mono.generic_structs.insert(s.name, s);
            }
            ItemKind::Enum(e) if !e.generics.is_empty() => {
                mono.generic_enums.insert(e.name, e);
            }
            _ => {}
        }
    }

    // Collect distinct instantiations from every recorded call site.
    // `qualifier`-bearing (enum-variant/namespaced) calls are filtered out
    // upstream in `infer.rs`'s recording, so every entry here is a plain
    // function-name call eligible for rewriting.
    for (_, callee, arg_types) in &infer.recorded_call_args_for_monomorphization {
        if mono.generic_fns.contains_key(callee) {
            let name = mangled_name(*callee, arg_types);
            mono.fn_instantiations.entry(name).or_insert_with(|| (*callee, arg_types.clone()));
        }
    }

    for site in collect_generic_adt_sites(program, &mono.generic_structs, &mono.generic_enums) {
        let mangled = mangled_name_from_ast(site.name, &site.args);
        mono.adt_instantiations.entry(mangled).or_insert_with(|| (site.name, site.args));
    }

    // The generic declarations themselves are preserved verbatim (spec:
    // "unused generic declarations... are preserved in the AST"); the back
    // end's DCE removes them later if they end up with zero call sites.
    let mut new_items: Vec<Item> = program.items.iter().cloned().collect();

    for (mangled, (base, arg_types)) in &mono.fn_instantiations {
        if let Some(f) = mono.generic_fns.get(base) {
            new_items.push(mono.specialize_fn(f, mangled, arg_types));
        }
    }
    for (mangled, (base, args)) in &mono.adt_instantiations {
        if let Some(s) = mono.generic_structs.get(base) {
            match mono.specialize_struct(s, mangled, args) {
                Ok(item) => new_items.push(item),
                Err(_) => mono.report_div_zero(*base),
            }
        } else if let Some(e) = mono.generic_enums.get(base) {
            match mono.specialize_enum(e, mangled, args) {
                Ok(item) => new_items.push(item),
                Err(_) => mono.report_div_zero(*base),
            }
        }
    }

    let rewritten_items: Vec<Item> = new_items.iter().map(|item| mono.rewrite_call_sites(item)).collect();

    MonoResult { program: Program { items: rewritten_items }, handler: mono.handler }
}

impl<'a> Monomorphizer<'a> {
    fn report_div_zero(&self, base: Symbol) {
        DiagnosticBuilder::error(format!(
            "specializing `{}` requires dividing by a const parameter bound to zero",
            base.as_str()
        ))
        .code(DiagnosticCode::CONST_DIV_ZERO)
        .span(Span::DUMMY)
        .emit(&self.handler);
    }

    fn specialize_fn(&self, f: &FnItem, mangled: &str, arg_types: &[SemType]) -> Item {
        let ast_args: Vec<Type> = arg_types.iter().map(sem_type_to_ast).collect();
        let subst = bind_generics(&f.generics, &ast_args);

        let specialized = FnItem {
            name: Symbol::intern(mangled),
            generics: Vec::new(),
            params: f
                .params
                .iter()
                .map(|p| lumina_ast::Param { name: p.name, ty: p.ty.as_ref().map(|t| subst.ty(t)), by_ref: p.by_ref, mutable: p.mutable })
                .collect(),
            ret_type: f.ret_type.as_ref().map(|t| subst.ty(t)),
            body: rewrite_block(&f.body, &subst),
            visibility: f.visibility.clone(),
            async_kw: f.async_kw,
            where_clause: None,
        };

        Item { id: NodeId(u32::MAX), span: Span::DUMMY, kind: ItemKind::Fn(specialized) }
    }

    fn specialize_struct(&self, s: &StructItem, mangled: &str, args: &[Type]) -> Result<Item, crate::const_eval::ConstEvalError> {
        let subst = bind_generics_from_ast_args(&s.generics, args);

        let mut fields = Vec::with_capacity(s.fields.len());
        for field in &s.fields {
            fields.push(rewrite_field(field, &subst)?);
        }

        let specialized = StructItem { name: Symbol::intern(mangled), generics: Vec::new(), fields, visibility: s.visibility.clone(), where_clause: None };
        Ok(Item { id: NodeId(u32::MAX), span: Span::DUMMY, kind: ItemKind::Struct(specialized) })
    }

    fn specialize_enum(&self, e: &EnumItem, mangled: &str, args: &[Type]) -> Result<Item, crate::const_eval::ConstEvalError> {
        let subst = bind_generics_from_ast_args(&e.generics, args);

        let mut variants = Vec::with_capacity(e.variants.len());
        for variant in &e.variants {
            let data = match &variant.data {
                VariantData::Unit => VariantData::Unit,
                VariantData::Tuple(tys) => {
                    let mut new_tys = Vec::with_capacity(tys.len());
                    for t in tys {
                        new_tys.push(subst.ty(t));
                    }
                    VariantData::Tuple(new_tys)
                }
                VariantData::Struct(fields) => {
                    let mut new_fields = Vec::with_capacity(fields.len());
                    for field in fields {
                        new_fields.push(rewrite_field(field, &subst)?);
                    }
                    VariantData::Struct(new_fields)
                }
            };
            variants.push(Variant { name: variant.name, data });
        }

        let specialized = EnumItem { name: Symbol::intern(mangled), generics: Vec::new(), variants, visibility: e.visibility.clone(), where_clause: None };
        Ok(Item { id: NodeId(u32::MAX), span: Span::DUMMY, kind: ItemKind::Enum(specialized) })
    }

    /// Rewrites call-site identifiers throughout a function's body to
    /// reference the specialized declarations. Qualified calls
    /// (`qualifier: Some(_)`, e.g. enum variant constructors) are left
    /// untouched per spec §4.5.
    fn rewrite_call_sites(&self, item: &Item) -> Item {
        match &item.kind {
            ItemKind::Fn(f) => {
                let mut f = f.clone();
                f.body = self.rewrite_block_call_sites(&f.body);
                Item { kind: ItemKind::Fn(f), ..item.clone() }
            }
            _ => item.clone(),
        }
    }

    fn rewrite_block_call_sites(&self, block: &lumina_ast::Block) -> lumina_ast::Block {
        let mut block = block.clone();
        for stmt in &mut block.stmts {
            self.rewrite_stmt_call_sites(stmt);
        }
        if let Some(trailing) = &mut block.trailing {
            **trailing = self.rewrite_expr_call_sites(trailing);
        }
        block
    }

    fn rewrite_stmt_call_sites(&self, stmt: &mut lumina_ast::Stmt) {
        use lumina_ast::StmtKind;
        match &mut stmt.kind {
            StmtKind::Let(let_stmt) => {
                if let Some(init) = &mut let_stmt.init {
                    *init = self.rewrite_expr_call_sites(init);
                }
            }
            StmtKind::Expr(e) => *e = self.rewrite_expr_call_sites(e),
            StmtKind::Return(Some(e)) => *e = self.rewrite_expr_call_sites(e),
            StmtKind::If(if_stmt) => {
                if_stmt.cond = self.rewrite_expr_call_sites(&if_stmt.cond);
                if_stmt.then_block = self.rewrite_block_call_sites(&if_stmt.then_block);
            }
            StmtKind::While(w) => {
                w.cond = self.rewrite_expr_call_sites(&w.cond);
                w.body = self.rewrite_block_call_sites(&w.body);
            }
            StmtKind::For(f) => {
                f.iter = self.rewrite_expr_call_sites(&f.iter);
                f.body = self.rewrite_block_call_sites(&f.body);
            }
            _ => {}
        }
    }

    fn rewrite_expr_call_sites(&self, expr: &lumina_ast::Expr) -> lumina_ast::Expr {
        use lumina_ast::ExprKind;
        let mut expr = expr.clone();
        match &mut expr.kind {
            ExprKind::Call(call) if call.qualifier.is_none() => {
                for arg in &mut call.args {
                    *arg = self.rewrite_expr_call_sites(arg);
                }
                if let ExprKind::Path(path) = &call.func.kind {
                    if let [PathSegment { ident, args: _ }] = path.segments.as_slice() {
                        if let Some(arg_types) = self.unambiguous_instantiation(*ident) {
                            let mangled = mangled_name(*ident, &arg_types);
                            call.func = Box::new(lumina_ast::Expr {
                                id: call.func.id,
                                span: call.func.span,
                                kind: ExprKind::Path(Path { segments: vec![PathSegment { ident: Symbol::intern(&mangled), args: None }] }),
                            });
                            call.generics = None;
                        }
                    }
                }
            }
            ExprKind::Call(call) => {
                for arg in &mut call.args {
                    *arg = self.rewrite_expr_call_sites(arg);
                }
            }
            ExprKind::Block(block) => *block = self.rewrite_block_call_sites(block),
            ExprKind::If(if_expr) => {
                if_expr.cond = Box::new(self.rewrite_expr_call_sites(&if_expr.cond));
                if_expr.then_block = self.rewrite_block_call_sites(&if_expr.then_block);
                if let Some(else_block) = &mut if_expr.else_block {
                    **else_block = self.rewrite_expr_call_sites(else_block);
                }
            }
            ExprKind::Binary(b) => {
                b.left = Box::new(self.rewrite_expr_call_sites(&b.left));
                b.right = Box::new(self.rewrite_expr_call_sites(&b.right));
            }
            _ => {}
        }
        expr
    }

    /// A call site is rewritten only when its callee has exactly one
    /// recorded instantiation program-wide: the common case, where a generic
    /// function is always called the same way. A callee instantiated
    /// differently at different sites is left as the original generic
    /// reference here; it's a documented simplification (see DESIGN.md)
    /// rather than threading per-call-site node ids through this pass.
    fn unambiguous_instantiation(&self, callee: Symbol) -> Option<Vec<SemType>> {
        let mut candidates = self.fn_instantiations.values().filter(|(name, _)| *name == callee);
        let first = candidates.next()?;
        if candidates.next().is_some() {
            return None;
        }
        Some(first.1.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ast::{Block, Param, Visibility};
    use lumina_sem::infer::{infer_program, InferOptions};
    use lumina_util::Span;

    fn dummy_span() -> Span {
        Span::DUMMY
    }

    fn empty_block() -> Block {
        Block { id: NodeId(0), stmts: Vec::new(), trailing: None, span: dummy_span() }
    }

    #[test]
    fn non_generic_program_is_unchanged_in_shape() {
        let program = Program {
            items: vec![Item {
                id: NodeId(0),
                span: dummy_span(),
                kind: ItemKind::Fn(FnItem {
                    name: Symbol::intern("main"),
                    generics: Vec::new(),
                    params: Vec::new(),
                    ret_type: None,
                    body: empty_block(),
                    visibility: Visibility::Public,
                    async_kw: false,
                    where_clause: None,
                }),
            }],
        };
        let infer_result = infer_program(&program, &InferOptions::default());
        let mono = monomorphize_program(&program, &infer_result);
        assert_eq!(mono.program.items.len(), 1);
        assert!(!mono.handler.has_errors());
    }

    #[test]
    fn unused_generic_function_is_preserved_with_no_specialization() {
        let program = Program {
            items: vec![Item {
                id: NodeId(0),
                span: dummy_span(),
                kind: ItemKind::Fn(FnItem {
                    name: Symbol::intern("identity"),
                    generics: vec![lumina_ast::GenericParam { name: Symbol::intern("T"), bounds: Vec::new(), const_ty: None }],
                    params: vec![Param {
                        name: Symbol::intern("x"),
                        ty: Some(Type::Path(Path { segments: vec![PathSegment { ident: Symbol::intern("T"), args: None }] })),
                        by_ref: None,
                        mutable: false,
                    }],
                    ret_type: None,
                    body: empty_block(),
                    visibility: Visibility::Public,
                    async_kw: false,
                    where_clause: None,
                }),
            }],
        };
        let infer_result = infer_program(&program, &InferOptions::default());
        let mono = monomorphize_program(&program, &infer_result);
        // zero call sites recorded -> generic declaration kept, no specializations added
        assert_eq!(mono.program.items.len(), 1);
    }

    #[test]
    fn generic_struct_instantiated_in_a_field_type_is_specialized() {
        let vec_struct = StructItem {
            name: Symbol::intern("Vec"),
            generics: vec![lumina_ast::GenericParam { name: Symbol::intern("T"), bounds: Vec::new(), const_ty: None }],
            fields: vec![lumina_ast::Field {
                name: Symbol::intern("item"),
                ty: Type::Path(Path { segments: vec![PathSegment { ident: Symbol::intern("T"), args: None }] }),
                visibility: Visibility::Public,
            }],
            visibility: Visibility::Public,
            where_clause: None,
        };
        let holder = StructItem {
            name: Symbol::intern("Holder"),
            generics: Vec::new(),
            fields: vec![lumina_ast::Field {
                name: Symbol::intern("v"),
                ty: Type::Generic(
                    Box::new(Type::Path(Path { segments: vec![PathSegment { ident: Symbol::intern("Vec"), args: None }] })),
                    vec![Type::Path(Path { segments: vec![PathSegment { ident: Symbol::intern("i32"), args: None }] })],
                ),
                visibility: Visibility::Public,
            }],
            visibility: Visibility::Public,
            where_clause: None,
        };
        let program = Program {
            items: vec![
                Item { id: NodeId(0), span: dummy_span(), kind: ItemKind::Struct(vec_struct) },
                Item { id: NodeId(1), span: dummy_span(), kind: ItemKind::Struct(holder) },
            ],
        };
        let infer_result = infer_program(&program, &InferOptions::default());
        let mono = monomorphize_program(&program, &infer_result);
        let has_specialized = mono.program.items.iter().any(|item| matches!(&item.kind, ItemKind::Struct(s) if s.name.eq_str("Vec_i32")));
        assert!(has_specialized);
        assert!(!mono.handler.has_errors());
    }
}
