//! The semantic analyzer: a second-opinion structural checker that runs
//! alongside HM inference and emits diagnostics HM never touches - trait
//! conformance, const-generic well-formedness, cast safety, string
//! interpolation, indexing shape, range endpoints, and macro resolution.
//!
//! Unlike [`crate::infer`], this pass carries no substitution and does no
//! unification; its checks are structural, over the AST as written.

use lumina_ast::{
    ConstExpr, EnumItem, Expr, ExprKind, FnItem, GenericParam, ImplItem, ImplMember, Item,
    ItemKind, Literal, Program, RangeExpr, StructItem, TraitItem, TraitMember, Type as AstType,
};
use lumina_util::diagnostic::{DiagnosticBuilder, DiagnosticCode, Handler};
use lumina_util::{FxHashMap, FxHashSet, Span, Symbol};

use crate::types::normalize_primitive_name;

/// Integer primitive names admissible as a const-generic parameter's type.
const INTEGER_CONST_TYPES: &[&str] = &["i32", "int", "usize", "u32"];

const BUILTIN_MACROS: &[&str] = &["vec!", "derive!"];

#[derive(Clone)]
struct TraitInfo {
    methods: FxHashMap<Symbol, (usize, bool)>, // name -> (arity, has_default)
    assoc_types: FxHashSet<Symbol>,
    supertraits: Vec<Symbol>,
}

struct ImplRecord {
    trait_name: Option<Symbol>,
    self_name: Option<Symbol>,
    methods: FxHashMap<Symbol, usize>, // name -> arity
    assoc_types: FxHashSet<Symbol>,
    span: Span,
}

pub struct AnalyzeResult {
    pub handler: Handler,
}

pub fn analyze_program(program: &Program) -> AnalyzeResult {
    let mut analyzer = SemanticAnalyzer {
        handler: Handler::new(),
        traits: FxHashMap::default(),
        impls: Vec::new(),
    };
    analyzer.collect_traits(&program.items);
    analyzer.collect_impls(&program.items);
    analyzer.check_trait_conformance();

    for item in &program.items {
        analyzer.analyze_item(item);
    }

    AnalyzeResult { handler: analyzer.handler }
}

struct SemanticAnalyzer {
    handler: Handler,
    traits: FxHashMap<Symbol, TraitInfo>,
    impls: Vec<ImplRecord>,
}

impl SemanticAnalyzer {
    fn error(&self, code: DiagnosticCode, message: impl Into<String>, span: Span) {
        DiagnosticBuilder::error(message).code(code).span(span).emit(&self.handler);
    }

    fn warning(&self, code: DiagnosticCode, message: impl Into<String>, span: Span) {
        DiagnosticBuilder::warning(message).code(code).span(span).emit(&self.handler);
    }

    // ---- Trait registry ------------------------------------------------

    fn collect_traits(&mut self, items: &[Item]) {
        for item in items {
            if let ItemKind::Trait(t) = &item.kind {
                self.traits.insert(t.name, trait_info(t));
            }
        }
    }

    fn collect_impls(&mut self, items: &[Item]) {
        for item in items {
            if let ItemKind::Impl(impl_item) = &item.kind {
                self.impls.push(self.impl_record(impl_item, item.span));
            }
        }
    }

    fn impl_record(&self, impl_item: &ImplItem, span: Span) -> ImplRecord {
        let trait_name = impl_item.trait_ref.as_ref().and_then(type_head_name);
        let self_name = type_head_name(&impl_item.self_ty);
        let mut methods = FxHashMap::default();
        let mut assoc_types = FxHashSet::default();
        for member in &impl_item.items {
            match member {
                ImplMember::Method(f) => {
                    methods.insert(f.name, f.params.len());
                },
                ImplMember::AssocType(name, _) => {
                    assoc_types.insert(*name);
                },
                ImplMember::Const(_, _, _) => {},
            }
        }
        ImplRecord { trait_name, self_name, methods, assoc_types, span }
    }

    /// Every impl's method set must equal the trait's method set (minus
    /// defaulted methods); associated types the trait declares must be
    /// bound; and if the impl is for a concrete (non-generic-param) type,
    /// an impl of every supertrait for that same type must also exist.
    fn check_trait_conformance(&self) {
        for impl_record in &self.impls {
            let Some(trait_name) = impl_record.trait_name else { continue };
            let Some(trait_info) = self.traits.get(&trait_name) else { continue };

            for (method_name, (arity, has_default)) in &trait_info.methods {
                match impl_record.methods.get(method_name) {
                    None if !has_default => {
                        self.error(
                            DiagnosticCode::TRAIT_004,
                            format!(
                                "impl of `{}` is missing method `{}`",
                                trait_name.as_str(),
                                method_name.as_str()
                            ),
                            impl_record.span,
                        );
                    },
                    Some(impl_arity) if impl_arity != arity => {
                        self.error(
                            DiagnosticCode::TRAIT_006,
                            format!(
                                "method `{}` of impl for `{}` takes {} parameter(s), trait declares {}",
                                method_name.as_str(),
                                trait_name.as_str(),
                                impl_arity,
                                arity
                            ),
                            impl_record.span,
                        );
                    },
                    _ => {},
                }
            }

            for assoc in &trait_info.assoc_types {
                if !impl_record.assoc_types.contains(assoc) {
                    self.error(
                        DiagnosticCode::TRAIT_012,
                        format!(
                            "impl of `{}` is missing associated type `{}`",
                            trait_name.as_str(),
                            assoc.as_str()
                        ),
                        impl_record.span,
                    );
                }
            }

            if let Some(self_name) = impl_record.self_name {
                for supertrait in &trait_info.supertraits {
                    let has_supertrait_impl = self.impls.iter().any(|other| {
                        other.trait_name == Some(*supertrait) && other.self_name == Some(self_name)
                    });
                    if !has_supertrait_impl {
                        self.error(
                            DiagnosticCode::TRAIT_015,
                            format!(
                                "`{}` implements `{}` but not its supertrait `{}`",
                                self_name.as_str(),
                                trait_name.as_str(),
                                supertrait.as_str()
                            ),
                            impl_record.span,
                        );
                    }
                }
            }
        }
    }

    // ---- Per-item / per-expression structural checks --------------------

    fn analyze_item(&self, item: &Item) {
        match &item.kind {
            ItemKind::Fn(f) => self.analyze_fn(f),
            ItemKind::Struct(s) => self.analyze_struct(s),
            ItemKind::Enum(e) => self.analyze_enum(e),
            ItemKind::Impl(impl_item) => {
                for member in &impl_item.items {
                    if let ImplMember::Method(f) = member {
                        self.analyze_fn(f);
                    }
                }
            },
            _ => {},
        }
    }

    fn analyze_fn(&self, f: &FnItem) {
        let bound_consts = const_param_names(&f.generics);
        self.check_generics(&f.generics, f.body.span);
        for p in &f.params {
            if let Some(ty) = &p.ty {
                self.check_type(ty, &bound_consts);
            }
        }
        self.analyze_block(&f.body, &bound_consts);
    }

    fn analyze_struct(&self, s: &StructItem) {
        let bound_consts = const_param_names(&s.generics);
        self.check_generics(&s.generics, Span::DUMMY);
        for field in &s.fields {
            self.check_type(&field.ty, &bound_consts);
        }
    }

    fn analyze_enum(&self, e: &EnumItem) {
        let bound_consts = const_param_names(&e.generics);
        self.check_generics(&e.generics, Span::DUMMY);
        for variant in &e.variants {
            if let lumina_ast::VariantData::Tuple(types) = &variant.data {
                for ty in types {
                    self.check_type(ty, &bound_consts);
                }
            }
        }
    }

    fn check_generics(&self, generics: &[GenericParam], span: Span) {
        for g in generics {
            let Some(const_ty) = &g.const_ty else { continue };
            let Some(name) = type_head_name(const_ty) else {
                self.error(
                    DiagnosticCode::CONST_INVALID_TYPE,
                    format!("const parameter `{}` has a non-primitive type", g.name.as_str()),
                    span,
                );
                continue;
            };
            if !INTEGER_CONST_TYPES.contains(&name.as_str()) {
                self.error(
                    DiagnosticCode::CONST_INVALID_TYPE,
                    format!(
                        "const parameter `{}` must have an integer type, found `{}`",
                        g.name.as_str(),
                        name.as_str()
                    ),
                    span,
                );
            }
        }
    }

    fn check_type(&self, ty: &AstType, bound_consts: &FxHashSet<Symbol>) {
        match ty {
            AstType::Array(elem, size) => {
                self.check_const_expr(size, bound_consts, Span::DUMMY);
                self.check_type(elem, bound_consts);
            },
            AstType::Generic(base, args) => {
                self.check_type(base, bound_consts);
                for a in args {
                    self.check_type(a, bound_consts);
                }
            },
            AstType::Reference(inner, _) | AstType::Slice(inner) => self.check_type(inner, bound_consts),
            AstType::Tuple(elems) => {
                for e in elems {
                    self.check_type(e, bound_consts);
                }
            },
            AstType::Fn(args, ret) => {
                for a in args {
                    self.check_type(a, bound_consts);
                }
                self.check_type(ret, bound_consts);
            },
            AstType::Unit | AstType::Never | AstType::Path(_) | AstType::Inferred => {},
        }
    }

    fn check_const_expr(&self, expr: &ConstExpr, bound_consts: &FxHashSet<Symbol>, span: Span) {
        match expr {
            ConstExpr::Literal(_) => {},
            ConstExpr::Param(name) => {
                if !bound_consts.contains(name) {
                    self.error(
                        DiagnosticCode::CONST_UNBOUND_PARAM,
                        format!("const parameter `{}` is not bound in this scope", name.as_str()),
                        span,
                    );
                }
            },
            ConstExpr::Binary(lhs, _, rhs) => {
                self.check_const_expr(lhs, bound_consts, span);
                self.check_const_expr(rhs, bound_consts, span);
            },
        }
    }

    fn analyze_block(&self, block: &lumina_ast::Block, bound_consts: &FxHashSet<Symbol>) {
        for stmt in &block.stmts {
            self.analyze_stmt(stmt, bound_consts);
        }
        if let Some(expr) = &block.trailing {
            self.analyze_expr(expr, bound_consts);
        }
    }

    fn analyze_stmt(&self, stmt: &lumina_ast::Stmt, bound_consts: &FxHashSet<Symbol>) {
        use lumina_ast::StmtKind;
        match &stmt.kind {
            StmtKind::Let(let_stmt) => {
                if let Some(ty) = &let_stmt.ty {
                    self.check_type(ty, bound_consts);
                }
                if let Some(init) = &let_stmt.init {
                    self.analyze_expr(init, bound_consts);
                }
            },
            StmtKind::Expr(e) | StmtKind::Return(Some(e)) => self.analyze_expr(e, bound_consts),
            StmtKind::Return(None) | StmtKind::Break(_) | StmtKind::Continue(_) => {},
            StmtKind::If(if_stmt) => {
                self.analyze_expr(&if_stmt.cond, bound_consts);
                self.analyze_block(&if_stmt.then_block, bound_consts);
                if let Some(else_clause) = &if_stmt.else_clause {
                    self.analyze_else(else_clause, bound_consts);
                }
            },
            StmtKind::While(w) => {
                self.analyze_expr(&w.cond, bound_consts);
                self.analyze_block(&w.body, bound_consts);
            },
            StmtKind::For(f) => {
                self.analyze_expr(&f.iter, bound_consts);
                self.analyze_block(&f.body, bound_consts);
            },
            StmtKind::Item(item) => self.analyze_item(item),
        }
    }

    fn analyze_else(&self, else_clause: &lumina_ast::ElseClause, bound_consts: &FxHashSet<Symbol>) {
        use lumina_ast::ElseClause;
        match else_clause {
            ElseClause::Block(b) => self.analyze_block(b, bound_consts),
            ElseClause::If(nested) => {
                self.analyze_expr(&nested.cond, bound_consts);
                self.analyze_block(&nested.then_block, bound_consts);
                if let Some(clause) = &nested.else_clause {
                    self.analyze_else(clause, bound_consts);
                }
            },
        }
    }

    fn analyze_expr(&self, expr: &Expr, bound_consts: &FxHashSet<Symbol>) {
        match &expr.kind {
            ExprKind::Literal(Literal::InterpString(parts)) => {
                for part in parts {
                    if let lumina_ast::StringPart::Expr(e) = part {
                        self.analyze_expr(e, bound_consts);
                        if is_void_literal(e) {
                            self.error(
                                DiagnosticCode::STRING_INTERP_VOID,
                                "interpolated expression has void type",
                                e.span,
                            );
                        }
                    }
                }
            },
            ExprKind::Literal(_) => {},
            ExprKind::Path(_) => {},
            ExprKind::Binary(b) => {
                self.analyze_expr(&b.left, bound_consts);
                self.analyze_expr(&b.right, bound_consts);
            },
            ExprKind::Unary(u) => self.analyze_expr(&u.expr, bound_consts),
            ExprKind::Call(call) => {
                self.check_macro_call(call, expr.span);
                self.analyze_expr(&call.func, bound_consts);
                for a in &call.args {
                    self.analyze_expr(a, bound_consts);
                }
            },
            ExprKind::MethodCall(mc) => {
                self.analyze_expr(&mc.receiver, bound_consts);
                for a in &mc.args {
                    self.analyze_expr(a, bound_consts);
                }
            },
            ExprKind::Field(f) => self.analyze_expr(&f.object, bound_consts),
            ExprKind::Index(index) => {
                self.analyze_expr(&index.object, bound_consts);
                self.analyze_expr(&index.index, bound_consts);
                if matches!(&index.index.kind, ExprKind::Literal(Literal::String(_))) {
                    self.error(
                        DiagnosticCode::INVALID_INDEX,
                        "object field access must use `.`, not `[]`",
                        index.index.span,
                    );
                }
            },
            ExprKind::Block(b) => self.analyze_block(b, bound_consts),
            ExprKind::If(if_expr) => {
                self.analyze_expr(&if_expr.cond, bound_consts);
                self.analyze_block(&if_expr.then_block, bound_consts);
                if let Some(e) = &if_expr.else_block {
                    self.analyze_expr(e, bound_consts);
                }
            },
            ExprKind::Match(m) => {
                self.analyze_expr(&m.scrutinee, bound_consts);
                for arm in &m.arms {
                    if let Some(guard) = &arm.guard {
                        self.analyze_expr(guard, bound_consts);
                    }
                    self.analyze_expr(&arm.body, bound_consts);
                }
            },
            ExprKind::Lambda(l) => self.analyze_expr(&l.body, bound_consts),
            ExprKind::Assign(a) => {
                self.analyze_expr(&a.place, bound_consts);
                self.analyze_expr(&a.value, bound_consts);
            },
            ExprKind::CompoundAssign(a) => {
                self.analyze_expr(&a.place, bound_consts);
                self.analyze_expr(&a.value, bound_consts);
            },
            ExprKind::Return(Some(e)) | ExprKind::Break(Some(e), _) => self.analyze_expr(e, bound_consts),
            ExprKind::Return(None) | ExprKind::Break(None, _) | ExprKind::Continue(_) => {},
            ExprKind::Tuple(elems) | ExprKind::Array(elems) => {
                for e in elems {
                    self.analyze_expr(e, bound_consts);
                }
            },
            ExprKind::ArrayRepeat { value, size } => {
                self.analyze_expr(value, bound_consts);
                self.check_const_expr(size, bound_consts, expr.span);
            },
            ExprKind::Range(range) => {
                self.analyze_expr_option(&range.start, bound_consts);
                self.analyze_expr_option(&range.end, bound_consts);
                self.check_range(range, expr.span);
            },
            ExprKind::Cast(inner, ty) => {
                self.analyze_expr(inner, bound_consts);
                self.check_cast(inner, ty, expr.span);
            },
            ExprKind::Async(a) => self.analyze_block(&a.body, bound_consts),
            ExprKind::Await(e) | ExprKind::Try(e) => self.analyze_expr(e, bound_consts),
            ExprKind::Is(is_expr) => self.analyze_expr(&is_expr.value, bound_consts),
            ExprKind::Select(select) => {
                for arm in &select.arms {
                    self.analyze_expr(&arm.future, bound_consts);
                    self.analyze_expr(&arm.body, bound_consts);
                }
            },
            ExprKind::StructLiteral(lit) => {
                for f in &lit.fields {
                    self.analyze_expr(&f.expr, bound_consts);
                }
                if let Some(base) = &lit.base {
                    self.analyze_expr(base, bound_consts);
                }
            },
            ExprKind::EnumVariant(variant) => {
                use lumina_ast::EnumVariantData;
                match &variant.data {
                    EnumVariantData::Unit => {},
                    EnumVariantData::Tuple(exprs) => {
                        for e in exprs {
                            self.analyze_expr(e, bound_consts);
                        }
                    },
                    EnumVariantData::Struct(fields) => {
                        for f in fields {
                            self.analyze_expr(&f.expr, bound_consts);
                        }
                    },
                }
            },
        }
    }

    fn analyze_expr_option(&self, expr: &Option<Box<Expr>>, bound_consts: &FxHashSet<Symbol>) {
        if let Some(e) = expr {
            self.analyze_expr(e, bound_consts);
        }
    }

    fn check_range(&self, range: &RangeExpr, span: Span) {
        for end in [&range.start, &range.end].into_iter().flatten() {
            if let ExprKind::Literal(lit) = &end.kind {
                let is_integer = matches!(lit, Literal::Int { .. });
                if !is_integer {
                    self.error(DiagnosticCode::RANGE_TYPE, "range endpoint must be integer", span);
                }
            }
        }
    }

    fn check_cast(&self, inner: &Expr, ty: &AstType, span: Span) {
        let Some(name) = type_head_name(ty) else { return };
        let Some(prim) = normalize_primitive_name(name.as_str()) else {
            self.error(
                DiagnosticCode::TYPE_CAST,
                format!("cannot cast to non-numeric type `{}`", name.as_str()),
                span,
            );
            return;
        };
        use crate::types::PrimKind;
        if matches!(prim, PrimKind::Bool | PrimKind::Char | PrimKind::Str | PrimKind::Unit) {
            self.error(
                DiagnosticCode::TYPE_CAST,
                format!("cannot cast to non-numeric type `{}`", name.as_str()),
                span,
            );
            return;
        }
        let is_float_source = matches!(&inner.kind, ExprKind::Literal(Literal::Float { .. }));
        if is_float_source && matches!(prim, PrimKind::I32 | PrimKind::U32) {
            self.warning(DiagnosticCode::LOSSY_CAST, "lossy cast from float to integer", span);
        }
    }

    fn check_macro_call(&self, call: &lumina_ast::CallExpr, span: Span) {
        let ExprKind::Path(path) = &call.func.kind else { return };
        let Some(seg) = path.segments.last() else { return };
        let name = seg.ident.as_str();
        if !name.ends_with('!') {
            return;
        }
        if !BUILTIN_MACROS.contains(&name) {
            self.error(
                DiagnosticCode::UNRESOLVED_MACRO,
                format!("unresolved macro `{}`", name),
                span,
            );
        }
    }
}

fn is_void_literal(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::Literal(Literal::Unit))
}

fn type_head_name(ty: &AstType) -> Option<Symbol> {
    match ty {
        AstType::Path(path) => path.segments.last().map(|s| s.ident),
        AstType::Generic(base, _) => type_head_name(base),
        _ => None,
    }
}

fn const_param_names(generics: &[GenericParam]) -> FxHashSet<Symbol> {
    generics.iter().filter(|g| g.is_const()).map(|g| g.name).collect()
}

fn trait_info(t: &TraitItem) -> TraitInfo {
    let mut methods = FxHashMap::default();
    let mut assoc_types = FxHashSet::default();
    for member in &t.items {
        match member {
            TraitMember::Method(sig, default_body) => {
                methods.insert(sig.name, (sig.params.len(), default_body.is_some()));
            },
            TraitMember::AssocType(name, _) => {
                assoc_types.insert(*name);
            },
            TraitMember::Const(_, _, _) => {},
        }
    }
    let supertraits = t.supertraits.iter().filter_map(type_head_name).collect();
    TraitInfo { methods, assoc_types, supertraits }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ast::{
        Block, ConstBinOp, Expr, ExprKind, Field, FnItem, FnSig, GenericParam, ImplItem,
        ImplMember, Item, ItemKind, NodeId, Path, PathSegment, Program, StructItem,
        TraitItem, TraitMember, Visibility,
    };
    use lumina_util::Span;

    fn dummy_span() -> Span {
        Span::DUMMY
    }

    fn path_type(name: &str) -> AstType {
        AstType::Path(Path { segments: vec![PathSegment { ident: Symbol::intern(name), args: None }] })
    }

    fn empty_block() -> Block {
        Block { id: NodeId(0), stmts: Vec::new(), trailing: None, span: dummy_span() }
    }

    #[test]
    fn const_generic_with_float_type_is_rejected() {
        let struct_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Struct(StructItem {
                name: Symbol::intern("Buf"),
                generics: vec![GenericParam {
                    name: Symbol::intern("N"),
                    bounds: Vec::new(),
                    const_ty: Some(path_type("float")),
                }],
                fields: vec![Field { name: Symbol::intern("x"), ty: path_type("int"), visibility: Visibility::Public }],
                visibility: Visibility::Public,
                where_clause: None,
            }),
        };
        let program = Program { items: vec![struct_item] };
        let result = analyze_program(&program);
        let diags = result.handler.diagnostics();
        assert!(diags.iter().any(|d| d.code == Some(DiagnosticCode::CONST_INVALID_TYPE)));
    }

    #[test]
    fn unbound_const_param_in_array_size_is_rejected() {
        let field = Field {
            name: Symbol::intern("data"),
            ty: AstType::Array(Box::new(path_type("int")), Box::new(ConstExpr::Param(Symbol::intern("M")))),
            visibility: Visibility::Public,
        };
        let struct_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Struct(StructItem {
                name: Symbol::intern("Buf"),
                generics: vec![GenericParam { name: Symbol::intern("N"), bounds: Vec::new(), const_ty: Some(path_type("usize")) }],
                fields: vec![field],
                visibility: Visibility::Public,
                where_clause: None,
            }),
        };
        let program = Program { items: vec![struct_item] };
        let result = analyze_program(&program);
        let diags = result.handler.diagnostics();
        assert!(diags.iter().any(|d| d.code == Some(DiagnosticCode::CONST_UNBOUND_PARAM)));
    }

    #[test]
    fn bound_const_param_in_array_size_is_accepted() {
        let field = Field {
            name: Symbol::intern("data"),
            ty: AstType::Array(
                Box::new(path_type("int")),
                Box::new(ConstExpr::Binary(
                    Box::new(ConstExpr::Param(Symbol::intern("N"))),
                    ConstBinOp::Add,
                    Box::new(ConstExpr::Literal(1)),
                )),
            ),
            visibility: Visibility::Public,
        };
        let struct_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Struct(StructItem {
                name: Symbol::intern("Buf"),
                generics: vec![GenericParam { name: Symbol::intern("N"), bounds: Vec::new(), const_ty: Some(path_type("usize")) }],
                fields: vec![field],
                visibility: Visibility::Public,
                where_clause: None,
            }),
        };
        let program = Program { items: vec![struct_item] };
        let result = analyze_program(&program);
        assert!(!result.handler.has_errors());
    }

    #[test]
    fn impl_missing_trait_method_is_rejected() {
        let trait_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Trait(TraitItem {
                name: Symbol::intern("Show"),
                generics: Vec::new(),
                items: vec![TraitMember::Method(
                    FnSig { name: Symbol::intern("show"), generics: Vec::new(), params: Vec::new(), ret_type: None },
                    None,
                )],
                supertraits: Vec::new(),
                visibility: Visibility::Public,
            }),
        };
        let impl_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Impl(ImplItem {
                generics: Vec::new(),
                trait_ref: Some(path_type("Show")),
                self_ty: path_type("Point"),
                items: Vec::new(),
                where_clause: None,
            }),
        };
        let program = Program { items: vec![trait_item, impl_item] };
        let result = analyze_program(&program);
        let diags = result.handler.diagnostics();
        assert!(diags.iter().any(|d| d.code == Some(DiagnosticCode::TRAIT_004)));
    }

    #[test]
    fn impl_with_all_methods_present_is_accepted() {
        let trait_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Trait(TraitItem {
                name: Symbol::intern("Show"),
                generics: Vec::new(),
                items: vec![TraitMember::Method(
                    FnSig { name: Symbol::intern("show"), generics: Vec::new(), params: Vec::new(), ret_type: None },
                    None,
                )],
                supertraits: Vec::new(),
                visibility: Visibility::Public,
            }),
        };
        let show_method = FnItem {
            name: Symbol::intern("show"),
            generics: Vec::new(),
            params: Vec::new(),
            ret_type: None,
            body: empty_block(),
            visibility: Visibility::Public,
            async_kw: false,
            where_clause: None,
        };
        let impl_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Impl(ImplItem {
                generics: Vec::new(),
                trait_ref: Some(path_type("Show")),
                self_ty: path_type("Point"),
                items: vec![ImplMember::Method(show_method)],
                where_clause: None,
            }),
        };
        let program = Program { items: vec![trait_item, impl_item] };
        let result = analyze_program(&program);
        assert!(!result.handler.has_errors());
    }

    #[test]
    fn impl_method_with_wrong_arity_is_rejected() {
        let trait_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Trait(TraitItem {
                name: Symbol::intern("Eq"),
                generics: Vec::new(),
                items: vec![TraitMember::Method(
                    FnSig {
                        name: Symbol::intern("equals"),
                        generics: Vec::new(),
                        params: vec![lumina_ast::Param {
                            name: Symbol::intern("other"),
                            ty: Some(path_type("Self")),
                            by_ref: None,
                            mutable: false,
                        }],
                        ret_type: Some(path_type("bool")),
                    },
                    None,
                )],
                supertraits: Vec::new(),
                visibility: Visibility::Public,
            }),
        };
        let equals_method = FnItem {
            name: Symbol::intern("equals"),
            generics: Vec::new(),
            params: Vec::new(),
            ret_type: Some(path_type("bool")),
            body: empty_block(),
            visibility: Visibility::Public,
            async_kw: false,
            where_clause: None,
        };
        let impl_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Impl(ImplItem {
                generics: Vec::new(),
                trait_ref: Some(path_type("Eq")),
                self_ty: path_type("Point"),
                items: vec![ImplMember::Method(equals_method)],
                where_clause: None,
            }),
        };
        let program = Program { items: vec![trait_item, impl_item] };
        let result = analyze_program(&program);
        let diags = result.handler.diagnostics();
        assert!(diags.iter().any(|d| d.code == Some(DiagnosticCode::TRAIT_006)));
    }

    #[test]
    fn unresolved_macro_call_is_rejected() {
        let call_expr = Expr {
            id: NodeId(0),
            span: dummy_span(),
            kind: ExprKind::Call(lumina_ast::CallExpr {
                func: Box::new(Expr {
                    id: NodeId(0),
                    span: dummy_span(),
                    kind: ExprKind::Path(Path {
                        segments: vec![PathSegment { ident: Symbol::intern("println!"), args: None }],
                    }),
                }),
                args: Vec::new(),
                generics: None,
                qualifier: None,
            }),
        };
        let mut block = empty_block();
        block.trailing = Some(Box::new(call_expr));
        let fn_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Fn(FnItem {
                name: Symbol::intern("main"),
                generics: Vec::new(),
                params: Vec::new(),
                ret_type: None,
                body: block,
                visibility: Visibility::Public,
                async_kw: false,
                where_clause: None,
            }),
        };
        let program = Program { items: vec![fn_item] };
        let result = analyze_program(&program);
        let diags = result.handler.diagnostics();
        assert!(diags.iter().any(|d| d.code == Some(DiagnosticCode::UNRESOLVED_MACRO)));
    }

    #[test]
    fn string_index_is_invalid() {
        let index_expr = Expr {
            id: NodeId(0),
            span: dummy_span(),
            kind: ExprKind::Index(lumina_ast::IndexExpr {
                object: Box::new(Expr {
                    id: NodeId(0),
                    span: dummy_span(),
                    kind: ExprKind::Path(Path { segments: vec![PathSegment { ident: Symbol::intern("obj"), args: None }] }),
                }),
                index: Box::new(Expr {
                    id: NodeId(0),
                    span: dummy_span(),
                    kind: ExprKind::Literal(Literal::String(Symbol::intern("field"))),
                }),
            }),
        };
        let mut block = empty_block();
        block.trailing = Some(Box::new(index_expr));
        let fn_item = Item {
            id: NodeId(0),
            span: dummy_span(),
            kind: ItemKind::Fn(FnItem {
                name: Symbol::intern("main"),
                generics: Vec::new(),
                params: Vec::new(),
                ret_type: None,
                body: block,
                visibility: Visibility::Public,
                async_kw: false,
                where_clause: None,
            }),
        };
        let program = Program { items: vec![fn_item] };
        let result = analyze_program(&program);
        let diags = result.handler.diagnostics();
        assert!(diags.iter().any(|d| d.code == Some(DiagnosticCode::INVALID_INDEX)));
    }
}
