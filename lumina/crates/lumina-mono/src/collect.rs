//! Read-only traversal collecting every generic struct/enum instantiation
//! site in a program: occurrences of `Type::Generic(Path(name), args)` and
//! `StructLiteral`/`EnumVariant` expressions with an explicit `generics`
//! list, where `name` names a known generic struct or enum.
//!
//! Unlike function call sites (whose instantiated type arguments
//! `lumina_sem::infer_program` already records per call, see
//! [`crate::specialize`]), struct/enum instantiations can carry
//! const-generic arguments (`Vec<i32, 3>`) that the inferencer's `Type`
//! has no representation for — `lumina_sem::types::Type` models only the
//! types HM unifies, not const-generic integer values. So this pass reads
//! the surface AST directly instead of going through `InferResult`.

use lumina_ast::{
    Block, ElseClause, EnumItem, Expr, ExprKind, FnItem, IfStmt, Item, ItemKind, Path, StmtKind,
    StructItem, Type,
};
use lumina_util::{FxHashMap, FxHashSet, Symbol};

pub struct GenericAdtSite {
    pub name: Symbol,
    pub args: Vec<Type>,
}

pub fn collect_generic_adt_sites(program: &Program, generic_structs: &FxHashMap<Symbol, &StructItem>, generic_enums: &FxHashMap<Symbol, &EnumItem>) -> Vec<GenericAdtSite> {
    let mut known: FxHashSet<Symbol> = FxHashSet::default();
    known.extend(generic_structs.keys().copied());
    known.extend(generic_enums.keys().copied());

    let mut sites = Vec::new();
    for item in &program.items {
        match &item.kind {
            ItemKind::Fn(f) => collect_in_fn(f, &known, &mut sites),
            ItemKind::Struct(s) => {
                for field in &s.fields {
                    collect_in_type(&field.ty, &known, &mut sites);
                }
            }
            ItemKind::Enum(e) => {
                for variant in &e.variants {
                    if let lumina_ast::VariantData::Tuple(tys) = &variant.data {
                        for ty in tys {
                            collect_in_type(ty, &known, &mut sites);
                        }
                    }
                    if let lumina_ast::VariantData::Struct(fields) = &variant.data {
                        for field in fields {
                            collect_in_type(&field.ty, &known, &mut sites);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    sites
}

fn collect_in_fn(f: &FnItem, known: &FxHashSet<Symbol>, sites: &mut Vec<GenericAdtSite>) {
    for param in &f.params {
        if let Some(ty) = &param.ty {
            collect_in_type(ty, known, sites);
        }
    }
    if let Some(ret) = &f.ret_type {
        collect_in_type(ret, known, sites);
    }
    collect_in_block(&f.body, known, sites);
}

fn collect_in_block(block: &Block, known: &FxHashSet<Symbol>, sites: &mut Vec<GenericAdtSite>) {
    for stmt in &block.stmts {
        collect_in_stmt(stmt, known, sites);
    }
    if let Some(trailing) = &block.trailing {
        collect_in_expr(trailing, known, sites);
    }
}

fn collect_in_stmt(stmt: &lumina_ast::Stmt, known: &FxHashSet<Symbol>, sites: &mut Vec<GenericAdtSite>) {
    match &stmt.kind {
        StmtKind::Let(let_stmt) => {
            if let Some(ty) = &let_stmt.ty {
                collect_in_type(ty, known, sites);
            }
            if let Some(init) = &let_stmt.init {
                collect_in_expr(init, known, sites);
            }
        }
        StmtKind::Expr(e) => collect_in_expr(e, known, sites),
        StmtKind::Return(Some(e)) => collect_in_expr(e, known, sites),
        StmtKind::If(if_stmt) => collect_in_if(if_stmt, known, sites),
        StmtKind::While(w) => {
            collect_in_expr(&w.cond, known, sites);
            collect_in_block(&w.body, known, sites);
        }
        StmtKind::For(f) => {
            collect_in_expr(&f.iter, known, sites);
            collect_in_block(&f.body, known, sites);
        }
        _ => {}
    }
}

fn collect_in_if(if_stmt: &IfStmt, known: &FxHashSet<Symbol>, sites: &mut Vec<GenericAdtSite>) {
    collect_in_expr(&if_stmt.cond, known, sites);
    collect_in_block(&if_stmt.then_block, known, sites);
    if let Some(clause) = &if_stmt.else_clause {
        match clause.as_ref() {
            ElseClause::Block(block) => collect_in_block(block, known, sites),
            ElseClause::If(nested) => collect_in_if(nested, known, sites),
        }
    }
}

fn collect_in_expr(expr: &Expr, known: &FxHashSet<Symbol>, sites: &mut Vec<GenericAdtSite>) {
    match &expr.kind {
        ExprKind::Path(path) => collect_in_path(path, known, sites),
        ExprKind::Binary(b) => {
            collect_in_expr(&b.left, known, sites);
            collect_in_expr(&b.right, known, sites);
        }
        ExprKind::Unary(u) => collect_in_expr(&u.expr, known, sites),
        ExprKind::Call(call) => {
            collect_in_expr(&call.func, known, sites);
            for arg in &call.args {
                collect_in_expr(arg, known, sites);
            }
            if let Some(generics) = &call.generics {
                for ty in generics {
                    collect_in_type(ty, known, sites);
                }
            }
        }
        ExprKind::MethodCall(mc) => {
            collect_in_expr(&mc.receiver, known, sites);
            for arg in &mc.args {
                collect_in_expr(arg, known, sites);
            }
        }
        ExprKind::Field(f) => collect_in_expr(&f.object, known, sites),
        ExprKind::Index(ix) => {
            collect_in_expr(&ix.object, known, sites);
            collect_in_expr(&ix.index, known, sites);
        }
        ExprKind::Block(block) => collect_in_block(block, known, sites),
        ExprKind::If(if_expr) => {
            collect_in_expr(&if_expr.cond, known, sites);
            collect_in_block(&if_expr.then_block, known, sites);
            if let Some(else_block) = &if_expr.else_block {
                collect_in_expr(else_block, known, sites);
            }
        }
        ExprKind::Match(m) => {
            collect_in_expr(&m.scrutinee, known, sites);
            for arm in &m.arms {
                if let Some(guard) = &arm.guard {
                    collect_in_expr(guard, known, sites);
                }
                collect_in_expr(&arm.body, known, sites);
            }
        }
        ExprKind::Lambda(lambda) => {
            for param in &lambda.params {
                if let Some(ty) = &param.ty {
                    collect_in_type(ty, known, sites);
                }
            }
            if let Some(ret) = &lambda.ret_type {
                collect_in_type(ret, known, sites);
            }
            collect_in_expr(&lambda.body, known, sites);
        }
        ExprKind::Assign(a) => {
            collect_in_expr(&a.place, known, sites);
            collect_in_expr(&a.value, known, sites);
        }
        ExprKind::CompoundAssign(a) => {
            collect_in_expr(&a.place, known, sites);
            collect_in_expr(&a.value, known, sites);
        }
        ExprKind::Return(Some(e)) => collect_in_expr(e, known, sites),
        ExprKind::Break(Some(e), _) => collect_in_expr(e, known, sites),
        ExprKind::Tuple(items) | ExprKind::Array(items) => {
            for e in items {
                collect_in_expr(e, known, sites);
            }
        }
        ExprKind::ArrayRepeat { value, .. } => collect_in_expr(value, known, sites),
        ExprKind::Range(r) => {
            if let Some(start) = &r.start {
                collect_in_expr(start, known, sites);
            }
            if let Some(end) = &r.end {
                collect_in_expr(end, known, sites);
            }
        }
        ExprKind::Cast(e, ty) => {
            collect_in_expr(e, known, sites);
            collect_in_type(ty, known, sites);
        }
        ExprKind::Async(a) => collect_in_block(&a.body, known, sites),
        ExprKind::Await(e) | ExprKind::Try(e) => collect_in_expr(e, known, sites),
        ExprKind::Is(is_expr) => collect_in_expr(&is_expr.value, known, sites),
        ExprKind::Select(select) => {
            for arm in &select.arms {
                collect_in_expr(&arm.future, known, sites);
                collect_in_expr(&arm.body, known, sites);
            }
        }
        ExprKind::StructLiteral(lit) => {
            if let Some(generics) = &lit.generics {
                note_adt(&lit.path, generics, known, sites);
            }
            for field in &lit.fields {
                collect_in_expr(&field.expr, known, sites);
            }
            if let Some(base) = &lit.base {
                collect_in_expr(base, known, sites);
            }
        }
        ExprKind::EnumVariant(variant) => {
            if let Some(generics) = &variant.generics {
                note_adt(&variant.path, generics, known, sites);
            }
            match &variant.data {
                lumina_ast::EnumVariantData::Tuple(exprs) => {
                    for e in exprs {
                        collect_in_expr(e, known, sites);
                    }
                }
                lumina_ast::EnumVariantData::Struct(fields) => {
                    for field in fields {
                        collect_in_expr(&field.expr, known, sites);
                    }
                }
                lumina_ast::EnumVariantData::Unit => {}
            }
        }
        _ => {}
    }
}

fn collect_in_path(path: &Path, known: &FxHashSet<Symbol>, sites: &mut Vec<GenericAdtSite>) {
    for seg in &path.segments {
        if let Some(args) = &seg.args {
            if known.contains(&seg.ident) {
                sites.push(GenericAdtSite { name: seg.ident, args: args.clone() });
            }
            for ty in args {
                collect_in_type(ty, known, sites);
            }
        }
    }
}

fn note_adt(path: &Path, args: &[Type], known: &FxHashSet<Symbol>, sites: &mut Vec<GenericAdtSite>) {
    if let Some(last) = path.segments.last() {
        if known.contains(&last.ident) {
            sites.push(GenericAdtSite { name: last.ident, args: args.to_vec() });
        }
    }
    for ty in args {
        collect_in_type(ty, known, sites);
    }
}

fn collect_in_type(ty: &Type, known: &FxHashSet<Symbol>, sites: &mut Vec<GenericAdtSite>) {
    match ty {
        Type::Path(path) => collect_in_path(path, known, sites),
        Type::Generic(base, args) => {
            if let Type::Path(path) = base.as_ref() {
                if let Some(last) = path.segments.last() {
                    if known.contains(&last.ident) {
                        sites.push(GenericAdtSite { name: last.ident, args: args.clone() });
                    }
                }
            }
            for arg in args {
                collect_in_type(arg, known, sites);
            }
        }
        Type::Reference(inner, _) | Type::Slice(inner) => collect_in_type(inner, known, sites),
        Type::Array(inner, _) => collect_in_type(inner, known, sites),
        Type::Tuple(items) => {
            for t in items {
                collect_in_type(t, known, sites);
            }
        }
        Type::Fn(params, ret) => {
            for p in params {
                collect_in_type(p, known, sites);
            }
            collect_in_type(ret, known, sites);
        }
        Type::Unit | Type::Never | Type::Inferred => {}
    }
}

use lumina_ast::Program;

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ast::{GenericParam, NodeId, Path, PathSegment, StructItem, Visibility};
    use lumina_util::Span;

    fn dummy_span() -> Span {
        Span::DUMMY
    }

    #[test]
    fn finds_generic_struct_instantiation_in_field_type() {
        let vec_struct = StructItem {
            name: Symbol::intern("Vec"),
            generics: vec![GenericParam { name: Symbol::intern("T"), bounds: Vec::new(), const_ty: None }],
            fields: Vec::new(),
            visibility: Visibility::Public,
            where_clause: None,
        };
        let holder = StructItem {
            name: Symbol::intern("Holder"),
            generics: Vec::new(),
            fields: vec![lumina_ast::Field {
                name: Symbol::intern("items"),
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
                Item { id: NodeId(0), span: dummy_span(), kind: ItemKind::Struct(vec_struct.clone()) },
                Item { id: NodeId(1), span: dummy_span(), kind: ItemKind::Struct(holder) },
            ],
        };
        let mut generic_structs = FxHashMap::default();
        generic_structs.insert(Symbol::intern("Vec"), &vec_struct);
        let generic_enums = FxHashMap::default();
        let sites = collect_generic_adt_sites(&program, &generic_structs, &generic_enums);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, Symbol::intern("Vec"));
    }
}
