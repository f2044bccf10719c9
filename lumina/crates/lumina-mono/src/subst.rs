//! Substituting concrete types and const values into a cloned generic
//! declaration's signature and body.
//!
//! [`Subst`] carries the two bindings a specialization needs: type-parameter
//! name -> concrete surface [`Type`], and const-parameter name -> concrete
//! `i64`. `rewrite_*` walks every AST node that can mention a type or a
//! const expression and produces a fresh, substituted copy; nodes that carry
//! neither (most of the expression grammar) are cloned through unchanged.

use crate::const_eval::eval_const_expr;
use lumina_ast::{
    Block, ConstExpr, ElseClause, EnumVariantData, EnumVariantExpr, Expr, ExprKind, Field,
    FieldPattern, ForStmt, GenericParam, IfExpr, IfStmt, IsExpr, LambdaExpr, Literal, MatchArm,
    Param, Path, PathSegment, Pattern, PatternKind, SelectArm, Stmt, StmtKind, StringPart,
    StructField, StructLiteralExpr, Type, WhileStmt,
};
use lumina_sem::types::Type as SemType;
use lumina_util::{FxHashMap, Symbol};

/// The substitution in effect for one specialization.
pub struct Subst {
    pub types: FxHashMap<Symbol, Type>,
    pub consts: FxHashMap<Symbol, i64>,
}

impl Subst {
    pub fn new() -> Self {
        Subst { types: FxHashMap::default(), consts: FxHashMap::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.consts.is_empty()
    }

    /// Substitutes a surface type, recursing into every position a
    /// parameter reference or a const expression can appear.
    pub fn ty(&self, ty: &Type) -> Type {
        if self.is_empty() {
            return ty.clone();
        }
        match ty {
            Type::Unit | Type::Never | Type::Inferred => ty.clone(),
            Type::Path(path) => {
                if let [PathSegment { ident, args: None }] = path.segments.as_slice() {
                    if let Some(bound) = self.types.get(ident) {
                        return bound.clone();
                    }
                }
                Type::Path(Path { segments: path.segments.iter().map(|seg| self.segment(seg)).collect() })
            }
            Type::Generic(base, args) => {
                Type::Generic(Box::new(self.ty(base)), args.iter().map(|a| self.ty(a)).collect())
            }
            Type::Reference(inner, mutability) => Type::Reference(Box::new(self.ty(inner)), *mutability),
            Type::Slice(inner) => Type::Slice(Box::new(self.ty(inner))),
            Type::Array(inner, size) => Type::Array(Box::new(self.ty(inner)), Box::new(self.const_expr(size))),
            Type::Tuple(items) => Type::Tuple(items.iter().map(|t| self.ty(t)).collect()),
            Type::Fn(params, ret) => Type::Fn(params.iter().map(|t| self.ty(t)).collect(), Box::new(self.ty(ret))),
        }
    }

    fn segment(&self, seg: &PathSegment) -> PathSegment {
        PathSegment {
            ident: seg.ident,
            args: seg.args.as_ref().map(|args| args.iter().map(|a| self.ty(a)).collect()),
        }
    }

    fn ty_opt(&self, ty: &Option<Type>) -> Option<Type> {
        ty.as_ref().map(|t| self.ty(t))
    }

    fn tys_opt(&self, tys: &Option<Vec<Type>>) -> Option<Vec<Type>> {
        tys.as_ref().map(|ts| ts.iter().map(|t| self.ty(t)).collect())
    }

    /// Substitutes a const expression, replacing any bound `Param` with its
    /// concrete value as a literal. An unbound `Param` (referring to some
    /// other declaration's const-generic, e.g. a type parameter untouched by
    /// this specialization) is left as-is.
    pub fn const_expr(&self, expr: &ConstExpr) -> ConstExpr {
        match expr {
            ConstExpr::Literal(_) => expr.clone(),
            ConstExpr::Param(name) => match self.consts.get(name) {
                Some(value) => ConstExpr::Literal(*value),
                None => expr.clone(),
            },
            ConstExpr::Binary(lhs, op, rhs) => {
                ConstExpr::Binary(Box::new(self.const_expr(lhs)), *op, Box::new(self.const_expr(rhs)))
            }
        }
    }

    /// Fully evaluates a const expression after substitution, for the array
    /// -size-in-a-specialized-field case spec's monomorphizer requires.
    pub fn eval(&self, expr: &ConstExpr) -> Result<i64, crate::const_eval::ConstEvalError> {
        eval_const_expr(&self.const_expr(expr), &self.consts)
    }
}

/// Builds the binding map for a generic function's parameter list against a
/// call site's inferred type arguments. `lumina_sem::infer_program` records
/// only type arguments per call (HM has no const-generic-value
/// representation), so any const-generic parameter of the callee is left
/// unbound here; a const expression depending on it is left unevaluated by
/// [`Subst::const_expr`] rather than specialized.
pub fn bind_generics(generics: &[GenericParam], type_args: &[Type]) -> Subst {
    let mut subst = Subst::new();
    let mut type_idx = 0;
    for param in generics {
        if param.is_const() {
            continue;
        }
        if let Some(arg) = type_args.get(type_idx) {
            subst.types.insert(param.name, arg.clone());
        }
        type_idx += 1;
    }
    subst
}

/// Builds the binding map for a generic struct/enum's parameter list against
/// the flat type-and-const argument list written at one instantiation site
/// (`Vec<i32, 3>`'s `[i32, 3]`), positionally 1:1 with `generics`. A
/// const-generic parameter's argument is read back from an integer-literal
/// path segment (the surface grammar carries no separate const-argument
/// node, see [`crate::collect`]); an argument that doesn't parse as an
/// integer is silently left unbound rather than treated as a type.
pub fn bind_generics_from_ast_args(generics: &[GenericParam], args: &[Type]) -> Subst {
    let mut subst = Subst::new();
    for (param, arg) in generics.iter().zip(args.iter()) {
        if param.is_const() {
            if let Some(value) = const_literal_from_type(arg) {
                subst.consts.insert(param.name, value);
            }
        } else {
            subst.types.insert(param.name, arg.clone());
        }
    }
    subst
}

fn const_literal_from_type(ty: &Type) -> Option<i64> {
    match ty {
        Type::Path(path) => {
            let seg = path.segments.last()?;
            seg.ident.as_str().parse::<i64>().ok()
        }
        _ => None,
    }
}

/// Renders an inferencer [`SemType`] back into the surface [`Type`] grammar,
/// for splicing a call site's concrete type argument into a cloned
/// declaration. Inference variables, holes, and row types are not
/// admissible as monomorphization type arguments (see GLOSSARY); they fall
/// back to `Type::Inferred` defensively rather than panicking.
pub fn sem_type_to_ast(ty: &SemType) -> Type {
    match ty {
        SemType::Primitive(prim) => Type::Path(simple_path(prim.normalized_name())),
        SemType::Adt(name, args) => {
            if args.is_empty() {
                Type::Path(simple_path(name.as_str()))
            } else {
                Type::Generic(Box::new(Type::Path(simple_path(name.as_str()))), args.iter().map(sem_type_to_ast).collect())
            }
        }
        SemType::Function(params, ret) => {
            Type::Fn(params.iter().map(sem_type_to_ast).collect(), Box::new(sem_type_to_ast(ret)))
        }
        SemType::Promise(inner) => {
            Type::Generic(Box::new(Type::Path(simple_path("Promise"))), vec![sem_type_to_ast(inner)])
        }
        SemType::Variable(_) | SemType::Hole(_) | SemType::Row(..) => Type::Inferred,
    }
}

fn simple_path(name: &str) -> Path {
    Path { segments: vec![PathSegment { ident: Symbol::intern(name), args: None }] }
}

/// Rewrites a function body under a substitution, recursing into every node
/// that can carry a type annotation, a const expression, or a nested block.
pub fn rewrite_block(block: &Block, subst: &Subst) -> Block {
    if subst.is_empty() {
        return block.clone();
    }
    Block {
        id: block.id,
        stmts: block.stmts.iter().map(|s| rewrite_stmt(s, subst)).collect(),
        trailing: block.trailing.as_ref().map(|e| Box::new(rewrite_expr(e, subst))),
        span: block.span,
    }
}

fn rewrite_stmt(stmt: &Stmt, subst: &Subst) -> Stmt {
    let kind = match &stmt.kind {
        StmtKind::Let(let_stmt) => StmtKind::Let(lumina_ast::LetStmt {
            pattern: rewrite_pattern(&let_stmt.pattern, subst),
            ty: subst.ty_opt(&let_stmt.ty),
            init: let_stmt.init.as_ref().map(|e| rewrite_expr(e, subst)),
            mutable: let_stmt.mutable,
        }),
        StmtKind::Expr(e) => StmtKind::Expr(rewrite_expr(e, subst)),
        StmtKind::Return(e) => StmtKind::Return(e.as_ref().map(|e| rewrite_expr(e, subst))),
        StmtKind::If(if_stmt) => StmtKind::If(rewrite_if_stmt(if_stmt, subst)),
        StmtKind::While(while_stmt) => StmtKind::While(WhileStmt {
            cond: rewrite_expr(&while_stmt.cond, subst),
            body: rewrite_block(&while_stmt.body, subst),
            label: while_stmt.label,
        }),
        StmtKind::For(for_stmt) => StmtKind::For(ForStmt {
            pattern: rewrite_pattern(&for_stmt.pattern, subst),
            iter: rewrite_expr(&for_stmt.iter, subst),
            body: rewrite_block(&for_stmt.body, subst),
            label: for_stmt.label,
        }),
        StmtKind::Break(label) => StmtKind::Break(*label),
        StmtKind::Continue(label) => StmtKind::Continue(*label),
        // A nested item shadows the enclosing generics with its own; it is
        // not touched by this specialization.
        StmtKind::Item(item) => StmtKind::Item(item.clone()),
    };
    Stmt { id: stmt.id, span: stmt.span, kind }
}

fn rewrite_if_stmt(if_stmt: &IfStmt, subst: &Subst) -> IfStmt {
    IfStmt {
        cond: rewrite_expr(&if_stmt.cond, subst),
        then_block: rewrite_block(&if_stmt.then_block, subst),
        else_clause: if_stmt.else_clause.as_ref().map(|clause| Box::new(rewrite_else(clause, subst))),
    }
}

fn rewrite_else(clause: &ElseClause, subst: &Subst) -> ElseClause {
    match clause {
        ElseClause::Block(block) => ElseClause::Block(rewrite_block(block, subst)),
        ElseClause::If(if_stmt) => ElseClause::If(rewrite_if_stmt(if_stmt, subst)),
    }
}

pub fn rewrite_expr(expr: &Expr, subst: &Subst) -> Expr {
    let kind = match &expr.kind {
        ExprKind::Literal(lit) => ExprKind::Literal(rewrite_literal(lit, subst)),
        ExprKind::Path(path) => ExprKind::Path(rewrite_path(path, subst)),
        ExprKind::Binary(b) => ExprKind::Binary(lumina_ast::BinaryExpr {
            left: Box::new(rewrite_expr(&b.left, subst)),
            op: b.op,
            right: Box::new(rewrite_expr(&b.right, subst)),
        }),
        ExprKind::Unary(u) => ExprKind::Unary(lumina_ast::UnaryExpr { op: u.op, expr: Box::new(rewrite_expr(&u.expr, subst)) }),
        ExprKind::Call(call) => ExprKind::Call(lumina_ast::CallExpr {
            func: Box::new(rewrite_expr(&call.func, subst)),
            args: call.args.iter().map(|a| rewrite_expr(a, subst)).collect(),
            generics: subst.tys_opt(&call.generics),
            qualifier: call.qualifier.clone(),
        }),
        ExprKind::MethodCall(mc) => ExprKind::MethodCall(lumina_ast::MethodCallExpr {
            receiver: Box::new(rewrite_expr(&mc.receiver, subst)),
            method: mc.method,
            generics: subst.tys_opt(&mc.generics),
            args: mc.args.iter().map(|a| rewrite_expr(a, subst)).collect(),
        }),
        ExprKind::Field(f) => ExprKind::Field(lumina_ast::FieldExpr { object: Box::new(rewrite_expr(&f.object, subst)), field: f.field }),
        ExprKind::Index(ix) => ExprKind::Index(lumina_ast::IndexExpr {
            object: Box::new(rewrite_expr(&ix.object, subst)),
            index: Box::new(rewrite_expr(&ix.index, subst)),
        }),
        ExprKind::Block(block) => ExprKind::Block(rewrite_block(block, subst)),
        ExprKind::If(if_expr) => ExprKind::If(IfExpr {
            cond: Box::new(rewrite_expr(&if_expr.cond, subst)),
            then_block: rewrite_block(&if_expr.then_block, subst),
            else_block: if_expr.else_block.as_ref().map(|e| Box::new(rewrite_expr(e, subst))),
        }),
        ExprKind::Match(match_expr) => ExprKind::Match(lumina_ast::MatchExpr {
            scrutinee: Box::new(rewrite_expr(&match_expr.scrutinee, subst)),
            arms: match_expr.arms.iter().map(|arm| rewrite_arm(arm, subst)).collect(),
        }),
        ExprKind::Lambda(lambda) => ExprKind::Lambda(LambdaExpr {
            params: lambda.params.iter().map(|p| rewrite_param(p, subst)).collect(),
            ret_type: subst.ty_opt(&lambda.ret_type),
            body: Box::new(rewrite_expr(&lambda.body, subst)),
            form: lambda.form,
            move_kw: lambda.move_kw,
        }),
        ExprKind::Assign(a) => ExprKind::Assign(lumina_ast::AssignExpr {
            place: Box::new(rewrite_expr(&a.place, subst)),
            value: Box::new(rewrite_expr(&a.value, subst)),
        }),
        ExprKind::CompoundAssign(a) => ExprKind::CompoundAssign(lumina_ast::CompoundAssignExpr {
            place: Box::new(rewrite_expr(&a.place, subst)),
            op: a.op,
            value: Box::new(rewrite_expr(&a.value, subst)),
        }),
        ExprKind::Return(e) => ExprKind::Return(e.as_ref().map(|e| Box::new(rewrite_expr(e, subst)))),
        ExprKind::Break(e, label) => ExprKind::Break(e.as_ref().map(|e| Box::new(rewrite_expr(e, subst))), *label),
        ExprKind::Continue(label) => ExprKind::Continue(*label),
        ExprKind::Tuple(items) => ExprKind::Tuple(items.iter().map(|e| rewrite_expr(e, subst)).collect()),
        ExprKind::Array(items) => ExprKind::Array(items.iter().map(|e| rewrite_expr(e, subst)).collect()),
        ExprKind::ArrayRepeat { value, size } => ExprKind::ArrayRepeat {
            value: Box::new(rewrite_expr(value, subst)),
            size: Box::new(subst.const_expr(size)),
        },
        ExprKind::Range(r) => ExprKind::Range(lumina_ast::RangeExpr {
            start: r.start.as_ref().map(|e| Box::new(rewrite_expr(e, subst))),
            end: r.end.as_ref().map(|e| Box::new(rewrite_expr(e, subst))),
            inclusive: r.inclusive,
        }),
        ExprKind::Cast(e, ty) => ExprKind::Cast(Box::new(rewrite_expr(e, subst)), subst.ty(ty)),
        ExprKind::Async(a) => ExprKind::Async(lumina_ast::AsyncExpr { body: rewrite_block(&a.body, subst), move_kw: a.move_kw }),
        ExprKind::Await(e) => ExprKind::Await(Box::new(rewrite_expr(e, subst))),
        ExprKind::Try(e) => ExprKind::Try(Box::new(rewrite_expr(e, subst))),
        ExprKind::Is(is_expr) => ExprKind::Is(IsExpr {
            value: Box::new(rewrite_expr(&is_expr.value, subst)),
            variant: rewrite_path(&is_expr.variant, subst),
            bindings: is_expr.bindings.iter().map(|p| rewrite_pattern(p, subst)).collect(),
        }),
        ExprKind::Select(select) => ExprKind::Select(lumina_ast::SelectExpr {
            arms: select
                .arms
                .iter()
                .map(|arm| SelectArm { future: rewrite_expr(&arm.future, subst), binding: arm.binding, body: rewrite_expr(&arm.body, subst) })
                .collect(),
        }),
        ExprKind::StructLiteral(lit) => ExprKind::StructLiteral(Box::new(StructLiteralExpr {
            path: rewrite_path(&lit.path, subst),
            generics: subst.tys_opt(&lit.generics),
            fields: lit.fields.iter().map(|f| rewrite_struct_field(f, subst)).collect(),
            base: lit.base.as_ref().map(|e| rewrite_expr(e, subst)),
        })),
        ExprKind::EnumVariant(variant) => ExprKind::EnumVariant(Box::new(EnumVariantExpr {
            path: rewrite_path(&variant.path, subst),
            variant: variant.variant,
            generics: subst.tys_opt(&variant.generics),
            data: match &variant.data {
                EnumVariantData::Unit => EnumVariantData::Unit,
                EnumVariantData::Tuple(exprs) => EnumVariantData::Tuple(exprs.iter().map(|e| rewrite_expr(e, subst)).collect()),
                EnumVariantData::Struct(fields) => EnumVariantData::Struct(fields.iter().map(|f| rewrite_struct_field(f, subst)).collect()),
            },
        })),
    };
    Expr { id: expr.id, span: expr.span, kind }
}

fn rewrite_struct_field(field: &StructField, subst: &Subst) -> StructField {
    StructField { name: field.name, expr: rewrite_expr(&field.expr, subst), is_shorthand: field.is_shorthand }
}

fn rewrite_arm(arm: &MatchArm, subst: &Subst) -> MatchArm {
    MatchArm {
        pattern: rewrite_pattern(&arm.pattern, subst),
        guard: arm.guard.as_ref().map(|e| rewrite_expr(e, subst)),
        body: rewrite_expr(&arm.body, subst),
    }
}

fn rewrite_literal(lit: &Literal, subst: &Subst) -> Literal {
    match lit {
        Literal::InterpString(parts) => Literal::InterpString(
            parts
                .iter()
                .map(|part| match part {
                    StringPart::Str(s) => StringPart::Str(*s),
                    StringPart::Expr(e) => StringPart::Expr(Box::new(rewrite_expr(e, subst))),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

fn rewrite_path(path: &Path, subst: &Subst) -> Path {
    Path { segments: path.segments.iter().map(|seg| PathSegment { ident: seg.ident, args: subst.tys_opt(&seg.args) }).collect() }
}

fn rewrite_pattern(pattern: &Pattern, subst: &Subst) -> Pattern {
    let kind = match &pattern.kind {
        PatternKind::Wildcard => PatternKind::Wildcard,
        PatternKind::Ident(name, mutability) => PatternKind::Ident(*name, *mutability),
        PatternKind::Literal(lit) => PatternKind::Literal(rewrite_literal(lit, subst)),
        PatternKind::Path(path) => PatternKind::Path(rewrite_path(path, subst)),
        PatternKind::Struct(path, fields) => PatternKind::Struct(
            rewrite_path(path, subst),
            fields.iter().map(|f| FieldPattern { field: f.field, pattern: rewrite_pattern(&f.pattern, subst) }).collect(),
        ),
        PatternKind::TupleStruct(path, pats) => {
            PatternKind::TupleStruct(rewrite_path(path, subst), pats.iter().map(|p| rewrite_pattern(p, subst)).collect())
        }
        PatternKind::Tuple(pats) => PatternKind::Tuple(pats.iter().map(|p| rewrite_pattern(p, subst)).collect()),
        PatternKind::Slice(pats) => PatternKind::Slice(pats.iter().map(|p| rewrite_pattern(p, subst)).collect()),
    };
    Pattern { id: pattern.id, span: pattern.span, kind }
}

fn rewrite_param(param: &Param, subst: &Subst) -> Param {
    Param { name: param.name, ty: subst.ty_opt(&param.ty), by_ref: param.by_ref, mutable: param.mutable }
}

/// Substitutes a field declaration's type, evaluating any array-size const
/// expression fully under the specialization's const bindings (spec requires
/// specialized struct/enum fields to carry *evaluated* sizes, not
/// unevaluated const expressions referencing the generic's own parameters).
pub fn rewrite_field(field: &Field, subst: &Subst) -> Result<Field, crate::const_eval::ConstEvalError> {
    Ok(Field { name: field.name, ty: rewrite_field_type(&field.ty, subst)?, visibility: field.visibility.clone() })
}

fn rewrite_field_type(ty: &Type, subst: &Subst) -> Result<Type, crate::const_eval::ConstEvalError> {
    match ty {
        Type::Array(inner, size) => {
            let evaluated = subst.eval(size)?;
            Ok(Type::Array(Box::new(rewrite_field_type(inner, subst)?), Box::new(ConstExpr::Literal(evaluated))))
        }
        Type::Generic(base, args) => {
            let mut new_args = Vec::with_capacity(args.len());
            for a in args {
                new_args.push(rewrite_field_type(a, subst)?);
            }
            Ok(Type::Generic(Box::new(rewrite_field_type(base, subst)?), new_args))
        }
        Type::Reference(inner, mutability) => Ok(Type::Reference(Box::new(rewrite_field_type(inner, subst)?), *mutability)),
        Type::Slice(inner) => Ok(Type::Slice(Box::new(rewrite_field_type(inner, subst)?))),
        Type::Tuple(items) => {
            let mut new_items = Vec::with_capacity(items.len());
            for t in items {
                new_items.push(rewrite_field_type(t, subst)?);
            }
            Ok(Type::Tuple(new_items))
        }
        Type::Fn(params, ret) => {
            let mut new_params = Vec::with_capacity(params.len());
            for p in params {
                new_params.push(rewrite_field_type(p, subst)?);
            }
            Ok(Type::Fn(new_params, Box::new(rewrite_field_type(ret, subst)?)))
        }
        _ => Ok(subst.ty(ty)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ast::Mutability;

    #[test]
    fn substitutes_bare_type_parameter_reference() {
        let mut subst = Subst::new();
        subst.types.insert(Symbol::intern("T"), Type::Path(simple_path("i32")));
        let ty = Type::Path(simple_path("T"));
        assert_eq!(subst.ty(&ty), Type::Path(simple_path("i32")));
    }

    #[test]
    fn leaves_unrelated_path_untouched() {
        let subst = Subst::new();
        let ty = Type::Path(simple_path("i32"));
        assert_eq!(subst.ty(&ty), ty);
    }

    #[test]
    fn substitutes_through_generic_args() {
        let mut subst = Subst::new();
        subst.types.insert(Symbol::intern("T"), Type::Path(simple_path("bool")));
        let ty = Type::Generic(Box::new(Type::Path(simple_path("Vec"))), vec![Type::Path(simple_path("T"))]);
        let result = subst.ty(&ty);
        assert_eq!(result, Type::Generic(Box::new(Type::Path(simple_path("Vec"))), vec![Type::Path(simple_path("bool"))]));
    }

    #[test]
    fn field_array_size_is_fully_evaluated() {
        let mut subst = Subst::new();
        subst.consts.insert(Symbol::intern("N"), 3);
        let field = Field {
            name: Symbol::intern("items"),
            ty: Type::Array(Box::new(Type::Path(simple_path("i32"))), Box::new(ConstExpr::Param(Symbol::intern("N")))),
            visibility: lumina_ast::Visibility::Private,
        };
        let rewritten = rewrite_field(&field, &subst).unwrap();
        match rewritten.ty {
            Type::Array(_, size) => assert_eq!(*size, ConstExpr::Literal(3)),
            _ => panic!("expected array type"),
        }
    }

    #[test]
    fn field_array_size_division_by_zero_is_reported() {
        let mut subst = Subst::new();
        subst.consts.insert(Symbol::intern("N"), 0);
        let field = Field {
            name: Symbol::intern("items"),
            ty: Type::Array(
                Box::new(Type::Path(simple_path("i32"))),
                Box::new(ConstExpr::Binary(Box::new(ConstExpr::Literal(10)), lumina_ast::ConstBinOp::Div, Box::new(ConstExpr::Param(Symbol::intern("N"))))),
            ),
            visibility: lumina_ast::Visibility::Private,
        };
        assert!(rewrite_field(&field, &subst).is_err());
    }

    #[test]
    fn sem_type_to_ast_renders_generic_adt() {
        let sem_ty = SemType::Adt(Symbol::intern("Vec"), vec![SemType::Primitive(lumina_sem::types::PrimKind::I32)]);
        let ast_ty = sem_type_to_ast(&sem_ty);
        assert_eq!(ast_ty, Type::Generic(Box::new(Type::Path(simple_path("Vec"))), vec![Type::Path(simple_path("i32"))]));
    }

    #[test]
    fn ident_pattern_mutability_is_preserved() {
        let subst = Subst::new();
        let pattern = Pattern { id: lumina_ast::NodeId(0), span: lumina_util::Span::DUMMY, kind: PatternKind::Ident(Symbol::intern("x"), Mutability::Mutable) };
        let rewritten = rewrite_pattern(&pattern, &subst);
        assert!(matches!(rewritten.kind, PatternKind::Ident(_, Mutability::Mutable)));
    }
}
