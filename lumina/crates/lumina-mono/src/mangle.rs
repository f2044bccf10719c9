//! Deterministic, injective name mangling for specialized declarations.
//!
//! `normalize_type_name` is the single source of truth for turning a
//! [`Type`] into the suffix monomorphization appends to a generic
//! declaration's base name (`Vec` + `[i32, 3]` -> `Vec_i32_3`). Two call
//! sites whose pruned argument types are deep-equal always produce the same
//! mangled name, so they share one specialization (see [`crate::specialize`]).

use lumina_ast::Type as AstType;
use lumina_sem::types::{PrimKind, Type};
use lumina_util::Symbol;

/// Mangles a single type into the token(s) `normalize_type_name` joins with
/// `_`. Matches the GLOSSARY definition: primitive -> normalized name; adt ->
/// base name joined with mangled params; function -> `Fn_args_ret`; promise
/// -> `Promise_inner`; variable -> `T<id>`; row -> `Row_<fields>_<tail>`.
pub fn normalize_type_name(ty: &Type) -> String {
    match ty {
        Type::Primitive(prim) => prim_token(*prim).to_string(),
        Type::Adt(name, args) => {
            if args.is_empty() {
                name.as_str().to_string()
            } else {
                let mangled_args: Vec<String> = args.iter().map(normalize_type_name).collect();
                format!("{}_{}", name.as_str(), mangled_args.join("_"))
            }
        }
        Type::Function(params, ret) => {
            let mangled_params: Vec<String> = params.iter().map(normalize_type_name).collect();
            format!("Fn_{}_{}", mangled_params.join("_"), normalize_type_name(ret))
        }
        Type::Promise(inner) => format!("Promise_{}", normalize_type_name(inner)),
        // Neither appears in well-formed post-inference type-argument
        // positions (see GLOSSARY), but mangling stays total and injective
        // rather than panicking on malformed input.
        Type::Variable(id) => format!("T{}", id.0),
        Type::Row(fields, tail) => {
            let mangled_fields: Vec<String> = fields
                .iter()
                .map(|(name, ty)| format!("{}_{}", name.as_str(), normalize_type_name(ty)))
                .collect();
            let tail_token = match tail {
                Some(tail_ty) => normalize_type_name(tail_ty),
                None => "Closed".to_string(),
            };
            format!("Row_{}_{}", mangled_fields.join("_"), tail_token)
        }
        Type::Hole(_) => "Hole".to_string(),
    }
}

fn prim_token(prim: PrimKind) -> &'static str {
    prim.normalized_name()
}

/// Builds the specialized declaration name for a generic base name and a
/// concrete type-argument tuple: `base_arg1_arg2...`. Identical for any two
/// argument tuples that are pairwise deep-equal, by construction.
pub fn mangled_name(base: Symbol, args: &[Type]) -> String {
    if args.is_empty() {
        return base.as_str().to_string();
    }
    let mangled_args: Vec<String> = args.iter().map(normalize_type_name).collect();
    format!("{}_{}", base.as_str(), mangled_args.join("_"))
}

/// Mangles a surface type-argument list exactly as written at a generic
/// struct/enum instantiation site, without going through
/// `lumina_sem::types::Type`: a const-generic argument (`Vec<i32, 3>`'s `3`)
/// arrives as a bare integer-literal path segment, a value
/// `lumina_sem::types::Type` has no representation for. A const argument
/// mangles to its decimal text, same as `normalize_type_name` does for a
/// primitive's normalized spelling.
pub fn mangle_ast_type(ty: &AstType) -> String {
    match ty {
        AstType::Path(path) => match path.segments.last() {
            Some(seg) => match &seg.args {
                Some(args) if !args.is_empty() => {
                    format!("{}_{}", seg.ident.as_str(), args.iter().map(mangle_ast_type).collect::<Vec<_>>().join("_"))
                }
                _ => seg.ident.as_str().to_string(),
            },
            None => "Unit".to_string(),
        },
        AstType::Generic(base, args) => {
            format!("{}_{}", mangle_ast_type(base), args.iter().map(mangle_ast_type).collect::<Vec<_>>().join("_"))
        }
        AstType::Reference(inner, _) => mangle_ast_type(inner),
        AstType::Slice(inner) => format!("Slice_{}", mangle_ast_type(inner)),
        AstType::Array(inner, size) => format!("Array_{}_{}", mangle_ast_type(inner), mangle_const_expr(size)),
        AstType::Tuple(items) => format!("Tuple_{}", items.iter().map(mangle_ast_type).collect::<Vec<_>>().join("_")),
        AstType::Fn(params, ret) => format!("Fn_{}_{}", params.iter().map(mangle_ast_type).collect::<Vec<_>>().join("_"), mangle_ast_type(ret)),
        AstType::Unit => "unit".to_string(),
        AstType::Never => "never".to_string(),
        AstType::Inferred => "Inferred".to_string(),
    }
}

fn mangle_const_expr(expr: &lumina_ast::ConstExpr) -> String {
    match expr {
        lumina_ast::ConstExpr::Literal(v) => v.to_string(),
        lumina_ast::ConstExpr::Param(name) => name.as_str().to_string(),
        lumina_ast::ConstExpr::Binary(lhs, _, rhs) => format!("{}_{}", mangle_const_expr(lhs), mangle_const_expr(rhs)),
    }
}

/// Builds a specialized declaration's name from a base name and the surface
/// type-argument list at one instantiation site.
pub fn mangled_name_from_ast(base: Symbol, args: &[AstType]) -> String {
    if args.is_empty() {
        return base.as_str().to_string();
    }
    format!("{}_{}", base.as_str(), args.iter().map(mangle_ast_type).collect::<Vec<_>>().join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_util::Symbol;

    #[test]
    fn primitive_mangles_to_normalized_name() {
        assert_eq!(normalize_type_name(&Type::Primitive(PrimKind::I32)), "i32");
    }

    #[test]
    fn adt_mangles_base_and_args() {
        let ty = Type::Adt(Symbol::intern("Vec"), vec![Type::Primitive(PrimKind::I32)]);
        assert_eq!(normalize_type_name(&ty), "Vec_i32");
    }

    #[test]
    fn mangled_name_matches_for_deep_equal_args() {
        let a = vec![Type::Adt(Symbol::intern("Vec"), vec![Type::Primitive(PrimKind::I32)])];
        let b = vec![Type::Adt(Symbol::intern("Vec"), vec![Type::Primitive(PrimKind::I32)])];
        assert_eq!(mangled_name(Symbol::intern("wrap"), &a), mangled_name(Symbol::intern("wrap"), &b));
    }

    #[test]
    fn mangled_name_differs_for_different_args() {
        let a = vec![Type::Primitive(PrimKind::I32)];
        let b = vec![Type::Primitive(PrimKind::F64)];
        assert_ne!(mangled_name(Symbol::intern("id"), &a), mangled_name(Symbol::intern("id"), &b));
    }

    #[test]
    fn non_generic_base_is_unmangled() {
        assert_eq!(mangled_name(Symbol::intern("main"), &[]), "main");
    }

    #[test]
    fn function_type_mangles_args_then_return() {
        let ty = Type::Function(vec![Type::Primitive(PrimKind::I32)], Box::new(Type::Primitive(PrimKind::Bool)));
        assert_eq!(normalize_type_name(&ty), "Fn_i32_bool");
    }

    fn path_type(name: &str) -> AstType {
        AstType::Path(lumina_ast::Path { segments: vec![lumina_ast::PathSegment { ident: Symbol::intern(name), args: None }] })
    }

    #[test]
    fn surface_mangle_joins_type_and_const_args() {
        let args = vec![path_type("i32"), path_type("3")];
        assert_eq!(mangled_name_from_ast(Symbol::intern("Vec"), &args), "Vec_i32_3");
    }

    #[test]
    fn surface_mangle_is_stable_for_same_args() {
        let args_a = vec![path_type("i32"), path_type("5")];
        let args_b = vec![path_type("i32"), path_type("5")];
        assert_eq!(mangled_name_from_ast(Symbol::intern("Vec"), &args_a), mangled_name_from_ast(Symbol::intern("Vec"), &args_b));
    }

    #[test]
    fn surface_mangle_differs_for_different_const_arg() {
        let a = mangled_name_from_ast(Symbol::intern("Vec"), &[path_type("i32"), path_type("3")]);
        let b = mangled_name_from_ast(Symbol::intern("Vec"), &[path_type("i32"), path_type("5")]);
        assert_ne!(a, b);
    }
}

#[cfg(test)]
mod mangling_properties {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    /// A small, finite type grammar used only to property-test mangling
    /// injectivity: two primitive leaves plus a tuple constructor, nesting
    /// bounded so generated trees stay small and shrinkable.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Shape {
        I32,
        Bool,
        Pair(Box<Shape>, Box<Shape>),
    }

    impl Shape {
        fn gen(g: &mut Gen, depth: u8) -> Shape {
            if depth == 0 || bool::arbitrary(g) {
                if bool::arbitrary(g) {
                    Shape::I32
                } else {
                    Shape::Bool
                }
            } else {
                Shape::Pair(Box::new(Shape::gen(g, depth - 1)), Box::new(Shape::gen(g, depth - 1)))
            }
        }

        fn to_ast(&self) -> AstType {
            match self {
                Shape::I32 => shape_path("i32"),
                Shape::Bool => shape_path("bool"),
                Shape::Pair(a, b) => AstType::Tuple(vec![a.to_ast(), b.to_ast()]),
            }
        }
    }

    impl Arbitrary for Shape {
        fn arbitrary(g: &mut Gen) -> Self {
            Shape::gen(g, 3)
        }
    }

    fn shape_path(name: &str) -> AstType {
        AstType::Path(lumina_ast::Path { segments: vec![lumina_ast::PathSegment { ident: Symbol::intern(name), args: None }] })
    }

    #[quickcheck]
    fn mangling_is_injective_over_shapes(a: Shape, b: Shape) -> bool {
        let mangled_a = mangle_ast_type(&a.to_ast());
        let mangled_b = mangle_ast_type(&b.to_ast());
        (a == b) == (mangled_a == mangled_b)
    }
}
