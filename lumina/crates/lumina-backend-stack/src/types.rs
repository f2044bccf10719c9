//! A minimal structural numeric-kind inference used only to pick between
//! `i32.*`/`f64.*` instruction forms (spec §4.9). `lumina_ir::Ir` carries no
//! type annotations by this stage (HM types are consulted during lowering
//! and then dropped); this crate recovers just enough to choose an
//! instruction prefix, not a general type checker.

use rustc_hash::FxHashMap;

use lumina_ir::mir::{BinOp, Ir, NumCastKind, UnOp};
use lumina_util::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumKind {
    I32,
    F64,
}

impl NumKind {
    pub fn wasm_prefix(self) -> &'static str {
        match self {
            NumKind::I32 => "i32",
            NumKind::F64 => "f64",
        }
    }
}

/// `Number` literals are `f64`; `Int`/`Bool`/`Unit`/everything opaque
/// (aggregates, calls, member/index reads) defaults to `i32`, matching the
/// target's only two numeric instruction families. Function parameters have
/// no recorded type at this stage either (spec's HM types are an earlier
/// -phase concern), so they default to `i32` too unless a cast downstream
/// forces otherwise — a documented simplification, not a general inference.
pub fn infer_kind(ir: &Ir, locals: &FxHashMap<Symbol, NumKind>) -> NumKind {
    match ir {
        Ir::Number { .. } => NumKind::F64,
        Ir::Ident { name, .. } => locals.get(name).copied().unwrap_or(NumKind::I32),
        Ir::Cast { kind, .. } => match kind {
            NumCastKind::IntToFloat | NumCastKind::FloatToFloat => NumKind::F64,
            NumCastKind::IntToInt | NumCastKind::FloatToInt => NumKind::I32,
        },
        Ir::Unary { op, operand, .. } => match op {
            UnOp::Neg => infer_kind(operand, locals),
            UnOp::Not | UnOp::BitNot => NumKind::I32,
        },
        Ir::Binary { op, left, right, .. } => match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                if infer_kind(left, locals) == NumKind::F64 || infer_kind(right, locals) == NumKind::F64 {
                    NumKind::F64
                } else {
                    NumKind::I32
                }
            }
            _ => NumKind::I32,
        },
        Ir::Phi { then_value, .. } => infer_kind(then_value, locals),
        _ => NumKind::I32,
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
    fn a_number_literal_infers_f64() {
        let locals = FxHashMap::default();
        assert_eq!(infer_kind(&Ir::Number { value: 1.0, span: span() }, &locals), NumKind::F64);
    }

    #[test]
    fn adding_an_int_and_a_float_promotes_to_f64() {
        let locals = FxHashMap::default();
        let ir = Ir::Binary {
            op: BinOp::Add,
            left: Box::new(Ir::Int { value: 1, span: span() }),
            right: Box::new(Ir::Number { value: 2.0, span: span() }),
            span: span(),
        };
        assert_eq!(infer_kind(&ir, &locals), NumKind::F64);
    }

    #[test]
    fn comparisons_always_infer_i32() {
        let locals = FxHashMap::default();
        let ir = Ir::Binary {
            op: BinOp::Lt,
            left: Box::new(Ir::Number { value: 1.0, span: span() }),
            right: Box::new(Ir::Number { value: 2.0, span: span() }),
            span: span(),
        };
        assert_eq!(infer_kind(&ir, &locals), NumKind::I32);
    }
}
