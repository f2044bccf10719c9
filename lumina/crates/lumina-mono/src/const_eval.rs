//! The small const-expression evaluator array sizes and const-generic
//! arguments are resolved with during specialization.
//!
//! Supports exactly the grammar [`ConstExpr`] admits: literals, bound
//! const-parameter lookups, and `+ - * /`. Division by a zero constant is
//! reported as `CONST-DIV-ZERO` rather than panicking.

use lumina_ast::{ConstBinOp, ConstExpr};
use lumina_util::{FxHashMap, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstEvalErrorKind {
    /// A `ConstExpr::Param` with no binding in the current specialization's
    /// const-generic arguments. `analyzer.rs`'s `CONST-UNBOUND-PARAM` check
    /// should have already rejected this at the declaration site; this is a
    /// defensive second check at evaluation time.
    UnboundParam(Symbol),
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstEvalError {
    pub kind: ConstEvalErrorKind,
}

/// Evaluates a const expression to its `i64` value under a binding of
/// const-generic parameter names to the concrete integers they were
/// instantiated with at this call/declaration site.
pub fn eval_const_expr(expr: &ConstExpr, bindings: &FxHashMap<Symbol, i64>) -> Result<i64, ConstEvalError> {
    match expr {
        ConstExpr::Literal(value) => Ok(*value),
        ConstExpr::Param(name) => bindings
            .get(name)
            .copied()
            .ok_or(ConstEvalError { kind: ConstEvalErrorKind::UnboundParam(*name) }),
        ConstExpr::Binary(lhs, op, rhs) => {
            let l = eval_const_expr(lhs, bindings)?;
            let r = eval_const_expr(rhs, bindings)?;
            match op {
                ConstBinOp::Add => Ok(l + r),
                ConstBinOp::Sub => Ok(l - r),
                ConstBinOp::Mul => Ok(l * r),
                ConstBinOp::Div => {
                    if r == 0 {
                        Err(ConstEvalError { kind: ConstEvalErrorKind::DivisionByZero })
                    } else {
                        Ok(l / r)
                    }
                }
            }
        }
    }
}
