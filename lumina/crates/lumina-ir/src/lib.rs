//! Tree-shaped IR, lowering from the monomorphized AST, and the fixed
//! -point optimizer (spec §4.6, §4.7).

pub mod lower;
pub mod mir;
pub mod opt;

pub use lower::lower_program;
pub use mir::{AggregateKind, BinOp, Function, Ir, NumCastKind, Program, UnOp};
pub use opt::optimize_program;
