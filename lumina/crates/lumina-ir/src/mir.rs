//! Tree-shaped IR the lowering pass produces and the optimizer rewrites.
//!
//! Unlike a basic-block control-flow graph, a Lumina IR function body keeps
//! the shape of the source program: `If`/`Loop` nest their own bodies as
//! `Vec<Ir>` rather than branching to block ids. This lets the optimizer's
//! structural passes (branch folding, dead-store elimination, unreachable
//! -code elimination) pattern-match directly on the tree instead of walking
//! a graph.

use lumina_util::{Span, Symbol};

/// A fully lowered and (eventually) optimized program: one `main`, zero or
/// more other top-level functions, plus the closures lowering synthesized
/// out of lambda expressions.
#[derive(Debug, Clone)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    pub body: Vec<Ir>,
    /// Top-level `export`ed declarations are DCE roots alongside `main`
    /// (spec §4.7 pass 7).
    pub exported: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    BitNot,
}

/// Numeric conversion kind a `Cast` node carries, so the back ends can pick
/// the matching widening/narrowing instruction (spec §4.9: `f64.convert_i32`
/// and friends) without re-deriving it from source and target types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumCastKind {
    IntToInt,
    IntToFloat,
    FloatToInt,
    FloatToFloat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateKind {
    Tuple,
    Array,
    Struct(Symbol),
    /// Enum construction: enum name, variant name, and the variant's
    /// discriminant among its enum's declaration order (used identically by
    /// `Tag` reads during match lowering, see `lower::hir_to_mir`).
    EnumVariant(Symbol, Symbol, u32),
}

/// One IR node. Every node carries the [`Span`] of the AST node it lowers
/// from (spec §4.6: "each IR node inherits the location of the AST node it
/// lowers from"); when one AST node produces several IR nodes (e.g. a
/// `match` arm producing a tag-check plus payload `Let`s) each gets the same
/// span, which is what lets the source-map pass (§4.8) distinguish them by
/// generated column alone.
#[derive(Debug, Clone, PartialEq)]
pub enum Ir {
    /// A fresh binding: `let x = e` lowers to `Let{name: x_<suffix>, ...}`.
    /// The suffix makes every `let`, including ones that shadow an outer
    /// binding of the same source name, address a distinct storage slot in
    /// the emitted target (spec §4.8: "so distinct scopes do not alias").
    Let { name: Symbol, value: Box<Ir>, span: Span },
    /// A mutation of an existing binding. Outside an `if`'s branches this
    /// still gets its own fresh name (there is only one control-flow path
    /// reading it afterward); inside a loop body it reuses the loop
    /// variable's existing name, since the target's native loop construct
    /// is itself the join point across iterations.
    Assign { name: Symbol, value: Box<Ir>, span: Span },
    /// The merge point after an `if` whose branches assign the same source
    /// binding to different values (spec §4.6). `then_value`/`else_value`
    /// are `Ident` references to whichever suffix each branch left that
    /// binding on, or the pre-`if` suffix for a branch that never assigned
    /// it.
    Phi { condition: Box<Ir>, then_value: Box<Ir>, else_value: Box<Ir>, span: Span },
    If { cond: Box<Ir>, then_branch: Vec<Ir>, else_branch: Vec<Ir>, span: Span },
    /// `while cond { body }` lowers to `Loop{ [if !cond { break }, ...body] }`
    /// (spec §4.6); a source `loop { ... }` (no condition) lowers directly.
    Loop { body: Vec<Ir>, span: Span },
    Break { span: Span },
    Continue { span: Span },
    Return { value: Option<Box<Ir>>, span: Span },
    Binary { op: BinOp, left: Box<Ir>, right: Box<Ir>, span: Span },
    Unary { op: UnOp, operand: Box<Ir>, span: Span },
    /// `callee` is the already-rewritten (post-monomorphization) function
    /// name; IR lowering never re-resolves overload sets, it trusts the
    /// identifier monomorphization left behind.
    Call { callee: Symbol, args: Vec<Ir>, span: Span },
    Member { object: Box<Ir>, field: Symbol, span: Span },
    /// Enum-tag read used by match lowering's discrimination cascade;
    /// distinct from `Member` so the optimizer and back ends can special
    /// -case it (a tag is always an integer, never user-visible data).
    Tag { object: Box<Ir>, span: Span },
    Index { object: Box<Ir>, index: Box<Ir>, span: Span },
    /// A write through a `Member`/`Index` place (`obj.field = v`, `arr[i] =
    /// v`). Plain identifier assignment uses `Assign`/the `Let`+`Phi` join
    /// instead; `Store` covers places an identifier suffix can't name.
    Store { place: Box<Ir>, value: Box<Ir>, span: Span },
    Ident { name: Symbol, span: Span },
    Number { value: f64, span: Span },
    Int { value: i64, span: Span },
    Str { value: Symbol, span: Span },
    Bool { value: bool, span: Span },
    Unit { span: Span },
    Aggregate { kind: AggregateKind, fields: Vec<Ir>, span: Span },
    Cast { value: Box<Ir>, kind: NumCastKind, span: Span },
    /// A lambda's body is lowered into its own [`Function`] (pushed onto the
    /// program's function list by the lowering pass); this node is what the
    /// expression position referencing it becomes. Capture is by plain
    /// lexical reference to every free variable the body mentions — no
    /// escape analysis, matching the abstract Non-goal that excludes
    /// "precise borrow/escape analysis".
    Closure { function: Symbol, captures: Vec<Symbol>, span: Span },
    Block { body: Vec<Ir>, span: Span },
}

impl Ir {
    pub fn span(&self) -> Span {
        match self {
            Ir::Let { span, .. }
            | Ir::Assign { span, .. }
            | Ir::Phi { span, .. }
            | Ir::If { span, .. }
            | Ir::Loop { span, .. }
            | Ir::Break { span }
            | Ir::Continue { span }
            | Ir::Return { span, .. }
            | Ir::Binary { span, .. }
            | Ir::Unary { span, .. }
            | Ir::Call { span, .. }
            | Ir::Member { span, .. }
            | Ir::Tag { span, .. }
            | Ir::Index { span, .. }
            | Ir::Store { span, .. }
            | Ir::Ident { span, .. }
            | Ir::Number { span, .. }
            | Ir::Int { span, .. }
            | Ir::Str { span, .. }
            | Ir::Bool { span, .. }
            | Ir::Unit { span }
            | Ir::Aggregate { span, .. }
            | Ir::Cast { span, .. }
            | Ir::Closure { span, .. }
            | Ir::Block { span, .. } => *span,
        }
    }

    /// True for nodes that are safe to drop if their value is unused: no
    /// side effect can be observed by removing them (spec §4.7 pass 2's
    /// purity rule, reused by pass 5's dead-store check: "only `Call` has
    /// side effects").
    pub fn is_pure(&self) -> bool {
        !matches!(self, Ir::Call { .. })
    }

    pub fn set_span(&mut self, new_span: Span) {
        let span = match self {
            Ir::Let { span, .. }
            | Ir::Assign { span, .. }
            | Ir::Phi { span, .. }
            | Ir::If { span, .. }
            | Ir::Loop { span, .. }
            | Ir::Break { span }
            | Ir::Continue { span }
            | Ir::Return { span, .. }
            | Ir::Binary { span, .. }
            | Ir::Unary { span, .. }
            | Ir::Call { span, .. }
            | Ir::Member { span, .. }
            | Ir::Tag { span, .. }
            | Ir::Index { span, .. }
            | Ir::Store { span, .. }
            | Ir::Ident { span, .. }
            | Ir::Number { span, .. }
            | Ir::Int { span, .. }
            | Ir::Str { span, .. }
            | Ir::Bool { span, .. }
            | Ir::Unit { span }
            | Ir::Aggregate { span, .. }
            | Ir::Cast { span, .. }
            | Ir::Closure { span, .. }
            | Ir::Block { span, .. } => span,
        };
        *span = new_span;
    }

    /// Direct expression-valued sub-nodes: every boxed `Ir` field plus each
    /// element of an expression-list field (`Call::args`,
    /// `Aggregate::fields`). Used by tree-rewrite passes (the optimizer)
    /// that fold bottom-up without caring whether a child sits in a `Box`
    /// or a `Vec`. Deliberately excludes the statement-sequence fields
    /// (`If`/`Loop`/`Block`'s bodies) — see [`Ir::blocks`] for those.
    pub fn children(&self) -> Vec<&Ir> {
        match self {
            Ir::Let { value, .. } | Ir::Assign { value, .. } => vec![value],
            Ir::Phi { condition, then_value, else_value, .. } => vec![condition, then_value, else_value],
            Ir::If { cond, .. } => vec![cond],
            Ir::Loop { .. } | Ir::Break { .. } | Ir::Continue { .. } | Ir::Unit { .. } | Ir::Ident { .. } | Ir::Number { .. } | Ir::Int { .. } | Ir::Str { .. } | Ir::Bool { .. } => {
                Vec::new()
            }
            Ir::Return { value, .. } => value.iter().map(|v| v.as_ref()).collect(),
            Ir::Binary { left, right, .. } => vec![left, right],
            Ir::Unary { operand, .. } => vec![operand],
            Ir::Call { args, .. } => args.iter().collect(),
            Ir::Member { object, .. } | Ir::Tag { object, .. } => vec![object],
            Ir::Index { object, index, .. } => vec![object, index],
            Ir::Store { place, value, .. } => vec![place, value],
            Ir::Aggregate { fields, .. } => fields.iter().collect(),
            Ir::Cast { value, .. } => vec![value],
            Ir::Closure { .. } => Vec::new(),
            Ir::Block { .. } => Vec::new(),
        }
    }

    pub fn children_mut(&mut self) -> Vec<&mut Ir> {
        match self {
            Ir::Let { value, .. } | Ir::Assign { value, .. } => vec![value],
            Ir::Phi { condition, then_value, else_value, .. } => vec![condition, then_value, else_value],
            Ir::If { cond, .. } => vec![cond],
            Ir::Loop { .. } | Ir::Break { .. } | Ir::Continue { .. } | Ir::Unit { .. } | Ir::Ident { .. } | Ir::Number { .. } | Ir::Int { .. } | Ir::Str { .. } | Ir::Bool { .. } => {
                Vec::new()
            }
            Ir::Return { value, .. } => value.iter_mut().map(|v| v.as_mut()).collect(),
            Ir::Binary { left, right, .. } => vec![left, right],
            Ir::Unary { operand, .. } => vec![operand],
            Ir::Call { args, .. } => args.iter_mut().collect(),
            Ir::Member { object, .. } | Ir::Tag { object, .. } => vec![object],
            Ir::Index { object, index, .. } => vec![object, index],
            Ir::Store { place, value, .. } => vec![place, value],
            Ir::Aggregate { fields, .. } => fields.iter_mut().collect(),
            Ir::Cast { value, .. } => vec![value],
            Ir::Closure { .. } => Vec::new(),
            Ir::Block { .. } => Vec::new(),
        }
    }

    /// The statement-sequence fields a tree-rewrite pass recurses into as
    /// their own nested scope: `If`'s two branches, `Loop`'s body,
    /// `Block`'s body.
    pub fn blocks(&self) -> Vec<&Vec<Ir>> {
        match self {
            Ir::If { then_branch, else_branch, .. } => vec![then_branch, else_branch],
            Ir::Loop { body, .. } | Ir::Block { body, .. } => vec![body],
            _ => Vec::new(),
        }
    }

    pub fn blocks_mut(&mut self) -> Vec<&mut Vec<Ir>> {
        match self {
            Ir::If { then_branch, else_branch, .. } => vec![then_branch, else_branch],
            Ir::Loop { body, .. } | Ir::Block { body, .. } => vec![body],
            _ => Vec::new(),
        }
    }
}
