//! lumina-ast - AST node definitions
//!
//! These types describe the tree produced by the parser collaborator (out of
//! scope for this crate — see [`crate::ParsedProgram`]). Every node that can be
//! the target of a diagnostic or a type-map entry carries a stable [`NodeId`]
//! and a [`Span`]; HM inference and the semantic analyzer key their `id -> Type`
//! / `id -> inferred-call-signature` maps off these ids without ever mutating
//! the tree itself.

use lumina_util::{Span, Symbol};
use lumina_util::define_idx;

define_idx!(NodeId);

/// A parsed source file: an ordered list of top-level items.
#[derive(Debug, Clone)]
pub struct Program {
    pub items: Vec<Item>,
}

/// Top-level item in a source file.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: NodeId,
    pub span: Span,
    pub kind: ItemKind,
}

#[derive(Debug, Clone)]
pub enum ItemKind {
    Fn(FnItem),
    Struct(StructItem),
    Enum(EnumItem),
    Trait(TraitItem),
    Impl(ImplItem),
    Use(UseItem),
    Const(ConstItem),
    Static(StaticItem),
    TypeAlias(TypeAliasItem),
}

/// Function item.
#[derive(Debug, Clone)]
pub struct FnItem {
    pub name: Symbol,
    pub generics: Vec<GenericParam>,
    pub params: Vec<Param>,
    pub ret_type: Option<Type>,
    pub body: Block,
    pub visibility: Visibility,
    pub async_kw: bool,
    pub where_clause: Option<WhereClause>,
}

/// A generic parameter, either a type parameter or a `const N: <int-ty>` parameter.
///
/// `const_ty` is `Some` exactly for const-generic parameters; the semantic
/// analyzer rejects a `const_ty` that is not one of a fixed small set of
/// integer primitives (`CONST-INVALID-TYPE`).
#[derive(Debug, Clone)]
pub struct GenericParam {
    pub name: Symbol,
    pub bounds: Vec<Type>,
    pub const_ty: Option<Type>,
}

impl GenericParam {
    pub fn is_const(&self) -> bool {
        self.const_ty.is_some()
    }
}

/// Where clause constraint.
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub bounds: Vec<WhereBound>,
}

#[derive(Debug, Clone)]
pub struct WhereBound {
    pub ty: Type,
    pub traits: Vec<Path>,
}

/// How a function parameter binds its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByRef {
    /// `ref x`
    Ref,
    /// `ref mut x`
    RefMut,
}

/// Function parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Symbol,
    pub ty: Option<Type>,
    pub by_ref: Option<ByRef>,
    pub mutable: bool,
}

/// Structure item.
#[derive(Debug, Clone)]
pub struct StructItem {
    pub name: Symbol,
    pub generics: Vec<GenericParam>,
    pub fields: Vec<Field>,
    pub visibility: Visibility,
    pub where_clause: Option<WhereClause>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: Symbol,
    pub ty: Type,
    pub visibility: Visibility,
}

/// Enum item.
#[derive(Debug, Clone)]
pub struct EnumItem {
    pub name: Symbol,
    pub generics: Vec<GenericParam>,
    pub variants: Vec<Variant>,
    pub visibility: Visibility,
    pub where_clause: Option<WhereClause>,
}

#[derive(Debug, Clone)]
pub struct Variant {
    pub name: Symbol,
    pub data: VariantData,
}

#[derive(Debug, Clone)]
pub enum VariantData {
    Unit,
    Tuple(Vec<Type>),
    Struct(Vec<Field>),
}

/// Trait item (methods + associated types, optional supertraits).
#[derive(Debug, Clone)]
pub struct TraitItem {
    pub name: Symbol,
    pub generics: Vec<GenericParam>,
    pub items: Vec<TraitMember>,
    pub supertraits: Vec<Type>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone)]
pub enum TraitMember {
    Method(FnSig, Option<Block>),
    AssocType(Symbol, Vec<Type>),
    Const(Symbol, Type, Option<Expr>),
}

/// Function signature (without body) — used by trait method declarations.
#[derive(Debug, Clone)]
pub struct FnSig {
    pub name: Symbol,
    pub generics: Vec<GenericParam>,
    pub params: Vec<Param>,
    pub ret_type: Option<Type>,
}

/// Implementation block (methods + associated type bindings), for a concrete
/// or generic self-type.
#[derive(Debug, Clone)]
pub struct ImplItem {
    pub generics: Vec<GenericParam>,
    pub trait_ref: Option<Type>,
    pub self_ty: Type,
    pub items: Vec<ImplMember>,
    pub where_clause: Option<WhereClause>,
}

#[derive(Debug, Clone)]
pub enum ImplMember {
    Method(FnItem),
    AssocType(Symbol, Type),
    Const(Symbol, Type, Expr),
}

/// Use/import item.
#[derive(Debug, Clone)]
pub struct UseItem {
    pub path: Path,
    pub alias: Option<Symbol>,
    pub is_glob: bool,
}

#[derive(Debug, Clone)]
pub struct ConstItem {
    pub name: Symbol,
    pub ty: Type,
    pub value: Expr,
    pub visibility: Visibility,
}

#[derive(Debug, Clone)]
pub struct StaticItem {
    pub name: Symbol,
    pub ty: Type,
    pub value: Expr,
    pub mutable: bool,
    pub visibility: Visibility,
}

#[derive(Debug, Clone)]
pub struct TypeAliasItem {
    pub name: Symbol,
    pub generics: Vec<GenericParam>,
    pub ty: Type,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Visibility {
    Public,
    Private,
    Crate,
    Super,
    Restricted(Path),
}

/// Statement.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Let(LetStmt),
    Expr(Expr),
    Return(Option<Expr>),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Break(Option<Symbol>),
    Continue(Option<Symbol>),
    Item(Item),
}

#[derive(Debug, Clone)]
pub struct LetStmt {
    pub pattern: Pattern,
    pub ty: Option<Type>,
    pub init: Option<Expr>,
    pub mutable: bool,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_block: Block,
    pub else_clause: Option<Box<ElseClause>>,
}

#[derive(Debug, Clone)]
pub enum ElseClause {
    Block(Block),
    If(IfStmt),
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Block,
    pub label: Option<Symbol>,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub pattern: Pattern,
    pub iter: Expr,
    pub body: Block,
    pub label: Option<Symbol>,
}

/// Block expression: a sequence of statements with an optional trailing
/// (tail) expression.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: NodeId,
    pub stmts: Vec<Stmt>,
    pub trailing: Option<Box<Expr>>,
    pub span: Span,
}

/// Expression.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Path(Path),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Call(CallExpr),
    MethodCall(MethodCallExpr),
    Field(FieldExpr),
    Index(IndexExpr),
    Block(Block),
    If(IfExpr),
    Match(MatchExpr),
    Lambda(LambdaExpr),
    Assign(AssignExpr),
    CompoundAssign(CompoundAssignExpr),
    Return(Option<Box<Expr>>),
    Break(Option<Box<Expr>>, Option<Symbol>),
    Continue(Option<Symbol>),
    Tuple(Vec<Expr>),
    Array(Vec<Expr>),
    /// `[expr; size]` — `size` is a const expression, evaluated at
    /// monomorphization time (see `lumina_mono`'s const evaluator).
    ArrayRepeat { value: Box<Expr>, size: Box<ConstExpr> },
    /// `a..b` / `a..=b`, with either end optionally open.
    Range(RangeExpr),
    Cast(Box<Expr>, Type),
    Async(AsyncExpr),
    Await(Box<Expr>),
    /// `expr?`
    Try(Box<Expr>),
    /// `expr is Path(bindings...)` — narrowing test against an enum variant.
    Is(IsExpr),
    Select(SelectExpr),
    StructLiteral(Box<StructLiteralExpr>),
    EnumVariant(Box<EnumVariantExpr>),
}

/// Literal expression. Integer and float literals carry an optional type
/// suffix (`42i64`, `1.0f32`); an absent suffix defers to HM default-typing.
#[derive(Debug, Clone)]
pub enum Literal {
    Int { value: i64, suffix: Option<Symbol> },
    Float { value: f64, suffix: Option<Symbol> },
    String(Symbol),
    /// `"... {expr} ..."` — a sequence of literal chunks and embedded
    /// expressions. Each embedded expression must have non-void type
    /// (`STRING_INTERP_VOID`).
    InterpString(Vec<StringPart>),
    Char(char),
    Bool(bool),
    Unit,
}

#[derive(Debug, Clone)]
pub enum StringPart {
    Str(Symbol),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub ident: Symbol,
    pub args: Option<Vec<Type>>,
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnOp,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnOp {
    Neg,
    Not,
    BitNot,
}

/// Function call expression. `qualifier` is set for enum-qualified or
/// namespaced calls (`Status::new(...)`); otherwise the callee is resolved
/// from `func` alone. Qualified calls are never rewritten by monomorphization.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub func: Box<Expr>,
    pub args: Vec<Expr>,
    pub generics: Option<Vec<Type>>,
    pub qualifier: Option<Path>,
}

#[derive(Debug, Clone)]
pub struct MethodCallExpr {
    pub receiver: Box<Expr>,
    pub method: Symbol,
    pub generics: Option<Vec<Type>>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct FieldExpr {
    pub object: Box<Expr>,
    pub field: Symbol,
}

#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub object: Box<Expr>,
    pub index: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct IfExpr {
    pub cond: Box<Expr>,
    pub then_block: Block,
    pub else_block: Option<Box<Expr>>,
}

#[derive(Debug, Clone)]
pub struct MatchExpr {
    pub scrutinee: Box<Expr>,
    pub arms: Vec<MatchArm>,
}

#[derive(Debug, Clone)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
}

/// Lambda expression. Lumina has two surface forms: `fn(p) -> t { ... }`
/// (`FnKeyword`, body is always a block) and `|p| expr` (`Pipe`, body may be
/// a bare expression).
#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub params: Vec<Param>,
    pub ret_type: Option<Type>,
    pub body: Box<Expr>,
    pub form: LambdaForm,
    pub move_kw: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LambdaForm {
    FnKeyword,
    Pipe,
}

#[derive(Debug, Clone)]
pub struct AsyncExpr {
    pub body: Block,
    pub move_kw: bool,
}

#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub place: Box<Expr>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct CompoundAssignExpr {
    pub place: Box<Expr>,
    pub op: BinOp,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct RangeExpr {
    pub start: Option<Box<Expr>>,
    pub end: Option<Box<Expr>>,
    pub inclusive: bool,
}

/// `value is Path(bindings)` — narrowing test. `bindings` captures payload
/// fields of the tested variant into the `then` scope; see lumina-sem's
/// narrowing rule (§4.2 of the language's type-inference design).
#[derive(Debug, Clone)]
pub struct IsExpr {
    pub value: Box<Expr>,
    pub variant: Path,
    pub bindings: Vec<Pattern>,
}

/// `select! { arm, ... }` over a set of pending async operations.
#[derive(Debug, Clone)]
pub struct SelectExpr {
    pub arms: Vec<SelectArm>,
}

#[derive(Debug, Clone)]
pub struct SelectArm {
    pub future: Expr,
    pub binding: Option<Symbol>,
    pub body: Expr,
}

#[derive(Debug, Clone)]
pub struct StructLiteralExpr {
    pub path: Path,
    pub generics: Option<Vec<Type>>,
    pub fields: Vec<StructField>,
    pub base: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct StructField {
    pub name: Symbol,
    pub expr: Expr,
    pub is_shorthand: bool,
}

#[derive(Debug, Clone)]
pub struct EnumVariantExpr {
    pub path: Path,
    pub variant: Symbol,
    pub generics: Option<Vec<Type>>,
    pub data: EnumVariantData,
}

#[derive(Debug, Clone)]
pub enum EnumVariantData {
    Unit,
    Tuple(Vec<Expr>),
    Struct(Vec<StructField>),
}

/// Pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub id: NodeId,
    pub span: Span,
    pub kind: PatternKind,
}

#[derive(Debug, Clone)]
pub enum PatternKind {
    Wildcard,
    Ident(Symbol, Mutability),
    Literal(Literal),
    Path(Path),
    Struct(Path, Vec<FieldPattern>),
    TupleStruct(Path, Vec<Pattern>),
    Tuple(Vec<Pattern>),
    Slice(Vec<Pattern>),
}

#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub field: Symbol,
    pub pattern: Pattern,
}

/// Syntactic type expression, as written by the programmer. This is distinct
/// from `lumina_sem::types::Type`, the inferencer's internal representation;
/// the semantic analyzer lowers one to the other.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Unit,
    Never,
    Path(Path),
    Generic(Box<Type>, Vec<Type>),
    Reference(Box<Type>, Mutability),
    Slice(Box<Type>),
    /// `[T; N]` — `N` is a const expression, possibly referencing a bound
    /// const-generic parameter (checked by `CONST-UNBOUND-PARAM`).
    Array(Box<Type>, Box<ConstExpr>),
    Tuple(Vec<Type>),
    Fn(Vec<Type>, Box<Type>),
    Inferred,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutability {
    Mutable,
    Immutable,
}

/// A small const-expression grammar usable in array sizes and const-generic
/// arguments: literals, bound const-parameter references, and `+ - * /`.
/// Evaluated by `lumina_mono`'s const evaluator during monomorphization.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstExpr {
    Literal(i64),
    Param(Symbol),
    Binary(Box<ConstExpr>, ConstBinOp, Box<ConstExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstBinOp {
    Add,
    Sub,
    Mul,
    Div,
}
