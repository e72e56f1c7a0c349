//! The typed program tree the evaluator consumes.
//!
//! The lexer, parser, and checker live outside this crate; what arrives here
//! is already resolved. Every expression carries its final [`Type`], every
//! call site carries its callee shape, match nodes are pre-sorted into the
//! five dispatch flavours, and binary operators are type-specialised. The
//! evaluator trusts these guarantees: no undefined references, correct arity
//! (subject to labelled-argument reorder and `Maybe` auto-wrap), exhaustive
//! matches.

use std::sync::Arc;

use strum::IntoStaticStr;

use crate::{
    error::CodeLoc,
    types::{EnumDef, ExternalFunctionDef, FunctionDef, StructDef, Type},
};

/// A complete, checked program: all loaded modules plus the entry path.
#[derive(Debug)]
pub struct Program {
    pub modules: Vec<Arc<Module>>,
    /// Path of the module evaluation starts from.
    pub entry: Arc<str>,
}

/// One program unit, keyed by its module path.
#[derive(Debug)]
pub struct Module {
    pub path: Arc<str>,
    pub body: Block,
}

/// A statement sequence. The block's value is the value of its final
/// expression statement, or `Void` when it ends with anything else.
#[derive(Debug, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    #[must_use]
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

/// A statement.
#[derive(Debug)]
pub enum Stmt {
    /// `let name = value` / `mut name = value`. The declared type is applied
    /// to the value at the binding point.
    Let {
        name: Arc<str>,
        ty: Type,
        mutable: bool,
        value: Expr,
    },
    /// Reassignment of a name or a field path.
    Assign { target: AssignTarget, value: Expr },
    /// An expression in statement position.
    Expr(Expr),
    While {
        cond: Expr,
        body: Block,
    },
    /// Inclusive numeric range loop.
    ForRange {
        var: Arc<str>,
        start: Expr,
        end: Expr,
        body: Block,
    },
    /// Iteration over a string, list, or map subject. The second binding is
    /// the byte index (strings), ordinal index (lists), or value (maps).
    ForIn {
        bind: Arc<str>,
        bind_extra: Option<Arc<str>>,
        subject: Expr,
        body: Block,
    },
    Break {
        loc: CodeLoc,
    },
    /// Struct declaration: registers methods and statics, produces no value.
    Struct(Arc<StructDef>),
    /// Enum declaration; variants are referenced through the definition.
    Enum(Arc<EnumDef>),
    /// Named function definition, bound as a closure in the current scope.
    Function(Arc<FunctionDef>),
    /// Foreign function declaration, bound as a foreign closure.
    ExternalFunction(Arc<ExternalFunctionDef>),
}

/// The left side of a reassignment.
#[derive(Debug)]
pub enum AssignTarget {
    Name(Arc<str>),
    /// `base.path[0].path[1]… = value`; every step but the last resolves to
    /// a struct value.
    Field { base: Expr, path: Vec<Arc<str>> },
}

/// A typed expression node.
#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    /// The checker's resolved type for this node.
    pub ty: Type,
    pub loc: CodeLoc,
}

impl Expr {
    #[must_use]
    pub fn new(kind: ExprKind, ty: Type, loc: CodeLoc) -> Self {
        Self { kind, ty, loc }
    }
}

/// A call argument, optionally labelled with a parameter name.
#[derive(Debug)]
pub struct Arg {
    pub label: Option<Arc<str>>,
    pub value: Expr,
}

impl Arg {
    #[must_use]
    pub fn positional(value: Expr) -> Self {
        Self { label: None, value }
    }

    pub fn labelled(label: impl Into<Arc<str>>, value: Expr) -> Self {
        Self {
            label: Some(label.into()),
            value,
        }
    }
}

/// An expression shape.
#[derive(Debug)]
pub enum ExprKind {
    Void,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Arc<str>),
    /// String template: chunks are rendered through `to_str` and joined in
    /// source order. Literal chunks are plain `Str` expressions.
    Template(Vec<Expr>),
    ListLit(Vec<Expr>),
    MapLit(Vec<(Expr, Expr)>),
    StructLit {
        def: Arc<StructDef>,
        /// Field initialisers in source order; the checker guarantees every
        /// declared field appears exactly once.
        fields: Vec<(Arc<str>, Expr)>,
    },
    EnumLit {
        def: Arc<EnumDef>,
        tag: usize,
    },
    /// Name lookup through the scope chain. The receiver inside methods is
    /// the reserved name `@`.
    Ident(Arc<str>),
    /// Struct field access.
    Field {
        target: Box<Expr>,
        name: Arc<str>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Type-specialised binary operation; the checker already selected the
    /// variant, the evaluator dispatches directly.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Short-circuit `and`: yields the left value when it is false.
    And {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Short-circuit `or`: yields the left value when it is true.
    Or {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `if` / `else if` chain with an optional trailing `else`.
    If {
        arms: Vec<(Expr, Block)>,
        fallback: Option<Block>,
    },
    Match(Box<Match>),
    /// Call of a first-class function value.
    Call {
        callee: Box<Expr>,
        args: Vec<Arg>,
    },
    /// Instance method call, dispatched on the receiver's runtime type.
    MethodCall {
        target: Box<Expr>,
        method: Arc<str>,
        args: Vec<Arg>,
    },
    /// Static call on a type: `Point::new(…)`, `Int::from_str(…)`.
    StaticCall {
        target: Type,
        name: Arc<str>,
        args: Vec<Arg>,
    },
    /// Module-qualified call routed through the module registry.
    ModuleCall {
        module: Arc<str>,
        func: Arc<str>,
        args: Vec<Arg>,
    },
    /// Anonymous function; captures the scope it is evaluated in.
    Lambda(Arc<FunctionDef>),
    /// The `try` operator, with an optional `-> name { … }` catch block.
    Try {
        operand: Box<Expr>,
        catch: Option<CatchArm>,
    },
    /// Unconditional unwind with a message.
    Panic(Box<Expr>),
    /// Explicit deep copy; inserted by the checker on mutable reassignment
    /// of immutable sources.
    Copy(Box<Expr>),
}

/// The catch block of a `try` expression.
#[derive(Debug)]
pub struct CatchArm {
    pub bind: Arc<str>,
    pub body: Block,
}

/// A pattern match, pre-sorted by subject type.
#[derive(Debug)]
pub struct Match {
    pub subject: Expr,
    pub arms: MatchArms,
}

/// The five match flavours, dispatched by the subject's checked type.
#[derive(Debug)]
pub enum MatchArms {
    Maybe {
        some_bind: Arc<str>,
        some: Block,
        none: Block,
    },
    Result {
        ok_bind: Arc<str>,
        ok: Block,
        err_bind: Arc<str>,
        err: Block,
    },
    Bool {
        truthy: Block,
        falsy: Block,
    },
    /// Cases keyed by variant tag, with an optional catch-all.
    Enum {
        cases: Vec<(usize, Block)>,
        fallback: Option<Block>,
    },
    /// Cases keyed by the concrete type name of the subject's runtime type.
    /// The chosen branch binds the subject under the literal name `it`.
    Union {
        cases: Vec<(Arc<str>, Block)>,
        fallback: Option<Block>,
    },
    /// Literal cases are searched before range cases; ranges are closed
    /// intervals and first match wins.
    Int {
        literals: Vec<(i64, Block)>,
        ranges: Vec<(i64, i64, Block)>,
        fallback: Option<Block>,
    },
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum UnaryOp {
    Not,
    NegInt,
    NegFloat,
}

/// Type-specialised binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum BinaryOp {
    IntAdd,
    IntSub,
    IntMul,
    IntDiv,
    IntMod,
    FloatAdd,
    FloatSub,
    FloatMul,
    FloatDiv,
    StrConcat,
    IntLt,
    IntLe,
    IntGt,
    IntGe,
    FloatLt,
    FloatLe,
    FloatGt,
    FloatGe,
    /// Structural for primitives, identity for aggregates.
    Eq,
    Ne,
}
