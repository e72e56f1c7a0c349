//! Shared helpers for building typed program trees.
//!
//! The front end (lexer, parser, checker) lives outside this crate, so the
//! suites construct the checked tree directly: every expression carries the
//! type the checker would have resolved for it.

#![allow(dead_code)]

use std::sync::Arc;

use indexmap::IndexMap;

use tarn::{
    CodeLoc, CollectStringPrint, NoopTracer, RunResult, Value, Vm,
    ast::{Arg, AssignTarget, BinaryOp, Block, CatchArm, Expr, ExprKind, Match, MatchArms, Module, Program, Stmt},
    types::{EnumDef, FunctionDef, Param, StructDef, StructId, Type},
};

pub fn loc() -> CodeLoc {
    CodeLoc::default()
}

// --- Expressions -----------------------------------------------------------

pub fn int(i: i64) -> Expr {
    Expr::new(ExprKind::Int(i), Type::Int, loc())
}

pub fn float(f: f64) -> Expr {
    Expr::new(ExprKind::Float(f), Type::Float, loc())
}

pub fn boolean(b: bool) -> Expr {
    Expr::new(ExprKind::Bool(b), Type::Bool, loc())
}

pub fn string(s: &str) -> Expr {
    Expr::new(ExprKind::Str(Arc::from(s)), Type::Str, loc())
}

pub fn ident(name: &str, ty: Type) -> Expr {
    Expr::new(ExprKind::Ident(Arc::from(name)), ty, loc())
}

pub fn template(parts: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Template(parts), Type::Str, loc())
}

pub fn list_lit(elem: Type, items: Vec<Expr>) -> Expr {
    let ty = Type::list(elem);
    Expr::new(ExprKind::ListLit(items), ty, loc())
}

pub fn map_lit(key: Type, value: Type, pairs: Vec<(Expr, Expr)>) -> Expr {
    let ty = Type::map(key, value);
    Expr::new(ExprKind::MapLit(pairs), ty, loc())
}

pub fn binary(op: BinaryOp, ty: Type, lhs: Expr, rhs: Expr) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        ty,
        loc(),
    )
}

pub fn and(lhs: Expr, rhs: Expr) -> Expr {
    Expr::new(
        ExprKind::And {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        Type::Bool,
        loc(),
    )
}

pub fn or(lhs: Expr, rhs: Expr) -> Expr {
    Expr::new(
        ExprKind::Or {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        Type::Bool,
        loc(),
    )
}

pub fn field(target: Expr, name: &str, ty: Type) -> Expr {
    Expr::new(
        ExprKind::Field {
            target: Box::new(target),
            name: Arc::from(name),
        },
        ty,
        loc(),
    )
}

pub fn call(callee: Expr, args: Vec<Arg>, ty: Type) -> Expr {
    Expr::new(
        ExprKind::Call {
            callee: Box::new(callee),
            args,
        },
        ty,
        loc(),
    )
}

pub fn method(target: Expr, name: &str, args: Vec<Arg>, ty: Type) -> Expr {
    Expr::new(
        ExprKind::MethodCall {
            target: Box::new(target),
            method: Arc::from(name),
            args,
        },
        ty,
        loc(),
    )
}

pub fn static_call(target: Type, name: &str, args: Vec<Arg>, ty: Type) -> Expr {
    Expr::new(
        ExprKind::StaticCall {
            target,
            name: Arc::from(name),
            args,
        },
        ty,
        loc(),
    )
}

pub fn module_call(module: &str, func: &str, args: Vec<Arg>, ty: Type) -> Expr {
    Expr::new(
        ExprKind::ModuleCall {
            module: Arc::from(module),
            func: Arc::from(func),
            args,
        },
        ty,
        loc(),
    )
}

pub fn lambda(def: Arc<FunctionDef>) -> Expr {
    let ty = Type::Function(Arc::new(tarn::types::FunctionSig {
        params: def.params.iter().map(|p| p.ty.clone()).collect(),
        ret: def.ret.clone(),
    }));
    Expr::new(ExprKind::Lambda(def), ty, loc())
}

pub fn try_expr(operand: Expr, catch: Option<(&str, Block)>, ty: Type) -> Expr {
    Expr::new(
        ExprKind::Try {
            operand: Box::new(operand),
            catch: catch.map(|(bind, body)| CatchArm {
                bind: Arc::from(bind),
                body,
            }),
        },
        ty,
        loc(),
    )
}

pub fn panic_expr(message: Expr) -> Expr {
    Expr::new(ExprKind::Panic(Box::new(message)), Type::Void, loc())
}

pub fn copy_expr(operand: Expr, ty: Type) -> Expr {
    Expr::new(ExprKind::Copy(Box::new(operand)), ty, loc())
}

pub fn if_expr(arms: Vec<(Expr, Block)>, fallback: Option<Block>, ty: Type) -> Expr {
    Expr::new(ExprKind::If { arms, fallback }, ty, loc())
}

pub fn match_expr(subject: Expr, arms: MatchArms, ty: Type) -> Expr {
    Expr::new(ExprKind::Match(Box::new(Match { subject, arms })), ty, loc())
}

pub fn struct_lit(def: &Arc<StructDef>, fields: Vec<(&str, Expr)>) -> Expr {
    let ty = Type::Struct(def.clone());
    Expr::new(
        ExprKind::StructLit {
            def: def.clone(),
            fields: fields.into_iter().map(|(name, value)| (Arc::from(name), value)).collect(),
        },
        ty,
        loc(),
    )
}

pub fn enum_lit(def: &Arc<EnumDef>, tag: usize) -> Expr {
    Expr::new(
        ExprKind::EnumLit {
            def: def.clone(),
            tag,
        },
        Type::Enum(def.clone()),
        loc(),
    )
}

pub fn positional(value: Expr) -> Arg {
    Arg::positional(value)
}

pub fn labelled(label: &str, value: Expr) -> Arg {
    Arg::labelled(label, value)
}

// --- Statements ------------------------------------------------------------

pub fn let_stmt(name: &str, ty: Type, value: Expr) -> Stmt {
    Stmt::Let {
        name: Arc::from(name),
        ty,
        mutable: false,
        value,
    }
}

pub fn mut_stmt(name: &str, ty: Type, value: Expr) -> Stmt {
    Stmt::Let {
        name: Arc::from(name),
        ty,
        mutable: true,
        value,
    }
}

pub fn assign_name(name: &str, value: Expr) -> Stmt {
    Stmt::Assign {
        target: AssignTarget::Name(Arc::from(name)),
        value,
    }
}

pub fn assign_field(base: Expr, path: Vec<&str>, value: Expr) -> Stmt {
    Stmt::Assign {
        target: AssignTarget::Field {
            base,
            path: path.into_iter().map(Arc::from).collect(),
        },
        value,
    }
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr(expr)
}

pub fn while_stmt(cond: Expr, body: Block) -> Stmt {
    Stmt::While { cond, body }
}

pub fn for_range(var: &str, start: Expr, end: Expr, body: Block) -> Stmt {
    Stmt::ForRange {
        var: Arc::from(var),
        start,
        end,
        body,
    }
}

pub fn for_in(bind: &str, bind_extra: Option<&str>, subject: Expr, body: Block) -> Stmt {
    Stmt::ForIn {
        bind: Arc::from(bind),
        bind_extra: bind_extra.map(Arc::from),
        subject,
        body,
    }
}

pub fn break_stmt() -> Stmt {
    Stmt::Break { loc: loc() }
}

pub fn block(stmts: Vec<Stmt>) -> Block {
    Block::new(stmts)
}

// --- Definitions -----------------------------------------------------------

pub fn param(name: &str, ty: Type) -> Param {
    Param::new(name, ty)
}

pub fn fn_def(name: &str, params: Vec<Param>, ret: Type, body: Block) -> Arc<FunctionDef> {
    Arc::new(FunctionDef {
        name: Arc::from(name),
        public: true,
        params,
        ret,
        body,
        loc: loc(),
    })
}

pub fn private_fn_def(name: &str, params: Vec<Param>, ret: Type, body: Block) -> Arc<FunctionDef> {
    Arc::new(FunctionDef {
        name: Arc::from(name),
        public: false,
        params,
        ret,
        body,
        loc: loc(),
    })
}

pub fn struct_def(
    id: u32,
    name: &str,
    fields: Vec<(&str, Type)>,
    methods: Vec<Arc<FunctionDef>>,
    statics: Vec<Arc<FunctionDef>>,
) -> Arc<StructDef> {
    let fields: IndexMap<String, Type> = fields.into_iter().map(|(name, ty)| (name.to_owned(), ty)).collect();
    Arc::new(StructDef {
        id: StructId(id),
        name: Arc::from(name),
        public: true,
        fields,
        methods,
        statics,
    })
}

pub fn enum_def(name: &str, variants: Vec<&str>) -> Arc<EnumDef> {
    Arc::new(EnumDef {
        name: Arc::from(name),
        public: true,
        variants: variants.into_iter().map(Arc::from).collect(),
        display_overrides: None,
    })
}

// --- Programs --------------------------------------------------------------

pub fn program(stmts: Vec<Stmt>) -> Program {
    program_with_modules(vec![("main", stmts)], "main")
}

pub fn program_with_modules(modules: Vec<(&str, Vec<Stmt>)>, entry: &str) -> Program {
    Program {
        modules: modules
            .into_iter()
            .map(|(path, stmts)| {
                Arc::new(Module {
                    path: Arc::from(path),
                    body: Block::new(stmts),
                })
            })
            .collect(),
        entry: Arc::from(entry),
    }
}

/// Runs a single-module program and returns its final value.
pub fn run_program(stmts: Vec<Stmt>) -> RunResult<Value> {
    Vm::new(program(stmts)).run()
}

/// Runs a single-module program, returning its final value and everything
/// it printed.
pub fn run_with_output(stmts: Vec<Stmt>) -> (RunResult<Value>, String) {
    let writer = CollectStringPrint::new();
    let handle = writer.handle();
    let vm = Vm::with_io(program(stmts), Box::new(writer), Arc::new(NoopTracer));
    let result = vm.run();
    let output = handle.lock().unwrap().clone();
    (result, output)
}

/// Asserts the program's final value is the given string.
pub fn assert_runs_to_str(stmts: Vec<Stmt>, expected: &str) {
    let value = run_program(stmts).unwrap();
    assert_eq!(&*value.as_str(), expected);
}

/// Asserts the program's final value is the given integer.
pub fn assert_runs_to_int(stmts: Vec<Stmt>, expected: i64) {
    let value = run_program(stmts).unwrap();
    assert_eq!(value.as_int(), expected);
}
