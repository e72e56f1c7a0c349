//! The `try` operator: unwrap on success, early return on failure.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use tarn::{ast::BinaryOp, ast::Stmt, types::Type};

fn err_expr(message: &str) -> tarn::ast::Expr {
    let ty = Type::result(Type::Str, Type::Str);
    static_call(ty.clone(), "err", vec![positional(string(message))], ty)
}

fn ok_expr(value: tarn::ast::Expr) -> tarn::ast::Expr {
    let ty = Type::result(Type::Int, Type::Str);
    static_call(ty.clone(), "ok", vec![positional(value)], ty)
}

#[test]
fn catch_block_value_becomes_the_early_return() {
    // fn f() Str {
    //   try Result::err("boom") -> e { "caught: {e}" }
    //   "unreached"
    // }
    // f()
    let f = fn_def(
        "f",
        vec![],
        Type::Str,
        block(vec![
            expr_stmt(try_expr(
                err_expr("boom"),
                Some((
                    "e",
                    block(vec![expr_stmt(template(vec![string("caught: "), ident("e", Type::Str)]))]),
                )),
                Type::Str,
            )),
            expr_stmt(string("unreached")),
        ]),
    );
    let stmts = vec![
        Stmt::Function(f),
        expr_stmt(call(ident("f", Type::Str), vec![], Type::Str)),
    ];
    assert_runs_to_str(stmts, "caught: boom");
}

#[test]
fn try_on_ok_unwraps_and_continues() {
    // fn f() Int { let x = try Result::ok(2); x + 1 }
    let f = fn_def(
        "f",
        vec![],
        Type::Int,
        block(vec![
            let_stmt("x", Type::Int, try_expr(ok_expr(int(2)), None, Type::Int)),
            expr_stmt(binary(BinaryOp::IntAdd, Type::Int, ident("x", Type::Int), int(1))),
        ]),
    );
    let stmts = vec![
        Stmt::Function(f),
        expr_stmt(call(ident("f", Type::Int), vec![], Type::Int)),
    ];
    assert_runs_to_int(stmts, 3);
}

#[test]
fn try_without_catch_surfaces_the_unchanged_error() {
    // fn f() Result<Str, Str> { try Result::err("bad"); Result::ok("done") }
    let result_ty = Type::result(Type::Str, Type::Str);
    let f = fn_def(
        "f",
        vec![],
        result_ty.clone(),
        block(vec![
            expr_stmt(try_expr(err_expr("bad"), None, Type::Str)),
            expr_stmt(static_call(
                result_ty.clone(),
                "ok",
                vec![positional(string("done"))],
                result_ty.clone(),
            )),
        ]),
    );
    let stmts = vec![
        Stmt::Function(f),
        expr_stmt(call(ident("f", result_ty.clone()), vec![], result_ty)),
    ];
    let value = run_program(stmts).unwrap();
    assert!(value.is_err());
    assert_eq!(&*value.result_cell().inner.as_str(), "bad");
}

#[test]
fn try_inside_a_loop_stops_the_whole_function() {
    // fn f() Result<Str, Str> {
    //   for i in 1..=10 { try Result::err("stop") }
    //   Result::ok("finished")
    // }
    let result_ty = Type::result(Type::Str, Type::Str);
    let f = fn_def(
        "f",
        vec![],
        result_ty.clone(),
        block(vec![
            for_range(
                "i",
                int(1),
                int(10),
                block(vec![expr_stmt(try_expr(err_expr("stop"), None, Type::Str))]),
            ),
            expr_stmt(static_call(
                result_ty.clone(),
                "ok",
                vec![positional(string("finished"))],
                result_ty.clone(),
            )),
        ]),
    );
    let stmts = vec![
        Stmt::Function(f),
        expr_stmt(call(ident("f", result_ty.clone()), vec![], result_ty)),
    ];
    let value = run_program(stmts).unwrap();
    assert!(value.is_err());
    assert_eq!(&*value.result_cell().inner.as_str(), "stop");
}

#[test]
fn statements_after_a_caught_try_do_not_run() {
    // mut witness = 0
    // fn f() Str { try Result::err("x") -> e { "caught" }; witness = 99; "tail" }
    // f(); witness
    let f = fn_def(
        "f",
        vec![],
        Type::Str,
        block(vec![
            expr_stmt(try_expr(
                err_expr("x"),
                Some(("e", block(vec![expr_stmt(string("caught"))]))),
                Type::Str,
            )),
            assign_name("witness", int(99)),
            expr_stmt(string("tail")),
        ]),
    );
    let stmts = vec![
        mut_stmt("witness", Type::Int, int(0)),
        Stmt::Function(f),
        expr_stmt(call(ident("f", Type::Str), vec![], Type::Str)),
        expr_stmt(ident("witness", Type::Int)),
    ];
    assert_runs_to_int(stmts, 0);
}

#[test]
fn stopping_is_consumed_by_the_nearest_function_frame() {
    // fn inner() Result<Str, Str> { try Result::err("inner failed"); Result::ok("?") }
    // fn outer() Str { inner(); "outer survived" }
    let result_ty = Type::result(Type::Str, Type::Str);
    let inner = fn_def(
        "inner",
        vec![],
        result_ty.clone(),
        block(vec![
            expr_stmt(try_expr(err_expr("inner failed"), None, Type::Str)),
            expr_stmt(static_call(
                result_ty.clone(),
                "ok",
                vec![positional(string("?"))],
                result_ty.clone(),
            )),
        ]),
    );
    let outer = fn_def(
        "outer",
        vec![],
        Type::Str,
        block(vec![
            expr_stmt(call(ident("inner", result_ty.clone()), vec![], result_ty)),
            expr_stmt(string("outer survived")),
        ]),
    );
    let stmts = vec![
        Stmt::Function(inner),
        Stmt::Function(outer),
        expr_stmt(call(ident("outer", Type::Str), vec![], Type::Str)),
    ];
    assert_runs_to_str(stmts, "outer survived");
}

#[test]
fn try_on_an_absent_maybe_returns_it() {
    // fn f() Maybe<Int> { try maybe::none(); maybe::some(1) }
    let maybe_ty = Type::maybe(Type::Int);
    let f = fn_def(
        "f",
        vec![],
        maybe_ty.clone(),
        block(vec![
            expr_stmt(try_expr(
                module_call("maybe", "none", vec![], maybe_ty.clone()),
                None,
                Type::Int,
            )),
            expr_stmt(module_call("maybe", "some", vec![positional(int(1))], maybe_ty.clone())),
        ]),
    );
    let stmts = vec![
        Stmt::Function(f),
        expr_stmt(call(ident("f", maybe_ty.clone()), vec![], maybe_ty)),
    ];
    let value = run_program(stmts).unwrap();
    assert!(value.is_none());
}

#[test]
fn panic_unwinds_to_the_program_entry() {
    let stmts = vec![
        expr_stmt(panic_expr(string("something broke"))),
        expr_stmt(string("unreached")),
    ];
    let err = run_program(stmts).unwrap_err();
    assert_eq!(err.message, "something broke");
    assert!(err.loc.is_some());
}
