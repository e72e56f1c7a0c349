//! The foreign-function boundary as seen from running programs.

mod common;

use std::sync::Arc;

use common::*;
use pretty_assertions::assert_eq;
use tarn::{Value, Vm, ast::Stmt, types::{ExternalFunctionDef, Param, Type}};

fn external_fn(name: &str, binding: &str, params: Vec<Param>, ret: Type) -> Arc<ExternalFunctionDef> {
    Arc::new(ExternalFunctionDef {
        name: name.into(),
        public: true,
        params,
        ret,
        binding: binding.into(),
    })
}

#[test]
fn embedder_modules_resolve_through_the_foreign_registry() {
    // No handler is registered for "host"; the call falls through to the
    // foreign table directly.
    let stmts = vec![expr_stmt(module_call(
        "host",
        "answer",
        vec![positional(int(2))],
        Type::Int,
    ))];
    let vm = Vm::new(program(stmts));
    vm.register_foreign("host.answer", Arc::new(|args, _ret| Ok(Value::Int(40 + args[0].as_int()))))
        .unwrap();
    assert_eq!(vm.run().unwrap().as_int(), 42);
}

#[test]
fn duplicate_registration_is_rejected() {
    let vm = Vm::new(program(vec![expr_stmt(int(0))]));
    vm.register_foreign("host.f", Arc::new(|_args, _ret| Ok(Value::Void))).unwrap();
    let err = vm
        .register_foreign("host.f", Arc::new(|_args, _ret| Ok(Value::Void)))
        .unwrap_err();
    assert!(err.message.contains("already registered"));
}

#[test]
fn declared_external_functions_are_plain_closures() {
    // extern fn greet(name Str) Str = "host.greet";  greet(name: "tarn")
    let greet = external_fn("greet", "host.greet", vec![Param::new("name", Type::Str)], Type::Str);
    let stmts = vec![
        Stmt::ExternalFunction(greet),
        expr_stmt(call(
            ident("greet", Type::Str),
            vec![labelled("name", string("tarn"))],
            Type::Str,
        )),
    ];
    let vm = Vm::new(program(stmts));
    vm.register_foreign(
        "host.greet",
        Arc::new(|args, _ret| Ok(Value::str(format!("hello {}", args[0].as_str())))),
    )
    .unwrap();
    assert_eq!(&*vm.run().unwrap().as_str(), "hello tarn");
}

#[test]
fn native_panics_become_err_when_the_signature_allows() {
    let result_ty = Type::result(Type::Str, Type::Str);
    let read = external_fn("read", "host.read", vec![], result_ty);
    let stmts = vec![
        Stmt::ExternalFunction(read.clone()),
        expr_stmt(call(ident("read", Type::Str), vec![], read.ret.clone())),
    ];
    let vm = Vm::new(program(stmts));
    vm.register_foreign("host.read", Arc::new(|_args, _ret| panic!("disk on fire")))
        .unwrap();
    let value = vm.run().unwrap();
    assert!(value.is_err());
    assert_eq!(
        &*value.result_cell().inner.as_str(),
        "panic in FFI function 'host.read': disk on fire"
    );
}

#[test]
fn native_panics_reraise_when_the_signature_cannot_absorb_them() {
    let read = external_fn("read", "host.read", vec![], Type::Str);
    let stmts = vec![
        Stmt::ExternalFunction(read),
        expr_stmt(call(ident("read", Type::Str), vec![], Type::Str)),
    ];
    let vm = Vm::new(program(stmts));
    vm.register_foreign("host.read", Arc::new(|_args, _ret| panic!("disk on fire")))
        .unwrap();
    let err = vm.run().unwrap_err();
    assert_eq!(err.message, "panic in FFI function 'host.read': disk on fire");
}

#[test]
fn unregistered_bindings_fail_with_a_clear_panic() {
    let stmts = vec![expr_stmt(module_call("host", "missing", vec![], Type::Void))];
    let err = Vm::new(program(stmts)).run().unwrap_err();
    assert!(err.message.contains("no foreign function registered for 'host.missing'"));
}

#[test]
fn json_and_decode_round_trip_dynamic_data() {
    // json::parse("{\"user\":{\"age\":30}}") |> decode.at(["user","age"]) |> decode.int
    let dynamic_result = Type::result(Type::Dynamic, Type::Str);
    let stmts = vec![
        let_stmt(
            "parsed",
            Type::Dynamic,
            method(
                module_call(
                    "json",
                    "parse",
                    vec![positional(string(r#"{"user":{"age":30}}"#))],
                    dynamic_result.clone(),
                ),
                "expect",
                vec![positional(string("parse failed"))],
                Type::Dynamic,
            ),
        ),
        let_stmt(
            "age_node",
            Type::Dynamic,
            method(
                module_call(
                    "decode",
                    "at",
                    vec![
                        positional(ident("parsed", Type::Dynamic)),
                        positional(list_lit(Type::Str, vec![string("user"), string("age")])),
                    ],
                    dynamic_result.clone(),
                ),
                "expect",
                vec![positional(string("lookup failed"))],
                Type::Dynamic,
            ),
        ),
        expr_stmt(method(
            module_call(
                "decode",
                "int",
                vec![positional(ident("age_node", Type::Dynamic))],
                Type::result(Type::Int, Type::Str),
            ),
            "expect",
            vec![positional(string("decode failed"))],
            Type::Int,
        )),
    ];
    assert_runs_to_int(stmts, 30);
}

#[test]
fn decode_errors_lead_with_the_outermost_field() {
    let dynamic_result = Type::result(Type::Dynamic, Type::Str);
    let stmts = vec![
        let_stmt(
            "parsed",
            Type::Dynamic,
            method(
                module_call(
                    "json",
                    "parse",
                    vec![positional(string(r#"{"user":{}}"#))],
                    dynamic_result.clone(),
                ),
                "expect",
                vec![positional(string("parse failed"))],
                Type::Dynamic,
            ),
        ),
        expr_stmt(method(
            module_call(
                "decode",
                "at",
                vec![
                    positional(ident("parsed", Type::Dynamic)),
                    positional(list_lit(Type::Str, vec![string("user"), string("address"), string("city")])),
                ],
                dynamic_result,
            ),
            "expect",
            vec![positional(string("lookup"))],
            Type::Dynamic,
        )),
    ];
    let err = run_program(stmts).unwrap_err();
    assert_eq!(err.message, "lookup: user.address: missing field 'address'");
}
