//! Fiber spawn/join semantics, timing, and panic isolation.

mod common;

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use common::*;
use pretty_assertions::assert_eq;
use tarn::{CollectStringPrint, EvalTracer, Value, Vm, types::Type};

/// Tracer recording fiber lifecycle events for assertions.
#[derive(Debug, Default)]
struct RecordingTracer {
    panics: Mutex<Vec<String>>,
    joins: Mutex<Vec<u64>>,
}

impl EvalTracer for RecordingTracer {
    fn on_fiber_panic(&self, _id: u64, message: &str) {
        self.panics.lock().unwrap().push(message.to_owned());
    }

    fn on_fiber_join(&self, id: u64) {
        self.joins.lock().unwrap().push(id);
    }
}

fn sleeper(name: &str, millis: i64) -> Arc<tarn::types::FunctionDef> {
    fn_def(
        name,
        vec![],
        Type::Void,
        block(vec![expr_stmt(module_call(
            "async",
            "sleep",
            vec![positional(int(millis))],
            Type::Void,
        ))]),
    )
}

#[test]
fn three_sleeping_fibers_run_concurrently() {
    // Start fibers sleeping 500, 100, 100 ms and join all three: total time
    // is bounded by the slowest fiber, not the sum.
    let fiber_ty = Type::Fiber(Box::new(Type::Void));
    let stmts = vec![
        let_stmt(
            "f1",
            fiber_ty.clone(),
            module_call("async", "start", vec![positional(lambda(sleeper("s500", 500)))], fiber_ty.clone()),
        ),
        let_stmt(
            "f2",
            fiber_ty.clone(),
            module_call("async", "start", vec![positional(lambda(sleeper("s100a", 100)))], fiber_ty.clone()),
        ),
        let_stmt(
            "f3",
            fiber_ty.clone(),
            module_call("async", "start", vec![positional(lambda(sleeper("s100b", 100)))], fiber_ty.clone()),
        ),
        expr_stmt(method(ident("f1", fiber_ty.clone()), "join", vec![], Type::Void)),
        expr_stmt(method(ident("f2", fiber_ty.clone()), "join", vec![], Type::Void)),
        expr_stmt(method(ident("f3", fiber_ty), "join", vec![], Type::Void)),
    ];

    let started = Instant::now();
    let value = run_program(stmts).unwrap();
    let elapsed = started.elapsed().as_millis();

    assert!(matches!(value, Value::Void));
    assert!(elapsed >= 500, "joined before the slowest fiber finished ({elapsed}ms)");
    assert!(elapsed <= 1500, "fibers appear to have run sequentially ({elapsed}ms)");
}

#[test]
fn eval_fibers_deliver_their_computed_value() {
    // let f = async::eval(fn() Int { 21 * 2 }); f.get()
    let worker = fn_def(
        "worker",
        vec![],
        Type::Int,
        block(vec![expr_stmt(binary(
            tarn::ast::BinaryOp::IntMul,
            Type::Int,
            int(21),
            int(2),
        ))]),
    );
    let fiber_ty = Type::Fiber(Box::new(Type::Int));
    let stmts = vec![
        let_stmt(
            "f",
            fiber_ty.clone(),
            module_call("async", "eval", vec![positional(lambda(worker))], fiber_ty.clone()),
        ),
        expr_stmt(method(ident("f", fiber_ty), "get", vec![], Type::Int)),
    ];
    assert_runs_to_int(stmts, 42);
}

#[test]
fn fiber_panics_are_isolated_and_logged() {
    // A panicking fiber must not fail the host program; its join completes
    // and the panic surfaces through the tracer.
    let exploder = fn_def(
        "exploder",
        vec![],
        Type::Void,
        block(vec![expr_stmt(panic_expr(string("fiber went down")))]),
    );
    let fiber_ty = Type::Fiber(Box::new(Type::Void));
    let stmts = vec![
        let_stmt(
            "f",
            fiber_ty.clone(),
            module_call("async", "start", vec![positional(lambda(exploder))], fiber_ty.clone()),
        ),
        expr_stmt(method(ident("f", fiber_ty), "join", vec![], Type::Void)),
        expr_stmt(string("host survived")),
    ];

    let tracer = Arc::new(RecordingTracer::default());
    let vm = Vm::with_io(program(stmts), Box::new(CollectStringPrint::new()), tracer.clone());
    let value = vm.run().unwrap();

    assert_eq!(&*value.as_str(), "host survived");
    assert_eq!(tracer.panics.lock().unwrap().as_slice(), ["fiber went down"]);
    assert_eq!(tracer.joins.lock().unwrap().len(), 1);
}

#[test]
fn join_orders_fiber_effects_before_subsequent_reads() {
    // Everything the fiber printed is visible once join returns.
    let printer = fn_def(
        "printer",
        vec![],
        Type::Void,
        block(vec![expr_stmt(module_call(
            "io",
            "print",
            vec![positional(string("from fiber"))],
            Type::Void,
        ))]),
    );
    let fiber_ty = Type::Fiber(Box::new(Type::Void));
    let stmts = vec![
        let_stmt(
            "f",
            fiber_ty.clone(),
            module_call("async", "start", vec![positional(lambda(printer))], fiber_ty.clone()),
        ),
        expr_stmt(method(ident("f", fiber_ty), "join", vec![], Type::Void)),
        expr_stmt(module_call("io", "print", vec![positional(string("after join"))], Type::Void)),
    ];

    let writer = CollectStringPrint::new();
    let handle = writer.handle();
    let vm = Vm::with_io(program(stmts), Box::new(writer), Arc::new(tarn::NoopTracer));
    vm.run().unwrap();
    assert_eq!(&*handle.lock().unwrap(), "from fiber\nafter join\n");
}

#[test]
fn get_after_a_panicked_fiber_yields_void() {
    let exploder = fn_def(
        "exploder",
        vec![],
        Type::Int,
        block(vec![expr_stmt(panic_expr(string("boom")))]),
    );
    let fiber_ty = Type::Fiber(Box::new(Type::Int));
    let stmts = vec![
        let_stmt(
            "f",
            fiber_ty.clone(),
            module_call("async", "eval", vec![positional(lambda(exploder))], fiber_ty.clone()),
        ),
        expr_stmt(method(ident("f", fiber_ty), "get", vec![], Type::Int)),
    ];
    let tracer = Arc::new(RecordingTracer::default());
    let vm = Vm::with_io(program(stmts), Box::new(CollectStringPrint::new()), tracer.clone());
    let value = vm.run().unwrap();
    assert!(matches!(value, Value::Void));
    assert_eq!(tracer.panics.lock().unwrap().len(), 1);
}
