//! The `Fiber<T>` method set.

use std::sync::Arc;

use crate::{
    error::RunResult,
    eval::Evaluator,
    fiber::{FiberCell, get, join},
    value::Value,
};

pub(super) fn call(ev: &Evaluator, cell: &Arc<FiberCell>, method: &str) -> RunResult<Value> {
    match method {
        "join" => {
            join(cell, ev.vm());
            Ok(Value::Void)
        }
        // Joins first when the fiber is still running; yields `Void` when
        // the fiber panicked (the panic was already reported at the
        // boundary).
        "get" => Ok(get(cell, ev.vm())),
        other => panic!("Fiber has no method '{other}'"),
    }
}
