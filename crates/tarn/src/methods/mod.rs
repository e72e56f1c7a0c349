//! Built-in method dispatch.
//!
//! Every primitive and aggregate type carries a fixed method set; struct
//! receivers go through the VM's method registry instead, and enum
//! receivers special-case `to_str`. Dispatch keys on the receiver's runtime
//! tag — the checker has already verified the method exists for the static
//! type, so an unknown name here is a toolchain bug.

use crate::{
    args::{ArgValues, into_values},
    error::{CodeLoc, RunResult},
    eval::Evaluator,
    types::Type,
    value::Value,
};

pub(crate) mod fiber;
pub(crate) mod list;
pub(crate) mod map;
pub(crate) mod maybe;
pub(crate) mod number;
pub(crate) mod result;
pub(crate) mod str;

/// Dispatches an instance method call on `recv`.
pub(crate) fn dispatch(
    ev: &Evaluator,
    recv: &Value,
    method: &str,
    args: ArgValues,
    ret: &Type,
    loc: CodeLoc,
) -> RunResult<Value> {
    match recv {
        Value::Str(s) => str::call(s, method, &into_values(args), loc),
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => number::call(recv, method, loc),
        Value::List(cell) => list::call(ev, cell, method, into_values(args), loc),
        Value::Map(cell) => map::call(cell, method, into_values(args)),
        Value::Maybe(cell) => maybe::call(cell, method, into_values(args)),
        Value::Result(cell) => result::call(ev, cell, method, &into_values(args), loc),
        Value::Fiber(cell) => fiber::call(ev, cell, method),
        Value::Struct(cell) => {
            let def = crate::value::lock(cell).def.clone();
            let Some(closure) = ev.vm().methods().lookup_method(def.id, method) else {
                panic!("struct {} has no method '{method}'", def.name)
            };
            ev.call_method(&closure, recv.clone(), args, Some(loc))
        }
        Value::Enum(value) => match method {
            "to_str" => {
                let _ = ret;
                Ok(Value::str(value.def.display_name(value.tag)))
            }
            other => panic!("enum {} has no method '{other}'", value.def.name),
        },
        other => panic!("no methods on {} values", other.kind_name()),
    }
}
