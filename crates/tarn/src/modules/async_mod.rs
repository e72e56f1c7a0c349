//! The `async` module: fiber primitives.
//!
//! Unlike the other built-in modules this one does not route through the
//! foreign-function registry: spawning a fiber needs the VM itself, so the
//! module installs a direct handler.

use std::sync::Arc;

use crate::{
    args::{ArgValues, into_values},
    error::{CodeLoc, RunResult},
    fiber,
    registry::ModuleHandler,
    types::Type,
    value::Value,
};

pub(crate) struct AsyncModuleHandler;

impl ModuleHandler for AsyncModuleHandler {
    fn path(&self) -> &str {
        "async"
    }

    fn handle(
        &self,
        vm: &Arc<crate::vm::Vm>,
        call: &str,
        args: ArgValues,
        _ret: &Type,
        loc: CodeLoc,
    ) -> RunResult<Value> {
        let values = into_values(args);
        match call {
            "start" => {
                let closure = values[0].closure().clone();
                fiber::spawn(vm, closure, Type::Void).map_err(|err| err.with_loc(loc))
            }
            "eval" => {
                let closure = values[0].closure().clone();
                let result_ty = closure.return_type().clone();
                fiber::spawn(vm, closure, result_ty).map_err(|err| err.with_loc(loc))
            }
            "sleep" => {
                fiber::sleep(values[0].as_int());
                Ok(Value::Void)
            }
            other => panic!("async module has no function '{other}'"),
        }
    }
}
