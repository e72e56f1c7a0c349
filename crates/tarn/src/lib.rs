#![doc = include_str!("../../../README.md")]
#![expect(clippy::cast_possible_truncation, reason = "numeric narrowing is checked")]
#![expect(clippy::cast_possible_wrap, reason = "length-to-Int casts stay within range")]

pub mod ast;
pub mod types;

mod args;
mod closure;
mod error;
mod eval;
mod fiber;
mod foreign;
mod io;
mod methods;
mod modules;
mod registry;
mod scope;
mod tracer;
mod value;
mod vm;

pub use crate::{
    args::{ArgValues, BoundValues, CallArg},
    closure::{Closure, ClosureKind, RECEIVER_NAME},
    error::{CodeLoc, RunError, RunResult},
    eval::{Evaluator, MAX_CALL_DEPTH},
    fiber::FiberCell,
    foreign::{DuplicateBinding, ForeignFn, ForeignRegistry},
    io::{CollectStringPrint, PrintWriter, StdPrint},
    registry::{MethodRegistry, ModuleHandler, ModuleRegistry},
    scope::Scope,
    tracer::{EvalTracer, NoopTracer, StderrTracer},
    value::{EnumValue, ListCell, MapCell, MapEntry, MaybeCell, ResultCell, StructCell, Value},
    vm::Vm,
};
