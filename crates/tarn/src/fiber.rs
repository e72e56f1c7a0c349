//! Fibers: coarse-grained concurrent evaluator instances.
//!
//! Each fiber runs on its own OS thread with a fresh evaluator stack,
//! sharing the global VM (module scopes, method registry, foreign
//! functions). Within a fiber evaluation is single-threaded and
//! synchronous; the platform scheduler interleaves fibers preemptively.
//!
//! Panics are isolated at the fiber boundary: an uncaught panic is reported
//! through the tracer and the fiber's `join()` still completes. The value of
//! a panicked fiber is `Void`.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    thread::JoinHandle,
    time::Duration,
};

use smallvec::SmallVec;

use crate::{
    closure::Closure,
    error::{RunError, RunResult},
    eval::Evaluator,
    types::Type,
    value::{Value, lock},
    vm::Vm,
};

static NEXT_FIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a spawned fiber. The only observable operations are `join()`
/// and, for fibers started through `async.eval`, `get()`.
#[derive(Debug)]
pub struct FiberCell {
    id: u64,
    result_ty: Type,
    state: Mutex<FiberState>,
}

#[derive(Debug)]
enum FiberState {
    Running(JoinHandle<RunResult<Value>>),
    Done(Value),
}

impl FiberCell {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The result type the fiber's closure computes.
    #[must_use]
    pub fn result_type(&self) -> &Type {
        &self.result_ty
    }
}

/// Spawns a fiber evaluating `closure` with no arguments.
///
/// The closure must be nullary with no mutable free captures; the checker
/// enforces this, so the runtime does not re-verify it.
pub fn spawn(vm: &Arc<Vm>, closure: Arc<Closure>, result_ty: Type) -> RunResult<Value> {
    let id = NEXT_FIBER_ID.fetch_add(1, Ordering::Relaxed);
    let thread_vm = vm.clone();
    let handle = std::thread::Builder::new()
        .name(format!("tarn-fiber-{id}"))
        .spawn(move || {
            thread_vm.tracer().on_fiber_start(id);
            let evaluator = Evaluator::new(thread_vm);
            evaluator.call_closure(&closure, SmallVec::new(), None)
        })
        .map_err(|e| RunError::panic(format!("failed to spawn fiber: {e}"), None))?;

    Ok(Value::Fiber(Arc::new(FiberCell {
        id,
        result_ty,
        state: Mutex::new(FiberState::Running(handle)),
    })))
}

/// Waits for the fiber to finish. Always completes; a panicked fiber is
/// reported through the tracer and leaves `Void` behind.
pub fn join(cell: &Arc<FiberCell>, vm: &Vm) {
    let mut state = lock(&cell.state);
    let current = std::mem::replace(&mut *state, FiberState::Done(Value::Void));
    match current {
        FiberState::Running(handle) => {
            let value = match handle.join() {
                Ok(Ok(value)) => value,
                Ok(Err(err)) => {
                    vm.tracer().on_fiber_panic(cell.id, &err.message);
                    Value::Void
                }
                // The fiber thread died on a native panic (an invariant
                // violation, not a language-level failure). Isolate it all
                // the same: the host must not go down with the fiber.
                Err(payload) => {
                    vm.tracer()
                        .on_fiber_panic(cell.id, &crate::foreign::panic_payload_message(payload.as_ref()));
                    Value::Void
                }
            };
            vm.tracer().on_fiber_join(cell.id);
            *state = FiberState::Done(value);
        }
        done @ FiberState::Done(_) => *state = done,
    }
}

/// The fiber's computed value, joining first when still running.
pub fn get(cell: &Arc<FiberCell>, vm: &Vm) -> Value {
    join(cell, vm);
    match &*lock(&cell.state) {
        FiberState::Done(value) => value.clone(),
        FiberState::Running(_) => unreachable!("fiber still running after join"),
    }
}

/// Cooperative sleep of the current fiber.
pub fn sleep(millis: i64) {
    if millis > 0 {
        #[expect(clippy::cast_sign_loss, reason = "guarded non-negative")]
        std::thread::sleep(Duration::from_millis(millis as u64));
    }
}
