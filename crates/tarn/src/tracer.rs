//! Execution tracing hooks.
//!
//! The VM carries an [`EvalTracer`] and notifies it at coarse execution
//! events: module loads, function calls, fiber lifecycle. [`NoopTracer`] is
//! the production default; [`StderrTracer`] gives a human-readable log for
//! debugging. Fiber panics are reported here — a panicking fiber never
//! crashes the host, so the trace is the only place the failure surfaces.

/// Trait for VM execution tracing. All hooks default to no-ops, so
/// implementations only override what they care about. Hooks take `&self`
/// because the tracer is shared across fiber threads.
pub trait EvalTracer: Send + Sync {
    /// A module's top-level statements are about to be evaluated.
    fn on_module_load(&self, _path: &str) {}

    /// A closure call is about to run at the given depth.
    fn on_call(&self, _name: &str, _depth: usize) {}

    /// A fiber thread has started.
    fn on_fiber_start(&self, _id: u64) {}

    /// A fiber completed with an uncaught panic. `join()` on the fiber's
    /// handle still completes after this fires.
    fn on_fiber_panic(&self, _id: u64, _message: &str) {}

    /// A fiber was joined.
    fn on_fiber_join(&self, _id: u64) {}
}

/// Zero-cost no-op tracer (production default).
#[derive(Debug, Default)]
pub struct NoopTracer;

impl EvalTracer for NoopTracer {}

/// Human-readable execution log to stderr.
#[derive(Debug, Default)]
pub struct StderrTracer;

impl EvalTracer for StderrTracer {
    fn on_module_load(&self, path: &str) {
        eprintln!("[tarn] load module {path}");
    }

    fn on_call(&self, name: &str, depth: usize) {
        eprintln!("[tarn] call {name} (depth {depth})");
    }

    fn on_fiber_start(&self, id: u64) {
        eprintln!("[tarn] fiber {id} started");
    }

    fn on_fiber_panic(&self, id: u64, message: &str) {
        eprintln!("[tarn] fiber {id} panicked: {message}");
    }

    fn on_fiber_join(&self, id: u64) {
        eprintln!("[tarn] fiber {id} joined");
    }
}
