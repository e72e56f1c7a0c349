//! Lexically nested environments.
//!
//! A [`Scope`] holds name-to-value bindings, a parent link, and the two
//! control-flow flags the evaluator steers by: `broken` (a `break` reached
//! this loop scope) and `stopped` (abort further statements in this frame).
//! Stopping propagates upward scope by scope until a consumer: the nearest
//! `breakable` scope for `break`, the enclosing function frame for `try`
//! early return.
//!
//! Scopes are shared-ownership values: closures capture their defining
//! scope, and fibers carry captured scopes across threads, so the binding
//! table sits behind a mutex. A scope never outlives its parent because the
//! parent link is owning.

use std::sync::{Arc, Mutex};

use ahash::AHashMap;

use crate::value::{Value, lock};

/// One lexical environment frame.
#[derive(Debug, Clone)]
pub struct Scope {
    inner: Arc<ScopeData>,
}

#[derive(Debug)]
struct ScopeData {
    vars: Mutex<AHashMap<Arc<str>, Value>>,
    parent: Option<Scope>,
    /// Loop-body scopes consume `break`.
    breakable: bool,
    /// Function-entry scopes consume `stop`.
    frame: bool,
    flags: Mutex<Flags>,
}

#[derive(Debug, Default)]
struct Flags {
    broken: bool,
    stopped: bool,
    /// Early-return value deposited by `stop`, consumed by the frame owner.
    stop_value: Option<Value>,
}

impl Scope {
    fn new(parent: Option<Self>, breakable: bool, frame: bool) -> Self {
        Self {
            inner: Arc::new(ScopeData {
                vars: Mutex::new(AHashMap::new()),
                parent,
                breakable,
                frame,
                flags: Mutex::new(Flags::default()),
            }),
        }
    }

    /// Creates a module top-level scope. It doubles as a frame so that stop
    /// propagation always terminates.
    #[must_use]
    pub fn module() -> Self {
        Self::new(None, false, true)
    }

    /// Creates a plain block scope.
    #[must_use]
    pub fn child(&self) -> Self {
        Self::new(Some(self.clone()), false, false)
    }

    /// Creates a loop-body scope: the nearest target for `break`.
    #[must_use]
    pub fn child_breakable(&self) -> Self {
        Self::new(Some(self.clone()), true, false)
    }

    /// Creates a function-entry scope on top of a captured scope.
    #[must_use]
    pub fn child_frame(&self) -> Self {
        Self::new(Some(self.clone()), false, true)
    }

    /// Introduces a binding in this scope, shadowing outer bindings of the
    /// same name.
    pub fn add(&self, name: Arc<str>, value: Value) {
        lock(&self.inner.vars).insert(name, value);
    }

    /// Resolves a name through the scope chain.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = lock(&current.inner.vars).get(name) {
                return Some(value.clone());
            }
            scope = current.inner.parent.as_ref();
        }
        None
    }

    /// Mutates the nearest binding of `name`.
    ///
    /// # Panics
    /// Panics when no binding exists; assignments are name-resolved by the
    /// checker, so a miss indicates a malformed program tree.
    pub fn assign(&self, name: &str, value: Value) {
        let mut scope = Some(self);
        while let Some(current) = scope {
            let mut vars = lock(&current.inner.vars);
            if let Some(slot) = vars.get_mut(name) {
                *slot = value;
                return;
            }
            drop(vars);
            scope = current.inner.parent.as_ref();
        }
        panic!("assignment to unbound name '{name}'");
    }

    /// Signals `break`: marks every scope up to and including the nearest
    /// breakable one as stopped, and that one as broken.
    ///
    /// # Panics
    /// Panics when no enclosing loop exists; the checker rejects stray
    /// `break` statements.
    pub fn interrupt(&self) {
        let mut scope = Some(self);
        while let Some(current) = scope {
            let mut flags = lock(&current.inner.flags);
            flags.stopped = true;
            if current.inner.breakable {
                flags.broken = true;
                return;
            }
            assert!(
                !current.inner.frame,
                "break outside of a loop reached a function boundary"
            );
            drop(flags);
            scope = current.inner.parent.as_ref();
        }
        unreachable!("scope chain ended before a frame scope");
    }

    /// Signals early return: marks every scope up to and including the
    /// enclosing function frame as stopped and deposits the return value
    /// there. Loop and block scopes relay without consuming.
    pub fn stop(&self, value: Value) {
        let mut scope = Some(self);
        while let Some(current) = scope {
            let mut flags = lock(&current.inner.flags);
            flags.stopped = true;
            if current.inner.frame {
                flags.stop_value = Some(value);
                return;
            }
            drop(flags);
            scope = current.inner.parent.as_ref();
        }
        unreachable!("scope chain ended before a frame scope");
    }

    /// Whether further statements in this scope should be skipped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        lock(&self.inner.flags).stopped
    }

    /// Whether a `break` targeted this scope.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        lock(&self.inner.flags).broken
    }

    /// Consumes the early-return value deposited on this frame, if any.
    #[must_use]
    pub fn take_stop_value(&self) -> Option<Value> {
        lock(&self.inner.flags).stop_value.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_parents() {
        let module = Scope::module();
        module.add("x".into(), Value::Int(1));
        let inner = module.child().child();
        assert!(inner.lookup("x").unwrap().equals(&Value::Int(1)));
        assert!(inner.lookup("y").is_none());
    }

    #[test]
    fn add_shadows_outer_binding() {
        let module = Scope::module();
        module.add("x".into(), Value::Int(1));
        let inner = module.child();
        inner.add("x".into(), Value::Int(2));
        assert!(inner.lookup("x").unwrap().equals(&Value::Int(2)));
        assert!(module.lookup("x").unwrap().equals(&Value::Int(1)));
    }

    #[test]
    fn assign_mutates_the_nearest_binding() {
        let module = Scope::module();
        module.add("x".into(), Value::Int(1));
        let inner = module.child();
        inner.assign("x", Value::Int(9));
        assert!(module.lookup("x").unwrap().equals(&Value::Int(9)));
    }

    #[test]
    fn interrupt_marks_up_to_the_nearest_loop() {
        let frame = Scope::module();
        let loop_scope = frame.child_breakable();
        let block = loop_scope.child();
        block.interrupt();
        assert!(block.is_stopped());
        assert!(loop_scope.is_broken());
        assert!(!frame.is_stopped());
    }

    #[test]
    fn stop_passes_through_loops_to_the_frame() {
        let module = Scope::module();
        let frame = module.child_frame();
        let loop_scope = frame.child_breakable();
        let block = loop_scope.child();
        block.stop(Value::Int(7));
        assert!(loop_scope.is_stopped());
        assert!(!loop_scope.is_broken());
        assert!(frame.is_stopped());
        assert!(frame.take_stop_value().unwrap().equals(&Value::Int(7)));
        assert!(!module.is_stopped());
    }
}
