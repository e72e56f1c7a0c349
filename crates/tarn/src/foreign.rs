//! The foreign-function registry: the core's bridge to the host.
//!
//! Natives are registered under `"module.symbol"` keys at startup (built-in
//! host modules) and by the embedder. Calls are wrapped in panic recovery so
//! no native unwind crosses the boundary untransformed: when the declared
//! return type is a `Result`, a native panic becomes `Result::err` carrying
//! the binding key; otherwise it re-raises as a runtime panic with the same
//! prefix.

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, RwLock},
};

use ahash::AHashMap;

use crate::{
    error::{RunError, RunResult},
    types::Type,
    value::Value,
};

/// Signature of a native function: pre-evaluated arguments plus the
/// declared return type of the call site.
pub type ForeignFn = Arc<dyn Fn(&[Value], &Type) -> RunResult<Value> + Send + Sync>;

/// Error returned when a binding key is already taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateBinding(pub String);

impl fmt::Display for DuplicateBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "foreign function '{}' is already registered", self.0)
    }
}

impl std::error::Error for DuplicateBinding {}

/// Thread-safe `"module.symbol"` to native function table.
///
/// Registration happens at startup (and from the embedder); lookups take
/// the read path, so fibers call concurrently without contention.
#[derive(Default)]
pub struct ForeignRegistry {
    table: RwLock<AHashMap<String, ForeignFn>>,
}

impl ForeignRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a native under `key`, rejecting duplicates.
    pub fn register(&self, key: impl Into<String>, f: ForeignFn) -> Result<(), DuplicateBinding> {
        let key = key.into();
        let mut table = self.table.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if table.contains_key(&key) {
            return Err(DuplicateBinding(key));
        }
        table.insert(key, f);
        Ok(())
    }

    /// Whether a native is bound under `key`.
    #[must_use]
    pub fn is_registered(&self, key: &str) -> bool {
        self.table
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(key)
    }

    /// Invokes the native bound under `key` with panic recovery.
    pub fn call(&self, key: &str, args: &[Value], declared_ret: &Type) -> RunResult<Value> {
        let native = {
            let table = self.table.read().unwrap_or_else(std::sync::PoisonError::into_inner);
            table.get(key).cloned()
        };
        let Some(native) = native else {
            return Err(RunError::panic(
                format!("no foreign function registered for '{key}'"),
                None,
            ));
        };

        match panic::catch_unwind(AssertUnwindSafe(|| native(args, declared_ret))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_payload_message(payload.as_ref());
                if declared_ret.is_result() {
                    Ok(Value::err(Value::str(format!(
                        "panic in FFI function '{key}': {message}"
                    ))))
                } else {
                    Err(RunError::ffi_panic(key, &message))
                }
            }
        }
    }
}

impl fmt::Debug for ForeignRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        f.debug_struct("ForeignRegistry")
            .field("bindings", &table.len())
            .finish()
    }
}

/// Extracts the human-readable message from a panic payload.
pub(crate) fn panic_payload_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
