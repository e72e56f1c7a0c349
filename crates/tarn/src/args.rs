//! Call-argument binding.
//!
//! Arguments arrive pre-evaluated, in source order, optionally labelled with
//! a parameter name. Binding reorders labelled arguments to their declared
//! positions, defaults omitted trailing `Maybe<T>` parameters to `None`, and
//! auto-wraps raw values into `Some` where an optional is expected. Arity
//! and label validity are checker guarantees; violations are fatal.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
    types::Param,
    value::Value,
};

/// A single evaluated argument.
#[derive(Debug)]
pub struct CallArg {
    pub label: Option<Arc<str>>,
    pub value: Value,
}

impl CallArg {
    #[must_use]
    pub fn positional(value: Value) -> Self {
        Self { label: None, value }
    }

    pub fn labelled(label: impl Into<Arc<str>>, value: Value) -> Self {
        Self {
            label: Some(label.into()),
            value,
        }
    }
}

/// Evaluated arguments for one call. Sized for the common short call.
pub type ArgValues = SmallVec<[CallArg; 4]>;

/// Positional values after binding.
pub type BoundValues = SmallVec<[Value; 4]>;

/// Discards labels, keeping values in source order.
///
/// Built-in methods and host-module natives take positional arguments only.
#[must_use]
pub fn into_values(args: ArgValues) -> BoundValues {
    args.into_iter().map(|arg| arg.value).collect()
}

/// Binds evaluated arguments against a parameter list.
///
/// # Panics
/// Panics on arity or label mismatches, which the checker rules out.
pub fn bind_args(fn_name: &str, params: &[Param], args: ArgValues) -> BoundValues {
    let mut labelled: SmallVec<[(Arc<str>, Value); 4]> = SmallVec::new();
    let mut positional: SmallVec<[Value; 4]> = SmallVec::new();
    for arg in args {
        match arg.label {
            Some(label) => labelled.push((label, arg.value)),
            None => positional.push(arg.value),
        }
    }
    let mut positional = positional.into_iter();

    let mut bound: BoundValues = SmallVec::with_capacity(params.len());
    for param in params {
        let value = if let Some(at) = labelled.iter().position(|(label, _)| **label == *param.name) {
            labelled.swap_remove(at).1
        } else if let Some(value) = positional.next() {
            value
        } else if let crate::types::Type::Maybe(inner) = &param.ty {
            Value::none_of((**inner).clone())
        } else {
            panic!("call to '{fn_name}': missing argument for parameter '{}'", param.name)
        };
        bound.push(wrap_optional(value, param));
    }

    assert!(
        positional.next().is_none() && labelled.is_empty(),
        "call to '{fn_name}': more arguments than parameters"
    );
    bound
}

/// Wraps a raw value into `Some` when the parameter expects an optional.
fn wrap_optional(value: Value, param: &Param) -> Value {
    if param.ty.is_maybe() && !matches!(value, Value::Maybe(_)) {
        return Value::some(value).refined(&param.ty);
    }
    value
}
