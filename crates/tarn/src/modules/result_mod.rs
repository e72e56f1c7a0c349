//! The `result` module: `Result<V, E>` constructors.

use std::sync::Arc;

use crate::{foreign::ForeignRegistry, value::Value};

pub(super) fn register(foreign: &ForeignRegistry) {
    foreign
        .register(
            "result.ok",
            Arc::new(|args, ret| Ok(Value::ok(args[0].clone()).refined(ret))),
        )
        .expect("result bindings are unique on a fresh registry");

    foreign
        .register(
            "result.err",
            Arc::new(|args, ret| Ok(Value::err(args[0].clone()).refined(ret))),
        )
        .expect("result bindings are unique on a fresh registry");
}
