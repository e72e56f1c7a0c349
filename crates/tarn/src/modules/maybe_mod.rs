//! The `maybe` module: `Maybe<T>` constructors.

use std::sync::Arc;

use crate::{foreign::ForeignRegistry, value::Value};

pub(super) fn register(foreign: &ForeignRegistry) {
    foreign
        .register(
            "maybe.some",
            Arc::new(|args, ret| Ok(Value::some(args[0].clone()).refined(ret))),
        )
        .expect("maybe bindings are unique on a fresh registry");

    foreign
        .register("maybe.none", Arc::new(|_args, ret| Ok(Value::none().refined(ret))))
        .expect("maybe bindings are unique on a fresh registry");
}
