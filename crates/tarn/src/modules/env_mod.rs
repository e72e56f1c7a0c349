//! The `env` module: read access to the process environment.

use std::sync::Arc;

use crate::{foreign::ForeignRegistry, types::Type, value::Value};

pub(super) fn register(foreign: &ForeignRegistry) {
    foreign
        .register(
            "env.get",
            Arc::new(|args, _ret| {
                let name = args[0].as_str();
                Ok(match std::env::var(&*name) {
                    Ok(value) => Value::some(Value::str(value)),
                    Err(_) => Value::none_of(Type::Str),
                })
            }),
        )
        .expect("env bindings are unique on a fresh registry");

    foreign
        .register(
            "env.has",
            Arc::new(|args, _ret| {
                let name = args[0].as_str();
                Ok(Value::Bool(std::env::var_os(&*name).is_some()))
            }),
        )
        .expect("env bindings are unique on a fresh registry");
}
