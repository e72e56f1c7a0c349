//! The `float` module: conversions the `Float` method set does not cover.

use std::sync::Arc;

use crate::{foreign::ForeignRegistry, types::Type, value::Value};

pub(super) fn register(foreign: &ForeignRegistry) {
    foreign
        .register(
            "float.from_int",
            Arc::new(|args, _ret| Ok(Value::Float(args[0].as_int() as f64))),
        )
        .expect("float bindings are unique on a fresh registry");

    foreign
        .register(
            "float.parse",
            Arc::new(|args, _ret| {
                let s = args[0].as_str();
                Ok(match s.trim().parse::<f64>() {
                    Ok(f) if f.is_finite() => Value::some(Value::Float(f)),
                    _ => Value::none_of(Type::Float),
                })
            }),
        )
        .expect("float bindings are unique on a fresh registry");

    foreign
        .register(
            "float.floor",
            Arc::new(|args, _ret| Ok(Value::Int(args[0].as_float().floor() as i64))),
        )
        .expect("float bindings are unique on a fresh registry");

    foreign
        .register(
            "float.ceil",
            Arc::new(|args, _ret| Ok(Value::Int(args[0].as_float().ceil() as i64))),
        )
        .expect("float bindings are unique on a fresh registry");
}
