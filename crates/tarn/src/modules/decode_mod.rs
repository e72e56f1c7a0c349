//! The `decode` module: extracting typed values out of `Dynamic` data.
//!
//! Every function returns `Result<_, Str>`. Failure messages for nested
//! lookups carry the field path with the outermost field first: `decode.at`
//! reports the prefix walked so far, so `user.address.city` failing at
//! `address` renders as `user.address: missing field`.

use std::sync::Arc;

use crate::{foreign::ForeignRegistry, types::Type, value::{Value, lock}};

pub(super) fn register(foreign: &ForeignRegistry) {
    register_typed(foreign, "decode.str", |payload| {
        payload
            .as_str()
            .map(Value::str)
            .ok_or_else(|| expected("Str", payload))
    });
    register_typed(foreign, "decode.int", |payload| {
        payload
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| expected("Int", payload))
    });
    register_typed(foreign, "decode.float", |payload| {
        payload
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| expected("Float", payload))
    });
    register_typed(foreign, "decode.bool", |payload| {
        payload
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| expected("Bool", payload))
    });
    register_typed(foreign, "decode.list", |payload| {
        payload
            .as_array()
            .map(|items| {
                Value::list(
                    Type::Dynamic,
                    items.iter().map(|item| Value::dynamic(item.clone())).collect(),
                )
            })
            .ok_or_else(|| expected("List", payload))
    });

    foreign
        .register(
            "decode.field",
            Arc::new(|args, ret| {
                let payload = args[0].dynamic_payload();
                let name = args[1].as_str();
                Ok(wrap(lookup_field(payload, &name), ret))
            }),
        )
        .expect("decode bindings are unique on a fresh registry");

    foreign
        .register(
            "decode.at",
            Arc::new(|args, ret| {
                let payload = args[0].dynamic_payload();
                let segments: Vec<Arc<str>> = lock(args[1].list_cell())
                    .items
                    .iter()
                    .map(Value::as_str)
                    .collect();

                let mut current = payload.clone();
                let mut walked: Vec<&str> = Vec::with_capacity(segments.len());
                for segment in &segments {
                    walked.push(segment);
                    match lookup_field(&current, segment) {
                        Ok(next) => current = next.dynamic_payload().clone(),
                        Err(reason) => {
                            return Ok(wrap(Err(format!("{}: {reason}", walked.join("."))), ret));
                        }
                    }
                }
                Ok(wrap(Ok(Value::dynamic(current)), ret))
            }),
        )
        .expect("decode bindings are unique on a fresh registry");
}

fn register_typed(
    foreign: &ForeignRegistry,
    key: &'static str,
    extract: impl Fn(&serde_json::Value) -> Result<Value, String> + Send + Sync + 'static,
) {
    foreign
        .register(
            key,
            Arc::new(move |args, ret| Ok(wrap(extract(args[0].dynamic_payload()), ret))),
        )
        .expect("decode bindings are unique on a fresh registry");
}

fn lookup_field(payload: &serde_json::Value, name: &str) -> Result<Value, String> {
    let Some(object) = payload.as_object() else {
        return Err(expected("object", payload));
    };
    object
        .get(name)
        .map(|field| Value::dynamic(field.clone()))
        .ok_or_else(|| format!("missing field '{name}'"))
}

fn wrap(outcome: Result<Value, String>, ret: &Type) -> Value {
    match outcome {
        Ok(value) => Value::ok(value).refined(ret),
        Err(reason) => Value::err(Value::str(reason)).refined(ret),
    }
}

fn expected(wanted: &str, payload: &serde_json::Value) -> String {
    format!("expected {wanted}, found {}", json_kind(payload))
}

fn json_kind(payload: &serde_json::Value) -> &'static str {
    match payload {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
