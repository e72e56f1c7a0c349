//! The `json` module: parsing and serialising JSON-shaped `Dynamic` data.
//!
//! Backed by `serde_json` with key order preserved, so `stringify` renders
//! object keys in insertion order.

use std::sync::Arc;

use crate::{foreign::ForeignRegistry, value::{Value, lock}};

pub(super) fn register(foreign: &ForeignRegistry) {
    foreign
        .register(
            "json.parse",
            Arc::new(|args, ret| {
                let text = args[0].as_str();
                let value = match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(payload) => Value::ok(Value::dynamic(payload)),
                    Err(e) => Value::err(Value::str(format!("invalid JSON: {e}"))),
                };
                Ok(value.refined(ret))
            }),
        )
        .expect("json bindings are unique on a fresh registry");

    foreign
        .register(
            "json.stringify",
            Arc::new(|args, ret| {
                let value = match to_json(&args[0]) {
                    Ok(payload) => Value::ok(Value::str(payload.to_string())),
                    Err(reason) => Value::err(Value::str(reason)),
                };
                Ok(value.refined(ret))
            }),
        )
        .expect("json bindings are unique on a fresh registry");
}

/// Converts a runtime value into a JSON payload.
///
/// Structs and maps become objects, lists become arrays, `Maybe` becomes
/// the inner value or `null`. Callables and fibers have no JSON form.
fn to_json(value: &Value) -> Result<serde_json::Value, String> {
    use serde_json::Value as Json;
    Ok(match value {
        Value::Void => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| format!("cannot serialise non-finite float {f}"))?,
        Value::Str(s) => Json::String(s.to_string()),
        Value::Enum(e) => Json::String(e.def.display_name(e.tag).to_string()),
        Value::Dynamic(payload) => (**payload).clone(),
        Value::List(cell) => {
            let items = lock(cell).items.clone();
            Json::Array(items.iter().map(to_json).collect::<Result<_, _>>()?)
        }
        Value::Map(cell) => {
            let entries: Vec<_> = lock(cell).entries.values().cloned().collect();
            let mut object = serde_json::Map::new();
            for entry in entries {
                object.insert(entry.key.canonical_key(), to_json(&entry.value)?);
            }
            Json::Object(object)
        }
        Value::Struct(cell) => {
            let fields = lock(cell).fields.clone();
            let mut object = serde_json::Map::new();
            for (name, field) in &fields {
                object.insert(name.clone(), to_json(field)?);
            }
            Json::Object(object)
        }
        Value::Maybe(cell) => match &cell.inner {
            Some(inner) => to_json(inner)?,
            None => Json::Null,
        },
        other @ (Value::Result(_) | Value::Closure(_) | Value::Fiber(_)) => {
            return Err(format!("cannot serialise {} values", other.kind_name()));
        }
    })
}
