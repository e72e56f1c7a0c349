//! Method sets of `Int`, `Float`, and `Bool`, plus the `Int` statics.

use crate::{
    error::{CodeLoc, RunResult},
    value::Value,
};

pub(super) fn call(recv: &Value, method: &str, loc: CodeLoc) -> RunResult<Value> {
    let _ = loc;
    match (recv, method) {
        (Value::Int(i), "to_str") => Ok(Value::str(i.to_string())),
        (Value::Bool(b), "to_str") => Ok(Value::str(if *b { "true" } else { "false" })),
        // Fixed two-decimal rendering.
        (Value::Float(f), "to_str") => Ok(Value::str(format!("{f:.2}"))),
        // Truncation toward zero.
        (Value::Float(f), "to_int") => Ok(Value::Int(f.trunc() as i64)),
        (recv, method) => panic!("{} has no method '{method}'", recv.kind_name()),
    }
}

/// `Int::from_str`: parses a decimal integer, `None` on any mismatch.
#[must_use]
pub(crate) fn int_from_str(s: &str) -> Value {
    match s.trim().parse::<i64>() {
        Ok(i) => Value::some(Value::Int(i)),
        Err(_) => Value::none_of(crate::types::Type::Int),
    }
}
