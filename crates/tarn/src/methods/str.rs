//! The `Str` method set.

use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use crate::{
    error::{CodeLoc, RunResult},
    types::Type,
    value::Value,
};

pub(super) fn call(recv: &Arc<str>, method: &str, args: &[Value], loc: CodeLoc) -> RunResult<Value> {
    let _ = loc;
    match method {
        // Grapheme count, consistent with string iteration.
        "size" => Ok(Value::Int(recv.graphemes(true).count() as i64)),
        "is_empty" => Ok(Value::Bool(recv.is_empty())),
        "contains" => Ok(Value::Bool(recv.contains(&*args[0].as_str()))),
        "starts_with" => Ok(Value::Bool(recv.starts_with(&*args[0].as_str()))),
        "trim" => Ok(Value::str(recv.trim())),
        "split" => {
            let sep = args[0].as_str();
            let pieces: Vec<Value> = if sep.is_empty() {
                recv.graphemes(true).map(Value::str).collect()
            } else {
                recv.split(&*sep).map(Value::str).collect()
            };
            Ok(Value::list(Type::Str, pieces))
        }
        "to_str" => Ok(Value::Str(recv.clone())),
        other => panic!("Str has no method '{other}'"),
    }
}
