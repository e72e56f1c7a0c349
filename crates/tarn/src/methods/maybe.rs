//! The `Maybe<T>` method set.

use crate::{
    args::BoundValues,
    error::RunResult,
    value::{MaybeCell, Value},
};

pub(super) fn call(cell: &MaybeCell, method: &str, mut args: BoundValues) -> RunResult<Value> {
    match method {
        "is_none" => Ok(Value::Bool(cell.inner.is_none())),
        "is_some" => Ok(Value::Bool(cell.inner.is_some())),
        "or" => Ok(match &cell.inner {
            Some(inner) => inner.clone(),
            None => args.remove(0),
        }),
        other => panic!("Maybe has no method '{other}'"),
    }
}
