//! The `Result<V, E>` method set.

use crate::{
    error::{CodeLoc, RunError, RunResult},
    eval::Evaluator,
    value::{ResultCell, Value},
};

pub(super) fn call(
    ev: &Evaluator,
    cell: &ResultCell,
    method: &str,
    args: &[Value],
    loc: CodeLoc,
) -> RunResult<Value> {
    match method {
        "is_ok" => Ok(Value::Bool(cell.ok)),
        "is_err" => Ok(Value::Bool(!cell.ok)),
        "or" => Ok(if cell.ok { cell.inner.clone() } else { args[0].clone() }),
        "expect" => {
            if cell.ok {
                return Ok(cell.inner.clone());
            }
            let message = args[0].as_str();
            let payload = ev.render(&cell.inner)?;
            Err(RunError::panic(format!("{message}: {payload}"), Some(loc)))
        }
        other => panic!("Result has no method '{other}'"),
    }
}
