//! The `Map<K, V>` method set.

use std::sync::{Arc, Mutex};

use crate::{
    args::BoundValues,
    error::RunResult,
    value::{MapCell, MaybeCell, Value, lock},
};

pub(super) fn call(cell: &Arc<Mutex<MapCell>>, method: &str, mut args: BoundValues) -> RunResult<Value> {
    match method {
        "size" => Ok(Value::Int(lock(cell).entries.len() as i64)),
        // Original key objects, in no promised order (though consistent
        // within a run).
        "keys" => {
            let cell = lock(cell);
            let keys: Vec<Value> = cell.entries.values().map(|e| e.key.clone()).collect();
            Ok(Value::list(cell.key_ty.clone(), keys))
        }
        "get" => {
            let cell = lock(cell);
            Ok(Value::Maybe(Arc::new(MaybeCell {
                of: cell.val_ty.clone(),
                inner: cell.get(&args[0]),
            })))
        }
        "set" => {
            let value = args.remove(1);
            let key = args.remove(0);
            lock(cell).set(key, value);
            Ok(Value::Void)
        }
        "drop" => {
            lock(cell).remove(&args[0]);
            Ok(Value::Void)
        }
        "has" => Ok(Value::Bool(lock(cell).contains(&args[0]))),
        other => panic!("Map has no method '{other}'"),
    }
}
