//! The `List<T>` method set.

use std::sync::{Arc, Mutex};

use smallvec::smallvec;

use crate::{
    args::{BoundValues, CallArg},
    closure::Closure,
    error::{CodeLoc, RunError, RunResult},
    eval::Evaluator,
    value::{ListCell, Value, lock},
};

pub(super) fn call(
    ev: &Evaluator,
    cell: &Arc<Mutex<ListCell>>,
    method: &str,
    mut args: BoundValues,
    loc: CodeLoc,
) -> RunResult<Value> {
    match method {
        "size" => Ok(Value::Int(lock(cell).items.len() as i64)),
        "at" => {
            let index = args[0].as_int();
            let cell = lock(cell);
            let Some(item) = checked_index(index, cell.items.len()).map(|i| cell.items[i].clone()) else {
                return Err(out_of_range(index, cell.items.len(), loc));
            };
            Ok(item)
        }
        "push" => {
            lock(cell).items.push(args.remove(0));
            Ok(Value::Void)
        }
        "set" => {
            let index = args[0].as_int();
            let value = args.remove(1);
            let mut cell = lock(cell);
            let len = cell.items.len();
            let Some(slot) = checked_index(index, len).map(|i| &mut cell.items[i]) else {
                return Err(out_of_range(index, len, loc));
            };
            *slot = value;
            Ok(Value::Void)
        }
        "swap" => {
            let (i, j) = (args[0].as_int(), args[1].as_int());
            let mut cell = lock(cell);
            let len = cell.items.len();
            let (Some(i), Some(j)) = (checked_index(i, len), checked_index(j, len)) else {
                return Err(out_of_range(if checked_index(i, len).is_none() { i } else { j }, len, loc));
            };
            cell.items.swap(i, j);
            Ok(Value::Void)
        }
        "sort" => {
            let cmp = args[0].closure().clone();
            // Sort a snapshot so comparator calls never run under the cell
            // lock; the sorted items replace the buffer, so every alias of
            // this list observes the new order.
            let snapshot = lock(cell).items.clone();
            let sorted = merge_sort(ev, snapshot, &cmp, loc)?;
            lock(cell).items = sorted;
            Ok(Value::Void)
        }
        other => panic!("List has no method '{other}'"),
    }
}

fn checked_index(index: i64, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|i| *i < len)
}

fn out_of_range(index: i64, len: usize, loc: CodeLoc) -> RunError {
    RunError::panic(format!("list index {index} out of range (size {len})"), Some(loc))
}

/// Stable merge sort driven by a user "less-than" comparator.
///
/// Stability makes repeated sorts with the same comparator idempotent.
/// Comparator failures propagate, which rules out `slice::sort_by`.
fn merge_sort(ev: &Evaluator, mut items: Vec<Value>, cmp: &Arc<Closure>, loc: CodeLoc) -> RunResult<Vec<Value>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(ev, items, cmp, loc)?;
    let right = merge_sort(ev, right, cmp, loc)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        // Take from the right only when it is strictly less; ties keep the
        // left side first.
        if is_less(ev, cmp, r, l, loc)? {
            merged.push(right.next().expect("peeked"));
        } else {
            merged.push(left.next().expect("peeked"));
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn is_less(ev: &Evaluator, cmp: &Arc<Closure>, a: &Value, b: &Value, loc: CodeLoc) -> RunResult<bool> {
    let args = smallvec![CallArg::positional(a.clone()), CallArg::positional(b.clone())];
    Ok(ev.call_closure(cmp, args, Some(loc))?.as_bool())
}
