//! The evaluator: statement and expression dispatch.
//!
//! Evaluation is single-threaded within one `Evaluator`; fibers get their
//! own instance sharing the global [`Vm`]. Dispatch is by node kind — the
//! checker already selected operator variants and match flavours, so no
//! type analysis happens here, only execution.
//!
//! Control flow that crosses statement boundaries travels through scope
//! flags (see [`crate::scope`]): `break` marks the nearest loop scope,
//! `try` early return marks every scope up to the enclosing function frame
//! and deposits the return value there. The statement loop checks its
//! scope's flag before each statement; function calls consume the deposited
//! value. Programmer panics travel as [`RunError`] instead, unwinding all
//! the way to the program entry or the fiber boundary.

use std::{cell::Cell, sync::Arc};

use smallvec::SmallVec;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    args::{ArgValues, CallArg, bind_args, into_values},
    ast::{Arg, AssignTarget, BinaryOp, Block, Expr, ExprKind, MatchArms, Stmt, UnaryOp},
    closure::{Closure, ClosureKind, RECEIVER_NAME},
    error::{CodeLoc, RunError, RunResult},
    methods,
    scope::Scope,
    types::{FunctionDef, Type},
    value::{EnumValue, MapEntry, Value, lock},
    vm::Vm,
};

/// Maximum nesting of closure calls before evaluation fails.
///
/// A guard, not a tuning knob: the tree-walker spends real stack per
/// language-level frame, and overflowing the thread stack would take the
/// whole process down instead of reporting a runtime panic.
pub const MAX_CALL_DEPTH: usize = 512;

/// A single-threaded evaluation context over a shared VM.
pub struct Evaluator {
    vm: Arc<Vm>,
    depth: Cell<usize>,
}

impl Evaluator {
    #[must_use]
    pub fn new(vm: Arc<Vm>) -> Self {
        Self {
            vm,
            depth: Cell::new(0),
        }
    }

    /// The global VM this evaluator runs against.
    #[must_use]
    pub fn vm(&self) -> &Arc<Vm> {
        &self.vm
    }

    /// Evaluates a module body in its top-level scope, returning the value
    /// of the final statement.
    pub fn eval_module(&self, body: &Block, scope: &Scope) -> RunResult<Value> {
        self.eval_block_in(body, scope)
    }

    /// Evaluates a block's statements in the given scope.
    ///
    /// Stops early when the scope is flagged (a `break` or `try` fired);
    /// the caller consults the scope afterwards.
    fn eval_block_in(&self, block: &Block, scope: &Scope) -> RunResult<Value> {
        let mut last = Value::Void;
        for stmt in &block.stmts {
            if scope.is_stopped() {
                break;
            }
            last = self.eval_stmt(stmt, scope)?;
        }
        Ok(last)
    }

    fn eval_stmt(&self, stmt: &Stmt, scope: &Scope) -> RunResult<Value> {
        match stmt {
            Stmt::Let {
                name,
                ty,
                mutable,
                value,
            } => {
                let mut evaluated = self.eval_expr(value, scope)?;
                // Immutable bindings hold logically independent values.
                if !mutable {
                    evaluated = evaluated.deep_copy();
                }
                scope.add(name.clone(), evaluated.refined(ty));
                Ok(Value::Void)
            }
            Stmt::Assign { target, value } => {
                self.eval_assign(target, value, scope)?;
                Ok(Value::Void)
            }
            Stmt::Expr(expr) => self.eval_expr(expr, scope),
            Stmt::While { cond, body } => {
                loop {
                    if scope.is_stopped() || !self.eval_expr(cond, scope)?.as_bool() {
                        break;
                    }
                    let body_scope = scope.child_breakable();
                    self.eval_block_in(body, &body_scope)?;
                    if body_scope.is_broken() || body_scope.is_stopped() {
                        break;
                    }
                }
                Ok(Value::Void)
            }
            Stmt::ForRange { var, start, end, body } => {
                let start = self.eval_expr(start, scope)?.as_int();
                let end = self.eval_expr(end, scope)?.as_int();
                for i in start..=end {
                    let body_scope = scope.child_breakable();
                    body_scope.add(var.clone(), Value::Int(i));
                    self.eval_block_in(body, &body_scope)?;
                    if body_scope.is_broken() || body_scope.is_stopped() {
                        break;
                    }
                }
                Ok(Value::Void)
            }
            Stmt::ForIn {
                bind,
                bind_extra,
                subject,
                body,
            } => self.eval_for_in(bind, bind_extra.as_ref(), subject, body, scope),
            Stmt::Break { loc: _ } => {
                scope.interrupt();
                Ok(Value::Void)
            }
            Stmt::Struct(def) => {
                self.vm.methods().register_struct(def, scope);
                Ok(Value::Void)
            }
            Stmt::Enum(_) => Ok(Value::Void),
            Stmt::Function(def) => {
                scope.add(
                    def.name.clone(),
                    Value::Closure(Arc::new(Closure::function(def.clone(), scope.clone()))),
                );
                Ok(Value::Void)
            }
            Stmt::ExternalFunction(def) => {
                scope.add(
                    def.name.clone(),
                    Value::Closure(Arc::new(Closure::foreign(def.clone(), scope.clone()))),
                );
                Ok(Value::Void)
            }
        }
    }

    /// Iteration over strings (grapheme, byte index), lists (element,
    /// ordinal), and maps (key, value). Aggregates iterate a snapshot, so
    /// body mutations do not disturb the traversal.
    fn eval_for_in(
        &self,
        bind: &Arc<str>,
        bind_extra: Option<&Arc<str>>,
        subject: &Expr,
        body: &Block,
        scope: &Scope,
    ) -> RunResult<Value> {
        let subject_value = self.eval_expr(subject, scope)?;
        let pairs: Vec<(Value, Value)> = match &subject_value {
            Value::Str(s) => s
                .grapheme_indices(true)
                .map(|(at, grapheme)| (Value::str(grapheme), Value::Int(at as i64)))
                .collect(),
            Value::List(cell) => lock(cell)
                .items
                .clone()
                .into_iter()
                .enumerate()
                .map(|(ordinal, item)| (item, Value::Int(ordinal as i64)))
                .collect(),
            Value::Map(cell) => lock(cell)
                .entries
                .values()
                .map(|MapEntry { key, value }| (key.clone(), value.clone()))
                .collect(),
            other => panic!("cannot iterate over {} values", other.kind_name()),
        };

        for (first, second) in pairs {
            let body_scope = scope.child_breakable();
            body_scope.add(bind.clone(), first);
            if let Some(extra) = bind_extra {
                body_scope.add(extra.clone(), second);
            }
            self.eval_block_in(body, &body_scope)?;
            if body_scope.is_broken() || body_scope.is_stopped() {
                break;
            }
        }
        Ok(Value::Void)
    }

    /// Reassignment: the target is evaluated before the value, and the
    /// mutation happens in place so aliases of the same cell observe it.
    fn eval_assign(&self, target: &AssignTarget, value: &Expr, scope: &Scope) -> RunResult<()> {
        match target {
            AssignTarget::Name(name) => {
                let evaluated = self.eval_expr(value, scope)?;
                scope.assign(name, evaluated);
            }
            AssignTarget::Field { base, path } => {
                let mut current = self.eval_expr(base, scope)?;
                let evaluated = self.eval_expr(value, scope)?;
                let (walk, last) = path.split_at(path.len() - 1);
                for step in walk {
                    let next = lock(current.struct_cell()).field(step);
                    current = next;
                }
                let cell = current.struct_cell().clone();
                let mut cell = lock(&cell);
                let name = &*last[0];
                assert!(
                    cell.fields.contains_key(name),
                    "struct {} has no field '{name}'",
                    cell.def.name
                );
                cell.fields.insert(name.to_owned(), evaluated);
            }
        }
        Ok(())
    }

    pub(crate) fn eval_expr(&self, expr: &Expr, scope: &Scope) -> RunResult<Value> {
        let loc = expr.loc;
        match &expr.kind {
            ExprKind::Void => Ok(Value::Void),
            ExprKind::Int(i) => Ok(Value::Int(*i)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),
            ExprKind::Template(parts) => {
                let mut rendered = String::new();
                for part in parts {
                    let value = self.eval_expr(part, scope)?;
                    rendered.push_str(&self.render(&value)?);
                }
                Ok(Value::str(rendered))
            }
            ExprKind::ListLit(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, scope)?);
                }
                let elem = match &expr.ty {
                    Type::List(elem) => (**elem).clone(),
                    other => other.clone(),
                };
                Ok(Value::list(elem, values))
            }
            ExprKind::MapLit(pairs) => {
                let (key_ty, val_ty) = match &expr.ty {
                    Type::Map(k, v) => ((**k).clone(), (**v).clone()),
                    other => (other.clone(), other.clone()),
                };
                let map = Value::map(key_ty, val_ty);
                for (key, value) in pairs {
                    let key = self.eval_expr(key, scope)?;
                    let value = self.eval_expr(value, scope)?;
                    lock(map.map_cell()).set(key, value);
                }
                Ok(map)
            }
            ExprKind::StructLit { def, fields } => {
                let mut evaluated: SmallVec<[(Arc<str>, Value); 8]> = SmallVec::new();
                for (name, value) in fields {
                    evaluated.push((name.clone(), self.eval_expr(value, scope)?));
                }
                // Initialisers run in source order; storage follows the
                // declaration order of the definition.
                let mut ordered = indexmap::IndexMap::default();
                for field_name in def.fields.keys() {
                    let Some(at) = evaluated.iter().position(|(name, _)| **name == **field_name) else {
                        panic!("struct {} literal is missing field '{field_name}'", def.name)
                    };
                    let (_, value) = evaluated.swap_remove(at);
                    ordered.insert(field_name.clone(), value);
                }
                Ok(Value::struct_instance(def.clone(), ordered))
            }
            ExprKind::EnumLit { def, tag } => Ok(Value::Enum(EnumValue {
                def: def.clone(),
                tag: *tag,
            })),
            ExprKind::Ident(name) => match scope.lookup(name) {
                Some(value) => Ok(value),
                None => panic!("unbound name '{name}'"),
            },
            ExprKind::Field { target, name } => {
                let target = self.eval_expr(target, scope)?;
                let field = lock(target.struct_cell()).field(name);
                Ok(field)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand, scope)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.as_bool())),
                    UnaryOp::NegInt => value
                        .as_int()
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| RunError::panic("integer overflow", Some(loc))),
                    UnaryOp::NegFloat => Ok(Value::Float(-value.as_float())),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval_expr(lhs, scope)?;
                let rhs = self.eval_expr(rhs, scope)?;
                eval_binary(*op, &lhs, &rhs, loc)
            }
            ExprKind::And { lhs, rhs } => {
                let lhs = self.eval_expr(lhs, scope)?;
                if lhs.as_bool() {
                    self.eval_expr(rhs, scope)
                } else {
                    Ok(lhs)
                }
            }
            ExprKind::Or { lhs, rhs } => {
                let lhs = self.eval_expr(lhs, scope)?;
                if lhs.as_bool() { Ok(lhs) } else { self.eval_expr(rhs, scope) }
            }
            ExprKind::If { arms, fallback } => {
                for (cond, block) in arms {
                    if self.eval_expr(cond, scope)?.as_bool() {
                        return self.eval_block_in(block, &scope.child());
                    }
                }
                match fallback {
                    Some(block) => self.eval_block_in(block, &scope.child()),
                    None => Ok(Value::Void),
                }
            }
            ExprKind::Match(matcher) => self.eval_match(matcher, scope),
            ExprKind::Call { callee, args } => {
                let callee = self.eval_expr(callee, scope)?;
                let closure = callee.closure().clone();
                let args = self.eval_args(args, scope)?;
                self.call_closure(&closure, args, Some(loc))
            }
            ExprKind::MethodCall { target, method, args } => {
                let receiver = self.eval_expr(target, scope)?;
                let args = self.eval_args(args, scope)?;
                methods::dispatch(self, &receiver, method, args, &expr.ty, loc)
            }
            ExprKind::StaticCall { target, name, args } => {
                let args = self.eval_args(args, scope)?;
                self.eval_static_call(target, name, args, &expr.ty, loc)
            }
            ExprKind::ModuleCall { module, func, args } => {
                let args = self.eval_args(args, scope)?;
                match self.vm.modules().lookup(module) {
                    Some(handler) => handler.handle(&self.vm, func, args, &expr.ty, loc),
                    // Unregistered module paths resolve straight through the
                    // foreign registry, so embedder modules need no handler.
                    None => self
                        .vm
                        .foreign()
                        .call(&format!("{module}.{func}"), &into_values(args), &expr.ty)
                        .map_err(|err| err.with_loc(loc)),
                }
            }
            ExprKind::Lambda(def) => Ok(Value::Closure(Arc::new(Closure::function(
                def.clone(),
                scope.clone(),
            )))),
            ExprKind::Try { operand, catch } => {
                let value = self.eval_expr(operand, scope)?;
                let failure = match &value {
                    Value::Result(cell) => {
                        if cell.ok {
                            return Ok(cell.inner.clone());
                        }
                        Some(cell.inner.clone())
                    }
                    Value::Maybe(cell) => match &cell.inner {
                        Some(inner) => return Ok(inner.clone()),
                        None => None,
                    },
                    other => panic!("try applied to a {} value", other.kind_name()),
                };
                match catch {
                    Some(arm) => {
                        let catch_scope = scope.child();
                        catch_scope.add(arm.bind.clone(), failure.unwrap_or(Value::Void));
                        let early = self.eval_block_in(&arm.body, &catch_scope)?;
                        scope.stop(early);
                    }
                    // No catch block: the unchanged failure value becomes
                    // the enclosing function's return value.
                    None => scope.stop(value),
                }
                Ok(Value::Void)
            }
            ExprKind::Panic(message) => {
                let value = self.eval_expr(message, scope)?;
                Err(RunError::panic(self.render(&value)?, Some(loc)))
            }
            ExprKind::Copy(operand) => Ok(self.eval_expr(operand, scope)?.deep_copy()),
        }
    }

    fn eval_match(&self, matcher: &crate::ast::Match, scope: &Scope) -> RunResult<Value> {
        let subject = self.eval_expr(&matcher.subject, scope)?;
        match &matcher.arms {
            MatchArms::Maybe { some_bind, some, none } => match &subject.maybe_cell().inner {
                Some(inner) => {
                    let branch = scope.child();
                    branch.add(some_bind.clone(), inner.clone());
                    self.eval_block_in(some, &branch)
                }
                None => self.eval_block_in(none, &scope.child()),
            },
            MatchArms::Result {
                ok_bind,
                ok,
                err_bind,
                err,
            } => {
                let cell = subject.result_cell();
                let branch = scope.child();
                if cell.ok {
                    branch.add(ok_bind.clone(), cell.inner.clone());
                    self.eval_block_in(ok, &branch)
                } else {
                    branch.add(err_bind.clone(), cell.inner.clone());
                    self.eval_block_in(err, &branch)
                }
            }
            MatchArms::Bool { truthy, falsy } => {
                let block = if subject.as_bool() { truthy } else { falsy };
                self.eval_block_in(block, &scope.child())
            }
            MatchArms::Enum { cases, fallback } => {
                let tag = match &subject {
                    Value::Enum(value) => value.tag,
                    other => panic!("enum match on a {} value", other.kind_name()),
                };
                if let Some((_, block)) = cases.iter().find(|(case, _)| *case == tag) {
                    return self.eval_block_in(block, &scope.child());
                }
                match fallback {
                    Some(block) => self.eval_block_in(block, &scope.child()),
                    None => panic!("no match arm for enum tag {tag}"),
                }
            }
            MatchArms::Union { cases, fallback } => {
                let type_name = subject.type_of().name();
                let block = cases
                    .iter()
                    .find(|(case, _)| **case == *type_name)
                    .map(|(_, block)| block)
                    .or(fallback.as_ref());
                let Some(block) = block else {
                    panic!("no match arm for type {type_name}")
                };
                let branch = scope.child();
                branch.add("it".into(), subject);
                self.eval_block_in(block, &branch)
            }
            MatchArms::Int {
                literals,
                ranges,
                fallback,
            } => {
                let subject = subject.as_int();
                if let Some((_, block)) = literals.iter().find(|(case, _)| *case == subject) {
                    return self.eval_block_in(block, &scope.child());
                }
                // Closed intervals, first match wins on overlap.
                if let Some((_, _, block)) = ranges.iter().find(|(lo, hi, _)| *lo <= subject && subject <= *hi) {
                    return self.eval_block_in(block, &scope.child());
                }
                match fallback {
                    Some(block) => self.eval_block_in(block, &scope.child()),
                    None => panic!("no match arm for integer {subject}"),
                }
            }
        }
    }

    fn eval_static_call(
        &self,
        target: &Type,
        name: &str,
        args: ArgValues,
        ret: &Type,
        loc: CodeLoc,
    ) -> RunResult<Value> {
        match target {
            Type::Struct(def) => {
                let Some(closure) = self.vm.methods().lookup_static(def.id, name) else {
                    panic!("struct {} has no static function '{name}'", def.name)
                };
                self.call_closure(&closure, args, Some(loc))
            }
            Type::Int if name == "from_str" => {
                let values = into_values(args);
                Ok(methods::number::int_from_str(&values[0].as_str()))
            }
            Type::Maybe(_) => {
                let mut values = into_values(args);
                match name {
                    "some" => Ok(Value::some(values.remove(0)).refined(ret)),
                    "none" => Ok(Value::none().refined(ret)),
                    other => panic!("Maybe has no static function '{other}'"),
                }
            }
            Type::Result(_, _) => {
                let mut values = into_values(args);
                match name {
                    "ok" => Ok(Value::ok(values.remove(0)).refined(ret)),
                    "err" => Ok(Value::err(values.remove(0)).refined(ret)),
                    other => panic!("Result has no static function '{other}'"),
                }
            }
            other => panic!("type {} has no static function '{name}'", other.name()),
        }
    }

    fn eval_args(&self, args: &[Arg], scope: &Scope) -> RunResult<ArgValues> {
        let mut evaluated: ArgValues = SmallVec::with_capacity(args.len());
        for arg in args {
            evaluated.push(CallArg {
                label: arg.label.clone(),
                value: self.eval_expr(&arg.value, scope)?,
            });
        }
        Ok(evaluated)
    }

    /// Invokes a closure with evaluated arguments.
    pub fn call_closure(&self, closure: &Arc<Closure>, args: ArgValues, loc: Option<CodeLoc>) -> RunResult<Value> {
        match closure.kind() {
            ClosureKind::Function(def) => self.invoke_user(def, closure.captured(), None, args, loc),
            ClosureKind::Method(_) => panic!("method closure invoked without a receiver"),
            ClosureKind::Foreign(def) => {
                let values = bind_args(&def.name, &def.params, args);
                self.vm
                    .foreign()
                    .call(&def.binding, &values, &def.ret)
                    .map_err(|err| match loc {
                        Some(loc) => err.with_loc(loc),
                        None => err,
                    })
            }
        }
    }

    /// Invokes a method closure with its receiver bound under `@`.
    pub fn call_method(
        &self,
        closure: &Arc<Closure>,
        receiver: Value,
        args: ArgValues,
        loc: Option<CodeLoc>,
    ) -> RunResult<Value> {
        match closure.kind() {
            ClosureKind::Method(def) => self.invoke_user(def, closure.captured(), Some(receiver), args, loc),
            _ => panic!("receiver passed to a non-method closure"),
        }
    }

    /// Runs a user function body in a fresh frame scope.
    ///
    /// The frame consumes `try` early returns: when the body deposited a
    /// stop value, that value wins over the block's own result.
    fn invoke_user(
        &self,
        def: &Arc<FunctionDef>,
        captured: &Scope,
        receiver: Option<Value>,
        args: ArgValues,
        loc: Option<CodeLoc>,
    ) -> RunResult<Value> {
        let depth = self.depth.get() + 1;
        if depth > MAX_CALL_DEPTH {
            return Err(RunError::panic(
                format!("maximum call depth exceeded in '{}'", def.name),
                loc,
            ));
        }
        self.depth.set(depth);
        self.vm.tracer().on_call(&def.name, depth);

        let frame = captured.child_frame();
        if let Some(receiver) = receiver {
            frame.add(RECEIVER_NAME.into(), receiver);
        }
        let bound = bind_args(&def.name, &def.params, args);
        for (param, value) in def.params.iter().zip(bound) {
            frame.add(param.name.clone(), value);
        }

        let result = self.eval_block_in(&def.body, &frame);
        self.depth.set(self.depth.get() - 1);

        let block_value = result?;
        if let Some(early) = frame.take_stop_value() {
            return Ok(early);
        }
        Ok(block_value)
    }

    /// Renders a value through its `to_str` capability.
    ///
    /// Structs with a registered `to_str` method use it; everything else
    /// uses the fixed rendering (`Int` decimal, `Float` two decimals, enum
    /// variant names, …).
    pub fn render(&self, value: &Value) -> RunResult<String> {
        if let Value::Struct(cell) = value {
            let def = lock(cell).def.clone();
            if let Some(to_str) = self.vm.methods().lookup_method(def.id, "to_str") {
                let rendered = self.call_method(&to_str, value.clone(), SmallVec::new(), None)?;
                return Ok(rendered.as_str().to_string());
            }
        }
        Ok(value.to_string())
    }
}

/// Executes a type-specialised binary operation.
fn eval_binary(op: BinaryOp, lhs: &Value, rhs: &Value, loc: CodeLoc) -> RunResult<Value> {
    let overflow = || RunError::panic(format!("integer overflow in {}", <&str>::from(op)), Some(loc));
    Ok(match op {
        BinaryOp::IntAdd => Value::Int(lhs.as_int().checked_add(rhs.as_int()).ok_or_else(overflow)?),
        BinaryOp::IntSub => Value::Int(lhs.as_int().checked_sub(rhs.as_int()).ok_or_else(overflow)?),
        BinaryOp::IntMul => Value::Int(lhs.as_int().checked_mul(rhs.as_int()).ok_or_else(overflow)?),
        BinaryOp::IntDiv => {
            let divisor = rhs.as_int();
            if divisor == 0 {
                return Err(RunError::panic("division by zero", Some(loc)));
            }
            Value::Int(lhs.as_int().checked_div(divisor).ok_or_else(overflow)?)
        }
        BinaryOp::IntMod => {
            let divisor = rhs.as_int();
            if divisor == 0 {
                return Err(RunError::panic("division by zero", Some(loc)));
            }
            Value::Int(lhs.as_int().checked_rem(divisor).ok_or_else(overflow)?)
        }
        BinaryOp::FloatAdd => Value::Float(lhs.as_float() + rhs.as_float()),
        BinaryOp::FloatSub => Value::Float(lhs.as_float() - rhs.as_float()),
        BinaryOp::FloatMul => Value::Float(lhs.as_float() * rhs.as_float()),
        BinaryOp::FloatDiv => Value::Float(lhs.as_float() / rhs.as_float()),
        BinaryOp::StrConcat => Value::str(format!("{}{}", lhs.as_str(), rhs.as_str())),
        BinaryOp::IntLt => Value::Bool(lhs.as_int() < rhs.as_int()),
        BinaryOp::IntLe => Value::Bool(lhs.as_int() <= rhs.as_int()),
        BinaryOp::IntGt => Value::Bool(lhs.as_int() > rhs.as_int()),
        BinaryOp::IntGe => Value::Bool(lhs.as_int() >= rhs.as_int()),
        BinaryOp::FloatLt => Value::Bool(lhs.as_float() < rhs.as_float()),
        BinaryOp::FloatLe => Value::Bool(lhs.as_float() <= rhs.as_float()),
        BinaryOp::FloatGt => Value::Bool(lhs.as_float() > rhs.as_float()),
        BinaryOp::FloatGe => Value::Bool(lhs.as_float() >= rhs.as_float()),
        BinaryOp::Eq => Value::Bool(lhs.equals(rhs)),
        BinaryOp::Ne => Value::Bool(!lhs.equals(rhs)),
    })
}
