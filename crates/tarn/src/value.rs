//! The runtime value cell.
//!
//! A [`Value`] pairs a payload with enough type information for dispatch.
//! Small immutable payloads (numbers, booleans, strings, enum variants) are
//! stored inline or behind a plain `Arc`; mutable aggregates (lists, maps,
//! structs) live in `Arc<Mutex<…>>` cells so that mutable bindings alias the
//! same buffer while fibers can carry captured values across threads.
//!
//! Accessors are tag-checked: asking for a payload variant that does not
//! match the value's tag is a programming error in the toolchain that
//! produced the tree, and fails hard rather than silently misbehaving.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use ahash::RandomState;
use indexmap::IndexMap;

use crate::{
    closure::Closure,
    fiber::FiberCell,
    types::{EnumDef, FunctionSig, StructDef, Type},
};

/// Locks a value cell, recovering from poisoning.
///
/// The checker rejects programs that share mutable state across fibers, so a
/// lock is never contended while its data is mid-mutation on another thread;
/// a poisoned mutex can only carry a fully written payload.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Backing store of a `List<T>` value.
#[derive(Debug)]
pub struct ListCell {
    /// Element type, narrowed at binding points.
    pub elem: Type,
    pub items: Vec<Value>,
}

/// One map entry: the original key object plus the mapped value.
///
/// Storage is addressed by the canonical key string; the original key is
/// kept so `keys()` can hand back what the program inserted.
#[derive(Debug, Clone)]
pub struct MapEntry {
    pub key: Value,
    pub value: Value,
}

/// Backing store of a `Map<K, V>` value, addressed by canonical key.
#[derive(Debug)]
pub struct MapCell {
    pub key_ty: Type,
    pub val_ty: Type,
    pub entries: IndexMap<String, MapEntry, RandomState>,
}

impl MapCell {
    /// Inserts or replaces the entry for `key`.
    pub fn set(&mut self, key: Value, value: Value) {
        self.entries.insert(key.canonical_key(), MapEntry { key, value });
    }

    /// Looks up the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries.get(&key.canonical_key()).map(|e| e.value.clone())
    }

    /// Removes the entry for `key`, returning whether one existed.
    pub fn remove(&mut self, key: &Value) -> bool {
        self.entries.shift_remove(&key.canonical_key()).is_some()
    }

    #[must_use]
    pub fn contains(&self, key: &Value) -> bool {
        self.entries.contains_key(&key.canonical_key())
    }
}

/// Backing store of a struct instance.
#[derive(Debug)]
pub struct StructCell {
    pub def: Arc<StructDef>,
    /// Field name to value, in declaration order.
    pub fields: IndexMap<String, Value, RandomState>,
}

impl StructCell {
    /// Reads a field.
    ///
    /// # Panics
    /// Panics when the field does not exist on this struct; field names are
    /// resolved by the checker.
    #[must_use]
    pub fn field(&self, name: &str) -> Value {
        match self.fields.get(name) {
            Some(value) => value.clone(),
            None => panic!("struct {} has no field '{name}'", self.def.name),
        }
    }
}

/// An enum variant instance: the definition plus a small integer tag.
#[derive(Debug, Clone)]
pub struct EnumValue {
    pub def: Arc<EnumDef>,
    pub tag: usize,
}

/// Payload of a `Maybe<T>` value.
#[derive(Debug)]
pub struct MaybeCell {
    /// The item type, narrowed at binding points.
    pub of: Type,
    /// `Some` payload, or `None` when absent.
    pub inner: Option<Value>,
}

/// Payload of a `Result<V, E>` value.
#[derive(Debug)]
pub struct ResultCell {
    pub ok_ty: Type,
    pub err_ty: Type,
    /// Whether `inner` is the success payload.
    pub ok: bool,
    pub inner: Value,
}

/// Primary runtime value type.
///
/// Cloning a `Value` is always cheap: aggregates clone their shared handle,
/// so `clone()` preserves aliasing. Logical copies are explicit via
/// [`Value::deep_copy`], which immutable bindings apply on entry.
#[derive(Debug, Clone)]
pub enum Value {
    Void,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<Mutex<ListCell>>),
    Map(Arc<Mutex<MapCell>>),
    Struct(Arc<Mutex<StructCell>>),
    Enum(EnumValue),
    Closure(Arc<Closure>),
    Maybe(Arc<MaybeCell>),
    Result(Arc<ResultCell>),
    /// Opaque host payload, typically JSON-shaped data.
    Dynamic(Arc<serde_json::Value>),
    /// Handle to a running or finished fiber.
    Fiber(Arc<FiberCell>),
}

impl Value {
    /// Builds a string value.
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Self::Str(s.into())
    }

    /// Builds a list with a known element type.
    #[must_use]
    pub fn list(elem: Type, items: Vec<Self>) -> Self {
        Self::List(Arc::new(Mutex::new(ListCell { elem, items })))
    }

    /// Builds an empty map with known key and value types.
    #[must_use]
    pub fn map(key_ty: Type, val_ty: Type) -> Self {
        Self::Map(Arc::new(Mutex::new(MapCell {
            key_ty,
            val_ty,
            entries: IndexMap::default(),
        })))
    }

    /// Builds a struct instance from its definition and field values.
    #[must_use]
    pub fn struct_instance(def: Arc<StructDef>, fields: IndexMap<String, Self, RandomState>) -> Self {
        Self::Struct(Arc::new(Mutex::new(StructCell { def, fields })))
    }

    /// Builds a present `Maybe`, typed after the payload.
    #[must_use]
    pub fn some(value: Self) -> Self {
        let of = value.type_of();
        Self::Maybe(Arc::new(MaybeCell {
            of,
            inner: Some(value),
        }))
    }

    /// Builds an absent `Maybe` with an unresolved item type; the binding
    /// point narrows it.
    #[must_use]
    pub fn none() -> Self {
        Self::none_of(Type::Generic("T".into()))
    }

    /// Builds an absent `Maybe` with a known item type.
    #[must_use]
    pub fn none_of(of: Type) -> Self {
        Self::Maybe(Arc::new(MaybeCell { of, inner: None }))
    }

    /// Builds `Result::ok(value)`.
    #[must_use]
    pub fn ok(value: Self) -> Self {
        let ok_ty = value.type_of();
        Self::Result(Arc::new(ResultCell {
            ok_ty,
            err_ty: Type::Generic("E".into()),
            ok: true,
            inner: value,
        }))
    }

    /// Builds `Result::err(error)`.
    #[must_use]
    pub fn err(error: Self) -> Self {
        let err_ty = error.type_of();
        Self::Result(Arc::new(ResultCell {
            ok_ty: Type::Generic("V".into()),
            err_ty,
            ok: false,
            inner: error,
        }))
    }

    /// Wraps a host payload.
    #[must_use]
    pub fn dynamic(payload: serde_json::Value) -> Self {
        Self::Dynamic(Arc::new(payload))
    }

    /// Short variant name used in diagnostics and mismatch messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Void => "Void",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Str(_) => "Str",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
            Self::Struct(_) => "Struct",
            Self::Enum(_) => "Enum",
            Self::Closure(_) => "Closure",
            Self::Maybe(_) => "Maybe",
            Self::Result(_) => "Result",
            Self::Dynamic(_) => "Dynamic",
            Self::Fiber(_) => "Fiber",
        }
    }

    /// The runtime type of this value, reflecting any refinement applied so
    /// far. Union-match dispatch keys on this type's name.
    #[must_use]
    pub fn type_of(&self) -> Type {
        match self {
            Self::Void => Type::Void,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Str(_) => Type::Str,
            Self::List(cell) => Type::list(lock(cell).elem.clone()),
            Self::Map(cell) => {
                let cell = lock(cell);
                Type::map(cell.key_ty.clone(), cell.val_ty.clone())
            }
            Self::Struct(cell) => Type::Struct(lock(cell).def.clone()),
            Self::Enum(value) => Type::Enum(value.def.clone()),
            Self::Closure(closure) => Type::Function(Arc::new(FunctionSig {
                params: closure.param_types(),
                ret: closure.return_type().clone(),
            })),
            Self::Maybe(cell) => Type::maybe(cell.of.clone()),
            Self::Result(cell) => Type::result(cell.ok_ty.clone(), cell.err_ty.clone()),
            Self::Dynamic(_) => Type::Dynamic,
            Self::Fiber(cell) => Type::Fiber(Box::new(cell.result_type().clone())),
        }
    }

    /// Narrows generic type parameters from the declared type at a binding
    /// point. Aggregate cells are updated in place; wrapper values are
    /// rebuilt. Payloads are never touched.
    #[must_use]
    pub fn refined(self, declared: &Type) -> Self {
        match (self, declared) {
            (Self::List(cell), Type::List(elem)) => {
                lock(&cell).elem = (**elem).clone();
                Self::List(cell)
            }
            (Self::Map(cell), Type::Map(key_ty, val_ty)) => {
                {
                    let mut data = lock(&cell);
                    data.key_ty = (**key_ty).clone();
                    data.val_ty = (**val_ty).clone();
                }
                Self::Map(cell)
            }
            (Self::Maybe(cell), Type::Maybe(of)) => Self::Maybe(Arc::new(MaybeCell {
                of: (**of).clone(),
                inner: cell.inner.clone(),
            })),
            (Self::Result(cell), Type::Result(ok_ty, err_ty)) => Self::Result(Arc::new(ResultCell {
                ok_ty: (**ok_ty).clone(),
                err_ty: (**err_ty).clone(),
                ok: cell.ok,
                inner: cell.inner.clone(),
            })),
            (other, _) => other,
        }
    }

    /// Produces a logically independent copy.
    ///
    /// Aggregates copy their buffers recursively; immutable payloads
    /// (strings, enum variants, closures, host data) are shared.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::List(cell) => {
                let cell = lock(cell);
                Self::list(cell.elem.clone(), cell.items.iter().map(Self::deep_copy).collect())
            }
            Self::Map(cell) => {
                let cell = lock(cell);
                let mut entries: IndexMap<String, MapEntry, RandomState> = IndexMap::default();
                for (canonical, entry) in &cell.entries {
                    // The original key object is shared: copying it would
                    // detach identity-keyed entries from their canonical key.
                    entries.insert(
                        canonical.clone(),
                        MapEntry {
                            key: entry.key.clone(),
                            value: entry.value.deep_copy(),
                        },
                    );
                }
                Self::Map(Arc::new(Mutex::new(MapCell {
                    key_ty: cell.key_ty.clone(),
                    val_ty: cell.val_ty.clone(),
                    entries,
                })))
            }
            Self::Struct(cell) => {
                let cell = lock(cell);
                let fields = cell
                    .fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.deep_copy()))
                    .collect();
                Self::Struct(Arc::new(Mutex::new(StructCell {
                    def: cell.def.clone(),
                    fields,
                })))
            }
            Self::Maybe(cell) => Self::Maybe(Arc::new(MaybeCell {
                of: cell.of.clone(),
                inner: cell.inner.as_ref().map(Self::deep_copy),
            })),
            Self::Result(cell) => Self::Result(Arc::new(ResultCell {
                ok_ty: cell.ok_ty.clone(),
                err_ty: cell.err_ty.clone(),
                ok: cell.ok,
                inner: cell.inner.deep_copy(),
            })),
            other => other.clone(),
        }
    }

    /// Value equality as exposed through the `==` operator.
    ///
    /// Structural for primitives, identity for aggregates, component-wise
    /// for `Maybe`. Values of different kinds never compare equal, and
    /// neither do instances of distinct nominal types.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Void, Self::Void) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            #[expect(clippy::float_cmp, reason = "language equality is exact")]
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => Arc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            (Self::Struct(a), Self::Struct(b)) => Arc::ptr_eq(a, b),
            (Self::Enum(a), Self::Enum(b)) => a.def.name == b.def.name && a.tag == b.tag,
            (Self::Closure(a), Self::Closure(b)) => Arc::ptr_eq(a, b),
            (Self::Maybe(a), Self::Maybe(b)) => match (&a.inner, &b.inner) {
                (None, None) => true,
                (Some(a), Some(b)) => a.equals(b),
                _ => false,
            },
            (Self::Result(a), Self::Result(b)) => a.ok == b.ok && a.inner.equals(&b.inner),
            (Self::Dynamic(a), Self::Dynamic(b)) => Arc::ptr_eq(a, b),
            (Self::Fiber(a), Self::Fiber(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The canonical string key used to address map storage.
    ///
    /// Primitive keys use their lexical form (shortest round-trip for
    /// floats); aggregate keys use the pointer identity of their payload.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        match self {
            Self::Void => "void".to_owned(),
            Self::Bool(b) => if *b { "true" } else { "false" }.to_owned(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => ryu::Buffer::new().format(*f).to_owned(),
            Self::Str(s) => s.to_string(),
            Self::Enum(value) => format!("{}::{}", value.def.name, value.variants_name()),
            Self::List(cell) => format!("ptr:{:x}", Arc::as_ptr(cell) as usize),
            Self::Map(cell) => format!("ptr:{:x}", Arc::as_ptr(cell) as usize),
            Self::Struct(cell) => format!("ptr:{:x}", Arc::as_ptr(cell) as usize),
            Self::Closure(closure) => format!("ptr:{:x}", Arc::as_ptr(closure) as usize),
            Self::Maybe(cell) => format!("ptr:{:x}", Arc::as_ptr(cell) as usize),
            Self::Result(cell) => format!("ptr:{:x}", Arc::as_ptr(cell) as usize),
            Self::Dynamic(payload) => format!("ptr:{:x}", Arc::as_ptr(payload) as usize),
            Self::Fiber(cell) => format!("ptr:{:x}", Arc::as_ptr(cell) as usize),
        }
    }

    // --- Tag-checked accessors ---------------------------------------------
    //
    // Each accessor panics on a tag mismatch. The checker guarantees the
    // tags line up; a mismatch is a toolchain bug, not a user error.

    /// # Panics
    /// Panics when the value is not an `Int`.
    #[must_use]
    pub fn as_int(&self) -> i64 {
        match self {
            Self::Int(i) => *i,
            other => panic!("value tag mismatch: expected Int, found {}", other.kind_name()),
        }
    }

    /// # Panics
    /// Panics when the value is not a `Float`.
    #[must_use]
    pub fn as_float(&self) -> f64 {
        match self {
            Self::Float(f) => *f,
            other => panic!("value tag mismatch: expected Float, found {}", other.kind_name()),
        }
    }

    /// # Panics
    /// Panics when the value is not a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            other => panic!("value tag mismatch: expected Bool, found {}", other.kind_name()),
        }
    }

    /// # Panics
    /// Panics when the value is not a `Str`.
    #[must_use]
    pub fn as_str(&self) -> Arc<str> {
        match self {
            Self::Str(s) => s.clone(),
            other => panic!("value tag mismatch: expected Str, found {}", other.kind_name()),
        }
    }

    /// # Panics
    /// Panics when the value is not a `List`.
    #[must_use]
    pub fn list_cell(&self) -> &Arc<Mutex<ListCell>> {
        match self {
            Self::List(cell) => cell,
            other => panic!("value tag mismatch: expected List, found {}", other.kind_name()),
        }
    }

    /// # Panics
    /// Panics when the value is not a `Map`.
    #[must_use]
    pub fn map_cell(&self) -> &Arc<Mutex<MapCell>> {
        match self {
            Self::Map(cell) => cell,
            other => panic!("value tag mismatch: expected Map, found {}", other.kind_name()),
        }
    }

    /// # Panics
    /// Panics when the value is not a struct instance.
    #[must_use]
    pub fn struct_cell(&self) -> &Arc<Mutex<StructCell>> {
        match self {
            Self::Struct(cell) => cell,
            other => panic!("value tag mismatch: expected Struct, found {}", other.kind_name()),
        }
    }

    /// # Panics
    /// Panics when the value is not a closure.
    #[must_use]
    pub fn closure(&self) -> &Arc<Closure> {
        match self {
            Self::Closure(closure) => closure,
            other => panic!("value tag mismatch: expected Closure, found {}", other.kind_name()),
        }
    }

    /// # Panics
    /// Panics when the value is not a `Maybe`.
    #[must_use]
    pub fn maybe_cell(&self) -> &MaybeCell {
        match self {
            Self::Maybe(cell) => cell,
            other => panic!("value tag mismatch: expected Maybe, found {}", other.kind_name()),
        }
    }

    /// # Panics
    /// Panics when the value is not a `Result`.
    #[must_use]
    pub fn result_cell(&self) -> &ResultCell {
        match self {
            Self::Result(cell) => cell,
            other => panic!("value tag mismatch: expected Result, found {}", other.kind_name()),
        }
    }

    /// # Panics
    /// Panics when the value is not `Dynamic`.
    #[must_use]
    pub fn dynamic_payload(&self) -> &serde_json::Value {
        match self {
            Self::Dynamic(payload) => payload,
            other => panic!("value tag mismatch: expected Dynamic, found {}", other.kind_name()),
        }
    }

    /// # Panics
    /// Panics when the value is not a fiber handle.
    #[must_use]
    pub fn fiber_cell(&self) -> &Arc<FiberCell> {
        match self {
            Self::Fiber(cell) => cell,
            other => panic!("value tag mismatch: expected Fiber, found {}", other.kind_name()),
        }
    }

    // --- Structural predicates ---------------------------------------------

    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Result(cell) if cell.ok)
    }

    #[must_use]
    pub fn is_err(&self) -> bool {
        matches!(self, Self::Result(cell) if !cell.ok)
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::Maybe(cell) if cell.inner.is_none())
    }

    #[must_use]
    pub fn is_some(&self) -> bool {
        matches!(self, Self::Maybe(cell) if cell.inner.is_some())
    }

    #[must_use]
    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct(_))
    }
}

impl EnumValue {
    fn variants_name(&self) -> Arc<str> {
        self.def.variants[self.tag].clone()
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::str(s)
    }
}

impl fmt::Display for Value {
    /// Default rendering, used for diagnostics and as the fallback for
    /// values whose `to_str` is fixed (numbers, booleans, enum variants).
    /// Struct values with a user `to_str` method are rendered through the
    /// evaluator instead.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:.2}"),
            Self::Str(s) => f.write_str(s),
            Self::List(cell) => {
                let items = lock(cell).items.clone();
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(cell) => {
                let entries: Vec<MapEntry> = lock(cell).entries.values().cloned().collect();
                f.write_str("{")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", entry.key, entry.value)?;
                }
                f.write_str("}")
            }
            Self::Struct(cell) => {
                let (name, fields) = {
                    let cell = lock(cell);
                    (cell.def.name.clone(), cell.fields.clone())
                };
                write!(f, "{name} {{ ")?;
                for (i, (field, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}: {value}")?;
                }
                f.write_str(" }")
            }
            Self::Enum(value) => f.write_str(&value.def.display_name(value.tag)),
            Self::Closure(closure) => write!(f, "<fn {}>", closure.name()),
            Self::Maybe(cell) => match &cell.inner {
                Some(inner) => write!(f, "Some({inner})"),
                None => f.write_str("None"),
            },
            Self::Result(cell) => {
                if cell.ok {
                    write!(f, "Ok({})", cell.inner)
                } else {
                    write!(f, "Err({})", cell.inner)
                }
            }
            Self::Dynamic(payload) => f.write_str(&payload.to_string()),
            Self::Fiber(cell) => write!(f, "<fiber {}>", cell.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_keys_use_lexical_forms() {
        assert_eq!(Value::Int(42).canonical_key(), "42");
        assert_eq!(Value::Bool(true).canonical_key(), "true");
        assert_eq!(Value::str("Alice").canonical_key(), "Alice");
        assert_eq!(Value::Float(1.5).canonical_key(), "1.5");
    }

    #[test]
    fn aggregate_keys_use_pointer_identity() {
        let a = Value::list(Type::Int, vec![]);
        let b = Value::list(Type::Int, vec![]);
        assert_ne!(a.canonical_key(), b.canonical_key());
        assert_eq!(a.canonical_key(), a.clone().canonical_key());
    }

    #[test]
    fn maybe_equality_compares_inner_values() {
        assert!(Value::none().equals(&Value::none()));
        assert!(Value::some(Value::Int(5)).equals(&Value::some(Value::Int(5))));
        assert!(!Value::some(Value::Int(5)).equals(&Value::none()));
        assert!(!Value::some(Value::Int(5)).equals(&Value::some(Value::Int(6))));
    }

    #[test]
    fn aggregates_compare_by_identity() {
        let a = Value::list(Type::Int, vec![Value::Int(1)]);
        let b = Value::list(Type::Int, vec![Value::Int(1)]);
        assert!(!a.equals(&b));
        assert!(a.equals(&a.clone()));
    }

    #[test]
    fn deep_copy_detaches_the_buffer() {
        let original = Value::list(Type::Int, vec![Value::Int(1)]);
        let copy = original.deep_copy();
        lock(original.list_cell()).items.push(Value::Int(2));
        assert_eq!(lock(copy.list_cell()).items.len(), 1);
    }

    #[test]
    fn refinement_narrows_generic_parameters() {
        let none = Value::none().refined(&Type::maybe(Type::Int));
        assert_eq!(none.type_of(), Type::maybe(Type::Int));
    }

    #[test]
    #[should_panic(expected = "value tag mismatch: expected Int, found Str")]
    fn tag_mismatch_is_fatal() {
        let _ = Value::str("not a number").as_int();
    }

    #[test]
    fn map_round_trip_by_canonical_key() {
        let map = Value::map(Type::Str, Type::Int);
        {
            let mut cell = lock(map.map_cell());
            cell.set(Value::str("Alice"), Value::Int(40));
            cell.set(Value::str("Bob"), Value::Int(30));
            cell.set(Value::str("Bob"), Value::Int(31));
        }
        let cell = lock(map.map_cell());
        assert_eq!(cell.entries.len(), 2);
        assert!(cell.get(&Value::str("Bob")).unwrap().equals(&Value::Int(31)));
    }
}
