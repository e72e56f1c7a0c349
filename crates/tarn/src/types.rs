//! The type vocabulary the checker hands to the evaluator.
//!
//! The evaluator consumes these kinds but never invents them: every
//! expression node in the program tree arrives with a fully resolved
//! [`Type`], and dispatch (method tables, match flavours, union arms)
//! depends on the distinctions being preserved.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{ast::Block, error::CodeLoc};

/// Identity of a struct definition, assigned by the checker.
///
/// Method-registry keys use this id rather than the struct name so that
/// same-named structs from different modules never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(pub u32);

/// A fully resolved type.
///
/// `Generic` survives into the runtime only for values built through the
/// generic constructors (`maybe::none()` returns `Maybe<T>`); the evaluator
/// narrows it at the binding point via [`crate::Value::refined`].
#[derive(Debug, Clone)]
pub enum Type {
    Int,
    Float,
    Bool,
    Str,
    Void,
    List(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Maybe(Box<Type>),
    Result(Box<Type>, Box<Type>),
    Struct(Arc<StructDef>),
    Enum(Arc<EnumDef>),
    Function(Arc<FunctionSig>),
    /// Disjunction of concrete types; used only for pattern dispatch.
    Union(Vec<Type>),
    /// Erased host value, typically JSON-shaped data.
    Dynamic,
    /// Handle returned by the fiber primitives, parameterised by the result.
    Fiber(Box<Type>),
    /// An unresolved type parameter.
    Generic(Arc<str>),
}

impl Type {
    /// Shorthand for `Maybe<T>`.
    #[must_use]
    pub fn maybe(inner: Self) -> Self {
        Self::Maybe(Box::new(inner))
    }

    /// Shorthand for `Result<V, E>`.
    #[must_use]
    pub fn result(value: Self, error: Self) -> Self {
        Self::Result(Box::new(value), Box::new(error))
    }

    /// Shorthand for `List<T>`.
    #[must_use]
    pub fn list(elem: Self) -> Self {
        Self::List(Box::new(elem))
    }

    /// Shorthand for `Map<K, V>`.
    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Whether this is a `Result<_, _>` type.
    ///
    /// The FFI layer consults this to decide whether a native panic can be
    /// absorbed as `Result::err`.
    #[must_use]
    pub fn is_result(&self) -> bool {
        matches!(self, Self::Result(_, _))
    }

    /// Whether this is a `Maybe<_>` type.
    #[must_use]
    pub fn is_maybe(&self) -> bool {
        matches!(self, Self::Maybe(_))
    }

    /// The display name, as used by union-match dispatch and diagnostics.
    ///
    /// Concrete names are stable: primitives use their keyword, aggregates
    /// render their parameters, and nominal types use their declared name.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Int => "Int".to_owned(),
            Self::Float => "Float".to_owned(),
            Self::Bool => "Bool".to_owned(),
            Self::Str => "Str".to_owned(),
            Self::Void => "Void".to_owned(),
            Self::List(elem) => format!("List<{}>", elem.name()),
            Self::Map(key, value) => format!("Map<{}, {}>", key.name(), value.name()),
            Self::Maybe(inner) => format!("Maybe<{}>", inner.name()),
            Self::Result(value, error) => format!("Result<{}, {}>", value.name(), error.name()),
            Self::Struct(def) => def.name.to_string(),
            Self::Enum(def) => def.name.to_string(),
            Self::Function(sig) => sig.name(),
            Self::Union(members) => members
                .iter()
                .map(Self::name)
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Dynamic => "Dynamic".to_owned(),
            Self::Fiber(inner) => format!("Fiber<{}>", inner.name()),
            Self::Generic(name) => name.to_string(),
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int, Self::Int)
            | (Self::Float, Self::Float)
            | (Self::Bool, Self::Bool)
            | (Self::Str, Self::Str)
            | (Self::Void, Self::Void)
            | (Self::Dynamic, Self::Dynamic) => true,
            (Self::List(a), Self::List(b)) | (Self::Maybe(a), Self::Maybe(b)) | (Self::Fiber(a), Self::Fiber(b)) => {
                a == b
            }
            (Self::Map(ak, av), Self::Map(bk, bv)) => ak == bk && av == bv,
            (Self::Result(av, ae), Self::Result(bv, be)) => av == bv && ae == be,
            // Nominal types compare by identity, never structurally.
            (Self::Struct(a), Self::Struct(b)) => a.id == b.id,
            (Self::Enum(a), Self::Enum(b)) => a.name == b.name,
            (Self::Function(a), Self::Function(b)) => a.params == b.params && a.ret == b.ret,
            (Self::Union(a), Self::Union(b)) => a == b,
            (Self::Generic(a), Self::Generic(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// The signature part of a function type.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl FunctionSig {
    fn name(&self) -> String {
        let params = self
            .params
            .iter()
            .map(Type::name)
            .collect::<Vec<_>>()
            .join(", ");
        format!("({params}) -> {}", self.ret.name())
    }
}

/// A declared function parameter. The name doubles as the argument label.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Arc<str>,
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<Arc<str>>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A user-defined function, method, or static function.
///
/// For methods the receiver is *not* part of `params`; method registration
/// prepends it under the reserved `@` name when the closure is built.
#[derive(Debug)]
pub struct FunctionDef {
    pub name: Arc<str>,
    /// Whether the definition is reachable from outside its module.
    pub public: bool,
    pub params: Vec<Param>,
    pub ret: Type,
    pub body: Block,
    pub loc: CodeLoc,
}

/// A declared foreign function, resolved through the foreign-function
/// registry at call time by its `"module.symbol"` binding key.
#[derive(Debug)]
pub struct ExternalFunctionDef {
    pub name: Arc<str>,
    pub public: bool,
    pub params: Vec<Param>,
    pub ret: Type,
    pub binding: Arc<str>,
}

/// A named record type: fields, methods, and static functions.
#[derive(Debug)]
pub struct StructDef {
    pub id: StructId,
    pub name: Arc<str>,
    pub public: bool,
    /// Field name to type, in declaration order.
    pub fields: IndexMap<String, Type>,
    pub methods: Vec<Arc<FunctionDef>>,
    pub statics: Vec<Arc<FunctionDef>>,
}

/// A named tagged union. Variants are ordered and referenced by tag.
#[derive(Debug)]
pub struct EnumDef {
    pub name: Arc<str>,
    pub public: bool,
    pub variants: Vec<Arc<str>>,
    /// Per-variant `to_str` replacements for enums that override the default
    /// variant-name rendering.
    pub display_overrides: Option<Vec<Arc<str>>>,
}

impl EnumDef {
    /// The `to_str` rendering for a variant tag.
    ///
    /// # Panics
    /// Panics when the tag is out of range; the checker only emits valid
    /// tags, so this indicates a malformed program tree.
    #[must_use]
    pub fn display_name(&self, tag: usize) -> Arc<str> {
        if let Some(overrides) = &self.display_overrides {
            return overrides[tag].clone();
        }
        self.variants[tag].clone()
    }
}
