//! First-class callables.
//!
//! A [`Closure`] bundles a definition with the scope captured where the
//! definition was evaluated; free names inside the body resolve through that
//! scope. Methods carry their receiver as an implicit first binding under
//! the reserved name `@`. Foreign closures carry no body at all, only the
//! binding key resolved through the foreign-function registry at call time.

use std::sync::Arc;

use crate::{
    scope::Scope,
    types::{ExternalFunctionDef, FunctionDef, Param, Type},
};

/// The reserved name the receiver is bound under inside method bodies.
pub const RECEIVER_NAME: &str = "@";

/// A callable value: user function, struct method, or foreign binding.
#[derive(Debug)]
pub struct Closure {
    kind: ClosureKind,
    captured: Scope,
}

#[derive(Debug)]
pub enum ClosureKind {
    /// A user-defined function or lambda.
    Function(Arc<FunctionDef>),
    /// A struct method; invocation prepends the receiver under [`RECEIVER_NAME`].
    Method(Arc<FunctionDef>),
    /// A declared foreign function, forwarded to the registry by key.
    Foreign(Arc<ExternalFunctionDef>),
}

impl Closure {
    #[must_use]
    pub fn function(def: Arc<FunctionDef>, captured: Scope) -> Self {
        Self {
            kind: ClosureKind::Function(def),
            captured,
        }
    }

    #[must_use]
    pub fn method(def: Arc<FunctionDef>, captured: Scope) -> Self {
        Self {
            kind: ClosureKind::Method(def),
            captured,
        }
    }

    #[must_use]
    pub fn foreign(def: Arc<ExternalFunctionDef>, captured: Scope) -> Self {
        Self {
            kind: ClosureKind::Foreign(def),
            captured,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &ClosureKind {
        &self.kind
    }

    /// The scope free names resolve through.
    #[must_use]
    pub fn captured(&self) -> &Scope {
        &self.captured
    }

    #[must_use]
    pub fn name(&self) -> Arc<str> {
        match &self.kind {
            ClosureKind::Function(def) | ClosureKind::Method(def) => def.name.clone(),
            ClosureKind::Foreign(def) => def.name.clone(),
        }
    }

    /// Whether the definition is visible outside its module.
    #[must_use]
    pub fn is_public(&self) -> bool {
        match &self.kind {
            ClosureKind::Function(def) | ClosureKind::Method(def) => def.public,
            ClosureKind::Foreign(def) => def.public,
        }
    }

    /// Declared parameters, excluding any method receiver.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        match &self.kind {
            ClosureKind::Function(def) | ClosureKind::Method(def) => &def.params,
            ClosureKind::Foreign(def) => &def.params,
        }
    }

    #[must_use]
    pub fn return_type(&self) -> &Type {
        match &self.kind {
            ClosureKind::Function(def) | ClosureKind::Method(def) => &def.ret,
            ClosureKind::Foreign(def) => &def.ret,
        }
    }

    /// Parameter types, for building the closure's function type.
    #[must_use]
    pub fn param_types(&self) -> Vec<Type> {
        self.params().iter().map(|p| p.ty.clone()).collect()
    }
}
