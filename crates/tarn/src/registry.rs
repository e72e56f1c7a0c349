//! VM-wide registries: struct methods and module handlers.
//!
//! Both registries are shared across fibers. Reads dominate (every method
//! call and module-qualified call goes through here); writes happen while
//! definitions are evaluated, so both sit behind read-write locks.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use ahash::AHashMap;

use crate::{
    args::ArgValues,
    ast::Module,
    closure::Closure,
    error::{CodeLoc, RunError, RunResult},
    eval::Evaluator,
    scope::Scope,
    types::{StructDef, StructId, Type},
    value::{Value, lock},
};

/// `(struct identity, method name)` to closure.
///
/// Populated when a struct definition is evaluated: each method is wrapped
/// in a closure capturing the defining module's scope, so in-module free
/// names resolve inside method bodies. Static functions get a parallel
/// table, plus a by-name index for module-handler dispatch.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: RwLock<AHashMap<(StructId, Arc<str>), Arc<Closure>>>,
    statics: RwLock<AHashMap<(StructId, Arc<str>), Arc<Closure>>>,
    statics_by_name: RwLock<AHashMap<(Arc<str>, Arc<str>), Arc<Closure>>>,
}

impl MethodRegistry {
    /// Registers all methods and statics of a struct definition.
    ///
    /// Methods become closures whose captured scope is `module_scope`.
    /// Re-evaluating the same definition replaces the previous entries.
    pub fn register_struct(&self, def: &Arc<StructDef>, module_scope: &Scope) {
        let mut methods = write_lock(&self.methods);
        for method in &def.methods {
            methods.insert(
                (def.id, method.name.clone()),
                Arc::new(Closure::method(method.clone(), module_scope.clone())),
            );
        }
        drop(methods);

        let mut statics = write_lock(&self.statics);
        let mut by_name = write_lock(&self.statics_by_name);
        for static_fn in &def.statics {
            let closure = Arc::new(Closure::function(static_fn.clone(), module_scope.clone()));
            statics.insert((def.id, static_fn.name.clone()), closure.clone());
            by_name.insert((def.name.clone(), static_fn.name.clone()), closure);
        }
    }

    #[must_use]
    pub fn lookup_method(&self, id: StructId, name: &str) -> Option<Arc<Closure>> {
        read_lock(&self.methods).get(&(id, Arc::from(name))).cloned()
    }

    #[must_use]
    pub fn lookup_static(&self, id: StructId, name: &str) -> Option<Arc<Closure>> {
        read_lock(&self.statics).get(&(id, Arc::from(name))).cloned()
    }

    #[must_use]
    pub fn lookup_static_by_name(&self, struct_name: &str, name: &str) -> Option<Arc<Closure>> {
        read_lock(&self.statics_by_name)
            .get(&(Arc::from(struct_name), Arc::from(name)))
            .cloned()
    }
}

/// A module's runtime entry points.
///
/// Built-in modules supply their own handlers; user-defined modules are
/// wrapped in [`UserModuleHandler`], which evaluates module-level calls in
/// the cached module scope.
pub trait ModuleHandler: Send + Sync {
    /// The module path this handler serves.
    fn path(&self) -> &str;

    /// Invokes a module-level function with pre-evaluated arguments.
    fn handle(&self, vm: &Arc<crate::vm::Vm>, call: &str, args: ArgValues, ret: &Type, loc: CodeLoc)
    -> RunResult<Value>;

    /// Invokes a static function of a struct declared in this module.
    fn handle_static(
        &self,
        vm: &Arc<crate::vm::Vm>,
        strukt: &str,
        call: &str,
        args: ArgValues,
        ret: &Type,
        loc: CodeLoc,
    ) -> RunResult<Value> {
        let _ = (vm, args, ret, loc);
        panic!("module '{}' has no static function '{strukt}::{call}'", self.path())
    }
}

/// Module path to handler table.
#[derive(Default)]
pub struct ModuleRegistry {
    handlers: RwLock<AHashMap<Arc<str>, Arc<dyn ModuleHandler>>>,
}

impl ModuleRegistry {
    pub fn register(&self, handler: Arc<dyn ModuleHandler>) {
        write_lock(&self.handlers).insert(Arc::from(handler.path()), handler);
    }

    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<Arc<dyn ModuleHandler>> {
        read_lock(&self.handlers).get(path).cloned()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &read_lock(&self.handlers).len())
            .finish()
    }
}

/// State of a lazily loaded user module.
#[derive(Debug, Clone)]
pub(crate) struct LoadedModule {
    pub scope: Scope,
    /// Value of the module body's final statement.
    pub value: Value,
}

/// Handler evaluating a user-defined module's calls in its cached scope.
#[derive(Debug)]
pub struct UserModuleHandler {
    module: Arc<Module>,
    loaded: Mutex<Option<LoadedModule>>,
}

impl UserModuleHandler {
    #[must_use]
    pub fn new(module: Arc<Module>) -> Self {
        Self {
            module,
            loaded: Mutex::new(None),
        }
    }

    /// Evaluates the module body on first use; re-entry returns the cached
    /// scope. The scope is published before the body runs so that re-entrant
    /// loads (module cycles) observe the partially built scope instead of
    /// recursing forever.
    pub(crate) fn ensure_loaded(&self, vm: &Arc<crate::vm::Vm>) -> RunResult<LoadedModule> {
        let scope = {
            let mut loaded = lock(&self.loaded);
            if let Some(state) = &*loaded {
                return Ok(state.clone());
            }
            let scope = Scope::module();
            *loaded = Some(LoadedModule {
                scope: scope.clone(),
                value: Value::Void,
            });
            scope
        };

        vm.tracer().on_module_load(&self.module.path);
        let evaluator = Evaluator::new(vm.clone());
        match evaluator.eval_module(&self.module.body, &scope) {
            Ok(value) => {
                let state = LoadedModule { scope, value };
                *lock(&self.loaded) = Some(state.clone());
                Ok(state)
            }
            Err(err) => {
                // A failed load is not cached; the next use retries.
                *lock(&self.loaded) = None;
                Err(err)
            }
        }
    }
}

impl ModuleHandler for UserModuleHandler {
    fn path(&self) -> &str {
        &self.module.path
    }

    fn handle(
        &self,
        vm: &Arc<crate::vm::Vm>,
        call: &str,
        args: ArgValues,
        _ret: &Type,
        loc: CodeLoc,
    ) -> RunResult<Value> {
        let loaded = self.ensure_loaded(vm)?;
        let Some(value) = loaded.scope.lookup(call) else {
            panic!("module '{}' has no function '{call}'", self.module.path)
        };
        let closure = value.closure().clone();
        if !closure.is_public() {
            return Err(RunError::panic(
                format!("function '{call}' in module '{}' is private", self.module.path),
                Some(loc),
            ));
        }
        let evaluator = Evaluator::new(vm.clone());
        evaluator.call_closure(&closure, args, Some(loc))
    }

    fn handle_static(
        &self,
        vm: &Arc<crate::vm::Vm>,
        strukt: &str,
        call: &str,
        args: ArgValues,
        _ret: &Type,
        loc: CodeLoc,
    ) -> RunResult<Value> {
        self.ensure_loaded(vm)?;
        let Some(closure) = vm.methods().lookup_static_by_name(strukt, call) else {
            panic!(
                "module '{}' has no static function '{strukt}::{call}'",
                self.module.path
            )
        };
        let evaluator = Evaluator::new(vm.clone());
        evaluator.call_closure(&closure, args, Some(loc))
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
