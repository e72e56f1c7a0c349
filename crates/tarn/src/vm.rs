//! The global VM.
//!
//! One [`Vm`] owns everything fibers share: the module registry (built-in
//! handlers plus one lazily evaluated handler per user module), the method
//! registry, the foreign-function registry, the tracer, and the print
//! writer. Evaluators — the entry evaluator and every fiber — hold it via
//! `Arc` and carry only their own scope stack.

use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::{
    ast::Program,
    error::{RunError, RunResult},
    eval::Evaluator,
    foreign::ForeignRegistry,
    io::{PrintWriter, StdPrint},
    modules,
    registry::{MethodRegistry, ModuleHandler, ModuleRegistry, UserModuleHandler},
    tracer::{EvalTracer, NoopTracer},
    value::Value,
};

/// The shared evaluation context for one program.
pub struct Vm {
    methods: MethodRegistry,
    modules: ModuleRegistry,
    foreign: ForeignRegistry,
    user_modules: AHashMap<Arc<str>, Arc<UserModuleHandler>>,
    entry: Arc<str>,
    tracer: Arc<dyn EvalTracer>,
    print: Arc<Mutex<Box<dyn PrintWriter>>>,
}

impl Vm {
    /// Creates a VM with stdout printing and no tracing.
    #[must_use]
    pub fn new(program: Program) -> Arc<Self> {
        Self::with_io(program, Box::new(StdPrint), Arc::new(NoopTracer))
    }

    /// Creates a VM with a custom print writer and tracer.
    #[must_use]
    pub fn with_io(program: Program, print: Box<dyn PrintWriter>, tracer: Arc<dyn EvalTracer>) -> Arc<Self> {
        let methods = MethodRegistry::default();
        let module_registry = ModuleRegistry::default();
        let foreign = ForeignRegistry::new();
        let print = Arc::new(Mutex::new(print));
        modules::install(&foreign, &module_registry, print.clone());

        let mut user_modules: AHashMap<Arc<str>, Arc<UserModuleHandler>> = AHashMap::new();
        for module in program.modules {
            let handler = Arc::new(UserModuleHandler::new(module));
            module_registry.register(handler.clone());
            user_modules.insert(Arc::from(handler.path()), handler);
        }

        Arc::new(Self {
            methods,
            modules: module_registry,
            foreign,
            user_modules,
            entry: program.entry,
            tracer,
            print,
        })
    }

    /// Evaluates the entry module and returns the program's final value.
    ///
    /// When the entry module defines `main()`, its return value is the
    /// program result; otherwise the value of the module body's final
    /// statement is.
    pub fn run(self: &Arc<Self>) -> RunResult<Value> {
        let Some(handler) = self.user_modules.get(&self.entry).cloned() else {
            panic!("entry module '{}' is not part of the program", self.entry)
        };
        let loaded = handler.ensure_loaded(self)?;
        if let Some(Value::Closure(main)) = loaded.scope.lookup("main") {
            let evaluator = Evaluator::new(self.clone());
            return evaluator.call_closure(&main, SmallVec::new(), None);
        }
        Ok(loaded.value)
    }

    /// Registers an embedder-provided native function.
    ///
    /// A convenience over [`Vm::foreign`] that surfaces duplicate keys as a
    /// runtime error.
    pub fn register_foreign(&self, key: &str, f: crate::foreign::ForeignFn) -> RunResult<()> {
        self.foreign
            .register(key, f)
            .map_err(|dup| RunError::panic(dup.to_string(), None))
    }

    #[must_use]
    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    #[must_use]
    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    #[must_use]
    pub fn foreign(&self) -> &ForeignRegistry {
        &self.foreign
    }

    #[must_use]
    pub fn tracer(&self) -> &Arc<dyn EvalTracer> {
        &self.tracer
    }

    /// The writer `io.print` routes through.
    #[must_use]
    pub fn print_writer(&self) -> &Arc<Mutex<Box<dyn PrintWriter>>> {
        &self.print
    }
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("entry", &self.entry)
            .field("user_modules", &self.user_modules.len())
            .finish_non_exhaustive()
    }
}
