//! Built-in host-module glue.
//!
//! Built-in modules register their natives in the foreign-function registry
//! at VM construction and are reached through an ordinary module handler
//! that forwards `module.symbol` keys. The `async` module is the exception:
//! spawning fibers needs the VM itself, so it installs a direct handler.
//!
//! Heavyweight host modules (`fs`, `http`, `sql`, `sqlite`) are embedder
//! territory: their natives are registered through the public foreign
//! registry, and module-qualified calls to any unregistered module path
//! fall back to a foreign lookup, so no handler needs to exist here.

use std::sync::{Arc, Mutex};

use strum::{EnumIter, EnumString, IntoStaticStr, IntoEnumIterator};

use crate::{
    args::{ArgValues, into_values},
    error::{CodeLoc, RunResult},
    foreign::ForeignRegistry,
    io::PrintWriter,
    registry::{ModuleHandler, ModuleRegistry},
    types::Type,
    value::Value,
};

pub(crate) mod async_mod;
pub(crate) mod decode_mod;
pub(crate) mod env_mod;
pub(crate) mod float_mod;
pub(crate) mod io_mod;
pub(crate) mod json_mod;
pub(crate) mod maybe_mod;
pub(crate) mod result_mod;

/// The built-in modules installed at VM construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum BuiltinModule {
    Io,
    Env,
    Float,
    Maybe,
    Result,
    Json,
    Decode,
    Async,
}

/// Registers every built-in native and module handler.
///
/// Runs once on a fresh VM, so duplicate bindings are impossible.
pub(crate) fn install(
    foreign: &ForeignRegistry,
    modules: &ModuleRegistry,
    print: Arc<Mutex<Box<dyn PrintWriter>>>,
) {
    io_mod::register(foreign, print);
    env_mod::register(foreign);
    float_mod::register(foreign);
    maybe_mod::register(foreign);
    result_mod::register(foreign);
    json_mod::register(foreign);
    decode_mod::register(foreign);

    for module in BuiltinModule::iter() {
        let path: &'static str = module.into();
        if module == BuiltinModule::Async {
            modules.register(Arc::new(async_mod::AsyncModuleHandler));
        } else {
            modules.register(Arc::new(ForeignModuleHandler { path }));
        }
    }
}

/// Handler forwarding module-level calls to the foreign-function registry.
struct ForeignModuleHandler {
    path: &'static str,
}

impl ModuleHandler for ForeignModuleHandler {
    fn path(&self) -> &str {
        self.path
    }

    fn handle(
        &self,
        vm: &Arc<crate::vm::Vm>,
        call: &str,
        args: ArgValues,
        ret: &Type,
        loc: CodeLoc,
    ) -> RunResult<Value> {
        let key = format!("{}.{call}", self.path);
        vm.foreign()
            .call(&key, &into_values(args), ret)
            .map_err(|err| err.with_loc(loc))
    }
}
