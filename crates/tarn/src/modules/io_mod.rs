//! The `io` module: program output through the VM's print writer.

use std::sync::{Arc, Mutex};

use crate::{foreign::ForeignRegistry, io::PrintWriter, value::{Value, lock}};

pub(super) fn register(foreign: &ForeignRegistry, print: Arc<Mutex<Box<dyn PrintWriter>>>) {
    foreign
        .register(
            "io.print",
            Arc::new(move |args, _ret| {
                let line = args[0].as_str();
                lock(&print).write_line(&line);
                Ok(Value::Void)
            }),
        )
        .expect("io bindings are unique on a fresh registry");
}
