//! Program output plumbing.
//!
//! The `io.print` host function routes through a [`PrintWriter`] chosen at
//! VM construction, so embedders and tests capture or redirect output
//! instead of scraping stdout.

use std::sync::{Arc, Mutex};

use crate::value::lock;

/// Trait for handling output from the `io.print` host function.
pub trait PrintWriter: Send {
    /// Called once per printed line, without a trailing newline.
    fn write_line(&mut self, line: &str);
}

/// Default writer: one `println!` per printed line.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Writer that collects output into a shared string, for tests and
/// embedders that post-process program output.
#[derive(Debug, Default)]
pub struct CollectStringPrint {
    buffer: Arc<Mutex<String>>,
}

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the buffer; stays valid after the writer moves into the VM.
    #[must_use]
    pub fn handle(&self) -> Arc<Mutex<String>> {
        self.buffer.clone()
    }

    /// The output collected so far.
    #[must_use]
    pub fn contents(&self) -> String {
        lock(&self.buffer).clone()
    }
}

impl PrintWriter for CollectStringPrint {
    fn write_line(&mut self, line: &str) {
        let mut buffer = lock(&self.buffer);
        buffer.push_str(line);
        buffer.push('\n');
    }
}
