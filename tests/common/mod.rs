#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use slox::error::{LoxError, Reporter, RuntimeError};
use slox::interpreter::{Interpreter, Status};
use slox::module::ModuleLoader;

/// In-memory `print` sink shared with the interpreter.
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    into: Rc<RefCell<Vec<u8>>>,
}

impl OutputCapture {
    pub fn contents(&self) -> String {
        String::from_utf8(self.into.borrow().clone()).expect("program output is UTF-8")
    }
}

impl Write for OutputCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.into.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything sent to the reporter, rendered as text.
#[derive(Debug, Clone, Default)]
pub struct Reports {
    pub static_errors: Rc<RefCell<Vec<String>>>,
    pub runtime_errors: Rc<RefCell<Vec<String>>>,
    pub diagnostics: Rc<RefCell<Vec<String>>>,
}

impl Reporter for Reports {
    fn static_error(&mut self, error: &LoxError) {
        self.static_errors.borrow_mut().push(error.to_string());
    }

    fn runtime_error(&mut self, error: &RuntimeError) {
        self.runtime_errors.borrow_mut().push(error.to_string());
    }

    fn diagnostic(&mut self, message: &str) {
        self.diagnostics.borrow_mut().push(message.to_string());
    }
}

/// Serves module sources from a map instead of the filesystem.
#[derive(Debug, Clone, Default)]
pub struct MapLoader {
    modules: HashMap<String, String>,
}

impl MapLoader {
    pub fn with(mut self, path: &str, source: &str) -> Self {
        self.modules.insert(path.to_string(), source.to_string());
        self
    }
}

impl ModuleLoader for MapLoader {
    fn load(&self, path: &str) -> slox::error::Result<String> {
        self.modules.get(path).cloned().ok_or_else(|| {
            LoxError::Io(io::Error::new(io::ErrorKind::NotFound, path.to_string()))
        })
    }
}

/// An interpreter wired to in-memory sinks.
pub struct Harness {
    pub interpreter: Interpreter,
    pub output: OutputCapture,
    pub reports: Reports,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_loader(MapLoader::default())
    }

    pub fn with_loader(loader: MapLoader) -> Self {
        Self::build(loader, "")
    }

    pub fn with_input(input: &str) -> Self {
        Self::build(MapLoader::default(), input)
    }

    fn build(loader: MapLoader, input: &str) -> Self {
        let output = OutputCapture::default();
        let reports = Reports::default();

        let interpreter = Interpreter::new()
            .with_output(output.clone())
            .with_input(Cursor::new(input.as_bytes().to_vec()))
            .with_reporter(reports.clone())
            .with_loader(loader);

        Self {
            interpreter,
            output,
            reports,
        }
    }

    /// Lowers the nested-call limit of the wrapped interpreter.
    pub fn max_call_depth(mut self, limit: usize) -> Self {
        let interpreter = std::mem::take(&mut self.interpreter);
        self.interpreter = interpreter.with_max_call_depth(limit);
        self
    }

    pub fn run(&mut self, source: &str) -> Status {
        self.interpreter.run(source)
    }

    pub fn output(&self) -> String {
        self.output.contents()
    }

    pub fn lines(&self) -> Vec<String> {
        self.output().lines().map(str::to_string).collect()
    }

    pub fn runtime_errors(&self) -> Vec<String> {
        self.reports.runtime_errors.borrow().clone()
    }

    pub fn static_errors(&self) -> Vec<String> {
        self.reports.static_errors.borrow().clone()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.reports.diagnostics.borrow().clone()
    }
}

/// Runs `source` on a fresh harness, asserting it completes, and returns its
/// printed lines.
pub fn run_ok(source: &str) -> Vec<String> {
    let mut harness = Harness::new();
    let status = harness.run(source);

    assert_eq!(
        status,
        Status::Completed,
        "static: {:?}, runtime: {:?}",
        harness.static_errors(),
        harness.runtime_errors()
    );

    harness.lines()
}

/// Runs `source` expecting a runtime failure; returns the reported message.
pub fn run_err(source: &str) -> String {
    let mut harness = Harness::new();
    assert_eq!(harness.run(source), Status::RuntimeError);

    let errors = harness.runtime_errors();
    assert_eq!(errors.len(), 1);
    errors[0].clone()
}
