// Shared helpers for the evaluator-level tests: run a program with captured
// output and an in-memory module table.

#![allow(dead_code)]

use mmt::error::MmtError;
use mmt::module::MemoryLoader;
use mmt::{parse_source, Evaluator};
use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::path::Path;
use std::rc::Rc;

/// Output sink the test keeps a handle to after the evaluator takes ownership.
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output should be UTF-8")
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Run {
    pub output: String,
    pub result: Result<(), MmtError>,
}

/// Runs `source` as `main.thl` with the given stdin contents and modules.
pub fn run_program(source: &str, input: &str, loader: MemoryLoader) -> Run {
    let program = parse_source(source).unwrap_or_else(|e| panic!("program should parse: {}", e));
    let output = SharedOutput::default();
    let mut evaluator = Evaluator::with_io(
        Box::new(output.clone()),
        Box::new(Cursor::new(input.as_bytes().to_vec())),
    )
    .with_loader(Box::new(loader))
    .with_path(Path::new("main.thl"));

    let result = evaluator.evaluate_program(&program);
    Run {
        output: output.text(),
        result,
    }
}

pub fn run(source: &str) -> Run {
    run_program(source, "", MemoryLoader::new())
}

/// Output of a program that is expected to finish without errors.
pub fn output_of(source: &str) -> String {
    let run = run(source);
    if let Err(e) = run.result {
        panic!("program failed at {}: {}", e.span, e.message);
    }
    run.output
}

/// Error of a program that is expected to fail.
pub fn error_of(source: &str) -> MmtError {
    match run(source).result {
        Ok(()) => panic!("program should have failed"),
        Err(e) => e,
    }
}
