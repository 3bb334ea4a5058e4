#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::lox::{Lox, RunOutcome};

/// In-memory sink shared between a test and the interpreter it drives.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session whose `print` output is captured.
pub fn session() -> (Lox, SharedBuf) {
    let buf = SharedBuf::default();
    let lox = Lox::with_output(Box::new(buf.clone()));
    (lox, buf)
}

/// Run `source` in a fresh session, returning printed output and the outcome.
pub fn run(source: &str) -> (String, RunOutcome) {
    let (mut lox, buf) = session();
    let outcome = lox.run(source);
    (buf.contents(), outcome)
}

/// Run a program expected to succeed and return what it printed.
pub fn output_of(source: &str) -> String {
    let (out, outcome) = run(source);
    assert!(
        outcome.is_ok(),
        "program failed: {:?}",
        outcome
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
    );
    out
}

/// Display strings of every error the run reported.
pub fn error_messages(outcome: &RunOutcome) -> Vec<String> {
    outcome.errors.iter().map(|e| e.to_string()).collect()
}
