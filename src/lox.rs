//! Pipeline session: scan → parse → resolve → interpret.
//!
//! A [`Lox`] keeps one interpreter alive across calls to [`Lox::run`], so a
//! REPL driver can feed it line after line and globals persist.  Each stage
//! stops the run if it recorded any error; later stages never see input an
//! earlier stage rejected.

use std::io::Write;

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// Which stage ended a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// Lexical, syntax or resolution errors; nothing was executed.
    StaticError,
    /// Execution started and stopped at a runtime error.
    RuntimeError,
}

/// Result of one [`Lox::run`].
#[derive(Debug)]
pub struct RunOutcome {
    pub status: Status,
    pub errors: Vec<LoxError>,
}

impl RunOutcome {
    fn ok() -> Self {
        Self {
            status: Status::Ok,
            errors: Vec::new(),
        }
    }

    fn failed(status: Status, errors: Vec<LoxError>) -> Self {
        Self { status, errors }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Conventional process exit code: 0, 65 (static) or 70 (runtime).
    pub fn exit_code(&self) -> i32 {
        match self.status {
            Status::Ok => 0,
            Status::StaticError => 65,
            Status::RuntimeError => 70,
        }
    }
}

pub struct Lox {
    interpreter: Interpreter,
    next_id: usize,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// Session printing to stdout.
    pub fn new() -> Self {
        Self::from_interpreter(Interpreter::new())
    }

    /// Session printing to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self::from_interpreter(Interpreter::with_output(out))
    }

    pub fn from_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            next_id: 0,
        }
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Run one chunk of source text against this session's global state.
    pub fn run(&mut self, source: &str) -> RunOutcome {
        info!("Running {} byte(s) of source", source.len());

        let (tokens, lex_errors): (Vec<Token>, Vec<LoxError>) = Scanner::new(source).scan_tokens();
        if !lex_errors.is_empty() {
            return RunOutcome::failed(Status::StaticError, lex_errors);
        }

        let statements: Vec<Stmt> = match self.parse(&tokens) {
            Ok(statements) => statements,
            Err(errors) => return RunOutcome::failed(Status::StaticError, errors),
        };

        let mut resolver: Resolver<'_> = Resolver::new(&mut self.interpreter);
        resolver.resolve(&statements);
        if resolver.had_error() {
            return RunOutcome::failed(Status::StaticError, resolver.into_errors());
        }

        debug!("Executing {} statement(s)", statements.len());

        match self.interpreter.interpret(&statements) {
            Ok(()) => RunOutcome::ok(),
            Err(e) => RunOutcome::failed(Status::RuntimeError, vec![e]),
        }
    }

    /// Parse with ids continuing from the previous run.
    pub fn parse(&mut self, tokens: &[Token]) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let mut parser: Parser<'_> = Parser::starting_at(tokens, self.next_id);
        let statements: Vec<Stmt> = parser.parse();
        self.next_id = parser.next_id();

        if parser.had_error() {
            return Err(parser.into_errors());
        }

        Ok(statements)
    }
}
