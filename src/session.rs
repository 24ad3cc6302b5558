//! One interpreter session: the pipeline wired together.
//!
//! Each call to [`Lox::run`] scans, parses, resolves and (if no error was
//! reported) evaluates a complete source text.  The global scope persists
//! between runs, which is what an interactive prompt needs; the reporter's
//! flags and the resolver's side‑table are fresh every time.

use std::io::Write;

use log::{debug, info};

use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::reporter::Reporter;
use crate::resolver::Resolver;
use crate::scanner::scan;

pub struct Lox {
    interpreter: Interpreter,
    reporter: Reporter,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// Session printing to stdout and reporting to stderr.
    pub fn new() -> Self {
        Self::from_parts(Interpreter::new(), Reporter::new())
    }

    /// Session printing to `output`, with diagnostics only recorded.
    pub fn with_output(output: impl Write + 'static) -> Self {
        Self::from_parts(Interpreter::with_output(output), Reporter::silent())
    }

    pub fn from_parts(interpreter: Interpreter, reporter: Reporter) -> Self {
        Self {
            interpreter,
            reporter,
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Run `source` to completion.
    ///
    /// Returns [`LoxError::Compile`] when scanning, parsing or resolution
    /// reported anything (nothing is evaluated then) and
    /// [`LoxError::Runtime`] for the first runtime error.
    pub fn run(&mut self, source: &str) -> Result<()> {
        self.reporter.reset();

        let tokens = scan(source, &mut self.reporter);
        let statements = Parser::new(&tokens, &mut self.reporter).parse();

        if self.reporter.had_error() {
            return Err(self.compile_error());
        }

        let locals = Resolver::new(&mut self.reporter).resolve(&statements);

        if self.reporter.had_error() {
            return Err(self.compile_error());
        }

        debug!("Running {} statements", statements.len());

        if let Err(e) = self.interpreter.interpret(&statements, locals) {
            self.reporter.runtime_error(&e);
            return Err(LoxError::Runtime(e));
        }

        Ok(())
    }

    fn compile_error(&self) -> LoxError {
        let count = self.reporter.diagnostics().len();

        info!("Skipping evaluation after {} compile error(s)", count);

        LoxError::Compile { count }
    }
}
