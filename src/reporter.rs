//! Error‑reporting collaborator shared by every pipeline stage.
//!
//! Each stage hands its diagnostics here instead of printing them, and the
//! driver polls [`Reporter::had_error`] / [`Reporter::had_runtime_error`] to
//! choose an exit code.

use log::debug;

use crate::error::{location_of, RuntimeError};
use crate::token::Token;

#[derive(Debug, Default)]
pub struct Reporter {
    had_error: bool,
    had_runtime_error: bool,
    diagnostics: Vec<String>,
    silent: bool,
}

impl Reporter {
    /// A reporter that echoes every diagnostic to stderr.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter that only records diagnostics.
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    /// Unscannable input.
    pub fn scanner_error(&mut self, line: usize, column: usize, message: &str) {
        self.had_error = true;
        self.emit(line, &format!(" at column {}", column), message);
    }

    /// Syntax or static‑resolution error attributed to a token.
    pub fn token_error(&mut self, token: &Token, message: &str) {
        self.had_error = true;
        self.emit(token.line, &location_of(token), message);
    }

    pub fn runtime_error(&mut self, error: &RuntimeError) {
        self.had_runtime_error = true;
        self.emit(error.line(), &error.location(), &error.to_string());
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Every diagnostic recorded since the last [`reset`](Self::reset).
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Clear flags and diagnostics before an independent run.
    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
        self.diagnostics.clear();
    }

    fn emit(&mut self, line: usize, location: &str, message: &str) {
        let diagnostic = format!("[line {}] Error{}: {}", line, location, message);

        debug!("Reporting diagnostic: {}", diagnostic);

        if !self.silent {
            eprintln!("{}", diagnostic);
        }

        self.diagnostics.push(diagnostic);
    }
}
