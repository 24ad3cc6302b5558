//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! The module **does not** print diagnostics itself; that is the job of
//! [`Reporter`](crate::reporter::Reporter).

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source position.
    #[error("[line {line}] Error at column {column}: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,

        /// 1‑based column of the offending character.
        column: usize,
    },

    /// Syntactic (parser) error.  `location` is `" at end"` or `" at 'x'"`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// A run was abandoned before evaluation because the scanner, parser or
    /// resolver reported errors.
    #[error("{count} compile error(s); program not executed")]
    Compile { count: usize },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex {
            message,
            line,
            column,
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }
}

/// Failure raised while evaluating a resolved program.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// A guest‑language error: type mismatch, arity mismatch, undefined
    /// variable or property, uncallable value.
    #[error("{message}")]
    Operation { token: Token, message: String },

    /// The hop‑count recorded by the resolver did not lead to a scope that
    /// defines the name.  Never caused by user code.
    #[error("Internal error: '{name}' is not bound {depth} scope(s) up.")]
    Desync {
        name: String,
        depth: usize,
        line: usize,
    },
}

impl RuntimeError {
    pub fn new<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError::Operation {
            token: token.clone(),
            message: msg.into(),
        }
    }

    /// 1‑based source line the error is attributed to.
    pub fn line(&self) -> usize {
        match self {
            RuntimeError::Operation { token, .. } => token.line,
            RuntimeError::Desync { line, .. } => *line,
        }
    }

    /// `" at 'x'"` style location suffix for diagnostics.
    pub fn location(&self) -> String {
        match self {
            RuntimeError::Operation { token, .. } => location_of(token),
            RuntimeError::Desync { name, .. } => format!(" at '{}'", name),
        }
    }
}

/// `" at end"` for EOF, `" at 'lexeme'"` otherwise.
pub fn location_of(token: &Token) -> String {
    if token.is_eof() {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
