//! Centralised error hierarchy for the interpreter.
//!
//! Static failures (scanner, parser, resolver) and host failures (I/O, UTF‑8)
//! are variants of [`LoxError`]. Failures raised while a program runs are
//! [`RuntimeError`]s, typed by condition so callers and tests can match on
//! them. Neither type prints itself: diagnostics flow through a [`Reporter`].

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical static/host error type used throughout the crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error. `location` is either empty, ` at end`, or
    /// ` at '<lexeme>'`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static scoping failure found by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
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

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// A failure raised while executing a program. Every variant carries the
/// human message and the line of the offending token.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("{message}\n[line {line}]")]
    UndefinedVariable { message: String, line: usize },

    /// Wrong operand, argument or target type.
    #[error("{message}\n[line {line}]")]
    TypeError { message: String, line: usize },

    #[error("{message}\n[line {line}]")]
    ArityError { message: String, line: usize },

    #[error("{message}\n[line {line}]")]
    UndefinedProperty { message: String, line: usize },

    /// Bad import target or unreadable module.
    #[error("{message}\n[line {line}]")]
    ModuleError { message: String, line: usize },

    /// Calls nested deeper than the interpreter's limit.
    #[error("{message}\n[line {line}]")]
    StackOverflow { message: String, line: usize },
}

impl RuntimeError {
    pub fn undefined_variable(name: &Token) -> Self {
        RuntimeError::UndefinedVariable {
            message: format!("Undefined variable '{}'.", name.lexeme),
            line: name.line,
        }
    }

    pub fn type_error<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError::TypeError {
            message: msg.into(),
            line: token.line,
        }
    }

    pub fn arity(token: &Token, expected: usize, got: usize) -> Self {
        RuntimeError::ArityError {
            message: format!("Expected {} arguments but got {}.", expected, got),
            line: token.line,
        }
    }

    pub fn undefined_property(name: &Token) -> Self {
        RuntimeError::UndefinedProperty {
            message: format!("Undefined property '{}'.", name.lexeme),
            line: name.line,
        }
    }

    pub fn module<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError::ModuleError {
            message: msg.into(),
            line: token.line,
        }
    }

    pub fn stack_overflow(token: &Token) -> Self {
        RuntimeError::StackOverflow {
            message: "Stack overflow.".to_string(),
            line: token.line,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RuntimeError::UndefinedVariable { message, .. }
            | RuntimeError::TypeError { message, .. }
            | RuntimeError::ArityError { message, .. }
            | RuntimeError::UndefinedProperty { message, .. }
            | RuntimeError::ModuleError { message, .. }
            | RuntimeError::StackOverflow { message, .. } => message,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::TypeError { line, .. }
            | RuntimeError::ArityError { line, .. }
            | RuntimeError::UndefinedProperty { line, .. }
            | RuntimeError::ModuleError { line, .. }
            | RuntimeError::StackOverflow { line, .. } => *line,
        }
    }
}

/// Sink for everything the runtime wants a human to see on the error stream.
pub trait Reporter {
    /// A scanner, parser or resolver failure.
    fn static_error(&mut self, error: &LoxError);

    /// An uncaught runtime failure that ended a run.
    fn runtime_error(&mut self, error: &RuntimeError);

    /// Non-fatal notice, e.g. a native called with the wrong argument type.
    fn diagnostic(&mut self, message: &str);
}

/// Writes every report to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn static_error(&mut self, error: &LoxError) {
        eprintln!("{}", error);
    }

    fn runtime_error(&mut self, error: &RuntimeError) {
        eprintln!("{}", error);
    }

    fn diagnostic(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}
