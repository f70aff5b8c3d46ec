//! Centralised error hierarchy for the **Void interpreter**.
//!
//! Three layers, from the inside out:
//!
//! * [`RuntimeError`] – failures raised while evaluating an AST (bad operand,
//!   bad callee, arity mismatch, runaway recursion, unknown variable).
//! * [`InterpretError`] – what statement execution propagates: either a
//!   runtime failure or the unwinding signal of a `return` statement.  The
//!   signal is consumed at the call boundary and never reaches the host.
//! * [`VoidError`] – crate‑wide error for the scanner, parser and the
//!   top‑level `interpret` entry point.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::debug;

use crate::value::Value;

/// Runtime evaluation failure.  Every variant carries the offending
/// operator/name/value so the host can report a single terminal message.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuntimeError {
    /// An arithmetic or comparison operator received a non‑Number operand.
    #[error(
        "Operand of '{operator}' must be a number, got {} '{value}'. [line {line}]",
        .value.type_name()
    )]
    InvalidOperand {
        operator: String,
        value: Value,
        line: usize,
    },

    /// A call's callee did not evaluate to a callable value.
    #[error(
        "Can only call functions, got {} '{callee}'. [line {line}]",
        .callee.type_name()
    )]
    InvalidCallee { callee: Value, line: usize },

    /// Argument count differs from the callee's arity.
    #[error("Expected {expected} arguments but got {actual}. [line {line}]")]
    InvalidArgumentCount {
        expected: usize,
        actual: usize,
        line: usize,
    },

    /// Nested calls went deeper than the interpreter allows.
    #[error("Stack overflow: more than {depth} nested calls. [line {line}]")]
    StackOverflow { depth: usize, line: usize },

    /// No scope in the chain binds `name`.
    #[error("Undefined variable '{name}'. [line {line}]")]
    UndefinedVariable { name: String, line: usize },

    /// A host‑provided function reported a failure.
    #[error("Native function '{name}' failed: {message}")]
    Native { name: String, message: String },

    /// The print sink could not be written to.
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl RuntimeError {
    /// Helper constructor for operand type errors.
    pub fn invalid_operand<S: Into<String>>(operator: S, value: Value, line: usize) -> Self {
        let operator: String = operator.into();

        debug!(
            "Creating InvalidOperand error: operator={}, value={}, line={}",
            operator, value, line
        );

        RuntimeError::InvalidOperand {
            operator,
            value,
            line,
        }
    }

    /// Helper constructor for unresolved names.
    pub fn undefined_variable<S: Into<String>>(name: S, line: usize) -> Self {
        let name: String = name.into();

        debug!("Creating UndefinedVariable error: name={}, line={}", name, line);

        RuntimeError::UndefinedVariable { name, line }
    }
}

/// Signal propagated by statement execution.
#[derive(Debug, Error)]
pub enum InterpretError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Unwinds to the nearest enclosing call, carrying the returned value.
    #[error("Return signal with value: {0}")]
    ReturnSignal(Value),
}

/// Convenient alias for expression evaluation results.
pub type RResult<T> = std::result::Result<T, RuntimeError>;

/// Convenient alias for statement execution results.
pub type IResult<T> = std::result::Result<T, InterpretError>;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VoidError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Runtime evaluation error.
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl VoidError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        VoidError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", line, message);

        VoidError::Parse { message, line }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, VoidError>;
