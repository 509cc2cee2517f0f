//! Runtime error types and their factory functions.
//!
//! `EvalErrorKind` is the structured category; `EvalError` pairs it with the
//! rendered message and the source location. Factory functions are the public
//! way to build errors, so every error carries a kind.

use std::fmt;

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::{Span, StringInterner};

use crate::call::BindError;
use crate::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// Callee expression did not evaluate to a closure.
    NotCallable { type_name: String },
    /// More arguments than free parameter slots. `position` is 1-based.
    UnusedArgument { position: usize },
    /// Argument name matches no parameter of the callee.
    UnknownArgumentName { name: String },
    /// Two arguments name the same parameter.
    DuplicateArgumentBinding { name: String },
    /// The call would need arguments collected into `...`. `position` is 1-based.
    UnsupportedVariadicCollection { position: usize },
    /// A parameter was read that received no argument and has no default.
    MissingArgument { name: String },
    UndefinedVariable { name: String },
    StackOverflow { depth: usize },
}

impl EvalErrorKind {
    /// Diagnostic code for this kind.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotCallable { .. } => ErrorCode::E6001,
            Self::UnusedArgument { .. } => ErrorCode::E6002,
            Self::UnknownArgumentName { .. } => ErrorCode::E6003,
            Self::DuplicateArgumentBinding { .. } => ErrorCode::E6004,
            Self::UnsupportedVariadicCollection { .. } => ErrorCode::E6005,
            Self::MissingArgument { .. } => ErrorCode::E6006,
            Self::UndefinedVariable { .. } => ErrorCode::E6007,
            Self::StackOverflow { .. } => ErrorCode::E6008,
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCallable { type_name } => {
                write!(f, "attempt to apply non-function ({type_name})")
            }
            Self::UnusedArgument { position } => {
                write!(f, "unused argument (argument {position})")
            }
            Self::UnknownArgumentName { name } => {
                write!(f, "unused argument ({name} = ...): no parameter named `{name}`")
            }
            Self::DuplicateArgumentBinding { name } => {
                write!(f, "formal argument `{name}` matched by multiple actual arguments")
            }
            Self::UnsupportedVariadicCollection { position } => write!(
                f,
                "argument {position} must be collected into `...`, which is not yet supported"
            ),
            Self::MissingArgument { name } => {
                write!(f, "argument `{name}` is missing, with no default")
            }
            Self::UndefinedVariable { name } => write!(f, "object `{name}` not found"),
            Self::StackOverflow { depth } => {
                write!(f, "maximum call depth exceeded (limit: {depth})")
            }
        }
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable error message, `kind.to_string()`.
    pub message: String,
    /// Source location where the error occurred.
    pub span: Option<Span>,
}

impl EvalError {
    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            span: None,
        }
    }

    /// Attach a source span to this error.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Render this error as a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.kind.error_code()).with_message(&self.message);
        match self.span {
            Some(span) => diag.with_label(span, "error occurred here"),
            None => diag,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Callee is not a function.
#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

/// Argument at `index` (0-based) has no free parameter slot left.
#[cold]
pub fn unused_argument(index: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnusedArgument {
        position: index + 1,
    })
}

/// Argument name matches no parameter.
#[cold]
pub fn unknown_argument_name(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownArgumentName {
        name: name.to_string(),
    })
}

/// Parameter named by more than one argument.
#[cold]
pub fn duplicate_argument_binding(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::DuplicateArgumentBinding {
        name: name.to_string(),
    })
}

/// Argument at `index` (0-based) would need collecting into `...`.
#[cold]
pub fn unsupported_variadic_collection(index: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedVariadicCollection {
        position: index + 1,
    })
}

/// Parameter read without an argument or default.
#[cold]
pub fn missing_argument(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingArgument {
        name: name.to_string(),
    })
}

/// Variable not found in any enclosing frame.
#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

/// Call depth limit exceeded.
#[cold]
pub fn recursion_limit_exceeded(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth })
}

/// Convert a binder error, resolving argument names through `interner`.
///
/// The resulting error carries the offending argument's span.
#[cold]
pub fn from_bind_error(err: &BindError, interner: &StringInterner) -> EvalError {
    let error = match *err {
        BindError::UnusedArgument { index, .. } => unused_argument(index),
        BindError::UnknownArgumentName { name, .. } => {
            unknown_argument_name(interner.lookup(name))
        }
        BindError::DuplicateArgumentBinding { name, .. } => {
            duplicate_argument_binding(interner.lookup(name))
        }
        BindError::UnsupportedVariadicCollection { index, .. } => {
            unsupported_variadic_collection(index)
        }
    };
    error.with_span(err.span())
}
