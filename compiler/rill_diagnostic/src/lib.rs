//! Diagnostic system for runtime error reporting.
//!
//! - Error codes for searchability
//! - Clear messages (what went wrong)
//! - Primary span (where it went wrong)
//! - Notes (why it went wrong)
//!
//! The evaluator reports call-dispatch failures into a `DiagnosticQueue`
//! before propagating the corresponding runtime error, so a driver can render
//! every problem a run hit, including warnings that did not abort it.

mod diagnostic;
mod error_code;
pub mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
