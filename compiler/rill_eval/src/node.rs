//! Executable expression nodes.
//!
//! Every expression in the executable tree implements [`Node`]. The call
//! dispatch core only needs `execute` from the expressions it holds, so
//! argument and callee expressions are opaque `NodeRef`s.

use std::fmt;
use std::sync::Arc;

use rill_ir::{Name, Span};

use crate::errors::{missing_argument, undefined_variable};
use crate::{Closure, EvalContext, EvalResult, Frame, Function, Lookup, Value};

/// An executable expression.
pub trait Node: Send + Sync + fmt::Debug {
    /// Evaluate this expression in `frame`.
    fn execute(&self, ctx: &EvalContext, frame: &Frame) -> EvalResult;

    /// Source location of the expression.
    fn span(&self) -> Span;
}

/// Shared reference to a node.
///
/// Nodes are immutable once built and shared by every strategy a call site
/// installs, and by copies of the call site.
pub type NodeRef = Arc<dyn Node>;

/// A literal value.
#[derive(Debug)]
pub struct Constant {
    value: Value,
    span: Span,
}

impl Constant {
    pub fn new(value: Value, span: Span) -> Self {
        Constant { value, span }
    }

    pub fn node(value: Value, span: Span) -> NodeRef {
        Arc::new(Self::new(value, span))
    }
}

impl Node for Constant {
    fn execute(&self, _ctx: &EvalContext, _frame: &Frame) -> EvalResult {
        Ok(self.value.clone())
    }

    fn span(&self) -> Span {
        self.span
    }
}

/// Variable reference, resolved lexically through the frame chain.
#[derive(Debug)]
pub struct ReadVariable {
    name: Name,
    span: Span,
}

impl ReadVariable {
    pub fn new(name: Name, span: Span) -> Self {
        ReadVariable { name, span }
    }

    pub fn node(name: Name, span: Span) -> NodeRef {
        Arc::new(Self::new(name, span))
    }

    pub fn name(&self) -> Name {
        self.name
    }
}

impl Node for ReadVariable {
    fn execute(&self, ctx: &EvalContext, frame: &Frame) -> EvalResult {
        match frame.lookup(self.name) {
            Lookup::Value(value) => Ok(value),
            Lookup::Missing => {
                Err(missing_argument(ctx.interner().lookup(self.name)).with_span(self.span))
            }
            Lookup::Undefined => {
                Err(undefined_variable(ctx.interner().lookup(self.name)).with_span(self.span))
            }
        }
    }

    fn span(&self) -> Span {
        self.span
    }
}

/// Function definition; evaluates to a closure over the current frame.
#[derive(Debug)]
pub struct FunctionLiteral {
    function: Function,
}

impl FunctionLiteral {
    pub fn new(function: Function) -> Self {
        FunctionLiteral { function }
    }

    pub fn node(function: Function) -> NodeRef {
        Arc::new(Self::new(function))
    }
}

impl Node for FunctionLiteral {
    fn execute(&self, _ctx: &EvalContext, frame: &Frame) -> EvalResult {
        Ok(Value::Closure(Closure::new(
            self.function.clone(),
            frame.clone(),
        )))
    }

    fn span(&self) -> Span {
        self.function.span()
    }
}
