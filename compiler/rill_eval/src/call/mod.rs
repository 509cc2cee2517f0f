//! Call sites.
//!
//! A call expression compiles to a [`CallSite`] node through a
//! [`CallFactory`]. The node resolves its callee, asks its installed
//! [`CallStrategy`] for the actual arguments, and invokes the closure. When
//! the strategy's assumption about the target fails, the node installs the
//! replacement the strategy names and finishes the current call with it.

mod binder;
mod rewrite;
mod strategy;

#[cfg(test)]
mod tests;

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use smallvec::SmallVec;

use rill_ir::{Name, Span};

use crate::errors::not_callable;
use crate::{EvalContext, EvalError, EvalResult, Frame, Function, Node, NodeRef, Value};

pub use binder::{bind, BindError, Binding};
pub use strategy::{CallStrategy, MissReason, Tier};

use rewrite::StrategySlot;
use strategy::{Dispatch, FillArgs};

/// Actual arguments in parameter order; `None` for a parameter that
/// received no argument.
pub type ArgValues = SmallVec<[Option<Value>; 4]>;

/// Largest arity with a dedicated positional fill routine.
pub const MAX_SPECIALIZED_ARITY: usize = FillArgs::MAX_ARITY;

/// One argument slot of a call expression.
#[derive(Clone, Debug)]
pub struct ArgSlot {
    pub(crate) name: Option<Name>,
    /// `None` for an omitted argument, as in `f(1, , 3)`.
    pub(crate) value: Option<NodeRef>,
    pub(crate) span: Span,
}

impl ArgSlot {
    /// An unnamed argument, located at its expression.
    pub fn positional(value: NodeRef) -> Self {
        let span = value.span();
        ArgSlot {
            name: None,
            value: Some(value),
            span,
        }
    }

    /// A `name = value` argument.
    pub fn named(name: Name, value: NodeRef, span: Span) -> Self {
        ArgSlot {
            name: Some(name),
            value: Some(value),
            span,
        }
    }

    /// An explicitly omitted argument.
    pub fn omitted(span: Span) -> Self {
        ArgSlot {
            name: None,
            value: None,
            span,
        }
    }

    #[inline]
    pub fn name(&self) -> Option<Name> {
        self.name
    }

    #[inline]
    pub fn value(&self) -> Option<&NodeRef> {
        self.value.as_ref()
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    #[inline]
    pub fn is_positional(&self) -> bool {
        self.name.is_none()
    }

    #[inline]
    pub fn is_omitted(&self) -> bool {
        self.value.is_none()
    }
}

/// The argument slots of one call expression.
///
/// Immutable and shared by every strategy the call site installs and by
/// copies of the call site.
#[derive(Clone, Debug)]
pub struct CallArgs(Arc<[ArgSlot]>);

impl CallArgs {
    pub fn new(slots: Vec<ArgSlot>) -> Self {
        CallArgs(slots.into())
    }

    /// No argument is named or omitted.
    pub fn is_positional_only(&self) -> bool {
        self.0.iter().all(|arg| arg.is_positional() && !arg.is_omitted())
    }

    /// Whether both handles share one expression.
    pub fn ptr_eq(&self, other: &CallArgs) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for CallArgs {
    type Target = [ArgSlot];

    fn deref(&self) -> &[ArgSlot] {
        &self.0
    }
}

/// How a [`CallFactory`] picks initial strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallConfig {
    /// Largest arity the Trivial tier specializes into CachedSimple.
    pub specialize_up_to: usize,
    /// Start named and defaulted call sites at CachedGeneric instead of
    /// Generic.
    pub cache_generic_bindings: bool,
}

impl CallConfig {
    /// Set the specialization bound, clamped to [`MAX_SPECIALIZED_ARITY`].
    #[must_use]
    pub fn with_specialize_up_to(mut self, arity: usize) -> Self {
        self.specialize_up_to = arity.min(MAX_SPECIALIZED_ARITY);
        self
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        CallConfig {
            specialize_up_to: MAX_SPECIALIZED_ARITY,
            cache_generic_bindings: true,
        }
    }
}

/// Builds call-site nodes with their initial strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct CallFactory {
    config: CallConfig,
}

impl CallFactory {
    pub fn new(config: CallConfig) -> Self {
        CallFactory { config }
    }

    /// Compile a call expression into a call-site node.
    pub fn create(&self, span: Span, callee: NodeRef, args: Vec<ArgSlot>) -> CallSite {
        let args = CallArgs::new(args);
        let initial = self.initial_strategy(&args);
        CallSite {
            span,
            callee,
            args,
            factory: *self,
            slot: StrategySlot::new(initial),
        }
    }

    /// Like [`CallFactory::create`], as a shared node.
    pub fn node(&self, span: Span, callee: NodeRef, args: Vec<ArgSlot>) -> NodeRef {
        Arc::new(self.create(span, callee, args))
    }

    fn initial_strategy(&self, args: &CallArgs) -> CallStrategy {
        if args.is_positional_only() {
            CallStrategy::Trivial {
                max_arity: self.config.specialize_up_to,
            }
        } else if self.config.cache_generic_bindings {
            CallStrategy::CachedGeneric(None)
        } else {
            CallStrategy::Generic
        }
    }
}

/// A call expression in the executable tree.
pub struct CallSite {
    span: Span,
    callee: NodeRef,
    args: CallArgs,
    factory: CallFactory,
    slot: StrategySlot,
}

impl CallSite {
    /// Tier of the installed strategy.
    pub fn tier(&self) -> Tier {
        self.slot.load().tier()
    }

    /// Number of strategy rewrites installed at this site.
    pub fn rewrite_count(&self) -> usize {
        self.slot.rewrites()
    }

    #[inline]
    pub fn args(&self) -> &CallArgs {
        &self.args
    }

    #[inline]
    pub fn callee(&self) -> &NodeRef {
        &self.callee
    }

    /// A new node for the same call expression, sharing its expressions and
    /// starting over from the initial tier.
    #[must_use]
    pub fn fresh_copy(&self) -> CallSite {
        CallSite {
            span: self.span,
            callee: Arc::clone(&self.callee),
            args: self.args.clone(),
            factory: self.factory,
            slot: StrategySlot::new(self.factory.initial_strategy(&self.args)),
        }
    }

    /// Produce actual arguments for `function`, rewriting the installed
    /// strategy until one of them fills.
    pub fn bind_and_fill(
        &self,
        ctx: &EvalContext,
        function: &Function,
        caller: &Frame,
    ) -> Result<ArgValues, EvalError> {
        let mut strategy = self.slot.load();
        loop {
            match strategy.bind_and_fill(ctx, &self.args, self.span, function, caller)? {
                Dispatch::Filled(values) => return Ok(values),
                Dispatch::Rewrite { next, reason } => {
                    strategy = self.slot.replace(&strategy, next, reason);
                }
            }
        }
    }
}

impl Node for CallSite {
    #[tracing::instrument(level = "trace", skip_all, fields(span = %self.span))]
    fn execute(&self, ctx: &EvalContext, frame: &Frame) -> EvalResult {
        let callee = self.callee.execute(ctx, frame)?;
        let Some(closure) = callee.as_closure() else {
            return Err(not_callable(callee.type_name()).with_span(self.callee.span()));
        };
        let values = self.bind_and_fill(ctx, closure.function(), frame)?;
        closure.invoke(ctx, frame, values)
    }

    fn span(&self) -> Span {
        self.span
    }
}

impl fmt::Debug for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSite")
            .field("span", &self.span)
            .field("args", &self.args.len())
            .field("strategy", &self.slot)
            .finish_non_exhaustive()
    }
}
