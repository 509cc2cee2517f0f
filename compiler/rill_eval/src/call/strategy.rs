//! Dispatch strategies.
//!
//! Each call site has exactly one installed [`CallStrategy`]. A strategy
//! turns the call's argument expressions into actual arguments in parameter
//! order for one resolved target, or reports that its assumption about the
//! target no longer holds and names the strategy to install instead.
//!
//! ```text
//!   named/omitted arguments          positional arguments only
//!
//!   CachedGeneric ──┐                Trivial ──────► CachedSimple
//!        ▲          │ new target        │                 │ new target
//!        └──────────┘                   └──► Simple ◄─────┘
//!
//!   Generic (caching disabled)
//! ```
//!
//! Arrows only point down the lattice, so a call site that saw two targets
//! never returns to an identity-guarded tier.

use std::fmt;
use std::sync::Arc;

use smallvec::smallvec;

use rill_ir::Span;

use super::binder::{bind, BindError, Binding};
use super::{ArgValues, CallArgs};
use crate::{EvalContext, EvalError, Frame, Function, NodeRef};

/// Strategy kind, without cached state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Binds by name then position on every call.
    Generic,
    /// Binds by name then position, reusing the binding while the target is
    /// unchanged.
    CachedGeneric,
    /// Positional call site awaiting its first target.
    Trivial,
    /// Positional fill for one target identity and a fixed arity.
    CachedSimple,
    /// Positional fill for any target.
    Simple,
}

impl Tier {
    /// Whether a call site may move from `self` to `next`.
    pub fn may_transition_to(self, next: Tier) -> bool {
        matches!(
            (self, next),
            (Tier::Trivial, Tier::CachedSimple | Tier::Simple)
                | (Tier::CachedSimple, Tier::Simple)
                | (Tier::CachedGeneric, Tier::CachedGeneric)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Generic => "Generic",
            Tier::CachedGeneric => "CachedGeneric",
            Tier::Trivial => "Trivial",
            Tier::CachedSimple => "CachedSimple",
            Tier::Simple => "Simple",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a strategy handed the call to a different one.
///
/// A miss is never an error: the call completes under the replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissReason {
    /// First call through a caching strategy.
    FirstBinding,
    /// The cached target is not the resolved one.
    TargetChanged,
    /// Argument and parameter counts agree within the specialization bound.
    Specialized { arity: usize },
    ArityMismatch { args: usize, params: usize },
    ArityAboveBound { arity: usize, bound: usize },
    /// The target declares `...`.
    VariadicTarget,
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::FirstBinding => write!(f, "first binding"),
            MissReason::TargetChanged => write!(f, "target changed"),
            MissReason::Specialized { arity } => write!(f, "specialized for arity {arity}"),
            MissReason::ArityMismatch { args, params } => {
                write!(f, "{args} arguments for {params} parameters")
            }
            MissReason::ArityAboveBound { arity, bound } => {
                write!(f, "arity {arity} above specialization bound {bound}")
            }
            MissReason::VariadicTarget => write!(f, "variadic target"),
        }
    }
}

/// Arity-specialized positional fill.
///
/// Holds the argument expressions unpacked, so filling skips both binding
/// and the walk over argument slots.
#[derive(Clone, Debug)]
pub enum FillArgs {
    Nullary,
    Unary(NodeRef),
    Binary(NodeRef, NodeRef),
    Ternary(NodeRef, NodeRef, NodeRef),
}

impl FillArgs {
    /// Number of arity-specialized fill routines.
    pub(super) const MAX_ARITY: usize = 3;

    /// Specialize for a positional call expression, if its arity has a
    /// dedicated routine.
    pub(super) fn specialize(args: &CallArgs) -> Option<FillArgs> {
        let mut exprs = args.iter().map(|arg| arg.value.clone());
        let fill = match args.len() {
            0 => FillArgs::Nullary,
            1 => FillArgs::Unary(exprs.next()??),
            2 => FillArgs::Binary(exprs.next()??, exprs.next()??),
            3 => FillArgs::Ternary(exprs.next()??, exprs.next()??, exprs.next()??),
            _ => return None,
        };
        Some(fill)
    }

    pub(super) fn arity(&self) -> usize {
        match self {
            FillArgs::Nullary => 0,
            FillArgs::Unary(..) => 1,
            FillArgs::Binary(..) => 2,
            FillArgs::Ternary(..) => 3,
        }
    }

    fn fill(&self, ctx: &EvalContext, caller: &Frame) -> Result<ArgValues, EvalError> {
        let values: ArgValues = match self {
            FillArgs::Nullary => smallvec![],
            FillArgs::Unary(a) => {
                let a = a.execute(ctx, caller)?;
                smallvec![Some(a)]
            }
            FillArgs::Binary(a, b) => {
                let a = a.execute(ctx, caller)?;
                let b = b.execute(ctx, caller)?;
                smallvec![Some(a), Some(b)]
            }
            FillArgs::Ternary(a, b, c) => {
                let a = a.execute(ctx, caller)?;
                let b = b.execute(ctx, caller)?;
                let c = c.execute(ctx, caller)?;
                smallvec![Some(a), Some(b), Some(c)]
            }
        };
        Ok(values)
    }
}

/// A binding remembered together with the target it was computed for.
#[derive(Clone, Debug)]
pub struct BindingCache {
    function: Function,
    binding: Arc<Binding>,
}

/// The installed dispatch strategy of a call site.
///
/// Immutable once installed; a miss builds a new strategy instead of
/// updating this one.
#[derive(Clone, Debug)]
pub enum CallStrategy {
    Generic,
    /// `None` until the first call.
    CachedGeneric(Option<BindingCache>),
    /// `max_arity` bounds the arities that specialize into `CachedSimple`.
    Trivial {
        max_arity: usize,
    },
    CachedSimple {
        function: Function,
        fill: FillArgs,
    },
    Simple,
}

/// Outcome of asking a strategy for actual arguments.
#[derive(Debug)]
pub(super) enum Dispatch {
    /// Actual arguments in parameter order, one entry per parameter.
    Filled(ArgValues),
    /// The strategy's assumption failed; no argument has been evaluated.
    Rewrite {
        next: CallStrategy,
        reason: MissReason,
    },
}

impl CallStrategy {
    pub fn tier(&self) -> Tier {
        match self {
            CallStrategy::Generic => Tier::Generic,
            CallStrategy::CachedGeneric(_) => Tier::CachedGeneric,
            CallStrategy::Trivial { .. } => Tier::Trivial,
            CallStrategy::CachedSimple { .. } => Tier::CachedSimple,
            CallStrategy::Simple => Tier::Simple,
        }
    }

    /// Produce actual arguments for `function`, evaluating argument
    /// expressions in `caller` from left to right.
    ///
    /// Every speculation check runs before any argument is evaluated, so a
    /// `Rewrite` outcome leaves the caller's frame untouched and the
    /// replacement strategy can evaluate each argument exactly once.
    pub(super) fn bind_and_fill(
        &self,
        ctx: &EvalContext,
        args: &CallArgs,
        call_span: Span,
        function: &Function,
        caller: &Frame,
    ) -> Result<Dispatch, EvalError> {
        match self {
            CallStrategy::Generic => {
                let binding = bind(args, function.params())
                    .map_err(|err| ctx.report_bind_error(&err, call_span))?;
                place_bound(ctx, args, &binding, caller).map(Dispatch::Filled)
            }

            CallStrategy::CachedGeneric(Some(cache)) if cache.function.same_as(function) => {
                place_bound(ctx, args, &cache.binding, caller).map(Dispatch::Filled)
            }

            CallStrategy::CachedGeneric(cache) => {
                let binding = bind(args, function.params())
                    .map_err(|err| ctx.report_bind_error(&err, call_span))?;
                let reason = if cache.is_some() {
                    MissReason::TargetChanged
                } else {
                    MissReason::FirstBinding
                };
                Ok(Dispatch::Rewrite {
                    next: CallStrategy::CachedGeneric(Some(BindingCache {
                        function: function.clone(),
                        binding: Arc::new(binding),
                    })),
                    reason,
                })
            }

            CallStrategy::Trivial { max_arity } => {
                let (next, reason) = specialize(args, function, *max_arity);
                Ok(Dispatch::Rewrite { next, reason })
            }

            CallStrategy::CachedSimple {
                function: cached,
                fill,
            } => {
                if cached.same_as(function) {
                    fill.fill(ctx, caller).map(Dispatch::Filled)
                } else {
                    Ok(Dispatch::Rewrite {
                        next: CallStrategy::Simple,
                        reason: MissReason::TargetChanged,
                    })
                }
            }

            CallStrategy::Simple => {
                place_positional(ctx, args, call_span, function, caller).map(Dispatch::Filled)
            }
        }
    }
}

/// Pick the strategy a positional call site settles on for its first target.
fn specialize(args: &CallArgs, function: &Function, max_arity: usize) -> (CallStrategy, MissReason) {
    let arity = args.len();
    let params = function.arity();
    let bound = max_arity.min(FillArgs::MAX_ARITY);

    let reason = if function.is_variadic() {
        MissReason::VariadicTarget
    } else if arity != params {
        MissReason::ArityMismatch {
            args: arity,
            params,
        }
    } else if arity > bound {
        MissReason::ArityAboveBound { arity, bound }
    } else if let Some(fill) = FillArgs::specialize(args) {
        let reason = MissReason::Specialized {
            arity: fill.arity(),
        };
        return (
            CallStrategy::CachedSimple {
                function: function.clone(),
                fill,
            },
            reason,
        );
    } else {
        MissReason::ArityAboveBound { arity, bound }
    };
    (CallStrategy::Simple, reason)
}

/// Evaluate arguments in argument order and place them by `binding`.
fn place_bound(
    ctx: &EvalContext,
    args: &CallArgs,
    binding: &Binding,
    caller: &Frame,
) -> Result<ArgValues, EvalError> {
    let mut values: ArgValues = smallvec![None; binding.param_count()];
    for (i, arg) in args.iter().enumerate() {
        if let (Some(expr), Some(slot)) = (&arg.value, binding.param_for(i)) {
            values[slot] = Some(expr.execute(ctx, caller)?);
        }
    }
    Ok(values)
}

/// Evaluate a positional call's arguments straight into parameter slots.
///
/// Overflow and landing on `...` are detected before any argument runs,
/// reporting the same error the binder would.
fn place_positional(
    ctx: &EvalContext,
    args: &CallArgs,
    call_span: Span,
    function: &Function,
    caller: &Frame,
) -> Result<ArgValues, EvalError> {
    debug_assert!(args.is_positional_only());
    let params = function.params();
    for (i, arg) in args.iter().enumerate() {
        let err = match params.get(i) {
            None => BindError::UnusedArgument {
                index: i,
                span: arg.span,
            },
            Some(param) if param.is_variadic() => BindError::UnsupportedVariadicCollection {
                index: i,
                span: arg.span,
            },
            Some(_) => continue,
        };
        return Err(ctx.report_bind_error(&err, call_span));
    }

    let mut values: ArgValues = smallvec![None; params.len()];
    for (slot, arg) in values.iter_mut().zip(args.iter()) {
        if let Some(expr) = &arg.value {
            *slot = Some(expr.execute(ctx, caller)?);
        }
    }
    Ok(values)
}
