//! Function descriptors and closures.
//!
//! A [`Function`] is created once, when a function definition is evaluated
//! or compiled, and is compared by identity: two functions with the same
//! parameter names are still different call targets. A [`Closure`] pairs a
//! function with the frame it was defined in.

use std::fmt;
use std::sync::Arc;

use rill_ir::{Name, Span};
use rill_stack::ensure_sufficient_stack;

use crate::{ArgValues, EvalContext, EvalResult, Frame, NodeRef};

/// A formal parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: Name,
    /// Expression evaluated in the callee frame when no argument is bound.
    pub default: Option<NodeRef>,
}

impl Param {
    /// Parameter without a default.
    pub fn new(name: Name) -> Self {
        Param {
            name,
            default: None,
        }
    }

    /// Parameter with a default expression.
    pub fn with_default(name: Name, default: NodeRef) -> Self {
        Param {
            name,
            default: Some(default),
        }
    }

    /// The variadic `...` parameter.
    pub fn dots() -> Self {
        Param::new(Name::DOTS)
    }

    /// Whether this is the variadic `...` parameter.
    #[inline]
    pub fn is_variadic(&self) -> bool {
        self.name.is_dots()
    }
}

struct FunctionData {
    name: Option<Name>,
    params: Vec<Param>,
    body: NodeRef,
    span: Span,
    variadic: bool,
}

/// Function descriptor: ordered parameters and a body.
///
/// Cloning shares the descriptor; [`Function::same_as`] compares identity.
#[derive(Clone)]
pub struct Function(Arc<FunctionData>);

impl Function {
    /// Create a function descriptor.
    ///
    /// Parameter names must be unique.
    pub fn new(name: Option<Name>, params: Vec<Param>, body: NodeRef, span: Span) -> Self {
        debug_assert!(
            params
                .iter()
                .enumerate()
                .all(|(i, p)| params[..i].iter().all(|q| q.name != p.name)),
            "duplicate parameter names"
        );
        let variadic = params.iter().any(Param::is_variadic);
        Function(Arc::new(FunctionData {
            name,
            params,
            body,
            span,
            variadic,
        }))
    }

    #[inline]
    pub fn params(&self) -> &[Param] {
        &self.0.params
    }

    /// Number of formal parameters, `...` included.
    #[inline]
    pub fn arity(&self) -> usize {
        self.0.params.len()
    }

    /// Whether the parameter list contains `...`.
    #[inline]
    pub fn is_variadic(&self) -> bool {
        self.0.variadic
    }

    #[inline]
    pub fn body(&self) -> &NodeRef {
        &self.0.body
    }

    #[inline]
    pub fn name(&self) -> Option<Name> {
        self.0.name
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.0.span
    }

    /// Identity comparison.
    #[inline]
    pub fn same_as(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.0.name)
            .field("arity", &self.arity())
            .field("id", &Arc::as_ptr(&self.0))
            .finish()
    }
}

/// A function together with the frame it closes over.
#[derive(Clone, Debug)]
pub struct Closure {
    function: Function,
    env: Frame,
}

impl Closure {
    pub fn new(function: Function, env: Frame) -> Self {
        Closure { function, env }
    }

    #[inline]
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// The defining frame.
    #[inline]
    pub fn env(&self) -> &Frame {
        &self.env
    }

    /// Invoke the closure with actual arguments in parameter order.
    ///
    /// `args` holds one entry per parameter; absent entries fall back to the
    /// parameter's default, evaluated in the callee frame after every present
    /// argument is bound, or are bound as missing.
    pub fn invoke(&self, ctx: &EvalContext, caller: &Frame, args: ArgValues) -> EvalResult {
        debug_assert_eq!(args.len(), self.function.arity());
        let depth = ctx.enter_call(caller.call_depth())?;
        let frame = Frame::for_call(&self.env, depth);

        let mut defaulted = Vec::new();
        for (param, value) in self.function.params().iter().zip(args) {
            match value {
                Some(value) => frame.define(param.name, value),
                None => {
                    frame.define_missing(param.name);
                    if let Some(default) = &param.default {
                        defaulted.push((param.name, default));
                    }
                }
            }
        }
        for (name, default) in defaulted {
            let value = default.execute(ctx, &frame)?;
            frame.define(name, value);
        }

        ensure_sufficient_stack(|| self.function.body().execute(ctx, &frame))
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        self.function.same_as(&other.function) && self.env.ptr_eq(&other.env)
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.function.name() {
            Some(name) => write!(f, "<closure #{}/{}>", name.raw(), self.function.arity()),
            None => write!(f, "<closure/{}>", self.function.arity()),
        }
    }
}
