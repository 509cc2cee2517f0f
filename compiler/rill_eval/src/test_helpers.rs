//! Shared fixtures for unit tests.

#![allow(clippy::unwrap_used)]

use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;

use rill_ir::{Name, SharedInterner, Span};

use crate::{
    ArgSlot, CallArgs, Closure, Constant, EvalContext, EvalContextBuilder, EvalResult, Frame,
    Function, Lookup, Node, NodeRef, Param, Value,
};

pub(crate) struct Fixture {
    pub interner: SharedInterner,
    pub ctx: EvalContext,
    pub global: Frame,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(|b| b)
    }

    /// Fixture whose context is configured by `configure`.
    pub fn with(configure: impl FnOnce(EvalContextBuilder) -> EvalContextBuilder) -> Self {
        let interner = SharedInterner::new();
        let ctx = configure(EvalContext::builder().interner(interner.clone())).build();
        Fixture {
            interner,
            ctx,
            global: Frame::global(),
        }
    }

    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    /// A constant node holding a closure over the global frame.
    pub fn callee(&self, function: &Function) -> NodeRef {
        Constant::node(
            Value::Closure(Closure::new(function.clone(), self.global.clone())),
            Span::new(0, 1),
        )
    }
}

pub(crate) fn int(v: i64) -> NodeRef {
    Constant::node(Value::Int(v), Span::DUMMY)
}

pub(crate) fn int_at(v: i64, start: u32) -> NodeRef {
    Constant::node(Value::Int(v), Span::new(start, start + 1))
}

pub(crate) fn positional_args(values: impl IntoIterator<Item = NodeRef>) -> CallArgs {
    CallArgs::new(values.into_iter().map(ArgSlot::positional).collect())
}

/// Function body that renders its parameters as `a=1,b=?`.
///
/// `?` marks a parameter bound as missing.
#[derive(Debug)]
pub(crate) struct ParamProbe {
    params: Vec<(Name, &'static str)>,
}

impl Node for ParamProbe {
    fn execute(&self, _ctx: &EvalContext, frame: &Frame) -> EvalResult {
        let mut out = String::new();
        for (i, (name, text)) in self.params.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match frame.lookup(*name) {
                Lookup::Value(v) => write!(out, "{text}={v}").unwrap(),
                Lookup::Missing | Lookup::Undefined => write!(out, "{text}=?").unwrap(),
            }
        }
        Ok(Value::string(out))
    }

    fn span(&self) -> Span {
        Span::DUMMY
    }
}

/// Function over `params` (`"..."` is the variadic parameter) whose body is a
/// [`ParamProbe`].
pub(crate) fn probe_function(fx: &Fixture, params: &[&str]) -> Function {
    let params: Vec<Param> = params.iter().map(|p| Param::new(fx.name(p))).collect();
    let probe = ParamProbe {
        params: params
            .iter()
            .filter(|p| !p.is_variadic())
            .map(|p| (p.name, fx.interner.lookup(p.name)))
            .collect(),
    };
    Function::new(None, params, Arc::new(probe), Span::DUMMY)
}

/// Shared log of the values [`Record`] nodes evaluated, in order.
pub(crate) type EvalLog = Arc<Mutex<Vec<i64>>>;

/// Argument expression that logs its value when evaluated.
#[derive(Debug)]
pub(crate) struct Record {
    value: i64,
    log: EvalLog,
}

impl Record {
    pub fn node(value: i64, log: &EvalLog) -> NodeRef {
        Arc::new(Record {
            value,
            log: Arc::clone(log),
        })
    }
}

impl Node for Record {
    fn execute(&self, _ctx: &EvalContext, _frame: &Frame) -> EvalResult {
        self.log.lock().push(self.value);
        Ok(Value::Int(self.value))
    }

    fn span(&self) -> Span {
        Span::DUMMY
    }
}
